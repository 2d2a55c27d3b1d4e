use clap::Parser;
use std::path::PathBuf;

/// Fit Bradford standard curves and compute dilution recipes for every plate in a folder
#[derive(Parser)]
#[clap(version)]
pub struct Cli {
    /// Folder of plate reader exports in csv form
    #[clap(default_value = "Bradford_data")]
    pub data_dir: PathBuf,

    /// Folder the per-plate reports are written to
    #[clap(short, long, default_value = "Bradford_results")]
    pub output: PathBuf,

    /// TOML file with the standard ladder, column names and dilution volumes
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}
