mod cli;

use clap::Parser;

use bradford::config::Config;
use bradford::{pipeline, report};

fn main() -> bradford::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cmd = cli::Cli::parse();

    let config = match &cmd.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    std::fs::create_dir_all(&cmd.output)?;

    let mut failed = 0;
    for (path, analysis) in pipeline::analyse_directory(&cmd.data_dir, &config)? {
        match analysis {
            Ok(analysis) => {
                report::write_file(&cmd.output.join(format!("{}.csv", analysis.name)), &analysis)?;
                println!("{}", report::summary(&analysis));
            }
            Err(e) => {
                log::error!("skipped {path:?}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        log::warn!("{failed} plate(s) could not be analysed");
    }

    Ok(())
}
