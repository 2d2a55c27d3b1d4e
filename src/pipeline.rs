use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::calibration::{self, CalibrationModel};
use crate::config::Config;
use crate::dataset::{self, Dataset, RejectedRow};
use crate::error::Error;
use crate::resolve::{self, Resolution};
use crate::Result;

/// Everything derived from one plate
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    /// Usually the stem of the source file
    pub name: String,
    pub dilution_factor: f64,
    pub model: CalibrationModel<f64>,
    /// One entry per sample, in plate order
    pub results: Vec<Resolution<f64>>,
    pub rejected: Vec<RejectedRow>,
}

/// Fit the standards of `dataset` and resolve its samples
///
/// # Errors
/// - [`Error::InvalidDilutionFactor`] if `dilution_factor` is not finite and positive
/// - any error of [`calibration::fit`], in which case none of the samples can be resolved
pub fn analyse(
    name: impl Into<String>,
    dataset: Dataset,
    dilution_factor: f64,
    config: &Config,
) -> ::std::result::Result<Analysis, Error> {
    if !dilution_factor.is_finite() || dilution_factor <= 0.0 {
        return Err(Error::InvalidDilutionFactor(dilution_factor));
    }

    let model = calibration::fit(&dataset.standards)?;
    let results = resolve::resolve(
        &model,
        &dataset.samples,
        dilution_factor,
        &config.dilution_target(),
    );

    Ok(Analysis {
        name: name.into(),
        dilution_factor,
        model,
        results,
        rejected: dataset.rejected,
    })
}

/// Analyse a single plate reader export, reading the dilution from its file name
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, if its name carries a malformed
/// dilution, or if the calibration fails.
pub fn analyse_file(path: &Path, config: &Config) -> Result<Analysis> {
    let name = path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or("file name is not valid unicode")?
        .to_owned();
    let dilution = dilution_from_name(&name, config)?;
    log::info!("working on {name}, diluted {dilution}-fold");

    let dataset = dataset::from_file(path, config)?;
    let analysis = analyse(name, dataset, f64::from(dilution), config)?;
    log::debug!("{}: {}", analysis.name, analysis.model);
    Ok(analysis)
}

fn dilution_from_name(name: &str, config: &Config) -> ::std::result::Result<u32, Error> {
    dataset::dilution_from_file_name(name, &config.dilution.file_name_marker)
}

/// Analyse every `csv` export in `directory`, in file name order
///
/// Each plate is analysed independently: a plate which fails is returned with its error and the
/// others still complete.
///
/// # Errors
/// Returns an error only if `directory` itself cannot be listed.
pub fn analyse_directory(
    directory: &Path,
    config: &Config,
) -> Result<Vec<(PathBuf, Result<Analysis>)>> {
    let mut paths = fs::read_dir(directory)?
        .filter_map(::std::result::Result::ok)
        .map(|dir_entry| dir_entry.path())
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "csv"))
        .collect::<Vec<_>>();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let analysis = analyse_file(&path, config);
            (path, analysis)
        })
        .collect())
}
