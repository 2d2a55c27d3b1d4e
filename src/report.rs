use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::pipeline::Analysis;
use crate::resolve::Resolved;
use crate::Result;

#[derive(Serialize)]
struct Row<'a> {
    sample: &'a str,
    index: usize,
    absorbance: f64,
    concentration_mg_per_ml: Option<f64>,
    in_range: Option<bool>,
    diluted_concentration_mg_per_ml: Option<f64>,
    sample_volume_ul: Option<f64>,
    water_volume_ul: Option<f64>,
    feasible: Option<bool>,
    error: Option<String>,
}

/// Write one CSV row per sample of `analysis`, in plate order
///
/// Samples which could not be resolved keep their row, with the reason in the `error` column.
///
/// # Errors
/// Returns an error if a row cannot be written.
pub fn write<W: io::Write>(writer: W, analysis: &Analysis) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for resolution in &analysis.results {
        let sample = resolution.sample();
        let row = match resolution {
            Ok(result) => Row {
                sample: sample.name(),
                index: sample.ordinal_index(),
                absorbance: sample.measured_absorbance(),
                concentration_mg_per_ml: Some(result.concentration()),
                in_range: Some(result.in_range()),
                diluted_concentration_mg_per_ml: Some(result.diluted_concentration()),
                sample_volume_ul: Some(result.sample_volume_ul()),
                water_volume_ul: Some(result.water_volume_ul()),
                feasible: Some(result.is_feasible()),
                error: None,
            },
            Err(failure) => Row {
                sample: sample.name(),
                index: sample.ordinal_index(),
                absorbance: sample.measured_absorbance(),
                concentration_mg_per_ml: None,
                in_range: None,
                diluted_concentration_mg_per_ml: None,
                sample_volume_ul: None,
                water_volume_ul: None,
                feasible: None,
                error: Some(failure.error.to_string()),
            },
        };
        wtr.serialize(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the report of `analysis` to `path`
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_file(path: &Path, analysis: &Analysis) -> Result<()> {
    let file = fs::File::create(path)?;
    write(io::BufWriter::new(file), analysis)?;
    log::info!("wrote report {path:?}");
    Ok(())
}

/// Human readable summary of `analysis`: the standard curve and each sample's recipe
pub fn summary(analysis: &Analysis) -> String {
    let mut text = format!(
        "{} (dilution {})\n{}\n",
        analysis.name, analysis.dilution_factor, analysis.model
    );

    for resolution in &analysis.results {
        let name = resolution.sample().name();
        // Writing to a `String` cannot fail
        let _ = match resolution {
            Ok(result) => {
                let mut flags = vec![];
                if !result.in_range() {
                    flags.push("outside calibration range");
                }
                if !result.is_feasible() {
                    flags.push("dilution not feasible");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", flags.join(", "))
                };
                writeln!(
                    text,
                    "{name}:{flags}\n  \
                     Concentration [mg/mL] = {:.3}\n  \
                     Dilution [mg/mL] = {:.3}\n  \
                     Sample [µL] = {:.3}\n  \
                     Water [µL] = {:.3}",
                    result.concentration(),
                    result.diluted_concentration(),
                    result.sample_volume_ul(),
                    result.water_volume_ul(),
                )
            }
            Err(failure) => writeln!(text, "{name}:  [failed: {}]", failure.error),
        };
    }

    if !analysis.rejected.is_empty() {
        let _ = writeln!(text, "{} row(s) rejected", analysis.rejected.len());
    }

    text
}
