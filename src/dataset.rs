use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::calibration::StandardPoint;
use crate::config::Config;
use crate::error::Error;
use crate::resolve::SampleMeasurement;
use crate::Result;

/// A row of the export which was recognised but could not be used
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRow {
    /// One-based line in the source, counting skipped preamble lines
    pub line: u64,
    pub reason: String,
}

/// Standards and unknown samples read from one plate
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    /// In the order of the configured ladder
    pub standards: Vec<StandardPoint<f64>>,
    /// In the order of their sample number
    pub samples: Vec<SampleMeasurement<f64>>,
    pub rejected: Vec<RejectedRow>,
}

/// Read the fold pre-dilution encoded in a data file name
///
/// The one or two digits following the first `marker` give the dilution, so `lysate_1zu10`
/// was diluted ten-fold. Names without the marker were measured undiluted.
///
/// # Errors
/// Returns [`Error::InvalidDilutionToken`] if the marker is not followed by a digit.
pub fn dilution_from_file_name(
    file_name: &str,
    marker: &str,
) -> ::std::result::Result<u32, Error> {
    if marker.is_empty() {
        return Ok(1);
    }
    let Some((_, rest)) = file_name.split_once(marker) else {
        return Ok(1);
    };
    let digits = rest
        .chars()
        .take(2)
        .take_while(char::is_ascii_digit)
        .collect::<String>();

    digits.parse().map_err(|_| Error::InvalidDilutionToken {
        file_name: file_name.to_owned(),
        marker: marker.to_owned(),
    })
}

fn skip_lines<R: BufRead>(reader: &mut R, count: usize) -> io::Result<()> {
    let mut discarded = Vec::new();
    for _ in 0..count {
        discarded.clear();
        if reader.read_until(b'\n', &mut discarded)? == 0 {
            break;
        }
    }
    Ok(())
}

/// Parse a plate reader export in CSV form
///
/// Rows whose content matches a label of the configured standard ladder are calibration
/// standards; rows whose content is the sample prefix followed by a number are unknowns. Every
/// other row is ignored. Replicate wells repeat the averaged absorbance, so the first usable
/// reading of each label is kept. Rows with an unreadable absorbance or sample number are
/// recorded in [`Dataset::rejected`] and do not prevent the rest of the plate being read.
///
/// # Errors
/// Returns an error if the header cannot be read or lacks the content or absorbance column.
pub fn read<R: io::Read>(reader: R, config: &Config) -> Result<Dataset> {
    let columns = &config.columns;
    let mut reader = BufReader::new(reader);
    skip_lines(&mut reader, columns.skip_rows)?;
    #[allow(clippy::cast_possible_truncation)]
    let line_offset = columns.skip_rows as u64;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|header| header == name);
    let content_index = position(columns.content.as_str())
        .ok_or_else(|| Error::MissingColumn(columns.content.clone()))?;
    let absorbance_index = position(columns.absorbance.as_str())
        .ok_or_else(|| Error::MissingColumn(columns.absorbance.clone()))?;
    let name_index = position(columns.sample_name.as_str());
    if name_index.is_none() {
        log::warn!(
            "column {:?} missing, samples are named by their content tag",
            columns.sample_name
        );
    }

    let mut rejected = vec![];
    let mut standard_readings: HashMap<String, f64> = HashMap::new();
    let mut sample_readings: BTreeMap<usize, (String, f64)> = BTreeMap::new();

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                rejected.push(RejectedRow {
                    line: e.position().map_or(0, csv::Position::line) + line_offset,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map_or(0, csv::Position::line) + line_offset;

        let Some(content) = record.get(content_index).filter(|c| !c.is_empty()) else {
            continue;
        };
        let is_standard = config.standards.iter().any(|s| s.label == content);
        let sample_number = content.strip_prefix(columns.sample_prefix.as_str());
        if !is_standard && sample_number.is_none() {
            continue;
        }

        let absorbance = match record.get(absorbance_index).map(str::parse::<f64>) {
            Some(Ok(absorbance)) if absorbance.is_finite() => absorbance,
            _ => {
                rejected.push(RejectedRow {
                    line,
                    reason: format!("unreadable absorbance for {content:?}"),
                });
                continue;
            }
        };

        if is_standard {
            standard_readings
                .entry(content.to_owned())
                .or_insert(absorbance);
            continue;
        }

        match sample_number.map(str::parse::<usize>) {
            Some(Ok(number)) if number > 0 => {
                let name = name_index
                    .and_then(|index| record.get(index))
                    .filter(|name| !name.is_empty())
                    .unwrap_or(content);
                sample_readings
                    .entry(number)
                    .or_insert_with(|| (name.to_owned(), absorbance));
            }
            _ => rejected.push(RejectedRow {
                line,
                reason: format!("unreadable sample number in {content:?}"),
            }),
        }
    }

    let mut standards = Vec::with_capacity(config.standards.len());
    for definition in &config.standards {
        let Some(absorbance) = standard_readings.get(&definition.label) else {
            log::warn!("standard {:?} not found on the plate", definition.label);
            continue;
        };
        match StandardPoint::new(&definition.label, definition.concentration, *absorbance) {
            Ok(standard) => standards.push(standard),
            Err(e) => log::warn!("skipping standard: {e}"),
        }
    }

    if let Some(last) = sample_readings.keys().next_back() {
        if *last != sample_readings.len() {
            log::warn!(
                "{} of {last} sample numbers are present on the plate",
                sample_readings.len()
            );
        }
    }
    let samples = sample_readings
        .into_iter()
        .map(|(number, (name, absorbance))| SampleMeasurement::new(name, absorbance, number - 1))
        .collect();

    for row in &rejected {
        log::warn!("line {}: {}", row.line, row.reason);
    }

    Ok(Dataset {
        standards,
        samples,
        rejected,
    })
}

/// Read a plate reader export from disk
///
/// # Errors
/// Returns an error if the file cannot be read, or as for [`read`].
pub fn from_file(path: &Path, config: &Config) -> Result<Dataset> {
    let file = fs::read(path)?;
    let dataset = read(&file[..], config)?;
    log::debug!(
        "read {} standards and {} samples from {path:?}",
        dataset.standards.len(),
        dataset.samples.len()
    );
    Ok(dataset)
}
