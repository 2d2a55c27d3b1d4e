use thiserror::Error;

/// Failures raised while building a standard curve or resolving samples against it
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A straight line needs at least two distinct standard concentrations
    #[error("insufficient calibration data: {distinct} distinct standard concentration(s), at least 2 required")]
    InsufficientCalibrationData { distinct: usize },
    /// The fitted slope is zero, so absorbance carries no information about concentration
    #[error("degenerate calibration: fitted slope is zero, the curve cannot be inverted")]
    DegenerateCalibration,
    /// The diluted concentration of a sample is zero, so no sample volume reaches the target
    #[error("sample {name:?} resolves to zero concentration, no sample volume can be computed")]
    ZeroConcentrationSample { name: String },
    #[error("sample {name:?} has a non-finite absorbance")]
    NonFiniteAbsorbance { name: String },
    #[error("invalid standard {label:?}: {reason}")]
    InvalidStandard { label: String, reason: String },
    #[error("dilution factor must be finite and positive, got {0}")]
    InvalidDilutionFactor(f64),
    #[error("no dilution digits follow {marker:?} in {file_name:?}")]
    InvalidDilutionToken { file_name: String, marker: String },
    #[error("column {0:?} missing from header")]
    MissingColumn(String),
}
