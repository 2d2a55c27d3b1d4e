use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationModel;
use crate::error::Error;

/// Volume of diluted sample wanted in the working dilution, in µL
pub const DEFAULT_DILUTED_VOLUME_UL: f64 = 10.0;
/// Final volume of the working dilution once diluent is added, in µL
pub const DEFAULT_TOTAL_VOLUME_UL: f64 = 11.25;

/// An unknown sample and its measured absorbance
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleMeasurement<E> {
    name: String,
    measured_absorbance: E,
    /// Position of the sample on the plate, fixes the order samples are reported in
    ordinal_index: usize,
}

impl<E: Copy> SampleMeasurement<E> {
    pub fn new(name: impl Into<String>, measured_absorbance: E, ordinal_index: usize) -> Self {
        Self {
            name: name.into(),
            measured_absorbance,
            ordinal_index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn measured_absorbance(&self) -> E {
        self.measured_absorbance
    }

    pub const fn ordinal_index(&self) -> usize {
        self.ordinal_index
    }
}

/// Volumes the working dilution is made up to
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DilutionTarget<E> {
    pub target_diluted_volume_ul: E,
    pub target_total_volume_ul: E,
}

impl Default for DilutionTarget<f64> {
    fn default() -> Self {
        Self {
            target_diluted_volume_ul: DEFAULT_DILUTED_VOLUME_UL,
            target_total_volume_ul: DEFAULT_TOTAL_VOLUME_UL,
        }
    }
}

/// A sample back-calculated through a calibration, together with its pipetting recipe
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleResult<E> {
    sample: SampleMeasurement<E>,
    concentration: E,
    in_range: bool,
    diluted_concentration: E,
    sample_volume_ul: E,
    water_volume_ul: E,
}

impl<E: Float> SampleResult<E> {
    pub const fn sample(&self) -> &SampleMeasurement<E> {
        &self.sample
    }

    /// Concentration of the measured solution
    pub const fn concentration(&self) -> E {
        self.concentration
    }

    /// Whether the concentration lies between the lowest and highest standard
    pub const fn in_range(&self) -> bool {
        self.in_range
    }

    /// Concentration corrected for the pre-dilution applied before measurement
    pub const fn diluted_concentration(&self) -> E {
        self.diluted_concentration
    }

    pub const fn sample_volume_ul(&self) -> E {
        self.sample_volume_ul
    }

    /// Diluent to add. Negative when the target cannot be reached.
    pub const fn water_volume_ul(&self) -> E {
        self.water_volume_ul
    }

    /// Whether the recipe can be pipetted: a positive sample volume and no negative diluent
    pub fn is_feasible(&self) -> bool {
        self.sample_volume_ul > E::zero() && self.water_volume_ul >= E::zero()
    }
}

/// A sample that could not be resolved, and why
#[derive(Clone, Debug, PartialEq)]
pub struct SampleFailure<E> {
    pub sample: SampleMeasurement<E>,
    pub error: Error,
}

/// The outcome for one sample of a batch
pub type Resolution<E> = Result<SampleResult<E>, SampleFailure<E>>;

/// Access to the sample behind a resolution, whether or not it succeeded
pub trait Resolved<E> {
    fn sample(&self) -> &SampleMeasurement<E>;
}

impl<E: Float> Resolved<E> for Resolution<E> {
    fn sample(&self) -> &SampleMeasurement<E> {
        match self {
            Ok(result) => result.sample(),
            Err(failure) => &failure.sample,
        }
    }
}

fn resolve_one<E: Float>(
    model: &CalibrationModel<E>,
    sample: &SampleMeasurement<E>,
    dilution_factor: E,
    target: &DilutionTarget<E>,
) -> Result<SampleResult<E>, Error> {
    if !sample.measured_absorbance.is_finite() {
        return Err(Error::NonFiniteAbsorbance {
            name: sample.name.clone(),
        });
    }

    let concentration = model.concentration_at(sample.measured_absorbance);
    let in_range = model.valid_range().contains(concentration);

    let diluted_concentration = concentration * dilution_factor;
    if diluted_concentration == E::zero() {
        return Err(Error::ZeroConcentrationSample {
            name: sample.name.clone(),
        });
    }
    let sample_volume_ul = target.target_diluted_volume_ul / diluted_concentration;
    let water_volume_ul = target.target_total_volume_ul - sample_volume_ul;

    Ok(SampleResult {
        sample: sample.clone(),
        concentration,
        in_range,
        diluted_concentration,
        sample_volume_ul,
        water_volume_ul,
    })
}

/// Back-calculate `samples` through `model`
///
/// Each absorbance is converted to a concentration by inverting the standard curve, flagged as in
/// or out of the calibrated range, and given the volumes of sample and water which make up the
/// working dilution described by `target`. `dilution_factor` is the fold dilution applied to the
/// samples before they were measured.
///
/// Samples are resolved independently. A sample which cannot be resolved is returned as a
/// [`SampleFailure`] in its own position, so the output always has the length and order of
/// `samples`.
pub fn resolve<E: Float>(
    model: &CalibrationModel<E>,
    samples: &[SampleMeasurement<E>],
    dilution_factor: E,
    target: &DilutionTarget<E>,
) -> Vec<Resolution<E>> {
    samples
        .iter()
        .map(|sample| {
            resolve_one(model, sample, dilution_factor, target).map_err(|error| SampleFailure {
                sample: sample.clone(),
                error,
            })
        })
        .collect()
}
