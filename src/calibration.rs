use std::cmp::Ordering;
use std::fmt;

use itertools::{Itertools, MinMaxResult};
use ndarray::Array1;
use num_traits::Float;
use serde::Serialize;

use crate::error::Error;
use crate::math;

/// A reference solution of known protein concentration and its measured absorbance
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StandardPoint<E> {
    label: String,
    known_concentration: E,
    measured_absorbance: E,
}

impl<E: Float> StandardPoint<E> {
    /// Construct a standard, rejecting values which cannot lie on a calibration curve
    ///
    /// # Errors
    /// Returns [`Error::InvalidStandard`] if the concentration is negative or non-finite, or if
    /// the absorbance is non-finite.
    pub fn new(
        label: impl Into<String>,
        known_concentration: E,
        measured_absorbance: E,
    ) -> Result<Self, Error> {
        let label = label.into();
        if !known_concentration.is_finite() || known_concentration < E::zero() {
            return Err(Error::InvalidStandard {
                label,
                reason: "concentration must be finite and non-negative".into(),
            });
        }
        if !measured_absorbance.is_finite() {
            return Err(Error::InvalidStandard {
                label,
                reason: "absorbance must be finite".into(),
            });
        }
        Ok(Self {
            label,
            known_concentration,
            measured_absorbance,
        })
    }
}

impl<E: Copy> StandardPoint<E> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn known_concentration(&self) -> E {
        self.known_concentration
    }

    pub const fn measured_absorbance(&self) -> E {
        self.measured_absorbance
    }
}

/// The span of concentrations bounded by the lowest and highest standard
///
/// Back-calculated concentrations are only trusted inside this window. Both edges are included.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConcentrationRange<E> {
    min: E,
    max: E,
}

impl<E: Float> ConcentrationRange<E> {
    /// A range between `a` and `b`, in either order
    pub fn new(a: E, b: E) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// The smallest range containing every element of `values`
    pub fn spanning(values: &[E]) -> Option<Self> {
        match values.iter().copied().minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(value) => Some(Self::new(value, value)),
            MinMaxResult::MinMax(min, max) => Some(Self::new(min, max)),
        }
    }

    pub const fn min(&self) -> E {
        self.min
    }

    pub const fn max(&self) -> E {
        self.max
    }

    /// Whether `concentration` lies within the range. `NaN` is never contained.
    pub fn contains(&self, concentration: E) -> bool {
        self.min <= concentration && concentration <= self.max
    }
}

/// The result of an ordinary least-squares straight line fit
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LinearFit<E> {
    pub slope: E,
    pub intercept: E,
    /// Coefficient of determination, clamped to `[0, 1]`
    pub r_squared: E,
}

impl<E: Float> LinearFit<E> {
    pub fn evaluate(&self, x: E) -> E {
        self.slope * x + self.intercept
    }
}

fn distinct_count<E: Float>(values: &[E]) -> usize {
    values
        .iter()
        .copied()
        .sorted_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .dedup()
        .count()
}

/// Regress `y` on `x` by ordinary least squares
///
/// The slope and intercept minimise the sum of squared residuals in `y`. When every `y` is
/// identical the line is flat and passes through every point, so the slope is exactly zero and
/// the coefficient of determination is one. No check is made on the slope here, see
/// [`CalibrationModel::new`].
///
/// # Errors
/// Returns [`Error::InsufficientCalibrationData`] if `x` holds fewer than two distinct values.
///
/// # Panics
/// If `x` and `y` differ in length.
pub fn regress<E: Float>(x: &[E], y: &[E]) -> Result<LinearFit<E>, Error> {
    assert_eq!(x.len(), y.len(), "every concentration needs an absorbance");

    let distinct = distinct_count(x);
    if distinct < 2 {
        return Err(Error::InsufficientCalibrationData { distinct });
    }

    // Guarded above: there is at least one element
    let first = y[0];
    if y.iter().all(|value| *value == first) {
        return Ok(LinearFit {
            slope: E::zero(),
            intercept: first,
            r_squared: E::one(),
        });
    }

    let insufficient = || Error::InsufficientCalibrationData { distinct };
    let x = Array1::from(x.to_vec());
    let y = Array1::from(y.to_vec());

    let dx = math::deviations(&x).ok_or_else(insufficient)?;
    let dy = math::deviations(&y).ok_or_else(insufficient)?;

    let slope = math::sum_of_products(&dx, &dy) / math::sum_of_products(&dx, &dx);
    let intercept = math::mean(&y).ok_or_else(insufficient)?
        - slope * math::mean(&x).ok_or_else(insufficient)?;

    let predicted = x.mapv(|xi| slope * xi + intercept);
    let r_squared = math::coefficient_of_determination(&y, &predicted)
        .ok_or_else(insufficient)?
        .max(E::zero())
        .min(E::one());

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// A linear standard curve, `absorbance = slope * concentration + intercept`
///
/// The slope of a model is always finite and non-zero, so the curve can always be inverted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CalibrationModel<E> {
    slope: E,
    intercept: E,
    r_squared: E,
    valid_range: ConcentrationRange<E>,
}

impl<E: Float> CalibrationModel<E> {
    /// Promote a straight line fit to an invertible calibration
    ///
    /// # Errors
    /// Returns [`Error::DegenerateCalibration`] if the slope is zero or non-finite.
    pub fn new(fit: LinearFit<E>, valid_range: ConcentrationRange<E>) -> Result<Self, Error> {
        if fit.slope == E::zero() || !fit.slope.is_finite() {
            return Err(Error::DegenerateCalibration);
        }
        Ok(Self {
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            valid_range,
        })
    }

    pub const fn slope(&self) -> E {
        self.slope
    }

    pub const fn intercept(&self) -> E {
        self.intercept
    }

    pub const fn r_squared(&self) -> E {
        self.r_squared
    }

    pub const fn valid_range(&self) -> ConcentrationRange<E> {
        self.valid_range
    }

    /// Absorbance predicted by the curve at `concentration`
    pub fn absorbance_at(&self, concentration: E) -> E {
        self.slope * concentration + self.intercept
    }

    /// Concentration at which the curve reaches `absorbance`
    pub fn concentration_at(&self, absorbance: E) -> E {
        (absorbance - self.intercept) / self.slope
    }
}

impl<E: Float + fmt::Display> fmt::Display for CalibrationModel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.intercept < E::zero() { '-' } else { '+' };
        write!(
            f,
            "y = {:.3} x {sign} {:.3}\nR² = {:.3}",
            self.slope,
            self.intercept.abs(),
            self.r_squared
        )
    }
}

/// Fit a standard curve to `standards`
///
/// Absorbance is regressed on concentration by ordinary least squares, and the valid range of the
/// resulting model spans the lowest to the highest standard concentration.
///
/// # Errors
/// - [`Error::InsufficientCalibrationData`] if fewer than two distinct concentrations are given
/// - [`Error::DegenerateCalibration`] if the fitted slope is zero
pub fn fit<E: Float>(standards: &[StandardPoint<E>]) -> Result<CalibrationModel<E>, Error> {
    let (concentration, absorbance): (Vec<E>, Vec<E>) = standards
        .iter()
        .map(|standard| (standard.known_concentration, standard.measured_absorbance))
        .unzip();

    let fit = regress(&concentration, &absorbance)?;
    let valid_range = ConcentrationRange::spanning(&concentration)
        .ok_or(Error::InsufficientCalibrationData { distinct: 0 })?;

    CalibrationModel::new(fit, valid_range)
}
