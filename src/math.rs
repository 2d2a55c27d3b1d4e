use ndarray::Array1;
use num_traits::{Float, NumCast};

/// Compute the arithmetic mean of `values`
///
/// Returns `None` for an empty array, or if the length cannot be represented in `E`.
///
/// # Examples
///
/// ```
/// use bradford::math::mean;
/// use ndarray::arr1;
///
/// let values = arr1(&[1., 2., 3., 6.]);
/// assert_eq!(mean(&values), Some(3.));
/// assert_eq!(mean(&arr1::<f64>(&[])), None);
/// ```
pub fn mean<E: Float>(values: &Array1<E>) -> Option<E> {
    if values.is_empty() {
        return None;
    }
    Some(values.sum() / <E as NumCast>::from(values.len())?)
}

/// Deviations of each element of `values` from their mean
///
/// # Examples
///
/// ```
/// use bradford::math::deviations;
/// use ndarray::arr1;
///
/// let values = arr1(&[1., 2., 3.]);
/// assert_eq!(deviations(&values), Some(arr1(&[-1., 0., 1.])));
/// ```
pub fn deviations<E: Float>(values: &Array1<E>) -> Option<Array1<E>> {
    let mean = mean(values)?;
    Some(values.mapv(|value| value - mean))
}

/// Sum of the element-wise products of `u` and `v`
///
/// # Panics
///
/// If `u` and `v` differ in length.
pub fn sum_of_products<E: Float>(u: &Array1<E>, v: &Array1<E>) -> E {
    assert_eq!(u.len(), v.len());
    (u * v).sum()
}

/// Sum of squared residuals between `observed` and `predicted`
///
/// # Panics
///
/// If `observed` and `predicted` differ in length.
pub fn residual_sum_of_squares<E: Float>(observed: &Array1<E>, predicted: &Array1<E>) -> E {
    assert_eq!(observed.len(), predicted.len());
    (observed - predicted).mapv(|residual| residual * residual).sum()
}

/// Coefficient of determination of `predicted` against `observed`
///
/// $$
///     R^2 = 1 - \frac{SS_{res}}{SS_{tot}}
/// $$
///
/// where $SS_{tot}$ is taken about the mean of `observed`. When every observation is identical
/// $SS_{tot}$ vanishes and the observations are described exactly by a constant, so $R^2$ is
/// defined as one.
///
/// # Examples
///
/// ```
/// use bradford::math::coefficient_of_determination;
/// use ndarray::arr1;
///
/// let observed = arr1(&[0.5, 0.5, 0.5]);
/// let predicted = arr1(&[0.5, 0.5, 0.5]);
/// assert_eq!(coefficient_of_determination(&observed, &predicted), Some(1.0));
/// ```
pub fn coefficient_of_determination<E: Float>(
    observed: &Array1<E>,
    predicted: &Array1<E>,
) -> Option<E> {
    let total = deviations(observed)?.mapv(|d| d * d).sum();
    if total == E::zero() {
        return Some(E::one());
    }
    Some(E::one() - residual_sum_of_squares(observed, predicted) / total)
}
