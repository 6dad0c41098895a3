//! Validation utilities for metric inputs.
//!
//! This module checks the samples handed to the metric workers for
//! non-finite values and for jacobian/gradient shapes that do not match the
//! transform.

use mattes_core::{IntensityRange, SampleSource, SamplePoint};

use crate::error::{MetricError, Result};

/// Validate one sample.
///
/// Intensities must be finite. When `number_of_parameters` is given the
/// sample also feeds the derivative, so the gradient must match the jacobian
/// rows, the jacobian must have one column per parameter, and both must be
/// finite.
///
/// # Errors
/// Returns [`MetricError::InvalidSample`] describing the first problem found.
pub fn validate_sample(
    offset: usize,
    sample: &SamplePoint,
    number_of_parameters: Option<usize>,
) -> Result<()> {
    if !sample.fixed_value.is_finite() {
        return Err(MetricError::invalid_sample(offset, "non-finite fixed intensity"));
    }
    if !sample.moving_value.is_finite() {
        return Err(MetricError::invalid_sample(offset, "non-finite moving intensity"));
    }

    let Some(parameters) = number_of_parameters else {
        return Ok(());
    };

    if sample.jacobian.ncols() != parameters {
        return Err(MetricError::invalid_sample(
            offset,
            format!(
                "jacobian has {} columns, transform has {} parameters",
                sample.jacobian.ncols(),
                parameters
            ),
        ));
    }
    if sample.jacobian.nrows() != sample.moving_gradient.len() {
        return Err(MetricError::invalid_sample(
            offset,
            format!(
                "jacobian has {} rows, moving gradient has {} components",
                sample.jacobian.nrows(),
                sample.moving_gradient.len()
            ),
        ));
    }
    if sample.moving_gradient.iter().any(|g| !g.is_finite()) {
        return Err(MetricError::invalid_sample(offset, "non-finite moving gradient"));
    }
    if sample.jacobian.iter().any(|j| !j.is_finite()) {
        return Err(MetricError::invalid_sample(offset, "non-finite transform jacobian"));
    }

    Ok(())
}

/// Validate an intensity range reported by the sample source.
///
/// # Errors
/// Returns [`MetricError::InvalidConfiguration`] if either bound is not finite.
pub fn validate_intensity_range(image: &str, range: IntensityRange) -> Result<()> {
    if range.min.is_finite() && range.max.is_finite() {
        Ok(())
    } else {
        Err(MetricError::invalid_configuration(format!(
            "{} intensity range [{}, {}] is not finite",
            image, range.min, range.max
        )))
    }
}

/// Validate that pre-selected offsets lie inside the source domain.
///
/// # Errors
/// Returns [`MetricError::InvalidConfiguration`] naming the first offset
/// outside the domain.
pub fn validate_sampled_points<S: SampleSource + ?Sized>(offsets: &[usize], source: &S) -> Result<()> {
    let len = source.number_of_samples();
    match offsets.iter().find(|&&offset| offset >= len) {
        Some(offset) => Err(MetricError::invalid_configuration(format!(
            "sampled point offset {} outside domain of {} samples",
            offset, len
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mattes_core::SampleSet;
    use nalgebra::{DMatrix, DVector};

    fn sample(gradient: Vec<f64>, rows: usize, cols: usize) -> SamplePoint {
        SamplePoint::new(
            1.0,
            2.0,
            DVector::from_vec(gradient),
            DMatrix::from_element(rows, cols, 1.0),
        )
    }

    #[test]
    fn test_intensity_range_must_be_finite() {
        assert!(validate_intensity_range("fixed", IntensityRange::new(-3.0, 8.0)).is_ok());
        assert!(validate_intensity_range("fixed", IntensityRange::new(2.0, 2.0)).is_ok());

        let err = validate_intensity_range("moving", IntensityRange::new(0.0, f64::INFINITY)).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(validate_intensity_range("moving", IntensityRange::new(f64::NEG_INFINITY, 1.0)).is_err());
        assert!(validate_intensity_range("fixed", IntensityRange::new(f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn test_valid_sample() {
        assert!(validate_sample(0, &sample(vec![1.0, 0.5], 2, 6), Some(6)).is_ok());
        assert!(validate_sample(0, &SamplePoint::intensities(1.0, 2.0), None).is_ok());
    }

    #[test]
    fn test_non_finite_intensity() {
        let result = validate_sample(4, &SamplePoint::intensities(1.0, f64::NAN), None);
        assert!(matches!(result, Err(MetricError::InvalidSample { offset: 4, .. })));
    }

    #[test]
    fn test_jacobian_shape_checks() {
        assert!(validate_sample(0, &sample(vec![1.0, 0.5], 2, 5), Some(6)).is_err());
        assert!(validate_sample(0, &sample(vec![1.0], 2, 6), Some(6)).is_err());
        assert!(validate_sample(0, &sample(vec![1.0, f64::INFINITY], 2, 6), Some(6)).is_err());
    }

    #[test]
    fn test_sampled_points_in_domain() {
        let set = SampleSet::from_points(vec![SamplePoint::intensities(0.0, 0.0); 4], 0);
        assert!(validate_sampled_points(&[0, 3], &set).is_ok());
        assert!(validate_sampled_points(&[0, 4], &set).unwrap_err().is_configuration_error());
    }
}
