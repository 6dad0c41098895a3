//! Per-point inputs of a histogram metric.

use nalgebra::{DMatrix, DVector};

/// One sample of the fixed/moving image pair.
///
/// The jacobian has one row per spatial dimension and one column per
/// transform parameter, so `jacobian^T * moving_gradient` is the change of
/// the moving intensity per parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    /// Fixed image intensity at the sample.
    pub fixed_value: f64,
    /// Interpolated moving image intensity at the mapped point.
    pub moving_value: f64,
    /// Moving image gradient at the mapped point.
    pub moving_gradient: DVector<f64>,
    /// Transform jacobian at the sample, `dimension x parameters`.
    pub jacobian: DMatrix<f64>,
}

impl SamplePoint {
    /// Create a sample point.
    pub fn new(
        fixed_value: f64,
        moving_value: f64,
        moving_gradient: DVector<f64>,
        jacobian: DMatrix<f64>,
    ) -> Self {
        Self {
            fixed_value,
            moving_value,
            moving_gradient,
            jacobian,
        }
    }

    /// Sample without gradient information, for value-only evaluation.
    pub fn intensities(fixed_value: f64, moving_value: f64) -> Self {
        Self {
            fixed_value,
            moving_value,
            moving_gradient: DVector::zeros(0),
            jacobian: DMatrix::zeros(0, 0),
        }
    }

    /// Spatial dimension of the gradient.
    pub fn dimension(&self) -> usize {
        self.moving_gradient.len()
    }

    /// Number of transform parameters covered by the jacobian.
    pub fn number_of_parameters(&self) -> usize {
        self.jacobian.ncols()
    }

    /// Change of the moving intensity per transform parameter.
    pub fn intensity_jacobian(&self) -> DVector<f64> {
        self.jacobian.tr_mul(&self.moving_gradient)
    }
}

/// Observed intensity range of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRange {
    /// Smallest observed intensity.
    pub min: f64,
    /// Largest observed intensity.
    pub max: f64,
}

impl IntensityRange {
    /// Create a range, swapping the bounds if given in reverse.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Range of the finite values in `values`; `[0, 0]` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if min > max {
            Self { min: 0.0, max: 0.0 }
        } else {
            Self { min, max }
        }
    }

    /// Width of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp `value` into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}
