//! Cubic B-spline Parzen kernels.
//!
//! The cubic B-spline basis is used as the Parzen window on the moving-image
//! axis of the joint histogram; its derivative drives the metric gradient.
//!
//! The cubic B-spline kernel is defined as:
//! - (2/3) - |x|^2 + (1/2)|x|^3    for |x| < 1
//! - (1/6)(2 - |x|)^3              for 1 <= |x| < 2
//! - 0                             otherwise

use super::trait_::ParzenKernel;

/// Cubic (order 3) B-spline kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CubicBSplineKernel;

impl CubicBSplineKernel {
    /// Half-width of the cubic support in whole bins.
    ///
    /// Histograms built with this kernel keep this many padding bins on each
    /// side, and each sample touches `2 * SUPPORT_HALF_WIDTH` bins.
    pub const SUPPORT_HALF_WIDTH: usize = 2;

    /// Create a new cubic B-spline kernel.
    pub fn new() -> Self {
        Self
    }
}

impl ParzenKernel for CubicBSplineKernel {
    fn evaluate(&self, u: f64) -> f64 {
        let abs_u = u.abs();
        if abs_u < 1.0 {
            (2.0 / 3.0) - abs_u * abs_u + 0.5 * abs_u * abs_u * abs_u
        } else if abs_u < 2.0 {
            let two_minus_u = 2.0 - abs_u;
            (1.0 / 6.0) * two_minus_u * two_minus_u * two_minus_u
        } else {
            0.0
        }
    }

    fn support_half_width(&self) -> f64 {
        Self::SUPPORT_HALF_WIDTH as f64
    }
}

/// First derivative of the cubic B-spline kernel with respect to `u`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CubicBSplineDerivativeKernel;

impl CubicBSplineDerivativeKernel {
    /// Create a new cubic B-spline derivative kernel.
    pub fn new() -> Self {
        Self
    }
}

impl ParzenKernel for CubicBSplineDerivativeKernel {
    fn evaluate(&self, u: f64) -> f64 {
        let abs_u = u.abs();
        if abs_u < 1.0 {
            -2.0 * u + 1.5 * u * abs_u
        } else if abs_u < 2.0 {
            let two_minus_u = 2.0 - abs_u;
            -0.5 * u.signum() * two_minus_u * two_minus_u
        } else {
            0.0
        }
    }

    fn support_half_width(&self) -> f64 {
        CubicBSplineKernel::SUPPORT_HALF_WIDTH as f64
    }
}
