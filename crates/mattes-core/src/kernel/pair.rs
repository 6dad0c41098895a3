//! Kernel pair used to splat samples into a joint histogram.
//!
//! The fixed axis uses a box kernel (one bin per sample) and the moving axis
//! uses a cubic B-spline kernel together with its derivative.

use super::bspline::{CubicBSplineDerivativeKernel, CubicBSplineKernel};
use super::box_kernel::BoxKernel;
use super::trait_::ParzenKernel;

/// Bins touched by one moving-axis sample.
///
/// `first_argument` is the kernel argument `start - term` of the first bin;
/// each following bin adds one to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParzenWindow {
    /// First bin of the window.
    pub start: usize,
    /// Kernel argument at `start`.
    pub first_argument: f64,
    /// Number of bins in the window.
    pub width: usize,
    /// Total bins on the axis; bins at or beyond this are clipped.
    pub axis_bins: usize,
}

impl ParzenWindow {
    /// Iterate `(bin, kernel argument)` pairs inside the valid bin range.
    pub fn bins(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.width)
            .map(move |k| (self.start + k, self.first_argument + k as f64))
            .filter(move |&(bin, _)| bin < self.axis_bins)
    }
}

/// Fixed-axis and moving-axis Parzen kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParzenKernelPair {
    /// Fixed-image kernel.
    pub fixed: BoxKernel,
    /// Moving-image kernel.
    pub moving: CubicBSplineKernel,
    /// Derivative of the moving-image kernel.
    pub moving_derivative: CubicBSplineDerivativeKernel,
}

impl ParzenKernelPair {
    /// Box kernel for the fixed image, cubic B-spline for the moving image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Padding bins kept on each side of both histogram axes.
    pub fn padding(&self) -> usize {
        self.moving.support_half_width().ceil() as usize
    }

    /// Smallest bin count that leaves at least one interior bin.
    pub fn minimum_bins(&self) -> usize {
        2 * self.padding() + 1
    }

    /// Fixed bin for a continuous bin coordinate, clamped to the interior bins.
    pub fn fixed_bin(&self, term: f64, bins: usize) -> usize {
        let (lower, upper) = self.interior(bins);
        self.fixed.bin_index(term).max(lower).min(upper) as usize
    }

    /// Moving bins receiving weight for a continuous bin coordinate.
    pub fn moving_window(&self, term: f64, bins: usize) -> ParzenWindow {
        let (lower, upper) = self.interior(bins);
        let index = (term.floor() as isize).max(lower).min(upper);
        let start = index - (self.padding() as isize - 1);
        ParzenWindow {
            start: start.max(0) as usize,
            first_argument: start as f64 - term,
            width: 2 * self.padding(),
            axis_bins: bins,
        }
    }

    /// Moving-axis weight at kernel argument `u`.
    pub fn moving_weight(&self, u: f64) -> f64 {
        self.moving.evaluate(u)
    }

    /// Moving-axis weight slope at kernel argument `u`.
    pub fn moving_slope(&self, u: f64) -> f64 {
        self.moving_derivative.evaluate(u)
    }

    fn interior(&self, bins: usize) -> (isize, isize) {
        let padding = self.padding() as isize;
        let upper = (bins as isize - padding - 1).max(padding);
        (padding, upper)
    }
}
