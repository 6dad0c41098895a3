//! Parzen kernel trait.
//!
//! This module defines the weighting function interface shared by the
//! fixed-axis and moving-axis Parzen windows of the joint histogram.

/// Parzen weighting function over a normalized bin offset.
///
/// Kernels are stateless and evaluated from many worker threads at once,
/// hence the `Send + Sync` bound.
pub trait ParzenKernel: Send + Sync {
    /// Evaluate the kernel at offset `u`, measured in bins from the bin centre.
    fn evaluate(&self, u: f64) -> f64;

    /// Half-width of the kernel support, in bins.
    ///
    /// The kernel is zero for every `|u| >= support_half_width()`.
    fn support_half_width(&self) -> f64;
}
