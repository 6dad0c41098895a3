//! Zero-order B-spline (box) kernel.
//!
//! The fixed-image marginal does not need to be smooth because it does not
//! depend on the transform parameters, so fixed intensities are assigned to
//! a single bin with this kernel.

use super::trait_::ParzenKernel;

/// Zero-order B-spline kernel.
///
/// Returns 1 on the half-open interval `[-0.5, 0.5)` and 0 elsewhere, so a
/// value sitting exactly on a bin boundary belongs to exactly one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxKernel;

impl BoxKernel {
    /// Create a new box kernel.
    pub fn new() -> Self {
        Self
    }

    /// Index of the single bin receiving weight for a continuous bin coordinate.
    ///
    /// Bin `k` is centred on `k + 0.5`, so this is the bin for which
    /// `evaluate(term - (k + 0.5)) == 1`.
    pub fn bin_index(&self, term: f64) -> isize {
        term.floor() as isize
    }
}

impl ParzenKernel for BoxKernel {
    fn evaluate(&self, u: f64) -> f64 {
        if (-0.5..0.5).contains(&u) {
            1.0
        } else {
            0.0
        }
    }

    fn support_half_width(&self) -> f64 {
        0.5
    }
}
