//! Parzen window kernels.
//!
//! This module provides the weighting functions used to spread each sample
//! over neighbouring histogram bins.

pub mod trait_;
pub mod box_kernel;
pub mod bspline;
pub mod pair;

pub use trait_::ParzenKernel;
pub use box_kernel::BoxKernel;
pub use bspline::{CubicBSplineKernel, CubicBSplineDerivativeKernel};
pub use pair::{ParzenKernelPair, ParzenWindow};
