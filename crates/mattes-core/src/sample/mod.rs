//! Sample points and the sources that produce them.

pub mod point;
pub mod source;
pub mod set;

pub use point::{IntensityRange, SamplePoint};
pub use source::SampleSource;
pub use set::SampleSet;
