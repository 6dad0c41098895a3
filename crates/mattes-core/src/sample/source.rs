//! Sample source trait.
//!
//! A sample source stands in for the image, transform and interpolator
//! collaborators of a registration: for each offset of its dense domain it
//! produces the intensities, moving gradient and transform jacobian the
//! histogram metric consumes.

use super::point::{IntensityRange, SamplePoint};
use crate::error::SampleError;

/// Producer of sample points over a dense domain.
///
/// Sources are read from every worker thread concurrently and must not
/// change between `initialize` and the end of an evaluation.
pub trait SampleSource: Sync {
    /// Size of the dense sample domain, fastest axis first.
    fn domain_size(&self) -> &[usize];

    /// Number of transform parameters the jacobians cover.
    fn number_of_parameters(&self) -> usize;

    /// Whether the transform has local support.
    ///
    /// Local-support transforms give every sample its own subset of
    /// parameters, so the parameter count grows with the image.
    fn has_local_support(&self) -> bool {
        false
    }

    /// Observed intensity range of the whole fixed image.
    fn fixed_intensity_range(&self) -> IntensityRange;

    /// Observed intensity range of the whole moving image.
    fn moving_intensity_range(&self) -> IntensityRange;

    /// Sample at a linear offset of the domain.
    ///
    /// Returns `Ok(None)` when the point does not map inside the moving
    /// image; such points are not counted by the metric.
    fn sample(&self, offset: usize) -> Result<Option<SamplePoint>, SampleError>;

    /// Total number of offsets in the domain.
    fn number_of_samples(&self) -> usize {
        let size = self.domain_size();
        if size.is_empty() {
            0
        } else {
            size.iter().product()
        }
    }
}
