//! In-memory sample source.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::{DMatrix, DVector};

use super::point::{IntensityRange, SamplePoint};
use super::source::SampleSource;
use crate::error::SampleError;

/// Precomputed sample points over a dense domain.
///
/// Intensity ranges default to the ranges of the stored samples; sources
/// backed by whole images should override them with the image ranges.
#[derive(Debug, Clone)]
pub struct SampleSet {
    domain: Vec<usize>,
    samples: Vec<Option<SamplePoint>>,
    number_of_parameters: usize,
    local_support: bool,
    fixed_range: IntensityRange,
    moving_range: IntensityRange,
}

impl SampleSet {
    /// Create a one-dimensional sample set in which every point is valid.
    pub fn from_points(points: Vec<SamplePoint>, number_of_parameters: usize) -> Self {
        let len = points.len();
        Self::build(vec![len], points.into_iter().map(Some).collect(), number_of_parameters)
    }

    /// Create a sample set over `domain`; `None` entries are points that do
    /// not map into the moving image.
    ///
    /// # Errors
    /// Returns [`SampleError::ShapeMismatch`] when the domain does not hold
    /// exactly `samples.len()` offsets.
    pub fn from_optional_points(
        domain: Vec<usize>,
        samples: Vec<Option<SamplePoint>>,
        number_of_parameters: usize,
    ) -> Result<Self, SampleError> {
        let domain_len: usize = if domain.is_empty() { 0 } else { domain.iter().product() };
        if domain_len != samples.len() {
            return Err(SampleError::ShapeMismatch {
                expected: domain,
                actual: vec![samples.len()],
            });
        }
        Ok(Self::build(domain, samples, number_of_parameters))
    }

    fn build(domain: Vec<usize>, samples: Vec<Option<SamplePoint>>, number_of_parameters: usize) -> Self {
        let fixed_range = IntensityRange::from_values(samples.iter().flatten().map(|s| s.fixed_value));
        let moving_range = IntensityRange::from_values(samples.iter().flatten().map(|s| s.moving_value));

        Self {
            domain,
            samples,
            number_of_parameters,
            local_support: false,
            fixed_range,
            moving_range,
        }
    }

    /// Reshape the domain, keeping the samples in offset order.
    ///
    /// # Errors
    /// Returns [`SampleError::ShapeMismatch`] if the new domain has a
    /// different number of offsets.
    pub fn with_domain(mut self, domain: Vec<usize>) -> Result<Self, SampleError> {
        let domain_len: usize = if domain.is_empty() { 0 } else { domain.iter().product() };
        if domain_len != self.samples.len() {
            return Err(SampleError::ShapeMismatch {
                expected: domain,
                actual: vec![self.samples.len()],
            });
        }
        self.domain = domain;
        Ok(self)
    }

    /// Override the fixed image intensity range.
    pub fn with_fixed_range(mut self, range: IntensityRange) -> Self {
        self.fixed_range = range;
        self
    }

    /// Override the moving image intensity range.
    pub fn with_moving_range(mut self, range: IntensityRange) -> Self {
        self.moving_range = range;
        self
    }

    /// Mark the transform behind these samples as having local support.
    pub fn with_local_support(mut self, local_support: bool) -> Self {
        self.local_support = local_support;
        self
    }

    /// Number of stored offsets, valid or not.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set has no offsets.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Build a sample set from backend tensors.
    ///
    /// # Arguments
    /// * `fixed` - Fixed intensities `[N]`
    /// * `moving` - Moving intensities `[N]`
    /// * `gradients` - Moving gradients `[N, D]`
    /// * `jacobians` - Transform jacobians `[N, D, P]`
    ///
    /// # Errors
    /// Returns [`SampleError::ShapeMismatch`] if the leading dimensions or
    /// the spatial dimensions disagree.
    pub fn from_tensors<B: Backend>(
        fixed: Tensor<B, 1>,
        moving: Tensor<B, 1>,
        gradients: Tensor<B, 2>,
        jacobians: Tensor<B, 3>,
    ) -> Result<Self, SampleError> {
        let [n] = fixed.dims();
        let [n_moving] = moving.dims();
        let [n_gradients, d] = gradients.dims();
        let [n_jacobians, d_jacobian, p] = jacobians.dims();

        if n_moving != n || n_gradients != n || n_jacobians != n {
            return Err(SampleError::ShapeMismatch {
                expected: vec![n, n, n, n],
                actual: vec![n, n_moving, n_gradients, n_jacobians],
            });
        }
        if d_jacobian != d {
            return Err(SampleError::ShapeMismatch {
                expected: vec![n, d, p],
                actual: vec![n_jacobians, d_jacobian, p],
            });
        }

        let fixed = tensor_values(fixed)?;
        let moving = tensor_values(moving)?;
        let gradients = tensor_values(gradients)?;
        let jacobians = tensor_values(jacobians)?;

        let points = (0..n)
            .map(|i| {
                SamplePoint::new(
                    fixed[i],
                    moving[i],
                    DVector::from_column_slice(&gradients[i * d..(i + 1) * d]),
                    DMatrix::from_row_slice(d, p, &jacobians[i * d * p..(i + 1) * d * p]),
                )
            })
            .collect();

        Ok(Self::from_points(points, p))
    }
}

fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f64>, SampleError> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| SampleError::source(format!("Failed to read tensor data: {:?}", e)))
}

impl SampleSource for SampleSet {
    fn domain_size(&self) -> &[usize] {
        &self.domain
    }

    fn number_of_parameters(&self) -> usize {
        self.number_of_parameters
    }

    fn has_local_support(&self) -> bool {
        self.local_support
    }

    fn fixed_intensity_range(&self) -> IntensityRange {
        self.fixed_range
    }

    fn moving_intensity_range(&self) -> IntensityRange {
        self.moving_range
    }

    fn sample(&self, offset: usize) -> Result<Option<SamplePoint>, SampleError> {
        self.samples
            .get(offset)
            .cloned()
            .ok_or(SampleError::OffsetOutOfRange {
                offset,
                len: self.samples.len(),
            })
    }
}
