//! Shared sample sources for the metric integration tests.

#![allow(dead_code)]

use mattes_core::{IntensityRange, SampleError, SamplePoint, SampleSet, SampleSource};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sample spacing of [`TranslationSource`].
pub const SPACING: f64 = 0.05;

pub fn fixed_image(x: f64) -> f64 {
    2.0 * (-(x - 5.4).powi(2) / 4.0).exp()
}

pub fn moving_image(x: f64) -> f64 {
    3.0 * (-(x - 5.0).powi(2) / 4.0).exp() + 0.2 * x
}

pub fn moving_gradient(x: f64) -> f64 {
    -1.5 * (x - 5.0) * (-(x - 5.0).powi(2) / 4.0).exp() + 0.2
}

/// One-dimensional smooth image pair under a translation `shift` of the
/// moving image; the single parameter is the shift itself.
#[derive(Debug, Clone)]
pub struct TranslationSource {
    domain: Vec<usize>,
    pub shift: f64,
    pub poisoned_offset: Option<usize>,
}

impl TranslationSource {
    pub fn new(len: usize, shift: f64) -> Self {
        Self {
            domain: vec![len],
            shift,
            poisoned_offset: None,
        }
    }

    pub fn with_shift(&self, shift: f64) -> Self {
        Self {
            shift,
            ..self.clone()
        }
    }
}

impl SampleSource for TranslationSource {
    fn domain_size(&self) -> &[usize] {
        &self.domain
    }

    fn number_of_parameters(&self) -> usize {
        1
    }

    fn fixed_intensity_range(&self) -> IntensityRange {
        IntensityRange::new(0.0, 2.5)
    }

    fn moving_intensity_range(&self) -> IntensityRange {
        IntensityRange::new(-1.0, 6.0)
    }

    fn sample(&self, offset: usize) -> Result<Option<SamplePoint>, SampleError> {
        if offset >= self.domain[0] {
            return Err(SampleError::OffsetOutOfRange {
                offset,
                len: self.domain[0],
            });
        }
        let x = offset as f64 * SPACING;
        let moving_x = x + self.shift;
        let moving_value = if self.poisoned_offset == Some(offset) {
            f64::NAN
        } else {
            moving_image(moving_x)
        };
        Ok(Some(SamplePoint::new(
            fixed_image(x),
            moving_value,
            DVector::from_element(1, moving_gradient(moving_x)),
            DMatrix::from_element(1, 1, 1.0),
        )))
    }
}

/// Random correlated intensities over a `width x height` domain with two
/// affine parameters per sample.
pub fn random_samples(width: usize, height: usize, seed: u64) -> SampleSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..width * height)
        .map(|_| {
            let fixed: f64 = rng.gen_range(0.0..100.0);
            let moving = 0.5 * fixed + rng.gen_range(-10.0..10.0);
            SamplePoint::new(
                fixed,
                moving,
                DVector::from_vec(vec![rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)]),
                DMatrix::from_fn(2, 2, |_, _| rng.gen_range(-2.0..2.0)),
            )
        })
        .collect();
    SampleSet::from_points(points, 2)
        .with_domain(vec![width, height])
        .expect("domain holds every sample")
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance * expected.abs().max(1.0),
        "expected {}, got {}",
        expected,
        actual
    );
}
