//! Per-worker histogram accumulation.
//!
//! Every function here runs on one worker over one [`SampleBlock`] and only
//! writes to buffers it owns; the results are merged afterwards.

use mattes_core::{ParzenKernelPair, SampleBlock, SamplePoint, SampleSource};
use nalgebra::DMatrix;

use super::histogram::{HistogramConfiguration, ParzenTerm};
use crate::error::Result;
use crate::validation::validate_sample;

/// Partial joint histogram of one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadHistogram {
    /// Unnormalized joint PDF, row-major `fixed x moving`.
    pub joint_pdf: Vec<f64>,
    /// Unnormalized joint PDF derivatives, parameter index fastest.
    pub joint_pdf_derivatives: Option<Vec<f64>>,
    /// Samples that contributed.
    pub number_of_valid_points: usize,
}

/// Partial per-parameter derivative of one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadDerivative {
    /// Unnormalized derivative, one entry per parameter.
    pub derivative: Vec<f64>,
    /// Samples that contributed.
    pub number_of_valid_points: usize,
}

/// Bins of one sample on both axes.
struct SampleBins {
    fixed_bin: usize,
    moving: ParzenTerm,
}

fn sample_bins(sample: &SamplePoint, histogram: &HistogramConfiguration, kernels: &ParzenKernelPair) -> SampleBins {
    let fixed_term = histogram.fixed.parzen_term(sample.fixed_value);
    SampleBins {
        fixed_bin: kernels.fixed_bin(fixed_term.term, histogram.fixed.bins()),
        moving: histogram.moving.parzen_term(sample.moving_value),
    }
}

/// Splat every sample of `block` into a fresh partial histogram.
///
/// With `with_derivatives`, each sample also adds `-β3'(u) · (∇M · J_μ)` to
/// the derivative volume for every parameter μ; samples whose moving
/// intensity was clamped contribute no derivative.
///
/// # Errors
/// Propagates source failures and invalid samples.
pub fn accumulate_block<S: SampleSource + ?Sized>(
    block: &SampleBlock,
    source: &S,
    histogram: &HistogramConfiguration,
    kernels: &ParzenKernelPair,
    with_derivatives: bool,
) -> Result<ThreadHistogram> {
    let moving_bins = histogram.moving.bins();
    let parameters = histogram.number_of_parameters;

    let mut joint_pdf = vec![0.0; histogram.joint_len()];
    let mut joint_pdf_derivatives = with_derivatives.then(|| vec![0.0; histogram.derivative_len()]);
    let mut number_of_valid_points = 0;

    for offset in block.offsets() {
        let Some(sample) = source.sample(offset)? else {
            continue;
        };
        validate_sample(offset, &sample, with_derivatives.then_some(parameters))?;

        let bins = sample_bins(&sample, histogram, kernels);
        let window = kernels.moving_window(bins.moving.term, moving_bins);
        let row = histogram.cell(bins.fixed_bin, 0);

        for (bin, u) in window.bins() {
            joint_pdf[row + bin] += kernels.moving_weight(u);
        }

        if let Some(derivatives) = joint_pdf_derivatives.as_mut() {
            if !bins.moving.clamped {
                let intensity_jacobian = sample.intensity_jacobian();
                for (bin, u) in window.bins() {
                    let slope = kernels.moving_slope(u);
                    if slope == 0.0 {
                        continue;
                    }
                    let start = (row + bin) * parameters;
                    for (d, dj) in derivatives[start..start + parameters].iter_mut().zip(intensity_jacobian.iter()) {
                        *d -= slope * dj;
                    }
                }
            }
        }

        number_of_valid_points += 1;
    }

    Ok(ThreadHistogram {
        joint_pdf,
        joint_pdf_derivatives,
        number_of_valid_points,
    })
}

/// Accumulate `Σ_m β3'(u_m) · ratio(f, m) · (∇M · J)` over the samples of
/// `block`, where `f` is the sample's fixed bin and `m` runs over its moving
/// Parzen window.
///
/// # Errors
/// Propagates source failures and invalid samples.
pub fn accumulate_ratio_derivative<S: SampleSource + ?Sized>(
    block: &SampleBlock,
    source: &S,
    histogram: &HistogramConfiguration,
    kernels: &ParzenKernelPair,
    ratio: &DMatrix<f64>,
) -> Result<ThreadDerivative> {
    let moving_bins = histogram.moving.bins();
    let parameters = histogram.number_of_parameters;

    let mut derivative = vec![0.0; parameters];
    let mut number_of_valid_points = 0;

    for offset in block.offsets() {
        let Some(sample) = source.sample(offset)? else {
            continue;
        };
        validate_sample(offset, &sample, Some(parameters))?;
        number_of_valid_points += 1;

        let bins = sample_bins(&sample, histogram, kernels);
        if bins.moving.clamped {
            continue;
        }

        let weight: f64 = kernels
            .moving_window(bins.moving.term, moving_bins)
            .bins()
            .map(|(bin, u)| kernels.moving_slope(u) * ratio[(bins.fixed_bin, bin)])
            .sum();
        if weight == 0.0 {
            continue;
        }

        for (d, dj) in derivative.iter_mut().zip(sample.intensity_jacobian().iter()) {
            *d += weight * dj;
        }
    }

    Ok(ThreadDerivative {
        derivative,
        number_of_valid_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::histogram::HistogramAxis;
    use mattes_core::partition::{DenseRegionPartitioner, ThreadPartitioner};
    use mattes_core::{IntensityRange, SampleSet};
    use nalgebra::{DMatrix, DVector};

    fn configuration(parameters: usize) -> HistogramConfiguration {
        HistogramConfiguration {
            fixed: HistogramAxis::new(IntensityRange::new(0.0, 6.0), 10, 2),
            moving: HistogramAxis::new(IntensityRange::new(0.0, 6.0), 10, 2),
            number_of_parameters: parameters,
        }
    }

    fn whole_block(set: &SampleSet) -> SampleBlock {
        DenseRegionPartitioner::new(set.domain_size()).partition(1).remove(0)
    }

    #[test]
    fn test_single_sample_splat() {
        let set = SampleSet::from_points(vec![SamplePoint::intensities(3.0, 3.0)], 0);
        let histogram = configuration(0);
        let partial =
            accumulate_block(&whole_block(&set), &set, &histogram, &ParzenKernelPair::new(), false).unwrap();

        assert_eq!(partial.number_of_valid_points, 1);
        assert!(partial.joint_pdf_derivatives.is_none());
        // 3.0 maps to bin coordinate 5.0: fixed row 5, moving bins 4..=6.
        let row = histogram.cell(5, 0);
        assert!((partial.joint_pdf[row + 4] - 1.0 / 6.0).abs() < 1e-15);
        assert!((partial.joint_pdf[row + 5] - 2.0 / 3.0).abs() < 1e-15);
        assert!((partial.joint_pdf[row + 6] - 1.0 / 6.0).abs() < 1e-15);
        let total: f64 = partial.joint_pdf.iter().sum();
        assert!((total - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_points_are_skipped() {
        let samples = vec![Some(SamplePoint::intensities(1.0, 2.0)), None, Some(SamplePoint::intensities(5.0, 0.5))];
        let set = SampleSet::from_optional_points(vec![3], samples, 0).unwrap();
        let partial =
            accumulate_block(&whole_block(&set), &set, &configuration(0), &ParzenKernelPair::new(), false).unwrap();
        assert_eq!(partial.number_of_valid_points, 2);
    }

    #[test]
    fn test_derivative_volume_of_one_sample() {
        let sample = SamplePoint::new(
            3.0,
            3.3,
            DVector::from_vec(vec![2.0]),
            DMatrix::from_row_slice(1, 2, &[1.0, -0.5]),
        );
        let set = SampleSet::from_points(vec![sample], 2);
        let histogram = configuration(2);
        let kernels = ParzenKernelPair::new();
        let partial = accumulate_block(&whole_block(&set), &set, &histogram, &kernels, true).unwrap();
        let derivatives = partial.joint_pdf_derivatives.unwrap();

        let term = histogram.moving.parzen_term(3.3).term;
        let row = histogram.cell(5, 0);
        for m in 0..10 {
            let u = m as f64 - term;
            let slope = kernels.moving_slope(u);
            let cell = (row + m) * 2;
            assert!((derivatives[cell] + slope * 2.0).abs() < 1e-15, "bin {}", m);
            assert!((derivatives[cell + 1] - slope).abs() < 1e-15, "bin {}", m);
        }
    }

    #[test]
    fn test_clamped_moving_value_has_no_derivative() {
        let sample = SamplePoint::new(3.0, 9.0, DVector::from_vec(vec![1.0]), DMatrix::from_element(1, 1, 1.0));
        let set = SampleSet::from_points(vec![sample], 1).with_moving_range(IntensityRange::new(0.0, 6.0));
        let partial =
            accumulate_block(&whole_block(&set), &set, &configuration(1), &ParzenKernelPair::new(), true).unwrap();
        assert!(partial.joint_pdf_derivatives.unwrap().iter().all(|&d| d == 0.0));
        assert_eq!(partial.number_of_valid_points, 1);
    }

    #[test]
    fn test_invalid_sample_fails_worker() {
        let set = SampleSet::from_points(vec![SamplePoint::intensities(f64::NAN, 1.0)], 0);
        let result = accumulate_block(&whole_block(&set), &set, &configuration(0), &ParzenKernelPair::new(), false);
        assert!(result.is_err());
    }
}
