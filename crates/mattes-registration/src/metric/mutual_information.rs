//! Mattes mutual information metric.

use mattes_core::partition::{DenseRegionPartitioner, SparseIndexPartitioner};
use mattes_core::{ParzenKernelPair, SampleBlock, SampleSource, ThreadPartitioner};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace, warn};

use super::accumulator::{accumulate_block, accumulate_ratio_derivative};
use super::context::{EvaluationContext, EvaluationResults};
use super::histogram::{
    contract_joint_pdf_derivatives, marginal_pdfs, negated_mutual_information, ratio_table, HistogramAxis,
    HistogramConfiguration, JointPdfDerivatives,
};
use super::trait_::ImageToImageMetric;
use crate::config::{DerivativeMethod, MattesConfig};
use crate::error::{MetricError, Result};
use crate::validation::{validate_intensity_range, validate_sampled_points};

/// State created by `initialize` and reused by every evaluation.
#[derive(Debug)]
struct InitializedState {
    partitioner: Box<dyn ThreadPartitioner>,
    pool: ThreadPool,
    number_of_workers: usize,
    number_of_parameters: usize,
    domain: Vec<usize>,
    context: EvaluationContext,
}

impl InitializedState {
    fn check_source<S: SampleSource + ?Sized>(&self, source: &S, with_derivative: bool) -> Result<()> {
        if with_derivative && source.has_local_support() {
            return Err(MetricError::unsupported_transform(
                "transforms with local support are not handled by the threaded derivative",
            ));
        }
        if source.domain_size() != self.domain.as_slice() {
            return Err(MetricError::ShapeMismatch {
                expected: self.domain.clone(),
                actual: source.domain_size().to_vec(),
            });
        }
        if source.number_of_parameters() != self.number_of_parameters {
            return Err(MetricError::ShapeMismatch {
                expected: vec![self.number_of_parameters],
                actual: vec![source.number_of_parameters()],
            });
        }
        Ok(())
    }
}

/// Mattes mutual information between a fixed and a moving image.
///
/// The joint histogram is estimated with Parzen windowing: a box kernel on
/// the fixed axis and a cubic B-spline kernel on the moving axis. Samples
/// are split across a worker pool, each worker fills a private partial
/// histogram, and the partials are merged through range-locked buffers.
///
/// The returned value is the negated mutual information, so that better
/// alignment gives a lower value.
///
/// # Examples
/// ```
/// use mattes_core::{SamplePoint, SampleSet};
/// use mattes_registration::{ImageToImageMetric, MattesConfig, MattesMutualInformation};
///
/// let points = (0..64)
///     .map(|i| SamplePoint::intensities(i as f64, (i % 8) as f64))
///     .collect();
/// let samples = SampleSet::from_points(points, 0);
///
/// let mut metric = MattesMutualInformation::new(MattesConfig::new().with_histogram_bins(8).with_workers(2));
/// metric.initialize(&samples).unwrap();
/// let value = metric.get_value(&samples).unwrap();
/// assert!(value <= 0.0);
/// ```
#[derive(Debug)]
pub struct MattesMutualInformation {
    config: MattesConfig,
    kernels: ParzenKernelPair,
    state: Option<InitializedState>,
}

impl MattesMutualInformation {
    /// Create an uninitialized metric.
    pub fn new(config: MattesConfig) -> Self {
        Self::with_kernels(config, ParzenKernelPair::new())
    }

    /// Create an uninitialized metric with an explicit kernel pair.
    pub fn with_kernels(config: MattesConfig, kernels: ParzenKernelPair) -> Self {
        Self {
            config,
            kernels,
            state: None,
        }
    }

    /// Metric configuration.
    pub fn config(&self) -> &MattesConfig {
        &self.config
    }

    /// Whether `initialize` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Histogram layout established by `initialize`.
    pub fn histogram_configuration(&self) -> Option<&HistogramConfiguration> {
        self.state.as_ref().map(|state| state.context.histogram())
    }

    /// Results of the last successful evaluation.
    pub fn last_evaluation(&self) -> Option<&EvaluationResults> {
        self.state.as_ref().and_then(|state| state.context.results())
    }

    /// Normalized joint PDF of the last successful evaluation.
    pub fn joint_pdf(&self) -> Option<&DMatrix<f64>> {
        self.last_evaluation().map(|results| &results.joint_pdf)
    }

    /// Normalized joint PDF derivatives of the last successful evaluation,
    /// when they were accumulated.
    pub fn joint_pdf_derivatives(&self) -> Option<&JointPdfDerivatives> {
        self.last_evaluation().and_then(|results| results.joint_pdf_derivatives.as_ref())
    }

    /// Fixed marginal PDF of the last successful evaluation.
    pub fn fixed_marginal_pdf(&self) -> Option<&DVector<f64>> {
        self.last_evaluation().map(|results| &results.fixed_marginal)
    }

    /// Moving marginal PDF of the last successful evaluation.
    pub fn moving_marginal_pdf(&self) -> Option<&DVector<f64>> {
        self.last_evaluation().map(|results| &results.moving_marginal)
    }

    fn evaluate<S: SampleSource + ?Sized>(
        &mut self,
        source: &S,
        with_derivative: bool,
    ) -> Result<(f64, Option<DVector<f64>>)> {
        if with_derivative && !self.config.compute_derivative {
            return Err(MetricError::invalid_configuration(
                "derivative requested from a metric configured without derivatives",
            ));
        }

        let kernels = &self.kernels;
        let method = self.config.derivative_method;
        let state = self.state.as_mut().ok_or(MetricError::NotInitialized)?;
        state.context.reset();
        state.check_source(source, with_derivative)?;

        let histogram = *state.context.histogram();
        let blocks = state.partitioner.partition(state.number_of_workers);
        let pool = &state.pool;
        let accumulate_volume = with_derivative && method == DerivativeMethod::JointPdfDerivatives;

        trace!(
            partitioner = state.partitioner.name(),
            blocks = blocks.len(),
            with_derivative,
            "evaluating mattes mutual information"
        );

        let partials = run_workers(pool, &blocks, |block| {
            accumulate_block(block, source, &histogram, kernels, accumulate_volume)
        })?;
        let merged = state.context.merge_histograms(pool, &partials)?;
        let number_of_valid_points = merged.number_of_valid_points;
        trace!(valid_points = number_of_valid_points, "merged partial histograms");
        let parameters = histogram.number_of_parameters;

        if number_of_valid_points == 0 {
            warn!("no valid sample points in mattes mutual information evaluation");
            let derivative = with_derivative.then(|| DVector::zeros(parameters));
            let results = state.context.publish(EvaluationResults {
                fixed_marginal: DVector::zeros(histogram.fixed.bins()),
                moving_marginal: DVector::zeros(histogram.moving.bins()),
                joint_pdf: merged.joint_pdf,
                joint_pdf_derivatives: merged.joint_pdf_derivatives,
                number_of_valid_points,
                value: f64::MAX,
                derivative,
            });
            return Ok((results.value, results.derivative.clone()));
        }

        let (fixed_marginal, moving_marginal) = marginal_pdfs(&merged.joint_pdf);
        let value = negated_mutual_information(&merged.joint_pdf, &fixed_marginal, &moving_marginal);

        let derivative = if with_derivative {
            let ratio = ratio_table(&merged.joint_pdf, &moving_marginal);
            let derivative = match (method, merged.joint_pdf_derivatives.as_ref()) {
                (DerivativeMethod::JointPdfDerivatives, Some(derivatives)) => {
                    contract_joint_pdf_derivatives(derivatives, &ratio)
                }
                (DerivativeMethod::JointPdfDerivatives, None) => {
                    return Err(MetricError::invalid_configuration(
                        "joint PDF derivatives were not accumulated",
                    ));
                }
                (DerivativeMethod::RatioTablePass, _) => {
                    let partials = run_workers(pool, &blocks, |block| {
                        accumulate_ratio_derivative(block, source, &histogram, kernels, &ratio)
                    })?;
                    state
                        .context
                        .merge_parameter_derivative(pool, &partials, number_of_valid_points)?
                }
            };
            Some(derivative)
        } else {
            None
        };

        let results = state.context.publish(EvaluationResults {
            joint_pdf: merged.joint_pdf,
            joint_pdf_derivatives: merged.joint_pdf_derivatives,
            fixed_marginal,
            moving_marginal,
            number_of_valid_points,
            value,
            derivative,
        });
        Ok((results.value, results.derivative.clone()))
    }
}

/// Run `work` over every block on `pool`, waiting for all workers before
/// reporting the first failure.
fn run_workers<T, F>(pool: &ThreadPool, blocks: &[SampleBlock], work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&SampleBlock) -> Result<T> + Sync,
{
    let outcomes: Vec<Result<T>> = pool.install(|| blocks.par_iter().map(|block| work(block)).collect());
    outcomes.into_iter().collect()
}

impl ImageToImageMetric for MattesMutualInformation {
    fn initialize<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        self.state = None;
        self.config.validate(self.kernels.minimum_bins())?;

        if self.config.compute_derivative && source.has_local_support() {
            return Err(MetricError::unsupported_transform(
                "transforms with local support are not handled by the threaded derivative",
            ));
        }
        if let Some(offsets) = &self.config.sampled_points {
            validate_sampled_points(offsets, source)?;
        }
        let fixed_range = source.fixed_intensity_range();
        let moving_range = source.moving_intensity_range();
        validate_intensity_range("fixed", fixed_range)?;
        validate_intensity_range("moving", moving_range)?;

        let padding = self.kernels.padding();
        let histogram = HistogramConfiguration {
            fixed: HistogramAxis::new(fixed_range, self.config.fixed_histogram_bins, padding),
            moving: HistogramAxis::new(moving_range, self.config.moving_histogram_bins, padding),
            number_of_parameters: source.number_of_parameters(),
        };

        let number_of_workers = self.config.resolved_workers();
        let pool = ThreadPoolBuilder::new()
            .num_threads(number_of_workers)
            .thread_name(|i| format!("mattes-worker-{}", i))
            .build()
            .map_err(|e| MetricError::worker_pool(e.to_string()))?;

        let partitioner: Box<dyn ThreadPartitioner> = match &self.config.sampled_points {
            Some(offsets) => Box::new(SparseIndexPartitioner::new(offsets.clone())),
            None => Box::new(DenseRegionPartitioner::new(source.domain_size())),
        };

        let with_derivative = self.config.compute_derivative;
        let method = self.config.derivative_method;
        let context = EvaluationContext::new(
            histogram,
            self.config.resolved_merge_subsections(),
            with_derivative && method == DerivativeMethod::JointPdfDerivatives,
            with_derivative && method == DerivativeMethod::RatioTablePass,
        );

        debug!(
            fixed_bins = histogram.fixed.bins(),
            moving_bins = histogram.moving.bins(),
            fixed_bin_size = histogram.fixed.bin_size(),
            moving_bin_size = histogram.moving.bin_size(),
            parameters = histogram.number_of_parameters,
            workers = number_of_workers,
            samples = partitioner.number_of_samples(),
            partitioner = partitioner.name(),
            "initialized mattes mutual information"
        );

        self.state = Some(InitializedState {
            partitioner,
            pool,
            number_of_workers,
            number_of_parameters: histogram.number_of_parameters,
            domain: source.domain_size().to_vec(),
            context,
        });
        Ok(())
    }

    fn get_value<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<f64> {
        self.evaluate(source, false).map(|(value, _)| value)
    }

    fn get_value_and_derivative<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<(f64, DVector<f64>)> {
        let (value, derivative) = self.evaluate(source, true)?;
        let derivative = derivative.ok_or_else(|| MetricError::invalid_configuration("derivative was not computed"))?;
        Ok((value, derivative))
    }

    fn number_of_parameters(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.number_of_parameters)
    }

    fn number_of_valid_points(&self) -> usize {
        self.last_evaluation().map_or(0, |results| results.number_of_valid_points)
    }

    fn name(&self) -> &'static str {
        "MattesMutualInformation"
    }
}
