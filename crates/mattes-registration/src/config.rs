//! Configuration of the Mattes mutual information metric.

use crate::error::{MetricError, Result};

/// Default number of histogram bins per axis.
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// How the metric derivative is obtained from the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivativeMethod {
    /// Accumulate the joint PDF derivative volume during the histogram pass
    /// and contract it with the ratio table.
    #[default]
    JointPdfDerivatives,
    /// Build the ratio table first, then run a second pass over the samples
    /// accumulating straight into a per-parameter buffer.
    RatioTablePass,
}

/// Mattes mutual information configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MattesConfig {
    /// Bins on the fixed-image axis.
    pub fixed_histogram_bins: usize,
    /// Bins on the moving-image axis.
    pub moving_histogram_bins: usize,
    /// Whether derivative evaluation is enabled.
    pub compute_derivative: bool,
    /// Worker threads; `None` uses the rayon default.
    pub number_of_workers: Option<usize>,
    /// Locked subsections of the merge buffers; `None` uses the worker count.
    pub merge_subsections: Option<usize>,
    /// Derivative computation strategy.
    pub derivative_method: DerivativeMethod,
    /// Pre-selected domain offsets; `None` evaluates the whole dense domain.
    pub sampled_points: Option<Vec<usize>>,
}

impl Default for MattesConfig {
    fn default() -> Self {
        Self {
            fixed_histogram_bins: DEFAULT_HISTOGRAM_BINS,
            moving_histogram_bins: DEFAULT_HISTOGRAM_BINS,
            compute_derivative: true,
            number_of_workers: None,
            merge_subsections: None,
            derivative_method: DerivativeMethod::default(),
            sampled_points: None,
        }
    }
}

impl MattesConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bin count of both histogram axes.
    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.fixed_histogram_bins = bins;
        self.moving_histogram_bins = bins;
        self
    }

    /// Set the bin counts of the fixed and moving axes separately.
    pub fn with_axis_bins(mut self, fixed_bins: usize, moving_bins: usize) -> Self {
        self.fixed_histogram_bins = fixed_bins;
        self.moving_histogram_bins = moving_bins;
        self
    }

    /// Disable derivative evaluation.
    pub fn without_derivative(mut self) -> Self {
        self.compute_derivative = false;
        self
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.number_of_workers = Some(workers);
        self
    }

    /// Set the number of locked merge subsections.
    pub fn with_merge_subsections(mut self, subsections: usize) -> Self {
        self.merge_subsections = Some(subsections);
        self
    }

    /// Set the derivative computation strategy.
    pub fn with_derivative_method(mut self, method: DerivativeMethod) -> Self {
        self.derivative_method = method;
        self
    }

    /// Evaluate only the given domain offsets.
    pub fn with_sampled_points(mut self, offsets: Vec<usize>) -> Self {
        self.sampled_points = Some(offsets);
        self
    }

    /// Worker count after applying the default.
    pub fn resolved_workers(&self) -> usize {
        self.number_of_workers.unwrap_or_else(rayon::current_num_threads)
    }

    /// Merge subsection count after applying the default.
    pub fn resolved_merge_subsections(&self) -> usize {
        self.merge_subsections.unwrap_or_else(|| self.resolved_workers())
    }

    /// Check the settings that do not depend on the samples.
    ///
    /// # Errors
    /// Returns [`MetricError::InvalidConfiguration`] if an axis has fewer
    /// than `minimum_bins` bins or a worker/subsection count is zero.
    pub fn validate(&self, minimum_bins: usize) -> Result<()> {
        for (axis, bins) in [
            ("fixed", self.fixed_histogram_bins),
            ("moving", self.moving_histogram_bins),
        ] {
            if bins < minimum_bins {
                return Err(MetricError::invalid_configuration(format!(
                    "{} histogram needs at least {} bins, got {}",
                    axis, minimum_bins, bins
                )));
            }
        }
        if self.number_of_workers == Some(0) {
            return Err(MetricError::invalid_configuration("number of workers must be positive"));
        }
        if self.merge_subsections == Some(0) {
            return Err(MetricError::invalid_configuration("number of merge subsections must be positive"));
        }
        Ok(())
    }
}
