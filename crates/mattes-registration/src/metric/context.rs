//! Evaluation context of a metric session.
//!
//! The context owns everything an evaluation writes: the shared merge
//! accumulators and the published results. It is created by `initialize`,
//! reset at the start of every evaluation, and its results become visible
//! only once an evaluation has completed successfully.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use rayon::ThreadPool;

use super::accumulator::{ThreadDerivative, ThreadHistogram};
use super::histogram::{HistogramConfiguration, JointPdfDerivatives};
use super::partitioned::PartitionedAccumulator;
use crate::error::Result;

/// Merged joint histogram of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedHistogram {
    /// Normalized joint PDF, `fixed_bins x moving_bins`.
    pub joint_pdf: DMatrix<f64>,
    /// Normalized joint PDF derivatives, if they were accumulated.
    pub joint_pdf_derivatives: Option<JointPdfDerivatives>,
    /// Samples that contributed across all workers.
    pub number_of_valid_points: usize,
}

/// Results of the last successful evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResults {
    /// Normalized joint PDF.
    pub joint_pdf: DMatrix<f64>,
    /// Normalized joint PDF derivatives, when accumulated.
    pub joint_pdf_derivatives: Option<JointPdfDerivatives>,
    /// Fixed marginal PDF.
    pub fixed_marginal: DVector<f64>,
    /// Moving marginal PDF.
    pub moving_marginal: DVector<f64>,
    /// Samples that contributed.
    pub number_of_valid_points: usize,
    /// Negated mutual information.
    pub value: f64,
    /// Gradient of `value`, when requested.
    pub derivative: Option<DVector<f64>>,
}

/// Scratch and result storage of one metric session.
#[derive(Debug)]
pub struct EvaluationContext {
    histogram: HistogramConfiguration,
    joint_pdf: PartitionedAccumulator,
    joint_pdf_derivatives: Option<PartitionedAccumulator>,
    parameter_derivative: Option<PartitionedAccumulator>,
    results: Option<EvaluationResults>,
}

impl EvaluationContext {
    /// Allocate the merge buffers for a histogram layout.
    ///
    /// # Arguments
    /// * `histogram` - Bin layout of the session
    /// * `subsections` - Locked subsections per merge buffer
    /// * `with_joint_pdf_derivatives` - Allocate the derivative volume
    /// * `with_parameter_derivative` - Allocate the per-parameter buffer
    pub fn new(
        histogram: HistogramConfiguration,
        subsections: usize,
        with_joint_pdf_derivatives: bool,
        with_parameter_derivative: bool,
    ) -> Self {
        Self {
            histogram,
            joint_pdf: PartitionedAccumulator::new(histogram.joint_len(), subsections),
            joint_pdf_derivatives: with_joint_pdf_derivatives
                .then(|| PartitionedAccumulator::new(histogram.derivative_len(), subsections)),
            parameter_derivative: with_parameter_derivative
                .then(|| PartitionedAccumulator::new(histogram.number_of_parameters, subsections)),
            results: None,
        }
    }

    /// Histogram layout of the session.
    pub fn histogram(&self) -> &HistogramConfiguration {
        &self.histogram
    }

    /// Results of the last successful evaluation.
    pub fn results(&self) -> Option<&EvaluationResults> {
        self.results.as_ref()
    }

    /// Drop published results and zero every accumulator.
    pub fn reset(&mut self) {
        self.results = None;
        self.joint_pdf.reset();
        if let Some(acc) = self.joint_pdf_derivatives.as_mut() {
            acc.reset();
        }
        if let Some(acc) = self.parameter_derivative.as_mut() {
            acc.reset();
        }
    }

    /// Merge the worker partials on `pool` and normalize the result.
    ///
    /// The joint PDF is scaled by `1 / N` and the derivative volume by
    /// `1 / (N · moving_bin_size)`, `N` being the total valid-point count.
    /// With no valid points nothing is scaled.
    ///
    /// # Errors
    /// Returns an error if a partial has the wrong length.
    pub fn merge_histograms(&mut self, pool: &ThreadPool, partials: &[ThreadHistogram]) -> Result<MergedHistogram> {
        let number_of_valid_points: usize = partials.iter().map(|p| p.number_of_valid_points).sum();
        let with_derivatives = partials.iter().any(|p| p.joint_pdf_derivatives.is_some());

        {
            let joint_pdf = &self.joint_pdf;
            let joint_pdf_derivatives = self.joint_pdf_derivatives.as_ref().filter(|_| with_derivatives);
            pool.install(|| {
                partials.par_iter().enumerate().try_for_each(|(worker, partial)| -> Result<()> {
                    joint_pdf.merge(worker, &partial.joint_pdf)?;
                    if let (Some(acc), Some(derivatives)) = (joint_pdf_derivatives, &partial.joint_pdf_derivatives) {
                        acc.merge(worker, derivatives)?;
                    }
                    Ok(())
                })
            })?;
        }

        let fixed_bins = self.histogram.fixed.bins();
        let moving_bins = self.histogram.moving.bins();

        if number_of_valid_points > 0 {
            self.joint_pdf.scale(1.0 / number_of_valid_points as f64);
        }
        let joint_pdf = DMatrix::from_row_slice(fixed_bins, moving_bins, &self.joint_pdf.to_vec());

        let moving_bin_size = self.histogram.moving.bin_size();
        let joint_pdf_derivatives = match self.joint_pdf_derivatives.as_mut() {
            Some(acc) if with_derivatives => {
                if number_of_valid_points > 0 {
                    acc.scale(1.0 / (number_of_valid_points as f64 * moving_bin_size));
                }
                Some(JointPdfDerivatives::from_vec(
                    fixed_bins,
                    moving_bins,
                    self.histogram.number_of_parameters,
                    acc.to_vec(),
                ))
            }
            _ => None,
        };

        Ok(MergedHistogram {
            joint_pdf,
            joint_pdf_derivatives,
            number_of_valid_points,
        })
    }

    /// Merge per-parameter derivative partials on `pool` and scale them by
    /// `1 / (N · moving_bin_size)`.
    ///
    /// # Errors
    /// Returns an error if a partial has the wrong length or the context was
    /// created without a per-parameter buffer.
    pub fn merge_parameter_derivative(
        &mut self,
        pool: &ThreadPool,
        partials: &[ThreadDerivative],
        number_of_valid_points: usize,
    ) -> Result<DVector<f64>> {
        let parameters = self.histogram.number_of_parameters;
        let acc = self.parameter_derivative.get_or_insert_with(|| PartitionedAccumulator::new(parameters, 1));

        {
            let shared = &*acc;
            pool.install(|| {
                partials
                    .par_iter()
                    .enumerate()
                    .try_for_each(|(worker, partial)| shared.merge(worker, &partial.derivative))
            })?;
        }

        if number_of_valid_points > 0 {
            acc.scale(1.0 / (number_of_valid_points as f64 * self.histogram.moving.bin_size()));
        }
        Ok(DVector::from_vec(acc.to_vec()))
    }

    /// Publish the results of a completed evaluation.
    pub fn publish(&mut self, results: EvaluationResults) -> &EvaluationResults {
        self.results.insert(results)
    }
}
