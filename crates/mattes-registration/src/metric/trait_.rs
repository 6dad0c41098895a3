//! Metric trait for image similarity measurement.
//!
//! This module defines the interface an optimizer drives: a metric is
//! initialized once against its sample source and then evaluated many
//! times while the transform parameters change underneath it.

use mattes_core::SampleSource;
use nalgebra::DVector;

use crate::error::Result;

/// Image-to-image similarity metric.
///
/// Lower values indicate better alignment. Evaluations take `&mut self`, so
/// one instance runs at most one evaluation at a time; independent
/// instances may be evaluated concurrently.
pub trait ImageToImageMetric {
    /// Prepare the metric for repeated evaluation against `source`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the source cannot
    /// be handled.
    fn initialize<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<()>;

    /// Metric value at the source's current transform parameters.
    fn get_value<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<f64>;

    /// Metric value and its derivative with respect to every transform
    /// parameter.
    fn get_value_and_derivative<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<(f64, DVector<f64>)>;

    /// Derivative with respect to every transform parameter.
    fn get_derivative<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<DVector<f64>> {
        self.get_value_and_derivative(source).map(|(_, derivative)| derivative)
    }

    /// Number of transform parameters seen at `initialize`.
    fn number_of_parameters(&self) -> usize;

    /// Samples that contributed to the last successful evaluation.
    fn number_of_valid_points(&self) -> usize;

    /// Get the name of this metric.
    fn name(&self) -> &'static str;
}
