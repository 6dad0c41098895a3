//! Joint histogram layout and the quantities derived from it.
//!
//! Both histogram axes keep `padding` empty bins on each side so that the
//! whole cubic Parzen window of any sample stays inside the histogram. The
//! observed intensity range is mapped onto the interior bins:
//!
//! ```text
//! bin_size       = (max - min) / (bins - 2 * padding)
//! normalized_min = min / bin_size - padding
//! term(value)    = value / bin_size - normalized_min
//! ```
//!
//! so `min` lands on bin coordinate `padding` and `max` on
//! `bins - padding`.

use mattes_core::IntensityRange;
use nalgebra::{DMatrix, DVector};

/// Densities at or below this value are treated as zero before taking a
/// logarithm, in both the metric value and the ratio table.
pub const DENSITY_GUARD: f64 = f64::EPSILON;

/// Continuous bin coordinate of one intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParzenTerm {
    /// Continuous bin coordinate.
    pub term: f64,
    /// Whether the intensity was outside the observed range and clamped.
    pub clamped: bool,
}

/// Bin layout of one histogram axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramAxis {
    bins: usize,
    padding: usize,
    range: IntensityRange,
    bin_size: f64,
    normalized_min: f64,
}

impl HistogramAxis {
    /// Lay out `bins` bins over `range` with `padding` bins on each side.
    ///
    /// A zero-width range gets a unit bin size so that every sample lands on
    /// the first interior bin.
    pub fn new(range: IntensityRange, bins: usize, padding: usize) -> Self {
        let interior = bins.saturating_sub(2 * padding).max(1) as f64;
        let span = range.span();
        let bin_size = if span > 0.0 { span / interior } else { 1.0 };
        Self {
            bins,
            padding,
            range,
            bin_size,
            normalized_min: range.min / bin_size - padding as f64,
        }
    }

    /// Number of bins on the axis.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Padding bins on each side.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Observed intensity range.
    pub fn range(&self) -> IntensityRange {
        self.range
    }

    /// Intensity width of one bin.
    pub fn bin_size(&self) -> f64 {
        self.bin_size
    }

    /// Offset subtracted from `value / bin_size`.
    pub fn normalized_min(&self) -> f64 {
        self.normalized_min
    }

    /// Continuous bin coordinate of `value`, clamped into the observed range.
    pub fn parzen_term(&self, value: f64) -> ParzenTerm {
        let clamped_value = self.range.clamp(value);
        ParzenTerm {
            term: clamped_value / self.bin_size - self.normalized_min,
            clamped: clamped_value != value,
        }
    }
}

/// Histogram layout of a metric session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramConfiguration {
    /// Fixed-image axis (rows of the joint PDF).
    pub fixed: HistogramAxis,
    /// Moving-image axis (columns of the joint PDF).
    pub moving: HistogramAxis,
    /// Transform parameters covered by the derivative.
    pub number_of_parameters: usize,
}

impl HistogramConfiguration {
    /// Cells in the joint PDF.
    pub fn joint_len(&self) -> usize {
        self.fixed.bins() * self.moving.bins()
    }

    /// Entries in the joint PDF derivative volume.
    pub fn derivative_len(&self) -> usize {
        self.joint_len() * self.number_of_parameters
    }

    /// Flat index of joint cell `(fixed_bin, moving_bin)`.
    pub fn cell(&self, fixed_bin: usize, moving_bin: usize) -> usize {
        fixed_bin * self.moving.bins() + moving_bin
    }
}

/// Derivative of the joint PDF with respect to each transform parameter.
///
/// Stored cell by cell with the parameter index varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct JointPdfDerivatives {
    fixed_bins: usize,
    moving_bins: usize,
    parameters: usize,
    data: Vec<f64>,
}

impl JointPdfDerivatives {
    /// Wrap a flat buffer of `fixed_bins * moving_bins * parameters` entries.
    ///
    /// # Panics
    /// Panics if the buffer length does not match the dimensions.
    pub fn from_vec(fixed_bins: usize, moving_bins: usize, parameters: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            fixed_bins * moving_bins * parameters,
            "Derivative buffer does not match its dimensions"
        );
        Self {
            fixed_bins,
            moving_bins,
            parameters,
            data,
        }
    }

    /// `[fixed_bins, moving_bins, parameters]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.fixed_bins, self.moving_bins, self.parameters]
    }

    /// Derivative of cell `(fixed_bin, moving_bin)` for every parameter.
    pub fn cell(&self, fixed_bin: usize, moving_bin: usize) -> &[f64] {
        let start = (fixed_bin * self.moving_bins + moving_bin) * self.parameters;
        &self.data[start..start + self.parameters]
    }

    /// Single entry of the volume.
    pub fn get(&self, fixed_bin: usize, moving_bin: usize, parameter: usize) -> f64 {
        self.cell(fixed_bin, moving_bin)[parameter]
    }

    /// The flat buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Fixed (row) and moving (column) marginals of a joint PDF.
pub fn marginal_pdfs(joint_pdf: &DMatrix<f64>) -> (DVector<f64>, DVector<f64>) {
    let fixed = DVector::from_iterator(joint_pdf.nrows(), joint_pdf.row_iter().map(|row| row.sum()));
    let moving = DVector::from_iterator(joint_pdf.ncols(), joint_pdf.column_iter().map(|col| col.sum()));
    (fixed, moving)
}

/// Negated mutual information of a normalized joint PDF.
///
/// `-Σ p(f,m) · log(p(f,m) / (p_f(f) · p_m(m)))`, skipping cells where
/// any of the three densities is at or below [`DENSITY_GUARD`].
pub fn negated_mutual_information(
    joint_pdf: &DMatrix<f64>,
    fixed_marginal: &DVector<f64>,
    moving_marginal: &DVector<f64>,
) -> f64 {
    let mut sum = 0.0;
    for (f, &fixed_pdf) in fixed_marginal.iter().enumerate() {
        if fixed_pdf <= DENSITY_GUARD {
            continue;
        }
        let log_fixed_pdf = fixed_pdf.ln();
        for (m, &moving_pdf) in moving_marginal.iter().enumerate() {
            let joint = joint_pdf[(f, m)];
            if joint > DENSITY_GUARD && moving_pdf > DENSITY_GUARD {
                sum += joint * ((joint / moving_pdf).ln() - log_fixed_pdf);
            }
        }
    }
    -sum
}

/// Ratio table `log(p(f,m) / p_m(m))`, zero where either density is at or
/// below [`DENSITY_GUARD`].
pub fn ratio_table(joint_pdf: &DMatrix<f64>, moving_marginal: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(joint_pdf.nrows(), joint_pdf.ncols(), |f, m| {
        let joint = joint_pdf[(f, m)];
        let moving_pdf = moving_marginal[m];
        if joint > DENSITY_GUARD && moving_pdf > DENSITY_GUARD {
            (joint / moving_pdf).ln()
        } else {
            0.0
        }
    })
}

/// Gradient of the negated mutual information from the joint PDF
/// derivatives: `-Σ_{f,m} dp(f,m)/dμ · ratio(f,m)`.
pub fn contract_joint_pdf_derivatives(
    derivatives: &JointPdfDerivatives,
    ratio: &DMatrix<f64>,
) -> DVector<f64> {
    let [fixed_bins, moving_bins, parameters] = derivatives.dims();
    let mut gradient = DVector::zeros(parameters);
    for f in 0..fixed_bins {
        for m in 0..moving_bins {
            let r = ratio[(f, m)];
            if r == 0.0 {
                continue;
            }
            for (g, d) in gradient.iter_mut().zip(derivatives.cell(f, m)) {
                *g -= d * r;
            }
        }
    }
    gradient
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> HistogramAxis {
        HistogramAxis::new(IntensityRange::new(0.0, 12.0), 10, 2)
    }

    #[test]
    fn test_axis_layout() {
        let axis = axis();
        assert_eq!(axis.bin_size(), 2.0);
        assert_eq!(axis.normalized_min(), -2.0);
        assert_eq!(axis.parzen_term(0.0).term, 2.0);
        assert_eq!(axis.parzen_term(12.0).term, 8.0);
        assert!(!axis.parzen_term(5.0).clamped);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let axis = axis();
        let below = axis.parzen_term(-3.0);
        assert_eq!(below.term, 2.0);
        assert!(below.clamped);
        let above = axis.parzen_term(40.0);
        assert_eq!(above.term, 8.0);
        assert!(above.clamped);
    }

    #[test]
    fn test_degenerate_range() {
        let axis = HistogramAxis::new(IntensityRange::new(7.0, 7.0), 10, 2);
        assert_eq!(axis.bin_size(), 1.0);
        assert_eq!(axis.parzen_term(7.0).term, 2.0);
    }

    #[test]
    fn test_marginals_and_value_of_product_density() {
        let pf = [0.2, 0.8];
        let pm = [0.5, 0.25, 0.25];
        let joint = DMatrix::from_fn(2, 3, |f, m| pf[f] * pm[m]);
        let (fixed, moving) = marginal_pdfs(&joint);
        assert!((fixed[1] - 0.8).abs() < 1e-15);
        assert!((moving[0] - 0.5).abs() < 1e-15);
        assert!(negated_mutual_information(&joint, &fixed, &moving).abs() < 1e-15);
    }

    #[test]
    fn test_value_of_diagonal_density() {
        let joint = DMatrix::from_diagonal(&DVector::from_vec(vec![0.5, 0.5]));
        let (fixed, moving) = marginal_pdfs(&joint);
        let value = negated_mutual_information(&joint, &fixed, &moving);
        assert!((value + std::f64::consts::LN_2).abs() < 1e-15);
    }

    #[test]
    fn test_ratio_table_guard() {
        let joint = DMatrix::from_row_slice(2, 2, &[0.5, 0.0, 0.25, 0.25]);
        let (_, moving) = marginal_pdfs(&joint);
        let ratio = ratio_table(&joint, &moving);
        assert!((ratio[(0, 0)] - (0.5f64 / 0.75).ln()).abs() < 1e-15);
        assert_eq!(ratio[(0, 1)], 0.0);
        assert_eq!(ratio[(1, 1)], 0.0);
    }

    #[test]
    fn test_contract_derivatives() {
        let derivatives = JointPdfDerivatives::from_vec(1, 2, 2, vec![1.0, 2.0, -1.0, 0.5]);
        let ratio = DMatrix::from_row_slice(1, 2, &[0.5, 2.0]);
        let gradient = contract_joint_pdf_derivatives(&derivatives, &ratio);
        assert_eq!(gradient.as_slice(), &[1.5, -2.0]);
        assert_eq!(derivatives.get(0, 1, 1), 0.5);
    }
}
