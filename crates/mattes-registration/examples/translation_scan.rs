//! Translation Scan Example
//!
//! Evaluates the Mattes mutual information between a synthetic 2-D image
//! and a shifted copy of it:
//!
//! 1. Scan the metric value over a range of horizontal shifts
//! 2. Run a few fixed-step gradient descent iterations from an offset start
//!
//! Usage:
//!   RUST_LOG=debug cargo run --example translation_scan

use mattes_core::{IntensityRange, SampleError, SamplePoint, SampleSource};
use mattes_registration::{ImageToImageMetric, MattesConfig, MattesMutualInformation};
use nalgebra::{DMatrix, DVector};
use tracing::info;
use tracing_subscriber::EnvFilter;

const WIDTH: usize = 64;
const HEIGHT: usize = 48;
const TRUE_SHIFT: [f64; 2] = [3.5, -2.0];

/// Smooth blob image.
fn image(x: f64, y: f64) -> f64 {
    let blob = |cx: f64, cy: f64, r: f64| (-((x - cx).powi(2) + (y - cy).powi(2)) / (2.0 * r * r)).exp();
    100.0 * blob(30.0, 22.0, 7.0) + 60.0 * blob(45.0, 30.0, 4.0) + 0.3 * x
}

fn image_gradient(x: f64, y: f64) -> [f64; 2] {
    let h = 1e-4;
    [
        (image(x + h, y) - image(x - h, y)) / (2.0 * h),
        (image(x, y + h) - image(x, y - h)) / (2.0 * h),
    ]
}

/// Fixed image sampled on the grid, moving image shifted by `TRUE_SHIFT`
/// and sampled at `p + translation`.
struct ShiftedPair {
    domain: [usize; 2],
    translation: [f64; 2],
}

impl SampleSource for ShiftedPair {
    fn domain_size(&self) -> &[usize] {
        &self.domain
    }

    fn number_of_parameters(&self) -> usize {
        2
    }

    fn fixed_intensity_range(&self) -> IntensityRange {
        IntensityRange::new(0.0, 120.0)
    }

    fn moving_intensity_range(&self) -> IntensityRange {
        IntensityRange::new(0.0, 120.0)
    }

    fn sample(&self, offset: usize) -> Result<Option<SamplePoint>, SampleError> {
        let x = (offset % WIDTH) as f64;
        let y = (offset / WIDTH) as f64;
        let mx = x + self.translation[0] - TRUE_SHIFT[0];
        let my = y + self.translation[1] - TRUE_SHIFT[1];
        if mx < 0.0 || my < 0.0 || mx > (WIDTH - 1) as f64 || my > (HEIGHT - 1) as f64 {
            return Ok(None);
        }
        let [gx, gy] = image_gradient(mx, my);
        Ok(Some(SamplePoint::new(
            image(x, y),
            image(mx, my),
            DVector::from_vec(vec![gx, gy]),
            DMatrix::identity(2, 2),
        )))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Mattes Mutual Information Translation Scan");
    println!("==========================================\n");

    let mut pair = ShiftedPair {
        domain: [WIDTH, HEIGHT],
        translation: [0.0, TRUE_SHIFT[1]],
    };
    let mut metric = MattesMutualInformation::new(MattesConfig::new().with_histogram_bins(32).with_workers(4));
    metric.initialize(&pair)?;

    println!("{:>8} {:>12} {:>8}", "shift x", "value", "valid");
    for step in -8..=8 {
        pair.translation[0] = TRUE_SHIFT[0] + step as f64 * 0.5;
        let value = metric.get_value(&pair)?;
        println!("{:>8.2} {:>12.6} {:>8}", pair.translation[0], value, metric.number_of_valid_points());
    }

    println!("\nGradient descent from [0, 0]:");
    pair.translation = [0.0, 0.0];
    let learning_rate = 2.0;
    for iteration in 0..40 {
        let (value, derivative) = metric.get_value_and_derivative(&pair)?;
        pair.translation[0] -= learning_rate * derivative[0];
        pair.translation[1] -= learning_rate * derivative[1];
        if iteration % 5 == 0 {
            info!(iteration, value, x = pair.translation[0], y = pair.translation[1], "descent step");
        }
    }

    println!(
        "Recovered translation [{:.3}, {:.3}] (true [{:.3}, {:.3}])",
        pair.translation[0], pair.translation[1], TRUE_SHIFT[0], TRUE_SHIFT[1]
    );
    Ok(())
}
