mod common;

use common::{assert_close, random_samples, TranslationSource};
use mattes_core::{SampleSet, SampleSource};
use mattes_registration::{ImageToImageMetric, MattesConfig, MattesMutualInformation, MetricError};

fn evaluate(samples: &SampleSet, config: MattesConfig) -> MattesMutualInformation {
    let mut metric = MattesMutualInformation::new(config);
    metric.initialize(samples).unwrap();
    metric.get_value_and_derivative(samples).unwrap();
    metric
}

#[test]
fn test_worker_count_does_not_change_results() {
    let samples = random_samples(20, 15, 11);
    let reference = evaluate(&samples, MattesConfig::new().with_histogram_bins(16).with_workers(1));
    let expected = reference.last_evaluation().unwrap();

    for workers in [2, 8] {
        for subsections in [1, 3, 64] {
            let metric = evaluate(
                &samples,
                MattesConfig::new()
                    .with_histogram_bins(16)
                    .with_workers(workers)
                    .with_merge_subsections(subsections),
            );
            let actual = metric.last_evaluation().unwrap();

            assert_eq!(actual.number_of_valid_points, expected.number_of_valid_points);
            assert_close(actual.value, expected.value, 1e-12);
            for (a, e) in actual.joint_pdf.iter().zip(expected.joint_pdf.iter()) {
                assert_close(*a, *e, 1e-12);
            }
            let derivative = actual.derivative.as_ref().unwrap();
            for (a, e) in derivative.iter().zip(expected.derivative.as_ref().unwrap().iter()) {
                assert_close(*a, *e, 1e-10);
            }
        }
    }
}

#[test]
fn test_sparse_points_match_dense_domain() {
    let samples = random_samples(12, 10, 5);
    let dense = evaluate(&samples, MattesConfig::new().with_histogram_bins(10).with_workers(3));
    let all: Vec<usize> = (0..samples.number_of_samples()).rev().collect();
    let sparse = evaluate(
        &samples,
        MattesConfig::new().with_histogram_bins(10).with_workers(4).with_sampled_points(all),
    );

    let dense = dense.last_evaluation().unwrap();
    let sparse = sparse.last_evaluation().unwrap();
    assert_eq!(sparse.number_of_valid_points, 120);
    assert_close(sparse.value, dense.value, 1e-12);
    assert_close(
        sparse.derivative.as_ref().unwrap()[1],
        dense.derivative.as_ref().unwrap()[1],
        1e-10,
    );
}

#[test]
fn test_sparse_subset_counts_only_selected_points() {
    let samples = random_samples(12, 10, 9);
    let metric = evaluate(
        &samples,
        MattesConfig::new()
            .with_histogram_bins(10)
            .with_workers(2)
            .with_sampled_points((0..120).step_by(3).collect()),
    );
    assert_eq!(metric.number_of_valid_points(), 40);
}

#[test]
fn test_sampled_points_outside_domain() {
    let samples = random_samples(4, 4, 2);
    let mut metric = MattesMutualInformation::new(MattesConfig::new().with_histogram_bins(8).with_sampled_points(vec![3, 16]));
    let err = metric.initialize(&samples).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn test_local_support_requires_value_only() {
    let samples = random_samples(6, 6, 4).with_local_support(true);

    let mut metric = MattesMutualInformation::new(MattesConfig::new().with_histogram_bins(8));
    let err = metric.initialize(&samples).unwrap_err();
    assert!(matches!(err, MetricError::UnsupportedTransform(_)));

    let mut metric = MattesMutualInformation::new(MattesConfig::new().with_histogram_bins(8).without_derivative());
    metric.initialize(&samples).unwrap();
    assert!(metric.get_value(&samples).unwrap().is_finite());
}

#[test]
fn test_failed_worker_publishes_nothing() {
    let mut source = TranslationSource::new(200, 0.0);
    let mut metric = MattesMutualInformation::new(MattesConfig::new().with_histogram_bins(16).with_workers(4));
    metric.initialize(&source).unwrap();
    metric.get_value_and_derivative(&source).unwrap();
    assert_eq!(metric.number_of_valid_points(), 200);

    source.poisoned_offset = Some(137);
    let err = metric.get_value_and_derivative(&source).unwrap_err();
    assert!(matches!(err, MetricError::InvalidSample { offset: 137, .. }));
    assert!(metric.last_evaluation().is_none());
    assert!(metric.joint_pdf().is_none());
    assert_eq!(metric.number_of_valid_points(), 0);

    // the session recovers once the source is healthy again
    source.poisoned_offset = None;
    let value = metric.get_value(&source).unwrap();
    assert!(value.is_finite());
    assert_eq!(metric.number_of_valid_points(), 200);
}

#[test]
fn test_uninitialized_metric() {
    let source = TranslationSource::new(10, 0.0);
    let mut metric = MattesMutualInformation::new(MattesConfig::new());
    assert!(matches!(metric.get_value(&source), Err(MetricError::NotInitialized)));
    assert!(matches!(metric.get_derivative(&source), Err(MetricError::NotInitialized)));
}

#[test]
fn test_zero_workers_rejected() {
    let source = TranslationSource::new(10, 0.0);
    let mut metric = MattesMutualInformation::new(MattesConfig::new().with_workers(0));
    assert!(metric.initialize(&source).unwrap_err().is_configuration_error());
}
