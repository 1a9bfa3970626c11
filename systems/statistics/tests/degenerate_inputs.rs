use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zombie_defence_core::SeriesPoint;
use zombie_defence_system_statistics::{
    Polynomial, RegressionBackend, RegressionError, StatisticalEngine, DEFAULT_OUTLIER_THRESHOLD,
};

/// Backend standing in for a math library that failed to load.
#[derive(Clone, Copy, Debug, Default)]
struct UnavailableBackend;

impl RegressionBackend for UnavailableBackend {
    fn fit_polynomial(
        &self,
        _points: &[SeriesPoint],
        _degree: usize,
    ) -> Result<Polynomial, RegressionError> {
        Err(RegressionError::Singular)
    }
}

#[test]
fn unavailable_backend_degrades_to_zeroed_forecast() {
    let engine = StatisticalEngine::with_backend(UnavailableBackend);
    let history = [SeriesPoint::new(1.0, 120.0), SeriesPoint::new(2.0, 140.0)];

    let forecast = engine.predict_wave_difficulty(&history, &[3.0, 4.0, 5.0]);

    assert_eq!(forecast.predictions.len(), 3);
    for (prediction, wave) in forecast.predictions.iter().zip([3.0, 4.0, 5.0]) {
        assert_eq!(prediction.wave, wave);
        assert_eq!(prediction.predicted, 0.0);
        assert_eq!(prediction.lower_bound, 0.0);
        assert_eq!(prediction.upper_bound, 0.0);
    }
    assert!(forecast.diagnostic.is_some());
}

#[test]
fn other_routines_do_not_depend_on_the_backend() {
    let engine = StatisticalEngine::with_backend(UnavailableBackend);
    let points = [
        SeriesPoint::new(1.0, 1.0),
        SeriesPoint::new(2.0, 2.0),
        SeriesPoint::new(3.0, 3.0),
    ];

    assert!(engine.analyze_trend(&points).slope > 0.9);
    assert_eq!(engine.calculate_summary(&[1.0, 2.0, 3.0]).median, 2.0);
}

#[test]
fn random_samples_never_break_summary_invariants() {
    let engine = StatisticalEngine::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_0f_57a7);

    for _ in 0..200 {
        let len = rng.gen_range(0..40);
        let values = (0..len)
            .map(|_| rng.gen_range(-500.0..500.0))
            .collect::<Vec<f64>>();

        let summary = engine.calculate_summary(&values);
        assert_eq!(summary.count, values.len());
        assert!(summary.variance >= 0.0);
        if values.is_empty() {
            continue;
        }
        assert!(summary.min <= summary.median && summary.median <= summary.max);
        assert!(summary.min <= summary.mean && summary.mean <= summary.max);
        assert!((summary.range - (summary.max - summary.min)).abs() < 1e-9);

        let outliers = engine.detect_outliers(&values, DEFAULT_OUTLIER_THRESHOLD);
        assert_eq!(outliers.has_outliers, !outliers.outliers.is_empty());
        for outlier in &outliers.outliers {
            assert_eq!(values[outlier.index], outlier.value);
            assert!(outlier.deviation_sigmas.abs() > DEFAULT_OUTLIER_THRESHOLD);
        }
    }
}
