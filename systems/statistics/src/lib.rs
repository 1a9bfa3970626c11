#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Degenerate-safe statistics over wave and performance series.
//!
//! Every routine in this crate answers small or empty inputs with a zero-like
//! sentinel instead of failing, so callers can invoke them unconditionally
//! from a real-time loop without guarding the sample size first.

pub mod regression;

use zombie_defence_core::{
    Confidence, Outlier, OutlierResult, SeriesPoint, StatisticalSummary, Trend, TrendResult,
    WaveForecast, WavePrediction,
};

pub use regression::{LeastSquares, Polynomial, RegressionBackend, RegressionError};

/// Default σ distance beyond which a sample counts as an outlier.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 2.0;

const TREND_SLOPE_BAND: f64 = 0.1;
const HIGH_CONFIDENCE_R_SQUARED: f64 = 0.85;
const MEDIUM_CONFIDENCE_R_SQUARED: f64 = 0.65;
const MAX_FORECAST_DEGREE: usize = 2;
/// Fixed relative half-width of the forecast band. Heuristic, not a prediction interval.
const FORECAST_BAND: f64 = 0.2;

/// Statistical routines parameterised by a regression backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatisticalEngine<B = LeastSquares> {
    backend: B,
}

impl StatisticalEngine {
    /// Creates an engine backed by the built-in least-squares solver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: RegressionBackend> StatisticalEngine<B> {
    /// Creates an engine that fits polynomials through the provided backend.
    #[must_use]
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Flags samples further than `threshold_sigmas` sample standard deviations from the mean.
    #[must_use]
    pub fn detect_outliers(&self, values: &[f64], threshold_sigmas: f64) -> OutlierResult {
        match values {
            [] => OutlierResult::default(),
            [single] => OutlierResult {
                mean: *single,
                ..OutlierResult::default()
            },
            _ => {
                let mean = mean(values);
                let standard_deviation = sample_variance(values, mean).sqrt();
                if standard_deviation <= 0.0 {
                    return OutlierResult {
                        mean,
                        standard_deviation: 0.0,
                        outliers: Vec::new(),
                        has_outliers: false,
                    };
                }

                let outliers = values
                    .iter()
                    .enumerate()
                    .filter_map(|(index, &value)| {
                        let deviation_sigmas = (value - mean) / standard_deviation;
                        (deviation_sigmas.abs() > threshold_sigmas).then_some(Outlier {
                            value,
                            index,
                            deviation_sigmas,
                        })
                    })
                    .collect::<Vec<_>>();

                OutlierResult {
                    mean,
                    standard_deviation,
                    has_outliers: !outliers.is_empty(),
                    outliers,
                }
            }
        }
    }

    /// Fits an ordinary least-squares line and classifies its direction and fit quality.
    #[must_use]
    pub fn analyze_trend(&self, points: &[SeriesPoint]) -> TrendResult {
        if points.len() <= 1 {
            return TrendResult::stable();
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|point| point.x).sum::<f64>() / n;
        let mean_y = points.iter().map(|point| point.y).sum::<f64>() / n;

        let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), point| {
            let dx = point.x - mean_x;
            (sxx + dx * dx, sxy + dx * (point.y - mean_y))
        });

        if sxx <= 0.0 {
            return TrendResult {
                intercept: mean_y,
                ..TrendResult::stable()
            };
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r_squared = r_squared(points, mean_y, |x| intercept + slope * x);

        let trend = if slope > TREND_SLOPE_BAND {
            Trend::GettingHarder
        } else if slope < -TREND_SLOPE_BAND {
            Trend::GettingEasier
        } else {
            Trend::Stable
        };

        TrendResult {
            trend,
            slope,
            intercept,
            r_squared,
            confidence: confidence_for(r_squared),
        }
    }

    /// Forecasts difficulty for `future_waves` from a polynomial fit of `history`.
    ///
    /// Fewer than two historical points yield zeroed predictions. The band
    /// around each estimate is a fixed ±20% of its magnitude.
    #[must_use]
    pub fn predict_wave_difficulty(
        &self,
        history: &[SeriesPoint],
        future_waves: &[f64],
    ) -> WaveForecast {
        if history.len() < 2 {
            return zeroed_forecast(future_waves, None);
        }

        let degree = MAX_FORECAST_DEGREE.min(history.len() - 1);
        let polynomial = match self.backend.fit_polynomial(history, degree) {
            Ok(polynomial) => polynomial,
            Err(error) => {
                tracing::warn!(%error, degree, points = history.len(), "wave forecast degraded");
                return zeroed_forecast(future_waves, Some(error.to_string()));
            }
        };

        let predictions = future_waves
            .iter()
            .map(|&wave| {
                let predicted = polynomial.evaluate(wave);
                let band = predicted.abs() * FORECAST_BAND;
                WavePrediction {
                    wave,
                    predicted,
                    lower_bound: predicted - band,
                    upper_bound: predicted + band,
                }
            })
            .collect();

        WaveForecast {
            predictions,
            degree: polynomial.degree(),
            diagnostic: None,
        }
    }

    /// Computes descriptive statistics. Empty input yields an all-zero summary.
    #[must_use]
    pub fn calculate_summary(&self, values: &[f64]) -> StatisticalSummary {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return StatisticalSummary::default();
        };

        let mean = mean(&sorted);
        let variance = sample_variance(&sorted, mean);
        let middle = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[middle - 1] + sorted[middle]) / 2.0
        } else {
            sorted[middle]
        };

        StatisticalSummary {
            count: sorted.len(),
            mean,
            median,
            mode: mode_of_sorted(&sorted),
            standard_deviation: variance.sqrt(),
            variance,
            min,
            max,
            range: max - min,
        }
    }
}

fn zeroed_forecast(future_waves: &[f64], diagnostic: Option<String>) -> WaveForecast {
    WaveForecast {
        predictions: future_waves
            .iter()
            .map(|&wave| WavePrediction::zeroed(wave))
            .collect(),
        degree: 0,
        diagnostic,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64
}

fn r_squared(points: &[SeriesPoint], mean_y: f64, predict: impl Fn(f64) -> f64) -> f64 {
    let (ss_res, ss_tot) = points.iter().fold((0.0, 0.0), |(ss_res, ss_tot), point| {
        let residual = point.y - predict(point.x);
        (
            ss_res + residual * residual,
            ss_tot + (point.y - mean_y).powi(2),
        )
    });

    if ss_tot <= 0.0 {
        // A constant series is fitted exactly by the flat line.
        return 1.0;
    }
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

fn confidence_for(r_squared: f64) -> Confidence {
    if r_squared >= HIGH_CONFIDENCE_R_SQUARED {
        Confidence::High
    } else if r_squared >= MEDIUM_CONFIDENCE_R_SQUARED {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Most frequent value of a sorted slice; ties resolve to the smallest value.
fn mode_of_sorted(sorted: &[f64]) -> f64 {
    let mut best = (0.0, 0_usize);
    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let run = sorted[start..]
            .iter()
            .take_while(|candidate| **candidate == value)
            .count();
        if run > best.1 {
            best = (value, run);
        }
        start += run.max(1);
    }
    best.0
}
