#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timer-driven balance analysis.
//!
//! [`BalanceTracker`] watches the host's event stream, samples the session's
//! live counters once per configured interval and composes the combat balance
//! rules with the statistical engine into a [`BalanceReport`].

pub mod metrics;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use zombie_defence_core::{
    BalanceIssue, BalanceReport, Confidence, Event, IssueType, LiveCounters, SeriesPoint,
    Severity, Trend,
};
use zombie_defence_system_combat_balance::{
    analyze_tower_efficiency, can_defend_wave, detect_balance_issues, detect_enemy_imbalance,
    detect_tower_outliers, severity_for, Bound,
};
use zombie_defence_system_difficulty::WavePlan;
use zombie_defence_system_statistics::{
    LeastSquares, RegressionBackend, StatisticalEngine, DEFAULT_OUTLIER_THRESHOLD,
};

use crate::metrics::{derive_snapshot, distinct_towers, plan_threats, wave_difficulty, AverageEnemy};

/// Wall-clock budget of one analysis pass.
pub const ANALYSIS_BUDGET: Duration = Duration::from_millis(5);

/// Highest multiplier the difficulty controller settles at under sustained dominance.
pub const MULTIPLIER_CEILING: f64 = 1.25;
const MULTIPLIER_TOLERANCE: f64 = 1e-9;

/// Tuning knobs of the tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Game time between two scheduled analysis passes. Zero analyses on every tick.
    pub interval: Duration,
    /// σ distance beyond which a wave or tower counts as an outlier.
    pub outlier_threshold_sigmas: f64,
    /// Number of upcoming waves forecast in each report.
    pub forecast_horizon: u32,
    /// Length of the enemy path in world units, walked by the defence check.
    pub path_length: f64,
    /// Also reports enemy kinds whose threat score leaves the balanced band.
    pub enemy_threat_checks: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            outlier_threshold_sigmas: DEFAULT_OUTLIER_THRESHOLD,
            forecast_horizon: 3,
            path_length: 1_000.0,
            enemy_threat_checks: false,
        }
    }
}

/// Samples the session on a timer and publishes balance reports.
#[derive(Debug)]
pub struct BalanceTracker<B = LeastSquares> {
    config: TrackerConfig,
    engine: StatisticalEngine<B>,
    elapsed: Duration,
    refresh_requested: bool,
    difficulty: Vec<SeriesPoint>,
    kill_rates: Vec<f64>,
    last_plan: Option<WavePlan>,
    multiplier: f64,
    seen_kills: u32,
    seen_leaks: u32,
    last_report: Option<BalanceReport>,
}

impl BalanceTracker {
    /// Creates a tracker backed by the built-in least-squares solver.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_engine(config, StatisticalEngine::new())
    }
}

impl Default for BalanceTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl<B: RegressionBackend> BalanceTracker<B> {
    /// Creates a tracker that forecasts through the provided engine.
    #[must_use]
    pub fn with_engine(config: TrackerConfig, engine: StatisticalEngine<B>) -> Self {
        Self {
            config,
            engine,
            elapsed: Duration::ZERO,
            refresh_requested: false,
            difficulty: Vec::new(),
            kill_rates: Vec::new(),
            last_plan: None,
            multiplier: 1.0,
            seen_kills: 0,
            seen_leaks: 0,
            last_report: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Returns the last report published by the tracker, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&BalanceReport> {
        self.last_report.as_ref()
    }

    /// Recorded wave-difficulty series, ordered by wave.
    #[must_use]
    pub fn difficulty_series(&self) -> &[SeriesPoint] {
        &self.difficulty
    }

    /// Kill rate of every completed wave observed so far.
    #[must_use]
    pub fn kill_rates(&self) -> &[f64] {
        &self.kill_rates
    }

    /// Asks for an analysis pass on the next tick. Repeated requests coalesce.
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Records the composed plan of a wave as a difficulty data point.
    ///
    /// Recording the same wave twice replaces the earlier point.
    pub fn record_wave_difficulty(&mut self, plan: &WavePlan) {
        let point = wave_difficulty(plan);
        match self
            .difficulty
            .binary_search_by(|known| known.x.total_cmp(&point.x))
        {
            Ok(index) => self.difficulty[index] = point,
            Err(index) => self.difficulty.insert(index, point),
        }
        self.multiplier = plan.multiplier;
        self.last_plan = Some(plan.clone());
    }

    /// Consumes a batch of events and publishes at most one report.
    ///
    /// `counters` must describe the session after the batch was applied. A
    /// pass runs when the accumulated game time reaches the interval or a
    /// refresh was requested, and only in a batch that advanced time.
    /// Intervals missed by a long tick are coalesced into a single pass.
    pub fn handle(&mut self, events: &[Event], counters: &LiveCounters, out: &mut Vec<BalanceReport>) {
        let mut ticked = false;
        let mut wave_completed = false;

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    ticked = true;
                    self.elapsed = self.elapsed.saturating_add(*dt);
                }
                Event::WaveCompleted { .. } => wave_completed = true,
                _ => {}
            }
        }

        if wave_completed {
            self.record_kill_rate(counters);
        }

        if !ticked {
            return;
        }

        let interval = self.config.interval;
        let scheduled = if interval.is_zero() {
            true
        } else if self.elapsed >= interval {
            let remainder = self.elapsed.as_nanos() % interval.as_nanos();
            self.elapsed = Duration::from_nanos(u64::try_from(remainder).unwrap_or(0));
            true
        } else {
            false
        };

        if !scheduled && !self.refresh_requested {
            return;
        }
        self.refresh_requested = false;

        let report = self.analyze(counters);
        self.last_report = Some(report.clone());
        out.push(report);
    }

    /// Runs one analysis pass over `counters` and the recorded series.
    #[must_use]
    pub fn analyze(&self, counters: &LiveCounters) -> BalanceReport {
        let started = Instant::now();

        let snapshot = derive_snapshot(counters);
        let mut issues = detect_balance_issues(&snapshot);

        let enemy = self
            .last_plan
            .as_ref()
            .map_or_else(AverageEnemy::default, AverageEnemy::of_plan);

        let towers = distinct_towers(&counters.towers);
        let tower_efficiency = analyze_tower_efficiency(&towers, enemy.health, enemy.reward);
        let scores = tower_efficiency
            .iter()
            .map(|report| report.efficiency_score)
            .collect::<Vec<_>>();
        let tower_outliers = self
            .engine
            .detect_outliers(&scores, self.config.outlier_threshold_sigmas);
        issues.extend(detect_tower_outliers(&tower_efficiency, &tower_outliers));

        if self.config.enemy_threat_checks {
            if let Some(plan) = &self.last_plan {
                issues.extend(detect_enemy_imbalance(&plan_threats(plan)));
            }
        }

        let values = self.difficulty.iter().map(|point| point.y).collect::<Vec<_>>();
        let outliers = self
            .engine
            .detect_outliers(&values, self.config.outlier_threshold_sigmas);
        let trend = self.engine.analyze_trend(&self.difficulty);

        if let Some(spike) = outliers
            .outliers
            .iter()
            .find(|outlier| outlier.index + 1 == values.len() && outlier.deviation_sigmas > 0.0)
        {
            let wave = self.difficulty[spike.index].x;
            issues.push(BalanceIssue::new(
                IssueType::DifficultySpike,
                severity_for(spike.value, outliers.mean, Bound::Ceiling),
                format!(
                    "wave {wave} difficulty {:.0} is {:+.1}σ above the session mean {:.0}",
                    spike.value, spike.deviation_sigmas, outliers.mean
                ),
            ));
        }

        if trend.trend == Trend::GettingHarder
            && trend.confidence == Confidence::High
            && self.multiplier + MULTIPLIER_TOLERANCE >= MULTIPLIER_CEILING
        {
            issues.push(BalanceIssue::new(
                IssueType::RunawayDifficulty,
                Severity::High,
                format!(
                    "difficulty keeps rising by {:.0} per wave with the multiplier at {:.2}",
                    trend.slope, self.multiplier
                ),
            ));
        }

        let next_wave = self
            .difficulty
            .last()
            .map_or(f64::from(counters.wave), |point| point.x + 1.0);
        let future_waves = (0..self.config.forecast_horizon)
            .map(|offset| next_wave + f64::from(offset))
            .collect::<Vec<_>>();
        let forecast = self.engine.predict_wave_difficulty(&self.difficulty, &future_waves);

        let total_dps = counters.towers.iter().map(|tower| tower.dps).sum::<f64>();
        let defense = self.last_plan.as_ref().map(|plan| {
            can_defend_wave(
                total_dps,
                plan.total_health(),
                enemy.speed,
                self.config.path_length,
                plan.wave,
            )
        });

        issues.sort_by(|a, b| b.severity.cmp(&a.severity));

        let report = BalanceReport {
            wave: counters.wave,
            multiplier: self.multiplier,
            snapshot,
            issues,
            trend,
            outliers,
            forecast,
            defense,
            tower_efficiency,
            kill_rate_summary: self.engine.calculate_summary(&self.kill_rates),
        };

        let elapsed = started.elapsed();
        if elapsed > ANALYSIS_BUDGET {
            tracing::warn!(
                elapsed_micros = elapsed.as_micros() as u64,
                budget_micros = ANALYSIS_BUDGET.as_micros() as u64,
                "balance analysis exceeded its budget"
            );
        }
        tracing::debug!(
            wave = report.wave,
            issues = report.issues.len(),
            elapsed_micros = elapsed.as_micros() as u64,
            "balance analysis pass"
        );

        report
    }

    fn record_kill_rate(&mut self, counters: &LiveCounters) {
        let kills = counters.kills.saturating_sub(self.seen_kills);
        let leaks = counters.leaks.saturating_sub(self.seen_leaks);
        self.seen_kills = counters.kills;
        self.seen_leaks = counters.leaks;

        let encountered = kills.saturating_add(leaks);
        let kill_rate = if encountered == 0 {
            100.0
        } else {
            f64::from(kills) / f64::from(encountered) * 100.0
        };
        self.kill_rates.push(kill_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    #[test]
    fn refresh_requests_coalesce_until_tick() {
        let mut tracker = BalanceTracker::default();
        let counters = LiveCounters::default();
        let mut out = Vec::new();

        tracker.request_refresh();
        tracker.request_refresh();
        tracker.handle(&[], &counters, &mut out);
        assert!(out.is_empty(), "refresh must wait for a tick");

        tracker.handle(&[tick(16)], &counters, &mut out);
        assert_eq!(out.len(), 1);

        tracker.handle(&[tick(16)], &counters, &mut out);
        assert_eq!(out.len(), 1, "refresh is consumed by the pass");
    }

    #[test]
    fn long_tick_keeps_only_the_remainder() {
        let mut tracker = BalanceTracker::new(TrackerConfig {
            interval: Duration::from_secs(1),
            ..TrackerConfig::default()
        });
        let counters = LiveCounters::default();
        let mut out = Vec::new();

        tracker.handle(&[tick(3_400)], &counters, &mut out);
        assert_eq!(out.len(), 1, "missed intervals coalesce");
        assert_eq!(tracker.elapsed, Duration::from_millis(400));
    }

    #[test]
    fn completed_waves_record_kill_rate_deltas() {
        let mut tracker = BalanceTracker::default();
        let mut out = Vec::new();
        let completed = [Event::WaveCompleted { wave: 1 }];

        let first = LiveCounters {
            kills: 8,
            leaks: 2,
            ..LiveCounters::default()
        };
        tracker.handle(&completed, &first, &mut out);

        let second = LiveCounters {
            kills: 18,
            leaks: 2,
            ..LiveCounters::default()
        };
        tracker.handle(&completed, &second, &mut out);

        assert_eq!(tracker.kill_rates(), &[80.0, 100.0]);
        assert!(out.is_empty());
    }

    #[test]
    fn default_config_matches_engine_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.outlier_threshold_sigmas, DEFAULT_OUTLIER_THRESHOLD);
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(!config.enemy_threat_checks);
    }
}
