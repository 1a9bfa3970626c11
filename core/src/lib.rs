#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Zombie Defence balance engine.
//!
//! This crate defines the message surface that connects the host game to the
//! engine. The host reports what happened through [`Event`] values, the session
//! ledger folds them into [`LiveCounters`], and the pure systems answer with
//! value types: wave compositions, a difficulty multiplier and
//! [`BalanceReport`] records. None of the types here carry identity or
//! cross-references; every one of them can be cloned, compared and serialized.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Events reported by the host game after its own simulation step.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the game clock advanced.
    TimeAdvanced {
        /// Duration of game time that elapsed since the previous report.
        dt: Duration,
    },
    /// Announces that a new wave began spawning.
    WaveStarted {
        /// One-based number of the wave.
        wave: u32,
    },
    /// Announces that every enemy of the wave was either killed or leaked.
    WaveCompleted {
        /// One-based number of the wave.
        wave: u32,
    },
    /// Confirms that an enemy was destroyed by the defence.
    EnemyKilled {
        /// Kind of the destroyed enemy.
        kind: EnemyKind,
    },
    /// Reports that an enemy reached the end of the path.
    EnemyLeaked {
        /// Kind of the enemy that escaped.
        kind: EnemyKind,
        /// Lives the player lost because of the leak.
        lives_lost: u32,
    },
    /// Reports damage applied by towers.
    DamageDealt {
        /// Total damage applied, including wasted damage.
        amount: f64,
        /// Portion of `amount` that exceeded the target's remaining health.
        overkill: f64,
    },
    /// Reports a change of the player's money balance.
    MoneyChanged {
        /// Signed change; positive values are income, negative values spending.
        delta: i64,
    },
    /// Confirms that a tower was placed. Its cost arrives separately as a [`Event::MoneyChanged`].
    TowerPlaced {
        /// Combat statistics of the placed tower.
        tower: TowerStats,
    },
}

/// Enemy archetypes known to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnemyKind {
    /// Baseline walker.
    Basic,
    /// Fragile runner.
    Fast,
    /// Slow, very durable brute.
    Tank,
    /// Plated walker with high durability.
    Armored,
    /// Tiny, cheap enemy that arrives in large numbers.
    Swarm,
    /// Hard-to-target infiltrator.
    Stealth,
    /// Machine-hybrid with heavy durability.
    Mechanical,
    /// Rare late-game boss.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 8] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Tank,
        EnemyKind::Armored,
        EnemyKind::Swarm,
        EnemyKind::Stealth,
        EnemyKind::Mechanical,
        EnemyKind::Boss,
    ];

    /// Canonical upper-case name used by factories and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EnemyKind::Basic => "BASIC",
            EnemyKind::Fast => "FAST",
            EnemyKind::Tank => "TANK",
            EnemyKind::Armored => "ARMORED",
            EnemyKind::Swarm => "SWARM",
            EnemyKind::Stealth => "STEALTH",
            EnemyKind::Mechanical => "MECHANICAL",
            EnemyKind::Boss => "BOSS",
        }
    }

    /// Static tuning constants for the kind.
    #[must_use]
    pub const fn profile(self) -> EnemyTypeProfile {
        match self {
            EnemyKind::Basic => EnemyTypeProfile::new(100.0, 10.0, 50.0, 10, 2.0),
            EnemyKind::Fast => EnemyTypeProfile::new(60.0, 8.0, 90.0, 12, 1.2),
            EnemyKind::Tank => EnemyTypeProfile::new(500.0, 25.0, 25.0, 40, 4.0),
            EnemyKind::Armored => EnemyTypeProfile::new(300.0, 18.0, 35.0, 28, 3.0),
            EnemyKind::Swarm => EnemyTypeProfile::new(30.0, 4.0, 80.0, 3, 0.6),
            EnemyKind::Stealth => EnemyTypeProfile::new(90.0, 12.0, 70.0, 18, 1.8),
            EnemyKind::Mechanical => EnemyTypeProfile::new(400.0, 22.0, 40.0, 35, 3.5),
            EnemyKind::Boss => EnemyTypeProfile::new(2_000.0, 60.0, 20.0, 250, 10.0),
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnemyKind {
    type Err = ParseEnemyKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EnemyKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseEnemyKindError {
                name: value.to_owned(),
            })
    }
}

/// Error returned when an enemy name does not match any [`EnemyKind`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown enemy type `{name}`")]
pub struct ParseEnemyKindError {
    name: String,
}

impl ParseEnemyKindError {
    /// Name that failed to resolve.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Static per-kind constants. Never mutated at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeProfile {
    base_health: f64,
    base_damage: f64,
    speed: f64,
    reward: u32,
    base_spawn_interval: f64,
}

impl EnemyTypeProfile {
    const fn new(
        base_health: f64,
        base_damage: f64,
        speed: f64,
        reward: u32,
        base_spawn_interval: f64,
    ) -> Self {
        Self {
            base_health,
            base_damage,
            speed,
            reward,
            base_spawn_interval,
        }
    }

    /// Health at wave zero.
    #[must_use]
    pub const fn base_health(&self) -> f64 {
        self.base_health
    }

    /// Damage dealt to the player at wave zero.
    #[must_use]
    pub const fn base_damage(&self) -> f64 {
        self.base_damage
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Money granted to the player for a kill.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Seconds between two spawns of this kind before wave scaling.
    #[must_use]
    pub const fn base_spawn_interval(&self) -> f64 {
        self.base_spawn_interval
    }
}

/// One homogeneous group of a wave's composition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveEnemyGroup {
    kind: EnemyKind,
    count: u32,
    spawn_interval_seconds: f64,
}

impl WaveEnemyGroup {
    /// Creates a new group description.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: u32, spawn_interval_seconds: f64) -> Self {
        Self {
            kind,
            count,
            spawn_interval_seconds,
        }
    }

    /// Enemy kind spawned by the group.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Unscaled number of enemies in the group.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Unscaled seconds between two spawns of the group.
    #[must_use]
    pub const fn spawn_interval_seconds(&self) -> f64 {
        self.spawn_interval_seconds
    }
}

/// Fixed world position at which a wave enters the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl SpawnPoint {
    /// Creates a spawn point at the provided coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Most recent performance signal fed into the difficulty controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Percentage of enemies killed before leaking, 0 to 100.
    pub kill_rate: f64,
    /// Lives lost during the measured period.
    pub lives_lost: u32,
    /// Income as a percentage of spending.
    pub resource_efficiency: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            kill_rate: 100.0,
            lives_lost: 0,
            resource_efficiency: 100.0,
        }
    }
}

/// Combat statistics for one tower type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Display name, also used for lookups.
    pub name: String,
    /// Money required to build the tower.
    pub build_cost: f64,
    /// Money invested in upgrades so far.
    #[serde(default)]
    pub upgrade_cost: f64,
    /// Nominal damage per second.
    pub dps: f64,
    /// Targeting range in world units.
    pub range: f64,
    /// Fraction of shots that hit, 0 to 1.
    pub accuracy: f64,
    /// Damage applied by a single hit.
    pub damage_per_hit: f64,
}

impl TowerStats {
    /// Build and upgrade cost combined.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.build_cost + self.upgrade_cost
    }
}

/// Live counters pulled from the session by value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveCounters {
    /// Current money balance.
    pub money: i64,
    /// Remaining lives.
    pub lives: u32,
    /// Active wave number.
    pub wave: u32,
    /// Towers placed so far.
    pub towers: Vec<TowerStats>,
    /// Damage applied over the session.
    pub total_damage: f64,
    /// Damage wasted beyond targets' remaining health.
    pub overkill_damage: f64,
    /// Enemies killed over the session.
    pub kills: u32,
    /// Enemies that reached the end of the path.
    pub leaks: u32,
    /// Money spent over the session.
    pub money_spent: f64,
    /// Money earned over the session.
    pub money_earned: f64,
}

/// Flat record of current-session metrics checked by the balance rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Damage dealt per unit of money spent.
    pub damage_per_dollar: f64,
    /// Percentage of enemies that did not leak.
    pub survival_rate: f64,
    /// Percentage of damage wasted as overkill.
    pub overkill_percent: f64,
    /// Income as a percentage of spending.
    pub economy_efficiency: f64,
}

/// Categories of balance problems the engine can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// Towers deal too little damage per unit of money.
    InefficientTowers,
    /// Too many enemies leak through the defence.
    WeakDefense,
    /// Too much damage is wasted on already-dead enemies.
    ExcessiveOverkill,
    /// The player spends more than they earn.
    NegativeEconomy,
    /// A tower type is far more cost-effective than its peers.
    OverpoweredTower,
    /// A tower type is far less cost-effective than its peers.
    UnderpoweredTower,
    /// An enemy type's threat is out of proportion to its reward.
    UnbalancedEnemy,
    /// A wave is far harder than the rest of the session.
    DifficultySpike,
    /// Difficulty keeps rising while the multiplier is already maxed out.
    RunawayDifficulty,
}

impl IssueType {
    /// Canonical upper-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            IssueType::InefficientTowers => "INEFFICIENT_TOWERS",
            IssueType::WeakDefense => "WEAK_DEFENSE",
            IssueType::ExcessiveOverkill => "EXCESSIVE_OVERKILL",
            IssueType::NegativeEconomy => "NEGATIVE_ECONOMY",
            IssueType::OverpoweredTower => "OVERPOWERED_TOWER",
            IssueType::UnderpoweredTower => "UNDERPOWERED_TOWER",
            IssueType::UnbalancedEnemy => "UNBALANCED_ENEMY",
            IssueType::DifficultySpike => "DIFFICULTY_SPIKE",
            IssueType::RunawayDifficulty => "RUNAWAY_DIFFICULTY",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity of a balance issue, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Minor deviation.
    Low,
    /// Noticeable deviation.
    Medium,
    /// Significant deviation.
    High,
    /// Deviation that breaks the game.
    Critical,
}

impl Severity {
    /// Bands a percentage deviation from a threshold.
    #[must_use]
    pub fn from_deviation_percent(deviation: f64) -> Self {
        if deviation < 10.0 {
            Severity::Low
        } else if deviation < 25.0 {
            Severity::Medium
        } else if deviation < 50.0 {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    /// Canonical upper-case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A detected balance problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceIssue {
    /// Category of the problem.
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// How urgent the problem is.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
}

impl BalanceIssue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(issue_type: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for BalanceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.issue_type, self.message)
    }
}

/// One observation of a numeric series, typically wave number against a metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Independent variable.
    pub x: f64,
    /// Dependent variable.
    pub y: f64,
}

impl SeriesPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for SeriesPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Direction of a fitted difficulty trend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    /// Slope above the stability band.
    GettingHarder,
    /// Slope below the stability band.
    GettingEasier,
    /// Slope within the stability band.
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::GettingHarder => "GETTING_HARDER",
            Trend::GettingEasier => "GETTING_EASIER",
            Trend::Stable => "STABLE",
        })
    }
}

/// Confidence class derived from a fit's coefficient of determination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    /// R² below 0.65.
    Low,
    /// R² of at least 0.65.
    Medium,
    /// R² of at least 0.85.
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        })
    }
}

/// Result of a linear trend fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Classified direction.
    pub trend: Trend,
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Confidence class derived from `r_squared`.
    pub confidence: Confidence,
}

impl TrendResult {
    /// Result reported for series too short to fit.
    #[must_use]
    pub const fn stable() -> Self {
        Self {
            trend: Trend::Stable,
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            confidence: Confidence::Low,
        }
    }
}

/// A single flagged sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    /// Flagged value.
    pub value: f64,
    /// Position of the value in the input.
    pub index: usize,
    /// Signed distance from the mean in standard deviations.
    pub deviation_sigmas: f64,
}

/// Result of σ-method outlier detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierResult {
    /// Sample mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub standard_deviation: f64,
    /// Flagged samples in input order.
    pub outliers: Vec<Outlier>,
    /// Whether any sample was flagged.
    pub has_outliers: bool,
}

/// Forecast for one future wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePrediction {
    /// Wave being forecast.
    pub wave: f64,
    /// Point estimate.
    pub predicted: f64,
    /// Lower edge of the fixed-width band.
    pub lower_bound: f64,
    /// Upper edge of the fixed-width band.
    pub upper_bound: f64,
}

impl WavePrediction {
    /// Zero-filled prediction reported when no model could be fitted.
    #[must_use]
    pub const fn zeroed(wave: f64) -> Self {
        Self {
            wave,
            predicted: 0.0,
            lower_bound: 0.0,
            upper_bound: 0.0,
        }
    }
}

/// Predictions for a set of future waves.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveForecast {
    /// One entry per requested wave, in request order.
    pub predictions: Vec<WavePrediction>,
    /// Degree of the fitted polynomial, zero when nothing was fitted.
    pub degree: usize,
    /// Explanation when the forecast degraded to zeros.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Descriptive statistics of a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Most frequent value.
    pub mode: f64,
    /// Sample standard deviation.
    pub standard_deviation: f64,
    /// Sample variance.
    pub variance: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// `max - min`.
    pub range: f64,
}

/// Outcome of the attrition check for one wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenseForecast {
    /// Wave the forecast was computed for.
    pub wave: u32,
    /// Whether the defence deals enough damage before the enemy arrives.
    pub can_defend: bool,
    /// Seconds the enemy needs to walk the path.
    pub time_to_reach_end: f64,
    /// Damage dealt during that time.
    pub damage_dealt: f64,
    /// Surplus damage as a percentage of the enemy's health.
    pub safety_margin: f64,
}

/// Danger-per-reward assessment for an enemy type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    /// Assessed enemy kind.
    pub kind: EnemyKind,
    /// Normalized threat score.
    pub threat_score: f64,
    /// Whether the score lies in the balanced band.
    pub is_balanced: bool,
}

/// Cost-effectiveness summary for one tower type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerEfficiencyReport {
    /// Tower name.
    pub name: String,
    /// Build and upgrade cost.
    pub cost: f64,
    /// Nominal damage per second.
    pub dps: f64,
    /// Damage-range-accuracy product per unit of money.
    pub efficiency_score: f64,
    /// Damage per second after overkill waste.
    pub effective_dps: f64,
    /// Seconds of combat needed to repay the cost.
    pub break_even_time: f64,
}

/// Purchase plan produced by the greedy tower allocator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TowerMix {
    /// Towers bought, by name, in roster order. Towers bought zero times are omitted.
    pub counts: Vec<(String, u32)>,
    /// Money spent by the plan.
    pub spent: f64,
    /// Money left over.
    pub remaining: f64,
    /// Combined nominal damage per second of the plan.
    pub total_dps: f64,
}

impl TowerMix {
    /// Number of towers of the named type in the plan.
    #[must_use]
    pub fn count_of(&self, name: &str) -> u32 {
        self.counts
            .iter()
            .find(|(tower, _)| tower == name)
            .map_or(0, |(_, count)| *count)
    }
}

/// Structured output of one balance analysis pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Wave active when the report was produced.
    pub wave: u32,
    /// Difficulty multiplier active when the report was produced.
    pub multiplier: f64,
    /// Session metrics checked by the rules.
    pub snapshot: BalanceSnapshot,
    /// Detected problems, most severe first.
    pub issues: Vec<BalanceIssue>,
    /// Trend of the wave-difficulty series.
    pub trend: TrendResult,
    /// Outliers of the wave-difficulty series.
    pub outliers: OutlierResult,
    /// Forecast of upcoming wave difficulty.
    pub forecast: WaveForecast,
    /// Whether the placed towers hold the last recorded wave, once one is recorded.
    pub defense: Option<DefenseForecast>,
    /// Per-tower cost-effectiveness.
    pub tower_efficiency: Vec<TowerEfficiencyReport>,
    /// Summary of per-wave kill rates.
    pub kill_rate_summary: StatisticalSummary,
}

impl BalanceReport {
    /// Renders the report as pretty-printed JSON.
    ///
    /// Infinite values such as the break-even time of a tower that earns
    /// nothing are written as `null`, so the output is meant for reading and
    /// cannot be deserialized back into a report.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Most severe issue in the report, if any.
    #[must_use]
    pub fn worst_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Balance report: wave {} (multiplier {:.2}) ===",
            self.wave, self.multiplier
        )?;
        writeln!(
            f,
            "Snapshot: damage/$ {:.2} | survival {:.1}% | overkill {:.1}% | economy {:.1}%",
            self.snapshot.damage_per_dollar,
            self.snapshot.survival_rate,
            self.snapshot.overkill_percent,
            self.snapshot.economy_efficiency
        )?;

        if self.issues.is_empty() {
            writeln!(f, "Issues: none")?;
        } else {
            writeln!(f, "Issues ({}):", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "  {issue}")?;
            }
        }

        writeln!(
            f,
            "Trend: {} (slope {:.3}, r² {:.2}, confidence {})",
            self.trend.trend, self.trend.slope, self.trend.r_squared, self.trend.confidence
        )?;

        if self.outliers.has_outliers {
            let waves = self
                .outliers
                .outliers
                .iter()
                .map(|outlier| format!("#{} ({:+.1}σ)", outlier.index + 1, outlier.deviation_sigmas))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "Outliers: {waves}")?;
        } else {
            writeln!(
                f,
                "Outliers: none (mean {:.1}, σ {:.1})",
                self.outliers.mean, self.outliers.standard_deviation
            )?;
        }

        if let Some(diagnostic) = &self.forecast.diagnostic {
            writeln!(f, "Forecast unavailable: {diagnostic}")?;
        } else if !self.forecast.predictions.is_empty() {
            writeln!(f, "Forecast (±20%):")?;
            for prediction in &self.forecast.predictions {
                writeln!(
                    f,
                    "  wave {}: {:.1} [{:.1}, {:.1}]",
                    prediction.wave,
                    prediction.predicted,
                    prediction.lower_bound,
                    prediction.upper_bound
                )?;
            }
        }

        if let Some(defense) = &self.defense {
            writeln!(
                f,
                "Defense vs wave {}: {} ({:.0} damage over {:.1}s, margin {:+.1}%)",
                defense.wave,
                if defense.can_defend { "holds" } else { "breaks" },
                defense.damage_dealt,
                defense.time_to_reach_end,
                defense.safety_margin
            )?;
        }

        if !self.tower_efficiency.is_empty() {
            writeln!(f, "Towers:")?;
            for tower in &self.tower_efficiency {
                writeln!(
                    f,
                    "  {}: score {:.2}, effective dps {:.1}/{:.1}, break-even {:.1}s",
                    tower.name,
                    tower.efficiency_score,
                    tower.effective_dps,
                    tower.dps,
                    tower.break_even_time
                )?;
            }
        }

        write!(
            f,
            "Kill rate: mean {:.1}%, median {:.1}%, σ {:.1} over {} waves",
            self.kill_rate_summary.mean,
            self.kill_rate_summary.median,
            self.kill_rate_summary.standard_deviation,
            self.kill_rate_summary.count
        )
    }
}
