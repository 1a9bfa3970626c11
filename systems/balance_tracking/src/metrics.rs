//! Pure derivations from live counters and wave plans.

use zombie_defence_core::{
    BalanceSnapshot, EnemyKind, LiveCounters, SeriesPoint, ThreatAssessment, TowerStats,
};
use zombie_defence_system_combat_balance::{calculate_threat_score, DAMAGE_PER_DOLLAR_FLOOR};
use zombie_defence_system_difficulty::WavePlan;

/// Derives the rule-table snapshot from cumulative session counters.
///
/// Ratios with an empty denominator fall back to their neutral value, so a
/// session that has not spent or fought yet reports no problems.
#[must_use]
pub fn derive_snapshot(counters: &LiveCounters) -> BalanceSnapshot {
    let encountered = counters.kills.saturating_add(counters.leaks);
    let survival_rate = if encountered == 0 {
        100.0
    } else {
        f64::from(counters.kills) / f64::from(encountered) * 100.0
    };

    let overkill_percent = if counters.total_damage > 0.0 {
        counters.overkill_damage / counters.total_damage * 100.0
    } else {
        0.0
    };

    let (damage_per_dollar, economy_efficiency) = if counters.money_spent > 0.0 {
        (
            counters.total_damage / counters.money_spent.max(1.0),
            counters.money_earned / counters.money_spent * 100.0,
        )
    } else {
        (DAMAGE_PER_DOLLAR_FLOOR, 100.0)
    };

    BalanceSnapshot {
        damage_per_dollar,
        survival_rate,
        overkill_percent,
        economy_efficiency,
    }
}

/// Difficulty data point of a wave: its number against the health it fields.
#[must_use]
pub fn wave_difficulty(plan: &WavePlan) -> SeriesPoint {
    SeriesPoint::new(f64::from(plan.wave), plan.total_health())
}

/// Threat assessment of every kind in the plan, one per order.
#[must_use]
pub fn plan_threats(plan: &WavePlan) -> Vec<ThreatAssessment> {
    plan.orders
        .iter()
        .map(|order| {
            let profile = order.kind.profile();
            calculate_threat_score(
                f64::from(order.health),
                profile.speed(),
                order.count,
                f64::from(profile.reward()),
                order.kind,
            )
        })
        .collect()
}

/// Count-weighted average enemy of a wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AverageEnemy {
    /// Mean health.
    pub health: f64,
    /// Mean speed in world units per second.
    pub speed: f64,
    /// Mean kill reward.
    pub reward: f64,
}

impl AverageEnemy {
    /// Averages the plan; an empty plan falls back to the basic enemy.
    #[must_use]
    pub fn of_plan(plan: &WavePlan) -> Self {
        if plan.total_enemies() == 0 {
            return Self::default();
        }
        Self {
            health: plan.average_health(),
            speed: plan.average_speed(),
            reward: plan.average_reward(),
        }
    }
}

impl Default for AverageEnemy {
    fn default() -> Self {
        let profile = EnemyKind::Basic.profile();
        Self {
            health: profile.base_health(),
            speed: profile.speed(),
            reward: f64::from(profile.reward()),
        }
    }
}

/// One entry per tower type, keeping the first placement of each name.
#[must_use]
pub fn distinct_towers(towers: &[TowerStats]) -> Vec<TowerStats> {
    let mut distinct: Vec<TowerStats> = Vec::with_capacity(towers.len());
    for tower in towers {
        if !distinct.iter().any(|known| known.name == tower.name) {
            distinct.push(tower.clone());
        }
    }
    distinct
}
