#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-form combat balance model.
//!
//! Every function here is pure. Degenerate inputs (zero cost, zero DPS, zero
//! speed) resolve to explicit sentinels such as `0.0` or `f64::INFINITY` so the
//! balance HUD can evaluate them unconditionally.

use std::cmp::Ordering;

use zombie_defence_core::{
    BalanceIssue, BalanceSnapshot, DefenseForecast, EnemyKind, IssueType, OutlierResult,
    Severity, ThreatAssessment, TowerEfficiencyReport, TowerMix, TowerStats,
};

/// Minimum damage per dollar before towers count as inefficient.
pub const DAMAGE_PER_DOLLAR_FLOOR: f64 = 15.0;
/// Minimum survival rate, in percent, before the defence counts as weak.
pub const SURVIVAL_RATE_FLOOR: f64 = 50.0;
/// Maximum overkill share, in percent, before damage waste is excessive.
pub const OVERKILL_PERCENT_CEILING: f64 = 15.0;
/// Minimum income-to-spending ratio, in percent.
pub const ECONOMY_EFFICIENCY_FLOOR: f64 = 100.0;
/// Lower edge of the balanced threat band.
pub const THREAT_BALANCED_MIN: f64 = 0.8;
/// Upper edge of the balanced threat band.
pub const THREAT_BALANCED_MAX: f64 = 1.2;

/// Direction in which a threshold constrains a metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Values below the threshold are problematic.
    Floor,
    /// Values above the threshold are problematic.
    Ceiling,
}

/// Bands how far `value` violates `threshold`, measured as a percentage of the threshold.
#[must_use]
pub fn severity_for(value: f64, threshold: f64, bound: Bound) -> Severity {
    let excess = match bound {
        Bound::Floor => threshold - value,
        Bound::Ceiling => value - threshold,
    };
    let reference = threshold.abs().max(f64::EPSILON);
    Severity::from_deviation_percent(excess.max(0.0) / reference * 100.0)
}

/// Simplified Lanchester attrition check for a single enemy walking the full path.
///
/// Assumes constant DPS against one health pool; not a multi-unit simulation.
#[must_use]
pub fn can_defend_wave(
    total_dps: f64,
    zombie_hp: f64,
    zombie_speed: f64,
    path_length: f64,
    wave: u32,
) -> DefenseForecast {
    let time_to_reach_end = if zombie_speed > 0.0 {
        path_length / zombie_speed
    } else {
        f64::INFINITY
    };
    let damage_dealt = if total_dps > 0.0 {
        total_dps * time_to_reach_end
    } else {
        0.0
    };

    if zombie_hp <= 0.0 {
        return DefenseForecast {
            wave,
            can_defend: true,
            time_to_reach_end,
            damage_dealt,
            safety_margin: f64::INFINITY,
        };
    }

    DefenseForecast {
        wave,
        can_defend: damage_dealt >= zombie_hp,
        time_to_reach_end,
        damage_dealt,
        safety_margin: (damage_dealt - zombie_hp) / zombie_hp * 100.0,
    }
}

/// Damage-range-accuracy product per unit of money. Zero when the tower is free.
#[must_use]
pub fn calculate_efficiency_score(
    dps: f64,
    range: f64,
    accuracy: f64,
    build_cost: f64,
    upgrade_cost: f64,
) -> f64 {
    let total_cost = build_cost + upgrade_cost;
    if total_cost <= 0.0 {
        return 0.0;
    }
    dps * accuracy * range / total_cost
}

/// Total value of `duplicate_count` identical towers under a saturating stacking curve.
///
/// Each copy beyond the first adds less than the previous one and the extra
/// value never exceeds `cap` copies' worth.
#[must_use]
pub fn apply_diminishing_returns(stat_value: f64, duplicate_count: u32, cap: f64) -> f64 {
    if duplicate_count <= 1 || cap <= 0.0 {
        return stat_value;
    }
    let extra = f64::from(duplicate_count - 1);
    stat_value * (1.0 + cap * extra / (extra + cap))
}

/// Danger-per-reward score of an enemy group; balanced inside `[0.8, 1.2]`.
#[must_use]
pub fn calculate_threat_score(
    health: f64,
    speed: f64,
    count: u32,
    reward: f64,
    kind: EnemyKind,
) -> ThreatAssessment {
    let threat_score = if reward > 0.0 {
        health * speed * f64::from(count) / (reward * 10.0)
    } else {
        f64::INFINITY
    };
    ThreatAssessment {
        kind,
        threat_score,
        is_balanced: (THREAT_BALANCED_MIN..=THREAT_BALANCED_MAX).contains(&threat_score),
    }
}

/// Nominal DPS reduced by the damage wasted on the final hit of each kill.
#[must_use]
pub fn calculate_effective_dps(nominal_dps: f64, average_zombie_hp: f64, damage_per_hit: f64) -> f64 {
    if damage_per_hit <= 0.0 || average_zombie_hp <= 0.0 {
        return nominal_dps;
    }
    let shots_to_kill = (average_zombie_hp / damage_per_hit).ceil();
    let delivered = shots_to_kill * damage_per_hit;
    let wasted = delivered - average_zombie_hp;
    nominal_dps * (1.0 - wasted / delivered)
}

/// Seconds of combat before a tower's kill income repays its cost.
#[must_use]
pub fn calculate_break_even_point(
    tower_cost: f64,
    tower_dps: f64,
    average_zombie_reward: f64,
    average_zombie_hp: f64,
) -> f64 {
    if tower_dps <= 0.0 || average_zombie_reward <= 0.0 {
        return f64::INFINITY;
    }
    let kill_time = average_zombie_hp.max(0.0) / tower_dps;
    if kill_time <= 0.0 {
        return 0.0;
    }
    let revenue_per_second = average_zombie_reward / kill_time;
    tower_cost / revenue_per_second
}

/// Evaluates the snapshot rule table. Each rule fires independently.
#[must_use]
pub fn detect_balance_issues(snapshot: &BalanceSnapshot) -> Vec<BalanceIssue> {
    let mut issues = Vec::new();

    if snapshot.damage_per_dollar < DAMAGE_PER_DOLLAR_FLOOR {
        issues.push(BalanceIssue::new(
            IssueType::InefficientTowers,
            severity_for(
                snapshot.damage_per_dollar,
                DAMAGE_PER_DOLLAR_FLOOR,
                Bound::Floor,
            ),
            format!(
                "towers deal {:.1} damage per dollar, below the {DAMAGE_PER_DOLLAR_FLOOR:.0} target",
                snapshot.damage_per_dollar
            ),
        ));
    }

    if snapshot.survival_rate < SURVIVAL_RATE_FLOOR {
        issues.push(BalanceIssue::new(
            IssueType::WeakDefense,
            severity_for(snapshot.survival_rate, SURVIVAL_RATE_FLOOR, Bound::Floor),
            format!(
                "only {:.1}% of enemies are stopped, below {SURVIVAL_RATE_FLOOR:.0}%",
                snapshot.survival_rate
            ),
        ));
    }

    if snapshot.overkill_percent > OVERKILL_PERCENT_CEILING {
        issues.push(BalanceIssue::new(
            IssueType::ExcessiveOverkill,
            severity_for(
                snapshot.overkill_percent,
                OVERKILL_PERCENT_CEILING,
                Bound::Ceiling,
            ),
            format!(
                "{:.1}% of damage is overkill, above {OVERKILL_PERCENT_CEILING:.0}%",
                snapshot.overkill_percent
            ),
        ));
    }

    if snapshot.economy_efficiency < ECONOMY_EFFICIENCY_FLOOR {
        issues.push(BalanceIssue::new(
            IssueType::NegativeEconomy,
            severity_for(
                snapshot.economy_efficiency,
                ECONOMY_EFFICIENCY_FLOOR,
                Bound::Floor,
            ),
            format!(
                "income covers {:.1}% of spending",
                snapshot.economy_efficiency
            ),
        ));
    }

    issues
}

/// Reports every assessment outside the balanced threat band.
#[must_use]
pub fn detect_enemy_imbalance(threats: &[ThreatAssessment]) -> Vec<BalanceIssue> {
    threats
        .iter()
        .filter(|threat| !threat.is_balanced)
        .map(|threat| {
            let (severity, direction) = if threat.threat_score < THREAT_BALANCED_MIN {
                (
                    severity_for(threat.threat_score, THREAT_BALANCED_MIN, Bound::Floor),
                    "over-rewarded",
                )
            } else {
                (
                    severity_for(threat.threat_score, THREAT_BALANCED_MAX, Bound::Ceiling),
                    "under-rewarded",
                )
            };
            BalanceIssue::new(
                IssueType::UnbalancedEnemy,
                severity,
                format!(
                    "{} threat score {:.2} is {direction}",
                    threat.kind, threat.threat_score
                ),
            )
        })
        .collect()
}

/// Turns outliers of the efficiency-score series into tower issues.
///
/// `outliers` must have been computed over the `efficiency_score` of `reports`,
/// in the same order.
#[must_use]
pub fn detect_tower_outliers(
    reports: &[TowerEfficiencyReport],
    outliers: &OutlierResult,
) -> Vec<BalanceIssue> {
    outliers
        .outliers
        .iter()
        .filter_map(|outlier| {
            let report = reports.get(outlier.index)?;
            let (issue_type, bound) = if outlier.deviation_sigmas > 0.0 {
                (IssueType::OverpoweredTower, Bound::Ceiling)
            } else {
                (IssueType::UnderpoweredTower, Bound::Floor)
            };
            Some(BalanceIssue::new(
                issue_type,
                severity_for(report.efficiency_score, outliers.mean, bound),
                format!(
                    "{} efficiency {:.2} is {:+.1}σ from the roster mean {:.2}",
                    report.name, report.efficiency_score, outlier.deviation_sigmas, outliers.mean
                ),
            ))
        })
        .collect()
}

/// Greedy allocator: keeps buying the affordable tower with the best DPS per cost.
///
/// A real-time heuristic, not an optimal knapsack solution. Towers with a
/// non-positive build cost are ignored.
#[must_use]
pub fn get_optimal_tower_mix(budget: f64, towers: &[TowerStats]) -> TowerMix {
    if !budget.is_finite() || budget <= 0.0 {
        return TowerMix {
            remaining: if budget.is_finite() { budget } else { 0.0 },
            ..TowerMix::default()
        };
    }

    let mut ranked = towers
        .iter()
        .filter(|tower| tower.build_cost > 0.0 && tower.dps.is_finite())
        .collect::<Vec<_>>();
    // Stable sort keeps roster order between equal ratios.
    ranked.sort_by(|a, b| {
        let ratio_a = a.dps / a.build_cost;
        let ratio_b = b.dps / b.build_cost;
        ratio_b.partial_cmp(&ratio_a).unwrap_or(Ordering::Equal)
    });

    let mut mix = TowerMix {
        remaining: budget,
        ..TowerMix::default()
    };
    let mut bought = Vec::new();

    // Once the best tower stops fitting it never fits again, so buying each
    // ranked tower to exhaustion matches the one-at-a-time greedy loop.
    for tower in ranked {
        let count = (mix.remaining / tower.build_cost).floor();
        if count < 1.0 {
            continue;
        }
        let count = count.min(f64::from(u32::MAX)) as u32;
        let cost = f64::from(count) * tower.build_cost;
        mix.remaining -= cost;
        mix.spent += cost;
        mix.total_dps += f64::from(count) * tower.dps;
        bought.push((tower.name.as_str(), count));
    }

    for tower in towers {
        if mix.counts.iter().any(|(name, _)| *name == tower.name) {
            continue;
        }
        let count = bought
            .iter()
            .filter(|(name, _)| *name == tower.name)
            .map(|(_, count)| *count)
            .sum::<u32>();
        if count > 0 {
            mix.counts.push((tower.name.clone(), count));
        }
    }
    mix
}

/// Builds one cost-effectiveness report per tower.
#[must_use]
pub fn analyze_tower_efficiency(
    towers: &[TowerStats],
    average_zombie_hp: f64,
    average_zombie_reward: f64,
) -> Vec<TowerEfficiencyReport> {
    towers
        .iter()
        .map(|tower| {
            let cost = tower.total_cost();
            TowerEfficiencyReport {
                name: tower.name.clone(),
                cost,
                dps: tower.dps,
                efficiency_score: calculate_efficiency_score(
                    tower.dps,
                    tower.range,
                    tower.accuracy,
                    tower.build_cost,
                    tower.upgrade_cost,
                ),
                effective_dps: calculate_effective_dps(
                    tower.dps,
                    average_zombie_hp,
                    tower.damage_per_hit,
                ),
                break_even_time: calculate_break_even_point(
                    cost,
                    tower.dps,
                    average_zombie_reward,
                    average_zombie_hp,
                ),
            }
        })
        .collect()
}

/// Finds a tower by name; `None` when the roster has no such tower.
#[must_use]
pub fn lookup_tower<'a>(towers: &'a [TowerStats], name: &str) -> Option<&'a TowerStats> {
    towers.iter().find(|tower| tower.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower(name: &str, build_cost: f64, dps: f64) -> TowerStats {
        TowerStats {
            name: name.to_owned(),
            build_cost,
            upgrade_cost: 0.0,
            dps,
            range: 150.0,
            accuracy: 0.85,
            damage_per_hit: 25.0,
        }
    }

    fn healthy_snapshot() -> BalanceSnapshot {
        BalanceSnapshot {
            damage_per_dollar: 22.0,
            survival_rate: 90.0,
            overkill_percent: 6.0,
            economy_efficiency: 130.0,
        }
    }

    #[test]
    fn sufficient_dps_defends_the_wave() {
        let forecast = can_defend_wave(300.0, 5_000.0, 50.0, 1_000.0, 5);
        assert!(forecast.can_defend);
        assert_eq!(forecast.time_to_reach_end, 20.0);
        assert_eq!(forecast.damage_dealt, 6_000.0);
        assert!((forecast.safety_margin - 20.0).abs() < 1e-9);
        assert_eq!(forecast.wave, 5);
    }

    #[test]
    fn insufficient_dps_has_negative_margin() {
        let forecast = can_defend_wave(100.0, 5_000.0, 50.0, 1_000.0, 5);
        assert!(!forecast.can_defend);
        assert!(forecast.safety_margin < 0.0);
        assert!((forecast.safety_margin + 60.0).abs() < 1e-9);
    }

    #[test]
    fn stationary_or_dead_enemies_are_sentinels() {
        let stationary = can_defend_wave(10.0, 500.0, 0.0, 1_000.0, 1);
        assert!(stationary.can_defend);
        assert!(stationary.time_to_reach_end.is_infinite());

        let no_towers = can_defend_wave(0.0, 500.0, 0.0, 1_000.0, 1);
        assert!(!no_towers.can_defend);
        assert_eq!(no_towers.damage_dealt, 0.0);

        let dead = can_defend_wave(0.0, 0.0, 50.0, 1_000.0, 1);
        assert!(dead.can_defend);
        assert!(dead.safety_margin.is_infinite());
    }

    #[test]
    fn efficiency_score_matches_reference_value() {
        let score = calculate_efficiency_score(50.0, 150.0, 0.85, 100.0, 0.0);
        assert!((score - 63.75).abs() < 1e-9);
        assert_eq!(calculate_efficiency_score(50.0, 150.0, 0.85, 0.0, 0.0), 0.0);
    }

    #[test]
    fn upgrades_dilute_efficiency() {
        let base = calculate_efficiency_score(50.0, 150.0, 0.85, 100.0, 0.0);
        let upgraded = calculate_efficiency_score(50.0, 150.0, 0.85, 100.0, 100.0);
        assert!((upgraded - base / 2.0).abs() < 1e-9);
    }

    #[test]
    fn diminishing_returns_are_sub_linear_and_bounded() {
        assert_eq!(apply_diminishing_returns(80.0, 0, 2.0), 80.0);
        assert_eq!(apply_diminishing_returns(80.0, 1, 2.0), 80.0);
        assert_eq!(apply_diminishing_returns(80.0, 4, 0.0), 80.0);

        let mut previous = 80.0;
        let mut previous_gain = f64::INFINITY;
        for duplicates in 2..=20 {
            let total = apply_diminishing_returns(80.0, duplicates, 2.0);
            assert!(total > previous, "value still grows at {duplicates}");
            assert!(total < 80.0 * f64::from(duplicates));
            assert!(total < 80.0 * 3.0, "saturates below 1 + cap copies");
            let gain = total - previous;
            assert!(gain < previous_gain, "each copy adds less");
            previous = total;
            previous_gain = gain;
        }
    }

    #[test]
    fn threat_band_defines_balance() {
        let balanced = calculate_threat_score(100.0, 1.0, 1, 10.0, EnemyKind::Basic);
        assert!((balanced.threat_score - 1.0).abs() < 1e-12);
        assert!(balanced.is_balanced);

        let dangerous = calculate_threat_score(500.0, 1.0, 1, 10.0, EnemyKind::Tank);
        assert!(!dangerous.is_balanced);

        let free = calculate_threat_score(100.0, 1.0, 1, 0.0, EnemyKind::Swarm);
        assert!(free.threat_score.is_infinite());
        assert!(!free.is_balanced);
    }

    #[test]
    fn effective_dps_discounts_overkill() {
        let effective = calculate_effective_dps(100.0, 100.0, 30.0);
        assert!((effective - 100.0 * (1.0 - 20.0 / 120.0)).abs() < 1e-9);
        assert_eq!(calculate_effective_dps(100.0, 100.0, 25.0), 100.0);
        assert_eq!(calculate_effective_dps(100.0, 100.0, 0.0), 100.0);
    }

    #[test]
    fn break_even_point_matches_reference_values() {
        assert!((calculate_break_even_point(100.0, 50.0, 10.0, 100.0) - 20.0).abs() < 1e-9);
        assert!(calculate_break_even_point(100.0, 0.0, 10.0, 100.0).is_infinite());
        assert!(calculate_break_even_point(100.0, 50.0, 0.0, 100.0).is_infinite());
    }

    #[test]
    fn healthy_snapshot_raises_nothing() {
        assert!(detect_balance_issues(&healthy_snapshot()).is_empty());
    }

    #[test]
    fn low_damage_per_dollar_is_a_single_high_issue() {
        let snapshot = BalanceSnapshot {
            damage_per_dollar: 10.0,
            ..healthy_snapshot()
        };
        let issues = detect_balance_issues(&snapshot);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::InefficientTowers);
        assert_eq!(issues[0].severity, Severity::High);
    }

    #[test]
    fn rules_fire_independently() {
        let snapshot = BalanceSnapshot {
            damage_per_dollar: 14.0,
            survival_rate: 10.0,
            overkill_percent: 18.0,
            economy_efficiency: 95.0,
        };
        let issues = detect_balance_issues(&snapshot);
        let kinds = issues
            .iter()
            .map(|issue| (issue.issue_type, issue.severity))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                (IssueType::InefficientTowers, Severity::Low),
                (IssueType::WeakDefense, Severity::Critical),
                (IssueType::ExcessiveOverkill, Severity::Medium),
                (IssueType::NegativeEconomy, Severity::Low),
            ]
        );
    }

    #[test]
    fn severity_follows_bound_direction() {
        assert_eq!(severity_for(7.5, 15.0, Bound::Floor), Severity::Critical);
        assert_eq!(severity_for(20.0, 15.0, Bound::Ceiling), Severity::High);
        assert_eq!(severity_for(20.0, 15.0, Bound::Floor), Severity::Low);
    }

    #[test]
    fn enemy_imbalance_reports_direction() {
        let threats = [
            calculate_threat_score(100.0, 1.0, 1, 10.0, EnemyKind::Basic),
            calculate_threat_score(40.0, 1.0, 1, 10.0, EnemyKind::Swarm),
            calculate_threat_score(500.0, 1.0, 1, 10.0, EnemyKind::Tank),
        ];
        let issues = detect_enemy_imbalance(&threats);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("SWARM"));
        assert!(issues[0].message.contains("over-rewarded"));
        assert_eq!(issues[0].severity, Severity::Critical);
        assert!(issues[1].message.contains("under-rewarded"));
        assert!(issues
            .iter()
            .all(|issue| issue.issue_type == IssueType::UnbalancedEnemy));
    }

    #[test]
    fn greedy_mix_prefers_best_ratio_then_fills() {
        let towers = [
            tower("Cannon", 100.0, 40.0),
            tower("Laser", 250.0, 150.0),
            tower("Dart", 30.0, 9.0),
        ];
        let mix = get_optimal_tower_mix(600.0, &towers);

        assert_eq!(mix.count_of("Laser"), 2);
        assert_eq!(mix.count_of("Cannon"), 1);
        assert_eq!(mix.count_of("Dart"), 0);
        assert_eq!(mix.spent, 600.0);
        assert_eq!(mix.remaining, 0.0);
        assert_eq!(mix.total_dps, 340.0);
        assert_eq!(
            mix.counts,
            vec![("Cannon".to_owned(), 1), ("Laser".to_owned(), 2)]
        );
    }

    #[test]
    fn greedy_mix_handles_degenerate_rosters() {
        assert_eq!(get_optimal_tower_mix(100.0, &[]).spent, 0.0);
        assert_eq!(get_optimal_tower_mix(0.0, &[tower("Dart", 30.0, 9.0)]).spent, 0.0);

        let free = get_optimal_tower_mix(100.0, &[tower("Free", 0.0, 9.0)]);
        assert!(free.counts.is_empty());
        assert_eq!(free.remaining, 100.0);

        let unlimited = get_optimal_tower_mix(f64::INFINITY, &[tower("Dart", 30.0, 9.0)]);
        assert!(unlimited.counts.is_empty());
    }

    #[test]
    fn tower_report_composes_formulas() {
        let reports = analyze_tower_efficiency(&[tower("Cannon", 100.0, 50.0)], 100.0, 10.0);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.name, "Cannon");
        assert_eq!(report.cost, 100.0);
        assert!((report.efficiency_score - 63.75).abs() < 1e-9);
        assert_eq!(report.effective_dps, 50.0);
        assert!((report.break_even_time - 20.0).abs() < 1e-9);
    }

    #[test]
    fn lookup_reports_missing_towers_as_none() {
        let towers = [tower("Cannon", 100.0, 40.0)];
        assert!(lookup_tower(&towers, "Cannon").is_some());
        assert!(lookup_tower(&towers, "Mortar").is_none());
    }
}
