//! One-shot evaluation of a tower roster against a composed wave.

use std::fmt;

use serde::Serialize;
use zombie_defence_core::{BalanceIssue, DefenseForecast, TowerEfficiencyReport, TowerMix};
use zombie_defence_system_balance_tracking::metrics::AverageEnemy;
use zombie_defence_system_combat_balance::{
    analyze_tower_efficiency, can_defend_wave, detect_tower_outliers, get_optimal_tower_mix,
};
use zombie_defence_system_difficulty::DifficultyController;
use zombie_defence_system_statistics::{StatisticalEngine, DEFAULT_OUTLIER_THRESHOLD};

use crate::config::SimulationConfig;

/// Roster evaluation for one wave and budget.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct RosterAnalysis {
    pub(crate) wave: u32,
    pub(crate) budget: f64,
    pub(crate) enemies: u32,
    pub(crate) towers: Vec<TowerEfficiencyReport>,
    pub(crate) mix: TowerMix,
    pub(crate) defense: DefenseForecast,
    pub(crate) issues: Vec<BalanceIssue>,
}

impl fmt::Display for RosterAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Roster analysis: wave {} ({} enemies), budget {:.0} ===",
            self.wave, self.enemies, self.budget
        )?;
        for tower in &self.towers {
            writeln!(
                f,
                "  {}: cost {:.0}, score {:.2}, effective dps {:.1}/{:.1}, break-even {:.1}s",
                tower.name,
                tower.cost,
                tower.efficiency_score,
                tower.effective_dps,
                tower.dps,
                tower.break_even_time
            )?;
        }

        let purchases = self
            .mix
            .counts
            .iter()
            .map(|(name, count)| format!("{count}x {name}"))
            .collect::<Vec<_>>();
        writeln!(
            f,
            "Optimal mix: {} (spent {:.0}, left {:.0}, {:.1} dps)",
            if purchases.is_empty() {
                "nothing affordable".to_owned()
            } else {
                purchases.join(", ")
            },
            self.mix.spent,
            self.mix.remaining,
            self.mix.total_dps
        )?;

        writeln!(
            f,
            "Defense: {} ({:.0} damage over {:.1}s, margin {:+.1}%)",
            if self.defense.can_defend {
                "holds"
            } else {
                "breaks"
            },
            self.defense.damage_dealt,
            self.defense.time_to_reach_end,
            self.defense.safety_margin
        )?;

        if self.issues.is_empty() {
            write!(f, "Issues: none")
        } else {
            writeln!(f, "Issues ({}):", self.issues.len())?;
            let lines = self
                .issues
                .iter()
                .map(|issue| format!("  {issue}"))
                .collect::<Vec<_>>();
            write!(f, "{}", lines.join("\n"))
        }
    }
}

/// Evaluates the configured roster against `wave` with `budget` to spend.
///
/// The defense check pits the mix's combined DPS against the whole wave's
/// health during one traversal of the path by the average enemy.
pub(crate) fn run(config: &SimulationConfig, wave: u32, budget: f64) -> RosterAnalysis {
    let controller = DifficultyController::new();
    let plan = controller.composer().build_wave(wave);
    let enemy = AverageEnemy::of_plan(&plan);

    let towers = analyze_tower_efficiency(&config.towers, enemy.health, enemy.reward);
    let scores = towers
        .iter()
        .map(|tower| tower.efficiency_score)
        .collect::<Vec<_>>();
    let outliers = StatisticalEngine::new().detect_outliers(&scores, DEFAULT_OUTLIER_THRESHOLD);
    let mut issues = detect_tower_outliers(&towers, &outliers);
    issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mix = get_optimal_tower_mix(budget, &config.towers);
    let defense = can_defend_wave(
        mix.total_dps,
        plan.total_health(),
        enemy.speed,
        config.path_length,
        plan.wave,
    );

    RosterAnalysis {
        wave: plan.wave,
        budget,
        enemies: plan.total_enemies(),
        towers,
        mix,
        defense,
        issues,
    }
}
