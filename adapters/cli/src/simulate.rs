//! Seeded headless session driving every engine system end to end.

use std::{fmt, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use zombie_defence_core::{BalanceReport, EnemyKind, Event, SpawnPoint, TowerStats};
use zombie_defence_system_balance_tracking::{BalanceTracker, TrackerConfig};
use zombie_defence_system_combat_balance::get_optimal_tower_mix;
use zombie_defence_system_difficulty::{DifficultyController, EnemyFactory};
use zombie_defence_world::{apply, query, Session, WaveOutcome};

use crate::config::SimulationConfig;

const SPAWN_POINT: SpawnPoint = SpawnPoint::new(0.0, 0.0);
/// After every wave the bank divided by this is reinvested in towers.
const REINVESTMENT_DIVISOR: i64 = 2;
const KILL_CHANCE_MIN: f64 = 0.55;
const KILL_CHANCE_MAX: f64 = 0.99;

/// Hands out enemy kinds and counts how many it created.
#[derive(Debug, Default)]
struct CountingFactory {
    spawned: u32,
}

impl EnemyFactory for CountingFactory {
    type Enemy = EnemyKind;

    fn create_enemy(&mut self, kind: EnemyKind, _point: SpawnPoint, _wave: u32) -> Option<EnemyKind> {
        self.spawned = self.spawned.saturating_add(1);
        Some(kind)
    }
}

/// Result of a simulated session.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct SimulationSummary {
    pub(crate) seed: u64,
    pub(crate) waves_played: u32,
    pub(crate) enemies_spawned: u32,
    pub(crate) defeated: bool,
    pub(crate) final_multiplier: f64,
    pub(crate) outcomes: Vec<WaveOutcome>,
    pub(crate) reports_published: usize,
    pub(crate) report: BalanceReport,
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulated {} waves (seed {}), {} enemies, final multiplier {:.2}{}",
            self.waves_played,
            self.seed,
            self.enemies_spawned,
            self.final_multiplier,
            if self.defeated { ", defeated" } else { "" }
        )?;
        for outcome in &self.outcomes {
            writeln!(
                f,
                "  wave {:>2}: kill rate {:5.1}%, lives lost {}, efficiency {:.0}%",
                outcome.wave, outcome.kill_rate, outcome.lives_lost, outcome.resource_efficiency
            )?;
        }
        writeln!(f, "{} periodic reports published", self.reports_published)?;
        write!(f, "{}", self.report)
    }
}

/// Plays `config.waves` waves with randomized player skill.
pub(crate) fn run(config: &SimulationConfig) -> SimulationSummary {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut session = Session::with_resources(config.starting_money, config.starting_lives);
    let mut controller = DifficultyController::new();
    let mut tracker = BalanceTracker::new(TrackerConfig {
        interval: Duration::from_millis(config.analysis_interval_ms),
        path_length: config.path_length,
        ..TrackerConfig::default()
    });
    let mut factory = CountingFactory::default();
    let mut reports = Vec::new();
    let mut waves_played = 0;

    build_towers(&mut session, &config.towers, config.starting_money);

    for _ in 0..config.waves {
        let wave = controller.wave();
        let plan = controller.build_wave();
        tracker.record_wave_difficulty(&plan);

        let enemies = controller.create_wave_zombies(SPAWN_POINT, &mut factory);
        let kill_chance = rng.gen_range(KILL_CHANCE_MIN..KILL_CHANCE_MAX);
        let mut events = vec![Event::WaveStarted { wave }];
        for kind in enemies {
            events.push(Event::TimeAdvanced {
                dt: Duration::from_secs_f64(
                    controller.calculate_spawn_rate(kind.profile().base_spawn_interval(), wave),
                ),
            });
            let health = f64::from(controller.calculate_zombie_health(kind, wave));
            if rng.gen_bool(kill_chance) {
                let overkill = health * rng.gen_range(0.0..0.3);
                events.push(Event::DamageDealt {
                    amount: health + overkill,
                    overkill,
                });
                events.push(Event::EnemyKilled { kind });
                events.push(Event::MoneyChanged {
                    delta: i64::from(kind.profile().reward()),
                });
            } else {
                events.push(Event::DamageDealt {
                    amount: health * rng.gen_range(0.0..1.0),
                    overkill: 0.0,
                });
                events.push(Event::EnemyLeaked {
                    kind,
                    lives_lost: leak_penalty(kind),
                });
            }
        }
        events.push(Event::WaveCompleted { wave });

        for event in &events {
            if let Some(outcome) = apply(&mut session, event) {
                tracing::info!(
                    wave = outcome.wave,
                    kill_rate = outcome.kill_rate,
                    lives_lost = outcome.lives_lost,
                    "wave completed"
                );
                controller.update_performance_metrics(
                    outcome.kill_rate,
                    outcome.lives_lost,
                    outcome.resource_efficiency,
                );
            }
        }
        tracker.handle(&events, &query::live_counters(&session), &mut reports);
        waves_played += 1;

        if query::is_defeated(&session) {
            tracing::info!(wave, "player ran out of lives");
            break;
        }

        let bank = query::live_counters(&session).money;
        build_towers(&mut session, &config.towers, bank / REINVESTMENT_DIVISOR);
        let _ = controller.next_wave();
    }

    let counters = query::live_counters(&session);
    SimulationSummary {
        seed: config.seed,
        waves_played,
        enemies_spawned: factory.spawned,
        defeated: query::is_defeated(&session),
        final_multiplier: controller.multiplier(),
        outcomes: query::wave_outcomes(&session).to_vec(),
        reports_published: reports.len(),
        report: tracker.analyze(&counters),
    }
}

fn leak_penalty(kind: EnemyKind) -> u32 {
    match kind {
        EnemyKind::Boss => 5,
        EnemyKind::Tank | EnemyKind::Mechanical => 2,
        _ => 1,
    }
}

/// Spends up to `budget` on the greedy tower mix.
fn build_towers(session: &mut Session, roster: &[TowerStats], budget: i64) {
    let mix = get_optimal_tower_mix(budget as f64, roster);
    for (name, count) in &mix.counts {
        let Some(tower) = roster.iter().find(|tower| &tower.name == name) else {
            continue;
        };
        for _ in 0..*count {
            let _ = apply(session, &Event::TowerPlaced { tower: tower.clone() });
            let _ = apply(
                session,
                &Event::MoneyChanged {
                    delta: -(tower.build_cost.ceil() as i64),
                },
            );
        }
    }
    if !mix.counts.is_empty() {
        tracing::debug!(spent = mix.spent, towers = ?mix.counts, "towers built");
    }
}
