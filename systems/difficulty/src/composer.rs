//! Turns the wave table and the live multiplier into concrete spawn orders.

use serde::{Deserialize, Serialize};
use zombie_defence_core::{EnemyKind, SpawnPoint};

use crate::{scaling, wave_table::WaveTable, DifficultyState};

/// External collaborator that instantiates enemies for the host game.
pub trait EnemyFactory {
    /// Handle the host uses for a spawned enemy.
    type Enemy;

    /// Creates one enemy, or `None` when the factory does not know the kind.
    fn create_enemy(&mut self, kind: EnemyKind, point: SpawnPoint, wave: u32)
        -> Option<Self::Enemy>;
}

/// Scaled instructions for one group of a wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Kind to spawn.
    pub kind: EnemyKind,
    /// Number of enemies after count scaling.
    pub count: u32,
    /// Seconds between spawns after cadence scaling.
    pub spawn_interval: f64,
    /// Health of each enemy.
    pub health: u32,
    /// Damage each enemy deals on leaking.
    pub damage: u32,
}

/// Fully scaled composition of a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// Wave the plan was built for.
    pub wave: u32,
    /// Multiplier applied while scaling.
    pub multiplier: f64,
    /// Orders in table order.
    pub orders: Vec<SpawnOrder>,
}

impl WavePlan {
    /// Number of enemies across all orders.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.orders
            .iter()
            .fold(0_u32, |total, order| total.saturating_add(order.count))
    }

    /// Combined health of every enemy in the wave.
    #[must_use]
    pub fn total_health(&self) -> f64 {
        self.orders
            .iter()
            .map(|order| f64::from(order.count) * f64::from(order.health))
            .sum()
    }

    /// Count-weighted mean health; zero for an empty plan.
    #[must_use]
    pub fn average_health(&self) -> f64 {
        match self.total_enemies() {
            0 => 0.0,
            enemies => self.total_health() / f64::from(enemies),
        }
    }

    /// Count-weighted mean speed; zero for an empty plan.
    #[must_use]
    pub fn average_speed(&self) -> f64 {
        self.weighted_mean(|kind| kind.profile().speed())
    }

    /// Count-weighted mean kill reward; zero for an empty plan.
    #[must_use]
    pub fn average_reward(&self) -> f64 {
        self.weighted_mean(|kind| f64::from(kind.profile().reward()))
    }

    fn weighted_mean(&self, value: impl Fn(EnemyKind) -> f64) -> f64 {
        let enemies = self.total_enemies();
        if enemies == 0 {
            return 0.0;
        }
        self.orders
            .iter()
            .map(|order| f64::from(order.count) * value(order.kind))
            .sum::<f64>()
            / f64::from(enemies)
    }
}

/// Read-only view combining the wave table with the difficulty state.
#[derive(Clone, Copy, Debug)]
pub struct WaveComposer<'a> {
    table: &'a WaveTable,
    state: &'a DifficultyState,
}

impl<'a> WaveComposer<'a> {
    /// Creates a composer over the provided table and state.
    #[must_use]
    pub const fn new(table: &'a WaveTable, state: &'a DifficultyState) -> Self {
        Self { table, state }
    }

    /// Multiplier the composer scales with.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.state.multiplier()
    }

    /// Health of one enemy of `kind` at `wave`.
    #[must_use]
    pub fn calculate_zombie_health(&self, kind: EnemyKind, wave: u32) -> u32 {
        scaling::zombie_health(kind, wave)
    }

    /// Damage of one enemy of `kind` at `wave` under the live multiplier.
    #[must_use]
    pub fn calculate_zombie_damage(&self, kind: EnemyKind, wave: u32) -> u32 {
        scaling::zombie_damage(kind, wave, self.multiplier())
    }

    /// Spawn interval derived from `base_interval` at `wave`.
    #[must_use]
    pub fn calculate_spawn_rate(&self, base_interval: f64, wave: u32) -> f64 {
        scaling::spawn_rate(base_interval, wave, self.multiplier())
    }

    /// Group size derived from `base_count` at `wave`.
    #[must_use]
    pub fn calculate_zombie_count(&self, base_count: u32, wave: u32) -> u32 {
        scaling::zombie_count(base_count, wave, self.multiplier())
    }

    /// Scales every group of `wave`.
    #[must_use]
    pub fn build_wave(&self, wave: u32) -> WavePlan {
        let orders = self
            .table
            .groups(wave)
            .iter()
            .map(|group| SpawnOrder {
                kind: group.kind(),
                count: self.calculate_zombie_count(group.count(), wave),
                spawn_interval: self.calculate_spawn_rate(group.spawn_interval_seconds(), wave),
                health: self.calculate_zombie_health(group.kind(), wave),
                damage: self.calculate_zombie_damage(group.kind(), wave),
            })
            .collect();

        WavePlan {
            wave,
            multiplier: self.multiplier(),
            orders,
        }
    }

    /// Requests every enemy of `wave` from `factory` at `point`, skipping kinds it rejects.
    pub fn create_wave_zombies<F>(&self, wave: u32, point: SpawnPoint, factory: &mut F) -> Vec<F::Enemy>
    where
        F: EnemyFactory,
    {
        let mut enemies = Vec::new();
        for group in self.table.groups(wave) {
            let adjusted = self.calculate_zombie_count(group.count(), wave);
            let mut skipped = 0_u32;
            for _ in 0..adjusted {
                match factory.create_enemy(group.kind(), point, wave) {
                    Some(enemy) => enemies.push(enemy),
                    None => skipped += 1,
                }
            }
            if skipped > 0 {
                tracing::debug!(
                    kind = %group.kind(),
                    wave,
                    skipped,
                    "enemy factory rejected kind; skipping"
                );
            }
        }
        enemies
    }
}
