#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive difficulty controller and wave composition.
//!
//! The controller owns the only mutable state of the engine, a bounded
//! difficulty multiplier, and adjusts it from the player's kill rate. Wave
//! composition borrows that state through [`WaveComposer`] and never mutates
//! it.

pub mod composer;
pub mod scaling;
pub mod wave_table;

use serde::{Deserialize, Serialize};
use zombie_defence_core::{EnemyKind, PerformanceMetrics, SpawnPoint};

pub use composer::{EnemyFactory, SpawnOrder, WaveComposer, WavePlan};
pub use wave_table::{build_wave_table, WaveTable};

/// Lowest multiplier the controller can reach.
pub const MIN_MULTIPLIER: f64 = 0.7;
/// Highest multiplier the controller can reach.
pub const MAX_MULTIPLIER: f64 = 1.3;

/// Bounded multiplier plus the performance signal that last moved it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    multiplier: f64,
    performance: PerformanceMetrics,
}

impl DifficultyState {
    /// Multiplier applied to damage, cadence and group size. Always in `[0.7, 1.3]`.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Most recently recorded performance.
    #[must_use]
    pub const fn performance(&self) -> &PerformanceMetrics {
        &self.performance
    }
}

impl Default for DifficultyState {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            performance: PerformanceMetrics::default(),
        }
    }
}

/// Owns the wave table, the difficulty state and the active wave number.
#[derive(Clone, Debug)]
pub struct DifficultyController {
    table: WaveTable,
    state: DifficultyState,
    wave: u32,
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new()
    }
}

impl DifficultyController {
    /// Creates a controller at wave one with a neutral multiplier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(WaveTable::standard())
    }

    /// Creates a controller over a custom wave table.
    #[must_use]
    pub fn with_table(table: WaveTable) -> Self {
        Self {
            table,
            state: DifficultyState::default(),
            wave: 1,
        }
    }

    /// Active wave number.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Current difficulty multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.state.multiplier
    }

    /// Read-only view of the difficulty state.
    #[must_use]
    pub const fn state(&self) -> &DifficultyState {
        &self.state
    }

    /// The composition table.
    #[must_use]
    pub const fn table(&self) -> &WaveTable {
        &self.table
    }

    /// Advances to the next wave and returns its number.
    pub fn next_wave(&mut self) -> u32 {
        self.wave = self.wave.saturating_add(1);
        self.wave
    }

    /// Composer borrowing the table and the current state.
    #[must_use]
    pub fn composer(&self) -> WaveComposer<'_> {
        WaveComposer::new(&self.table, &self.state)
    }

    /// See [`WaveComposer::calculate_zombie_health`].
    #[must_use]
    pub fn calculate_zombie_health(&self, kind: EnemyKind, wave: u32) -> u32 {
        self.composer().calculate_zombie_health(kind, wave)
    }

    /// See [`WaveComposer::calculate_zombie_damage`].
    #[must_use]
    pub fn calculate_zombie_damage(&self, kind: EnemyKind, wave: u32) -> u32 {
        self.composer().calculate_zombie_damage(kind, wave)
    }

    /// See [`WaveComposer::calculate_spawn_rate`].
    #[must_use]
    pub fn calculate_spawn_rate(&self, base_interval: f64, wave: u32) -> f64 {
        self.composer().calculate_spawn_rate(base_interval, wave)
    }

    /// See [`WaveComposer::calculate_zombie_count`].
    #[must_use]
    pub fn calculate_zombie_count(&self, base_count: u32, wave: u32) -> u32 {
        self.composer().calculate_zombie_count(base_count, wave)
    }

    /// Scaled plan for the active wave.
    #[must_use]
    pub fn build_wave(&self) -> WavePlan {
        self.composer().build_wave(self.wave)
    }

    /// Requests the active wave's enemies from `factory`.
    pub fn create_wave_zombies<F>(&self, point: SpawnPoint, factory: &mut F) -> Vec<F::Enemy>
    where
        F: EnemyFactory,
    {
        self.composer().create_wave_zombies(self.wave, point, factory)
    }

    /// Records a performance sample and adjusts the multiplier from its kill rate.
    pub fn update_performance_metrics(
        &mut self,
        kill_rate: f64,
        lives_lost: u32,
        resource_efficiency: f64,
    ) {
        self.state.performance = PerformanceMetrics {
            kill_rate,
            lives_lost,
            resource_efficiency,
        };
        self.adjust_difficulty();
    }

    /// Two independent branch pairs; one call may apply an adjustment from each.
    fn adjust_difficulty(&mut self) {
        let kill_rate = self.state.performance.kill_rate;
        let before = self.state.multiplier;
        let mut multiplier = before;

        if kill_rate < 70.0 {
            multiplier = (multiplier - 0.15).max(0.85);
        } else if kill_rate > 90.0 {
            multiplier = (multiplier + 0.10).min(1.2);
        }

        if kill_rate > 95.0 {
            multiplier = (multiplier + 0.05).min(MAX_MULTIPLIER);
        } else if kill_rate < 60.0 {
            multiplier = (multiplier - 0.10).max(MIN_MULTIPLIER);
        }

        debug_assert!((MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&multiplier));
        self.state.multiplier = multiplier;

        if multiplier != before {
            tracing::debug!(kill_rate, before, after = multiplier, "difficulty multiplier adjusted");
        }
    }
}
