//! TOML configuration for the command-line adapter.

use std::{fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zombie_defence_core::TowerStats;

/// Settings for one simulated session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SimulationConfig {
    /// Seed of the deterministic random generator.
    pub(crate) seed: u64,
    /// Number of waves to play.
    pub(crate) waves: u32,
    /// Length of the enemy path in world units.
    pub(crate) path_length: f64,
    /// Game time between two scheduled balance reports, in milliseconds.
    pub(crate) analysis_interval_ms: u64,
    /// Money available before the first wave.
    pub(crate) starting_money: i64,
    /// Lives available before the first wave.
    pub(crate) starting_lives: u32,
    /// Tower types the player may build.
    pub(crate) towers: Vec<TowerStats>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x2d_5eed,
            waves: 20,
            path_length: 1_000.0,
            analysis_interval_ms: 30_000,
            starting_money: 500,
            starting_lives: 20,
            towers: default_roster(),
        }
    }
}

fn tower(name: &str, build_cost: f64, dps: f64, range: f64, accuracy: f64, damage_per_hit: f64) -> TowerStats {
    TowerStats {
        name: name.to_owned(),
        build_cost,
        upgrade_cost: 0.0,
        dps,
        range,
        accuracy,
        damage_per_hit,
    }
}

fn default_roster() -> Vec<TowerStats> {
    vec![
        tower("Cannon", 100.0, 50.0, 150.0, 0.85, 25.0),
        tower("Machine Gun", 80.0, 45.0, 120.0, 0.7, 6.0),
        tower("Sniper", 200.0, 60.0, 350.0, 0.98, 120.0),
        tower("Flamethrower", 120.0, 70.0, 90.0, 0.75, 5.0),
        tower("Tesla", 250.0, 95.0, 160.0, 0.9, 40.0),
    ]
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config `{}`", path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML for [`SimulationConfig`].
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its accepted range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SimulationConfig {
    /// Loads and validates a configuration file.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parses and validates configuration text.
    pub(crate) fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.waves == 0 {
            return Err(ConfigError::Invalid("`waves` must be at least 1".to_owned()));
        }
        if !self.path_length.is_finite() || self.path_length <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "`path_length` must be positive, got {}",
                self.path_length
            )));
        }
        if self.starting_money < 0 {
            return Err(ConfigError::Invalid(
                "`starting_money` must not be negative".to_owned(),
            ));
        }
        if self.towers.is_empty() {
            return Err(ConfigError::Invalid("at least one tower is required".to_owned()));
        }
        for tower in &self.towers {
            if tower.name.trim().is_empty() {
                return Err(ConfigError::Invalid("tower names must not be empty".to_owned()));
            }
            let numbers = [
                tower.build_cost,
                tower.upgrade_cost,
                tower.dps,
                tower.range,
                tower.accuracy,
                tower.damage_per_hit,
            ];
            if numbers.iter().any(|value| !value.is_finite() || *value < 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "tower `{}` has a negative or non-finite stat",
                    tower.name
                )));
            }
        }
        Ok(())
    }
}
