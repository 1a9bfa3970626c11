//! Per-wave scaling formulas.
//!
//! Health grows linearly and ignores the difficulty multiplier so toughness
//! stays predictable. Damage, spawn cadence and group size follow the
//! multiplier.

use zombie_defence_core::EnemyKind;

const HEALTH_PER_WAVE: f64 = 1.8;
const DAMAGE_PER_WAVE: f64 = 1.5;
const SPAWN_INTERVAL_DECAY: f64 = 0.95;
/// Shortest allowed gap between two spawns, in seconds.
pub const MIN_SPAWN_INTERVAL: f64 = 0.5;
const COUNT_GROWTH: f64 = 1.08;
/// Every this many waves the group size gets a spike.
pub const SPIKE_WAVE_PERIOD: u32 = 5;
const SPIKE_FACTOR: f64 = 1.2;

/// `floor(base_health + wave * 1.8)`.
#[must_use]
pub fn zombie_health(kind: EnemyKind, wave: u32) -> u32 {
    (kind.profile().base_health() + f64::from(wave) * HEALTH_PER_WAVE).floor() as u32
}

/// `floor(base_damage + wave * 1.5 * multiplier)`.
#[must_use]
pub fn zombie_damage(kind: EnemyKind, wave: u32, multiplier: f64) -> u32 {
    (kind.profile().base_damage() + f64::from(wave) * DAMAGE_PER_WAVE * multiplier).floor() as u32
}

/// `max(0.5, base_interval * 0.95^wave * multiplier)`.
#[must_use]
pub fn spawn_rate(base_interval: f64, wave: u32, multiplier: f64) -> f64 {
    let scaled = base_interval * SPAWN_INTERVAL_DECAY.powf(f64::from(wave)) * multiplier;
    if scaled.is_nan() {
        return MIN_SPAWN_INTERVAL;
    }
    scaled.max(MIN_SPAWN_INTERVAL)
}

/// `floor(base_count * 1.08^wave * multiplier)`, with a +20% spike every fifth wave.
#[must_use]
pub fn zombie_count(base_count: u32, wave: u32, multiplier: f64) -> u32 {
    let spike = if wave % SPIKE_WAVE_PERIOD == 0 {
        SPIKE_FACTOR
    } else {
        1.0
    };
    (f64::from(base_count) * COUNT_GROWTH.powf(f64::from(wave)) * multiplier * spike).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_grows_linearly() {
        assert_eq!(zombie_health(EnemyKind::Basic, 1), 101);
        assert_eq!(zombie_health(EnemyKind::Tank, 5), 509);
        assert_eq!(zombie_health(EnemyKind::Basic, 10), 118);
    }

    #[test]
    fn damage_follows_multiplier() {
        assert_eq!(zombie_damage(EnemyKind::Basic, 1, 1.0), 11);
        assert_eq!(zombie_damage(EnemyKind::Basic, 10, 1.0), 25);
        assert_eq!(zombie_damage(EnemyKind::Basic, 10, 0.7), 20);
        assert_eq!(zombie_damage(EnemyKind::Basic, 10, 1.3), 29);
    }

    #[test]
    fn spawn_interval_decays_exponentially() {
        let interval = spawn_rate(2.0, 5, 1.0);
        assert!((interval - 2.0 * 0.95_f64.powi(5)).abs() < 1e-12);
        assert!((interval - 1.57).abs() < 0.03);
    }

    #[test]
    fn spawn_interval_never_drops_below_floor() {
        for wave in 0..200 {
            for multiplier in [0.0, 0.7, 1.0, 1.3] {
                assert!(spawn_rate(2.0, wave, multiplier) >= MIN_SPAWN_INTERVAL);
                assert!(spawn_rate(0.1, wave, multiplier) >= MIN_SPAWN_INTERVAL);
            }
        }
        assert_eq!(spawn_rate(f64::NAN, 3, 1.0), MIN_SPAWN_INTERVAL);
    }

    #[test]
    fn count_spikes_every_fifth_wave() {
        assert_eq!(zombie_count(10, 1, 1.0), 10);
        assert_eq!(zombie_count(10, 4, 1.0), 13);
        // 10 * 1.08^5 * 1.2 = 17.63
        assert_eq!(zombie_count(10, 5, 1.0), 17);
        assert_eq!(zombie_count(0, 5, 1.3), 0);
    }

    #[test]
    fn count_is_a_pure_function() {
        for wave in 1..=30 {
            let first = zombie_count(12, wave, 1.15);
            let second = zombie_count(12, wave, 1.15);
            assert_eq!(first, second);
            assert_eq!(zombie_count(first, wave, 1.15), zombie_count(second, wave, 1.15));
        }
    }
}
