//! Static per-wave enemy composition.

use zombie_defence_core::{EnemyKind, WaveEnemyGroup};

/// Waves grouped under one composition table.
pub const WAVES_PER_TIER: u32 = 5;

/// One contiguous block of waves sharing a composition.
#[derive(Clone, Copy, Debug)]
pub struct TierSpec {
    base_count: u32,
    /// Enemies added per wave, in tenths.
    growth_tenths: u32,
    shares: &'static [(EnemyKind, u32)],
}

impl TierSpec {
    const fn new(base_count: u32, growth_tenths: u32, shares: &'static [(EnemyKind, u32)]) -> Self {
        Self {
            base_count,
            growth_tenths,
            shares,
        }
    }

    /// Percentage of the wave allotted to each kind.
    #[must_use]
    pub const fn shares(&self) -> &'static [(EnemyKind, u32)] {
        self.shares
    }

    /// `floor(base_count + wave * growth_per_wave)`.
    #[must_use]
    pub fn total_count(&self, wave: u32) -> u32 {
        self.base_count
            .saturating_add(wave.saturating_mul(self.growth_tenths) / 10)
    }
}

use EnemyKind::{Armored, Basic, Boss, Fast, Mechanical, Stealth, Swarm, Tank};

/// Composition tiers for waves 1-50, five waves each.
pub const TIERS: [TierSpec; 10] = [
    TierSpec::new(8, 10, &[(Basic, 70), (Fast, 30)]),
    TierSpec::new(10, 12, &[(Basic, 50), (Fast, 30), (Tank, 10), (Swarm, 10)]),
    TierSpec::new(
        12,
        14,
        &[(Basic, 40), (Fast, 25), (Tank, 10), (Armored, 10), (Swarm, 15)],
    ),
    TierSpec::new(
        14,
        15,
        &[
            (Basic, 30),
            (Fast, 20),
            (Tank, 10),
            (Armored, 15),
            (Swarm, 15),
            (Stealth, 10),
        ],
    ),
    TierSpec::new(
        16,
        16,
        &[
            (Basic, 25),
            (Fast, 15),
            (Tank, 10),
            (Armored, 15),
            (Swarm, 15),
            (Stealth, 10),
            (Mechanical, 10),
        ],
    ),
    TierSpec::new(
        18,
        17,
        &[
            (Basic, 20),
            (Fast, 15),
            (Tank, 10),
            (Armored, 15),
            (Swarm, 15),
            (Stealth, 15),
            (Mechanical, 10),
        ],
    ),
    TierSpec::new(
        20,
        18,
        &[
            (Basic, 15),
            (Fast, 10),
            (Tank, 10),
            (Armored, 20),
            (Swarm, 15),
            (Stealth, 15),
            (Mechanical, 15),
        ],
    ),
    TierSpec::new(
        22,
        19,
        &[
            (Basic, 10),
            (Fast, 10),
            (Tank, 10),
            (Armored, 20),
            (Swarm, 20),
            (Stealth, 15),
            (Mechanical, 15),
        ],
    ),
    TierSpec::new(
        24,
        20,
        &[
            (Basic, 5),
            (Fast, 10),
            (Tank, 10),
            (Armored, 20),
            (Swarm, 20),
            (Stealth, 15),
            (Mechanical, 17),
            (Boss, 3),
        ],
    ),
    TierSpec::new(
        26,
        22,
        &[
            (Basic, 5),
            (Fast, 5),
            (Tank, 10),
            (Armored, 20),
            (Swarm, 20),
            (Stealth, 15),
            (Mechanical, 20),
            (Boss, 5),
        ],
    ),
];

/// Tier governing `wave`. Waves past the last tier use the last tier.
#[must_use]
pub fn tier_for(wave: u32) -> &'static TierSpec {
    let index = (wave.max(1) - 1) / WAVES_PER_TIER;
    &TIERS[(index as usize).min(TIERS.len() - 1)]
}

/// Read-only mapping from wave number to its enemy groups.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveTable {
    waves: Vec<Vec<WaveEnemyGroup>>,
}

impl WaveTable {
    /// Builds the standard table covering every tier.
    #[must_use]
    pub fn standard() -> Self {
        build_wave_table()
    }

    /// Highest wave with its own entry.
    #[must_use]
    pub fn last_defined_wave(&self) -> u32 {
        self.waves.len() as u32
    }

    /// Groups for `wave`.
    ///
    /// Wave zero resolves to wave one; waves beyond the table resolve to the
    /// last defined wave. The returned slice is never empty.
    #[must_use]
    pub fn groups(&self, wave: u32) -> &[WaveEnemyGroup] {
        let index = wave.clamp(1, self.last_defined_wave()) as usize - 1;
        &self.waves[index]
    }
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Deterministically expands [`TIERS`] into a per-wave table.
#[must_use]
pub fn build_wave_table() -> WaveTable {
    let last_wave = TIERS.len() as u32 * WAVES_PER_TIER;
    let waves = (1..=last_wave)
        .map(|wave| {
            let tier = tier_for(wave);
            let total = tier.total_count(wave);
            tier.shares()
                .iter()
                .filter_map(|&(kind, percent)| {
                    let count = total * percent / 100;
                    (count > 0).then(|| {
                        WaveEnemyGroup::new(kind, count, kind.profile().base_spawn_interval())
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();
    WaveTable { waves }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_shares_sum_to_one_hundred() {
        for (index, tier) in TIERS.iter().enumerate() {
            let total = tier.shares().iter().map(|(_, percent)| percent).sum::<u32>();
            assert_eq!(total, 100, "tier {} shares", index + 1);
        }
    }

    #[test]
    fn every_wave_resolves_to_groups() {
        let table = build_wave_table();
        assert_eq!(table.last_defined_wave(), 50);
        for wave in 0..=120 {
            assert!(!table.groups(wave).is_empty(), "wave {wave} has no groups");
        }
    }

    #[test]
    fn waves_beyond_table_reuse_last_wave() {
        let table = build_wave_table();
        assert_eq!(table.groups(51), table.groups(50));
        assert_eq!(table.groups(500), table.groups(50));
        assert_eq!(table.groups(0), table.groups(1));
    }

    #[test]
    fn first_wave_is_mostly_basic() {
        let table = build_wave_table();
        assert_eq!(
            table.groups(1),
            &[
                WaveEnemyGroup::new(EnemyKind::Basic, 6, 2.0),
                WaveEnemyGroup::new(EnemyKind::Fast, 2, 1.2),
            ]
        );
    }

    #[test]
    fn group_counts_never_exceed_tier_total() {
        let table = build_wave_table();
        for wave in 1..=50 {
            let total = tier_for(wave).total_count(wave);
            let grouped = table.groups(wave).iter().map(WaveEnemyGroup::count).sum::<u32>();
            assert!(grouped <= total);
            assert!(total - grouped < tier_for(wave).shares().len() as u32);
        }
    }

    #[test]
    fn late_tiers_shift_toward_heavy_enemies() {
        let share = |wave: u32, kind: EnemyKind| {
            tier_for(wave)
                .shares()
                .iter()
                .find(|(candidate, _)| *candidate == kind)
                .map_or(0, |(_, percent)| *percent)
        };
        assert!(share(1, EnemyKind::Basic) > share(50, EnemyKind::Basic));
        assert!(share(1, EnemyKind::Armored) < share(50, EnemyKind::Armored));
        assert!(share(50, EnemyKind::Boss) > 0);
        assert_eq!(share(1, EnemyKind::Boss), 0);
    }

    #[test]
    fn total_count_floors_fractional_growth() {
        // 10 + 6 * 1.2 = 17.2
        assert_eq!(tier_for(6).total_count(6), 17);
        // 8 + 1 * 1.0 = 9
        assert_eq!(tier_for(1).total_count(1), 9);
    }
}
