#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session ledger for the Zombie Defence balance engine.
//!
//! The host game reports what happened through [`Event`] values. [`apply`]
//! folds them into cumulative counters and a per-wave tally, and hands back a
//! [`WaveOutcome`] whenever a wave completes. Systems read the ledger through
//! the [`query`] module only.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use zombie_defence_core::{Event, PerformanceMetrics, TowerStats};

const DEFAULT_STARTING_MONEY: i64 = 500;
const DEFAULT_STARTING_LIVES: u32 = 20;

/// Performance measured over one completed wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveOutcome {
    /// Wave the outcome belongs to.
    pub wave: u32,
    /// Percentage of the wave's enemies that were killed, 100 when none appeared.
    pub kill_rate: f64,
    /// Lives lost during the wave.
    pub lives_lost: u32,
    /// Income as a percentage of spending during the wave, 100 when nothing was spent.
    pub resource_efficiency: f64,
}

impl From<WaveOutcome> for PerformanceMetrics {
    fn from(outcome: WaveOutcome) -> Self {
        PerformanceMetrics {
            kill_rate: outcome.kill_rate,
            lives_lost: outcome.lives_lost,
            resource_efficiency: outcome.resource_efficiency,
        }
    }
}

/// Running totals for one accounting period.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Tally {
    kills: u32,
    leaks: u32,
    lives_lost: u32,
    damage: f64,
    overkill: f64,
    spent: f64,
    earned: f64,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemyKilled { .. } => self.kills = self.kills.saturating_add(1),
            Event::EnemyLeaked { lives_lost, .. } => {
                self.leaks = self.leaks.saturating_add(1);
                self.lives_lost = self.lives_lost.saturating_add(*lives_lost);
            }
            Event::DamageDealt { amount, overkill } => {
                self.damage += amount.max(0.0);
                self.overkill += overkill.clamp(0.0, amount.max(0.0));
            }
            Event::MoneyChanged { delta } => {
                if *delta < 0 {
                    self.spent += delta.unsigned_abs() as f64;
                } else {
                    self.earned += *delta as f64;
                }
            }
            Event::TimeAdvanced { .. }
            | Event::WaveStarted { .. }
            | Event::WaveCompleted { .. }
            | Event::TowerPlaced { .. } => {}
        }
    }

    fn kill_rate(&self) -> f64 {
        let encountered = self.kills.saturating_add(self.leaks);
        if encountered == 0 {
            100.0
        } else {
            f64::from(self.kills) / f64::from(encountered) * 100.0
        }
    }

    fn resource_efficiency(&self) -> f64 {
        if self.spent <= 0.0 {
            100.0
        } else {
            self.earned / self.spent * 100.0
        }
    }
}

/// Represents the authoritative state of one play session.
#[derive(Clone, Debug)]
pub struct Session {
    money: i64,
    lives: u32,
    wave: u32,
    towers: Vec<TowerStats>,
    elapsed: Duration,
    totals: Tally,
    current: Tally,
    outcomes: Vec<WaveOutcome>,
}

impl Session {
    /// Creates a session with the default bankroll and lives.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resources(DEFAULT_STARTING_MONEY, DEFAULT_STARTING_LIVES)
    }

    /// Creates a session with the provided bankroll and lives.
    #[must_use]
    pub fn with_resources(money: i64, lives: u32) -> Self {
        Self {
            money,
            lives,
            wave: 1,
            towers: Vec::new(),
            elapsed: Duration::ZERO,
            totals: Tally::default(),
            current: Tally::default(),
            outcomes: Vec::new(),
        }
    }

    fn complete_wave(&mut self, wave: u32) -> WaveOutcome {
        let outcome = WaveOutcome {
            wave,
            kill_rate: self.current.kill_rate(),
            lives_lost: self.current.lives_lost,
            resource_efficiency: self.current.resource_efficiency(),
        };
        self.current = Tally::default();
        self.outcomes.push(outcome);
        outcome
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided event to the session.
///
/// Returns the wave's outcome when `event` is [`Event::WaveCompleted`].
pub fn apply(session: &mut Session, event: &Event) -> Option<WaveOutcome> {
    session.totals.record(event);
    session.current.record(event);

    match event {
        Event::TimeAdvanced { dt } => {
            session.elapsed = session.elapsed.saturating_add(*dt);
        }
        Event::WaveStarted { wave } => session.wave = (*wave).max(1),
        Event::WaveCompleted { wave } => {
            return Some(session.complete_wave((*wave).max(1)));
        }
        Event::EnemyLeaked { lives_lost, .. } => {
            session.lives = session.lives.saturating_sub(*lives_lost);
        }
        Event::MoneyChanged { delta } => {
            session.money = session.money.saturating_add(*delta);
        }
        Event::TowerPlaced { tower } => session.towers.push(tower.clone()),
        Event::EnemyKilled { .. } | Event::DamageDealt { .. } => {}
    }

    None
}

/// Query functions that provide read-only access to the session.
pub mod query {
    use std::time::Duration;

    use super::{Session, WaveOutcome};
    use zombie_defence_core::{LiveCounters, TowerStats};

    /// Captures the live counters by value.
    #[must_use]
    pub fn live_counters(session: &Session) -> LiveCounters {
        LiveCounters {
            money: session.money,
            lives: session.lives,
            wave: session.wave,
            towers: session.towers.clone(),
            total_damage: session.totals.damage,
            overkill_damage: session.totals.overkill,
            kills: session.totals.kills,
            leaks: session.totals.leaks,
            money_spent: session.totals.spent,
            money_earned: session.totals.earned,
        }
    }

    /// Active wave number.
    #[must_use]
    pub fn wave(session: &Session) -> u32 {
        session.wave
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(session: &Session) -> u32 {
        session.lives
    }

    /// Reports whether the player has run out of lives.
    #[must_use]
    pub fn is_defeated(session: &Session) -> bool {
        session.lives == 0
    }

    /// Towers placed so far, in placement order.
    #[must_use]
    pub fn towers(session: &Session) -> &[TowerStats] {
        &session.towers
    }

    /// Game time accumulated from [`zombie_defence_core::Event::TimeAdvanced`].
    #[must_use]
    pub fn elapsed(session: &Session) -> Duration {
        session.elapsed
    }

    /// Outcomes of every completed wave, oldest first.
    #[must_use]
    pub fn wave_outcomes(session: &Session) -> &[WaveOutcome] {
        &session.outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zombie_defence_core::EnemyKind;

    fn cannon() -> TowerStats {
        TowerStats {
            name: "Cannon".to_owned(),
            build_cost: 100.0,
            upgrade_cost: 0.0,
            dps: 50.0,
            range: 150.0,
            accuracy: 0.85,
            damage_per_hit: 25.0,
        }
    }

    fn apply_all(session: &mut Session, events: &[Event]) -> Vec<WaveOutcome> {
        events
            .iter()
            .filter_map(|event| apply(session, event))
            .collect()
    }

    #[test]
    fn new_session_reports_starting_resources() {
        let session = Session::with_resources(300, 15);
        let counters = query::live_counters(&session);

        assert_eq!(counters.money, 300);
        assert_eq!(counters.lives, 15);
        assert_eq!(counters.wave, 1);
        assert!(counters.towers.is_empty());
        assert_eq!(counters.kills, 0);
        assert!(query::wave_outcomes(&session).is_empty());
    }

    #[test]
    fn completed_wave_reports_kill_rate_and_efficiency() {
        let mut session = Session::new();
        let mut events = vec![
            Event::WaveStarted { wave: 1 },
            Event::MoneyChanged { delta: -100 },
        ];
        for _ in 0..9 {
            events.push(Event::EnemyKilled {
                kind: EnemyKind::Basic,
            });
            events.push(Event::MoneyChanged { delta: 10 });
        }
        events.push(Event::EnemyLeaked {
            kind: EnemyKind::Fast,
            lives_lost: 2,
        });
        events.push(Event::WaveCompleted { wave: 1 });

        let outcomes = apply_all(&mut session, &events);

        assert_eq!(
            outcomes,
            vec![WaveOutcome {
                wave: 1,
                kill_rate: 90.0,
                lives_lost: 2,
                resource_efficiency: 90.0,
            }]
        );
        assert_eq!(query::lives(&session), DEFAULT_STARTING_LIVES - 2);
        assert_eq!(query::live_counters(&session).money, DEFAULT_STARTING_MONEY - 10);
    }

    #[test]
    fn empty_wave_is_a_perfect_wave() {
        let mut session = Session::new();
        let outcomes = apply_all(
            &mut session,
            &[Event::WaveStarted { wave: 3 }, Event::WaveCompleted { wave: 3 }],
        );

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].kill_rate, 100.0);
        assert_eq!(outcomes[0].resource_efficiency, 100.0);
        assert_eq!(PerformanceMetrics::from(outcomes[0]), PerformanceMetrics::default());
    }

    #[test]
    fn per_wave_tally_resets_while_totals_accumulate() {
        let mut session = Session::new();
        let _ = apply_all(
            &mut session,
            &[
                Event::WaveStarted { wave: 1 },
                Event::EnemyLeaked {
                    kind: EnemyKind::Tank,
                    lives_lost: 1,
                },
                Event::WaveCompleted { wave: 1 },
                Event::WaveStarted { wave: 2 },
                Event::EnemyKilled {
                    kind: EnemyKind::Swarm,
                },
            ],
        );
        let second = apply(&mut session, &Event::WaveCompleted { wave: 2 });

        assert_eq!(second.map(|outcome| outcome.kill_rate), Some(100.0));
        let counters = query::live_counters(&session);
        assert_eq!(counters.kills, 1);
        assert_eq!(counters.leaks, 1);
        assert_eq!(query::wave(&session), 2);
        assert_eq!(query::wave_outcomes(&session).len(), 2);
    }

    #[test]
    fn purchases_between_waves_count_toward_the_next_wave() {
        let mut session = Session::new();
        let _ = apply_all(
            &mut session,
            &[
                Event::WaveStarted { wave: 1 },
                Event::WaveCompleted { wave: 1 },
                Event::TowerPlaced { tower: cannon() },
                Event::MoneyChanged { delta: -100 },
                Event::WaveStarted { wave: 2 },
                Event::EnemyKilled {
                    kind: EnemyKind::Basic,
                },
                Event::MoneyChanged { delta: 40 },
            ],
        );
        let second = apply(&mut session, &Event::WaveCompleted { wave: 2 });

        assert_eq!(second.map(|outcome| outcome.resource_efficiency), Some(40.0));
    }

    #[test]
    fn damage_tracks_overkill_within_amount() {
        let mut session = Session::new();
        let _ = apply_all(
            &mut session,
            &[
                Event::DamageDealt {
                    amount: 120.0,
                    overkill: 20.0,
                },
                Event::DamageDealt {
                    amount: 10.0,
                    overkill: 40.0,
                },
            ],
        );
        let counters = query::live_counters(&session);

        assert_eq!(counters.total_damage, 130.0);
        assert_eq!(counters.overkill_damage, 30.0);
    }

    #[test]
    fn tower_placement_records_roster_without_charging() {
        let mut session = Session::new();
        let _ = apply(&mut session, &Event::TowerPlaced { tower: cannon() });
        let _ = apply(&mut session, &Event::MoneyChanged { delta: -100 });

        assert_eq!(query::towers(&session), &[cannon()]);
        let counters = query::live_counters(&session);
        assert_eq!(counters.money, DEFAULT_STARTING_MONEY - 100);
        assert_eq!(counters.money_spent, 100.0);
        assert_eq!(counters.money_earned, 0.0);
    }

    #[test]
    fn lives_never_underflow() {
        let mut session = Session::with_resources(0, 3);
        let _ = apply(
            &mut session,
            &Event::EnemyLeaked {
                kind: EnemyKind::Boss,
                lives_lost: 10,
            },
        );

        assert_eq!(query::lives(&session), 0);
        assert!(query::is_defeated(&session));
    }

    #[test]
    fn time_accumulates() {
        let mut session = Session::new();
        for _ in 0..4 {
            let _ = apply(
                &mut session,
                &Event::TimeAdvanced {
                    dt: Duration::from_millis(250),
                },
            );
        }

        assert_eq!(query::elapsed(&session), Duration::from_secs(1));
    }
}
