//! Mutable combat stats and the shared damage/heal primitives.
//!
//! Every damage source in the simulation funnels through one of two paths:
//! `apply_damage` for hits (defense mitigates, a connecting hit always deals
//! at least one point) and `drain` for upkeep costs like metabolism and
//! movement, which defense must not soften. Both clamp so health never goes
//! negative and never exceeds the maximum.

use serde::{Deserialize, Serialize};

/// Per-instance combat stats. Accuracy and evasion are integer percentages
/// in `[0, 100)`; health, attack, and defense are scalar points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub max_health: f32,
    pub current_health: f32,
    pub attack: f32,
    pub defense: f32,
    pub speed: i32,
    pub evasion: i32,
    pub accuracy: i32,
}

impl CombatStats {
    /// Stats at full health.
    #[must_use]
    pub const fn new(
        max_health: f32,
        attack: f32,
        defense: f32,
        speed: i32,
        evasion: i32,
        accuracy: i32,
    ) -> Self {
        Self {
            max_health,
            current_health: max_health,
            attack,
            defense,
            speed,
            evasion,
            accuracy,
        }
    }

    /// Apply a hit of `raw` points. Defense mitigates but never nullifies:
    /// a connecting hit deals at least 1 point, clamped to remaining health.
    /// Returns the damage actually dealt.
    pub fn apply_damage(&mut self, raw: f32) -> f32 {
        let raw = raw.max(0.0);
        let mitigated = (raw - self.defense).max(1.0);
        let actual = mitigated.min(self.current_health.max(0.0));
        self.current_health -= actual;
        actual
    }

    /// Reduce health directly, bypassing defense and the 1-point floor.
    /// Used for metabolism, movement, and reproduction costs. Returns the
    /// amount actually drained.
    pub fn drain(&mut self, amount: f32) -> f32 {
        let actual = amount.clamp(0.0, self.current_health.max(0.0));
        self.current_health -= actual;
        actual
    }

    /// Restore health, clamped to the maximum. Returns the amount gained.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let gain = amount.max(0.0).min(self.max_health - self.current_health);
        self.current_health += gain;
        gain
    }

    /// An agent is alive while it has strictly positive health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current_health > 0.0
    }

    /// Current health as a fraction of the maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.current_health / self.max_health
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CombatStats {
        CombatStats::new(30.0, 5.0, 3.0, 8, 20, 100)
    }

    #[test]
    fn damage_is_mitigated_but_floored_at_one() {
        let mut stats = sample();
        let dealt = stats.apply_damage(10.0);
        assert!((dealt - 7.0).abs() < f32::EPSILON, "10 - 3 defense = 7");
        assert!((stats.current_health - 23.0).abs() < f32::EPSILON);

        let dealt = stats.apply_damage(2.0);
        assert!(
            (dealt - 1.0).abs() < f32::EPSILON,
            "defense exceeds raw damage, floor applies"
        );
    }

    #[test]
    fn damage_clamps_to_remaining_health() {
        let mut stats = sample();
        stats.current_health = 4.0;
        let dealt = stats.apply_damage(999.0);
        assert!((dealt - 4.0).abs() < f32::EPSILON, "never over-subtracts");
        assert_eq!(stats.current_health, 0.0);
        assert!(!stats.is_alive());

        let dealt = stats.apply_damage(50.0);
        assert_eq!(dealt, 0.0, "dead stats take no further damage");
        assert_eq!(stats.current_health, 0.0);
    }

    #[test]
    fn damage_bounds_hold_across_inputs() {
        for raw in [0.0_f32, 0.5, 1.0, 2.9, 3.0, 7.75, 29.0, 30.0, 1e6] {
            let mut stats = sample();
            let before = stats.current_health;
            let dealt = stats.apply_damage(raw);
            assert!(
                (0.0..=stats.max_health).contains(&stats.current_health),
                "health out of bounds after raw={raw}: {}",
                stats.current_health
            );
            assert!(
                dealt >= 1.0_f32.min(before),
                "a connecting hit deals at least min(1, health), raw={raw} dealt={dealt}"
            );
        }
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut stats = sample();
        stats.current_health = 28.0;
        let gained = stats.heal(10.0);
        assert!((gained - 2.0).abs() < f32::EPSILON);
        assert_eq!(stats.current_health, stats.max_health);
        assert_eq!(stats.heal(5.0), 0.0);
    }

    #[test]
    fn drain_ignores_defense_and_zeroes_exactly() {
        let mut stats = sample();
        let drained = stats.drain(0.5);
        assert!((drained - 0.5).abs() < f32::EPSILON, "no mitigation");
        stats.current_health = 2.0;
        let drained = stats.drain(3.0);
        assert!((drained - 2.0).abs() < f32::EPSILON);
        assert_eq!(stats.current_health, 0.0);
        assert_eq!(stats.drain(1.0), 0.0);
    }

    #[test]
    fn health_fraction_tracks_current_over_max() {
        let mut stats = sample();
        stats.current_health = 15.0;
        assert!((stats.health_fraction() - 0.5).abs() < f32::EPSILON);
        stats.current_health = 0.0;
        assert_eq!(stats.health_fraction(), 0.0);
    }
}
