//! Stateless combat and foraging resolution.
//!
//! Pure functions over [`CombatStats`]: the world pipeline owns orchestration
//! and bookkeeping, these own the dice. Probability parameters are integer
//! percentages, every roll draws one integer in `[0, 100)`, and ties favor
//! the defender (strict `<`). Temporary bonuses (pack, ambush, flight) exist
//! only as effective values inside one resolution; the stats structs are
//! never left modified by them.

use crate::species::{Biome, PredationProfile, terrain_modifiers};
use crate::stats::CombatStats;
use rand::Rng;

/// Prey at or above this attack value stands and fights instead of fleeing.
pub const AGGRESSIVE_ATTACK_THRESHOLD: f32 = 10.0;
/// Evasion granted per point of speed advantage while fleeing.
pub const FLIGHT_EVASION_PER_SPEED: i32 = 2;
/// Vegetation density below which grazing finds nothing worth eating.
pub const FEEDING_MIN_DENSITY: f32 = 0.05;
/// Largest share of a cell's standing vegetation consumable per tick.
pub const FEEDING_MAX_BITE: f32 = 0.3;

/// Result of one hunt resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HuntOutcome {
    /// The predator's attack connected.
    pub hit: bool,
    /// Prey health reached zero.
    pub killed: bool,
    /// Damage dealt to the prey.
    pub damage: f32,
    /// Damage dealt back to the predator by a counter-attack.
    pub counter_damage: f32,
}

fn attack_roll<R: Rng + ?Sized>(rng: &mut R, accuracy: i32, evasion: i32) -> bool {
    rng.random_range(0..100) < accuracy - evasion
}

/// Resolve a predator attacking prey on `biome`.
///
/// Disposition first: aggressive prey (attack at or above the threshold)
/// stands its ground; faster timid prey converts its speed advantage into a
/// temporary evasion bonus. Ambush cover halves that flight bonus and grants
/// the predator its ambush accuracy. Pack attack scales with packmates. One
/// roll decides the attack; aggressive prey that survives a connecting hit
/// answers with a single counter-attack, never chained further.
pub fn resolve_hunt<R: Rng + ?Sized>(
    rng: &mut R,
    predator: &mut CombatStats,
    prey: &mut CombatStats,
    predation: &PredationProfile,
    pack_members: u32,
    biome: Biome,
) -> HuntOutcome {
    let terrain = terrain_modifiers(biome);
    let aggressive = prey.attack >= AGGRESSIVE_ATTACK_THRESHOLD;
    let speed_advantage = prey.speed - predator.speed;

    let mut flight_bonus = 0;
    if speed_advantage > 0 && !aggressive {
        flight_bonus = speed_advantage * FLIGHT_EVASION_PER_SPEED;
    }
    let mut ambush_accuracy = 0;
    if biome.gives_ambush_cover() {
        ambush_accuracy = predation.ambush_bonus;
        flight_bonus /= 2;
    }

    let attack = predator.attack + predation.pack_bonus * pack_members as f32;
    let accuracy = predator.accuracy + ambush_accuracy + terrain.accuracy;
    let evasion = prey.evasion + flight_bonus + terrain.evasion;

    let hit = attack_roll(rng, accuracy, evasion);
    let damage = if hit {
        // Terrain defense folds into the raw term; `apply_damage` subtracts
        // the defender's innate defense on top.
        prey.apply_damage(attack + terrain.bonus_damage - terrain.defense)
    } else {
        0.0
    };
    let killed = !prey.is_alive();

    let mut counter_damage = 0.0;
    if !killed && aggressive && hit {
        let counter_hit = attack_roll(
            rng,
            prey.accuracy + terrain.accuracy,
            predator.evasion + terrain.evasion,
        );
        if counter_hit {
            counter_damage = predator.apply_damage(prey.attack + terrain.bonus_damage - terrain.defense);
        }
    }

    HuntOutcome {
        hit,
        killed,
        damage,
        counter_damage,
    }
}

/// Graze vegetation at the agent's cell. Returns the density consumed, which
/// the caller subtracts from the field. Consumption is bounded by standing
/// density, by hunger, and by the per-tick bite cap; healing is consumed
/// density times `food_value`.
pub fn resolve_feeding(stats: &mut CombatStats, density: f32, food_value: f32) -> f32 {
    if density < FEEDING_MIN_DENSITY || food_value <= 0.0 {
        return 0.0;
    }
    let hunger = stats.max_health - stats.current_health;
    let max_bite = FEEDING_MAX_BITE.min(hunger / food_value);
    let consumed = density.min(max_bite);
    if consumed <= 0.0 {
        return 0.0;
    }
    stats.heal(consumed * food_value);
    consumed
}

/// Apply hazard damage scaled by `intensity`, ignoring up to `penetration`
/// points of defense for this hit only. Returns the damage dealt.
pub fn resolve_environmental_damage(
    stats: &mut CombatStats,
    base_damage: f32,
    intensity: f32,
    penetration: f32,
) -> f32 {
    let raw = (base_damage * intensity.max(0.0)).floor();
    let original_defense = stats.defense;
    stats.defense = (stats.defense - penetration.max(0.0)).max(0.0);
    let dealt = stats.apply_damage(raw);
    stats.defense = original_defense;
    dealt
}

/// One tick of disease damage; a plain mitigated hit, invoked once per
/// infected agent per tick by the external disease scheduler.
pub fn resolve_disease_tick(stats: &mut CombatStats, damage_per_tick: f32) -> f32 {
    stats.apply_damage(damage_per_tick)
}
