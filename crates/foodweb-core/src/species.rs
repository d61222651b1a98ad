//! Species templates, biomes, terrain combat modifiers, and balance tuning.
//!
//! Templates are a closed table: every species is an enum variant with a
//! fully populated profile, resolved once at world construction (tuning
//! multipliers fold in at that point and never again). Nothing in the hot
//! path looks a species up by name.

use crate::stats::CombatStats;
use serde::{Deserialize, Serialize};

/// Terrain classes supplied by the climate collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    DeepOcean,
    ShallowOcean,
    Beach,
    Desert,
    Savanna,
    Grassland,
    TropicalRainforest,
    TemperateForest,
    Taiga,
    Tundra,
    Snow,
    Mountain,
}

impl Biome {
    pub const COUNT: usize = 12;

    pub const ALL: [Self; Self::COUNT] = [
        Self::DeepOcean,
        Self::ShallowOcean,
        Self::Beach,
        Self::Desert,
        Self::Savanna,
        Self::Grassland,
        Self::TropicalRainforest,
        Self::TemperateForest,
        Self::Taiga,
        Self::Tundra,
        Self::Snow,
        Self::Mountain,
    ];

    /// Dense index for per-biome tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Water cells require swimming or flight to enter.
    #[must_use]
    pub const fn is_water(self) -> bool {
        matches!(self, Self::DeepOcean | Self::ShallowOcean)
    }

    /// Forest-like cover that favors ambush predators and dampens flight.
    #[must_use]
    pub const fn gives_ambush_cover(self) -> bool {
        matches!(
            self,
            Self::TropicalRainforest | Self::TemperateForest | Self::Taiga
        )
    }

    /// Baseline growth factor for the vegetation field. Water biomes grow
    /// plankton rather than grass, so they stay nonzero for aquatic grazers.
    #[must_use]
    pub const fn fertility(self) -> f32 {
        match self {
            Self::DeepOcean => 0.3,
            Self::ShallowOcean => 0.7,
            Self::Beach => 0.2,
            Self::Desert => 0.05,
            Self::Savanna => 0.6,
            Self::Grassland => 0.9,
            Self::TropicalRainforest => 1.0,
            Self::TemperateForest => 0.8,
            Self::Taiga => 0.5,
            Self::Tundra => 0.25,
            Self::Snow => 0.05,
            Self::Mountain => 0.2,
        }
    }
}

/// Additive combat adjustments applied at the defender's cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainModifiers {
    pub accuracy: i32,
    pub evasion: i32,
    pub defense: f32,
    pub speed: i32,
    pub bonus_damage: f32,
}

impl TerrainModifiers {
    pub const NONE: Self = Self {
        accuracy: 0,
        evasion: 0,
        defense: 0.0,
        speed: 0,
        bonus_damage: 0.0,
    };
}

/// Combat modifiers for a biome. Open terrain leaves stats untouched; cover
/// raises evasion, deep snow slows and punishes, water exposes landborne
/// combatants.
#[must_use]
pub const fn terrain_modifiers(biome: Biome) -> TerrainModifiers {
    match biome {
        Biome::DeepOcean => TerrainModifiers {
            accuracy: -10,
            evasion: -20,
            ..TerrainModifiers::NONE
        },
        Biome::Beach => TerrainModifiers {
            speed: -2,
            ..TerrainModifiers::NONE
        },
        Biome::Desert => TerrainModifiers {
            accuracy: -5,
            evasion: -10,
            ..TerrainModifiers::NONE
        },
        Biome::TropicalRainforest => TerrainModifiers {
            accuracy: -10,
            evasion: 10,
            ..TerrainModifiers::NONE
        },
        Biome::TemperateForest => TerrainModifiers {
            accuracy: -5,
            evasion: 5,
            ..TerrainModifiers::NONE
        },
        Biome::Taiga => TerrainModifiers {
            speed: -1,
            ..TerrainModifiers::NONE
        },
        Biome::Tundra => TerrainModifiers {
            evasion: -5,
            speed: -2,
            ..TerrainModifiers::NONE
        },
        Biome::Snow => TerrainModifiers {
            speed: -4,
            bonus_damage: 3.0,
            ..TerrainModifiers::NONE
        },
        Biome::Mountain => TerrainModifiers {
            evasion: 15,
            defense: 2.0,
            ..TerrainModifiers::NONE
        },
        Biome::ShallowOcean | Biome::Savanna | Biome::Grassland => TerrainModifiers::NONE,
    }
}

/// Which controller a species belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesGroup {
    Herbivore,
    Predator,
    Scavenger,
}

/// Closed roster of simulated species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeciesId {
    Deer,
    Bison,
    Caribou,
    Gazelle,
    Elephant,
    Fish,
    Wolf,
    Lion,
    Bear,
    Leopard,
    ArcticFox,
    Raptor,
    Shark,
    Vulture,
    Hyena,
}

impl SpeciesId {
    pub const COUNT: usize = 15;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Deer,
        Self::Bison,
        Self::Caribou,
        Self::Gazelle,
        Self::Elephant,
        Self::Fish,
        Self::Wolf,
        Self::Lion,
        Self::Bear,
        Self::Leopard,
        Self::ArcticFox,
        Self::Raptor,
        Self::Shark,
        Self::Vulture,
        Self::Hyena,
    ];

    /// Dense index for per-species tables and time series.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deer => "deer",
            Self::Bison => "bison",
            Self::Caribou => "caribou",
            Self::Gazelle => "gazelle",
            Self::Elephant => "elephant",
            Self::Fish => "fish",
            Self::Wolf => "wolf",
            Self::Lion => "lion",
            Self::Bear => "bear",
            Self::Leopard => "leopard",
            Self::ArcticFox => "arctic_fox",
            Self::Raptor => "raptor",
            Self::Shark => "shark",
            Self::Vulture => "vulture",
            Self::Hyena => "hyena",
        }
    }
}

impl std::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Breeding rules for one species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReproductionProfile {
    /// Absolute health required before breeding is considered.
    pub threshold: f32,
    /// Children produced per successful breeding attempt.
    pub offspring_count: u8,
    /// Ticks between breeding attempts.
    pub cooldown: u16,
    /// Minimum age in ticks before the first attempt.
    pub min_age: u32,
    /// Radius searched for a same-species mate.
    pub mate_radius: u16,
    /// Chance of breeding without a mate nearby.
    pub solo_chance: f32,
    /// Per-child survival chance at spawn.
    pub survival_chance: f32,
    /// Fraction of max health drained from the parent per attempt.
    pub cost_fraction: f32,
}

/// Hunting rules for one species; inert for non-predators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredationProfile {
    /// Attack points added per packmate within `pack_radius`.
    pub pack_bonus: f32,
    pub pack_radius: u16,
    /// Accuracy granted when attacking from ambush cover.
    pub ambush_bonus: i32,
    /// Falls back to grazing at reduced efficiency when weak.
    pub vegetation_backup: bool,
    /// Ticks of rest after a kill.
    pub hunt_cooldown: u16,
    /// Acceptable prey and their selection weights.
    pub prey: &'static [(SpeciesId, f32)],
}

impl PredationProfile {
    pub const NONE: Self = Self {
        pack_bonus: 0.0,
        pack_radius: 0,
        ambush_bonus: 0,
        vegetation_backup: false,
        hunt_cooldown: 0,
        prey: &[],
    };

    /// Selection weight for `species`, zero when it is not prey.
    #[must_use]
    pub fn prey_weight(&self, species: SpeciesId) -> f32 {
        self.prey
            .iter()
            .find(|(id, _)| *id == species)
            .map_or(0.0, |(_, w)| *w)
    }
}

/// Immutable per-species configuration, resolved once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesTemplate {
    pub species: SpeciesId,
    pub group: SpeciesGroup,
    pub max_health: f32,
    pub attack: f32,
    pub defense: f32,
    pub speed: i32,
    pub evasion: i32,
    pub accuracy: i32,
    /// Cells reachable in one movement decision.
    pub movement_range: u16,
    /// Sensing radius for prey, mates, carrion, and threats.
    pub detection_range: u16,
    /// Suitability multiplier per biome; unlisted biomes fall back to 0.3.
    pub preferences: [f32; Biome::COUNT],
    pub can_walk: bool,
    pub can_swim: bool,
    pub can_fly: bool,
    /// Comfortable temperature band in `[0, 1]`.
    pub min_temperature: f32,
    pub max_temperature: f32,
    /// Cold-blooded species take double stress outside the band.
    pub cold_blooded: bool,
    /// Age in ticks past which death chance escalates.
    pub max_age: u32,
    /// Fraction of max health drained per tick.
    pub metabolism_rate: f32,
    /// Healing granted to whatever eats this species.
    pub food_value: f32,
    pub reproduction: ReproductionProfile,
    pub predation: PredationProfile,
}

const DEFAULT_PREFERENCE: f32 = 0.3;

fn preference_table(entries: &[(Biome, f32)]) -> [f32; Biome::COUNT] {
    let mut table = [DEFAULT_PREFERENCE; Biome::COUNT];
    for &(biome, value) in entries {
        table[biome.index()] = value;
    }
    table
}

impl SpeciesTemplate {
    /// Suitability multiplier for `biome`.
    #[must_use]
    pub fn preference(&self, biome: Biome) -> f32 {
        self.preferences[biome.index()]
    }

    /// Whether this species can occupy a cell of `biome`.
    #[must_use]
    pub fn passable(&self, biome: Biome) -> bool {
        if self.can_fly {
            return true;
        }
        if biome.is_water() {
            self.can_swim
        } else {
            self.can_walk
        }
    }

    /// Fresh combat stats at full health.
    #[must_use]
    pub fn stats(&self) -> CombatStats {
        CombatStats::new(
            self.max_health,
            self.attack,
            self.defense,
            self.speed,
            self.evasion,
            self.accuracy,
        )
    }

    /// Health drained per tick by upkeep.
    #[must_use]
    pub fn metabolism_cost(&self) -> f32 {
        self.max_health * self.metabolism_rate
    }

    /// True when `temperature` sits inside the comfort band.
    #[must_use]
    pub fn comfortable(&self, temperature: f32) -> bool {
        (self.min_temperature..=self.max_temperature).contains(&temperature)
    }

    /// Fold one-time balance multipliers into the template.
    #[must_use]
    fn tuned(mut self, tuning: &BalanceTuning) -> Self {
        let factor = match self.group {
            SpeciesGroup::Herbivore => tuning.herbivore_metabolism,
            SpeciesGroup::Predator => tuning.predator_metabolism,
            SpeciesGroup::Scavenger => tuning.scavenger_metabolism,
        };
        self.metabolism_rate *= factor;
        if self.predation.hunt_cooldown > 0 {
            let scaled = f32::from(self.predation.hunt_cooldown) * tuning.hunt_cooldown_scale;
            self.predation.hunt_cooldown = scaled.round() as u16;
        }
        self
    }

    /// Resolved template table indexed by [`SpeciesId::index`].
    #[must_use]
    pub fn resolve_all(tuning: &BalanceTuning) -> [Self; SpeciesId::COUNT] {
        std::array::from_fn(|i| Self::base(SpeciesId::ALL[i]).tuned(tuning))
    }

    /// Untuned base profile for `species`.
    #[must_use]
    pub fn base(species: SpeciesId) -> Self {
        match species {
            SpeciesId::Deer => Self {
                species,
                group: SpeciesGroup::Herbivore,
                max_health: 30.0,
                attack: 5.0,
                defense: 3.0,
                speed: 8,
                evasion: 20,
                accuracy: 100,
                movement_range: 3,
                detection_range: 4,
                preferences: preference_table(&[
                    (Biome::Grassland, 1.0),
                    (Biome::TemperateForest, 1.0),
                    (Biome::Savanna, 0.8),
                    (Biome::Taiga, 0.7),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.25,
                max_temperature: 0.75,
                cold_blooded: false,
                max_age: 40,
                metabolism_rate: 0.08,
                food_value: 15.0,
                reproduction: ReproductionProfile {
                    threshold: 20.0,
                    offspring_count: 2,
                    cooldown: 4,
                    min_age: 8,
                    mate_radius: 3,
                    solo_chance: 0.3,
                    survival_chance: 0.7,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Bison => Self {
                species,
                group: SpeciesGroup::Herbivore,
                max_health: 50.0,
                attack: 12.0,
                defense: 8.0,
                speed: 5,
                evasion: 5,
                accuracy: 100,
                movement_range: 2,
                detection_range: 3,
                preferences: preference_table(&[(Biome::Grassland, 1.0), (Biome::Savanna, 0.8)]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.2,
                max_temperature: 0.7,
                cold_blooded: false,
                max_age: 55,
                metabolism_rate: 0.05,
                food_value: 30.0,
                reproduction: ReproductionProfile {
                    threshold: 30.0,
                    offspring_count: 1,
                    cooldown: 5,
                    min_age: 10,
                    mate_radius: 3,
                    solo_chance: 0.3,
                    survival_chance: 0.7,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Caribou => Self {
                species,
                group: SpeciesGroup::Herbivore,
                max_health: 35.0,
                attack: 6.0,
                defense: 4.0,
                speed: 7,
                evasion: 15,
                accuracy: 100,
                movement_range: 4,
                detection_range: 5,
                preferences: preference_table(&[
                    (Biome::Taiga, 1.0),
                    (Biome::Tundra, 1.0),
                    (Biome::Snow, 0.7),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.0,
                max_temperature: 0.45,
                cold_blooded: false,
                max_age: 45,
                metabolism_rate: 0.07,
                food_value: 18.0,
                reproduction: ReproductionProfile {
                    threshold: 20.0,
                    offspring_count: 1,
                    cooldown: 4,
                    min_age: 8,
                    mate_radius: 3,
                    solo_chance: 0.3,
                    survival_chance: 0.7,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Gazelle => Self {
                species,
                group: SpeciesGroup::Herbivore,
                max_health: 25.0,
                attack: 4.0,
                defense: 2.0,
                speed: 10,
                evasion: 30,
                accuracy: 100,
                movement_range: 4,
                detection_range: 5,
                preferences: preference_table(&[(Biome::Savanna, 1.0), (Biome::Grassland, 0.8)]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.4,
                max_temperature: 0.9,
                cold_blooded: false,
                max_age: 30,
                metabolism_rate: 0.1,
                food_value: 12.0,
                reproduction: ReproductionProfile {
                    threshold: 15.0,
                    offspring_count: 2,
                    cooldown: 3,
                    min_age: 6,
                    mate_radius: 3,
                    solo_chance: 0.3,
                    survival_chance: 0.7,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Elephant => Self {
                species,
                group: SpeciesGroup::Herbivore,
                max_health: 100.0,
                attack: 25.0,
                defense: 15.0,
                speed: 4,
                evasion: 0,
                accuracy: 100,
                movement_range: 2,
                detection_range: 3,
                preferences: preference_table(&[
                    (Biome::Savanna, 1.0),
                    (Biome::TropicalRainforest, 1.0),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.45,
                max_temperature: 0.95,
                cold_blooded: false,
                max_age: 90,
                metabolism_rate: 0.03,
                food_value: 50.0,
                reproduction: ReproductionProfile {
                    threshold: 60.0,
                    offspring_count: 1,
                    cooldown: 8,
                    min_age: 18,
                    mate_radius: 3,
                    solo_chance: 0.3,
                    survival_chance: 0.7,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Fish => Self {
                species,
                group: SpeciesGroup::Herbivore,
                max_health: 18.0,
                attack: 2.0,
                defense: 1.0,
                speed: 6,
                evasion: 25,
                accuracy: 100,
                movement_range: 3,
                detection_range: 4,
                preferences: preference_table(&[
                    (Biome::DeepOcean, 1.0),
                    (Biome::ShallowOcean, 1.0),
                ]),
                can_walk: false,
                can_swim: true,
                can_fly: false,
                min_temperature: 0.1,
                max_temperature: 0.8,
                cold_blooded: true,
                max_age: 25,
                metabolism_rate: 0.06,
                food_value: 10.0,
                reproduction: ReproductionProfile {
                    threshold: 10.0,
                    offspring_count: 3,
                    cooldown: 2,
                    min_age: 4,
                    mate_radius: 3,
                    solo_chance: 0.35,
                    survival_chance: 0.6,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Wolf => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 40.0,
                attack: 15.0,
                defense: 5.0,
                speed: 9,
                evasion: 10,
                accuracy: 85,
                movement_range: 3,
                detection_range: 6,
                preferences: preference_table(&[
                    (Biome::Grassland, 1.0),
                    (Biome::TemperateForest, 1.0),
                    (Biome::Taiga, 1.0),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.1,
                max_temperature: 0.65,
                cold_blooded: false,
                max_age: 35,
                metabolism_rate: 0.1,
                food_value: 20.0,
                reproduction: ReproductionProfile {
                    threshold: 25.0,
                    offspring_count: 3,
                    cooldown: 6,
                    min_age: 8,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 3.0,
                    pack_radius: 3,
                    ambush_bonus: 15,
                    vegetation_backup: false,
                    hunt_cooldown: 2,
                    prey: &[
                        (SpeciesId::Deer, 1.0),
                        (SpeciesId::Caribou, 0.8),
                        (SpeciesId::Bison, 0.5),
                    ],
                },
            },
            SpeciesId::Lion => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 60.0,
                attack: 20.0,
                defense: 7.0,
                speed: 8,
                evasion: 8,
                accuracy: 80,
                movement_range: 3,
                detection_range: 6,
                preferences: preference_table(&[(Biome::Savanna, 1.0)]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.45,
                max_temperature: 0.95,
                cold_blooded: false,
                max_age: 40,
                metabolism_rate: 0.08,
                food_value: 25.0,
                reproduction: ReproductionProfile {
                    threshold: 35.0,
                    offspring_count: 2,
                    cooldown: 7,
                    min_age: 10,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 4.0,
                    pack_radius: 3,
                    ambush_bonus: 15,
                    vegetation_backup: false,
                    hunt_cooldown: 2,
                    prey: &[
                        (SpeciesId::Gazelle, 1.0),
                        (SpeciesId::Bison, 0.7),
                        (SpeciesId::Elephant, 0.3),
                    ],
                },
            },
            SpeciesId::Bear => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 70.0,
                attack: 18.0,
                defense: 10.0,
                speed: 5,
                evasion: 5,
                accuracy: 70,
                movement_range: 2,
                detection_range: 5,
                preferences: preference_table(&[
                    (Biome::TemperateForest, 1.0),
                    (Biome::Taiga, 1.0),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.15,
                max_temperature: 0.7,
                cold_blooded: false,
                max_age: 45,
                metabolism_rate: 0.06,
                food_value: 30.0,
                reproduction: ReproductionProfile {
                    threshold: 40.0,
                    offspring_count: 2,
                    cooldown: 8,
                    min_age: 10,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 0.0,
                    pack_radius: 0,
                    ambush_bonus: 15,
                    vegetation_backup: true,
                    hunt_cooldown: 2,
                    prey: &[
                        (SpeciesId::Fish, 0.8),
                        (SpeciesId::Deer, 0.7),
                        (SpeciesId::Caribou, 0.6),
                    ],
                },
            },
            SpeciesId::Leopard => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 45.0,
                attack: 17.0,
                defense: 4.0,
                speed: 10,
                evasion: 20,
                accuracy: 90,
                movement_range: 3,
                detection_range: 6,
                preferences: preference_table(&[
                    (Biome::Savanna, 1.0),
                    (Biome::TropicalRainforest, 1.0),
                    (Biome::TemperateForest, 1.0),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.4,
                max_temperature: 0.9,
                cold_blooded: false,
                max_age: 35,
                metabolism_rate: 0.09,
                food_value: 22.0,
                reproduction: ReproductionProfile {
                    threshold: 28.0,
                    offspring_count: 2,
                    cooldown: 6,
                    min_age: 8,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 0.0,
                    pack_radius: 0,
                    ambush_bonus: 20,
                    vegetation_backup: false,
                    hunt_cooldown: 2,
                    prey: &[(SpeciesId::Gazelle, 1.0), (SpeciesId::Deer, 0.8)],
                },
            },
            SpeciesId::ArcticFox => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 20.0,
                attack: 8.0,
                defense: 3.0,
                speed: 9,
                evasion: 25,
                accuracy: 75,
                movement_range: 3,
                detection_range: 5,
                preferences: preference_table(&[(Biome::Tundra, 1.0), (Biome::Snow, 1.0)]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.0,
                max_temperature: 0.35,
                cold_blooded: false,
                max_age: 25,
                metabolism_rate: 0.12,
                food_value: 10.0,
                reproduction: ReproductionProfile {
                    threshold: 12.0,
                    offspring_count: 4,
                    cooldown: 5,
                    min_age: 6,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 0.0,
                    pack_radius: 0,
                    ambush_bonus: 15,
                    vegetation_backup: false,
                    hunt_cooldown: 2,
                    prey: &[(SpeciesId::Caribou, 0.4), (SpeciesId::Fish, 0.6)],
                },
            },
            SpeciesId::Raptor => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 28.0,
                attack: 10.0,
                defense: 2.0,
                speed: 12,
                evasion: 30,
                accuracy: 85,
                movement_range: 5,
                detection_range: 8,
                preferences: preference_table(&[
                    (Biome::Mountain, 1.0),
                    (Biome::Savanna, 0.9),
                    (Biome::Grassland, 0.9),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: true,
                min_temperature: 0.2,
                max_temperature: 0.8,
                cold_blooded: false,
                max_age: 30,
                metabolism_rate: 0.09,
                food_value: 12.0,
                reproduction: ReproductionProfile {
                    threshold: 16.0,
                    offspring_count: 2,
                    cooldown: 5,
                    min_age: 6,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 0.0,
                    pack_radius: 0,
                    ambush_bonus: 15,
                    vegetation_backup: false,
                    hunt_cooldown: 2,
                    prey: &[(SpeciesId::Fish, 0.9), (SpeciesId::Gazelle, 0.3)],
                },
            },
            SpeciesId::Shark => Self {
                species,
                group: SpeciesGroup::Predator,
                max_health: 55.0,
                attack: 22.0,
                defense: 6.0,
                speed: 9,
                evasion: 10,
                accuracy: 85,
                movement_range: 4,
                detection_range: 7,
                preferences: preference_table(&[
                    (Biome::DeepOcean, 1.0),
                    (Biome::ShallowOcean, 0.8),
                ]),
                can_walk: false,
                can_swim: true,
                can_fly: false,
                min_temperature: 0.3,
                max_temperature: 0.9,
                cold_blooded: true,
                max_age: 50,
                metabolism_rate: 0.07,
                food_value: 25.0,
                reproduction: ReproductionProfile {
                    threshold: 30.0,
                    offspring_count: 1,
                    cooldown: 8,
                    min_age: 10,
                    mate_radius: 4,
                    solo_chance: 0.0,
                    survival_chance: 0.6,
                    cost_fraction: 0.4,
                },
                predation: PredationProfile {
                    pack_bonus: 0.0,
                    pack_radius: 0,
                    ambush_bonus: 15,
                    vegetation_backup: false,
                    hunt_cooldown: 2,
                    prey: &[(SpeciesId::Fish, 1.0)],
                },
            },
            SpeciesId::Vulture => Self {
                species,
                group: SpeciesGroup::Scavenger,
                max_health: 22.0,
                attack: 6.0,
                defense: 2.0,
                speed: 9,
                evasion: 20,
                accuracy: 80,
                movement_range: 5,
                detection_range: 8,
                preferences: preference_table(&[
                    (Biome::Savanna, 1.0),
                    (Biome::Desert, 0.8),
                    (Biome::Grassland, 0.8),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: true,
                min_temperature: 0.3,
                max_temperature: 0.9,
                cold_blooded: false,
                max_age: 28,
                metabolism_rate: 0.05,
                food_value: 8.0,
                reproduction: ReproductionProfile {
                    threshold: 12.0,
                    offspring_count: 2,
                    cooldown: 5,
                    min_age: 6,
                    mate_radius: 3,
                    solo_chance: 0.15,
                    survival_chance: 0.65,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
            SpeciesId::Hyena => Self {
                species,
                group: SpeciesGroup::Scavenger,
                max_health: 35.0,
                attack: 12.0,
                defense: 4.0,
                speed: 8,
                evasion: 12,
                accuracy: 80,
                movement_range: 3,
                detection_range: 6,
                preferences: preference_table(&[
                    (Biome::Savanna, 1.0),
                    (Biome::Grassland, 0.7),
                    (Biome::Desert, 0.5),
                ]),
                can_walk: true,
                can_swim: false,
                can_fly: false,
                min_temperature: 0.35,
                max_temperature: 0.9,
                cold_blooded: false,
                max_age: 32,
                metabolism_rate: 0.07,
                food_value: 14.0,
                reproduction: ReproductionProfile {
                    threshold: 18.0,
                    offspring_count: 3,
                    cooldown: 5,
                    min_age: 7,
                    mate_radius: 3,
                    solo_chance: 0.15,
                    survival_chance: 0.65,
                    cost_fraction: 0.3,
                },
                predation: PredationProfile::NONE,
            },
        }
    }
}

/// One-time balance multipliers folded into templates at world construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceTuning {
    /// Herbivore upkeep multiplier.
    pub herbivore_metabolism: f32,
    /// Multiplier on healing gained from vegetation.
    pub herbivore_food_efficiency: f32,
    /// Predator upkeep multiplier.
    pub predator_metabolism: f32,
    /// Multiplier on healing gained from a kill.
    pub predator_hunt_efficiency: f32,
    /// Scale applied to post-kill rest periods.
    pub hunt_cooldown_scale: f32,
    /// Efficiency of a predator's fallback grazing.
    pub vegetation_backup_efficiency: f32,
    /// Scavenger upkeep multiplier.
    pub scavenger_metabolism: f32,
    /// Optional hard cap on live agents per species.
    pub max_per_species: Option<u32>,
}

impl Default for BalanceTuning {
    fn default() -> Self {
        Self {
            herbivore_metabolism: 0.6,
            herbivore_food_efficiency: 1.8,
            predator_metabolism: 0.7,
            predator_hunt_efficiency: 0.7,
            hunt_cooldown_scale: 1.5,
            vegetation_backup_efficiency: 0.5,
            scavenger_metabolism: 0.8,
            max_per_species: None,
        }
    }
}

/// Area damage archetypes supplied to the disaster collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HazardKind {
    Wildfire,
    Flood,
    Blizzard,
    Earthquake,
}

/// Damage shape of one hazard kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardProfile {
    pub base_damage: f32,
    /// Defense ignored while the hazard damage is applied.
    pub defense_penetration: f32,
}

impl HazardKind {
    #[must_use]
    pub const fn profile(self) -> HazardProfile {
        match self {
            Self::Wildfire => HazardProfile {
                base_damage: 15.0,
                defense_penetration: 5.0,
            },
            Self::Flood => HazardProfile {
                base_damage: 10.0,
                defense_penetration: 0.0,
            },
            Self::Blizzard => HazardProfile {
                base_damage: 8.0,
                defense_penetration: 0.0,
            },
            Self::Earthquake => HazardProfile {
                base_damage: 20.0,
                defense_penetration: 0.0,
            },
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wildfire => "wildfire",
            Self::Flood => "flood",
            Self::Blizzard => "blizzard",
            Self::Earthquake => "earthquake",
        }
    }
}

/// Illness archetypes supplied to the disease collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiseaseKind {
    Plague,
    Flu,
    Parasites,
}

/// Per-tick damage shape of one disease; spread and duration are carried
/// for the host scheduler, the core only applies the tick damage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiseaseProfile {
    pub damage_per_tick: f32,
    pub spread_chance: f32,
    pub duration: u16,
}

impl DiseaseKind {
    #[must_use]
    pub const fn profile(self) -> DiseaseProfile {
        match self {
            Self::Plague => DiseaseProfile {
                damage_per_tick: 5.0,
                spread_chance: 0.3,
                duration: 8,
            },
            Self::Flu => DiseaseProfile {
                damage_per_tick: 3.0,
                spread_chance: 0.4,
                duration: 5,
            },
            Self::Parasites => DiseaseProfile {
                damage_per_tick: 2.0,
                spread_chance: 0.0,
                duration: 12,
            },
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plague => "plague",
            Self::Flu => "flu",
            Self::Parasites => "parasites",
        }
    }
}
