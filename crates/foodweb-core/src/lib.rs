//! Multi-species food-web simulation over a wrapping grid.
//!
//! The world holds three population groups (herbivores, predators,
//! scavengers) over shared terrain, vegetation, and carrion layers. Each
//! tick runs the groups in a fixed turn order, resolves upkeep, movement,
//! feeding, hunting, and reproduction per agent, then prunes the dead,
//! commits births, and records population history and vital events in one
//! shared end-of-tick phase.

pub mod combat;
pub mod events;
pub mod geometry;
pub mod movement;
pub mod species;
pub mod stats;

pub use events::{DeathCause, EventSink, NullSink, VitalEvent, VitalLog};
pub use geometry::Cell;
pub use species::{
    BalanceTuning, Biome, DiseaseKind, HazardKind, SpeciesGroup, SpeciesId, SpeciesTemplate,
};
pub use stats::CombatStats;

use crate::movement::{FieldView, MoveRequest};
use foodweb_index::{CellIndex, IndexError, UniformCellGrid};
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

new_key_type! {
    /// Stable handle for agents backed by a generational slot map.
    pub struct AgentId;
}

/// Base chance of death on the first tick past a species' maximum age.
const OLD_AGE_BASE_CHANCE: f32 = 0.05;
/// Additional death chance per tick past the maximum age.
const OLD_AGE_RAMP: f32 = 0.02;
/// Health fraction below which an omnivorous predator grazes instead of
/// hunting.
const VEGETATION_BACKUP_THRESHOLD: f32 = 0.4;
/// Distance falloff when a predator ranks sensed prey.
const PURSUIT_FALLOFF: f32 = 0.2;
/// Squared cell distance within which an attack can be delivered.
const ENGAGE_RANGE_SQ: u32 = 2;
/// Carrion energy that saturates a scavenger's attraction to a pile.
const CARRION_ATTRACTION_SCALE: f32 = 20.0;
/// Random placement attempts per agent before seeding gives up.
const SEED_PLACEMENT_ATTEMPTS: usize = 64;

/// Monotonic simulation tick counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    /// The zero tick before any stepping.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// The next tick value.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Errors that can occur when constructing a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Indicates a spatial index that could not be constructed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Static configuration for a food-web world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub width: u16,
    /// Grid height in cells.
    pub height: u16,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Number of tick summaries retained for population series.
    pub history_capacity: usize,
    /// Number of raw vital events retained for draining; 0 keeps aggregates only.
    pub event_log_capacity: usize,
    /// Chance of a random one-cell move when no candidate beats staying put.
    pub wander_chance: f32,
    /// Fraction of max health drained by one move.
    pub move_cost_fraction: f32,
    /// Damage per tick while outside a species' temperature comfort band.
    pub temperature_stress: f32,
    /// Radius scanned for predators and threat units when scoring moves.
    pub threat_scan_radius: u16,
    /// Health fraction newborns start with.
    pub offspring_health_fraction: f32,
    /// Healing granted per unit of vegetation density consumed.
    pub vegetation_food_value: f32,
    /// Fraction of a dead agent's food value deposited as carrion.
    pub carrion_yield_fraction: f32,
    /// Energy retained by each carrion pile per tick.
    pub carrion_retention: f32,
    /// Pile age in ticks after which it is swept.
    pub carrion_expiry_age: u32,
    /// Piles below this energy are swept.
    pub carrion_min_energy: f32,
    /// Carrion energy a scavenger can take per tick.
    pub scavenger_bite: f32,
    /// Healing per unit of carrion energy eaten.
    pub scavenger_efficiency: f32,
    /// Minimum health fraction before a predator starts a hunt.
    pub hunt_health_gate: f32,
    /// One-time balance multipliers folded into templates at construction.
    pub tuning: BalanceTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 96,
            height: 64,
            rng_seed: None,
            history_capacity: 512,
            event_log_capacity: 1024,
            wander_chance: 0.2,
            move_cost_fraction: 0.02,
            temperature_stress: 2.0,
            threat_scan_radius: 4,
            offspring_health_fraction: 0.5,
            vegetation_food_value: 8.0,
            carrion_yield_fraction: 0.5,
            carrion_retention: 0.8,
            carrion_expiry_age: 5,
            carrion_min_energy: 1.0,
            scavenger_bite: 6.0,
            scavenger_efficiency: 0.5,
            hunt_health_gate: 0.2,
            tuning: BalanceTuning::default(),
        }
    }
}

impl WorldConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.width < 16 || self.height < 16 {
            return Err(WorldError::InvalidConfig(
                "world dimensions must be at least 16 cells",
            ));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "history_capacity must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.wander_chance) {
            return Err(WorldError::InvalidConfig(
                "wander_chance must lie in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.carrion_retention) {
            return Err(WorldError::InvalidConfig(
                "carrion_retention must lie in [0, 1]",
            ));
        }
        if self.offspring_health_fraction <= 0.0 || self.offspring_health_fraction > 1.0 {
            return Err(WorldError::InvalidConfig(
                "offspring_health_fraction must lie in (0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.hunt_health_gate) {
            return Err(WorldError::InvalidConfig(
                "hunt_health_gate must lie in [0, 1)",
            ));
        }
        if self.vegetation_food_value <= 0.0 {
            return Err(WorldError::InvalidConfig(
                "vegetation_food_value must be positive",
            ));
        }
        if self.move_cost_fraction < 0.0
            || self.temperature_stress < 0.0
            || self.carrion_yield_fraction < 0.0
            || self.carrion_min_energy < 0.0
            || self.scavenger_bite < 0.0
            || self.scavenger_efficiency < 0.0
        {
            return Err(WorldError::InvalidConfig(
                "costs, damages, and feeding rates must be non-negative",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, seeding from entropy if no seed is set.
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Read-only terrain layers the simulation consumes but never mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainLayers {
    width: u16,
    height: u16,
    biomes: Vec<Biome>,
    temperature: Vec<f32>,
    moisture: Vec<f32>,
}

impl TerrainLayers {
    /// Construct terrain from row-major layers.
    pub fn new(
        width: u16,
        height: u16,
        biomes: Vec<Biome>,
        temperature: Vec<f32>,
        moisture: Vec<f32>,
    ) -> Result<Self, WorldError> {
        let cells = usize::from(width) * usize::from(height);
        if cells == 0 {
            return Err(WorldError::InvalidConfig(
                "terrain dimensions must be non-zero",
            ));
        }
        if biomes.len() != cells || temperature.len() != cells || moisture.len() != cells {
            return Err(WorldError::InvalidConfig(
                "terrain layers must cover width * height cells",
            ));
        }
        Ok(Self {
            width,
            height,
            biomes,
            temperature,
            moisture,
        })
    }

    /// Uniform terrain, useful for tests and synthetic hosts.
    #[must_use]
    pub fn uniform(width: u16, height: u16, biome: Biome, temperature: f32, moisture: f32) -> Self {
        let cells = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            biomes: vec![biome; cells],
            temperature: vec![temperature; cells],
            moisture: vec![moisture; cells],
        }
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, cell: Cell) -> usize {
        usize::from(cell.y) * usize::from(self.width) + usize::from(cell.x)
    }

    #[must_use]
    pub fn biome(&self, cell: Cell) -> Biome {
        self.biomes[self.index(cell)]
    }

    /// Normalized temperature in `[0, 1]` at `cell`.
    #[must_use]
    pub fn temperature(&self, cell: Cell) -> f32 {
        self.temperature[self.index(cell)]
    }

    /// Normalized moisture in `[0, 1]` at `cell`.
    #[must_use]
    pub fn moisture(&self, cell: Cell) -> f32 {
        self.moisture[self.index(cell)]
    }

    /// Row-major biome layer.
    #[must_use]
    pub fn biomes(&self) -> &[Biome] {
        &self.biomes
    }
}

/// Vegetation density field in `[0, 1]` per cell. Feeding decrements it;
/// regrowth is host-invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VegetationField {
    width: u16,
    height: u16,
    cells: Vec<f32>,
}

impl VegetationField {
    /// Construct a field with every cell at `initial`.
    pub fn new(width: u16, height: u16, initial: f32) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidConfig(
                "vegetation dimensions must be non-zero",
            ));
        }
        Ok(Self {
            width,
            height,
            cells: vec![initial.clamp(0.0, 1.0); usize::from(width) * usize::from(height)],
        })
    }

    /// Initial densities derived from biome fertility and moisture.
    #[must_use]
    pub fn from_terrain(terrain: &TerrainLayers) -> Self {
        let cells = terrain
            .biomes
            .iter()
            .zip(&terrain.moisture)
            .map(|(biome, moisture)| (biome.fertility() * (0.3 + 0.7 * moisture)).clamp(0.0, 1.0))
            .collect();
        Self {
            width: terrain.width,
            height: terrain.height,
            cells,
        }
    }

    fn index(&self, cell: Cell) -> usize {
        usize::from(cell.y) * usize::from(self.width) + usize::from(cell.x)
    }

    /// Density at `cell`.
    #[must_use]
    pub fn density(&self, cell: Cell) -> f32 {
        self.cells[self.index(cell)]
    }

    /// Row-major densities.
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    #[must_use]
    pub fn cells_mut(&mut self) -> &mut [f32] {
        &mut self.cells
    }

    /// Remove up to `amount` density from `cell`, returning the amount taken.
    pub fn consume(&mut self, cell: Cell, amount: f32) -> f32 {
        let idx = self.index(cell);
        let taken = amount.clamp(0.0, self.cells[idx]);
        self.cells[idx] -= taken;
        taken
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: f32) {
        self.cells.fill(value.clamp(0.0, 1.0));
    }

    /// Grow every cell by `rate` scaled by biome fertility and moisture.
    pub fn regrow(&mut self, terrain: &TerrainLayers, rate: f32) {
        for ((cell, biome), moisture) in self
            .cells
            .iter_mut()
            .zip(&terrain.biomes)
            .zip(&terrain.moisture)
        {
            let growth = rate * biome.fertility() * (0.3 + 0.7 * moisture);
            *cell = (*cell + growth).clamp(0.0, 1.0);
        }
    }
}

/// One decaying carcass deposit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrionPile {
    pub energy: f32,
    pub age: u32,
}

/// Sparse carrion layer fed by deaths and drained by scavengers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarrionField {
    piles: BTreeMap<Cell, CarrionPile>,
}

impl CarrionField {
    /// Add `energy` to the pile at `cell`, refreshing its age.
    pub fn deposit(&mut self, cell: Cell, energy: f32) {
        if energy <= 0.0 {
            return;
        }
        let pile = self
            .piles
            .entry(cell)
            .or_insert(CarrionPile { energy: 0.0, age: 0 });
        pile.energy += energy;
        pile.age = 0;
    }

    /// Energy available at `cell`.
    #[must_use]
    pub fn energy_at(&self, cell: Cell) -> f32 {
        self.piles.get(&cell).map_or(0.0, |pile| pile.energy)
    }

    /// Take up to `amount` energy from the pile at `cell`.
    pub fn consume(&mut self, cell: Cell, amount: f32) -> f32 {
        let Some(pile) = self.piles.get_mut(&cell) else {
            return 0.0;
        };
        let taken = amount.clamp(0.0, pile.energy);
        pile.energy -= taken;
        taken
    }

    /// Age every pile, scale its energy by `retention`, and sweep piles past
    /// `expiry_age` or below `min_energy`.
    pub fn decay(&mut self, retention: f32, expiry_age: u32, min_energy: f32) {
        self.piles.retain(|_, pile| {
            pile.age += 1;
            pile.energy *= retention;
            pile.age <= expiry_age && pile.energy >= min_energy
        });
    }

    /// Piles in cell order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &CarrionPile)> {
        self.piles.iter().map(|(cell, pile)| (*cell, pile))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.piles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.piles.is_empty()
    }
}

/// One live individual.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub species: SpeciesId,
    pub cell: Cell,
    pub stats: CombatStats,
    pub age: u32,
    pub repro_cooldown: u16,
    pub hunt_cooldown: u16,
    cause: Option<DeathCause>,
}

impl Agent {
    /// A newborn agent at `cell`.
    #[must_use]
    pub fn new(species: SpeciesId, cell: Cell, stats: CombatStats) -> Self {
        Self {
            species,
            cell,
            stats,
            age: 0,
            repro_cooldown: 0,
            hunt_cooldown: 0,
            cause: None,
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    /// Record why this agent died. The first recorded cause wins; later
    /// calls are ignored so a corpse is never re-attributed.
    pub fn mark_death(&mut self, cause: DeathCause) {
        if self.cause.is_none() {
            self.cause = Some(cause);
        }
    }

    #[must_use]
    pub const fn death_cause(&self) -> Option<DeathCause> {
        self.cause
    }
}

/// Dense agent storage with stable generational handles.
#[derive(Debug)]
pub struct AgentArena {
    slots: SlotMap<AgentId, usize>,
    handles: Vec<AgentId>,
    rows: Vec<Agent>,
}

impl Default for AgentArena {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            handles: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no agents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over handles in dense iteration order.
    pub fn iter_handles(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.handles.iter().copied()
    }

    /// Iterate over `(handle, agent)` pairs in dense iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.handles.iter().copied().zip(self.rows.iter())
    }

    /// Dense agent rows.
    #[must_use]
    pub fn rows(&self) -> &[Agent] {
        &self.rows
    }

    /// Mutable dense agent rows.
    #[must_use]
    pub fn rows_mut(&mut self) -> &mut [Agent] {
        &mut self.rows
    }

    /// Handle of the agent stored at dense `index`.
    #[must_use]
    pub fn handle_at(&self, index: usize) -> AgentId {
        self.handles[index]
    }

    /// Returns the dense index for `id`, if present.
    #[must_use]
    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    /// Returns true if `id` refers to a stored agent.
    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.slots.contains_key(id)
    }

    /// Borrow the agent behind `id`.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.slots.get(id).map(|&index| &self.rows[index])
    }

    /// Mutably borrow the agent behind `id`.
    #[must_use]
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let index = *self.slots.get(id)?;
        Some(&mut self.rows[index])
    }

    /// Insert a new agent and return its handle.
    pub fn insert(&mut self, agent: Agent) -> AgentId {
        let index = self.rows.len();
        self.rows.push(agent);
        let id = self.slots.insert(index);
        self.handles.push(id);
        id
    }

    /// Remove `id`, returning its agent if it was present.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let index = self.slots.remove(id)?;
        let removed = self.rows.swap_remove(index);
        let removed_handle = self.handles.swap_remove(index);
        debug_assert_eq!(removed_handle, id);
        if index < self.handles.len() {
            let moved = self.handles[index];
            if let Some(slot) = self.slots.get_mut(moved) {
                *slot = index;
            }
        }
        Some(removed)
    }

    /// Remove all agents whose ids are in `dead`, preserving iteration order.
    pub fn remove_many(&mut self, dead: &HashSet<AgentId>) -> usize {
        if dead.is_empty() {
            return 0;
        }
        let mut write = 0;
        for read in 0..self.handles.len() {
            let id = self.handles[read];
            if dead.contains(&id) {
                self.slots.remove(id);
                continue;
            }
            if write != read {
                self.handles[write] = id;
                self.rows.swap(read, write);
            }
            if let Some(slot) = self.slots.get_mut(id) {
                *slot = write;
            }
            write += 1;
        }
        let removed = self.handles.len().saturating_sub(write);
        self.handles.truncate(write);
        self.rows.truncate(write);
        removed
    }

    /// Clear all stored agents.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.handles.clear();
        self.rows.clear();
    }
}

/// A hostile unit owned by the host. The world routes attacks into its
/// stats but never removes it; dead units stay until the host sweeps them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatUnit {
    pub name: String,
    pub cell: Cell,
    pub stats: CombatStats,
}

/// One population group: an arena plus its per-turn spatial index and the
/// births queued for the end-of-tick commit.
#[derive(Debug)]
pub struct PopulationGroup {
    group: SpeciesGroup,
    arena: AgentArena,
    index: UniformCellGrid<AgentId>,
    pending: Vec<Agent>,
    scratch: Vec<(u16, u16, AgentId)>,
}

impl PopulationGroup {
    fn new(group: SpeciesGroup, width: u16, height: u16) -> Result<Self, IndexError> {
        Ok(Self {
            group,
            arena: AgentArena::new(),
            index: UniformCellGrid::new(width, height)?,
            pending: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Which group this is.
    #[must_use]
    pub const fn group(&self) -> SpeciesGroup {
        self.group
    }

    /// Number of live agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns true when the group has no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Borrow the agent behind `id`.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.arena.get(id)
    }

    /// Iterate over `(handle, agent)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.arena.iter()
    }

    /// Live agents of `species`.
    #[must_use]
    pub fn count_of(&self, species: SpeciesId) -> u32 {
        self.arena
            .rows()
            .iter()
            .filter(|agent| agent.species == species)
            .count() as u32
    }

    fn rebuild_index(&mut self) {
        self.scratch.clear();
        for (id, agent) in self.arena.iter() {
            if agent.is_alive() {
                self.scratch.push((agent.cell.x, agent.cell.y, id));
            }
        }
        if self.index.rebuild(&self.scratch).is_err() {
            self.scratch.clear();
        }
    }
}

/// Read-only spatial queries one population group exposes to the others.
///
/// Cross-group sensing (prey scans, danger scans, mate and pack counting)
/// goes through this interface rather than another group's internals. Both
/// queries answer from the group's start-of-turn index, so positions may
/// trail moves made later in the same tick.
pub trait PreyIndex {
    /// Handles indexed at `cell`.
    fn agents_at(&self, cell: Cell) -> &[AgentId];

    /// Visit every live indexed agent within `radius` of `center`, with its
    /// indexed distance from the center.
    fn agents_in_radius(
        &self,
        center: Cell,
        radius: f32,
        visitor: &mut dyn FnMut(AgentId, &Agent, f32),
    );
}

impl PreyIndex for PopulationGroup {
    fn agents_at(&self, cell: Cell) -> &[AgentId] {
        self.index.at(cell.x, cell.y)
    }

    fn agents_in_radius(
        &self,
        center: Cell,
        radius: f32,
        visitor: &mut dyn FnMut(AgentId, &Agent, f32),
    ) {
        self.index.for_each_within(
            (center.x, center.y),
            radius,
            &mut |id, dist: OrderedFloat<f32>| {
                if let Some(agent) = self.arena.get(id)
                    && agent.is_alive()
                {
                    visitor(id, agent, dist.into_inner());
                }
            },
        );
    }
}

/// Per-species populations and flow counters for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub populations: [u32; SpeciesId::COUNT],
    pub births: u32,
    pub deaths: u32,
    pub kills: u32,
}

/// Flow counters returned by [`WorldState::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    pub births: u32,
    pub deaths: u32,
    pub kills: u32,
    pub extinctions: u32,
}

/// Immutable references shared by every pass of a group turn.
#[derive(Clone, Copy)]
struct TurnCtx<'a> {
    templates: &'a [SpeciesTemplate; SpeciesId::COUNT],
    terrain: &'a TerrainLayers,
    config: &'a WorldConfig,
}

impl TurnCtx<'_> {
    fn template(&self, species: SpeciesId) -> &SpeciesTemplate {
        &self.templates[species.index()]
    }
}

/// Routes each recorded event into both the bounded log and the per-tick
/// buffer flushed to the sink.
struct EventBus<'a> {
    tick: Tick,
    log: &'a mut VitalLog,
    pending: &'a mut Vec<VitalEvent>,
}

impl EventBus<'_> {
    fn record(&mut self, event: VitalEvent) {
        self.log.record(self.tick, event.clone());
        self.pending.push(event);
    }
}

fn upkeep_pass(grp: &mut PopulationGroup, ctx: TurnCtx<'_>, rng: &mut SmallRng) {
    for agent in grp.arena.rows_mut() {
        if !agent.is_alive() {
            continue;
        }
        agent.age += 1;
        let template = ctx.template(agent.species);
        if agent.age > template.max_age {
            let overdue = agent.age - template.max_age;
            let chance = OLD_AGE_BASE_CHANCE + OLD_AGE_RAMP * overdue as f32;
            if rng.random::<f32>() < chance {
                let remaining = agent.stats.current_health;
                agent.stats.drain(remaining);
                agent.mark_death(DeathCause::OldAge);
                continue;
            }
        }
        let temperature = ctx.terrain.temperature(agent.cell);
        if !template.comfortable(temperature) {
            let mut stress = ctx.config.temperature_stress;
            if template.cold_blooded {
                stress *= 2.0;
            }
            agent.stats.apply_damage(stress);
            if !agent.is_alive() {
                let cause = if temperature < template.min_temperature {
                    DeathCause::Cold
                } else {
                    DeathCause::Heat
                };
                agent.mark_death(cause);
                continue;
            }
        }
        agent.stats.drain(template.metabolism_cost());
        if !agent.is_alive() {
            agent.mark_death(DeathCause::Starvation);
            continue;
        }
        agent.repro_cooldown = agent.repro_cooldown.saturating_sub(1);
        agent.hunt_cooldown = agent.hunt_cooldown.saturating_sub(1);
    }
}

/// Score and apply moves for one group. Scoring fans out over threads; all
/// writes and every rng draw stay in dense arena order.
fn movement_pass<A, T, G>(
    grp: &mut PopulationGroup,
    ctx: TurnCtx<'_>,
    view: FieldView<'_>,
    rng: &mut SmallRng,
    attractors: A,
    menaces: T,
    grazing: G,
) where
    A: Fn(&Agent) -> Vec<(Cell, f32)>,
    T: Fn(&Agent) -> Vec<Cell>,
    G: Fn(&Agent) -> bool,
{
    let scan = f32::from(ctx.config.threat_scan_radius);
    let requests: Vec<Option<MoveRequest<'_>>> = grp
        .arena
        .rows()
        .iter()
        .map(|agent| {
            agent.is_alive().then(|| MoveRequest {
                template: ctx.template(agent.species),
                origin: agent.cell,
                attractors: attractors(agent),
                threats: menaces(agent),
                threat_scan_radius: scan,
                graze: grazing(agent),
            })
        })
        .collect();
    let plans: Vec<Option<Cell>> = requests
        .par_iter()
        .map(|request| {
            request
                .as_ref()
                .and_then(|request| movement::plan_move(&view, request))
        })
        .collect();
    for (idx, plan) in plans.into_iter().enumerate() {
        let agent = &mut grp.arena.rows_mut()[idx];
        if !agent.is_alive() {
            continue;
        }
        let template = ctx.template(agent.species);
        let target = match plan {
            Some(cell) => Some(cell),
            None if rng.random::<f32>() < ctx.config.wander_chance => {
                movement::wander_target(rng, &view, template, agent.cell)
            }
            None => None,
        };
        if let Some(cell) = target {
            agent.cell = cell;
            agent
                .stats
                .drain(template.max_health * ctx.config.move_cost_fraction);
            if !agent.is_alive() {
                agent.mark_death(DeathCause::Starvation);
            }
        }
    }
}

fn graze_pass(grp: &mut PopulationGroup, ctx: TurnCtx<'_>, vegetation: &mut VegetationField) {
    let value = ctx.config.vegetation_food_value * ctx.config.tuning.herbivore_food_efficiency;
    for agent in grp.arena.rows_mut() {
        if !agent.is_alive() {
            continue;
        }
        let density = vegetation.density(agent.cell);
        let consumed = combat::resolve_feeding(&mut agent.stats, density, value);
        if consumed > 0.0 {
            vegetation.consume(agent.cell, consumed);
        }
    }
}

fn scavenge_pass(grp: &mut PopulationGroup, ctx: TurnCtx<'_>, carrion: &mut CarrionField) {
    for agent in grp.arena.rows_mut() {
        if !agent.is_alive() {
            continue;
        }
        let taken = carrion.consume(agent.cell, ctx.config.scavenger_bite);
        if taken > 0.0 {
            agent.stats.heal(taken * ctx.config.scavenger_efficiency);
        }
    }
}

/// Packmates of `species` within `radius` of `cell`, excluding the hunter.
fn pack_count(
    grp: &PopulationGroup,
    exclude: AgentId,
    species: SpeciesId,
    cell: Cell,
    radius: u16,
) -> u32 {
    if radius == 0 {
        return 0;
    }
    let mut members = 0;
    grp.agents_in_radius(cell, f32::from(radius), &mut |id, mate, _| {
        if id != exclude && mate.species == species {
            members += 1;
        }
    });
    members
}

/// Sensed prey for one predator as `(cell, weight)` attractors.
fn sense_prey(
    prey_group: &dyn PreyIndex,
    template: &SpeciesTemplate,
    cell: Cell,
) -> Vec<(Cell, f32)> {
    let predation = &template.predation;
    let mut found = Vec::new();
    prey_group.agents_in_radius(
        cell,
        f32::from(template.detection_range),
        &mut |_, candidate, _| {
            let weight = predation.prey_weight(candidate.species);
            if weight > 0.0 {
                found.push((candidate.cell, weight));
            }
        },
    );
    found
}

/// Cells of live threat units within `radius` of `cell`.
fn threat_cells(units: &[ThreatUnit], cell: Cell, radius: f32, width: u16, height: u16) -> Vec<Cell> {
    units
        .iter()
        .filter(|unit| {
            unit.stats.is_alive()
                && geometry::toroidal_distance(cell, unit.cell, width, height) <= radius
        })
        .map(|unit| unit.cell)
        .collect()
}

///// Danger cells for a non-predator: nearby hunters plus threat units.
fn sense_danger(
    hunters: &dyn PreyIndex,
    units: &[ThreatUnit],
    cell: Cell,
    radius: f32,
    width: u16,
    height: u16,
) -> Vec<Cell> {
    let mut spots = Vec::new();
    hunters.agents_in_radius(cell, radius, &mut |_, hunter, _| {
        spots.push(hunter.cell);
    });
    spots.extend(threat_cells(units, cell, radius, width, height));
    spots
}

/// Carrion piles within `radius` as attractors, saturating at
/// [`CARRION_ATTRACTION_SCALE`] energy.
fn carrion_attractors(
    carrion: &CarrionField,
    cell: Cell,
    radius: f32,
    width: u16,
    height: u16,
) -> Vec<(Cell, f32)> {
    carrion
        .iter()
        .filter(|(at, _)| geometry::toroidal_distance(cell, *at, width, height) <= radius)
        .map(|(at, pile)| (at, (pile.energy / CARRION_ATTRACTION_SCALE).min(1.0)))
        .collect()
}

/// Resolve hunts for every predator against the prey group's start-of-turn
/// index, falling back to threat units when no prey is sensed. Returns the
/// number of kills.
fn hunt_pass(
    predators: &mut PopulationGroup,
    prey_group: &mut PopulationGroup,
    threats: &mut [ThreatUnit],
    vegetation: &mut VegetationField,
    ctx: TurnCtx<'_>,
    rng: &mut SmallRng,
    bus: &mut EventBus<'_>,
) -> u32 {
    let width = ctx.terrain.width();
    let height = ctx.terrain.height();
    let mut kills = 0;
    for idx in 0..predators.arena.len() {
        let (species, cell, cooldown, fraction, self_id) = {
            let agent = &predators.arena.rows()[idx];
            if !agent.is_alive() {
                continue;
            }
            (
                agent.species,
                agent.cell,
                agent.hunt_cooldown,
                agent.stats.health_fraction(),
                predators.arena.handle_at(idx),
            )
        };
        let template = ctx.template(species);
        let predation = &template.predation;

        if predation.vegetation_backup && fraction < VEGETATION_BACKUP_THRESHOLD {
            let density = vegetation.density(cell);
            let value =
                ctx.config.vegetation_food_value * ctx.config.tuning.vegetation_backup_efficiency;
            let agent = &mut predators.arena.rows_mut()[idx];
            let consumed = combat::resolve_feeding(&mut agent.stats, density, value);
            if consumed > 0.0 {
                vegetation.consume(cell, consumed);
            }
            continue;
        }
        if cooldown > 0 || fraction <= ctx.config.hunt_health_gate || predation.prey.is_empty() {
            continue;
        }

        let mut quarry: Option<(AgentId, f32)> = None;
        prey_group.agents_in_radius(
            cell,
            f32::from(template.detection_range),
            &mut |id, candidate, dist| {
                let weight = predation.prey_weight(candidate.species);
                if weight <= 0.0 {
                    return;
                }
                let desire = weight / (1.0 + PURSUIT_FALLOFF * dist);
                if quarry.is_none_or(|(_, best)| desire > best) {
                    quarry = Some((id, desire));
                }
            },
        );

        if let Some((prey_id, _)) = quarry {
            let Some(prey_cell) = prey_group.arena.get(prey_id).map(|prey| prey.cell) else {
                continue;
            };
            if geometry::toroidal_distance_sq(cell, prey_cell, width, height) > ENGAGE_RANGE_SQ {
                continue;
            }
            let pack = pack_count(predators, self_id, species, cell, predation.pack_radius);
            let biome = ctx.terrain.biome(cell);
            let Some(prey_agent) = prey_group.arena.get_mut(prey_id) else {
                continue;
            };
            let prey_species = prey_agent.species;
            let prey_food = ctx.template(prey_species).food_value;
            let predator_agent = &mut predators.arena.rows_mut()[idx];
            let outcome = combat::resolve_hunt(
                rng,
                &mut predator_agent.stats,
                &mut prey_agent.stats,
                predation,
                pack,
                biome,
            );
            if outcome.killed {
                prey_agent.mark_death(DeathCause::Predation);
                predator_agent
                    .stats
                    .heal(prey_food * ctx.config.tuning.predator_hunt_efficiency);
                predator_agent.hunt_cooldown = predation.hunt_cooldown;
                bus.record(VitalEvent::Kill {
                    predator: species,
                    prey: prey_species,
                });
                kills += 1;
            }
            if !predator_agent.is_alive() {
                predator_agent.mark_death(DeathCause::Predation);
            }
        } else {
            let detection = f32::from(template.detection_range);
            let mut nearest: Option<(usize, f32)> = None;
            for (unit_idx, unit) in threats.iter().enumerate() {
                if !unit.stats.is_alive() {
                    continue;
                }
                let dist = geometry::toroidal_distance(cell, unit.cell, width, height);
                if dist <= detection && nearest.is_none_or(|(_, best)| dist < best) {
                    nearest = Some((unit_idx, dist));
                }
            }
            let Some((unit_idx, _)) = nearest else {
                continue;
            };
            if geometry::toroidal_distance_sq(cell, threats[unit_idx].cell, width, height)
                > ENGAGE_RANGE_SQ
            {
                continue;
            }
            let pack = pack_count(predators, self_id, species, cell, predation.pack_radius);
            let biome = ctx.terrain.biome(cell);
            let predator_agent = &mut predators.arena.rows_mut()[idx];
            let unit = &mut threats[unit_idx];
            let outcome = combat::resolve_hunt(
                rng,
                &mut predator_agent.stats,
                &mut unit.stats,
                predation,
                pack,
                biome,
            );
            bus.record(VitalEvent::Attack {
                attacker: species,
                target: unit.name.clone(),
                damage: outcome.damage,
                lethal: outcome.killed,
            });
            if outcome.killed {
                predator_agent.hunt_cooldown = predation.hunt_cooldown;
            }
            if !predator_agent.is_alive() {
                predator_agent.mark_death(DeathCause::Threat);
            }
        }
    }
    kills
}

/// Queue births for agents that pass the health, cooldown, age, and mate
/// checks. Spawns land in the group's pending list and commit at end of tick.
fn reproduce_pass(
    grp: &mut PopulationGroup,
    ctx: TurnCtx<'_>,
    view: FieldView<'_>,
    rng: &mut SmallRng,
    head_room: &mut [u32; SpeciesId::COUNT],
) {
    for idx in 0..grp.arena.len() {
        let (species, cell, health, age, cooldown, self_id) = {
            let agent = &grp.arena.rows()[idx];
            if !agent.is_alive() {
                continue;
            }
            (
                agent.species,
                agent.cell,
                agent.stats.current_health,
                agent.age,
                agent.repro_cooldown,
                grp.arena.handle_at(idx),
            )
        };
        let template = ctx.template(species);
        let profile = &template.reproduction;
        if health < profile.threshold || cooldown > 0 || age < profile.min_age {
            continue;
        }
        if head_room[species.index()] == 0 {
            continue;
        }
        let mut mated = false;
        grp.agents_in_radius(cell, f32::from(profile.mate_radius), &mut |id, mate, _| {
            if !mated && id != self_id && mate.species == species {
                mated = true;
            }
        });
        if !mated
            && (profile.solo_chance <= 0.0 || rng.random::<f32>() >= profile.solo_chance)
        {
            continue;
        }
        for _ in 0..profile.offspring_count {
            if head_room[species.index()] == 0 {
                break;
            }
            if rng.random::<f32>() >= profile.survival_chance {
                continue;
            }
            let Some(site) = movement::wander_target(rng, &view, template, cell) else {
                break;
            };
            let mut stats = template.stats();
            stats.drain(stats.max_health * (1.0 - ctx.config.offspring_health_fraction));
            grp.pending.push(Agent::new(species, site, stats));
            head_room[species.index()] -= 1;
        }
        let agent = &mut grp.arena.rows_mut()[idx];
        agent
            .stats
            .drain(template.max_health * profile.cost_fraction);
        if !agent.is_alive() {
            agent.mark_death(DeathCause::Starvation);
        }
        agent.repro_cooldown = profile.cooldown;
    }
}

/// Remove the dead from one group, emitting exactly one death event each and
/// depositing their remains as carrion.
fn prune_group(
    grp: &mut PopulationGroup,
    ctx: TurnCtx<'_>,
    carrion: &mut CarrionField,
    bus: &mut EventBus<'_>,
) -> u32 {
    let mut dead: HashSet<AgentId> = HashSet::new();
    for (id, agent) in grp.arena.iter() {
        if agent.is_alive() {
            continue;
        }
        dead.insert(id);
        let cause = agent.death_cause().unwrap_or(DeathCause::Unknown);
        let remains = ctx.template(agent.species).food_value * ctx.config.carrion_yield_fraction;
        carrion.deposit(agent.cell, remains);
        bus.record(VitalEvent::Death {
            species: agent.species,
            cause,
        });
    }
    grp.arena.remove_many(&dead) as u32
}

fn commit_group(grp: &mut PopulationGroup, bus: &mut EventBus<'_>) -> u32 {
    let mut births = 0;
    for agent in grp.pending.drain(..) {
        let species = agent.species;
        grp.arena.insert(agent);
        bus.record(VitalEvent::Birth { species });
        births += 1;
    }
    births
}

/// Aggregate world state: terrain and resource layers, the three population
/// groups, host-owned threat units, and the event machinery.
pub struct WorldState {
    config: WorldConfig,
    templates: [SpeciesTemplate; SpeciesId::COUNT],
    tick: Tick,
    rng: SmallRng,
    terrain: TerrainLayers,
    vegetation: VegetationField,
    carrion: CarrionField,
    herbivores: PopulationGroup,
    predators: PopulationGroup,
    scavengers: PopulationGroup,
    threats: Vec<ThreatUnit>,
    log: VitalLog,
    sink: Box<dyn EventSink>,
    pending_events: Vec<VitalEvent>,
    history: VecDeque<TickSummary>,
    ever_alive: [bool; SpeciesId::COUNT],
    extinct: [bool; SpeciesId::COUNT],
    extinctions: Vec<(Tick, SpeciesId)>,
}

impl fmt::Debug for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldState")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("herbivores", &self.herbivores.len())
            .field("predators", &self.predators.len())
            .field("scavengers", &self.scavengers.len())
            .finish()
    }
}

impl WorldState {
    /// Instantiate a world over `terrain` with a null event sink.
    pub fn new(config: WorldConfig, terrain: TerrainLayers) -> Result<Self, WorldError> {
        Self::with_sink(config, terrain, Box::new(NullSink))
    }

    /// Instantiate a world over `terrain`, forwarding vital events to `sink`.
    pub fn with_sink(
        config: WorldConfig,
        terrain: TerrainLayers,
        sink: Box<dyn EventSink>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        if terrain.width() != config.width || terrain.height() != config.height {
            return Err(WorldError::InvalidConfig(
                "terrain dimensions must match the configured grid",
            ));
        }
        let rng = config.seeded_rng();
        let vegetation = VegetationField::from_terrain(&terrain);
        let templates = SpeciesTemplate::resolve_all(&config.tuning);
        Ok(Self {
            herbivores: PopulationGroup::new(SpeciesGroup::Herbivore, config.width, config.height)?,
            predators: PopulationGroup::new(SpeciesGroup::Predator, config.width, config.height)?,
            scavengers: PopulationGroup::new(SpeciesGroup::Scavenger, config.width, config.height)?,
            log: VitalLog::new(config.event_log_capacity),
            history: VecDeque::with_capacity(config.history_capacity),
            templates,
            tick: Tick::zero(),
            rng,
            terrain,
            vegetation,
            carrion: CarrionField::default(),
            threats: Vec::new(),
            sink,
            pending_events: Vec::new(),
            ever_alive: [false; SpeciesId::COUNT],
            extinct: [false; SpeciesId::COUNT],
            extinctions: Vec::new(),
            config,
        })
    }

    /// Execute one tick: group turns in fixed order, then the shared
    /// end-of-tick phase.
    pub fn step(&mut self) -> TickReport {
        let tick = self.tick.next();
        self.log.begin_tick();
        let mut head_room = self.spawn_head_room();

        self.turn_herbivores(&mut head_room);
        let kills = self.turn_predators(tick, &mut head_room);
        self.turn_scavengers(&mut head_room);

        let deaths = self.stage_prune(tick);
        let births = self.stage_spawn_commit(tick);
        self.carrion.decay(
            self.config.carrion_retention,
            self.config.carrion_expiry_age,
            self.config.carrion_min_energy,
        );
        let extinctions = self.stage_history(tick, births, deaths, kills);
        self.flush_events(tick);
        self.tick = tick;

        TickReport {
            tick,
            births,
            deaths,
            kills,
            extinctions,
        }
    }

    fn spawn_head_room(&self) -> [u32; SpeciesId::COUNT] {
        match self.config.tuning.max_per_species {
            Some(cap) => {
                let counts = self.population_counts();
                std::array::from_fn(|idx| cap.saturating_sub(counts[idx]))
            }
            None => [u32::MAX; SpeciesId::COUNT],
        }
    }

    fn turn_herbivores(&mut self, head_room: &mut [u32; SpeciesId::COUNT]) {
        self.herbivores.rebuild_index();
        let ctx = TurnCtx {
            templates: &self.templates,
            terrain: &self.terrain,
            config: &self.config,
        };
        upkeep_pass(&mut self.herbivores, ctx, &mut self.rng);

        let view = FieldView {
            width: self.config.width,
            height: self.config.height,
            biomes: self.terrain.biomes(),
            vegetation: self.vegetation.cells(),
        };
        let hunters = &self.predators;
        let units = &self.threats;
        let scan = f32::from(self.config.threat_scan_radius);
        let (width, height) = (self.config.width, self.config.height);
        movement_pass(
            &mut self.herbivores,
            ctx,
            view,
            &mut self.rng,
            |_agent| Vec::new(),
            |agent| sense_danger(hunters, units, agent.cell, scan, width, height),
            |_agent| false,
        );
        graze_pass(&mut self.herbivores, ctx, &mut self.vegetation);

        let view = FieldView {
            width: self.config.width,
            height: self.config.height,
            biomes: self.terrain.biomes(),
            vegetation: self.vegetation.cells(),
        };
        reproduce_pass(&mut self.herbivores, ctx, view, &mut self.rng, head_room);
    }

    fn turn_predators(&mut self, tick: Tick, head_room: &mut [u32; SpeciesId::COUNT]) -> u32 {
        self.predators.rebuild_index();
        let ctx = TurnCtx {
            templates: &self.templates,
            terrain: &self.terrain,
            config: &self.config,
        };
        upkeep_pass(&mut self.predators, ctx, &mut self.rng);

        let view = FieldView {
            width: self.config.width,
            height: self.config.height,
            biomes: self.terrain.biomes(),
            vegetation: self.vegetation.cells(),
        };
        let prey_group = &self.herbivores;
        let units = &self.threats;
        let templates = &self.templates;
        let gate = self.config.hunt_health_gate;
        let scan = f32::from(self.config.threat_scan_radius);
        let (width, height) = (self.config.width, self.config.height);
        movement_pass(
            &mut self.predators,
            ctx,
            view,
            &mut self.rng,
            |agent| {
                if agent.hunt_cooldown > 0 || agent.stats.health_fraction() <= gate {
                    return Vec::new();
                }
                sense_prey(prey_group, &templates[agent.species.index()], agent.cell)
            },
            |agent| {
                // Hunters fit to fight engage threat units instead of
                // running from them.
                if agent.hunt_cooldown == 0 && agent.stats.health_fraction() > gate {
                    Vec::new()
                } else {
                    threat_cells(units, agent.cell, scan, width, height)
                }
            },
            |agent| {
                templates[agent.species.index()].predation.vegetation_backup
                    && agent.stats.health_fraction() < VEGETATION_BACKUP_THRESHOLD
            },
        );

        let mut bus = EventBus {
            tick,
            log: &mut self.log,
            pending: &mut self.pending_events,
        };
        let kills = hunt_pass(
            &mut self.predators,
            &mut self.herbivores,
            &mut self.threats,
            &mut self.vegetation,
            ctx,
            &mut self.rng,
            &mut bus,
        );

        let view = FieldView {
            width: self.config.width,
            height: self.config.height,
            biomes: self.terrain.biomes(),
            vegetation: self.vegetation.cells(),
        };
        reproduce_pass(&mut self.predators, ctx, view, &mut self.rng, head_room);
        kills
    }

    fn turn_scavengers(&mut self, head_room: &mut [u32; SpeciesId::COUNT]) {
        self.scavengers.rebuild_index();
        let ctx = TurnCtx {
            templates: &self.templates,
            terrain: &self.terrain,
            config: &self.config,
        };
        upkeep_pass(&mut self.scavengers, ctx, &mut self.rng);

        let view = FieldView {
            width: self.config.width,
            height: self.config.height,
            biomes: self.terrain.biomes(),
            vegetation: self.vegetation.cells(),
        };
        let carrion = &self.carrion;
        let hunters = &self.predators;
        let units = &self.threats;
        let templates = &self.templates;
        let scan = f32::from(self.config.threat_scan_radius);
        let (width, height) = (self.config.width, self.config.height);
        movement_pass(
            &mut self.scavengers,
            ctx,
            view,
            &mut self.rng,
            |agent| {
                let reach = f32::from(templates[agent.species.index()].detection_range);
                carrion_attractors(carrion, agent.cell, reach, width, height)
            },
            |agent| sense_danger(hunters, units, agent.cell, scan, width, height),
            |_agent| false,
        );
        scavenge_pass(&mut self.scavengers, ctx, &mut self.carrion);

        let view = FieldView {
            width: self.config.width,
            height: self.config.height,
            biomes: self.terrain.biomes(),
            vegetation: self.vegetation.cells(),
        };
        reproduce_pass(&mut self.scavengers, ctx, view, &mut self.rng, head_room);
    }

    fn stage_prune(&mut self, tick: Tick) -> u32 {
        let ctx = TurnCtx {
            templates: &self.templates,
            terrain: &self.terrain,
            config: &self.config,
        };
        let mut bus = EventBus {
            tick,
            log: &mut self.log,
            pending: &mut self.pending_events,
        };
        let mut removed = 0;
        for grp in [
            &mut self.herbivores,
            &mut self.predators,
            &mut self.scavengers,
        ] {
            removed += prune_group(grp, ctx, &mut self.carrion, &mut bus);
        }
        removed
    }

    fn stage_spawn_commit(&mut self, tick: Tick) -> u32 {
        let mut bus = EventBus {
            tick,
            log: &mut self.log,
            pending: &mut self.pending_events,
        };
        let mut births = 0;
        for grp in [
            &mut self.herbivores,
            &mut self.predators,
            &mut self.scavengers,
        ] {
            births += commit_group(grp, &mut bus);
        }
        births
    }

    fn stage_history(&mut self, tick: Tick, births: u32, deaths: u32, kills: u32) -> u32 {
        let populations = self.population_counts();
        let mut new_extinctions = 0;
        for species in SpeciesId::ALL {
            let idx = species.index();
            if populations[idx] > 0 {
                self.ever_alive[idx] = true;
            } else if self.ever_alive[idx] && !self.extinct[idx] {
                self.extinct[idx] = true;
                self.extinctions.push((tick, species));
                new_extinctions += 1;
            }
        }
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TickSummary {
            tick,
            populations,
            births,
            deaths,
            kills,
        });
        new_extinctions
    }

    fn flush_events(&mut self, tick: Tick) {
        let mut pending = std::mem::take(&mut self.pending_events);
        for event in pending.drain(..) {
            self.sink.on_event(tick, &event);
        }
        self.pending_events = pending;
    }

    /// Apply one burst of hazard damage to every agent within `radius` of
    /// `center`. Returns the number of agents affected.
    pub fn apply_hazard(
        &mut self,
        center: Cell,
        radius: f32,
        kind: HazardKind,
        intensity: f32,
    ) -> u32 {
        let profile = kind.profile();
        let (width, height) = (self.config.width, self.config.height);
        let mut affected = 0;
        for grp in [
            &mut self.herbivores,
            &mut self.predators,
            &mut self.scavengers,
        ] {
            for agent in grp.arena.rows_mut() {
                if !agent.is_alive()
                    || geometry::toroidal_distance(agent.cell, center, width, height) > radius
                {
                    continue;
                }
                combat::resolve_environmental_damage(
                    &mut agent.stats,
                    profile.base_damage,
                    intensity,
                    profile.defense_penetration,
                );
                if !agent.is_alive() {
                    agent.mark_death(DeathCause::Hazard(kind));
                }
                affected += 1;
            }
        }
        affected
    }

    /// Apply one tick of disease damage to every agent within `radius` of
    /// `center`. The host owns spread and duration scheduling. Returns the
    /// number of agents affected.
    pub fn apply_disease(&mut self, center: Cell, radius: f32, kind: DiseaseKind) -> u32 {
        let profile = kind.profile();
        let (width, height) = (self.config.width, self.config.height);
        let mut affected = 0;
        for grp in [
            &mut self.herbivores,
            &mut self.predators,
            &mut self.scavengers,
        ] {
            for agent in grp.arena.rows_mut() {
                if !agent.is_alive()
                    || geometry::toroidal_distance(agent.cell, center, width, height) > radius
                {
                    continue;
                }
                combat::resolve_disease_tick(&mut agent.stats, profile.damage_per_tick);
                if !agent.is_alive() {
                    agent.mark_death(DeathCause::Disease(kind));
                }
                affected += 1;
            }
        }
        affected
    }

    /// Place `count` fresh agents of `species` on random passable cells.
    /// Returns how many were placed; crowded or impassable worlds may place
    /// fewer.
    pub fn seed_population(&mut self, species: SpeciesId, count: u32) -> u32 {
        let template = &self.templates[species.index()];
        let group = match template.group {
            SpeciesGroup::Herbivore => &mut self.herbivores,
            SpeciesGroup::Predator => &mut self.predators,
            SpeciesGroup::Scavenger => &mut self.scavengers,
        };
        let mut placed = 0;
        for _ in 0..count {
            for _ in 0..SEED_PLACEMENT_ATTEMPTS {
                let cell = Cell::new(
                    self.rng.random_range(0..self.config.width),
                    self.rng.random_range(0..self.config.height),
                );
                if template.passable(self.terrain.biome(cell)) {
                    group.arena.insert(Agent::new(species, cell, template.stats()));
                    placed += 1;
                    break;
                }
            }
        }
        if placed > 0 {
            self.ever_alive[species.index()] = true;
        }
        placed
    }

    /// Insert one agent of `species` at `cell`, for host-driven migration.
    /// Returns `None` when the cell is impassable for the species.
    pub fn spawn_agent(&mut self, species: SpeciesId, cell: Cell) -> Option<AgentId> {
        let cell = Cell::new(cell.x % self.config.width, cell.y % self.config.height);
        let template = &self.templates[species.index()];
        if !template.passable(self.terrain.biome(cell)) {
            return None;
        }
        let agent = Agent::new(species, cell, template.stats());
        let group = match template.group {
            SpeciesGroup::Herbivore => &mut self.herbivores,
            SpeciesGroup::Predator => &mut self.predators,
            SpeciesGroup::Scavenger => &mut self.scavengers,
        };
        self.ever_alive[species.index()] = true;
        Some(group.arena.insert(agent))
    }

    /// Replace the host-owned threat units.
    pub fn set_threats(&mut self, units: Vec<ThreatUnit>) {
        self.threats = units;
    }

    /// Host-owned threat units.
    #[must_use]
    pub fn threats(&self) -> &[ThreatUnit] {
        &self.threats
    }

    /// Mutable access to the threat units, for host-side movement and sweeps.
    #[must_use]
    pub fn threats_mut(&mut self) -> &mut Vec<ThreatUnit> {
        &mut self.threats
    }

    /// Replace the event sink.
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Resolved template for `species`, with balance tuning applied.
    #[must_use]
    pub fn template(&self, species: SpeciesId) -> &SpeciesTemplate {
        &self.templates[species.index()]
    }

    /// The group for `group` membership.
    #[must_use]
    pub fn group(&self, group: SpeciesGroup) -> &PopulationGroup {
        match group {
            SpeciesGroup::Herbivore => &self.herbivores,
            SpeciesGroup::Predator => &self.predators,
            SpeciesGroup::Scavenger => &self.scavengers,
        }
    }

    /// Live agents per species.
    #[must_use]
    pub fn population_counts(&self) -> [u32; SpeciesId::COUNT] {
        let mut counts = [0; SpeciesId::COUNT];
        for grp in [&self.herbivores, &self.predators, &self.scavengers] {
            for agent in grp.arena.rows() {
                counts[agent.species.index()] += 1;
            }
        }
        counts
    }

    /// Total live agents across all groups.
    #[must_use]
    pub fn total_population(&self) -> usize {
        self.herbivores.len() + self.predators.len() + self.scavengers.len()
    }

    /// Retained tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Population of `species` per retained tick, oldest first.
    #[must_use]
    pub fn population_series(&self, species: SpeciesId) -> Vec<(Tick, u32)> {
        let idx = species.index();
        self.history
            .iter()
            .map(|summary| (summary.tick, summary.populations[idx]))
            .collect()
    }

    /// The vital-event log and its aggregates.
    #[must_use]
    pub fn log(&self) -> &VitalLog {
        &self.log
    }

    /// Drain buffered raw events, oldest first.
    pub fn drain_events(&mut self) -> Vec<(Tick, VitalEvent)> {
        self.log.drain()
    }

    /// Species extinctions in the order they were detected, each recorded
    /// once.
    #[must_use]
    pub fn extinctions(&self) -> &[(Tick, SpeciesId)] {
        &self.extinctions
    }

    /// Read-only terrain layers.
    #[must_use]
    pub fn terrain(&self) -> &TerrainLayers {
        &self.terrain
    }

    /// The vegetation field.
    #[must_use]
    pub fn vegetation(&self) -> &VegetationField {
        &self.vegetation
    }

    /// Mutable vegetation access.
    #[must_use]
    pub fn vegetation_mut(&mut self) -> &mut VegetationField {
        &mut self.vegetation
    }

    /// Host-invoked vegetation regrowth over the world's own terrain.
    pub fn regrow_vegetation(&mut self, rate: f32) {
        self.vegetation.regrow(&self.terrain, rate);
    }

    /// The carrion layer.
    #[must_use]
    pub fn carrion(&self) -> &CarrionField {
        &self.carrion
    }

    /// Borrow the world RNG mutably for deterministic host-side sampling.
    #[must_use]
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SpySink(Arc<Mutex<Vec<(Tick, VitalEvent)>>>);

    impl EventSink for SpySink {
        fn on_event(&mut self, tick: Tick, event: &VitalEvent) {
            self.0.lock().expect("spy lock").push((tick, event.clone()));
        }
    }

    fn quiet_config(width: u16, height: u16, seed: u64) -> WorldConfig {
        WorldConfig {
            width,
            height,
            rng_seed: Some(seed),
            wander_chance: 0.0,
            move_cost_fraction: 0.0,
            ..WorldConfig::default()
        }
    }

    fn grass_terrain(width: u16, height: u16) -> TerrainLayers {
        TerrainLayers::uniform(width, height, Biome::Grassland, 0.5, 0.6)
    }

    fn grass_world(width: u16, height: u16, seed: u64) -> WorldState {
        WorldState::new(quiet_config(width, height, seed), grass_terrain(width, height))
            .expect("world must build")
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let tiny = WorldConfig {
            width: 8,
            ..WorldConfig::default()
        };
        assert!(matches!(
            tiny.validate(),
            Err(WorldError::InvalidConfig(_))
        ));
        let no_history = WorldConfig {
            history_capacity: 0,
            ..WorldConfig::default()
        };
        assert!(no_history.validate().is_err());
        let bad_wander = WorldConfig {
            wander_chance: 1.5,
            ..WorldConfig::default()
        };
        assert!(bad_wander.validate().is_err());
        let mismatched = WorldState::new(
            WorldConfig::default(),
            TerrainLayers::uniform(16, 16, Biome::Grassland, 0.5, 0.5),
        );
        assert!(mismatched.is_err(), "terrain dims must match config dims");
    }

    #[test]
    fn seeded_worlds_evolve_identically() {
        let build = || {
            let mut config = quiet_config(32, 32, 42);
            config.wander_chance = 0.2;
            config.move_cost_fraction = 0.02;
            let mut world =
                WorldState::new(config, grass_terrain(32, 32)).expect("world must build");
            world.seed_population(SpeciesId::Deer, 12);
            world.seed_population(SpeciesId::Wolf, 3);
            world.seed_population(SpeciesId::Vulture, 2);
            world
        };
        let mut left = build();
        let mut right = build();
        for _ in 0..25 {
            let a = left.step();
            let b = right.step();
            assert_eq!(a, b, "tick reports must match under a shared seed");
            assert_eq!(left.population_counts(), right.population_counts());
        }
        let lhs: Vec<_> = left.history().cloned().collect();
        let rhs: Vec<_> = right.history().cloned().collect();
        assert_eq!(lhs, rhs, "histories must match under a shared seed");
    }

    #[test]
    fn group_queries_answer_from_turn_start_index() {
        let mut world = grass_world(16, 16, 11);
        world.vegetation.fill(0.0);
        let near = world
            .spawn_agent(SpeciesId::Deer, Cell::new(4, 4))
            .expect("spawn");
        world
            .spawn_agent(SpeciesId::Deer, Cell::new(12, 4))
            .expect("spawn");
        assert!(
            world.group(SpeciesGroup::Herbivore).agents_at(Cell::new(4, 4)).is_empty(),
            "queries are empty until the group takes its first turn"
        );
        world.step();
        let herd = world.group(SpeciesGroup::Herbivore);
        assert_eq!(herd.agents_at(Cell::new(4, 4)), [near]);
        let mut seen = Vec::new();
        herd.agents_in_radius(Cell::new(4, 4), 3.0, &mut |id, agent, dist| {
            seen.push((id, agent.species, dist));
        });
        assert_eq!(seen, [(near, SpeciesId::Deer, 0.0)], "far deer is out of reach");
        let mut everyone = 0;
        herd.agents_in_radius(Cell::new(4, 4), 16.0, &mut |_, _, _| everyone += 1);
        assert_eq!(everyone, 2, "a torus-spanning radius visits each deer once");
    }

    #[test]
    fn lone_agent_starves_in_ceil_health_over_cost_ticks() {
        let mut world = grass_world(16, 16, 9);
        world.vegetation.fill(0.0);
        world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("deer spawns on grass");
        let template = world.template(SpeciesId::Deer);
        let cost = template.metabolism_cost();
        let expected = (template.max_health / cost).ceil() as u64;
        assert!(
            expected < u64::from(template.max_age),
            "test needs starvation to beat old age"
        );
        let mut died_at = None;
        for _ in 0..expected + 5 {
            let report = world.step();
            if world.population_counts()[SpeciesId::Deer.index()] == 0 {
                died_at = Some(report.tick.0);
                break;
            }
        }
        assert_eq!(died_at, Some(expected), "starvation tick must be exact");
        assert_eq!(world.log().deaths(SpeciesId::Deer, DeathCause::Starvation), 1);
        assert_eq!(
            world.log().births(SpeciesId::Deer),
            0,
            "a hungry loner below threshold must not breed"
        );
    }

    #[test]
    fn reproduction_is_gated_by_health_threshold() {
        let mut world = grass_world(16, 16, 5);
        world.vegetation.fill(0.0);
        let a = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        let b = world
            .spawn_agent(SpeciesId::Deer, Cell::new(9, 8))
            .expect("spawn");
        for id in [a, b] {
            let agent = world.herbivores.arena.get_mut(id).expect("live deer");
            agent.age = 10;
            agent.stats.current_health = 19.0;
        }
        world.step();
        assert_eq!(
            world.log().births(SpeciesId::Deer),
            0,
            "below-threshold parents must not breed"
        );
        assert_eq!(world.population_counts()[SpeciesId::Deer.index()], 2);
    }

    #[test]
    fn healthy_adjacent_pair_breeds() {
        let mut world = grass_world(16, 16, 5);
        world.vegetation.fill(0.0);
        world.templates[SpeciesId::Deer.index()]
            .reproduction
            .survival_chance = 1.0;
        let a = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        let b = world
            .spawn_agent(SpeciesId::Deer, Cell::new(9, 8))
            .expect("spawn");
        for id in [a, b] {
            world.herbivores.arena.get_mut(id).expect("live deer").age = 10;
        }
        let report = world.step();
        let per_parent = u32::from(world.template(SpeciesId::Deer).reproduction.offspring_count);
        assert_eq!(
            report.births,
            per_parent * 2,
            "both parents breed a full litter at guaranteed survival"
        );
        assert_eq!(
            world.population_counts()[SpeciesId::Deer.index()],
            2 + per_parent * 2
        );
        for (_, agent) in world.herbivores.iter() {
            assert!(
                agent.stats.current_health <= agent.stats.max_health,
                "health must never exceed max"
            );
        }
    }

    #[test]
    fn predator_kill_heals_rests_and_feeds_the_carrion_layer() {
        let mut world = grass_world(16, 16, 7);
        world.vegetation.fill(0.0);
        let deer_id = world
            .spawn_agent(SpeciesId::Deer, Cell::new(5, 5))
            .expect("spawn deer");
        let wolf_id = world
            .spawn_agent(SpeciesId::Wolf, Cell::new(6, 5))
            .expect("spawn wolf");
        {
            let deer = world.herbivores.arena.get_mut(deer_id).expect("deer");
            deer.stats.current_health = 5.0;
        }
        {
            let wolf = world.predators.arena.get_mut(wolf_id).expect("wolf");
            wolf.stats.current_health = 20.0;
            wolf.stats.accuracy = 1000;
        }
        let report = world.step();
        assert_eq!(report.kills, 1);
        assert_eq!(report.deaths, 1);
        assert_eq!(world.population_counts()[SpeciesId::Deer.index()], 0);
        assert_eq!(world.log().kills(SpeciesId::Wolf, SpeciesId::Deer), 1);
        assert_eq!(world.log().deaths(SpeciesId::Deer, DeathCause::Predation), 1);

        let wolf_template = world.template(SpeciesId::Wolf);
        let deer_template = world.template(SpeciesId::Deer);
        let expected_health = 20.0 - wolf_template.metabolism_cost()
            + deer_template.food_value * world.config().tuning.predator_hunt_efficiency;
        let wolf = world.predators.get(wolf_id).expect("wolf survives");
        assert!(
            (wolf.stats.current_health - expected_health).abs() < 1e-3,
            "kill healing off: {} vs {expected_health}",
            wolf.stats.current_health
        );
        assert_eq!(wolf.hunt_cooldown, wolf_template.predation.hunt_cooldown);

        let expected_remains = deer_template.food_value
            * world.config().carrion_yield_fraction
            * world.config().carrion_retention;
        let remains = world.carrion().energy_at(Cell::new(5, 5));
        assert!(
            (remains - expected_remains).abs() < 1e-3,
            "carrion deposit off: {remains} vs {expected_remains}"
        );
        assert_eq!(
            world.extinctions(),
            &[(Tick(1), SpeciesId::Deer)],
            "losing the only deer is an extinction"
        );
    }

    #[test]
    fn predators_engage_threat_units_without_removing_them() {
        let mut world = grass_world(16, 16, 3);
        world.vegetation.fill(0.0);
        let wolf_id = world
            .spawn_agent(SpeciesId::Wolf, Cell::new(6, 5))
            .expect("spawn wolf");
        {
            let wolf = world.predators.arena.get_mut(wolf_id).expect("wolf");
            wolf.stats.current_health = 30.0;
            wolf.stats.accuracy = 1000;
        }
        let mut raider_stats = CombatStats::new(50.0, 12.0, 5.0, 5, 0, 90);
        raider_stats.current_health = 2.0;
        world.set_threats(vec![ThreatUnit {
            name: "raider band".to_owned(),
            cell: Cell::new(5, 5),
            stats: raider_stats,
        }]);
        world.step();
        let events = world.drain_events();
        let strike = events
            .iter()
            .find_map(|(_, event)| match event {
                VitalEvent::Attack {
                    attacker,
                    target,
                    lethal,
                    ..
                } => Some((*attacker, target.clone(), *lethal)),
                _ => None,
            })
            .expect("an attack event must be recorded");
        assert_eq!(strike.0, SpeciesId::Wolf);
        assert_eq!(strike.1, "raider band");
        assert!(strike.2, "the finishing blow is lethal");
        assert_eq!(world.threats().len(), 1, "units are never removed");
        assert!(
            !world.threats()[0].stats.is_alive(),
            "the unit was fought to zero health"
        );
    }

    #[test]
    fn hazard_bursts_damage_and_attribute_deaths() {
        let mut world = grass_world(16, 16, 11);
        world.vegetation.fill(0.0);
        let cluster = [Cell::new(4, 4), Cell::new(4, 5), Cell::new(5, 4)];
        for cell in cluster {
            let id = world.spawn_agent(SpeciesId::Deer, cell).expect("spawn");
            world
                .herbivores
                .arena
                .get_mut(id)
                .expect("deer")
                .stats
                .current_health = 10.0;
        }
        world
            .spawn_agent(SpeciesId::Deer, Cell::new(12, 12))
            .expect("spawn far deer");
        let affected = world.apply_hazard(Cell::new(4, 4), 2.0, HazardKind::Wildfire, 1.0);
        assert_eq!(affected, 3, "only the cluster is inside the radius");
        world.step();
        assert_eq!(
            world
                .log()
                .deaths(SpeciesId::Deer, DeathCause::Hazard(HazardKind::Wildfire)),
            3
        );
        assert_eq!(
            world.population_counts()[SpeciesId::Deer.index()],
            1,
            "the far deer is untouched"
        );
    }

    #[test]
    fn disease_ticks_respect_defense_floor() {
        let mut world = grass_world(16, 16, 13);
        let id = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        let affected = world.apply_disease(Cell::new(8, 8), 3.0, DiseaseKind::Plague);
        assert_eq!(affected, 1);
        let deer = world.herbivores.get(id).expect("deer");
        let expected = deer.stats.max_health
            - (DiseaseKind::Plague.profile().damage_per_tick - deer.stats.defense).max(1.0);
        assert!((deer.stats.current_health - expected).abs() < 1e-3);
    }

    #[test]
    fn ages_climb_one_per_tick() {
        let mut world = grass_world(16, 16, 17);
        world.vegetation.fill(1.0);
        let id = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        for expected in 1..=10_u32 {
            world.step();
            let age = world.herbivores.get(id).expect("deer lives").age;
            assert_eq!(age, expected, "age must advance exactly once per tick");
        }
    }

    #[test]
    fn carrion_piles_decay_and_expire() {
        let mut world = grass_world(16, 16, 19);
        world.carrion.deposit(Cell::new(3, 3), 10.0);
        world.step();
        let after_one = world.carrion().energy_at(Cell::new(3, 3));
        assert!(
            (after_one - 10.0 * world.config().carrion_retention).abs() < 1e-3,
            "one decay step applied"
        );
        for _ in 0..world.config().carrion_expiry_age {
            world.step();
        }
        assert!(
            world.carrion().is_empty(),
            "piles past the expiry age are swept"
        );
    }

    #[test]
    fn history_is_bounded_by_capacity() {
        let mut config = quiet_config(16, 16, 23);
        config.history_capacity = 4;
        let mut world =
            WorldState::new(config, grass_terrain(16, 16)).expect("world must build");
        for _ in 0..10 {
            world.step();
        }
        let ticks: Vec<u64> = world.history().map(|summary| summary.tick.0).collect();
        assert_eq!(ticks, vec![7, 8, 9, 10], "only the newest summaries remain");
        assert_eq!(world.population_series(SpeciesId::Deer).len(), 4);
    }

    #[test]
    fn extinction_is_recorded_exactly_once() {
        let mut world = grass_world(16, 16, 29);
        world.vegetation.fill(0.0);
        let id = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        world
            .herbivores
            .arena
            .get_mut(id)
            .expect("deer")
            .stats
            .current_health = 1.0;
        let report = world.step();
        assert_eq!(report.extinctions, 1);
        for _ in 0..5 {
            let report = world.step();
            assert_eq!(report.extinctions, 0, "no repeat extinction records");
        }
        assert_eq!(world.extinctions(), &[(Tick(1), SpeciesId::Deer)]);
    }

    #[test]
    fn sink_hears_the_events_the_log_records() {
        let spy = SpySink::default();
        let mut world = WorldState::with_sink(
            quiet_config(16, 16, 31),
            grass_terrain(16, 16),
            Box::new(spy.clone()),
        )
        .expect("world must build");
        world.vegetation.fill(0.0);
        let id = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        world
            .herbivores
            .arena
            .get_mut(id)
            .expect("deer")
            .stats
            .current_health = 1.0;
        world.step();
        let heard = spy.0.lock().expect("spy lock");
        assert_eq!(heard.len(), 1, "exactly one death event this tick");
        assert_eq!(
            heard[0],
            (
                Tick(1),
                VitalEvent::Death {
                    species: SpeciesId::Deer,
                    cause: DeathCause::Starvation,
                }
            )
        );
    }

    #[test]
    fn seeding_respects_passability() {
        let config = quiet_config(16, 16, 37);
        let ocean = TerrainLayers::uniform(16, 16, Biome::DeepOcean, 0.5, 0.9);
        let mut world = WorldState::new(config, ocean).expect("world must build");
        assert_eq!(
            world.seed_population(SpeciesId::Deer, 8),
            0,
            "walkers cannot be seeded onto open water"
        );
        assert_eq!(world.seed_population(SpeciesId::Fish, 8), 8);
        for (_, agent) in world.herbivores.iter() {
            assert!(world.terrain().biome(agent.cell).is_water());
        }
    }

    #[test]
    fn per_species_cap_limits_births() {
        let mut config = quiet_config(16, 16, 41);
        config.tuning.max_per_species = Some(3);
        let mut world =
            WorldState::new(config, grass_terrain(16, 16)).expect("world must build");
        world.vegetation.fill(1.0);
        world.templates[SpeciesId::Deer.index()]
            .reproduction
            .survival_chance = 1.0;
        let a = world
            .spawn_agent(SpeciesId::Deer, Cell::new(8, 8))
            .expect("spawn");
        let b = world
            .spawn_agent(SpeciesId::Deer, Cell::new(9, 8))
            .expect("spawn");
        for id in [a, b] {
            world.herbivores.arena.get_mut(id).expect("deer").age = 10;
        }
        let report = world.step();
        assert_eq!(report.births, 1, "cap leaves room for a single birth");
        assert_eq!(world.population_counts()[SpeciesId::Deer.index()], 3);
    }
}
