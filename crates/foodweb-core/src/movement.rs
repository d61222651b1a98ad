//! Movement and foraging AI.
//!
//! Each agent scores the wrapped cells within its movement range and moves
//! only when the best candidate strictly beats staying put; otherwise it may
//! wander one cell. Scoring reads immutable views and draws no randomness,
//! so a group's decisions can fan out across threads while every write and
//! every rng draw stays serial.

use crate::geometry::{self, Cell};
use crate::species::{Biome, SpeciesGroup, SpeciesTemplate};
use rand::Rng;

/// Score subtracted when a candidate sits directly on the nearest sensed
/// threat, tapering linearly to zero at the scan radius.
pub const THREAT_PRESSURE: f32 = 2.0;

/// Distance falloff for prey and carrion attraction.
const ATTRACTION_FALLOFF: f32 = 0.2;

/// Read-only world layers shared by every scorer in a group turn.
#[derive(Clone, Copy)]
pub struct FieldView<'a> {
    pub width: u16,
    pub height: u16,
    pub biomes: &'a [Biome],
    pub vegetation: &'a [f32],
}

impl FieldView<'_> {
    fn cell_index(&self, cell: Cell) -> usize {
        usize::from(cell.y) * usize::from(self.width) + usize::from(cell.x)
    }

    #[must_use]
    pub fn biome(&self, cell: Cell) -> Biome {
        self.biomes[self.cell_index(cell)]
    }

    #[must_use]
    pub fn vegetation(&self, cell: Cell) -> f32 {
        self.vegetation[self.cell_index(cell)]
    }
}

/// Per-agent inputs assembled serially before scoring.
pub struct MoveRequest<'a> {
    pub template: &'a SpeciesTemplate,
    pub origin: Cell,
    /// Sensed food sources as (cell, weight): prey for predators, carrion
    /// piles for scavengers. Empty for grazers.
    pub attractors: Vec<(Cell, f32)>,
    /// Sensed danger; candidates closer to the nearest entry are penalized.
    pub threats: Vec<Cell>,
    pub threat_scan_radius: f32,
    /// Sample vegetation for habitat quality even for a non-herbivore;
    /// set when a weakened omnivore falls back to grazing.
    pub graze: bool,
}

fn resource_density(view: &FieldView<'_>, request: &MoveRequest<'_>, cell: Cell) -> f32 {
    if request.graze || matches!(request.template.group, SpeciesGroup::Herbivore) {
        view.vegetation(cell).clamp(0.0, 1.0)
    } else {
        request
            .attractors
            .iter()
            .filter(|(at, _)| *at == cell)
            .map(|(_, weight)| *weight)
            .sum::<f32>()
            .clamp(0.0, 1.0)
    }
}

/// Desirability of standing on `cell`: habitat quality plus distance-decayed
/// attraction toward sensed food, minus pressure from the nearest threat.
#[must_use]
pub fn score_candidate(view: &FieldView<'_>, request: &MoveRequest<'_>, cell: Cell) -> f32 {
    let biome = view.biome(cell);
    let habitat = request.template.preference(biome)
        * (0.5 + 0.5 * resource_density(view, request, cell));

    let attraction: f32 = request
        .attractors
        .iter()
        .map(|&(at, weight)| {
            let dist = geometry::toroidal_distance(cell, at, view.width, view.height);
            weight / (1.0 + ATTRACTION_FALLOFF * dist)
        })
        .sum();

    let mut menace = 0.0_f32;
    if request.threat_scan_radius > 0.0 {
        let nearest = request
            .threats
            .iter()
            .map(|&threat| geometry::toroidal_distance(cell, threat, view.width, view.height))
            .fold(f32::INFINITY, f32::min);
        if nearest < request.threat_scan_radius {
            menace = THREAT_PRESSURE * (1.0 - nearest / request.threat_scan_radius);
        }
    }

    habitat + attraction - menace
}

/// Pick the destination for one agent, or `None` to stay put.
///
/// Candidates are the wrapped cells within Euclidean movement range that the
/// species can occupy. The move happens only on strict improvement over the
/// origin's score; ties keep the first best in row-major scan order, so the
/// result is independent of thread scheduling.
#[must_use]
pub fn plan_move(view: &FieldView<'_>, request: &MoveRequest<'_>) -> Option<Cell> {
    let stay = score_candidate(view, request, request.origin);
    let range = i32::from(request.template.movement_range);
    let mut best: Option<(Cell, f32)> = None;
    for dy in -range..=range {
        for dx in -range..=range {
            if dx == 0 && dy == 0 {
                continue;
            }
            if dx * dx + dy * dy > range * range {
                continue;
            }
            let cell = geometry::offset(request.origin, dx, dy, view.width, view.height);
            if !request.template.passable(view.biome(cell)) {
                continue;
            }
            let score = score_candidate(view, request, cell);
            if best.is_none_or(|(_, current)| score > current) {
                best = Some((cell, score));
            }
        }
    }
    best.and_then(|(cell, score)| (score > stay).then_some(cell))
}

/// Uniformly random adjacent passable cell, or `None` when boxed in.
pub fn wander_target<R: Rng + ?Sized>(
    rng: &mut R,
    view: &FieldView<'_>,
    template: &SpeciesTemplate,
    origin: Cell,
) -> Option<Cell> {
    let mut open = Vec::with_capacity(8);
    for dy in -1_i32..=1 {
        for dx in -1_i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let cell = geometry::offset(origin, dx, dy, view.width, view.height);
            if template.passable(view.biome(cell)) {
                open.push(cell);
            }
        }
    }
    if open.is_empty() {
        None
    } else {
        Some(open[rng.random_range(0..open.len())])
    }
}
