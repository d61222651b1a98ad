//! Vital-event records, the bounded event log, and the injected sink.
//!
//! Every birth, death, kill, and threat engagement becomes one tagged
//! record. Records land in a bounded drainable log and fold into running
//! aggregate counters; the world also forwards each record synchronously to
//! the sink injected at construction, so hosts can surface events without
//! the core depending on any transport.

use crate::Tick;
use crate::species::{DiseaseKind, HazardKind, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Why an agent died. Set once on the agent, never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeathCause {
    OldAge,
    Cold,
    Heat,
    Starvation,
    Predation,
    Hazard(HazardKind),
    Disease(DiseaseKind),
    Threat,
    /// Fallback for removals that never recorded a cause.
    Unknown,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OldAge => f.write_str("old_age"),
            Self::Cold => f.write_str("cold"),
            Self::Heat => f.write_str("heat"),
            Self::Starvation => f.write_str("starvation"),
            Self::Predation => f.write_str("predation"),
            Self::Hazard(kind) => f.write_str(kind.name()),
            Self::Disease(kind) => write!(f, "disease_{}", kind.name()),
            Self::Threat => f.write_str("hunted_by_threat"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// One recorded lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VitalEvent {
    Birth {
        species: SpeciesId,
    },
    Death {
        species: SpeciesId,
        cause: DeathCause,
    },
    Kill {
        predator: SpeciesId,
        prey: SpeciesId,
    },
    /// A resolved engagement against a threat unit; `lethal` marks the
    /// blow that dropped the unit's health to zero.
    Attack {
        attacker: SpeciesId,
        target: String,
        damage: f32,
        lethal: bool,
    },
}

/// Sink invoked synchronously for every recorded event.
pub trait EventSink: Send {
    fn on_event(&mut self, tick: Tick, event: &VitalEvent);
}

/// No-op sink.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _tick: Tick, _event: &VitalEvent) {}
}

/// Bounded event log with running aggregates.
#[derive(Debug, Clone)]
pub struct VitalLog {
    capacity: usize,
    events: VecDeque<(Tick, VitalEvent)>,
    births: [u64; SpeciesId::COUNT],
    deaths: BTreeMap<(SpeciesId, DeathCause), u64>,
    kills: BTreeMap<(SpeciesId, SpeciesId), u64>,
    last_tick_deaths: Vec<BTreeMap<DeathCause, u32>>,
}

impl VitalLog {
    /// Create a log retaining at most `capacity` raw events. Aggregates are
    /// unaffected by the cap.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity.min(1024)),
            births: [0; SpeciesId::COUNT],
            deaths: BTreeMap::new(),
            kills: BTreeMap::new(),
            last_tick_deaths: vec![BTreeMap::new(); SpeciesId::COUNT],
        }
    }

    /// Reset the per-tick death tallies; called once at the start of a tick.
    pub fn begin_tick(&mut self) {
        for tally in &mut self.last_tick_deaths {
            tally.clear();
        }
    }

    /// Append an event, folding it into the aggregates.
    pub fn record(&mut self, tick: Tick, event: VitalEvent) {
        match &event {
            VitalEvent::Birth { species } => {
                self.births[species.index()] += 1;
            }
            VitalEvent::Death { species, cause } => {
                *self.deaths.entry((*species, *cause)).or_insert(0) += 1;
                *self.last_tick_deaths[species.index()]
                    .entry(*cause)
                    .or_insert(0) += 1;
            }
            VitalEvent::Kill { predator, prey } => {
                *self.kills.entry((*predator, *prey)).or_insert(0) += 1;
            }
            VitalEvent::Attack { .. } => {}
        }
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back((tick, event));
    }

    /// Drain all buffered raw events, oldest first. Aggregates persist.
    pub fn drain(&mut self) -> Vec<(Tick, VitalEvent)> {
        self.events.drain(..).collect()
    }

    /// Buffered raw events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &(Tick, VitalEvent)> {
        self.events.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total births recorded for `species`.
    #[must_use]
    pub fn births(&self, species: SpeciesId) -> u64 {
        self.births[species.index()]
    }

    /// Total deaths recorded for `species` with `cause`.
    #[must_use]
    pub fn deaths(&self, species: SpeciesId, cause: DeathCause) -> u64 {
        self.deaths.get(&(species, cause)).copied().unwrap_or(0)
    }

    /// Deaths-by-species-by-cause counters.
    #[must_use]
    pub fn death_counts(&self) -> &BTreeMap<(SpeciesId, DeathCause), u64> {
        &self.deaths
    }

    /// Total kills of `prey` by `predator`.
    #[must_use]
    pub fn kills(&self, predator: SpeciesId, prey: SpeciesId) -> u64 {
        self.kills.get(&(predator, prey)).copied().unwrap_or(0)
    }

    /// Kills-by-predator-by-prey counters.
    #[must_use]
    pub fn kill_matrix(&self) -> &BTreeMap<(SpeciesId, SpeciesId), u64> {
        &self.kills
    }

    /// Death causes recorded for `species` during the current tick.
    #[must_use]
    pub fn last_tick_deaths(&self, species: SpeciesId) -> &BTreeMap<DeathCause, u32> {
        &self.last_tick_deaths[species.index()]
    }
}
