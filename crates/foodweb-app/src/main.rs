use anyhow::{Context, Result};
use clap::Parser;
use foodweb_core::geometry::offset;
use foodweb_core::{
    Biome, Cell, CombatStats, DiseaseKind, EventSink, HazardKind, SpeciesGroup, SpeciesId,
    TerrainLayers, ThreatUnit, Tick, VitalEvent, WorldConfig, WorldState,
};
use rand::Rng;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "foodweb",
    version,
    about = "Run a multi-species food-web simulation on synthetic terrain"
)]
struct Cli {
    /// World width in cells.
    #[arg(long, default_value_t = 96)]
    width: u16,

    /// World height in cells.
    #[arg(long, default_value_t = 64)]
    height: u16,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// RNG seed; omit for a random seed (the chosen seed is logged).
    #[arg(long)]
    seed: Option<u64>,

    /// Herbivores seeded across the grazer mix.
    #[arg(long, default_value_t = 120)]
    herbivores: u32,

    /// Predators seeded across the hunter mix.
    #[arg(long, default_value_t = 24)]
    predators: u32,

    /// Scavengers seeded across the carrion-eater mix.
    #[arg(long, default_value_t = 12)]
    scavengers: u32,

    /// Hostile raider bands roaming the map.
    #[arg(long, default_value_t = 1)]
    raiders: u32,

    /// Inject a natural hazard every N ticks (0 disables).
    #[arg(long, default_value_t = 50)]
    hazard_interval: u64,

    /// Start a plague outbreak at this tick (0 disables).
    #[arg(long, default_value_t = 0)]
    plague_tick: u64,

    /// Log a population report every N ticks.
    #[arg(long, default_value_t = 25)]
    report_interval: u64,

    /// Vegetation regrowth rate applied by the host each tick.
    #[arg(long, default_value_t = 0.05)]
    regrow_rate: f32,

    /// Optional hard cap on each species' population.
    #[arg(long)]
    max_per_species: Option<u32>,

    /// Print the resolved configuration as JSON before running.
    #[arg(long, default_value_t = false)]
    dump_config: bool,
}

/// Seeding shares within one group; the remainder rounds species by species.
const HERBIVORE_MIX: &[(SpeciesId, f32)] = &[
    (SpeciesId::Deer, 0.35),
    (SpeciesId::Gazelle, 0.20),
    (SpeciesId::Bison, 0.15),
    (SpeciesId::Fish, 0.15),
    (SpeciesId::Caribou, 0.10),
    (SpeciesId::Elephant, 0.05),
];

const PREDATOR_MIX: &[(SpeciesId, f32)] = &[
    (SpeciesId::Wolf, 0.35),
    (SpeciesId::Lion, 0.20),
    (SpeciesId::Leopard, 0.15),
    (SpeciesId::Bear, 0.10),
    (SpeciesId::Raptor, 0.10),
    (SpeciesId::Shark, 0.10),
];

const SCAVENGER_MIX: &[(SpeciesId, f32)] = &[
    (SpeciesId::Vulture, 0.60),
    (SpeciesId::Hyena, 0.40),
];

const HAZARD_CYCLE: [HazardKind; 4] = [
    HazardKind::Wildfire,
    HazardKind::Flood,
    HazardKind::Blizzard,
    HazardKind::Earthquake,
];

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random);

    let config = WorldConfig {
        width: cli.width,
        height: cli.height,
        rng_seed: Some(seed),
        tuning: foodweb_core::BalanceTuning {
            max_per_species: cli.max_per_species,
            ..Default::default()
        },
        ..WorldConfig::default()
    };
    if cli.dump_config {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).context("serializing config")?
        );
    }

    let terrain = banded_terrain(cli.width, cli.height)?;
    let mut world = WorldState::with_sink(config, terrain, Box::new(TracingSink))
        .context("constructing world")?;
    info!(seed, width = cli.width, height = cli.height, "world ready");

    let grazers = seed_mix(&mut world, HERBIVORE_MIX, cli.herbivores);
    let hunters = seed_mix(&mut world, PREDATOR_MIX, cli.predators);
    let cleaners = seed_mix(&mut world, SCAVENGER_MIX, cli.scavengers);
    info!(grazers, hunters, cleaners, "populations seeded");
    spawn_raiders(&mut world, cli.raiders);

    // The core applies one disease tick per call; outbreak duration is the
    // host's job, so the loop below re-applies until the profile runs out.
    let mut outbreak: Option<(Cell, u16)> = None;

    for tick in 1..=cli.ticks {
        let report = world.step();
        world.regrow_vegetation(cli.regrow_rate);
        drive_raiders(&mut world);

        if cli.hazard_interval > 0 && tick % cli.hazard_interval == 0 {
            let kind = HAZARD_CYCLE[((tick / cli.hazard_interval - 1) % 4) as usize];
            let center = random_cell(&mut world);
            let affected = world.apply_hazard(center, 4.0, kind, 1.0);
            info!(
                tick,
                kind = kind.name(),
                x = center.x,
                y = center.y,
                affected,
                "hazard strikes"
            );
        }
        if cli.plague_tick > 0 && tick == cli.plague_tick {
            let center = random_cell(&mut world);
            outbreak = Some((center, DiseaseKind::Plague.profile().duration));
            info!(tick, x = center.x, y = center.y, "plague outbreak");
        }
        if let Some((center, remaining)) = &mut outbreak {
            let affected = world.apply_disease(*center, 6.0, DiseaseKind::Plague);
            debug!(tick, affected, remaining = *remaining, "plague tick");
            *remaining -= 1;
        }
        if matches!(outbreak, Some((_, 0))) {
            outbreak = None;
            info!(tick, "plague burned out");
        }
        if report.extinctions > 0 {
            for &(at, species) in world.extinctions() {
                if at == report.tick {
                    warn!(tick, species = species.name(), "species extinct");
                }
            }
        }
        if cli.report_interval > 0 && tick % cli.report_interval == 0 {
            report_populations(&world, tick);
        }
    }

    final_summary(&world);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Forwards vital events to the tracing pipeline. Lifecycle noise stays at
/// debug; threat engagements are rare enough to surface at info.
struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&mut self, tick: Tick, event: &VitalEvent) {
        match event {
            VitalEvent::Birth { species } => {
                debug!(tick = tick.0, species = species.name(), "birth");
            }
            VitalEvent::Death { species, cause } => {
                debug!(tick = tick.0, species = species.name(), cause = %cause, "death");
            }
            VitalEvent::Kill { predator, prey } => {
                debug!(
                    tick = tick.0,
                    predator = predator.name(),
                    prey = prey.name(),
                    "kill"
                );
            }
            VitalEvent::Attack {
                attacker,
                target,
                damage,
                lethal,
            } => {
                info!(
                    tick = tick.0,
                    attacker = attacker.name(),
                    target = %target,
                    damage = *damage,
                    lethal = *lethal,
                    "threat engaged"
                );
            }
        }
    }
}

/// Synthetic latitude-banded terrain: polar ice at the vertical edges, a hot
/// band at the equator, moisture varied by position, and one river running
/// north to south so aquatic species have somewhere to live.
fn banded_terrain(width: u16, height: u16) -> Result<TerrainLayers> {
    let cells = usize::from(width) * usize::from(height);
    let mut biomes = Vec::with_capacity(cells);
    let mut temperature = Vec::with_capacity(cells);
    let mut moisture = Vec::with_capacity(cells);
    let river = (u32::from(width) * 3 / 8) as u16;

    for y in 0..height {
        let latitude = (f32::from(y) + 0.5) / f32::from(height);
        let heat = 0.9 - 0.8 * (2.0 * latitude - 1.0).abs();
        for x in 0..width {
            let wet = (0.5 + 0.3 * (f32::from(x) * 0.37).sin() + 0.2 * (f32::from(y) * 0.23).cos())
                .clamp(0.05, 0.95);
            let biome = if x == river || x == river + 1 {
                Biome::ShallowOcean
            } else if (x + 1 == river || x == river + 2) && heat >= 0.3 {
                Biome::Beach
            } else {
                band_biome(heat, wet)
            };
            biomes.push(biome);
            temperature.push(heat);
            moisture.push(wet);
        }
    }
    Ok(TerrainLayers::new(
        width,
        height,
        biomes,
        temperature,
        moisture,
    )?)
}

fn band_biome(heat: f32, wet: f32) -> Biome {
    if heat < 0.2 {
        Biome::Snow
    } else if heat < 0.35 {
        Biome::Tundra
    } else if heat < 0.5 {
        if wet < 0.25 { Biome::Mountain } else { Biome::Taiga }
    } else if heat < 0.7 {
        if wet < 0.25 {
            Biome::Mountain
        } else if wet > 0.6 {
            Biome::TemperateForest
        } else {
            Biome::Grassland
        }
    } else if wet < 0.3 {
        Biome::Desert
    } else if wet > 0.65 {
        Biome::TropicalRainforest
    } else {
        Biome::Savanna
    }
}

fn seed_mix(world: &mut WorldState, mix: &[(SpeciesId, f32)], total: u32) -> u32 {
    let mut placed = 0;
    for &(species, share) in mix {
        let target = (total as f32 * share).round() as u32;
        if target == 0 {
            continue;
        }
        let count = world.seed_population(species, target);
        if count < target {
            debug!(
                species = species.name(),
                target, count, "short placement, habitat too scarce"
            );
        }
        placed += count;
    }
    placed
}

fn spawn_raiders(world: &mut WorldState, count: u32) {
    if count == 0 {
        return;
    }
    let (width, height) = (world.config().width, world.config().height);
    let mut units = Vec::with_capacity(count as usize);
    for index in 0..count {
        let cell = {
            let rng = world.rng();
            Cell::new(rng.random_range(0..width), rng.random_range(0..height))
        };
        units.push(ThreatUnit {
            name: format!("raider band {}", index + 1),
            cell,
            stats: CombatStats::new(80.0, 12.0, 6.0, 6, 5, 85),
        });
    }
    info!(raiders = count, "raider bands deployed");
    world.set_threats(units);
}

/// Host-side threat upkeep: sweep destroyed bands, random-walk the rest.
fn drive_raiders(world: &mut WorldState) {
    let before = world.threats().len();
    if before == 0 {
        return;
    }
    world.threats_mut().retain(|unit| unit.stats.is_alive());
    let remaining = world.threats().len();
    if remaining < before {
        info!(destroyed = before - remaining, "raider bands wiped out");
    }
    if remaining == 0 {
        return;
    }
    let steps: Vec<(i32, i32)> = {
        let rng = world.rng();
        (0..remaining)
            .map(|_| (rng.random_range(-1..=1), rng.random_range(-1..=1)))
            .collect()
    };
    let (width, height) = (world.config().width, world.config().height);
    for (unit, (dx, dy)) in world.threats_mut().iter_mut().zip(steps) {
        unit.cell = offset(unit.cell, dx, dy, width, height);
    }
}

fn random_cell(world: &mut WorldState) -> Cell {
    let (width, height) = (world.config().width, world.config().height);
    let rng = world.rng();
    Cell::new(rng.random_range(0..width), rng.random_range(0..height))
}

fn report_populations(world: &WorldState, tick: u64) {
    let herbivores = world.group(SpeciesGroup::Herbivore).len();
    let predators = world.group(SpeciesGroup::Predator).len();
    let scavengers = world.group(SpeciesGroup::Scavenger).len();
    if let Some(summary) = world.history().last() {
        info!(
            tick,
            herbivores,
            predators,
            scavengers,
            births = summary.births,
            deaths = summary.deaths,
            kills = summary.kills,
            carrion_piles = world.carrion().len(),
            "population report"
        );
    }
}

fn final_summary(world: &WorldState) {
    let counts = world.population_counts();
    let log = world.log();
    for species in SpeciesId::ALL {
        let idx = species.index();
        let births = log.births(species);
        let hunted: u64 = log
            .kill_matrix()
            .iter()
            .filter(|((_, prey), _)| *prey == species)
            .map(|(_, count)| count)
            .sum();
        if counts[idx] == 0 && births == 0 && hunted == 0 {
            continue;
        }
        info!(
            species = species.name(),
            population = counts[idx],
            births,
            hunted,
            "final tally"
        );
    }
    for &(tick, species) in world.extinctions() {
        info!(tick = tick.0, species = species.name(), "went extinct");
    }
    info!(
        tick = world.tick().0,
        total = world.total_population(),
        "simulation complete"
    );
}
