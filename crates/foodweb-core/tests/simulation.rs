use foodweb_core::{
    Biome, Cell, CombatStats, DeathCause, DiseaseKind, HazardKind, SpeciesGroup, SpeciesId,
    TerrainLayers, ThreatUnit, Tick, WorldConfig, WorldState,
};

fn meadow(width: u16, height: u16) -> TerrainLayers {
    TerrainLayers::uniform(width, height, Biome::Grassland, 0.5, 0.6)
}

fn meadow_config(width: u16, height: u16, seed: u64) -> WorldConfig {
    WorldConfig {
        width,
        height,
        rng_seed: Some(seed),
        ..WorldConfig::default()
    }
}

/// A mixed three-group world on open grassland.
fn eco_world(seed: u64) -> WorldState {
    let mut world = WorldState::new(meadow_config(48, 32, seed), meadow(48, 32))
        .expect("eco world builds");
    world.seed_population(SpeciesId::Deer, 24);
    world.seed_population(SpeciesId::Bison, 6);
    world.seed_population(SpeciesId::Wolf, 6);
    world.seed_population(SpeciesId::Vulture, 4);
    world
}

/// One hosted tick: regrowth, scheduled hazards, a patrolling threat unit.
fn host_tick(world: &mut WorldState, tick: u64) -> foodweb_core::TickReport {
    let report = world.step();
    world.regrow_vegetation(0.05);
    if tick == 20 {
        world.apply_hazard(Cell::new(10, 10), 4.0, HazardKind::Wildfire, 1.0);
    }
    if tick == 40 {
        world.apply_hazard(Cell::new(30, 20), 5.0, HazardKind::Flood, 1.2);
    }
    let width = world.config().width;
    for unit in world.threats_mut() {
        unit.cell = Cell::new((unit.cell.x + 1) % width, unit.cell.y);
    }
    report
}

#[test]
fn hosted_worlds_stay_in_lockstep_under_a_shared_seed() {
    let build = || {
        let mut world = eco_world(0xDEADBEEF);
        world.set_threats(vec![ThreatUnit {
            name: "raider band".to_owned(),
            cell: Cell::new(24, 16),
            stats: CombatStats::new(60.0, 12.0, 6.0, 6, 5, 80),
        }]);
        world
    };
    let mut left = build();
    let mut right = build();

    for tick in 1..=50 {
        let a = host_tick(&mut left, tick);
        let b = host_tick(&mut right, tick);
        assert_eq!(a, b, "tick {tick} diverged");
        assert_eq!(
            left.population_counts(),
            right.population_counts(),
            "populations diverged at tick {tick}"
        );
    }
    assert_eq!(left.tick(), Tick(50));
    assert_eq!(right.tick(), Tick(50));
    let lhs: Vec<_> = left.history().cloned().collect();
    let rhs: Vec<_> = right.history().cloned().collect();
    assert_eq!(lhs, rhs);
}

#[test]
fn birth_and_death_flows_balance_the_population_ledger() {
    let mut world = eco_world(7);
    let seeded = world.total_population() as i64;

    for _ in 0..60 {
        world.step();
        world.regrow_vegetation(0.05);
    }

    let mut births = 0_i64;
    let mut deaths = 0_i64;
    let mut kills = 0_i64;
    let mut last_tick = 0;
    for summary in world.history() {
        assert!(summary.tick.0 > last_tick, "history ticks must increase");
        last_tick = summary.tick.0;
        births += i64::from(summary.births);
        deaths += i64::from(summary.deaths);
        kills += i64::from(summary.kills);
    }
    assert_eq!(
        world.total_population() as i64,
        seeded + births - deaths,
        "every agent is accounted for by seeding, births, and deaths"
    );

    let log = world.log();
    let logged_births: u64 = SpeciesId::ALL.iter().map(|&s| log.births(s)).sum();
    assert_eq!(logged_births as i64, births, "log and history agree on births");
    let logged_deaths: u64 = log.death_counts().values().sum();
    assert_eq!(logged_deaths as i64, deaths, "log and history agree on deaths");
    let logged_kills: u64 = log.kill_matrix().values().sum();
    assert_eq!(logged_kills as i64, kills, "log and history agree on kills");

    let deer_hunted: u64 = log
        .kill_matrix()
        .iter()
        .filter(|((_, prey), _)| *prey == SpeciesId::Deer)
        .map(|(_, count)| count)
        .sum();
    assert_eq!(
        log.deaths(SpeciesId::Deer, DeathCause::Predation),
        deer_hunted,
        "every hunted deer death pairs with a kill record"
    );
}

#[test]
fn preyless_predators_starve_into_a_single_extinction_record() {
    let mut world = WorldState::new(meadow_config(24, 24, 3), meadow(24, 24))
        .expect("world builds");
    assert_eq!(world.seed_population(SpeciesId::Wolf, 6), 6);

    for _ in 0..30 {
        world.step();
    }

    assert_eq!(world.total_population(), 0);
    assert_eq!(world.log().deaths(SpeciesId::Wolf, DeathCause::Starvation), 6);
    let extinctions = world.extinctions();
    assert_eq!(extinctions.len(), 1, "one extinction record, never repeated");
    assert_eq!(extinctions[0].1, SpeciesId::Wolf);
    assert!(extinctions[0].0.0 <= 16, "wolves cannot outlast their reserves");
}

#[test]
fn regrowth_tracks_biome_fertility() {
    let width = 32_u16;
    let height = 16_u16;
    let cells = usize::from(width) * usize::from(height);
    let biomes: Vec<Biome> = (0..cells)
        .map(|idx| {
            if idx % usize::from(width) < usize::from(width) / 2 {
                Biome::Grassland
            } else {
                Biome::Desert
            }
        })
        .collect();
    let terrain = TerrainLayers::new(width, height, biomes, vec![0.5; cells], vec![0.5; cells])
        .expect("terrain builds");
    let mut world =
        WorldState::new(meadow_config(width, height, 1), terrain).expect("world builds");

    world.vegetation_mut().fill(0.1);
    for _ in 0..3 {
        world.regrow_vegetation(0.2);
    }

    let half = usize::from(width) / 2;
    let mut grass_total = 0.0;
    let mut desert_total = 0.0;
    for (idx, &density) in world.vegetation().cells().iter().enumerate() {
        assert!((0.0..=1.0).contains(&density), "density out of range");
        assert!(density > 0.1, "every cell regrows at least a little");
        if idx % usize::from(width) < half {
            grass_total += density;
        } else {
            desert_total += density;
        }
    }
    assert!(
        grass_total > desert_total,
        "fertile grassland outgrows desert ({grass_total} vs {desert_total})"
    );
}

#[test]
fn a_cornered_threat_unit_is_worn_down_but_never_removed() {
    let mut config = meadow_config(16, 16, 21);
    config.wander_chance = 0.0;
    config.move_cost_fraction = 0.0;
    let mut world = WorldState::new(config, meadow(16, 16)).expect("world builds");
    world
        .spawn_agent(SpeciesId::Wolf, Cell::new(8, 8))
        .expect("wolf spawns");
    let initial = CombatStats::new(50.0, 12.0, 5.0, 5, 0, 90);
    world.set_threats(vec![ThreatUnit {
        name: "poachers".to_owned(),
        cell: Cell::new(8, 9),
        stats: initial,
    }]);

    for _ in 0..3 {
        world.step();
    }

    let strikes = world
        .drain_events()
        .into_iter()
        .filter(|(_, event)| {
            matches!(event, foodweb_core::VitalEvent::Attack { target, .. } if target == "poachers")
        })
        .count();
    assert!(strikes >= 1, "the adjacent wolf keeps engaging the unit");
    assert_eq!(world.threats().len(), 1, "resolution never removes units");
    assert!(
        world.threats()[0].stats.current_health <= initial.current_health,
        "unit health only moves down"
    );
}

#[test]
fn hazards_and_disease_attribute_deaths_through_the_log() {
    let mut world = WorldState::new(meadow_config(24, 24, 13), meadow(24, 24))
        .expect("world builds");
    let cluster = [
        Cell::new(6, 6),
        Cell::new(6, 7),
        Cell::new(7, 6),
        Cell::new(7, 7),
        Cell::new(6, 5),
    ];
    for cell in cluster {
        world.spawn_agent(SpeciesId::Deer, cell).expect("deer spawns");
    }
    let survivor = world
        .spawn_agent(SpeciesId::Deer, Cell::new(18, 18))
        .expect("far deer spawns");

    let affected = world.apply_hazard(Cell::new(6, 6), 3.0, HazardKind::Earthquake, 2.0);
    assert_eq!(affected, 5, "only the cluster sits inside the radius");
    world.step();
    assert_eq!(
        world
            .log()
            .deaths(SpeciesId::Deer, DeathCause::Hazard(HazardKind::Earthquake)),
        5
    );

    for _ in 0..3 {
        world.apply_disease(Cell::new(18, 18), 2.0, DiseaseKind::Parasites);
    }
    let deer = world
        .group(SpeciesGroup::Herbivore)
        .get(survivor)
        .expect("survivor still alive");
    assert!(
        (deer.stats.current_health - (deer.stats.max_health - 3.0)).abs() < 1e-3,
        "three parasite ticks land the 1-point floor each"
    );
}

#[test]
fn long_eco_run_preserves_core_invariants() {
    let mut world = eco_world(42);
    let seeded = world.total_population() as i64;

    for _ in 0..80 {
        world.step();
        world.regrow_vegetation(0.05);
    }

    assert_eq!(world.tick(), Tick(80));
    for group in [
        SpeciesGroup::Herbivore,
        SpeciesGroup::Predator,
        SpeciesGroup::Scavenger,
    ] {
        for (_, agent) in world.group(group).iter() {
            assert!(agent.stats.current_health > 0.0, "pruning leaves only the living");
            assert!(
                agent.stats.current_health <= agent.stats.max_health,
                "health never exceeds the species maximum"
            );
        }
    }
    for &density in world.vegetation().cells() {
        assert!((0.0..=1.0).contains(&density));
    }
    for (_, pile) in world.carrion().iter() {
        assert!(pile.energy > 0.0, "decay sweeps exhausted piles");
    }

    let births: i64 = world.history().map(|s| i64::from(s.births)).sum();
    let deaths: i64 = world.history().map(|s| i64::from(s.deaths)).sum();
    assert_eq!(world.total_population() as i64, seeded + births - deaths);
    assert!(
        world.log().len() <= world.config().event_log_capacity,
        "raw event retention respects the configured cap"
    );
}
