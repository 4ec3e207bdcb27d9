use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
    thread,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wayfarer_core::{
    Command, ContinuousPosition, Footprint, GoalClassification, GridPosition, LayerId,
    LayerRegistry, TerrainClass,
};
use wayfarer_system_pathfinding::{
    AvoidanceBuilder, DiagonalMovement, Finder, MovementCostProfile, SearchOutcome, SeekBuilder,
};
use wayfarer_world::{self as world, GridDimensions, World};

const SIZE: i32 = 24;
const WALL: TerrainClass = TerrainClass::new(1);
const MUD: TerrainClass = TerrainClass::new(2);
const SAND: TerrainClass = TerrainClass::new(3);

fn random_world(seed: u64) -> World {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = World::new(
        LayerRegistry::standard(),
        GridDimensions::new(SIZE as u32, SIZE as u32, 1),
    );
    let mut events = Vec::new();

    for y in 0..SIZE {
        for x in 0..SIZE {
            let terrain = match rng.gen_range(0..10) {
                0 | 1 => WALL,
                2 => MUD,
                3 => SAND,
                _ => continue,
            };
            world::apply(
                &mut world,
                Command::SetTerrain {
                    position: GridPosition::new(LayerId::GROUND, x, y, 0),
                    terrain,
                },
                &mut events,
            );
        }
    }

    for tag in ["food", "food", "water", "predator", "predator"] {
        let x = rng.gen_range(0.0..SIZE as f32);
        let y = rng.gen_range(0.0..SIZE as f32);
        world::apply(
            &mut world,
            Command::PlaceMarker {
                tags: vec![tag.to_owned()],
                position: ContinuousPosition::new(LayerId::GROUND, x, y, 0.0)
                    .expect("finite position"),
                footprint: Footprint::POINT,
            },
            &mut events,
        );
    }

    world
}

fn profile() -> Arc<MovementCostProfile> {
    Arc::new(
        MovementCostProfile::builder()
            .impassable(WALL)
            .terrain_cost(MUD, 3.0)
            .terrain_cost(SAND, 1.5)
            .diagonal(DiagonalMovement::Allowed {
                multiplier: std::f32::consts::SQRT_2,
            })
            .build()
            .expect("valid profile"),
    )
}

fn finders() -> Vec<Finder> {
    let profile = profile();

    let mut seek = SeekBuilder::new();
    let _ = seek
        .with_search_radius(40.0)
        .and_then(|builder| builder.with_goal(GoalClassification::tag("food")))
        .and_then(|builder| builder.with_goal(GoalClassification::tag("water")))
        .expect("configurable");

    let mut avoid = AvoidanceBuilder::new();
    let _ = avoid
        .with_search_radius(12.0)
        .and_then(|builder| builder.with_goal(GoalClassification::tag("predator")))
        .expect("configurable");

    vec![
        Finder::from(seek.build(Arc::clone(&profile)).expect("valid seek")),
        Finder::from(avoid.build(profile).expect("valid avoidance")),
    ]
}

fn starts() -> Vec<GridPosition> {
    (0..SIZE)
        .step_by(5)
        .flat_map(|y| (0..SIZE).step_by(7).map(move |x| (x, y)))
        .map(|(x, y)| GridPosition::new(LayerId::GROUND, x, y, 0))
        .collect()
}

fn run(world: &World, finders: &[Finder]) -> Vec<SearchOutcome> {
    finders
        .iter()
        .flat_map(|finder| starts().into_iter().map(move |start| finder.search(world, start)))
        .collect()
}

fn fingerprint(outcomes: &[SearchOutcome]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for outcome in outcomes {
        match outcome {
            SearchOutcome::Path(path) => {
                0_u8.hash(&mut hasher);
                path.cells().hash(&mut hasher);
                path.cost().to_bits().hash(&mut hasher);
                path.goal_distance().map(f32::to_bits).hash(&mut hasher);
            }
            SearchOutcome::NoPathFound => 1_u8.hash(&mut hasher),
            SearchOutcome::NoSafeCellFound => 2_u8.hash(&mut hasher),
        }
    }
    hasher.finish()
}

#[test]
fn repeated_runs_produce_identical_results() {
    for seed in [3, 17, 4_242] {
        let first = run(&random_world(seed), &finders());
        let second = run(&random_world(seed), &finders());

        assert_eq!(first, second, "seed {seed} diverged between runs");
        assert_eq!(fingerprint(&first), fingerprint(&second));
    }
}

#[test]
fn random_terrain_produces_some_paths() {
    let outcomes = run(&random_world(17), &finders());

    assert!(outcomes.iter().any(SearchOutcome::is_found));
    for path in outcomes.iter().filter_map(SearchOutcome::path) {
        assert!(!path.cells().is_empty());
        assert!(path.cost() >= 0.0);
    }
}

#[test]
fn concurrent_searches_match_sequential_results() {
    let world = random_world(99);
    let finders = finders();
    let expected = fingerprint(&run(&world, &finders));

    let fingerprints: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| fingerprint(&run(&world, &finders))))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("search thread panicked"))
            .collect()
    });

    assert!(fingerprints.iter().all(|value| *value == expected));
}
