use std::sync::Arc;

use wayfarer_core::{
    Command, ContinuousPosition, Footprint, GoalClassification, GridPosition, LayerId,
    LayerRegistry, TerrainClass,
};
use wayfarer_system_pathfinding::{
    AvoidanceBuilder, AvoidanceFinder, DiagonalMovement, MovementCostProfile, SearchOutcome,
};
use wayfarer_world::{self as world, GridDimensions, World};

const WALL: TerrainClass = TerrainClass::new(1);

fn cell(x: i32, y: i32) -> GridPosition {
    GridPosition::new(LayerId::GROUND, x, y, 0)
}

fn world_with_predator(width: u32, height: u32, x: i32, y: i32) -> World {
    let mut world = World::new(
        LayerRegistry::standard(),
        GridDimensions::new(width, height, 1),
    );
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceMarker {
            tags: vec!["predator".to_owned()],
            position: ContinuousPosition::new(LayerId::GROUND, x as f32 + 0.5, y as f32 + 0.5, 0.0)
                .expect("finite position"),
            footprint: Footprint::POINT,
        },
        &mut events,
    );
    world
}

fn avoidance_finder(radius: f32, profile: MovementCostProfile) -> AvoidanceFinder {
    let mut builder = AvoidanceBuilder::new();
    let _ = builder
        .with_search_radius(radius)
        .and_then(|builder| builder.with_goal(GoalClassification::tag("predator")))
        .expect("configurable");
    builder
        .build(Arc::new(profile))
        .expect("valid configuration")
}

#[test]
fn flees_to_a_far_corner() {
    let world = world_with_predator(5, 5, 2, 2);
    let finder = avoidance_finder(20.0, MovementCostProfile::uniform());

    let path = finder
        .search(&world, cell(2, 2))
        .into_path()
        .expect("corners are reachable");

    assert_ne!(path.destination(), Some(cell(2, 2)));
    assert_eq!(path.destination(), Some(cell(0, 0)));
    assert_eq!(path.goal_distance(), Some(4.0));
    assert_eq!(path.cost(), 4.0);
}

#[test]
fn corner_start_is_already_the_safest_refuge() {
    let world = world_with_predator(5, 5, 2, 2);
    let finder = avoidance_finder(20.0, MovementCostProfile::uniform());

    let path = finder
        .search(&world, cell(0, 0))
        .into_path()
        .expect("start is always reachable");

    assert_eq!(path.cells(), &[cell(0, 0)]);
    assert_eq!(path.goal_distance(), Some(4.0));
    assert_eq!(path.cost(), 0.0);
}

#[test]
fn expansion_limit_keeps_goal_distances_exact() {
    let world = world_with_predator(9, 1, 0, 0);
    let mut builder = AvoidanceBuilder::new();
    let _ = builder
        .with_search_radius(20.0)
        .and_then(|builder| builder.with_goal(GoalClassification::tag("predator")))
        .and_then(|builder| builder.with_expansion_limit(3))
        .expect("configurable");
    let finder = builder
        .build(Arc::new(MovementCostProfile::uniform()))
        .expect("valid configuration");

    let path = finder
        .search(&world, cell(4, 0))
        .into_path()
        .expect("reached cells are ranked");

    assert_eq!(path.destination(), Some(cell(5, 0)));
    assert_eq!(path.goal_distance(), Some(5.0));
    assert_eq!(path.cost(), 1.0);
}

#[test]
fn prefers_the_cheapest_of_equally_safe_cells() {
    let world = world_with_predator(5, 5, 2, 2);
    let finder = avoidance_finder(20.0, MovementCostProfile::uniform());

    let path = finder
        .search(&world, cell(3, 4))
        .into_path()
        .expect("corners are reachable");

    assert_eq!(path.destination(), Some(cell(4, 4)));
    assert_eq!(path.cost(), 1.0);
}

#[test]
fn radius_limits_the_refuges() {
    let world = world_with_predator(5, 5, 2, 2);
    let finder = avoidance_finder(1.0, MovementCostProfile::uniform());

    let path = finder
        .search(&world, cell(2, 2))
        .into_path()
        .expect("neighbours are reachable");

    assert_eq!(path.cells(), &[cell(2, 2), cell(1, 2)]);
    assert_eq!(path.goal_distance(), Some(1.0));
}

#[test]
fn cells_the_goal_cannot_reach_are_safest() {
    let mut world = world_with_predator(5, 1, 0, 0);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetTerrain {
            position: cell(2, 0),
            terrain: WALL,
        },
        &mut events,
    );
    let profile = MovementCostProfile::builder()
        .impassable(WALL)
        .build()
        .expect("valid profile");
    let finder = avoidance_finder(10.0, profile);

    let path = finder
        .search(&world, cell(4, 0))
        .into_path()
        .expect("start is always a candidate");

    assert_eq!(path.cells(), &[cell(4, 0)]);
    assert_eq!(path.goal_distance(), None);
}

#[test]
fn diagonal_profiles_measure_goal_distance_diagonally() {
    let world = world_with_predator(3, 3, 0, 0);
    let profile = MovementCostProfile::builder()
        .diagonal(DiagonalMovement::Allowed { multiplier: 1.5 })
        .build()
        .expect("valid profile");
    let finder = avoidance_finder(10.0, profile);

    let path = finder
        .search(&world, cell(0, 0))
        .into_path()
        .expect("far corner is reachable");

    assert_eq!(path.destination(), Some(cell(2, 2)));
    assert_eq!(path.goal_distance(), Some(3.0));
    assert_eq!(path.cost(), 3.0);
}

#[test]
fn start_outside_the_world_has_no_refuge() {
    let world = world_with_predator(3, 3, 1, 1);
    let finder = avoidance_finder(10.0, MovementCostProfile::uniform());

    assert_eq!(
        finder.search(&world, cell(5, 5)),
        SearchOutcome::NoSafeCellFound
    );
}
