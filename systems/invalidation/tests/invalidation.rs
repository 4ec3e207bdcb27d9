use std::sync::Arc;

use wayfarer_core::{
    Command, ContinuousPosition, Footprint, GridPosition, LayerId, LayerRegistry, MarkerId,
    TerrainClass,
};
use wayfarer_system_invalidation::{DirtyRegionHub, Invalidation, StaleCells};
use wayfarer_world::{self as world, GridDimensions, World};

fn actor_at(x: f32, y: f32) -> ContinuousPosition {
    ContinuousPosition::new(LayerId::ACTOR, x, y, 0.0).expect("finite position")
}

#[test]
fn world_events_dirty_the_affected_cells() {
    let mut world = World::new(LayerRegistry::standard(), GridDimensions::new(8, 8, 1));
    let hub = DirtyRegionHub::new();
    let ground = Arc::new(StaleCells::for_layer(LayerId::GROUND));
    let actors = Arc::new(StaleCells::for_layer(LayerId::ACTOR));
    let _ = hub.subscribe(&ground);
    let _ = hub.subscribe(&actors);
    let invalidation = Invalidation::new();

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetTerrain {
            position: GridPosition::new(LayerId::GROUND, 4, 4, 0),
            terrain: TerrainClass::new(2),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::PlaceMarker {
            tags: vec!["scout".to_owned()],
            position: actor_at(1.5, 1.5),
            footprint: Footprint::POINT,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::MoveMarker {
            marker: MarkerId::new(0),
            position: actor_at(2.5, 1.5),
        },
        &mut events,
    );

    let report = invalidation.handle(&events, &hub);

    assert_eq!(report.cells, 4);
    assert_eq!(report.failed, 0);
    assert_eq!(
        ground.drain(),
        vec![GridPosition::new(LayerId::GROUND, 4, 4, 0)]
    );
    assert_eq!(
        actors.drain(),
        vec![
            GridPosition::new(LayerId::ACTOR, 1, 1, 0),
            GridPosition::new(LayerId::ACTOR, 2, 1, 0),
        ]
    );
}

#[test]
fn rejected_commands_dirty_nothing() {
    let mut world = World::new(LayerRegistry::standard(), GridDimensions::new(2, 2, 1));
    let hub = DirtyRegionHub::new();
    let stale = Arc::new(StaleCells::new());
    let _ = hub.subscribe(&stale);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetTerrain {
            position: GridPosition::new(LayerId::GROUND, 9, 9, 0),
            terrain: TerrainClass::new(1),
        },
        &mut events,
    );

    let report = Invalidation::new().handle(&events, &hub);

    assert_eq!(report.cells, 0);
    assert!(stale.is_empty());
}

#[test]
fn removed_marker_dirties_its_footprint() {
    let mut world = World::new(LayerRegistry::standard(), GridDimensions::new(6, 6, 1));
    let hub = DirtyRegionHub::new();
    let stale = Arc::new(StaleCells::new());
    let _ = hub.subscribe(&stale);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceMarker {
            tags: Vec::new(),
            position: actor_at(3.0, 3.0),
            footprint: Footprint::new(0.5).expect("valid radius"),
        },
        &mut events,
    );
    events.clear();

    world::apply(
        &mut world,
        Command::RemoveMarker {
            marker: MarkerId::new(0),
        },
        &mut events,
    );
    let _ = Invalidation::new().handle(&events, &hub);

    assert_eq!(
        stale.drain(),
        vec![
            GridPosition::new(LayerId::ACTOR, 2, 2, 0),
            GridPosition::new(LayerId::ACTOR, 2, 3, 0),
            GridPosition::new(LayerId::ACTOR, 3, 2, 0),
            GridPosition::new(LayerId::ACTOR, 3, 3, 0),
        ]
    );
}
