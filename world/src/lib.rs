#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative reference world for Wayfarer.
//!
//! The world owns dense per-layer terrain and a set of tagged markers. It
//! mutates only through [`apply`], reports every change as an [`Event`], and
//! exposes read access through the [`query`] module and its
//! [`WorldQuery`] implementation.

mod terrain;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use wayfarer_core::{
    Command, ContinuousPosition, Event, Footprint, GoalClassification, GridPosition, LayerId,
    LayerRegistry, MarkerId, RejectionReason, TerrainClass, WorldQuery,
};

use crate::terrain::TerrainGrid;

/// Extent of every layer measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDimensions {
    width: u32,
    height: u32,
    depth: u32,
}

impl GridDimensions {
    /// Creates a new extent description.
    #[must_use]
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of elevation levels.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Total number of cells in one layer.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let cells = u64::from(self.width) * u64::from(self.height) * u64::from(self.depth);
        usize::try_from(cells).unwrap_or(0)
    }

    /// Reports whether the cell's coordinates fall inside the extent.
    #[must_use]
    pub fn contains(&self, position: GridPosition) -> bool {
        within(position.x(), self.width)
            && within(position.y(), self.height)
            && within(position.z(), self.depth)
    }
}

fn within(value: i32, extent: u32) -> bool {
    u32::try_from(value).map_or(false, |value| value < extent)
}

#[derive(Clone, Debug)]
struct Marker {
    tags: BTreeSet<String>,
    position: ContinuousPosition,
    footprint: Footprint,
}

/// Represents the authoritative Wayfarer world state.
#[derive(Clone, Debug)]
pub struct World {
    layers: LayerRegistry,
    dimensions: GridDimensions,
    terrain: BTreeMap<LayerId, TerrainGrid>,
    markers: BTreeMap<MarkerId, Marker>,
    next_marker: MarkerId,
}

impl World {
    /// Creates a world whose registered layers are filled with default terrain.
    #[must_use]
    pub fn new(layers: LayerRegistry, dimensions: GridDimensions) -> Self {
        let terrain = layers
            .iter()
            .map(|layer| {
                (
                    layer.id(),
                    TerrainGrid::filled(dimensions, TerrainClass::default()),
                )
            })
            .collect();

        Self {
            layers,
            dimensions,
            terrain,
            markers: BTreeMap::new(),
            next_marker: MarkerId::new(0),
        }
    }

    fn validate_cell(&self, position: GridPosition) -> Result<(), RejectionReason> {
        if !self.layers.contains(position.layer()) {
            return Err(RejectionReason::UnknownLayer(position.layer()));
        }
        if !self.dimensions.contains(position) {
            return Err(RejectionReason::OutOfBounds(position));
        }
        Ok(())
    }

    fn allocate_marker(&mut self) -> MarkerId {
        let marker = self.next_marker;
        self.next_marker = MarkerId::new(marker.get().saturating_add(1));
        marker
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::SetTerrain { position, terrain } => set_terrain(world, position, terrain),
        Command::PlaceMarker {
            tags,
            position,
            footprint,
        } => place_marker(world, tags, position, footprint),
        Command::MoveMarker { marker, position } => move_marker(world, marker, position),
        Command::RemoveMarker { marker } => remove_marker(world, marker),
    };

    match outcome {
        Ok(Some(event)) => out_events.push(event),
        Ok(None) => {}
        Err(reason) => {
            debug!(?reason, "world rejected command");
            out_events.push(Event::CommandRejected { reason });
        }
    }
}

fn set_terrain(
    world: &mut World,
    position: GridPosition,
    terrain: TerrainClass,
) -> Result<Option<Event>, RejectionReason> {
    world.validate_cell(position)?;
    let previous = world
        .terrain
        .get_mut(&position.layer())
        .and_then(|grid| grid.set(position, terrain))
        .ok_or(RejectionReason::OutOfBounds(position))?;

    if previous == terrain {
        return Ok(None);
    }

    Ok(Some(Event::TerrainChanged {
        position,
        previous,
        current: terrain,
    }))
}

fn place_marker(
    world: &mut World,
    tags: Vec<String>,
    position: ContinuousPosition,
    footprint: Footprint,
) -> Result<Option<Event>, RejectionReason> {
    world.validate_cell(position.cell())?;
    let marker = world.allocate_marker();
    let _ = world.markers.insert(
        marker,
        Marker {
            tags: tags.into_iter().collect(),
            position,
            footprint,
        },
    );

    Ok(Some(Event::MarkerPlaced {
        marker,
        position,
        footprint,
    }))
}

fn move_marker(
    world: &mut World,
    marker: MarkerId,
    position: ContinuousPosition,
) -> Result<Option<Event>, RejectionReason> {
    world.validate_cell(position.cell())?;
    let state = world
        .markers
        .get_mut(&marker)
        .ok_or(RejectionReason::MissingMarker(marker))?;
    let from = std::mem::replace(&mut state.position, position);

    Ok(Some(Event::MarkerMoved {
        marker,
        from,
        to: position,
        footprint: state.footprint,
    }))
}

fn remove_marker(world: &mut World, marker: MarkerId) -> Result<Option<Event>, RejectionReason> {
    let state = world
        .markers
        .remove(&marker)
        .ok_or(RejectionReason::MissingMarker(marker))?;

    Ok(Some(Event::MarkerRemoved {
        marker,
        position: state.position,
        footprint: state.footprint,
    }))
}

impl WorldQuery for World {
    fn terrain(&self, position: GridPosition) -> Option<TerrainClass> {
        query::terrain_at(self, position)
    }

    fn resolve_goal(&self, classification: &GoalClassification, out: &mut Vec<GridPosition>) {
        match classification {
            GoalClassification::Tag(tag) => {
                out.extend(
                    self.markers
                        .values()
                        .filter(|marker| marker.tags.contains(tag))
                        .flat_map(|marker| marker.position.overlapped_cells(marker.footprint))
                        .filter(|cell| self.validate_cell(*cell).is_ok()),
                );
            }
            GoalClassification::Terrain(terrain) => {
                for (layer, grid) in &self.terrain {
                    grid.collect_matching(*layer, *terrain, out);
                }
            }
            GoalClassification::Cell(position) => {
                if self.validate_cell(*position).is_ok() {
                    out.push(*position);
                }
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use wayfarer_core::{
        ContinuousPosition, Footprint, GridPosition, LayerRegistry, MarkerId, TerrainClass,
    };

    use super::{GridDimensions, World};

    /// Provides read-only access to the layer registry the world validates against.
    #[must_use]
    pub fn layers(world: &World) -> &LayerRegistry {
        &world.layers
    }

    /// Extent shared by every layer.
    #[must_use]
    pub fn dimensions(world: &World) -> GridDimensions {
        world.dimensions
    }

    /// Terrain of the cell, or `None` outside the world.
    #[must_use]
    pub fn terrain_at(world: &World, position: GridPosition) -> Option<TerrainClass> {
        world
            .terrain
            .get(&position.layer())
            .and_then(|grid| grid.get(position))
    }

    /// Captures a read-only view of the markers placed in the world.
    #[must_use]
    pub fn marker_view(world: &World) -> MarkerView {
        let snapshots = world
            .markers
            .iter()
            .map(|(id, marker)| MarkerSnapshot {
                id: *id,
                tags: marker.tags.iter().cloned().collect(),
                position: marker.position,
                footprint: marker.footprint,
            })
            .collect();
        MarkerView { snapshots }
    }

    /// Read-only snapshot describing all markers, ordered by identifier.
    #[derive(Clone, Debug, Default)]
    pub struct MarkerView {
        snapshots: Vec<MarkerSnapshot>,
    }

    impl MarkerView {
        /// Iterator over the captured marker snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &MarkerSnapshot> {
            self.snapshots.iter()
        }

        /// Snapshot of the marker with the provided identifier.
        #[must_use]
        pub fn get(&self, id: MarkerId) -> Option<&MarkerSnapshot> {
            self.snapshots.iter().find(|snapshot| snapshot.id == id)
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<MarkerSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single marker used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct MarkerSnapshot {
        /// Identifier allocated by the world.
        pub id: MarkerId,
        /// Tags sorted alphabetically.
        pub tags: Vec<String>,
        /// Current location of the marker.
        pub position: ContinuousPosition,
        /// Area the marker occupies.
        pub footprint: Footprint,
    }
}
