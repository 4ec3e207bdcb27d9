#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wayfarer engine.
//!
//! This crate defines the coordinate model and the message surface that
//! connects the authoritative world, the invalidation hub and the path
//! finders. World mutations are expressed as [`Command`] values; the world
//! answers with [`Event`] values that invalidation systems translate into
//! dirty marks. Finders never touch the world directly: they read it through
//! the [`WorldQuery`] collaborator trait.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a map layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(u16);

impl LayerId {
    /// Layer holding walkable terrain.
    pub const GROUND: Self = Self(0);
    /// Layer holding loose items.
    pub const ITEMS: Self = Self(1);
    /// Layer holding actors.
    pub const ACTOR: Self = Self(2);
    /// Layer holding transient status effects.
    pub const STATUS_EFFECTS: Self = Self(3);

    /// Creates a new layer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Named map layer pairing a numeric identifier with a locale key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapLayer {
    id: LayerId,
    locale_key: String,
}

impl MapLayer {
    /// Creates a layer description.
    #[must_use]
    pub fn new(id: LayerId, locale_key: impl Into<String>) -> Self {
        Self {
            id,
            locale_key: locale_key.into(),
        }
    }

    /// Identifier positions use to reference the layer.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Display key used when presenting the layer.
    #[must_use]
    pub fn locale_key(&self) -> &str {
        &self.locale_key
    }
}

/// Immutable table of the layers known to the process.
///
/// The registry is built once during startup and handed by reference to the
/// components that need layer metadata. Layer identifiers stay stable for the
/// lifetime of the registry; nothing in the search path reads the names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerRegistry {
    layers: Vec<MapLayer>,
}

impl LayerRegistry {
    /// Validates and captures the provided layers, sorted by identifier.
    pub fn new(mut layers: Vec<MapLayer>) -> Result<Self, LayerRegistryError> {
        if layers.is_empty() {
            return Err(LayerRegistryError::Empty);
        }

        layers.sort_by_key(MapLayer::id);
        let mut keys = BTreeSet::new();
        for pair in layers.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(LayerRegistryError::DuplicateId(pair[0].id));
            }
        }
        for layer in &layers {
            if !keys.insert(layer.locale_key.as_str()) {
                return Err(LayerRegistryError::DuplicateKey(layer.locale_key.clone()));
            }
        }

        Ok(Self { layers })
    }

    /// Registry containing the ground, items, actor and status effect layers.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            layers: vec![
                MapLayer::new(LayerId::GROUND, "layer.ground"),
                MapLayer::new(LayerId::ITEMS, "layer.items"),
                MapLayer::new(LayerId::ACTOR, "layer.actor"),
                MapLayer::new(LayerId::STATUS_EFFECTS, "layer.status_effects"),
            ],
        }
    }

    /// Looks up the layer registered under the provided identifier.
    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&MapLayer> {
        self.layers
            .binary_search_by_key(&id, MapLayer::id)
            .ok()
            .map(|index| &self.layers[index])
    }

    /// Reports whether the identifier belongs to a registered layer.
    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Iterator over the registered layers in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter()
    }

    /// Number of registered layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always `false`; a registry holds at least one layer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Reasons a layer table can be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayerRegistryError {
    /// No layers were supplied.
    #[error("layer registry must contain at least one layer")]
    Empty,
    /// Two layers share the same identifier.
    #[error("layer id {} is registered more than once", .0.get())]
    DuplicateId(LayerId),
    /// Two layers share the same locale key.
    #[error("layer locale key `{0}` is registered more than once")]
    DuplicateKey(String),
}

/// Location of a single discrete cell.
///
/// Positions order lexicographically over `(layer, x, y, z)`, which is the
/// final tie-break applied by every search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    layer: LayerId,
    x: i32,
    y: i32,
    z: i32,
}

impl GridPosition {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(layer: LayerId, x: i32, y: i32, z: i32) -> Self {
        Self { layer, x, y, z }
    }

    /// Layer the cell belongs to.
    #[must_use]
    pub const fn layer(&self) -> LayerId {
        self.layer
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Elevation of the cell.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Returns the cell displaced within the same layer and elevation.
    ///
    /// `None` when the displacement overflows the coordinate range.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            ..self
        })
    }

    /// Computes the Manhattan distance between two cells, ignoring layers.
    #[must_use]
    pub fn manhattan_distance(self, other: GridPosition) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }
}

/// Radius of an entity footprint measured in cell units.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Footprint(f32);

impl Footprint {
    /// Footprint covering only the cell that contains the position.
    pub const POINT: Self = Self(0.0);

    /// Validates the provided radius.
    pub fn new(radius: f32) -> Result<Self, CoordinateError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(CoordinateError::InvalidFootprint(radius));
        }

        Ok(Self(radius))
    }

    /// Radius of the footprint.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.0
    }
}

/// Position in continuous world space.
///
/// Cell `(x, y, z)` covers the half-open box `[x, x + 1) × [y, y + 1) ×
/// [z, z + 1)`, so the containing cell is the floor of each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContinuousPosition {
    layer: LayerId,
    point: Vec3,
}

impl ContinuousPosition {
    /// Creates a continuous position, rejecting non-finite coordinates.
    pub fn new(layer: LayerId, x: f32, y: f32, z: f32) -> Result<Self, CoordinateError> {
        Self::from_point(layer, Vec3::new(x, y, z))
    }

    /// Creates a continuous position from a vector, rejecting non-finite coordinates.
    pub fn from_point(layer: LayerId, point: Vec3) -> Result<Self, CoordinateError> {
        if !point.is_finite() {
            return Err(CoordinateError::NonFinite {
                x: point.x,
                y: point.y,
                z: point.z,
            });
        }

        Ok(Self { layer, point })
    }

    /// Layer the position belongs to.
    #[must_use]
    pub const fn layer(&self) -> LayerId {
        self.layer
    }

    /// Spatial component of the position.
    #[must_use]
    pub const fn point(&self) -> Vec3 {
        self.point
    }

    /// Cell that contains the position.
    #[must_use]
    pub fn cell(&self) -> GridPosition {
        let floored = self.point.floor();
        GridPosition::new(
            self.layer,
            floored.x as i32,
            floored.y as i32,
            floored.z as i32,
        )
    }

    /// Cells overlapped by a circular footprint centred on the position.
    ///
    /// The footprint is a disc in the xy plane at the position's elevation. A
    /// cell is included when the closest point of the cell lies strictly
    /// inside the disc, so cells that merely touch the rim are skipped. A zero
    /// radius yields the containing cell alone. Cells are returned in
    /// row-major order (ascending `y`, then ascending `x`).
    #[must_use]
    pub fn overlapped_cells(&self, footprint: Footprint) -> Vec<GridPosition> {
        let origin = self.cell();
        let radius = footprint.radius();
        if radius <= 0.0 {
            return vec![origin];
        }

        let centre_x = self.point.x;
        let centre_y = self.point.y;
        let min_x = (centre_x - radius).floor() as i32;
        let max_x = (centre_x + radius).ceil() as i32 - 1;
        let min_y = (centre_y - radius).floor() as i32;
        let max_y = (centre_y + radius).ceil() as i32 - 1;
        let radius_squared = radius * radius;

        let mut cells = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let nearest_x = centre_x.clamp(x as f32, x as f32 + 1.0);
                let nearest_y = centre_y.clamp(y as f32, y as f32 + 1.0);
                let dx = centre_x - nearest_x;
                let dy = centre_y - nearest_y;
                if dx * dx + dy * dy < radius_squared {
                    cells.push(GridPosition::new(self.layer, x, y, origin.z()));
                }
            }
        }

        cells
    }
}

/// Errors raised while constructing coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum CoordinateError {
    /// A continuous coordinate was NaN or infinite.
    #[error("continuous position ({x}, {y}, {z}) is not finite")]
    NonFinite {
        /// Offending x component.
        x: f32,
        /// Offending y component.
        y: f32,
        /// Offending z component.
        z: f32,
    },
    /// A footprint radius was negative, NaN or infinite.
    #[error("footprint radius {0} must be finite and non-negative")]
    InvalidFootprint(f32),
}

/// Opaque terrain classification used to weight movement.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TerrainClass(u16);

impl TerrainClass {
    /// Creates a new terrain classification.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the classification.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Describes what counts as a goal for a finder.
///
/// Classifications are resolved into cells by the [`WorldQuery`]
/// collaborator at search time, so the same finder follows goals as they move.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GoalClassification {
    /// Every marker carrying the tag.
    Tag(String),
    /// Every cell of the given terrain.
    Terrain(TerrainClass),
    /// One explicit cell.
    Cell(GridPosition),
}

impl GoalClassification {
    /// Convenience constructor for [`GoalClassification::Tag`].
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }
}

/// Compile-time goal marker mapping a Rust type onto a tag classification.
pub trait GoalKind {
    /// Tag resolved against world markers.
    const TAG: &'static str;

    /// Runtime classification equivalent to the type.
    #[must_use]
    fn classification() -> GoalClassification {
        GoalClassification::tag(Self::TAG)
    }
}

/// Read-only view of the world consumed by path finders.
///
/// Implementations must be consistent for the duration of a search; finders
/// may run on several threads at once against the same view.
pub trait WorldQuery {
    /// Terrain of the cell, or `None` when the cell lies outside the world.
    fn terrain(&self, position: GridPosition) -> Option<TerrainClass>;

    /// Appends every cell matching the classification to `out`.
    fn resolve_goal(&self, classification: &GoalClassification, out: &mut Vec<GridPosition>);
}

impl<W: WorldQuery + ?Sized> WorldQuery for &W {
    fn terrain(&self, position: GridPosition) -> Option<TerrainClass> {
        (**self).terrain(position)
    }

    fn resolve_goal(&self, classification: &GoalClassification, out: &mut Vec<GridPosition>) {
        (**self).resolve_goal(classification, out);
    }
}

/// Unique identifier assigned to a marker placed in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(u32);

impl MarkerId {
    /// Creates a new marker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the terrain of a single cell.
    SetTerrain {
        /// Cell whose terrain changes.
        position: GridPosition,
        /// Terrain assigned to the cell.
        terrain: TerrainClass,
    },
    /// Places a tagged marker into the world.
    PlaceMarker {
        /// Tags goal classifications resolve against.
        tags: Vec<String>,
        /// Location of the marker.
        position: ContinuousPosition,
        /// Area the marker occupies around its position.
        footprint: Footprint,
    },
    /// Relocates an existing marker.
    MoveMarker {
        /// Marker being moved.
        marker: MarkerId,
        /// Destination of the marker.
        position: ContinuousPosition,
    },
    /// Removes a marker from the world.
    RemoveMarker {
        /// Marker being removed.
        marker: MarkerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the terrain of a cell changed.
    TerrainChanged {
        /// Cell whose terrain changed.
        position: GridPosition,
        /// Terrain held before the change.
        previous: TerrainClass,
        /// Terrain held after the change.
        current: TerrainClass,
    },
    /// Confirms that a marker was placed.
    MarkerPlaced {
        /// Identifier allocated to the marker.
        marker: MarkerId,
        /// Location of the marker.
        position: ContinuousPosition,
        /// Area the marker occupies.
        footprint: Footprint,
    },
    /// Confirms that a marker moved.
    MarkerMoved {
        /// Marker that moved.
        marker: MarkerId,
        /// Location before the move.
        from: ContinuousPosition,
        /// Location after the move.
        to: ContinuousPosition,
        /// Area the marker occupies.
        footprint: Footprint,
    },
    /// Confirms that a marker was removed.
    MarkerRemoved {
        /// Marker that was removed.
        marker: MarkerId,
        /// Last location of the marker.
        position: ContinuousPosition,
        /// Area the marker occupied.
        footprint: Footprint,
    },
    /// Reports that a command was rejected without mutating the world.
    CommandRejected {
        /// Specific reason the command failed.
        reason: RejectionReason,
    },
}

/// Reasons a command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The command referenced a layer missing from the registry.
    UnknownLayer(LayerId),
    /// The command referenced a cell outside the world bounds.
    OutOfBounds(GridPosition),
    /// No marker with the provided identifier exists.
    MissingMarker(MarkerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells_xy(cells: &[GridPosition]) -> Vec<(i32, i32)> {
        cells.iter().map(|cell| (cell.x(), cell.y())).collect()
    }

    #[test]
    fn unit_footprint_overlaps_three_by_three_block() {
        let position = ContinuousPosition::new(LayerId::GROUND, 2.3, 2.7, 0.0).expect("finite");
        let footprint = Footprint::new(1.0).expect("valid radius");

        let cells = position.overlapped_cells(footprint);

        let mut expected = Vec::new();
        for y in 1..=3 {
            for x in 1..=3 {
                expected.push((x, y));
            }
        }
        assert_eq!(cells_xy(&cells), expected);
        assert!(cells.iter().all(|cell| cell.layer() == LayerId::GROUND));
    }

    #[test]
    fn zero_footprint_yields_containing_cell() {
        let position = ContinuousPosition::new(LayerId::ACTOR, 4.0, -0.5, 1.2).expect("finite");

        let cells = position.overlapped_cells(Footprint::POINT);

        assert_eq!(cells, vec![GridPosition::new(LayerId::ACTOR, 4, -1, 1)]);
    }

    #[test]
    fn cells_touching_the_rim_are_excluded() {
        let position = ContinuousPosition::new(LayerId::GROUND, 2.0, 2.5, 0.0).expect("finite");
        let footprint = Footprint::new(1.0).expect("valid radius");

        let cells = position.overlapped_cells(footprint);

        assert!(!cells_xy(&cells).contains(&(3, 2)), "x = 3 only touches the rim");
        assert!(cells_xy(&cells).contains(&(1, 2)));
        assert!(cells_xy(&cells).contains(&(2, 2)));
    }

    #[test]
    fn circular_footprint_skips_far_corners() {
        let position = ContinuousPosition::new(LayerId::GROUND, 0.5, 0.5, 0.0).expect("finite");
        let footprint = Footprint::new(0.6).expect("valid radius");

        let cells = position.overlapped_cells(footprint);

        assert_eq!(
            cells_xy(&cells),
            vec![(0, -1), (-1, 0), (0, 0), (1, 0), (0, 1)]
        );
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(Footprint::new(-1.0).is_err());
        assert!(Footprint::new(f32::NAN).is_err());
        assert!(ContinuousPosition::new(LayerId::GROUND, f32::INFINITY, 0.0, 0.0).is_err());
    }

    #[test]
    fn grid_positions_order_by_layer_then_axes() {
        let mut cells = vec![
            GridPosition::new(LayerId::ACTOR, 0, 0, 0),
            GridPosition::new(LayerId::GROUND, 1, 0, 0),
            GridPosition::new(LayerId::GROUND, 0, 5, 0),
            GridPosition::new(LayerId::GROUND, 0, 5, -1),
        ];
        cells.sort();

        assert_eq!(
            cells,
            vec![
                GridPosition::new(LayerId::GROUND, 0, 5, -1),
                GridPosition::new(LayerId::GROUND, 0, 5, 0),
                GridPosition::new(LayerId::GROUND, 1, 0, 0),
                GridPosition::new(LayerId::ACTOR, 0, 0, 0),
            ]
        );
    }

    #[test]
    fn registry_rejects_duplicates() {
        let duplicate_id = LayerRegistry::new(vec![
            MapLayer::new(LayerId::new(1), "a"),
            MapLayer::new(LayerId::new(1), "b"),
        ]);
        assert_eq!(
            duplicate_id,
            Err(LayerRegistryError::DuplicateId(LayerId::new(1)))
        );

        let duplicate_key = LayerRegistry::new(vec![
            MapLayer::new(LayerId::new(1), "a"),
            MapLayer::new(LayerId::new(2), "a"),
        ]);
        assert_eq!(
            duplicate_key,
            Err(LayerRegistryError::DuplicateKey("a".to_owned()))
        );

        assert_eq!(LayerRegistry::new(Vec::new()), Err(LayerRegistryError::Empty));
    }

    #[test]
    fn standard_registry_resolves_layer_keys() {
        let registry = LayerRegistry::standard();

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.get(LayerId::ACTOR).map(MapLayer::locale_key),
            Some("layer.actor")
        );
        assert!(!registry.contains(LayerId::new(9)));
    }

    #[test]
    fn goal_kind_maps_to_tag() {
        struct Food;
        impl GoalKind for Food {
            const TAG: &'static str = "food";
        }

        assert_eq!(Food::classification(), GoalClassification::tag("food"));
    }
}
