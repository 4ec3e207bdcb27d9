//! TOML scenarios describing a map, its markers and a movement cost profile.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use wayfarer_core::{
    Command, ContinuousPosition, Event, Footprint, GoalClassification, GridPosition, LayerId,
    LayerRegistry, MapLayer, TerrainClass,
};
use wayfarer_system_pathfinding::{DiagonalMovement, MovementCostProfile};
use wayfarer_world::{self as world, GridDimensions, World};

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    version: u32,
    #[serde(default)]
    layer: u16,
    radius: Option<f32>,
    #[serde(default)]
    goals: Vec<String>,
    #[serde(default)]
    layers: Vec<LayerEntry>,
    legend: BTreeMap<String, u16>,
    #[serde(default)]
    profile: ProfileEntry,
    map: Vec<String>,
    #[serde(default)]
    markers: Vec<MarkerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerEntry {
    id: u16,
    key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileEntry {
    base_step_cost: Option<f32>,
    default_cost: Option<f32>,
    diagonal: Option<f32>,
    #[serde(default)]
    impassable: Vec<String>,
    #[serde(default)]
    costs: BTreeMap<String, f32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkerEntry {
    tags: Vec<String>,
    x: f32,
    y: f32,
    #[serde(default)]
    radius: f32,
}

/// Validated scenario ready to be turned into a world.
#[derive(Debug)]
pub(crate) struct Scenario {
    layers: LayerRegistry,
    layer: LayerId,
    rows: Vec<Vec<char>>,
    legend: BTreeMap<char, TerrainClass>,
    profile: MovementCostProfile,
    markers: Vec<MarkerEntry>,
    goals: Vec<String>,
    radius: Option<f32>,
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Parses and validates scenario TOML.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let file: ScenarioFile =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if file.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                file.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }

        let layers = if file.layers.is_empty() {
            LayerRegistry::standard()
        } else {
            LayerRegistry::new(
                file.layers
                    .into_iter()
                    .map(|entry| MapLayer::new(LayerId::new(entry.id), entry.key))
                    .collect(),
            )
            .context("invalid layer table")?
        };
        let layer = LayerId::new(file.layer);
        ensure!(
            layers.contains(layer),
            "map layer {} is not declared in the layer table",
            file.layer
        );

        let legend = parse_legend(&file.legend)?;
        let rows = parse_rows(&file.map, &legend)?;
        let profile = parse_profile(&file.profile, &legend)?;

        Ok(Self {
            layers,
            layer,
            rows,
            legend,
            profile,
            markers: file.markers,
            goals: file.goals,
            radius: file.radius,
        })
    }

    /// Layer the map is painted on.
    pub(crate) fn layer(&self) -> LayerId {
        self.layer
    }

    /// Default search radius, if the scenario provides one.
    pub(crate) fn radius(&self) -> Option<f32> {
        self.radius
    }

    /// Goal tags in priority order.
    pub(crate) fn goals(&self) -> impl Iterator<Item = GoalClassification> + '_ {
        self.goals.iter().map(GoalClassification::tag)
    }

    /// Movement cost profile described by the scenario.
    pub(crate) fn profile(&self) -> &MovementCostProfile {
        &self.profile
    }

    /// Glyph rows of the map, north first.
    pub(crate) fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    /// Builds the world, returning it with every event its setup emitted.
    pub(crate) fn build_world(&self) -> Result<(World, Vec<Event>)> {
        let width = self.rows.first().map_or(0, Vec::len);
        let dimensions = GridDimensions::new(
            u32::try_from(width).context("map is too wide")?,
            u32::try_from(self.rows.len()).context("map is too tall")?,
            1,
        );
        let mut world = World::new(self.layers.clone(), dimensions);
        let mut events = Vec::new();

        for (y, row) in (0_i32..).zip(&self.rows) {
            for (x, glyph) in (0_i32..).zip(row) {
                let Some(terrain) = self.legend.get(glyph) else {
                    bail!("glyph {glyph:?} at {x},{y} is missing from the legend");
                };
                world::apply(
                    &mut world,
                    Command::SetTerrain {
                        position: GridPosition::new(self.layer, x, y, 0),
                        terrain: *terrain,
                    },
                    &mut events,
                );
            }
        }

        for marker in &self.markers {
            let position = ContinuousPosition::new(self.layer, marker.x, marker.y, 0.0)
                .with_context(|| format!("invalid position for marker {:?}", marker.tags))?;
            let footprint = Footprint::new(marker.radius)
                .with_context(|| format!("invalid radius for marker {:?}", marker.tags))?;
            world::apply(
                &mut world,
                Command::PlaceMarker {
                    tags: marker.tags.clone(),
                    position,
                    footprint,
                },
                &mut events,
            );
        }

        if let Some(reason) = events.iter().find_map(|event| match event {
            Event::CommandRejected { reason } => Some(reason),
            _ => None,
        }) {
            bail!("scenario setup was rejected by the world: {reason:?}");
        }

        Ok((world, events))
    }
}

fn parse_legend(entries: &BTreeMap<String, u16>) -> Result<BTreeMap<char, TerrainClass>> {
    ensure!(!entries.is_empty(), "scenario legend is empty");

    let mut legend = BTreeMap::new();
    for (glyph, terrain) in entries {
        let _ = legend.insert(single_glyph(glyph)?, TerrainClass::new(*terrain));
    }
    Ok(legend)
}

fn parse_rows(map: &[String], legend: &BTreeMap<char, TerrainClass>) -> Result<Vec<Vec<char>>> {
    ensure!(!map.is_empty(), "scenario map has no rows");

    let rows: Vec<Vec<char>> = map.iter().map(|row| row.chars().collect()).collect();
    let width = rows.first().map_or(0, Vec::len);
    ensure!(width > 0, "scenario map rows are empty");

    for (y, row) in rows.iter().enumerate() {
        if row.len() != width {
            bail!("map row {y} has {} cells; expected {width}", row.len());
        }
        if let Some(glyph) = row.iter().find(|glyph| !legend.contains_key(glyph)) {
            bail!("map row {y} uses glyph {glyph:?} missing from the legend");
        }
    }

    Ok(rows)
}

fn parse_profile(
    entry: &ProfileEntry,
    legend: &BTreeMap<char, TerrainClass>,
) -> Result<MovementCostProfile> {
    let mut builder = MovementCostProfile::builder();
    if let Some(cost) = entry.base_step_cost {
        builder = builder.base_step_cost(cost);
    }
    if let Some(cost) = entry.default_cost {
        builder = builder.default_cost(cost);
    }
    if let Some(multiplier) = entry.diagonal {
        builder = builder.diagonal(DiagonalMovement::Allowed { multiplier });
    }
    for (glyph, cost) in &entry.costs {
        builder = builder.terrain_cost(terrain_of(glyph, legend)?, *cost);
    }
    for glyph in &entry.impassable {
        builder = builder.impassable(terrain_of(glyph, legend)?);
    }

    builder.build().context("invalid movement cost profile")
}

fn terrain_of(glyph: &str, legend: &BTreeMap<char, TerrainClass>) -> Result<TerrainClass> {
    let glyph = single_glyph(glyph)?;
    legend
        .get(&glyph)
        .copied()
        .with_context(|| format!("profile names glyph {glyph:?} missing from the legend"))
}

fn single_glyph(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), None) => Ok(glyph),
        _ => bail!("legend key {value:?} must be exactly one character"),
    }
}
