#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs seek and avoidance searches over a scenario.

mod report;
mod scenario;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wayfarer_core::{GoalClassification, GridPosition, LayerId};
use wayfarer_system_invalidation::{DirtyRegionHub, Invalidation, StaleCells};
use wayfarer_system_pathfinding::{
    AvoidanceBuilder, BuildFinder, Finder, FinderBuilder, SeekBuilder,
};

use crate::scenario::Scenario;

/// Plans seek and avoidance paths over a grid scenario.
#[derive(Debug, Parser)]
#[command(name = "wayfarer", version)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Walks towards the cheapest reachable goal.
    Seek(SearchArgs),
    /// Flees to the reachable cell farthest from every goal.
    Avoid(SearchArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Scenario file describing the map, cost profile and markers.
    #[arg(long)]
    scenario: PathBuf,

    /// Start cell as `x,y`.
    #[arg(long, value_parser = parse_cell)]
    start: (i32, i32),

    /// Layer the search runs on; defaults to the scenario's map layer.
    #[arg(long)]
    layer: Option<u16>,

    /// Largest accumulated cost to explore; defaults to the scenario's radius.
    #[arg(long)]
    radius: Option<f32>,

    /// Goal tag, repeatable; replaces the scenario's goals.
    #[arg(long = "goal")]
    goals: Vec<String>,

    /// Caps the number of nodes a single expansion may settle.
    #[arg(long)]
    expansion_limit: Option<usize>,

    /// Prints the map with the path overlaid.
    #[arg(long)]
    draw: bool,
}

/// Entry point for the Wayfarer command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match &cli.mode {
        Mode::Seek(args) => run(args, false)?,
        Mode::Avoid(args) => run(args, true)?,
    };
    print!("{output}");
    Ok(())
}

fn run(args: &SearchArgs, avoidance: bool) -> Result<String> {
    let scenario = Scenario::load(&args.scenario)?;
    let (world, events) = scenario.build_world()?;

    let hub = DirtyRegionHub::new();
    let painted = Arc::new(StaleCells::new());
    let _ = hub.subscribe(&painted);
    let dispatched = Invalidation::new().handle(&events, &hub);
    debug!(
        cells = dispatched.cells,
        stale = painted.len(),
        "scenario setup dirtied the map"
    );

    let radius = args
        .radius
        .or(scenario.radius())
        .context("no search radius given; pass --radius or set `radius` in the scenario")?;
    let finder = if avoidance {
        Finder::from(configure(AvoidanceBuilder::new(), args, &scenario, radius)?)
    } else {
        Finder::from(configure(SeekBuilder::new(), args, &scenario, radius)?)
    };

    let layer = args.layer.map_or(scenario.layer(), LayerId::new);
    let (x, y) = args.start;
    let start = GridPosition::new(layer, x, y, 0);
    info!(?start, radius, avoidance, "running search");

    let outcome = finder.search(&world, start);
    let mut output = report::describe(&outcome, avoidance);
    if args.draw {
        if let Some(path) = outcome.path() {
            output.push_str(&report::draw(scenario.rows(), path));
        }
    }
    Ok(output)
}

fn configure<F>(
    mut builder: FinderBuilder<F>,
    args: &SearchArgs,
    scenario: &Scenario,
    radius: f32,
) -> Result<F>
where
    F: BuildFinder,
{
    let _ = builder.with_search_radius(radius)?;
    if args.goals.is_empty() {
        for goal in scenario.goals() {
            let _ = builder.with_goal(goal)?;
        }
    } else {
        for goal in &args.goals {
            let _ = builder.with_goal(GoalClassification::tag(goal.as_str()))?;
        }
    }
    if let Some(limit) = args.expansion_limit {
        let _ = builder.with_expansion_limit(limit)?;
    }

    builder
        .build(Arc::new(scenario.profile().clone()))
        .context("failed to configure finder")
}

fn parse_cell(value: &str) -> Result<(i32, i32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, received `{value}`"))?;
    let x = x
        .trim()
        .parse()
        .map_err(|_| format!("invalid x coordinate `{x}`"))?;
    let y = y
        .trim()
        .parse()
        .map_err(|_| format!("invalid y coordinate `{y}`"))?;
    Ok((x, y))
}
