#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Goal-directed path finding over a weighted grid.
//!
//! Movement planning code configures a [`SeekBuilder`] or an
//! [`AvoidanceBuilder`] with a search radius and goal classifications, then
//! builds an immutable finder against a shared [`MovementCostProfile`]. The
//! finder reads the world through [`wayfarer_core::WorldQuery`] and may be
//! reused from any number of threads.

mod builder;
mod engine;
mod finder;
mod goals;
mod outcome;
mod profile;

pub use builder::{
    AvoidanceBuilder, BuildFinder, BuilderState, ConfigurationError, FinderBuilder, FinderError,
    SeekBuilder,
};
pub use finder::{AvoidanceFinder, Finder, FinderConfig, SeekFinder};
pub use goals::GoalRegistry;
pub use outcome::{Path, SearchOutcome};
pub use profile::{
    CostField, DiagonalMovement, MovementCostProfile, MovementCostProfileBuilder, ProfileError,
    TraversalCost,
};
