//! Immutable, reusable finders produced by the builders.

use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;
use wayfarer_core::{GridPosition, WorldQuery};

use crate::{
    builder::{AvoidanceBuilder, SeekBuilder},
    engine::{self, Bounds, Searched},
    GoalRegistry, MovementCostProfile, SearchOutcome,
};

/// Configuration snapshot owned by a finder.
#[derive(Clone, Debug)]
pub struct FinderConfig {
    profile: Arc<MovementCostProfile>,
    goals: GoalRegistry,
    radius: f32,
    expansion_limit: Option<usize>,
}

impl FinderConfig {
    pub(crate) fn new(
        profile: Arc<MovementCostProfile>,
        goals: GoalRegistry,
        radius: f32,
        expansion_limit: Option<usize>,
    ) -> Self {
        Self {
            profile,
            goals,
            radius,
            expansion_limit,
        }
    }

    /// Movement cost profile used as edge weights.
    #[must_use]
    pub fn profile(&self) -> &MovementCostProfile {
        &self.profile
    }

    /// Goal classifications in priority order.
    #[must_use]
    pub fn goals(&self) -> &GoalRegistry {
        &self.goals
    }

    /// Largest accumulated cost a search explores.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Largest number of nodes a single expansion settles, if bounded.
    #[must_use]
    pub const fn expansion_limit(&self) -> Option<usize> {
        self.expansion_limit
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            radius: self.radius,
            expansion_limit: self.expansion_limit,
        }
    }

    fn run<W, S>(
        &self,
        kind: &'static str,
        world: &W,
        start: GridPosition,
        search: S,
    ) -> SearchOutcome
    where
        W: WorldQuery + ?Sized,
        S: FnOnce(
            &W,
            &MovementCostProfile,
            &BTreeMap<GridPosition, usize>,
            GridPosition,
            Bounds,
        ) -> Searched,
    {
        let goals = self.goals.resolve(world, start);
        let Searched {
            outcome,
            expanded,
            truncated,
        } = search(world, self.profile(), &goals, start, self.bounds());

        debug!(
            kind,
            ?start,
            radius = self.radius,
            goal_cells = goals.len(),
            expanded,
            truncated,
            found = outcome.is_found(),
            cost = outcome.path().map(|path| path.cost()),
            "search finished"
        );

        outcome
    }
}

/// Finder that moves towards the cheapest reachable goal.
#[derive(Clone, Debug)]
pub struct SeekFinder {
    config: FinderConfig,
}

impl SeekFinder {
    pub(crate) fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Starts configuring a seek finder.
    #[must_use]
    pub fn builder() -> SeekBuilder {
        SeekBuilder::new()
    }

    /// Configuration the finder was built with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Plans the cheapest path from `start` to any goal within the radius.
    ///
    /// Goals are resolved against `world` on every call, so moving goals are
    /// followed without rebuilding the finder.
    pub fn search<W>(&self, world: &W, start: GridPosition) -> SearchOutcome
    where
        W: WorldQuery + ?Sized,
    {
        self.config.run("seek", world, start, engine::seek)
    }
}

/// Finder that flees to the reachable cell farthest from every goal.
#[derive(Clone, Debug)]
pub struct AvoidanceFinder {
    config: FinderConfig,
}

impl AvoidanceFinder {
    pub(crate) fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Starts configuring an avoidance finder.
    #[must_use]
    pub fn builder() -> AvoidanceBuilder {
        AvoidanceBuilder::new()
    }

    /// Configuration the finder was built with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Picks the safest cell reachable from `start` within the radius.
    ///
    /// Safety is the cost-distance to the nearest goal; the start itself is
    /// always a candidate, so the outcome is only
    /// [`SearchOutcome::NoSafeCellFound`] when `start` lies outside the world.
    pub fn search<W>(&self, world: &W, start: GridPosition) -> SearchOutcome
    where
        W: WorldQuery + ?Sized,
    {
        self.config.run("avoidance", world, start, engine::avoid)
    }
}

/// Any configured finder.
#[derive(Clone, Debug)]
pub enum Finder {
    /// Goal-seeking finder.
    Seek(SeekFinder),
    /// Goal-avoiding finder.
    Avoidance(AvoidanceFinder),
}

impl Finder {
    /// Runs the wrapped finder.
    pub fn search<W>(&self, world: &W, start: GridPosition) -> SearchOutcome
    where
        W: WorldQuery + ?Sized,
    {
        match self {
            Self::Seek(finder) => finder.search(world, start),
            Self::Avoidance(finder) => finder.search(world, start),
        }
    }

    /// Configuration of the wrapped finder.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        match self {
            Self::Seek(finder) => finder.config(),
            Self::Avoidance(finder) => finder.config(),
        }
    }
}

impl From<SeekFinder> for Finder {
    fn from(finder: SeekFinder) -> Self {
        Self::Seek(finder)
    }
}

impl From<AvoidanceFinder> for Finder {
    fn from(finder: AvoidanceFinder) -> Self {
        Self::Avoidance(finder)
    }
}
