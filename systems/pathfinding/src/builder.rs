//! Single-use builders that validate configuration and produce finders.

use std::{fmt, marker::PhantomData, sync::Arc};

use thiserror::Error;
use tracing::debug;
use wayfarer_core::{GoalClassification, GoalKind};

use crate::{
    finder::{AvoidanceFinder, FinderConfig, SeekFinder},
    GoalRegistry, MovementCostProfile,
};

/// Lifecycle of a builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing has been configured yet.
    Unconfigured,
    /// At least one setting has been provided.
    Configuring,
    /// A finder has been produced; the builder refuses further use.
    Built,
}

/// Reasons a builder refuses to produce a finder.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// No search radius was provided.
    #[error("search radius was never set")]
    MissingRadius,
    /// The search radius is NaN, infinite, zero or negative.
    #[error("search radius must be finite and positive (received {0})")]
    InvalidRadius(f32),
    /// No goal classification was registered.
    #[error("at least one goal classification is required")]
    MissingGoal,
    /// The expansion limit would stop the search before it settles the start.
    #[error("expansion limit must be at least one")]
    ZeroExpansionLimit,
}

/// Errors reported by finder builders.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum FinderError {
    /// The accumulated configuration is incomplete or invalid.
    #[error("invalid finder configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    /// The builder already produced a finder.
    #[error("builder has already produced a finder")]
    InvalidBuilderState,
}

/// Finder types that can be produced from a validated configuration.
pub trait BuildFinder: Sized {
    /// Name used in diagnostics.
    const KIND: &'static str;

    /// Wraps the configuration into the finder.
    fn from_config(config: FinderConfig) -> Self;
}

impl BuildFinder for SeekFinder {
    const KIND: &'static str = "seek";

    fn from_config(config: FinderConfig) -> Self {
        Self::new(config)
    }
}

impl BuildFinder for AvoidanceFinder {
    const KIND: &'static str = "avoidance";

    fn from_config(config: FinderConfig) -> Self {
        Self::new(config)
    }
}

/// Builder producing a [`SeekFinder`].
pub type SeekBuilder = FinderBuilder<SeekFinder>;

/// Builder producing an [`AvoidanceFinder`].
pub type AvoidanceBuilder = FinderBuilder<AvoidanceFinder>;

/// Configuration front end shared by every finder kind.
///
/// Settings may be provided in any order and repeated; the last radius wins
/// and goal classifications accumulate in registration order. A failed
/// [`FinderBuilder::build`] leaves the builder untouched so the caller can
/// correct it, while a successful one consumes it for good.
pub struct FinderBuilder<F> {
    state: BuilderState,
    radius: Option<f32>,
    goals: GoalRegistry,
    expansion_limit: Option<usize>,
    finder: PhantomData<fn() -> F>,
}

impl<F> FinderBuilder<F>
where
    F: BuildFinder,
{
    /// Creates an unconfigured builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BuilderState::Unconfigured,
            radius: None,
            goals: GoalRegistry::new(),
            expansion_limit: None,
            finder: PhantomData,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BuilderState {
        self.state
    }

    /// Bounds the accumulated cost a search may explore.
    pub fn with_search_radius(&mut self, radius: f32) -> Result<&mut Self, FinderError> {
        self.configure()?;
        self.radius = Some(radius);
        Ok(self)
    }

    /// Adds a goal classification.
    pub fn with_goal(
        &mut self,
        classification: GoalClassification,
    ) -> Result<&mut Self, FinderError> {
        self.configure()?;
        let _ = self.goals.register(classification);
        Ok(self)
    }

    /// Adds the classification associated with a goal type.
    pub fn with_goal_kind<T>(&mut self) -> Result<&mut Self, FinderError>
    where
        T: GoalKind,
    {
        self.with_goal(T::classification())
    }

    /// Caps the number of nodes a single expansion may settle.
    pub fn with_expansion_limit(&mut self, limit: usize) -> Result<&mut Self, FinderError> {
        self.configure()?;
        self.expansion_limit = Some(limit);
        Ok(self)
    }

    /// Validates the configuration and snapshots it into a finder.
    pub fn build(&mut self, profile: Arc<MovementCostProfile>) -> Result<F, FinderError> {
        if self.state == BuilderState::Built {
            return Err(FinderError::InvalidBuilderState);
        }

        let radius = match self.radius {
            None => return Err(ConfigurationError::MissingRadius.into()),
            Some(radius) if !radius.is_finite() || radius <= 0.0 => {
                return Err(ConfigurationError::InvalidRadius(radius).into());
            }
            Some(radius) => radius,
        };
        if self.goals.is_empty() {
            return Err(ConfigurationError::MissingGoal.into());
        }
        if self.expansion_limit == Some(0) {
            return Err(ConfigurationError::ZeroExpansionLimit.into());
        }

        self.state = BuilderState::Built;
        debug!(
            kind = F::KIND,
            radius,
            goals = self.goals.len(),
            expansion_limit = ?self.expansion_limit,
            "built finder"
        );

        Ok(F::from_config(FinderConfig::new(
            profile,
            std::mem::take(&mut self.goals),
            radius,
            self.expansion_limit,
        )))
    }

    fn configure(&mut self) -> Result<(), FinderError> {
        match self.state {
            BuilderState::Built => Err(FinderError::InvalidBuilderState),
            BuilderState::Unconfigured | BuilderState::Configuring => {
                self.state = BuilderState::Configuring;
                Ok(())
            }
        }
    }
}

impl<F> Default for FinderBuilder<F>
where
    F: BuildFinder,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for FinderBuilder<F>
where
    F: BuildFinder,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderBuilder")
            .field("kind", &F::KIND)
            .field("state", &self.state)
            .field("radius", &self.radius)
            .field("goals", &self.goals)
            .field("expansion_limit", &self.expansion_limit)
            .finish()
    }
}
