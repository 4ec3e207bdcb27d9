//! Immutable movement cost profiles.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use wayfarer_core::TerrainClass;

/// Whether a profile allows diagonal steps and how much they cost.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DiagonalMovement {
    /// Only the four cardinal neighbours are reachable.
    Disallowed,
    /// Diagonal neighbours are reachable at a scaled cost.
    Allowed {
        /// Factor applied to diagonal steps, typically `√2`.
        multiplier: f32,
    },
}

/// Result of looking up a terrain classification in a profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraversalCost {
    /// The terrain may be entered at the given multiplier.
    Passable(f32),
    /// The terrain contributes no edges.
    Impassable,
}

/// Per-entity terrain weighting used as edge weights during search.
///
/// Profiles are validated on construction and never change afterwards, so a
/// single instance is shared by every finder built from it.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementCostProfile {
    base_step_cost: f32,
    default_cost: f32,
    terrain_costs: BTreeMap<TerrainClass, f32>,
    impassable: BTreeSet<TerrainClass>,
    diagonal: DiagonalMovement,
}

impl MovementCostProfile {
    /// Starts building a profile with unit costs and no diagonal movement.
    #[must_use]
    pub fn builder() -> MovementCostProfileBuilder {
        MovementCostProfileBuilder::default()
    }

    /// Profile where every terrain costs one unit per cardinal step.
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            base_step_cost: 1.0,
            default_cost: 1.0,
            terrain_costs: BTreeMap::new(),
            impassable: BTreeSet::new(),
            diagonal: DiagonalMovement::Disallowed,
        }
    }

    /// Multiplier applied when entering the terrain.
    #[must_use]
    pub fn cost_of(&self, terrain: TerrainClass) -> TraversalCost {
        if self.impassable.contains(&terrain) {
            return TraversalCost::Impassable;
        }

        TraversalCost::Passable(
            self.terrain_costs
                .get(&terrain)
                .copied()
                .unwrap_or(self.default_cost),
        )
    }

    /// Cost of a single step into the terrain, or `None` when impassable.
    ///
    /// Diagonal steps return `None` when the profile disallows them.
    #[must_use]
    pub fn step_cost(&self, terrain: TerrainClass, diagonal: bool) -> Option<f32> {
        let TraversalCost::Passable(multiplier) = self.cost_of(terrain) else {
            return None;
        };

        let diagonal_factor = match (diagonal, self.diagonal) {
            (false, _) => 1.0,
            (true, DiagonalMovement::Allowed { multiplier }) => multiplier,
            (true, DiagonalMovement::Disallowed) => return None,
        };

        Some(self.base_step_cost * multiplier * diagonal_factor)
    }

    /// Reports whether the terrain can be entered at all.
    #[must_use]
    pub fn is_passable(&self, terrain: TerrainClass) -> bool {
        !self.impassable.contains(&terrain)
    }

    /// Cost of a cardinal step across terrain with a unit multiplier.
    #[must_use]
    pub const fn base_step_cost(&self) -> f32 {
        self.base_step_cost
    }

    /// Diagonal movement policy.
    #[must_use]
    pub const fn diagonal(&self) -> DiagonalMovement {
        self.diagonal
    }

    /// Reports whether diagonal neighbours are expanded.
    #[must_use]
    pub const fn allows_diagonal(&self) -> bool {
        matches!(self.diagonal, DiagonalMovement::Allowed { .. })
    }
}

impl Default for MovementCostProfile {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Incrementally describes a [`MovementCostProfile`].
#[derive(Clone, Debug)]
pub struct MovementCostProfileBuilder {
    profile: MovementCostProfile,
}

impl Default for MovementCostProfileBuilder {
    fn default() -> Self {
        Self {
            profile: MovementCostProfile::uniform(),
        }
    }
}

impl MovementCostProfileBuilder {
    /// Sets the cost of a cardinal step across unit-cost terrain.
    #[must_use]
    pub fn base_step_cost(mut self, cost: f32) -> Self {
        self.profile.base_step_cost = cost;
        self
    }

    /// Sets the multiplier used for terrain without an explicit entry.
    #[must_use]
    pub fn default_cost(mut self, multiplier: f32) -> Self {
        self.profile.default_cost = multiplier;
        self
    }

    /// Sets the multiplier for one terrain classification.
    #[must_use]
    pub fn terrain_cost(mut self, terrain: TerrainClass, multiplier: f32) -> Self {
        let _ = self.profile.terrain_costs.insert(terrain, multiplier);
        self
    }

    /// Marks a terrain classification as impassable, overriding any cost.
    #[must_use]
    pub fn impassable(mut self, terrain: TerrainClass) -> Self {
        let _ = self.profile.impassable.insert(terrain);
        self
    }

    /// Sets the diagonal movement policy.
    #[must_use]
    pub fn diagonal(mut self, diagonal: DiagonalMovement) -> Self {
        self.profile.diagonal = diagonal;
        self
    }

    /// Validates the description and freezes it into a profile.
    ///
    /// Every cost and multiplier must be finite and strictly positive so
    /// that accumulated path costs grow with each step.
    pub fn build(self) -> Result<MovementCostProfile, ProfileError> {
        let profile = self.profile;
        ensure_positive(CostField::BaseStepCost, profile.base_step_cost)?;
        ensure_positive(CostField::DefaultCost, profile.default_cost)?;
        for (terrain, multiplier) in &profile.terrain_costs {
            ensure_positive(CostField::Terrain(*terrain), *multiplier)?;
        }
        if let DiagonalMovement::Allowed { multiplier } = profile.diagonal {
            ensure_positive(CostField::Diagonal, multiplier)?;
        }
        Ok(profile)
    }
}

fn ensure_positive(field: CostField, value: f32) -> Result<(), ProfileError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProfileError::NonPositive { field, value })
    }
}

/// Field of a profile that failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostField {
    /// The base step cost.
    BaseStepCost,
    /// The multiplier for unlisted terrain.
    DefaultCost,
    /// The multiplier of a specific terrain classification.
    Terrain(TerrainClass),
    /// The diagonal step multiplier.
    Diagonal,
}

/// Reasons a profile description can be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ProfileError {
    /// A cost or multiplier was zero, negative, NaN or infinite.
    #[error("{field:?} must be finite and positive (received {value})")]
    NonPositive {
        /// Field holding the offending value.
        field: CostField,
        /// Offending value.
        value: f32,
    },
}
