//! Ordered goal classifications accumulated during builder configuration.

use std::collections::BTreeMap;

use wayfarer_core::{GoalClassification, GridPosition, WorldQuery};

/// Ordered, duplicate-free list of goal classifications.
///
/// The registration order is the priority order used to break ties between
/// goals reached at the same cost.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoalRegistry {
    classifications: Vec<GoalClassification>,
}

impl GoalRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            classifications: Vec::new(),
        }
    }

    /// Appends a classification, returning `false` when it was already present.
    ///
    /// Duplicates keep the priority of their first registration.
    pub fn register(&mut self, classification: GoalClassification) -> bool {
        if self.classifications.contains(&classification) {
            return false;
        }

        self.classifications.push(classification);
        true
    }

    /// Priority of the classification, lower values win ties.
    #[must_use]
    pub fn priority_of(&self, classification: &GoalClassification) -> Option<usize> {
        self.classifications
            .iter()
            .position(|candidate| candidate == classification)
    }

    /// Iterates over the classifications in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &GoalClassification> {
        self.classifications.iter()
    }

    /// Number of registered classifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classifications.len()
    }

    /// Reports whether no classification has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty()
    }

    /// Resolves the classifications into goal cells on the plane of `origin`.
    ///
    /// Each cell maps to the priority of the first classification that
    /// produced it. Cells on other layers or z-levels are discarded because
    /// the search never leaves the plane it starts on.
    pub(crate) fn resolve<W>(
        &self,
        world: &W,
        origin: GridPosition,
    ) -> BTreeMap<GridPosition, usize>
    where
        W: WorldQuery + ?Sized,
    {
        let mut resolved = BTreeMap::new();
        let mut cells = Vec::new();

        for (priority, classification) in self.classifications.iter().enumerate() {
            cells.clear();
            world.resolve_goal(classification, &mut cells);

            for cell in cells.drain(..) {
                if cell.layer() != origin.layer() || cell.z() != origin.z() {
                    continue;
                }
                let _ = resolved.entry(cell).or_insert(priority);
            }
        }

        resolved
    }
}
