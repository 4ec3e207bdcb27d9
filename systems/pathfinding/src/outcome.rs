//! Results produced by finders.

use wayfarer_core::GridPosition;

/// Sequence of cells from the start to the chosen destination.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    cells: Vec<GridPosition>,
    cost: f32,
    goal_distance: Option<f32>,
}

impl Path {
    pub(crate) fn new(cells: Vec<GridPosition>, cost: f32, goal_distance: Option<f32>) -> Self {
        debug_assert!(!cells.is_empty(), "paths always contain the start cell");
        Self {
            cells,
            cost,
            goal_distance,
        }
    }

    /// Cells visited, start and destination inclusive.
    #[must_use]
    pub fn cells(&self) -> &[GridPosition] {
        &self.cells
    }

    /// Consumes the path, returning its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<GridPosition> {
        self.cells
    }

    /// First cell of the path.
    #[must_use]
    pub fn start(&self) -> Option<GridPosition> {
        self.cells.first().copied()
    }

    /// Last cell of the path.
    #[must_use]
    pub fn destination(&self) -> Option<GridPosition> {
        self.cells.last().copied()
    }

    /// Number of steps taken, one less than the number of cells.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// Accumulated movement cost from the start to the destination.
    #[must_use]
    pub const fn cost(&self) -> f32 {
        self.cost
    }

    /// Cost-distance from the destination to the nearest goal.
    ///
    /// Only avoidance searches fill this in, and only when some goal can
    /// reach the destination at all.
    #[must_use]
    pub const fn goal_distance(&self) -> Option<f32> {
        self.goal_distance
    }
}

/// Terminal result of a search.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// A destination was selected.
    Path(Path),
    /// A seek search found no goal within its bounds.
    NoPathFound,
    /// An avoidance search could not stand anywhere.
    NoSafeCellFound,
}

impl SearchOutcome {
    /// Path carried by the outcome, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::NoPathFound | Self::NoSafeCellFound => None,
        }
    }

    /// Consumes the outcome, returning its path if any.
    #[must_use]
    pub fn into_path(self) -> Option<Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::NoPathFound | Self::NoSafeCellFound => None,
        }
    }

    /// Reports whether a destination was selected.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Path(_))
    }
}
