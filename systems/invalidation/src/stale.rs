//! Lazy staleness tracking for caches subscribed to the hub.

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use wayfarer_core::{GridPosition, LayerId};

use crate::hub::{DirtyListener, ListenerError};

/// Set of cells whose cached data must be recomputed before next use.
///
/// Recording is idempotent, so duplicate notifications for one cell collapse
/// into a single stale entry.
#[derive(Debug, Default)]
pub struct StaleCells {
    layer: Option<LayerId>,
    cells: Mutex<BTreeSet<GridPosition>>,
}

impl StaleCells {
    /// Creates a tracker that records cells on every layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker that ignores cells outside the provided layer.
    #[must_use]
    pub fn for_layer(layer: LayerId) -> Self {
        Self {
            layer: Some(layer),
            cells: Mutex::default(),
        }
    }

    /// Reports whether the cell has been marked since the last drain.
    #[must_use]
    pub fn is_stale(&self, position: GridPosition) -> bool {
        self.lock().contains(&position)
    }

    /// Number of distinct stale cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Reports whether no cell is stale.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes and returns the stale cells in ascending order.
    #[must_use]
    pub fn drain(&self) -> Vec<GridPosition> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    /// Forgets every stale cell.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<GridPosition>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DirtyListener for StaleCells {
    fn mark_dirty(&self, position: GridPosition) -> Result<(), ListenerError> {
        if self.layer.map_or(true, |layer| layer == position.layer()) {
            let _ = self.lock().insert(position);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_marks_collapse() {
        let stale = StaleCells::new();
        let cell = GridPosition::new(LayerId::GROUND, 2, 3, 0);

        stale.mark_dirty(cell).expect("recording never fails");
        stale.mark_dirty(cell).expect("recording never fails");

        assert_eq!(stale.len(), 1);
        assert!(stale.is_stale(cell));
        assert_eq!(stale.drain(), vec![cell]);
        assert!(stale.is_empty());
    }

    #[test]
    fn layer_filter_ignores_other_layers() {
        let stale = StaleCells::for_layer(LayerId::ACTOR);

        stale
            .mark_dirty(GridPosition::new(LayerId::GROUND, 0, 0, 0))
            .expect("recording never fails");
        stale
            .mark_dirty(GridPosition::new(LayerId::ACTOR, 0, 0, 0))
            .expect("recording never fails");

        assert_eq!(
            stale.drain(),
            vec![GridPosition::new(LayerId::ACTOR, 0, 0, 0)]
        );
    }
}
