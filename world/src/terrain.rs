//! Dense terrain storage used by the world crate.

use wayfarer_core::{GridPosition, LayerId, TerrainClass};

use crate::GridDimensions;

/// Row-major terrain grid for a single layer.
///
/// Cells are laid out by elevation, then row, then column, matching the
/// order in which terrain goals are resolved.
#[derive(Clone, Debug)]
pub(crate) struct TerrainGrid {
    dimensions: GridDimensions,
    cells: Vec<TerrainClass>,
}

impl TerrainGrid {
    /// Creates a grid filled with the provided terrain.
    pub(crate) fn filled(dimensions: GridDimensions, terrain: TerrainClass) -> Self {
        Self {
            dimensions,
            cells: vec![terrain; dimensions.cell_count()],
        }
    }

    /// Terrain stored for the cell, if it lies within the grid.
    #[must_use]
    pub(crate) fn get(&self, position: GridPosition) -> Option<TerrainClass> {
        index(self.dimensions, position).and_then(|offset| self.cells.get(offset).copied())
    }

    /// Replaces the terrain of the cell, returning the previous value.
    pub(crate) fn set(
        &mut self,
        position: GridPosition,
        terrain: TerrainClass,
    ) -> Option<TerrainClass> {
        let offset = index(self.dimensions, position)?;
        let slot = self.cells.get_mut(offset)?;
        Some(std::mem::replace(slot, terrain))
    }

    /// Appends every cell holding the terrain, in storage order.
    pub(crate) fn collect_matching(
        &self,
        layer: LayerId,
        terrain: TerrainClass,
        out: &mut Vec<GridPosition>,
    ) {
        let width = self.dimensions.width() as usize;
        let height = self.dimensions.height() as usize;
        if width == 0 || height == 0 {
            return;
        }

        for (offset, cell) in self.cells.iter().enumerate() {
            if *cell != terrain {
                continue;
            }

            let x = offset % width;
            let y = (offset / width) % height;
            let z = offset / (width * height);
            out.push(GridPosition::new(
                layer,
                x as i32,
                y as i32,
                z as i32,
            ));
        }
    }
}

fn index(dimensions: GridDimensions, position: GridPosition) -> Option<usize> {
    if !dimensions.contains(position) {
        return None;
    }

    let width = usize::try_from(dimensions.width()).ok()?;
    let height = usize::try_from(dimensions.height()).ok()?;
    let x = usize::try_from(position.x()).ok()?;
    let y = usize::try_from(position.y()).ok()?;
    let z = usize::try_from(position.z()).ok()?;
    z.checked_mul(height)?
        .checked_add(y)?
        .checked_mul(width)?
        .checked_add(x)
}
