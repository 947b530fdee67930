use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use crate::utils::{Size, coords::Cell};

// Movement cost sentinel returned for out-of-bounds queries.
// Callers are expected to bounds-check first; this only exists
// so an out-of-bounds lookup can never produce a cheap cell.
pub const INFINITE_COST: f32 = f32::INFINITY;

// ----------------------------------------------
// TerrainClass
// ----------------------------------------------

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum TerrainClass {
    #[default]
    Grass,
    Forest,
    Hills,
    Water,
    Road,
    Obstacle,
}

impl TerrainClass {
    // Base multiplier applied to the distance cost of *entering* a
    // cell of this class. Impassable classes never reach the search,
    // so they carry an ordinary multiplier here.
    #[inline]
    pub fn base_movement_cost(self) -> f32 {
        match self {
            Self::Grass    => 1.0,
            Self::Forest   => 1.5,
            Self::Hills    => 2.0,
            Self::Water    => 1.0,
            Self::Road     => 0.5,
            Self::Obstacle => 1.0,
        }
    }

    #[inline]
    pub fn is_walkable(self) -> bool {
        !matches!(self, Self::Water | Self::Obstacle)
    }

    #[inline]
    pub fn base_height_level(self) -> i32 {
        match self {
            Self::Water => 0,
            Self::Hills => 2,
            _ => 1,
        }
    }
}

// ----------------------------------------------
// TerrainCell
// ----------------------------------------------

// One grid-addressable unit of terrain. Built when the grid is built
// or rebuilt; read-only from the search's point of view.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainCell {
    pub terrain: TerrainClass,
    pub walkable: bool,
    pub movement_cost: f32,
    pub height_level: i32,
}

impl TerrainCell {
    #[inline]
    pub fn from_class(terrain: TerrainClass) -> Self {
        Self {
            terrain,
            walkable: terrain.is_walkable(),
            movement_cost: terrain.base_movement_cost(),
            height_level: terrain.base_height_level(),
        }
    }
}

impl Default for TerrainCell {
    fn default() -> Self {
        Self::from_class(TerrainClass::Grass)
    }
}

// ----------------------------------------------
// GridError
// ----------------------------------------------

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid size {0} is not valid")]
    InvalidSize(Size),

    #[error("no cell data provided")]
    EmptyCells,

    #[error("expected {expected} cells for the grid size, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("cell {index} has invalid movement cost {cost}")]
    InvalidMovementCost { index: usize, cost: f32 },
}

// ----------------------------------------------
// Grid
// ----------------------------------------------

// 2D grid storing a payload per cell, indexable with `grid[cell]`.
// Shared by the terrain grid and the search bookkeeping arrays.
#[derive(Clone)]
pub(crate) struct Grid<T> {
    size: Size,
    cells: Vec<T>, // WxH cells.
}

impl<T> Grid<T> {
    #[inline]
    pub fn new(size: Size, cells: Vec<T>) -> Self {
        debug_assert!(size.is_valid());
        debug_assert!(cells.len() == size.cell_count());
        Self { size, cells }
    }

    #[inline]
    pub fn filled(size: Size, value: T) -> Self where T: Clone {
        Self::new(size, vec![value; size.cell_count()])
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn is_within_bounds(&self, cell: Cell) -> bool {
        if (cell.x < 0 || cell.x >= self.size.width) ||
           (cell.y < 0 || cell.y >= self.size.height) {
            return false;
        }
        true
    }

    #[inline]
    pub fn cell_to_index(&self, cell: Cell) -> Option<usize> {
        if !self.is_within_bounds(cell) {
            return None;
        }
        let index = cell.x + (cell.y * self.size.width);
        Some(index as usize)
    }

    #[inline]
    pub fn try_get(&self, cell: Cell) -> Option<&T> {
        self.cell_to_index(cell).map(|index| &self.cells[index])
    }

    #[inline]
    pub fn fill(&mut self, value: T) where T: Clone {
        self.cells.fill(value);
    }
}

// Immutable indexing
impl<T> Index<Cell> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, cell: Cell) -> &Self::Output {
        let index = self.cell_to_index(cell)
            .unwrap_or_else(|| panic!("Unexpected out-of-bounds grid cell: {}", cell));
        &self.cells[index]
    }
}

// Mutable indexing
impl<T> IndexMut<Cell> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, cell: Cell) -> &mut Self::Output {
        let index = self.cell_to_index(cell)
            .unwrap_or_else(|| panic!("Unexpected out-of-bounds grid cell: {}", cell));
        &mut self.cells[index]
    }
}

// ----------------------------------------------
// CostGrid
// ----------------------------------------------

// The cost-weighted terrain grid the search runs over. Cells are
// replaced in bulk by `rebuild()`; every rebuild and in-place edit
// bumps the generation so cached paths keyed against an older
// grid can be recognized as stale.
#[derive(Clone)]
pub struct CostGrid {
    grid: Grid<TerrainCell>,
    generation: u32,
}

impl CostGrid {
    pub fn with_cells(size: Size, cells: Vec<TerrainCell>) -> Result<Self, GridError> {
        Self::validate(size, &cells)?;
        Ok(Self { grid: Grid::new(size, cells), generation: 0 })
    }

    pub fn from_classes(size: Size, classes: &[TerrainClass]) -> Result<Self, GridError> {
        let cells: Vec<TerrainCell> = classes.iter().map(|class| TerrainCell::from_class(*class)).collect();
        Self::with_cells(size, cells)
    }

    pub fn filled(size: Size, terrain: TerrainClass) -> Result<Self, GridError> {
        if !size.is_valid() {
            return Err(GridError::InvalidSize(size));
        }
        let cells = vec![TerrainCell::from_class(terrain); size.cell_count()];
        Self::with_cells(size, cells)
    }

    // Replaces the entire cell array (terrain regeneration, building
    // placement reshaping passability, etc).
    pub fn rebuild(&mut self, cells: Vec<TerrainCell>) -> Result<(), GridError> {
        let size = self.grid.size();
        Self::validate(size, &cells)?;
        self.grid = Grid::new(size, cells);
        self.generation = self.generation.wrapping_add(1);
        Ok(())
    }

    fn validate(size: Size, cells: &[TerrainCell]) -> Result<(), GridError> {
        if !size.is_valid() {
            return Err(GridError::InvalidSize(size));
        }
        if cells.is_empty() {
            return Err(GridError::EmptyCells);
        }
        if cells.len() != size.cell_count() {
            return Err(GridError::CellCountMismatch {
                expected: size.cell_count(),
                actual: cells.len(),
            });
        }

        // Negative or non-finite costs would poison the search's edge
        // relaxation, so they are rejected here, not mid-search.
        for (index, cell) in cells.iter().enumerate() {
            if !cell.movement_cost.is_finite() || cell.movement_cost < 0.0 {
                return Err(GridError::InvalidMovementCost {
                    index,
                    cost: cell.movement_cost,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.grid.size()
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub fn is_in_bounds(&self, cell: Cell) -> bool {
        self.grid.is_within_bounds(cell)
    }

    #[inline]
    pub fn cell(&self, cell: Cell) -> Option<&TerrainCell> {
        self.grid.try_get(cell)
    }

    // False for out-of-bounds as well as unwalkable cells.
    #[inline]
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.grid.try_get(cell).is_some_and(|terrain_cell| terrain_cell.walkable)
    }

    #[inline]
    pub fn movement_cost(&self, cell: Cell) -> f32 {
        self.grid.try_get(cell)
            .map(|terrain_cell| terrain_cell.movement_cost)
            .unwrap_or(INFINITE_COST)
    }

    #[inline]
    pub fn height_level(&self, cell: Cell) -> Option<i32> {
        self.grid.try_get(cell).map(|terrain_cell| terrain_cell.height_level)
    }

    // In-place edit used by the building/road administrative operations.
    // No-op when out of bounds.
    pub fn set_cell(&mut self, cell: Cell, terrain_cell: TerrainCell) {
        if self.grid.is_within_bounds(cell) {
            self.grid[cell] = terrain_cell;
            self.generation = self.generation.wrapping_add(1);
        }
    }
}

// ----------------------------------------------
// Tests
// ----------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_fails_fast() {
        assert!(matches!(
            CostGrid::with_cells(Size::new(0, 4), vec![TerrainCell::default(); 4]),
            Err(GridError::InvalidSize(_))
        ));

        assert!(matches!(
            CostGrid::with_cells(Size::new(2, 2), Vec::new()),
            Err(GridError::EmptyCells)
        ));

        assert!(matches!(
            CostGrid::with_cells(Size::new(3, 3), vec![TerrainCell::default(); 4]),
            Err(GridError::CellCountMismatch { expected: 9, actual: 4 })
        ));
    }

    #[test]
    fn test_construction_rejects_invalid_movement_cost() {
        let negative = TerrainCell { movement_cost: -1.0, ..TerrainCell::default() };
        assert!(matches!(
            CostGrid::with_cells(Size::new(2, 2), vec![negative; 4]),
            Err(GridError::InvalidMovementCost { index: 0, .. })
        ));

        let mut cells = vec![TerrainCell::default(); 4];
        cells[3].movement_cost = f32::NAN;
        assert!(matches!(
            CostGrid::with_cells(Size::new(2, 2), cells.clone()),
            Err(GridError::InvalidMovementCost { index: 3, .. })
        ));

        // Rebuild applies the same per-cell checks and leaves the grid
        // untouched on rejection.
        let mut grid = CostGrid::filled(Size::new(2, 2), TerrainClass::Grass).unwrap();
        assert!(grid.rebuild(cells).is_err());
        assert_eq!(grid.movement_cost(Cell::new(1, 1)), 1.0);
    }

    #[test]
    fn test_bounds_and_accessors() {
        let grid = CostGrid::filled(Size::new(4, 3), TerrainClass::Grass).unwrap();

        assert!(grid.is_in_bounds(Cell::new(0, 0)));
        assert!(grid.is_in_bounds(Cell::new(3, 2)));
        assert!(!grid.is_in_bounds(Cell::new(4, 0)));
        assert!(!grid.is_in_bounds(Cell::new(0, 3)));
        assert!(!grid.is_in_bounds(Cell::new(-1, 0)));

        assert!(grid.is_passable(Cell::new(1, 1)));
        assert!(!grid.is_passable(Cell::new(-1, -1)));

        assert_eq!(grid.movement_cost(Cell::new(2, 2)), 1.0);
        assert_eq!(grid.movement_cost(Cell::new(9, 9)), INFINITE_COST);
        assert_eq!(grid.height_level(Cell::new(9, 9)), None);
    }

    #[test]
    fn test_water_and_obstacle_are_impassable() {
        let grid = CostGrid::filled(Size::new(2, 2), TerrainClass::Water).unwrap();
        assert!(!grid.is_passable(Cell::new(0, 0)));

        let grid = CostGrid::filled(Size::new(2, 2), TerrainClass::Obstacle).unwrap();
        assert!(!grid.is_passable(Cell::new(1, 1)));
    }

    #[test]
    fn test_rebuild_bumps_generation() {
        let mut grid = CostGrid::filled(Size::new(2, 2), TerrainClass::Grass).unwrap();
        assert_eq!(grid.generation(), 0);

        grid.rebuild(vec![TerrainCell::from_class(TerrainClass::Road); 4]).unwrap();
        assert_eq!(grid.generation(), 1);
        assert_eq!(grid.cell(Cell::new(0, 0)).unwrap().terrain, TerrainClass::Road);

        // Mismatched rebuild is rejected and leaves the grid untouched.
        assert!(grid.rebuild(vec![TerrainCell::default(); 3]).is_err());
        assert_eq!(grid.generation(), 1);

        grid.set_cell(Cell::new(1, 1), TerrainCell::from_class(TerrainClass::Obstacle));
        assert_eq!(grid.generation(), 2);
        assert!(!grid.is_passable(Cell::new(1, 1)));
    }
}
