use std::iter::FusedIterator;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::Vec2;

// ----------------------------------------------
// Cell
// ----------------------------------------------

// X,Y position in the terrain grid of cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    #[inline]
    pub const fn invalid() -> Self {
        Self { x: -1, y: -1 }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    // True when `other` is one of the 8 surrounding cells.
    #[inline]
    pub fn is_neighbor(&self, other: Cell) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx + dy) != 0
    }

    // True when `other` shares an edge (not just a corner) with this cell.
    #[inline]
    pub fn is_cardinal_neighbor(&self, other: Cell) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        (dx + dy) == 1
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

// ----------------------------------------------
// CellRange
// ----------------------------------------------

#[derive(Copy, Clone)]
pub struct CellRange {
    // Inclusive range, e.g.: [start..=end]
    pub start: Cell,
    pub end: Cell,
}

impl CellRange {
    #[inline]
    pub const fn new(start: Cell, end: Cell) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.end.is_valid() &&
        self.start.x <= self.end.x && self.start.y <= self.end.y
    }

    #[inline]
    pub fn x_range(&self) -> RangeInclusive<i32> {
        self.start.x..=self.end.x
    }

    #[inline]
    pub fn y_range(&self) -> RangeInclusive<i32> {
        self.start.y..=self.end.y
    }

    #[inline]
    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter::new(*self)
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        if cell.x < self.start.x || cell.y < self.start.y {
            return false;
        }
        if cell.x > self.end.x || cell.y > self.end.y {
            return false;
        }
        true
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{},{}; {},{}]",
               self.start.x,
               self.start.y,
               self.end.x,
               self.end.y)
    }
}

// ----------------------------------------------
// CellRangeIter
// ----------------------------------------------

#[derive(Copy, Clone)]
pub struct CellRangeIter {
    range:  CellRange,
    curr_y: i32,
    curr_x: i32,
    done:   bool,
}

impl CellRangeIter {
    #[inline]
    pub fn new(range: CellRange) -> Self {
        Self {
            range,
            curr_y: range.start.y,
            curr_x: range.start.x,
            // An inverted range (end < start, e.g. from a zero-sized
            // footprint) contains no cells, not one.
            done: range.end.x < range.start.x || range.end.y < range.start.y,
        }
    }
}

impl Iterator for CellRangeIter {
    type Item = Cell;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = Cell {
            x: self.curr_x,
            y: self.curr_y,
        };

        // Determine next x,y:
        if self.curr_x < self.range.end.x {
            self.curr_x += 1;
        } else if self.curr_y < self.range.end.y {
            self.curr_y += 1;
            self.curr_x = self.range.start.x;
        } else {
            self.done = true;
        }

        Some(result)
    }
}

impl FusedIterator for CellRangeIter {}

// Support for-each style iteration.
impl IntoIterator for &CellRange {
    type Item = Cell;
    type IntoIter = CellRangeIter;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// +-----------------------------------------------+
// |     COORDINATE SPACE TRANSFORMS REFERENCE     |
// +-----------------------------------------------+
// | Operation            | Function               |
// | -------------------- | ---------------------- |
// | World -> Cell        | world_to_cell()        |
// | Cell  -> World       | cell_to_world_center() |
// +-----------------------------------------------+

// Maps a world space point to the cell containing it.
// Cells are squares of `cell_size` world units.
#[inline]
pub fn world_to_cell(world_point: Vec2, cell_size: f32) -> Cell {
    debug_assert!(cell_size > 0.0);
    let cell_x = (world_point.x / cell_size).floor() as i32;
    let cell_y = (world_point.y / cell_size).floor() as i32;
    Cell::new(cell_x, cell_y)
}

// Maps a cell to the world space point at its center.
#[inline]
pub fn cell_to_world_center(cell: Cell, cell_size: f32) -> Vec2 {
    debug_assert!(cell_size > 0.0);
    let world_x = ((cell.x as f32) + 0.5) * cell_size;
    let world_y = ((cell.y as f32) + 0.5) * cell_size;
    Vec2::new(world_x, world_y)
}
