use arrayvec::ArrayVec;
use bitflags::bitflags;
use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use strum::Display;

use crate::{
    bitflags_with_display,
    terrain::{CostGrid, Grid},
    utils::{Size, coords::Cell},
};

pub mod cache;
pub mod smooth;


// Useful references and reading material:
//  https://www.redblobgames.com/pathfinding/a-star/introduction.html
//  https://www.redblobgames.com/pathfinding/a-star/implementation.html
//  https://www.redblobgames.com/pathfinding/grids/algorithms.html

// ----------------------------------------------
// Node Costs
// ----------------------------------------------

// Fixed-point path costs: 1000 units = 1 cell of distance.
// Integer costs keep the frontier ordering total and the
// tie-breaking exact across platforms.
pub type NodeCost = i64;

const NODE_COST_ZERO: NodeCost = 0;
const NODE_COST_INFINITE: NodeCost = NodeCost::MAX;

const CARDINAL_COST: NodeCost = 1000;
const DIAGONAL_COST: NodeCost = 1414; // sqrt(2) * 1000

// ----------------------------------------------
// SearchFlags
// ----------------------------------------------

bitflags_with_display! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SearchFlags: u8 {
        const ALLOW_DIAGONAL       = 1 << 0;
        const AVOID_CORNER_CUTTING = 1 << 1;
        const RESPECT_HEIGHT       = 1 << 2;
    }
}

// ----------------------------------------------
// SearchConfig
// ----------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub flags: SearchFlags,

    // Max height level step between two consecutive cells.
    // Only applies when RESPECT_HEIGHT is set.
    pub max_height_diff: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            flags: SearchFlags::ALLOW_DIAGONAL | SearchFlags::AVOID_CORNER_CUTTING,
            max_height_diff: 1,
        }
    }
}

impl SearchConfig {
    #[inline]
    pub fn allow_diagonal(&self) -> bool {
        self.flags.contains(SearchFlags::ALLOW_DIAGONAL)
    }

    #[inline]
    pub fn avoid_corner_cutting(&self) -> bool {
        self.flags.contains(SearchFlags::AVOID_CORNER_CUTTING)
    }

    #[inline]
    pub fn respect_height(&self) -> bool {
        self.flags.contains(SearchFlags::RESPECT_HEIGHT)
    }
}

// ----------------------------------------------
// Search Result
// ----------------------------------------------

pub type Path = Vec<Cell>;

// Why a search produced no path. Callers see all of these
// uniformly as "no path"; the distinction exists for logging.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum NoPathReason {
    StartOutOfBounds,
    GoalOutOfBounds,
    StartIsGoal,
    StartImpassable,
    GoalImpassable,
    Unreachable,
}

pub enum SearchResult<'search> {
    PathFound(&'search Path),
    PathNotFound(NoPathReason),
}

impl SearchResult<'_> {
    #[inline]
    pub fn found(&self) -> bool {
        matches!(self, Self::PathFound(_))
    }

    #[inline]
    pub fn not_found(&self) -> bool {
        matches!(self, Self::PathNotFound(_))
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathFound(path) => Some(path),
            Self::PathNotFound(_) => None,
        }
    }
}

// ----------------------------------------------
// Heuristic
// ----------------------------------------------

// Octile distance when diagonal steps are allowed, Manhattan otherwise.
// Admissible on unit-cost terrain; on weighted terrain (multipliers < 1,
// e.g. roads) it can overestimate, so paths are consistent and
// deterministic but not guaranteed globally cost-optimal. Known
// approximation, not a bug.
#[inline]
fn estimate_cost_to_goal(from: Cell, goal: Cell, allow_diagonal: bool) -> NodeCost {
    let dx = (from.x - goal.x).abs() as NodeCost;
    let dy = (from.y - goal.y).abs() as NodeCost;
    if allow_diagonal {
        (CARDINAL_COST * (dx + dy)) + ((DIAGONAL_COST - (2 * CARDINAL_COST)) * dx.min(dy))
    } else {
        CARDINAL_COST * (dx + dy)
    }
}

// ----------------------------------------------
// Search
// ----------------------------------------------

// A* search over a CostGrid. The instance is reusable across calls:
// bookkeeping arrays are stamped with a per-search generation, so
// starting a new search is O(1) instead of an O(W*H) reset, and no
// mutable state leaks from one call into the next.
pub struct Search {
    // Reconstructed path when SearchResult == PathFound, empty otherwise.
    path: Path,

    // PriorityQueue sorts highest priority first by default, but we
    // want the smallest cost first, so the cost order is reversed.
    // The second element of the pair is a push sequence number:
    // equal-cost cells pop in the order they were first reached,
    // which keeps tie-breaking stable and documented.
    frontier: PriorityQueue<Cell, Reverse<(NodeCost, u32)>>,

    came_from: Grid<Cell>,
    cost_so_far: Grid<NodeCost>,
    stamp: Grid<u32>, // cell bookkeeping is valid iff stamp == generation

    generation: u32,
    push_seq: u32,
}

impl Search {
    pub fn with_grid(grid: &CostGrid) -> Self {
        Self::with_grid_size(grid.size())
    }

    pub fn with_grid_size(grid_size: Size) -> Self {
        Self {
            path: Path::new(),
            frontier: PriorityQueue::new(),
            came_from: Grid::filled(grid_size, Cell::invalid()),
            cost_so_far: Grid::filled(grid_size, NODE_COST_INFINITE),
            stamp: Grid::filled(grid_size, 0),
            generation: 0,
            push_seq: 0,
        }
    }

    // A* over the grid, from `start` to `goal` inclusive.
    // Cells listed in `blocked` are treated as impassable for this
    // call only (transient dynamic obstacles).
    #[must_use]
    pub fn find_path(&mut self,
                     grid: &CostGrid,
                     config: &SearchConfig,
                     start: Cell,
                     goal: Cell,
                     blocked: &[Cell]) -> SearchResult<'_> {

        // Preconditions, checked in order. Each one fails the query
        // outright without running the search loop.
        if !grid.is_in_bounds(start) {
            return SearchResult::PathNotFound(NoPathReason::StartOutOfBounds);
        }
        if !grid.is_in_bounds(goal) {
            return SearchResult::PathNotFound(NoPathReason::GoalOutOfBounds);
        }
        if start == goal {
            return SearchResult::PathNotFound(NoPathReason::StartIsGoal);
        }
        if !Self::is_passable(grid, blocked, start) {
            return SearchResult::PathNotFound(NoPathReason::StartImpassable);
        }
        if !Self::is_passable(grid, blocked, goal) {
            return SearchResult::PathNotFound(NoPathReason::GoalImpassable);
        }

        self.reset(start, goal, config.allow_diagonal());

        while let Some((current, _)) = self.frontier.pop() {
            if current == goal {
                // Found a path! We're done.
                return self.reconstruct_path(start, goal);
            }

            let neighbors = Self::neighbors(grid, config, blocked, current);

            for (neighbor, step_cost) in neighbors {
                let new_cost = self.cost_so_far[current] + step_cost;

                // First visit, or a cheaper way in: relax the cell.
                if new_cost < self.cost_at(neighbor) {
                    self.stamp[neighbor] = self.generation;
                    self.cost_so_far[neighbor] = new_cost;

                    // Remember how we got here so we can backtrack.
                    self.came_from[neighbor] = current;

                    let priority = new_cost + estimate_cost_to_goal(neighbor, goal, config.allow_diagonal());
                    self.push_seq += 1;
                    self.frontier.push(neighbor, Reverse((priority, self.push_seq)));
                }
            }
        }

        // Frontier exhausted before reaching the goal. An ordinary
        // outcome (goal fenced off by impassable cells), not an error.
        SearchResult::PathNotFound(NoPathReason::Unreachable)
    }

    #[inline]
    fn is_passable(grid: &CostGrid, blocked: &[Cell], cell: Cell) -> bool {
        grid.is_passable(cell) && !blocked.contains(&cell)
    }

    // Candidate neighbors of `current` with the fixed-point distance
    // cost of stepping into each. Cardinals are always candidates;
    // diagonals only with ALLOW_DIAGONAL, and subject to the corner
    // rule: with AVOID_CORNER_CUTTING a diagonal step requires *both*
    // flanking cardinal cells to be passable, so a route can never
    // clip through the gap between two blocked cells.
    fn neighbors(grid: &CostGrid,
                 config: &SearchConfig,
                 blocked: &[Cell],
                 current: Cell) -> ArrayVec<(Cell, NodeCost), 8> {

        let mut result = ArrayVec::new();

        let cardinals = [
            Cell::new(current.x + 1, current.y), // right
            Cell::new(current.x - 1, current.y), // left
            Cell::new(current.x, current.y + 1), // top
            Cell::new(current.x, current.y - 1), // bottom
        ];

        for neighbor in cardinals {
            if Self::can_enter(grid, config, blocked, current, neighbor) {
                result.push((neighbor, Self::step_cost(grid, neighbor, CARDINAL_COST)));
            }
        }

        if !config.allow_diagonal() {
            return result;
        }

        let diagonals = [
            Cell::new(current.x + 1, current.y + 1),
            Cell::new(current.x - 1, current.y + 1),
            Cell::new(current.x + 1, current.y - 1),
            Cell::new(current.x - 1, current.y - 1),
        ];

        for neighbor in diagonals {
            if !Self::can_enter(grid, config, blocked, current, neighbor) {
                continue;
            }
            if config.avoid_corner_cutting() {
                let flank_a = Cell::new(neighbor.x, current.y);
                let flank_b = Cell::new(current.x, neighbor.y);
                if !Self::is_passable(grid, blocked, flank_a) ||
                   !Self::is_passable(grid, blocked, flank_b) {
                    continue;
                }
            }
            result.push((neighbor, Self::step_cost(grid, neighbor, DIAGONAL_COST)));
        }

        result
    }

    #[inline]
    fn can_enter(grid: &CostGrid,
                 config: &SearchConfig,
                 blocked: &[Cell],
                 current: Cell,
                 neighbor: Cell) -> bool {

        if !Self::is_passable(grid, blocked, neighbor) {
            return false;
        }

        if config.respect_height() {
            // Both cells are in bounds here (current was popped from the
            // frontier, neighbor passed the passability check).
            if let (Some(from_height), Some(to_height)) =
                (grid.height_level(current), grid.height_level(neighbor)) {
                if (from_height - to_height).abs() > config.max_height_diff {
                    return false;
                }
            }
        }

        true
    }

    // Movement cost is a property of the destination cell: entering
    // expensive terrain costs more regardless of approach direction.
    #[inline]
    fn step_cost(grid: &CostGrid, destination: Cell, distance: NodeCost) -> NodeCost {
        ((distance as f32) * grid.movement_cost(destination)).round() as NodeCost
    }

    #[inline]
    fn cost_at(&self, cell: Cell) -> NodeCost {
        if self.stamp[cell] == self.generation {
            self.cost_so_far[cell]
        } else {
            NODE_COST_INFINITE
        }
    }

    fn reset(&mut self, start: Cell, goal: Cell, allow_diagonal: bool) {
        self.path.clear();
        self.frontier.clear();
        self.push_seq = 0;

        // Bumping the generation invalidates all previous bookkeeping
        // at once. On the (rare) wrap-around, do one full reset so a
        // stale stamp can never alias the new generation.
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamp.fill(0);
            self.generation = 1;
        }

        self.stamp[start] = self.generation;
        self.cost_so_far[start] = NODE_COST_ZERO;
        self.came_from[start] = start;

        self.frontier.push(start, Reverse((estimate_cost_to_goal(start, goal, allow_diagonal), 0)));
    }

    fn reconstruct_path(&mut self, start: Cell, goal: Cell) -> SearchResult<'_> {
        if self.stamp[goal] != self.generation || !self.came_from[goal].is_valid() {
            return SearchResult::PathNotFound(NoPathReason::Unreachable);
        }

        debug_assert!(self.path.is_empty());

        let mut current = goal;
        while current != start {
            self.path.push(current);
            current = self.came_from[current];
        }

        self.path.push(start);
        self.path.reverse();

        SearchResult::PathFound(&self.path)
    }
}
