use crate::terrain::CostGrid;
use crate::utils::coords::Cell;

use super::Path;

// ----------------------------------------------
// Path Smoothing
// ----------------------------------------------

// Collapses a cell-adjacent path into fewer waypoints: from each
// anchor, jump straight to the farthest waypoint the anchor has an
// unobstructed line to, and repeat until the goal. Start and goal
// are always preserved. Paths of length <= 2 come back unchanged.
pub fn smooth_path(grid: &CostGrid, blocked: &[Cell], path: &Path) -> Path {
    if path.len() <= 2 {
        return path.clone();
    }

    let last = path.len() - 1;
    let mut result = Path::with_capacity(path.len());
    result.push(path[0]);

    let mut anchor = 0;
    while anchor < last {
        // Scan back from the goal for the farthest visible waypoint.
        // The immediate successor is adjacent, so this always advances.
        let mut next = anchor + 1;
        for candidate in ((anchor + 1)..=last).rev() {
            if line_of_sight(grid, blocked, path[anchor], path[candidate]) {
                next = candidate;
                break;
            }
        }

        result.push(path[next]);
        anchor = next;
    }

    result
}

// True when the straight segment between the centers of `from` and
// `to` crosses only passable cells. Uses a supercover line walk so
// every cell the segment touches is tested; when the segment passes
// exactly through a cell corner, both cells flanking the corner must
// be passable (same strictness as the search's corner rule).
pub fn line_of_sight(grid: &CostGrid, blocked: &[Cell], from: Cell, to: Cell) -> bool {
    if !passable(grid, blocked, from) || !passable(grid, blocked, to) {
        return false;
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;

    let nx = dx.abs();
    let ny = dy.abs();

    let step_x = if dx > 0 { 1 } else { -1 };
    let step_y = if dy > 0 { 1 } else { -1 };

    let mut current = from;
    let mut ix = 0;
    let mut iy = 0;

    while ix < nx || iy < ny {
        // Compare fractional progress along x vs y to decide which
        // cell boundary the segment crosses next.
        let decision = ((1 + (2 * ix)) * ny) - ((1 + (2 * iy)) * nx);

        if decision == 0 {
            // Exact corner crossing: both flanking cells must be clear.
            let flank_a = Cell::new(current.x + step_x, current.y);
            let flank_b = Cell::new(current.x, current.y + step_y);
            if !passable(grid, blocked, flank_a) || !passable(grid, blocked, flank_b) {
                return false;
            }
            current.x += step_x;
            current.y += step_y;
            ix += 1;
            iy += 1;
        } else if decision < 0 {
            current.x += step_x;
            ix += 1;
        } else {
            current.y += step_y;
            iy += 1;
        }

        if !passable(grid, blocked, current) {
            return false;
        }
    }

    true
}

#[inline]
fn passable(grid: &CostGrid, blocked: &[Cell], cell: Cell) -> bool {
    grid.is_passable(cell) && !blocked.contains(&cell)
}
