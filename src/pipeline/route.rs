//! Deterministic route planning across the location grid.
//!
//! Routes assume an unobstructed rectangular grid and follow a fixed axis
//! priority: the full row (vertical) difference is resolved first, then the
//! full column (horizontal) difference, one unit step per token. The route
//! length is therefore always the Manhattan distance between the two cells.

use serde::{Deserialize, Serialize};

use crate::domain::grid::{GridCell, GridSpec};

/// One unit move on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The (row, col) delta of a single step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Plan a route from `current` to `destination`.
///
/// Both cells must lie inside `grid`; the route is empty iff the cells are
/// equal.
pub fn plan(
    current: GridCell,
    destination: GridCell,
    grid: &GridSpec,
) -> crate::Result<Vec<Direction>> {
    grid.validate(current, &grid.encode(current))?;
    grid.validate(destination, &grid.encode(destination))?;

    let d_row = destination.row - current.row;
    let d_col = destination.col - current.col;

    let vertical = if d_row >= 0 {
        Direction::Down
    } else {
        Direction::Up
    };
    let horizontal = if d_col >= 0 {
        Direction::Right
    } else {
        Direction::Left
    };

    let mut route = Vec::with_capacity((d_row.unsigned_abs() + d_col.unsigned_abs()) as usize);
    route.extend(std::iter::repeat(vertical).take(d_row.unsigned_abs() as usize));
    route.extend(std::iter::repeat(horizontal).take(d_col.unsigned_abs() as usize));

    Ok(route)
}
