//! Wrapped coordinate arithmetic shared by every component.
//!
//! The world is a torus: movement off one edge reenters the opposite edge,
//! and all distances use the shorter wrap-around delta on each axis. Every
//! neighbor scan and movement step must go through these helpers; plain
//! arithmetic breaks edge-of-map behavior on both axes.

use serde::{Deserialize, Serialize};

/// One grid cell, always wrapped into `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
}

impl Cell {
    /// Construct a cell without wrapping; callers pass already-valid coords.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Pair form, convenient for index calls.
    #[must_use]
    pub const fn pair(self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// Wrap a possibly-negative coordinate into `[0, dim)`.
#[must_use]
pub fn wrap(coord: i32, dim: u16) -> u16 {
    coord.rem_euclid(i32::from(dim)) as u16
}

/// Translate `cell` by `(dx, dy)` with wrapping on both axes.
#[must_use]
pub fn offset(cell: Cell, dx: i32, dy: i32, width: u16, height: u16) -> Cell {
    Cell {
        x: wrap(i32::from(cell.x) + dx, width),
        y: wrap(i32::from(cell.y) + dy, height),
    }
}

/// Shorter wrap-around delta between two coordinates on one axis.
#[must_use]
pub fn axis_delta(a: u16, b: u16, dim: u16) -> u16 {
    let direct = a.abs_diff(b);
    direct.min(dim - direct)
}

/// Squared toroidal Euclidean distance; cheap form for range checks.
#[must_use]
pub fn toroidal_distance_sq(a: Cell, b: Cell, width: u16, height: u16) -> u32 {
    let dx = u32::from(axis_delta(a.x, b.x, width));
    let dy = u32::from(axis_delta(a.y, b.y, height));
    dx * dx + dy * dy
}

/// Toroidal Euclidean distance between two cells.
#[must_use]
pub fn toroidal_distance(a: Cell, b: Cell, width: u16, height: u16) -> f32 {
    (toroidal_distance_sq(a, b, width, height) as f32).sqrt()
}
