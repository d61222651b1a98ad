//! Spatial indexing for agent neighborhood queries on a wrapping grid.
//!
//! Population groups rebuild their index once per tick and answer two kinds
//! of questions from it: "who stands on this exact cell" (direct bucket
//! lookup) and "who stands within this radius" (bounded square scan filtered
//! by true toroidal Euclidean distance). A full rebuild per tick is cheaper
//! and more robust than incremental maintenance under heavy churn from
//! births, deaths, and per-tick movement.

use ordered_float::OrderedFloat;
use thiserror::Error;

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., zero dimensions).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Common behaviour exposed by per-tick cell indices.
///
/// `T` is the caller's agent handle type; the index never interprets it.
pub trait CellIndex<T: Copy> {
    /// Rebuild internal buckets from `(x, y, handle)` entries in one pass.
    ///
    /// Coordinates outside the grid are wrapped, so callers may pass raw
    /// offsets. Rebuilding with the same entries twice yields identical
    /// query results.
    fn rebuild(&mut self, entries: &[(u16, u16, T)]) -> Result<(), IndexError>;

    /// Handles occupying the exact cell `(x, y)`.
    fn at(&self, x: u16, y: u16) -> &[T];

    /// Visit every handle within `radius` of `center`, passing its toroidal
    /// Euclidean distance. Visit order is scan order, not distance order.
    fn for_each_within(
        &self,
        center: (u16, u16),
        radius: f32,
        visitor: &mut dyn FnMut(T, OrderedFloat<f32>),
    );

    /// Total number of indexed handles.
    fn len(&self) -> usize;

    /// Returns true when no handles are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dense row-major bucket grid covering the whole world, one bucket per cell.
#[derive(Debug, Clone)]
pub struct UniformCellGrid<T> {
    width: u16,
    height: u16,
    buckets: Vec<Vec<T>>,
    occupied: usize,
}

impl<T: Copy> UniformCellGrid<T> {
    /// Create an empty grid covering `width * height` cells.
    pub fn new(width: u16, height: u16) -> Result<Self, IndexError> {
        if width == 0 || height == 0 {
            return Err(IndexError::InvalidConfig(
                "grid dimensions must be non-zero",
            ));
        }
        let cells = usize::from(width) * usize::from(height);
        Ok(Self {
            width,
            height,
            buckets: vec![Vec::new(); cells],
            occupied: 0,
        })
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    fn bucket_index(&self, x: u16, y: u16) -> usize {
        let x = usize::from(x % self.width);
        let y = usize::from(y % self.height);
        y * usize::from(self.width) + x
    }

    /// Clamped half-open offset range covering each wrapped column/row at
    /// most once, even when the scan radius exceeds the world dimension.
    fn offset_bounds(radius: i32, dim: u16) -> (i32, i32) {
        let dim = i32::from(dim);
        let lo = -radius.min(dim / 2);
        let hi = radius.min((dim - 1) / 2);
        (lo, hi)
    }
}

impl<T: Copy> CellIndex<T> for UniformCellGrid<T> {
    fn rebuild(&mut self, entries: &[(u16, u16, T)]) -> Result<(), IndexError> {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        for &(x, y, handle) in entries {
            let idx = self.bucket_index(x, y);
            self.buckets[idx].push(handle);
        }
        self.occupied = entries.len();
        Ok(())
    }

    fn at(&self, x: u16, y: u16) -> &[T] {
        &self.buckets[self.bucket_index(x, y)]
    }

    fn for_each_within(
        &self,
        center: (u16, u16),
        radius: f32,
        visitor: &mut dyn FnMut(T, OrderedFloat<f32>),
    ) {
        if radius < 0.0 {
            return;
        }
        let reach = radius.ceil() as i32;
        let radius_sq = radius * radius;
        let (cx, cy) = (center.0 % self.width, center.1 % self.height);
        let (dx_lo, dx_hi) = Self::offset_bounds(reach, self.width);
        let (dy_lo, dy_hi) = Self::offset_bounds(reach, self.height);
        for dy in dy_lo..=dy_hi {
            for dx in dx_lo..=dx_hi {
                // Offsets are clamped to half the dimension, so they already
                // equal the shortest wrap delta on each axis.
                let dist_sq = (dx * dx + dy * dy) as f32;
                if dist_sq > radius_sq {
                    continue;
                }
                let x = (i32::from(cx) + dx).rem_euclid(i32::from(self.width)) as u16;
                let y = (i32::from(cy) + dy).rem_euclid(i32::from(self.height)) as u16;
                let dist = OrderedFloat(dist_sq.sqrt());
                for &handle in self.at(x, y) {
                    visitor(handle, dist);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.occupied
    }
}
