//! Hilbert curve keys for sorting leaves of the packed tree.

use crate::{Bounds, Coordinate};

// Side of the grid the index extent is mapped onto.
const GRID_BITS: u32 = 16;
const GRID_MAX: u64 = (1 << GRID_BITS) - 1;

/// Sorts after every key on the curve.
pub const UNPLACED: u64 = u64::MAX;

/// Maps positions inside `extent` onto a Hilbert curve over a square grid.
pub struct HilbertGrid {
    extent: Bounds,
    x_scale: f64,
    y_scale: f64,
}

fn axis_scale(min: f64, max: f64) -> f64 {
    if max > min {
        GRID_MAX as f64 / (max - min)
    } else {
        0.
    }
}

impl HilbertGrid {
    pub fn new(extent: Bounds) -> Self {
        if extent.is_empty() {
            return HilbertGrid {
                extent,
                x_scale: 0.,
                y_scale: 0.,
            };
        }
        HilbertGrid {
            extent,
            x_scale: axis_scale(extent.min_x, extent.max_x),
            y_scale: axis_scale(extent.min_y, extent.max_y),
        }
    }

    /// Key of the center of `item`; empty items and centers outside the
    /// extent get [`UNPLACED`].
    pub fn key_of(&self, item: Bounds) -> u64 {
        if item.is_empty() {
            return UNPLACED;
        }
        let center = item.center();
        if self.extent.contains(center) {
            self.key(center)
        } else {
            UNPLACED
        }
    }

    /// Key of a position assumed to lie within the extent.
    pub fn key(&self, position: Coordinate) -> u64 {
        let cell = |offset: f64, scale: f64| ((offset * scale).floor() as u64).min(GRID_MAX);
        curve_distance(
            cell(position.x - self.extent.min_x, self.x_scale),
            cell(position.y - self.extent.min_y, self.y_scale),
        )
    }
}

/// Distance along the curve of grid cell `(x, y)`, visiting quadrants in the
/// order lower-left, upper-left, upper-right, lower-right.
pub fn curve_distance(mut x: u64, mut y: u64) -> u64 {
    let mut distance = 0;
    let mut side = 1 << (GRID_BITS - 1);
    while side > 0 {
        let right = u64::from(x & side != 0);
        let upper = u64::from(y & side != 0);
        distance += side * side * ((3 * right) ^ upper);
        if upper == 0 {
            if right == 1 {
                x = GRID_MAX - x;
                y = GRID_MAX - y;
            }
            std::mem::swap(&mut x, &mut y);
        }
        side >>= 1;
    }
    distance
}
