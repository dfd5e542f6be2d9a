pub mod other_impls;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use geom_index::{Bounds, Coordinate};

//// Utility functions

/// A closed star-shaped ring with `n` vertices around the origin.
pub(crate) fn star_ring(n: usize, seed: u64) -> Vec<Coordinate> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut coords: Vec<Coordinate> = (0..n)
        .map(|i| {
            let angle = 2. * PI * (i as f64) / (n as f64);
            let radius = rng.gen_range(50., 100.);
            Coordinate {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            }
        })
        .collect();
    coords.push(coords[0]);
    coords
}

pub(crate) fn get_random_points(bounds: Bounds, n: usize, seed: u64) -> Vec<Coordinate> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Coordinate {
            x: rng.gen_range(bounds.min_x, bounds.max_x),
            y: rng.gen_range(bounds.min_y, bounds.max_y),
        })
        .collect()
}

/// `n` squares with sides up to `max_size`, scattered over `extent`.
pub(crate) fn get_random_boxes(extent: Bounds, n: usize, max_size: f64, seed: u64) -> Vec<Bounds> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x = rng.gen_range(extent.min_x, extent.max_x);
            let y = rng.gen_range(extent.min_y, extent.max_y);
            let size = rng.gen_range(0., max_size);
            Bounds::from_extents(x, y, x + size, y + size)
        })
        .collect()
}
