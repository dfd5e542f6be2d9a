use crate::Coordinate;

/// Axis-aligned bounds.
///
/// The empty value has `+inf` minimums and `-inf` maximums, so it intersects
/// nothing, is contained by nothing, and is the identity for `expand`.
#[derive(Copy, Clone, Debug)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

pub trait HasBounds {
    fn bounds(&self) -> Bounds;
}

impl PartialEq for Bounds {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() {
            other.is_empty()
        } else {
            self.min_x == other.min_x
                && self.min_y == other.min_y
                && self.max_x == other.max_x
                && self.max_y == other.max_y
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::new_empty()
    }
}

impl Bounds {
    pub fn new(p1: Coordinate, p2: Coordinate) -> Self {
        Bounds {
            min_x: p1.x.min(p2.x),
            min_y: p1.y.min(p2.y),
            max_x: p1.x.max(p2.x),
            max_y: p1.y.max(p2.y),
        }
    }

    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn new_empty() -> Self {
        Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn of(rects: &[Bounds]) -> Self {
        rects.iter().fold(Bounds::new_empty(), |mut s, r| {
            s.expand(*r);
            s
        })
    }

    /// Bounds of a coordinate stream; non-finite coordinates are skipped.
    pub fn of_coords<I: IntoIterator<Item = Coordinate>>(coords: I) -> Self {
        coords
            .into_iter()
            .filter(Coordinate::is_finite)
            .fold(Bounds::new_empty(), |mut s, c| {
                s.expand_to(c);
                s
            })
    }

    pub fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            x: (self.max_x + self.min_x) / 2.,
            y: (self.max_y + self.min_y) / 2.,
        }
    }

    pub fn intersects(&self, other: Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        self.min_x <= point.x
            && point.x <= self.max_x
            && self.min_y <= point.y
            && point.y <= self.max_y
    }

    pub fn contains_bounds(&self, other: Bounds) -> bool {
        !other.is_empty()
            && self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }

    pub fn expand(&mut self, other: Bounds) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn expand_to(&mut self, coord: Coordinate) {
        self.expand(Bounds::new(coord, coord));
    }
}
