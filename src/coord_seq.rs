use crate::engine::{Engine, LiveToken, ObjectKind};
use crate::errors::{GeomError, Result};
use crate::geometry::{to_line_string, Geometry, LinearRing};
use crate::Coordinate;
use geo_types::{Geometry as GeoGeometry, Point};

/// A fixed-size buffer of coordinates, consumed by exactly one conversion
/// into a geometry. Dropping an unconverted sequence releases it.
#[derive(Debug)]
pub struct CoordSeq {
    coords: Vec<Coordinate>,
    written: Vec<bool>,
    live: LiveToken,
}

impl Engine {
    pub fn create_coord_seq(&self, size: usize, dimension: usize) -> Result<CoordSeq> {
        if dimension != 2 {
            return Err(GeomError::Create(format!(
                "CoordSeq with dimension {}",
                dimension
            )));
        }
        let mut coords = Vec::new();
        coords
            .try_reserve_exact(size)
            .map_err(|_| GeomError::Create(format!("CoordSeq of size {}", size)))?;
        coords.resize(size, Coordinate::new(0., 0.));
        Ok(CoordSeq {
            coords,
            written: vec![false; size],
            live: self.token(ObjectKind::CoordSeq),
        })
    }

    /// A sequence holding `coords`, in order.
    pub fn coord_seq_from(&self, coords: &[Coordinate]) -> Result<CoordSeq> {
        let mut seq = self.create_coord_seq(coords.len(), 2)?;
        for (index, coord) in coords.iter().enumerate() {
            seq.set_xy(index, coord.x, coord.y)?;
        }
        Ok(seq)
    }
}

impl CoordSeq {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Values are stored as given; NaN is not rejected here.
    pub fn set_xy(&mut self, index: usize, x: f64, y: f64) -> Result<()> {
        let size = self.coords.len();
        match self.coords.get_mut(index) {
            Some(coord) => {
                *coord = Coordinate::new(x, y);
                self.written[index] = true;
                Ok(())
            }
            None => Err(GeomError::Write { index, size }),
        }
    }

    pub fn get(&self, index: usize) -> Option<Coordinate> {
        if *self.written.get(index)? {
            Some(self.coords[index])
        } else {
            None
        }
    }

    fn take_coords(&self, kind: &str) -> Result<()> {
        match self.written.iter().position(|w| !w) {
            None => Ok(()),
            Some(index) => Err(GeomError::Create(format!(
                "{}: coordinate {} was never written",
                kind, index
            ))),
        }
    }

    pub fn into_point(self, _engine: &Engine) -> Result<Geometry> {
        self.take_coords("Point")?;
        if self.coords.len() != 1 {
            return Err(GeomError::Create(format!(
                "Point from {} coordinates",
                self.coords.len()
            )));
        }
        let point = Point::from(geo_types::Coord::from(self.coords[0]));
        Ok(Geometry::from_token(self.live, GeoGeometry::Point(point)))
    }

    pub fn into_line_string(self, _engine: &Engine) -> Result<Geometry> {
        self.take_coords("LineString")?;
        if self.coords.len() == 1 {
            return Err(GeomError::Create(
                "LineString from a single coordinate".to_owned(),
            ));
        }
        let line = to_line_string(&self.coords);
        Ok(Geometry::from_token(self.live, GeoGeometry::LineString(line)))
    }

    /// A ring needs 0 or at least 4 coordinates, with the last equal to the
    /// first.
    pub fn into_linear_ring(self, _engine: &Engine) -> Result<LinearRing> {
        self.take_coords("LinearRing")?;
        let n = self.coords.len();
        if n > 0 && n < 4 {
            return Err(GeomError::Create(format!(
                "LinearRing from {} coordinates, must be 0 or >= 4",
                n
            )));
        }
        if self.coords.first() != self.coords.last() {
            return Err(GeomError::Create(
                "LinearRing: points do not form a closed linestring".to_owned(),
            ));
        }
        Ok(LinearRing::new(
            self.coords,
            self.live.convert(ObjectKind::Geometry),
        ))
    }
}
