//! Geometry builders for node and way coordinates.
//!
//! Coordinates are `(longitude, latitude)` pairs and are taken as given: no
//! range or CRS checks are made here.

use crate::engine::Engine;
use crate::errors::{GeomError, Result};
use crate::geometry::{Geometry, LinearRing};
use crate::{Bounds, Coordinate};
use tracing::debug;

/// A geometry together with its WKB, ready for persistence.
#[derive(Debug)]
pub struct WkbGeometry {
    pub wkb: Vec<u8>,
    pub geom: Geometry,
}

pub fn point(engine: &Engine, x: f64, y: f64) -> Result<Geometry> {
    let mut seq = engine.create_coord_seq(1, 2)?;
    seq.set_xy(0, x, y)?;
    seq.into_point(engine)
}

pub fn line_string(engine: &Engine, coords: &[Coordinate]) -> Result<Geometry> {
    if coords.len() < 2 {
        return Err(GeomError::InsufficientPoints {
            found: coords.len(),
        });
    }
    engine.coord_seq_from(coords)?.into_line_string(engine)
}

fn ring(engine: &Engine, coords: &[Coordinate]) -> Result<LinearRing> {
    if coords.len() < 2 {
        return Err(GeomError::InsufficientPoints {
            found: coords.len(),
        });
    }
    engine.coord_seq_from(coords)?.into_linear_ring(engine)
}

/// A normalized polygon with a single shell.
pub fn polygon(engine: &Engine, coords: &[Coordinate]) -> Result<Geometry> {
    let shell = ring(engine, coords)?;
    let mut geom = engine.create_polygon(shell, Vec::new())?;
    engine.normalize(&mut geom)?;
    Ok(geom)
}

/// A normalized polygon with interior rings.
pub fn polygon_with_holes(
    engine: &Engine,
    shell: &[Coordinate],
    holes: &[Vec<Coordinate>],
) -> Result<Geometry> {
    let shell = ring(engine, shell)?;
    let holes = holes
        .iter()
        .map(|hole| ring(engine, hole))
        .collect::<Result<Vec<_>>>()?;
    let mut geom = engine.create_polygon(shell, holes)?;
    engine.normalize(&mut geom)?;
    Ok(geom)
}

/// The closed five point polygon covering `bounds`.
pub fn bounds_polygon(engine: &Engine, bounds: Bounds) -> Result<Geometry> {
    if bounds.is_empty() {
        return Err(GeomError::Create("polygon from empty bounds".to_owned()));
    }
    let Bounds {
        min_x,
        min_y,
        max_x,
        max_y,
    } = bounds;
    let coords: [Coordinate; 5] = [
        (min_x, min_y).into(),
        (max_x, min_y).into(),
        (max_x, max_y).into(),
        (min_x, max_y).into(),
        (min_x, min_y).into(),
    ];
    let shell = engine.coord_seq_from(&coords)?.into_linear_ring(engine)?;
    engine.create_polygon(shell, Vec::new())
}

fn with_wkb(engine: &Engine, geom: Geometry) -> Result<WkbGeometry> {
    match engine.to_wkb(&geom) {
        Ok(wkb) => Ok(WkbGeometry { wkb, geom }),
        Err(e) => {
            debug!(target: "geom_engine", geom_type = %geom.geom_type(), "could not create wkb");
            Err(e)
        }
    }
}

pub fn point_wkb(engine: &Engine, x: f64, y: f64) -> Result<WkbGeometry> {
    with_wkb(engine, point(engine, x, y)?)
}

pub fn line_string_wkb(engine: &Engine, coords: &[Coordinate]) -> Result<WkbGeometry> {
    with_wkb(engine, line_string(engine, coords)?)
}

pub fn polygon_wkb(engine: &Engine, coords: &[Coordinate]) -> Result<WkbGeometry> {
    with_wkb(engine, polygon(engine, coords)?)
}
