//! Geometry values.
//!
//! A [`Geometry`] owns its coordinates and is released when dropped; there is
//! no separate destroy call to get wrong. Constructors that absorb children
//! (a [`LinearRing`] into a polygon, polygons into a multi-polygon) take them
//! by value, so an absorbed child can never be used or released again:
//!
//! ```compile_fail
//! use geom_index::{Coordinate, Engine};
//!
//! let engine = Engine::default_engine().unwrap();
//! let coords: Vec<Coordinate> = vec![
//!     (0., 0.).into(), (1., 0.).into(), (1., 1.).into(), (0., 0.).into(),
//! ];
//! let mut seq = engine.create_coord_seq(coords.len(), 2).unwrap();
//! for (i, c) in coords.iter().enumerate() {
//!     seq.set_xy(i, c.x, c.y).unwrap();
//! }
//! let ring = seq.into_linear_ring(&engine).unwrap();
//! let polygon = engine.create_polygon(ring, Vec::new()).unwrap();
//! drop(ring); // the ring now belongs to the polygon
//! ```

use crate::engine::{Engine, LiveToken, ObjectKind};
use crate::errors::{GeomError, Result};
use crate::{Bounds, Coordinate, HasBounds};
use geo::{Area, CoordsIter, Euclidean, Length};
use geo_types::{
    Geometry as GeoGeometry, GeometryCollection, LineString, MultiLineString, MultiPolygon,
    Polygon,
};
use std::fmt;
use std::sync::Arc;

/// A geometry that may be shared, e.g. between a spatial index and its
/// prepared geometries.
pub type SharedGeometry = Arc<Geometry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    LinearRing,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    Unknown,
}

impl GeometryType {
    pub fn of(geom: &GeoGeometry<f64>) -> Self {
        match geom {
            GeoGeometry::Point(_) => GeometryType::Point,
            GeoGeometry::Line(_) | GeoGeometry::LineString(_) => GeometryType::LineString,
            GeoGeometry::Polygon(_) | GeoGeometry::Rect(_) | GeoGeometry::Triangle(_) => {
                GeometryType::Polygon
            }
            GeoGeometry::MultiPoint(_) => GeometryType::MultiPoint,
            GeoGeometry::MultiLineString(_) => GeometryType::MultiLineString,
            GeoGeometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            GeoGeometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    pub fn is_polygonal(&self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }

    pub fn is_lineal(&self) -> bool {
        matches!(
            self,
            GeometryType::LineString | GeometryType::LinearRing | GeometryType::MultiLineString
        )
    }

    pub fn is_puntal(&self) -> bool {
        matches!(self, GeometryType::Point | GeometryType::MultiPoint)
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::LinearRing => "LinearRing",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
            GeometryType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// An owned geometry value.
#[derive(Debug, Clone)]
pub struct Geometry {
    inner: GeoGeometry<f64>,
    _live: LiveToken,
}

impl Geometry {
    pub(crate) fn new(engine: &Engine, inner: GeoGeometry<f64>) -> Self {
        Geometry {
            inner,
            _live: engine.token(ObjectKind::Geometry),
        }
    }

    pub(crate) fn from_token(token: LiveToken, inner: GeoGeometry<f64>) -> Self {
        Geometry {
            inner,
            _live: token.convert(ObjectKind::Geometry),
        }
    }

    pub fn geo(&self) -> &GeoGeometry<f64> {
        &self.inner
    }

    pub(crate) fn geo_mut(&mut self) -> &mut GeoGeometry<f64> {
        &mut self.inner
    }

    /// Release the value and hand back the plain `geo` geometry.
    pub fn into_geo(self) -> GeoGeometry<f64> {
        self.inner
    }

    pub fn into_shared(self) -> SharedGeometry {
        Arc::new(self)
    }

    pub fn geom_type(&self) -> GeometryType {
        GeometryType::of(&self.inner)
    }

    pub fn num_coords(&self) -> usize {
        self.inner.coords_count()
    }

    pub fn coords(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.inner.coords_iter().map(Coordinate::from)
    }

    pub(crate) fn has_non_finite(&self) -> bool {
        self.first_non_finite().is_some()
    }

    /// Position of the first NaN or infinite coordinate, counted in
    /// [`coords`](Geometry::coords) order.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.coords().position(|c| !c.is_finite())
    }

    pub fn is_empty(&self) -> bool {
        self.num_coords() == 0
    }

    /// Number of parts; 1 for non-collections.
    pub fn num_geoms(&self) -> usize {
        match &self.inner {
            GeoGeometry::MultiPoint(mp) => mp.0.len(),
            GeoGeometry::MultiLineString(mls) => mls.0.len(),
            GeoGeometry::MultiPolygon(mpoly) => mpoly.0.len(),
            GeoGeometry::GeometryCollection(gc) => gc.0.len(),
            _ => 1,
        }
    }

    pub fn area(&self) -> f64 {
        self.inner.unsigned_area()
    }

    pub fn length(&self) -> f64 {
        length_of(&self.inner)
    }

    /// Axis-aligned bounds, scanning only shells for polygons.
    ///
    /// Empty geometries give the empty bounds.
    pub fn bounds_envelope(&self) -> Bounds {
        fn polygon_shell(p: &Polygon<f64>) -> impl Iterator<Item = Coordinate> + '_ {
            p.exterior().0.iter().copied().map(Coordinate::from)
        }
        match &self.inner {
            GeoGeometry::Polygon(p) => Bounds::of_coords(polygon_shell(p)),
            GeoGeometry::MultiPolygon(mp) => Bounds::of_coords(mp.0.iter().flat_map(polygon_shell)),
            _ => Bounds::of_coords(self.coords()),
        }
    }
}

impl HasBounds for Geometry {
    fn bounds(&self) -> Bounds {
        self.bounds_envelope()
    }
}

fn length_of(geom: &GeoGeometry<f64>) -> f64 {
    fn perimeter(p: &Polygon<f64>) -> f64 {
        p.exterior().length::<Euclidean>()
            + p.interiors()
                .iter()
                .map(|hole| hole.length::<Euclidean>())
                .sum::<f64>()
    }
    match geom {
        GeoGeometry::Line(l) => l.length::<Euclidean>(),
        GeoGeometry::LineString(ls) => ls.length::<Euclidean>(),
        GeoGeometry::MultiLineString(mls) => mls.length::<Euclidean>(),
        GeoGeometry::Polygon(p) => perimeter(p),
        GeoGeometry::MultiPolygon(mp) => mp.0.iter().map(perimeter).sum(),
        GeoGeometry::Rect(r) => perimeter(&r.to_polygon()),
        GeoGeometry::Triangle(t) => perimeter(&t.to_polygon()),
        GeoGeometry::GeometryCollection(gc) => gc.0.iter().map(length_of).sum(),
        GeoGeometry::Point(_) | GeoGeometry::MultiPoint(_) => 0.,
    }
}

/// A closed ring that may only become part of a polygon.
///
/// There is no way to release a ring other than dropping it before it is
/// absorbed; after [`Engine::create_polygon`] it belongs to the polygon.
#[derive(Debug)]
pub struct LinearRing {
    coords: Vec<Coordinate>,
    live: LiveToken,
}

impl LinearRing {
    pub(crate) fn new(coords: Vec<Coordinate>, live: LiveToken) -> Self {
        LinearRing { coords, live }
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn geom_type(&self) -> GeometryType {
        GeometryType::LinearRing
    }

    /// Turn the ring into a stand-alone closed LineString.
    pub fn into_line_string(self) -> Geometry {
        let line = to_line_string(&self.coords);
        Geometry::from_token(self.live, GeoGeometry::LineString(line))
    }
}

impl HasBounds for LinearRing {
    fn bounds(&self) -> Bounds {
        Bounds::of_coords(self.coords.iter().copied())
    }
}

pub(crate) fn to_line_string(coords: &[Coordinate]) -> LineString<f64> {
    LineString::new(coords.iter().copied().map(Into::into).collect())
}

impl Engine {
    /// Build a polygon, absorbing the shell and holes.
    pub fn create_polygon(&self, shell: LinearRing, holes: Vec<LinearRing>) -> Result<Geometry> {
        let exterior = to_line_string(&shell.coords);
        let interiors = if holes.is_empty() {
            Vec::new()
        } else {
            holes.iter().map(|h| to_line_string(&h.coords)).collect()
        };
        // Holes are released here; the shell's token becomes the polygon's.
        drop(holes);
        Ok(Geometry::from_token(
            shell.live,
            GeoGeometry::Polygon(Polygon::new(exterior, interiors)),
        ))
    }

    /// Build a multi-polygon, absorbing the parts.
    pub fn create_multi_polygon(&self, polygons: Vec<Geometry>) -> Result<Geometry> {
        if polygons.is_empty() {
            return Err(GeomError::Create("MultiPolygon from no parts".to_owned()));
        }
        let mut parts = Vec::with_capacity(polygons.len());
        for polygon in polygons {
            match polygon.into_geo() {
                GeoGeometry::Polygon(p) => parts.push(p),
                GeoGeometry::MultiPolygon(mp) => parts.extend(mp.0),
                other => {
                    return Err(GeomError::Create(format!(
                        "MultiPolygon with {} member",
                        GeometryType::of(&other)
                    )))
                }
            }
        }
        Ok(Geometry::new(
            self,
            GeoGeometry::MultiPolygon(MultiPolygon::new(parts)),
        ))
    }

    /// Build a multi-linestring, absorbing the parts.
    pub fn create_multi_line_string(&self, lines: Vec<Geometry>) -> Result<Geometry> {
        if lines.is_empty() {
            return Err(GeomError::Create("MultiLineString from no parts".to_owned()));
        }
        let mut parts = Vec::with_capacity(lines.len());
        for line in lines {
            match line.into_geo() {
                GeoGeometry::LineString(ls) => parts.push(ls),
                GeoGeometry::Line(l) => parts.push(LineString::from(l)),
                GeoGeometry::MultiLineString(mls) => parts.extend(mls.0),
                other => {
                    return Err(GeomError::Create(format!(
                        "MultiLineString with {} member",
                        GeometryType::of(&other)
                    )))
                }
            }
        }
        Ok(Geometry::new(
            self,
            GeoGeometry::MultiLineString(MultiLineString::new(parts)),
        ))
    }

    pub fn create_collection(&self, geometries: Vec<Geometry>) -> Geometry {
        let parts: Vec<GeoGeometry<f64>> = geometries.into_iter().map(Geometry::into_geo).collect();
        Geometry::new(
            self,
            GeoGeometry::GeometryCollection(GeometryCollection::new_from(parts)),
        )
    }

    pub fn clone_geometry(&self, geometry: &Geometry) -> Geometry {
        Geometry::new(self, geometry.inner.clone())
    }

    /// Copies of the parts of a collection; a non-collection yields itself.
    pub fn geoms(&self, geometry: &Geometry) -> Vec<Geometry> {
        let parts: Vec<GeoGeometry<f64>> = match &geometry.inner {
            GeoGeometry::MultiPoint(mp) => mp.0.iter().copied().map(GeoGeometry::Point).collect(),
            GeoGeometry::MultiLineString(mls) => {
                mls.0.iter().cloned().map(GeoGeometry::LineString).collect()
            }
            GeoGeometry::MultiPolygon(mp) => mp.0.iter().cloned().map(GeoGeometry::Polygon).collect(),
            GeoGeometry::GeometryCollection(gc) => gc.0.clone(),
            other => vec![other.clone()],
        };
        parts.into_iter().map(|g| Geometry::new(self, g)).collect()
    }

    /// The shell of a polygon as a closed LineString.
    pub fn exterior_ring(&self, geometry: &Geometry) -> Result<Geometry> {
        match &geometry.inner {
            GeoGeometry::Polygon(p) => Ok(Geometry::new(
                self,
                GeoGeometry::LineString(p.exterior().clone()),
            )),
            GeoGeometry::Rect(r) => Ok(Geometry::new(
                self,
                GeoGeometry::LineString(r.to_polygon().exterior().clone()),
            )),
            _ => Err(GeomError::Unsupported {
                operation: "exterior_ring",
                geom_type: geometry.geom_type().to_string(),
            }),
        }
    }
}
