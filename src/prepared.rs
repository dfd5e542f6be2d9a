//! Prepared geometries: segment trees built once over a geometry and reused
//! for many predicate tests against it.
//!
//! A prepared geometry holds a strong reference to its source, so the source
//! can never be released while the prepared form is alive.

use crate::algorithms::{locate_in_polygon, Location};
use crate::engine::{Engine, LiveToken, ObjectKind, Outcome};
use crate::errors::{GeomError, Result};
use crate::geometry::{Geometry, SharedGeometry};
use crate::{Bounds, Coordinate, HasBounds, SegmentPath};
use geo::Relate;
use geo_types::{Geometry as GeoGeometry, LineString, Polygon};
use std::fmt;

#[derive(Debug)]
struct PolygonPaths {
    shell: SegmentPath,
    holes: Vec<SegmentPath>,
}

impl PolygonPaths {
    fn locate(&self, point: Coordinate) -> Location {
        // Rings were checked when the paths were built.
        locate_in_polygon(point, &self.shell, &self.holes).unwrap_or(Location::Outside)
    }
}

/// A geometry decomposed into points, paths and polygons.
#[derive(Debug, Default)]
struct Parts {
    points: Vec<Coordinate>,
    lines: Vec<SegmentPath>,
    polygons: Vec<PolygonPaths>,
}

fn to_coords(ls: &LineString<f64>) -> Vec<Coordinate> {
    ls.0.iter().copied().map(Coordinate::from).collect()
}

impl Parts {
    fn of(geom: &GeoGeometry<f64>, degree: usize) -> std::result::Result<Parts, String> {
        let mut parts = Parts::default();
        parts.add(geom, degree)?;
        Ok(parts)
    }

    fn add_line(&mut self, ls: &LineString<f64>, degree: usize) {
        match ls.0.len() {
            0 => {}
            1 => self.points.push(ls.0[0].into()),
            _ => self.lines.push(SegmentPath::new(to_coords(ls), degree)),
        }
    }

    fn add_polygon(
        &mut self,
        polygon: &Polygon<f64>,
        degree: usize,
    ) -> std::result::Result<(), String> {
        if polygon.exterior().0.is_empty() {
            return Ok(());
        }
        let ring = |ls: &LineString<f64>| {
            let path = SegmentPath::new(to_coords(ls), degree);
            if path.is_ring() {
                Ok(path)
            } else {
                Err(format!("ring of {} coordinates is not closed", ls.0.len()))
            }
        };
        let shell = ring(polygon.exterior())?;
        let holes = polygon
            .interiors()
            .iter()
            .filter(|h| !h.0.is_empty())
            .map(ring)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.polygons.push(PolygonPaths { shell, holes });
        Ok(())
    }

    fn add(&mut self, geom: &GeoGeometry<f64>, degree: usize) -> std::result::Result<(), String> {
        match geom {
            GeoGeometry::Point(p) => self.points.push(p.0.into()),
            GeoGeometry::MultiPoint(mp) => {
                self.points.extend(mp.0.iter().map(|p| Coordinate::from(p.0)))
            }
            GeoGeometry::Line(l) => self.add_line(&LineString::from(*l), degree),
            GeoGeometry::LineString(ls) => self.add_line(ls, degree),
            GeoGeometry::MultiLineString(mls) => {
                mls.0.iter().for_each(|ls| self.add_line(ls, degree))
            }
            GeoGeometry::Polygon(p) => self.add_polygon(p, degree)?,
            GeoGeometry::MultiPolygon(mp) => {
                for p in &mp.0 {
                    self.add_polygon(p, degree)?;
                }
            }
            GeoGeometry::Rect(r) => self.add_polygon(&r.to_polygon(), degree)?,
            GeoGeometry::Triangle(t) => self.add_polygon(&t.to_polygon(), degree)?,
            GeoGeometry::GeometryCollection(gc) => {
                for g in &gc.0 {
                    self.add(g, degree)?;
                }
            }
        }
        Ok(())
    }

    fn paths(&self) -> impl Iterator<Item = &SegmentPath> + '_ {
        self.lines.iter().chain(
            self.polygons
                .iter()
                .flat_map(|p| std::iter::once(&p.shell).chain(p.holes.iter())),
        )
    }

    /// First vertices of the lines and shells; each stands in for a part
    /// that crosses no path of the other geometry.
    fn representatives(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.lines
            .iter()
            .map(|l| l.coords()[0])
            .chain(self.polygons.iter().map(|p| p.shell.coords()[0]))
    }

    fn touches_point(&self, point: Coordinate) -> bool {
        self.points.iter().any(|p| *p == point)
            || self.lines.iter().any(|l| l.touches_point(point))
            || self
                .polygons
                .iter()
                .any(|p| p.locate(point) != Location::Outside)
    }

    fn is_polygonal(&self) -> bool {
        !self.polygons.is_empty() && self.lines.is_empty() && self.points.is_empty()
    }

    fn in_area(&self, point: Coordinate) -> bool {
        self.polygons
            .iter()
            .any(|p| p.locate(point) != Location::Outside)
    }

    fn intersects(&self, other: &Parts) -> bool {
        if self.points.iter().any(|p| other.touches_point(*p))
            || other.points.iter().any(|p| self.touches_point(*p))
        {
            return true;
        }
        for a in self.paths() {
            let a_bounds = a.rtree().bounds();
            for b in other.paths() {
                if a_bounds.intersects(b.rtree().bounds()) && a.intersects_path(b) {
                    return true;
                }
            }
        }
        // No boundaries cross, so a part is either wholly inside or outside.
        self.representatives().any(|p| other.in_area(p))
            || other.representatives().any(|p| self.in_area(p))
    }
}

fn non_finite(candidate: &Geometry) -> Option<Outcome> {
    if candidate.has_non_finite() {
        Some(Outcome::Exception(format!(
            "non-finite coordinate in {} candidate",
            candidate.geom_type()
        )))
    } else {
        None
    }
}

/// A geometry with precomputed segment trees for repeated predicate tests.
pub struct PreparedGeometry {
    geometry: SharedGeometry,
    bounds: Bounds,
    parts: Parts,
    degree: usize,
    _live: LiveToken,
}

impl fmt::Debug for PreparedGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedGeometry")
            .field("geom_type", &self.geometry.geom_type())
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl Engine {
    /// Prepare a geometry. The prepared form keeps `geometry` alive.
    pub fn prepare(&self, geometry: &SharedGeometry) -> Result<PreparedGeometry> {
        if geometry.has_non_finite() {
            return Err(GeomError::Prepare(format!(
                "{} with non-finite coordinates",
                geometry.geom_type()
            )));
        }
        let degree = self.config().prepared_degree;
        let parts = Parts::of(geometry.geo(), degree)
            .map_err(|reason| GeomError::Prepare(format!("{}: {}", geometry.geom_type(), reason)))?;
        Ok(PreparedGeometry {
            geometry: SharedGeometry::clone(geometry),
            bounds: geometry.bounds(),
            parts,
            degree,
            _live: self.token(ObjectKind::Prepared),
        })
    }
}

impl PreparedGeometry {
    pub fn geometry(&self) -> &SharedGeometry {
        &self.geometry
    }

    fn intersects_outcome(&self, candidate: &Geometry) -> Outcome {
        if let Some(outcome) = non_finite(candidate) {
            return outcome;
        }
        if !self.bounds.intersects(candidate.bounds()) {
            return Outcome::False;
        }
        match Parts::of(candidate.geo(), self.degree) {
            Ok(parts) => self.parts.intersects(&parts).into(),
            Err(reason) => Outcome::Exception(reason),
        }
    }

    fn contains_outcome(&self, candidate: &Geometry) -> Outcome {
        if let Some(outcome) = non_finite(candidate) {
            return outcome;
        }
        if !self.bounds.contains_bounds(candidate.bounds()) {
            return Outcome::False;
        }
        match candidate.geo() {
            GeoGeometry::Point(p) if self.parts.is_polygonal() => {
                let point = Coordinate::from(p.0);
                self.parts
                    .polygons
                    .iter()
                    .any(|poly| poly.locate(point) == Location::Inside)
                    .into()
            }
            other => self.geometry.geo().relate(other).is_contains().into(),
        }
    }

    /// Whether the prepared geometry intersects `candidate`.
    pub fn intersects(&self, engine: &Engine, candidate: &Geometry) -> bool {
        engine.resolve("prepared_intersects", self.intersects_outcome(candidate))
    }

    /// Whether the prepared geometry contains `candidate`.
    pub fn contains(&self, engine: &Engine, candidate: &Geometry) -> bool {
        engine.resolve("prepared_contains", self.contains_outcome(candidate))
    }
}

impl HasBounds for PreparedGeometry {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, point, polygon, MultiPoint};

    fn shared(engine: &Engine, g: impl Into<GeoGeometry<f64>>) -> SharedGeometry {
        Geometry::new(engine, g.into()).into_shared()
    }

    fn donut(engine: &Engine) -> SharedGeometry {
        shared(
            engine,
            polygon!(
                exterior: [(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.)],
                interiors: [[(x: 4., y: 4.), (x: 6., y: 4.), (x: 6., y: 6.), (x: 4., y: 6.)]],
            ),
        )
    }

    #[test]
    fn keeps_source_alive() {
        let engine = Engine::default_engine().unwrap();
        let source = donut(&engine);
        let prepared = engine.prepare(&source).unwrap();
        drop(source);
        assert_eq!(engine.stats().live_geometries, 1);
        assert_eq!(engine.stats().live_prepared, 1);
        assert_eq!(prepared.geometry().geom_type(), crate::GeometryType::Polygon);
        drop(prepared);
        assert_eq!(engine.stats().total(), 0);
    }

    #[test]
    fn rejects_non_finite() {
        let engine = Engine::default_engine().unwrap();
        let nan = shared(&engine, point!(x: f64::NAN, y: 0.));
        assert!(matches!(engine.prepare(&nan), Err(GeomError::Prepare(_))));
    }

    #[test]
    fn point_predicates() {
        let engine = Engine::default_engine().unwrap();
        let prepared = engine.prepare(&donut(&engine)).unwrap();
        let at = |x: f64, y: f64| Geometry::new(&engine, point!(x: x, y: y).into());
        assert!(prepared.contains(&engine, &at(1., 1.)));
        assert!(!prepared.contains(&engine, &at(5., 5.)));
        assert!(!prepared.contains(&engine, &at(0., 5.)));
        assert!(prepared.intersects(&engine, &at(0., 5.)));
        assert!(prepared.intersects(&engine, &at(4., 5.)));
        assert!(!prepared.intersects(&engine, &at(5., 5.)));
        assert!(!prepared.intersects(&engine, &at(11., 5.)));
    }

    #[test]
    fn line_predicates() {
        let engine = Engine::default_engine().unwrap();
        let prepared = engine.prepare(&donut(&engine)).unwrap();
        let line = |coords: Vec<(f64, f64)>| {
            Geometry::new(&engine, GeoGeometry::LineString(coords.into()))
        };
        // Crossing the shell.
        assert!(prepared.intersects(&engine, &line(vec![(-1., 1.), (1., 1.)])));
        // Wholly inside, no crossings.
        assert!(prepared.intersects(&engine, &line(vec![(1., 1.), (2., 2.)])));
        assert!(prepared.contains(&engine, &line(vec![(1., 1.), (2., 2.)])));
        // Wholly in the hole.
        assert!(!prepared.intersects(&engine, &line(vec![(4.5, 4.5), (5.5, 5.5)])));
        // Through the hole.
        assert!(!prepared.contains(&engine, &line(vec![(1., 5.), (9., 5.)])));
    }

    #[test]
    fn polygon_predicates() {
        let engine = Engine::default_engine().unwrap();
        let small = shared(&engine, polygon![(x: 1., y: 1.), (x: 2., y: 1.), (x: 2., y: 2.), (x: 1., y: 2.)]);
        let big = shared(&engine, polygon![(x: -5., y: -5.), (x: 20., y: -5.), (x: 20., y: 20.), (x: -5., y: 20.)]);
        let prepared = engine.prepare(&donut(&engine)).unwrap();
        assert!(prepared.intersects(&engine, &small));
        assert!(prepared.contains(&engine, &small));
        // The candidate surrounds the prepared geometry.
        assert!(prepared.intersects(&engine, &big));
        assert!(!prepared.contains(&engine, &big));

        let prepared_small = engine.prepare(&small).unwrap();
        let in_hole = Geometry::new(
            &engine,
            polygon![(x: 4.5, y: 4.5), (x: 5.5, y: 4.5), (x: 5.5, y: 5.5), (x: 4.5, y: 5.5)].into(),
        );
        assert!(!prepared_small.intersects(&engine, &in_hole));
    }

    #[test]
    fn agrees_with_direct_predicates() {
        let engine = Engine::default_engine().unwrap();
        let source = donut(&engine);
        let prepared = engine.prepare(&source).unwrap();
        let candidates = vec![
            Geometry::new(&engine, point!(x: 3., y: 3.).into()),
            Geometry::new(&engine, point!(x: 5., y: 5.).into()),
            Geometry::new(&engine, line_string![(x: 5., y: 5.), (x: 5., y: 15.)].into()),
            Geometry::new(
                &engine,
                MultiPoint::new(vec![point!(x: 5., y: 5.), point!(x: 12., y: 1.)]).into(),
            ),
        ];
        for candidate in &candidates {
            assert_eq!(
                prepared.intersects(&engine, candidate),
                engine.intersects(&source, candidate),
                "intersects {:?}",
                candidate
            );
            assert_eq!(
                prepared.contains(&engine, candidate),
                engine.contains(&source, candidate),
                "contains {:?}",
                candidate
            );
        }
    }

    #[test]
    fn non_finite_candidate_is_false() {
        let engine = Engine::default_engine().unwrap();
        let prepared = engine.prepare(&donut(&engine)).unwrap();
        let nan = Geometry::new(&engine, point!(x: f64::NAN, y: 1.).into());
        assert!(!prepared.intersects(&engine, &nan));
        assert!(!prepared.contains(&engine, &nan));
    }
}
