//! Predicates and overlay operations.
//!
//! Boolean predicates never fail. When the engine cannot decide, e.g. for
//! non-finite coordinates, the outcome is logged and read as `false`.

use crate::algorithms::{merge_lines, normalize_geometry, validate_geometry};
use crate::engine::{Engine, Outcome};
use crate::errors::{GeomError, Result, ValidationError};
use crate::geometry::Geometry;
use geo::{BooleanOps, Intersects, Relate};
use geo_types::{
    Geometry as GeoGeometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
};

fn decide<F>(a: &Geometry, b: &Geometry, test: F) -> Outcome
where
    F: FnOnce(&GeoGeometry<f64>, &GeoGeometry<f64>) -> bool,
{
    if a.has_non_finite() || b.has_non_finite() {
        return Outcome::Exception(format!(
            "non-finite coordinate in {} / {} operands",
            a.geom_type(),
            b.geom_type()
        ));
    }
    test(a.geo(), b.geo()).into()
}

fn ensure_finite(geom: &Geometry) -> Result<()> {
    match geom.first_non_finite() {
        Some(index) => Err(ValidationError::NonFiniteCoordinate { index }.into()),
        None => Ok(()),
    }
}

fn polygonal(geom: &Geometry, operation: &'static str) -> Result<MultiPolygon<f64>> {
    match geom.geo() {
        GeoGeometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        GeoGeometry::MultiPolygon(mp) => Ok(mp.clone()),
        GeoGeometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        GeoGeometry::Triangle(t) => Ok(MultiPolygon::new(vec![t.to_polygon()])),
        _ => Err(GeomError::Unsupported {
            operation,
            geom_type: geom.geom_type().to_string(),
        }),
    }
}

fn lineal(geom: &Geometry) -> Option<MultiLineString<f64>> {
    match geom.geo() {
        GeoGeometry::Line(l) => Some(MultiLineString::new(vec![LineString::from(*l)])),
        GeoGeometry::LineString(ls) => Some(MultiLineString::new(vec![ls.clone()])),
        GeoGeometry::MultiLineString(mls) => Some(mls.clone()),
        _ => None,
    }
}

fn puntal(geom: &Geometry) -> Option<Vec<Point<f64>>> {
    match geom.geo() {
        GeoGeometry::Point(p) => Some(vec![*p]),
        GeoGeometry::MultiPoint(mp) => Some(mp.0.clone()),
        _ => None,
    }
}

impl Engine {
    /// Rewrite a geometry into normal form in place.
    pub fn normalize(&self, geom: &mut Geometry) -> Result<()> {
        if geom.has_non_finite() {
            return Err(GeomError::Normalization(format!(
                "{} has non-finite coordinates",
                geom.geom_type()
            )));
        }
        normalize_geometry(geom.geo_mut());
        Ok(())
    }

    /// The reason a geometry is invalid, if it is.
    pub fn validate(&self, geom: &Geometry) -> std::result::Result<(), ValidationError> {
        validate_geometry(geom.geo(), self.config().prepared_degree)
    }

    pub fn is_valid(&self, geom: &Geometry) -> bool {
        match self.validate(geom) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(target: "geom_engine", %reason, "invalid geometry");
                false
            }
        }
    }

    /// Topological equality.
    pub fn equals(&self, a: &Geometry, b: &Geometry) -> bool {
        let outcome = decide(a, b, |a, b| a.relate(b).is_equal_topo());
        self.resolve("equals", outcome)
    }

    /// Whether `a` contains `b`.
    pub fn contains(&self, a: &Geometry, b: &Geometry) -> bool {
        let outcome = decide(a, b, |a, b| a.relate(b).is_contains());
        self.resolve("contains", outcome)
    }

    pub fn intersects(&self, a: &Geometry, b: &Geometry) -> bool {
        let outcome = decide(a, b, |a, b| a.intersects(b));
        self.resolve("intersects", outcome)
    }

    /// The intersection of a polygonal geometry with a polygonal, lineal or
    /// puntal one, as a new owned geometry.
    pub fn intersection(&self, a: &Geometry, b: &Geometry) -> Result<Geometry> {
        ensure_finite(a)?;
        ensure_finite(b)?;
        let (area, other) = if a.geom_type().is_polygonal() {
            (polygonal(a, "intersection")?, b)
        } else if b.geom_type().is_polygonal() {
            (polygonal(b, "intersection")?, a)
        } else {
            return Err(GeomError::Unsupported {
                operation: "intersection",
                geom_type: format!("{} and {}", a.geom_type(), b.geom_type()),
            });
        };

        let result = if other.geom_type().is_polygonal() {
            GeoGeometry::MultiPolygon(area.intersection(&polygonal(other, "intersection")?))
        } else if let Some(lines) = lineal(other) {
            GeoGeometry::MultiLineString(area.clip(&lines, false))
        } else if let Some(points) = puntal(other) {
            let inside = points
                .into_iter()
                .filter(|p| area.intersects(p))
                .collect::<Vec<_>>();
            GeoGeometry::MultiPoint(MultiPoint::new(inside))
        } else {
            return Err(GeomError::Unsupported {
                operation: "intersection",
                geom_type: other.geom_type().to_string(),
            });
        };
        Ok(Geometry::new(self, result))
    }

    /// Union of polygonal geometries, gathered into one collection first.
    pub fn unary_union(&self, geometries: Vec<Geometry>) -> Result<Geometry> {
        let mut union = MultiPolygon::new(Vec::new());
        for geom in &geometries {
            ensure_finite(geom)?;
            union = union.union(&polygonal(geom, "unary_union")?);
        }
        Ok(Geometry::new(self, GeoGeometry::MultiPolygon(union)))
    }

    /// Merge touching lines into maximal chains.
    ///
    /// A single merged chain comes back as one LineString; otherwise the
    /// parts of the merged collection are returned.
    pub fn line_merge(&self, lines: Vec<Geometry>) -> Result<Vec<Geometry>> {
        let mut parts: Vec<LineString<f64>> = Vec::new();
        for line in &lines {
            match lineal(line) {
                Some(mls) => parts.extend(mls.0),
                None => {
                    return Err(GeomError::Unsupported {
                        operation: "line_merge",
                        geom_type: line.geom_type().to_string(),
                    })
                }
            }
        }
        Ok(merge_lines(parts)
            .into_iter()
            .map(|ls| Geometry::new(self, GeoGeometry::LineString(ls)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeometryType;
    use geo_types::{line_string, point, polygon};

    fn geom(engine: &Engine, g: impl Into<GeoGeometry<f64>>) -> Geometry {
        Geometry::new(engine, g.into())
    }

    fn square(engine: &Engine, min: f64, max: f64) -> Geometry {
        geom(
            engine,
            polygon![(x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max)],
        )
    }

    #[test]
    fn self_predicates() {
        let engine = Engine::default_engine().unwrap();
        let samples = vec![
            square(&engine, 0., 1.),
            geom(&engine, line_string![(x: 0., y: 0.), (x: 3., y: 1.)]),
            geom(&engine, point!(x: 2., y: 2.)),
        ];
        for a in &samples {
            assert!(engine.is_valid(a));
            assert!(engine.intersects(a, a));
            assert!(engine.contains(a, a));
            assert!(engine.equals(a, a));
        }
    }

    #[test]
    fn containment() {
        let engine = Engine::default_engine().unwrap();
        let big = square(&engine, 0., 10.);
        let small = square(&engine, 2., 3.);
        let far = square(&engine, 20., 30.);
        assert!(engine.contains(&big, &small));
        assert!(!engine.contains(&small, &big));
        assert!(engine.intersects(&big, &small));
        assert!(!engine.intersects(&big, &far));
    }

    #[test]
    fn non_finite_predicates_are_false() {
        let engine = Engine::default_engine().unwrap();
        let nan = geom(&engine, point!(x: f64::NAN, y: 0.));
        let square = square(&engine, -1., 1.);
        assert!(!engine.intersects(&square, &nan));
        assert!(!engine.contains(&square, &nan));
        assert!(!engine.is_valid(&nan));
    }

    #[test]
    fn normalize_makes_windings_equal() {
        let engine = Engine::default_engine().unwrap();
        let mut a = geom(
            &engine,
            polygon![(x: 0., y: 0.), (x: 4., y: 0.), (x: 4., y: 2.), (x: 0., y: 2.)],
        );
        let mut b = geom(
            &engine,
            polygon![(x: 0., y: 0.), (x: 0., y: 2.), (x: 4., y: 2.), (x: 4., y: 0.)],
        );
        engine.normalize(&mut a).unwrap();
        engine.normalize(&mut b).unwrap();
        assert_eq!(a.geo(), b.geo());
        assert!(engine.equals(&a, &b));

        let mut nan = geom(&engine, point!(x: f64::NAN, y: 0.));
        assert!(matches!(
            engine.normalize(&mut nan),
            Err(GeomError::Normalization(_))
        ));
    }

    #[test]
    fn polygon_intersection() {
        let engine = Engine::default_engine().unwrap();
        let a = square(&engine, 0., 2.);
        let b = square(&engine, 1., 3.);
        let result = engine.intersection(&a, &b).unwrap();
        assert_eq!(result.geom_type(), GeometryType::MultiPolygon);
        assert!((result.area() - 1.).abs() < 1e-9);
    }

    #[test]
    fn line_and_point_intersection() {
        let engine = Engine::default_engine().unwrap();
        let area = square(&engine, 0., 2.);
        let line = geom(&engine, line_string![(x: -1., y: 1.), (x: 3., y: 1.)]);
        let clipped = engine.intersection(&area, &line).unwrap();
        assert!((clipped.length() - 2.).abs() < 1e-9);

        let points = geom(
            &engine,
            MultiPoint::new(vec![point!(x: 1., y: 1.), point!(x: 5., y: 5.)]),
        );
        let inside = engine.intersection(&points, &area).unwrap();
        assert_eq!(inside.num_coords(), 1);

        let other_line = geom(&engine, line_string![(x: 0., y: 0.), (x: 1., y: 1.)]);
        assert!(matches!(
            engine.intersection(&line, &other_line),
            Err(GeomError::Unsupported { .. })
        ));
    }

    #[test]
    fn union_of_overlapping_squares() {
        let engine = Engine::default_engine().unwrap();
        let union = engine
            .unary_union(vec![square(&engine, 0., 2.), square(&engine, 1., 3.)])
            .unwrap();
        assert!((union.area() - 7.).abs() < 1e-9);
        assert_eq!(union.num_geoms(), 1);
        assert_eq!(engine.stats().live_geometries, 1);
    }

    #[test]
    fn merge_connected_lines() {
        let engine = Engine::default_engine().unwrap();
        let merged = engine
            .line_merge(vec![
                geom(&engine, line_string![(x: 0., y: 0.), (x: 1., y: 0.)]),
                geom(&engine, line_string![(x: 1., y: 0.), (x: 2., y: 1.)]),
            ])
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].geom_type(), GeometryType::LineString);
        assert_eq!(merged[0].num_coords(), 3);

        let apart = engine
            .line_merge(vec![
                geom(&engine, line_string![(x: 0., y: 0.), (x: 1., y: 0.)]),
                geom(&engine, line_string![(x: 5., y: 5.), (x: 6., y: 5.)]),
            ])
            .unwrap();
        assert_eq!(apart.len(), 2);
    }

    #[test]
    fn overlay_reports_non_finite_position() {
        let engine = Engine::default_engine().unwrap();
        let holed = geom(
            &engine,
            polygon![(x: 0., y: 0.), (x: 4., y: 0.), (x: f64::NAN, y: 4.), (x: 0., y: 4.)],
        );
        let expected = Err(GeomError::InvalidGeometry(
            ValidationError::NonFiniteCoordinate { index: 2 },
        ));
        assert_eq!(
            engine
                .intersection(&square(&engine, 0., 1.), &holed)
                .map(|g| g.geom_type()),
            expected
        );
        assert_eq!(
            engine
                .unary_union(vec![square(&engine, 0., 1.), holed])
                .map(|g| g.geom_type()),
            expected
        );
    }
}
