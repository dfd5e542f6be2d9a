use super::polygon_validation::validate_polygon;
use crate::errors::ValidationError;
use crate::{Coordinate, SegmentPath};
use geo_types::{Geometry as GeoGeometry, LineString, Polygon};

fn path_coords(ls: &LineString<f64>) -> Vec<Coordinate> {
    ls.0.iter().copied().map(Coordinate::from).collect()
}

fn check_point(coord: Coordinate) -> Result<(), ValidationError> {
    if coord.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteCoordinate { index: 0 })
    }
}

fn check_line(ls: &LineString<f64>, degree: usize) -> Result<(), ValidationError> {
    SegmentPath::new(path_coords(ls), degree).validate_line()
}

fn check_polygon(polygon: &Polygon<f64>, degree: usize) -> Result<(), ValidationError> {
    let shell = SegmentPath::new_ring_validated(&path_coords(polygon.exterior()), degree)?;
    let holes = polygon
        .interiors()
        .iter()
        .map(|hole| SegmentPath::new_ring_validated(&path_coords(hole), degree))
        .collect::<Result<Vec<_>, _>>()?;
    validate_polygon(&shell, &holes)
}

/// Check a geometry for validity. Members of collections are checked
/// individually.
pub fn validate_geometry(geom: &GeoGeometry<f64>, degree: usize) -> Result<(), ValidationError> {
    match geom {
        GeoGeometry::Point(p) => check_point(p.0.into()),
        GeoGeometry::MultiPoint(mp) => mp.0.iter().try_for_each(|p| check_point(p.0.into())),
        GeoGeometry::Line(l) => check_line(&LineString::from(*l), degree),
        GeoGeometry::LineString(ls) => check_line(ls, degree),
        GeoGeometry::MultiLineString(mls) => mls.0.iter().try_for_each(|ls| check_line(ls, degree)),
        GeoGeometry::Polygon(p) => check_polygon(p, degree),
        GeoGeometry::MultiPolygon(mp) => mp.0.iter().try_for_each(|p| check_polygon(p, degree)),
        GeoGeometry::Rect(r) => check_polygon(&r.to_polygon(), degree),
        GeoGeometry::Triangle(t) => check_polygon(&t.to_polygon(), degree),
        GeoGeometry::GeometryCollection(gc) => {
            gc.0.iter().try_for_each(|g| validate_geometry(g, degree))
        }
    }
}
