use crate::Coordinate;
use geo::winding_order::{Winding, WindingOrder};
use geo::CoordsIter;
use geo_types::{Coord, Geometry as GeoGeometry, LineString, Polygon};
use std::cmp::Ordering;

fn cmp_coord(a: &Coord<f64>, b: &Coord<f64>) -> Ordering {
    Coordinate::from(*a).lex_cmp(&(*b).into())
}

fn cmp_coords<'a, I>(a: I, b: I) -> Ordering
where
    I: Iterator<Item = &'a Coord<f64>>,
{
    let mut a = a;
    let mut b = b;
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp_coord(x, y) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
}

/// Orient a closed ring and rotate it to start at its smallest vertex.
fn normalize_ring(ring: &mut LineString<f64>, order: WindingOrder) {
    if ring.0.len() < 4 {
        return;
    }
    // Degenerate rings have no winding order and are left as they are.
    ring.make_winding_order(order);
    let coords = &mut ring.0;
    coords.pop();
    let start = (1..coords.len()).fold(0, |min, i| {
        if cmp_coord(&coords[i], &coords[min]) == Ordering::Less {
            i
        } else {
            min
        }
    });
    coords.rotate_left(start);
    coords.push(coords[0]);
}

/// Orient an open line so it reads from its smaller end.
fn normalize_line(line: &mut LineString<f64>) {
    let coords = &line.0;
    let n = coords.len();
    for i in 0..n / 2 {
        match cmp_coord(&coords[i], &coords[n - 1 - i]) {
            Ordering::Less => return,
            Ordering::Greater => {
                line.0.reverse();
                return;
            }
            Ordering::Equal => {}
        }
    }
}

fn normalize_polygon(polygon: &mut Polygon<f64>) {
    polygon.exterior_mut(|shell| normalize_ring(shell, WindingOrder::Clockwise));
    polygon.interiors_mut(|holes| {
        for hole in holes.iter_mut() {
            normalize_ring(hole, WindingOrder::CounterClockwise);
        }
        holes.sort_by(|a, b| cmp_coords(a.0.iter(), b.0.iter()));
    });
}

fn type_rank(geom: &GeoGeometry<f64>) -> u8 {
    match geom {
        GeoGeometry::Point(_) => 0,
        GeoGeometry::MultiPoint(_) => 1,
        GeoGeometry::Line(_) | GeoGeometry::LineString(_) => 2,
        GeoGeometry::MultiLineString(_) => 3,
        GeoGeometry::Polygon(_) | GeoGeometry::Rect(_) | GeoGeometry::Triangle(_) => 4,
        GeoGeometry::MultiPolygon(_) => 5,
        GeoGeometry::GeometryCollection(_) => 6,
    }
}

fn cmp_geometries(a: &GeoGeometry<f64>, b: &GeoGeometry<f64>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| {
        let a_coords: Vec<Coord<f64>> = a.coords_iter().collect();
        let b_coords: Vec<Coord<f64>> = b.coords_iter().collect();
        cmp_coords(a_coords.iter(), b_coords.iter())
    })
}

/// Closed paths keep their orientation and start at the smallest vertex.
fn normalize_path(ls: &mut LineString<f64>) {
    if ls.is_closed() && ls.0.len() >= 4 {
        let order = ls.winding_order().unwrap_or(WindingOrder::CounterClockwise);
        normalize_ring(ls, order);
    } else {
        normalize_line(ls);
    }
}

/// Rewrite a geometry into normal form. The caller guarantees finite
/// coordinates; comparisons are not total otherwise.
pub fn normalize_geometry(geom: &mut GeoGeometry<f64>) {
    match geom {
        GeoGeometry::Point(_) => {}
        GeoGeometry::Line(line) => {
            if cmp_coord(&line.end, &line.start) == Ordering::Less {
                *line = geo_types::Line::new(line.end, line.start);
            }
        }
        GeoGeometry::LineString(ls) => normalize_path(ls),
        GeoGeometry::Polygon(p) => normalize_polygon(p),
        GeoGeometry::Rect(r) => {
            let mut p = r.to_polygon();
            normalize_polygon(&mut p);
            *geom = GeoGeometry::Polygon(p);
        }
        GeoGeometry::Triangle(t) => {
            let mut p = t.to_polygon();
            normalize_polygon(&mut p);
            *geom = GeoGeometry::Polygon(p);
        }
        GeoGeometry::MultiPoint(mp) => mp.0.sort_by(|a, b| cmp_coord(&a.0, &b.0)),
        GeoGeometry::MultiLineString(mls) => {
            mls.0.iter_mut().for_each(normalize_path);
            mls.0.sort_by(|a, b| cmp_coords(a.0.iter(), b.0.iter()));
        }
        GeoGeometry::MultiPolygon(mp) => {
            mp.0.iter_mut().for_each(normalize_polygon);
            mp.0.sort_by(|a, b| cmp_coords(a.exterior().0.iter(), b.exterior().0.iter()));
        }
        GeoGeometry::GeometryCollection(gc) => {
            gc.0.iter_mut().for_each(normalize_geometry);
            gc.0.sort_by(cmp_geometries);
        }
    }
}
