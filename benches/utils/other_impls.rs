use geom_index::{Bounds, Coordinate};
use rstar::{RTree, RTreeObject, AABB};

pub struct Segment {
    start: Coordinate,
    end: Coordinate,
}

impl RTreeObject for Segment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.start.x, self.start.y], [self.end.x, self.end.y])
    }
}

pub struct IndexedBox {
    pub id: usize,
    bounds: Bounds,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

pub(crate) fn build_rstar_boxes(boxes: &[Bounds]) -> RTree<IndexedBox> {
    RTree::bulk_load(
        boxes
            .iter()
            .enumerate()
            .map(|(id, &bounds)| IndexedBox { id, bounds })
            .collect(),
    )
}

pub(crate) fn build_rstar_ring(coords: &[Coordinate]) -> RTree<Segment> {
    RTree::bulk_load(
        coords
            .windows(2)
            .map(|w| Segment {
                start: w[0],
                end: w[1],
            })
            .collect(),
    )
}

fn winding_number(point: Coordinate, start: Coordinate, end: Coordinate) -> i32 {
    let side = (end.x - start.x) * (point.y - start.y) - (point.x - start.x) * (end.y - start.y);
    if start.y <= point.y && end.y > point.y && side > 0. {
        1
    } else if start.y > point.y && end.y <= point.y && side < 0. {
        -1
    } else {
        0
    }
}

pub(crate) fn point_in_polygon_rstar(point: Coordinate, rtree: &RTree<Segment>) -> bool {
    let mut wn: i32 = 0;

    let ray = AABB::from_corners([point.x, point.y], [f64::INFINITY, point.y]);
    for seg in rtree.locate_in_envelope_intersecting(&ray) {
        wn += winding_number(point, seg.start, seg.end);
    }

    wn != 0
}
