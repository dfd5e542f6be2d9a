use crate::errors::ValidationError;
use crate::seg_rtree::SegRTree;
use crate::utils::{intersect_segments, point_on_segment, segment_bounds};
use crate::{Bounds, Coordinate};

/// A path of coordinates with a segment R-tree over it.
#[derive(Debug, Clone)]
pub struct SegmentPath {
    coords: Vec<Coordinate>,
    rtree: SegRTree,
}

impl SegmentPath {
    pub fn new(coords: Vec<Coordinate>, degree: usize) -> Self {
        let rtree = if coords.len() < 2 {
            SegRTree::new_empty()
        } else {
            SegRTree::new_loaded(degree, &segment_bounds(&coords))
        };
        SegmentPath { coords, rtree }
    }

    /// Build a ring, dropping consecutive repeated coordinates, and check
    /// that it is closed, long enough and does not self-intersect.
    pub fn new_ring_validated(
        coords: &[Coordinate],
        degree: usize,
    ) -> Result<Self, ValidationError> {
        check_finite(coords)?;
        let mut deduped: Vec<Coordinate> = Vec::with_capacity(coords.len());
        for &coord in coords {
            if deduped.last() != Some(&coord) {
                deduped.push(coord);
            }
        }
        if deduped.is_empty() {
            return Ok(SegmentPath::new(deduped, degree));
        }
        if deduped.first() != deduped.last() {
            return Err(ValidationError::NotARing);
        }
        if deduped.len() < 4 {
            return Err(ValidationError::TooFewCoordinates(deduped.len()));
        }
        let path = SegmentPath::new(deduped, degree);
        let mut candidates = path.rtree.query_self_intersections();
        candidates.sort_unstable();
        for (index_a, index_b) in candidates {
            check_intersection(index_a, index_b, &path.coords)?;
        }
        Ok(path)
    }

    /// Line validity: finite, and empty or with at least two distinct points.
    pub fn validate_line(&self) -> Result<(), ValidationError> {
        check_finite(&self.coords)?;
        match self.coords.first() {
            None => Ok(()),
            Some(first) if self.coords.iter().any(|c| c != first) => Ok(()),
            Some(_) => Err(ValidationError::SinglePathCoordinate),
        }
    }

    pub fn coords(&self) -> &[Coordinate] {
        &self.coords
    }

    pub fn rtree(&self) -> &SegRTree {
        &self.rtree
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_coords(self.coords.iter().copied())
    }

    pub fn is_ring(&self) -> bool {
        self.coords.len() >= 4 && self.coords.first() == self.coords.last()
    }

    /// Whether `point` lies on one of the segments.
    pub fn touches_point(&self, point: Coordinate) -> bool {
        if self.coords.len() == 1 {
            return self.coords[0] == point;
        }
        self.rtree
            .query_point(point)
            .into_iter()
            .any(|i| point_on_segment(point, self.coords[i], self.coords[i + 1]))
    }

    /// Whether any segment of `self` meets any segment of `other`.
    pub fn intersects_path(&self, other: &SegmentPath) -> bool {
        if self.coords.len() == 1 {
            return other.touches_point(self.coords[0]);
        }
        if other.coords.len() == 1 {
            return self.touches_point(other.coords[0]);
        }
        self.rtree
            .query_other_intersections(&other.rtree)
            .into_iter()
            .any(|(a, b)| {
                intersect_segments(
                    self.coords[a],
                    self.coords[a + 1],
                    other.coords[b],
                    other.coords[b + 1],
                )
                .is_some()
            })
    }
}

fn check_finite(coords: &[Coordinate]) -> Result<(), ValidationError> {
    match coords.iter().position(|c| !c.is_finite()) {
        Some(index) => Err(ValidationError::NonFiniteCoordinate { index }),
        None => Ok(()),
    }
}

fn check_intersection(
    index: usize,
    other_index: usize,
    coords: &[Coordinate],
) -> Result<(), ValidationError> {
    let first_index = index.min(other_index);
    let second_index = index.max(other_index);
    let first_start = coords[first_index];
    let first_end = coords[first_index + 1];
    let second_start = coords[second_index];
    let second_end = coords[second_index + 1];
    let (isxn_start, isxn_end) =
        match intersect_segments(first_start, first_end, second_start, second_end) {
            None => return Ok(()),
            Some(isxn) => isxn,
        };
    if isxn_start != isxn_end {
        return Err(ValidationError::OverlappingSegments {
            first_index,
            second_index,
            start: isxn_start,
            end: isxn_end,
        });
    }
    let adjacent = first_index + 1 == second_index && isxn_start == second_start;
    let closing = first_index == 0
        && second_index == coords.len() - 2
        && isxn_start == first_start
        && isxn_start == second_end;
    if adjacent || closing {
        Ok(())
    } else {
        Err(ValidationError::SelfIntersection {
            first_index,
            second_index,
            position: isxn_start,
        })
    }
}
