use super::point_in_polygon::{locate_in_ring, Location};
use crate::errors::ValidationError;
use crate::errors::ValidationError::*;
use crate::utils::intersect_segments;
use crate::{Coordinate, SegmentPath};

/// Validate a polygon, on the assumption its rings are individually valid.
///
/// Holes must lie inside the shell and outside each other, touching the
/// shell or another hole in at most one point.
pub fn validate_polygon(shell: &SegmentPath, holes: &[SegmentPath]) -> Result<(), ValidationError> {
    if shell.coords().is_empty() {
        return match holes.iter().position(|h| !h.coords().is_empty()) {
            Some(i) => Err(HoleNotValid(i)),
            None => Ok(()),
        };
    }
    let shell_bounds = shell.bounds();
    for (i, hole) in holes.iter().enumerate() {
        if hole.coords().is_empty() {
            continue;
        }
        let hole_bounds = hole.bounds();
        if shell_bounds == hole_bounds || !shell_bounds.contains_bounds(hole_bounds) {
            return Err(HoleNotValid(i));
        }

        let touch = find_intersecting_point(hole, shell)
            .map_err(|e| e.unwrap_or(MultipleIntersections(0, i + 1)))?;
        if locate_in_ring(find_nonequal_point(hole.coords(), touch), shell)? != Location::Inside {
            return Err(HoleNotValid(i));
        }

        for (j, other_hole) in holes[0..i].iter().enumerate() {
            if other_hole.coords().is_empty() || !hole_bounds.intersects(other_hole.bounds()) {
                continue;
            }
            let touch = find_intersecting_point(hole, other_hole)
                .map_err(|e| e.unwrap_or(MultipleIntersections(j + 1, i + 1)))?;
            // Neither hole may be inside the other.
            let in_other = locate_in_ring(find_nonequal_point(hole.coords(), touch), other_hole)?;
            let other_in = locate_in_ring(find_nonequal_point(other_hole.coords(), touch), hole)?;
            if in_other == Location::Inside || other_in == Location::Inside {
                return Err(HoleNotValid(i));
            }
        }
    }

    // TODO: reject holes whose single touch points together disconnect the interior.

    Ok(())
}

/// Find 0 or 1 distinct intersecting points. Two or more points fail with
/// `Err(None)`, which the caller turns into a ring-specific error.
fn find_intersecting_point(
    ring_a: &SegmentPath,
    ring_b: &SegmentPath,
) -> Result<Option<Coordinate>, Option<ValidationError>> {
    let mut final_intersection = None;
    for (index_a, index_b) in ring_a.rtree().query_other_intersections(ring_b.rtree()) {
        let start_a = ring_a.coords()[index_a];
        let end_a = ring_a.coords()[index_a + 1];
        let start_b = ring_b.coords()[index_b];
        let end_b = ring_b.coords()[index_b + 1];

        let (isxn_start, isxn_end) = match intersect_segments(start_a, end_a, start_b, end_b) {
            None => continue,
            Some(isxn) => isxn,
        };
        if isxn_start != isxn_end {
            return Err(Some(OverlappingSegments {
                first_index: index_a,
                second_index: index_b,
                start: isxn_start,
                end: isxn_end,
            }));
        }
        match final_intersection {
            None => final_intersection = Some(isxn_start),
            // A shared vertex is reported by every pair of segments meeting there.
            Some(p) if p == isxn_start => {}
            Some(_) => return Err(None),
        }
    }
    Ok(final_intersection)
}

/// Find a vertex of a ring that is not the needle. Valid rings have at least
/// three distinct vertices, so the first two always contain one.
fn find_nonequal_point(coords: &[Coordinate], needle: Option<Coordinate>) -> Coordinate {
    if needle == Some(coords[0]) {
        coords[1]
    } else {
        coords[0]
    }
}
