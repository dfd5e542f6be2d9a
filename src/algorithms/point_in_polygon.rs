use crate::errors::ValidationError;
use crate::utils::winding_number;
use crate::Coordinate;
use crate::SegmentPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Boundary,
    Outside,
}

/// Locate a point relative to a closed ring.
pub fn locate_in_ring(point: Coordinate, ring: &SegmentPath) -> Result<Location, ValidationError> {
    let coords = ring.coords();
    let rtree = ring.rtree();
    if !ring.is_ring() {
        return Err(ValidationError::NotARing);
    }
    if ring.touches_point(point) {
        return Ok(Location::Boundary);
    }

    let mut wn: i32 = 0;

    // Stack entries: (level, offset)
    let mut stack = vec![(rtree.height(), 0)];
    while let Some((level, offset)) = stack.pop() {
        let rect = rtree.get_bounds(level, offset);
        if rect.min_x > point.x {
            // Everything is right of the point, so the chord from the first
            // to the last coordinate crosses the ray the same number of times.
            let (low, high) = rtree.get_low_high(level, offset);
            wn += winding_number(point, coords[low], coords[high]);
            continue;
        }
        if !rect.contains(point) {
            continue;
        }
        if level == 0 {
            wn += winding_number(point, coords[offset], coords[offset + 1]);
        } else {
            let child_level = level - 1;
            let first_child_offset = rtree.degree() * offset;
            for child_offset in first_child_offset..(first_child_offset + rtree.degree()) {
                stack.push((child_level, child_offset));
            }
        }
    }

    Ok(if wn != 0 {
        Location::Inside
    } else {
        Location::Outside
    })
}

/// Locate a point relative to a polygon given as a shell and holes.
pub fn locate_in_polygon(
    point: Coordinate,
    shell: &SegmentPath,
    holes: &[SegmentPath],
) -> Result<Location, ValidationError> {
    if shell.coords().is_empty() {
        return Ok(Location::Outside);
    }
    match locate_in_ring(point, shell)? {
        Location::Inside => {}
        other => return Ok(other),
    }
    for hole in holes {
        match locate_in_ring(point, hole)? {
            Location::Inside => return Ok(Location::Outside),
            Location::Boundary => return Ok(Location::Boundary),
            Location::Outside => {}
        }
    }
    Ok(Location::Inside)
}
