use geo_types::{Coord, LineString};
use std::collections::HashMap;

/// Hashable key for an exact endpoint.
fn node_key(coord: Coord<f64>) -> (u64, u64) {
    (coord.x.to_bits(), coord.y.to_bits())
}

/// Merge lines that meet end to end at nodes of degree two.
///
/// Lines are joined, reversing where needed, into maximal chains. Chains stop
/// at endpoints shared by one or three or more lines. Closed chains are
/// emitted as rings. Zero-length and empty lines are dropped.
pub fn merge_lines(lines: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
    let lines: Vec<LineString<f64>> = lines
        .into_iter()
        .filter(|l| (l.0.len() >= 2 && l.0.first() != l.0.last()) || l.0.len() >= 4)
        .collect();

    // Node -> (line index, line starts at this node)
    let mut incident: HashMap<(u64, u64), Vec<(usize, bool)>> = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        let (first, last) = match (line.0.first(), line.0.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => continue,
        };
        incident.entry(node_key(first)).or_default().push((i, true));
        incident.entry(node_key(last)).or_default().push((i, false));
    }
    let degree = |coord: Coord<f64>| incident.get(&node_key(coord)).map_or(0, Vec::len);

    let mut used = vec![false; lines.len()];
    let mut merged = Vec::new();

    let walk = |start_line: usize, forward: bool, used: &mut Vec<bool>| {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        let mut current = (start_line, forward);
        loop {
            let (index, forward) = current;
            used[index] = true;
            let mut part = lines[index].0.clone();
            if !forward {
                part.reverse();
            }
            let end = part[part.len() - 1];
            if coords.is_empty() {
                coords.extend(part);
            } else {
                coords.extend(part.into_iter().skip(1));
            }
            if degree(end) != 2 {
                break;
            }
            let next = incident
                .get(&node_key(end))
                .and_then(|edges| edges.iter().find(|(i, _)| !used[*i]).copied());
            match next {
                Some(edge) => current = edge,
                None => break,
            }
        }
        LineString::new(coords)
    };

    // Chains that start at a node other than degree two.
    for i in 0..lines.len() {
        if used[i] {
            continue;
        }
        let first = lines[i].0[0];
        let last = lines[i].0[lines[i].0.len() - 1];
        if degree(first) != 2 {
            merged.push(walk(i, true, &mut used));
        } else if degree(last) != 2 {
            merged.push(walk(i, false, &mut used));
        }
    }
    // Whatever remains forms closed loops through degree-two nodes.
    for i in 0..lines.len() {
        if !used[i] {
            merged.push(walk(i, true, &mut used));
        }
    }
    merged
}
