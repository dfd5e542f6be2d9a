use crate::utils::calculate_level_indices;
use crate::{Bounds, Coordinate};

/// A packed R-tree over the segments of a path.
///
/// Leaf `i` is the bounds of segment `i` (coordinates `i` and `i + 1`), and
/// the tree is never reordered, so a node at `(level, offset)` covers the
/// contiguous segment range given by `get_low_high`.
#[derive(Debug, Clone)]
pub struct SegRTree {
    degree: usize,
    size: usize,
    height: usize,
    level_indices: Vec<usize>,
    tree: Vec<Bounds>,
}

impl SegRTree {
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn new_empty() -> Self {
        SegRTree {
            degree: 2,
            size: 0,
            height: 0,
            level_indices: vec![0],
            tree: vec![Bounds::new_empty()],
        }
    }

    pub fn new_loaded(degree: usize, rects: &[Bounds]) -> Self {
        if rects.is_empty() {
            return SegRTree::new_empty();
        }
        let degree = degree.max(2);
        let level_indices = calculate_level_indices(degree, rects.len());
        let tree_size = level_indices[level_indices.len() - 1] + 1;
        let mut tree = vec![Bounds::new_empty(); tree_size];
        copy_into_tree(&mut tree, 0, rects);

        for level in 1..level_indices.len() {
            let level_index = level_indices[level];
            let previous_items = &tree[level_indices[level - 1]..level_index];
            let next_items: Vec<Bounds> = previous_items.chunks(degree).map(Bounds::of).collect();
            copy_into_tree(&mut tree, level_index, &next_items);
        }

        tree.shrink_to_fit();
        SegRTree {
            degree,
            size: rects.len(),
            height: level_indices.len() - 1,
            level_indices,
            tree,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.get_bounds(self.height, 0)
    }

    pub fn query_rect(&self, rect: Bounds) -> Vec<usize> {
        let mut results = Vec::new();
        self.visit(
            |level, offset| self.get_bounds(level, offset).intersects(rect),
            |index| results.push(index),
        );
        results
    }

    pub fn query_point(&self, point: Coordinate) -> Vec<usize> {
        let mut results = Vec::new();
        self.visit(
            |level, offset| self.get_bounds(level, offset).contains(point),
            |index| results.push(index),
        );
        results
    }

    /// Depth-first traversal calling `on_leaf` for each leaf whose ancestors
    /// (and itself) satisfy `predicate`.
    pub(crate) fn visit<P, F>(&self, predicate: P, mut on_leaf: F)
    where
        P: Fn(usize, usize) -> bool,
        F: FnMut(usize),
    {
        if self.size == 0 {
            return;
        }

        // Stack entries: (level, offset)
        let mut stack = vec![(self.height, 0)];
        while let Some((level, offset)) = stack.pop() {
            if !predicate(level, offset) {
                continue;
            }
            if level == 0 {
                on_leaf(offset);
            } else {
                let child_level = level - 1;
                let first_child_offset = self.degree * offset;
                for child_offset in first_child_offset..(first_child_offset + self.degree) {
                    stack.push((child_level, child_offset));
                }
            }
        }
    }

    /// Candidate pairs of distinct segments whose bounds intersect.
    ///
    /// Each pair is returned once, with the smaller index first.
    pub fn query_self_intersections(&self) -> Vec<(usize, usize)> {
        let mut results = Vec::new();
        if self.size == 0 {
            return results;
        }

        let mut stack = vec![(self.height, 0, self.height, 0)];

        while let Some((level_a, offset_a, level_b, offset_b)) = stack.pop() {
            let rect_a = self.get_bounds(level_a, offset_a);
            let rect_b = self.get_bounds(level_b, offset_b);
            if !rect_a.intersects(rect_b) {
                continue;
            }

            if level_a == 0 && level_b == 0 {
                if offset_a < offset_b {
                    results.push((offset_a, offset_b));
                }
            } else if level_a == level_b {
                let child_level = level_a - 1;
                let first_child_offset = self.degree * offset_a;
                for child_offset in first_child_offset..(first_child_offset + self.degree) {
                    stack.push((child_level, child_offset, level_b, offset_b));
                }
            } else {
                let child_level = level_b - 1;
                let first_child_offset = self.degree * offset_b;
                for child_offset in first_child_offset..(first_child_offset + self.degree) {
                    stack.push((level_a, offset_a, child_level, child_offset));
                }
            }
        }

        results
    }

    /// Candidate pairs `(self_index, other_index)` whose bounds intersect.
    pub fn query_other_intersections(&self, other: &SegRTree) -> Vec<(usize, usize)> {
        let mut results = Vec::new();
        if self.size == 0 || other.size == 0 {
            return results;
        }

        let mut stack = vec![(self.height, 0, other.height, 0)];
        while let Some((level_a, offset_a, level_b, offset_b)) = stack.pop() {
            let rect_a = self.get_bounds(level_a, offset_a);
            let rect_b = other.get_bounds(level_b, offset_b);
            if !rect_a.intersects(rect_b) {
                continue;
            }

            if level_a == 0 && level_b == 0 {
                results.push((offset_a, offset_b));
            } else if level_b == 0 || (level_a > 0 && level_a >= level_b) {
                let first_child_offset = self.degree * offset_a;
                for child_offset in first_child_offset..(first_child_offset + self.degree) {
                    stack.push((level_a - 1, child_offset, level_b, offset_b));
                }
            } else {
                let first_child_offset = other.degree * offset_b;
                for child_offset in first_child_offset..(first_child_offset + other.degree) {
                    stack.push((level_a, offset_a, level_b - 1, child_offset));
                }
            }
        }

        results
    }

    pub(crate) fn get_bounds(&self, level: usize, offset: usize) -> Bounds {
        self.tree[self.level_indices[level] + offset]
    }

    /// Coordinate indices spanned by the node: segments `low..high`.
    pub(crate) fn get_low_high(&self, level: usize, offset: usize) -> (usize, usize) {
        let width = self.degree.pow(level as u32);
        let low = (width * offset).min(self.size);
        let high = (width * (offset + 1)).min(self.size);
        (low, high)
    }
}

fn copy_into_tree(tree: &mut [Bounds], index: usize, rects: &[Bounds]) {
    tree[index..index + rects.len()].copy_from_slice(rects);
}
