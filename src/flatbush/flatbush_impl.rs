//! A static packed R-tree with leaves in Hilbert order, after
//! <https://github.com/mourner/flatbush>.

use super::hilbert::HilbertGrid;
use crate::utils::calculate_level_indices;
use crate::Bounds;

pub const FLATBUSH_DEFAULT_DEGREE: usize = 10;

#[derive(Debug)]
pub struct Flatbush {
    degree: usize,
    // nodes in level i are (level_indices[i] .. level_indices[i + 1] - 1)
    level_indices: Vec<usize>,
    tree: Vec<Bounds>,
    // Leaf offset -> caller's item index.
    node_indices: Vec<usize>,
}

impl Flatbush {
    pub fn new_empty() -> Flatbush {
        Flatbush {
            degree: FLATBUSH_DEFAULT_DEGREE,
            level_indices: vec![0],
            tree: vec![Bounds::new_empty()],
            node_indices: Vec::new(),
        }
    }

    /// Build a tree with leaves sorted along a Hilbert curve of their centers.
    pub fn new(degree: usize, items: &[Bounds]) -> Flatbush {
        let total_bounds = Bounds::of(items);
        if total_bounds.is_empty() {
            // The list of items are empty, or all items are empty.
            return Flatbush::new_unsorted(degree, items);
        }
        let grid = HilbertGrid::new(total_bounds);

        let mut entries: Vec<(u64, usize, Bounds)> = items
            .iter()
            .copied()
            .enumerate()
            .map(|(i, e)| (grid.key_of(e), i, e))
            .collect();

        entries.sort_unstable_by_key(|&(h, i, _)| (h, i));

        Flatbush::build(
            degree,
            entries.into_iter().map(|(_, i, e)| (i, e)).collect(),
        )
    }

    pub fn new_unsorted(degree: usize, items: &[Bounds]) -> Flatbush {
        let entries = items.iter().copied().enumerate().collect();
        Flatbush::build(degree, entries)
    }

    fn build(degree: usize, entries: Vec<(usize, Bounds)>) -> Flatbush {
        if entries.is_empty() {
            return Flatbush {
                degree: degree.max(2),
                ..Flatbush::new_empty()
            };
        }
        let degree = degree.max(2);
        let level_indices = calculate_level_indices(degree, entries.len());
        let tree_size = level_indices[level_indices.len() - 1] + 1;

        let node_indices: Vec<usize> = entries.iter().map(|(i, _e)| *i).collect();
        let mut tree: Vec<Bounds> = Vec::with_capacity(tree_size);
        tree.extend(entries.iter().map(|(_i, e)| e));

        for level in 1..level_indices.len() {
            let level_index = level_indices[level];
            tree.resize(level_index, Bounds::new_empty());

            let level_items = &tree[level_indices[level - 1]..level_indices[level]];
            let next_items: Vec<Bounds> = level_items.chunks(degree).map(Bounds::of).collect();
            tree.extend(next_items);
        }
        tree.resize(tree_size, Bounds::new_empty());

        Flatbush {
            degree,
            level_indices,
            tree,
            node_indices,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn len(&self) -> usize {
        self.node_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_indices.is_empty()
    }

    fn height(&self) -> usize {
        self.level_indices.len() - 1
    }

    fn get_bounds(&self, level: usize, offset: usize) -> Bounds {
        self.tree[self.level_indices[level] + offset]
    }

    pub fn bounds(&self) -> Bounds {
        self.get_bounds(self.height(), 0)
    }

    /**
     * Call `visitor` with each item whose bounds intersect `query`.
     *
     * This only checks bounds intersection, so the candidates must be
     * checked by the caller. Items are visited in tree order, which is
     * not meaningful to the caller.
     */
    pub fn visit_rect<F: FnMut(usize)>(&self, query: Bounds, mut visitor: F) {
        if self.is_empty() || query.is_empty() {
            return;
        }
        // Everything on the stack has level > 0 or is a real leaf.
        let mut stack: Vec<(usize, usize)> = vec![(self.height(), 0)];
        while let Some((level, offset)) = stack.pop() {
            let rect = self.get_bounds(level, offset);
            if !query.intersects(rect) {
                continue;
            }
            if level == 0 {
                visitor(self.node_indices[offset]);
            } else {
                let child_level = level - 1;
                let first_child_offset = self.degree * offset;
                let last_child_offset = first_child_offset + self.degree;
                for child_offset in first_child_offset..last_child_offset {
                    stack.push((child_level, child_offset));
                }
            }
        }
    }

    pub fn query_rect(&self, query: Bounds) -> Vec<usize> {
        let mut results = Vec::new();
        self.visit_rect(query, |index| results.push(index));
        results
    }
}
