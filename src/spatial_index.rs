//! An append-only spatial index over shared geometries.
//!
//! Geometries are added to an [`IndexBuilder`], which [`build`] freezes into
//! a queryable [`SpatialIndex`]. There is no way to add after building, so
//! additions can never race with queries. A built index is `Send + Sync` and
//! may be shared between workers, each querying with its own engine.
//!
//! [`build`]: IndexBuilder::build

use crate::engine::Engine;
use crate::errors::{GeomError, Result};
use crate::flatbush::Flatbush;
use crate::geometry::{Geometry, SharedGeometry};
use crate::prepared::PreparedGeometry;
use crate::{Bounds, HasBounds};
use crossbeam_channel::bounded;
use std::thread;
use tracing::{debug, warn};

// Candidate ids in flight between the tree traversal and the consumer.
const QUERY_CHANNEL_CAPACITY: usize = 64;

/// The exact test applied to candidates whose bounds match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The indexed geometry intersects the query geometry.
    Intersects,
    /// The indexed geometry contains the query geometry.
    Contains,
    /// Bounds overlap only; no exact test.
    BoundsOnly,
}

/// One indexed geometry and its prepared form.
#[derive(Debug)]
pub struct IndexEntry {
    id: usize,
    geometry: SharedGeometry,
    prepared: Option<PreparedGeometry>,
    bounds: Bounds,
}

impl IndexEntry {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn geometry(&self) -> &SharedGeometry {
        &self.geometry
    }

    pub fn prepared(&self) -> Option<&PreparedGeometry> {
        self.prepared.as_ref()
    }

    fn matches(&self, engine: &Engine, query: &Geometry, predicate: Predicate) -> bool {
        match (predicate, &self.prepared) {
            (Predicate::BoundsOnly, _) => true,
            (Predicate::Intersects, Some(prepared)) => prepared.intersects(engine, query),
            (Predicate::Contains, Some(prepared)) => prepared.contains(engine, query),
            (Predicate::Intersects, None) => engine.intersects(&self.geometry, query),
            (Predicate::Contains, None) => engine.contains(&self.geometry, query),
        }
    }
}

impl HasBounds for IndexEntry {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Collects geometries before the index is built.
#[derive(Debug)]
pub struct IndexBuilder {
    entries: Vec<IndexEntry>,
    node_capacity: usize,
}

impl Engine {
    pub fn create_index(&self) -> Result<IndexBuilder> {
        self.create_index_with_capacity(0)
    }

    /// An index builder with room for `capacity` geometries.
    pub fn create_index_with_capacity(&self, capacity: usize) -> Result<IndexBuilder> {
        let mut entries = Vec::new();
        entries.try_reserve(capacity).map_err(|e| {
            GeomError::IndexCreate(format!("could not reserve {} entries: {}", capacity, e))
        })?;
        Ok(IndexBuilder {
            entries,
            node_capacity: self.config().index_node_capacity,
        })
    }
}

impl IndexBuilder {
    /// Append a geometry and return its id, which is the number of entries
    /// added before it.
    ///
    /// The geometry is prepared eagerly. If preparing fails the entry is
    /// still added and queries fall back to unprepared predicates.
    pub fn add(&mut self, engine: &Engine, geometry: impl Into<SharedGeometry>) -> usize {
        let geometry = geometry.into();
        let id = self.entries.len();
        let prepared = match engine.prepare(&geometry) {
            Ok(prepared) => Some(prepared),
            Err(e) => {
                warn!(target: "geom_engine", id, error = %e, "indexing unprepared geometry");
                None
            }
        };
        let bounds = geometry.bounds();
        self.entries.push(IndexEntry {
            id,
            geometry,
            prepared,
            bounds,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the entries into a queryable index.
    pub fn build(self) -> SpatialIndex {
        let bounds: Vec<Bounds> = self.entries.iter().map(|e| e.bounds).collect();
        let tree = Flatbush::new(self.node_capacity, &bounds);
        debug!(target: "geom_engine", entries = self.entries.len(), "spatial index built");
        SpatialIndex {
            entries: self.entries,
            tree,
        }
    }
}

/// A built, read-only spatial index.
#[derive(Debug)]
pub struct SpatialIndex {
    entries: Vec<IndexEntry>,
    tree: Flatbush,
}

impl SpatialIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Ids of entries whose bounds intersect `bounds`, in tree order.
    pub fn candidates(&self, bounds: Bounds) -> Vec<usize> {
        self.tree.query_rect(bounds)
    }

    /// Entries matching `predicate` against `geometry`, in tree order.
    ///
    /// The order carries no spatial meaning.
    pub fn query(
        &self,
        engine: &Engine,
        geometry: &Geometry,
        predicate: Predicate,
    ) -> Vec<&IndexEntry> {
        let mut hits = Vec::new();
        self.tree.visit_rect(geometry.bounds(), |id| {
            let entry = &self.entries[id];
            if entry.matches(engine, geometry, predicate) {
                hits.push(entry);
            }
        });
        hits
    }

    pub fn query_ids(&self, engine: &Engine, geometry: &Geometry, predicate: Predicate) -> Vec<usize> {
        self.query(engine, geometry, predicate)
            .into_iter()
            .map(IndexEntry::id)
            .collect()
    }

    /// Like [`query`](SpatialIndex::query), but the tree is traversed on a
    /// separate thread that hands candidate ids over a bounded channel.
    /// Exact tests run on the calling thread with `engine`, and each match
    /// is passed to `consumer`. Returns the number of matches.
    ///
    /// The traversal always runs to completion and closes the channel, also
    /// when nothing matches.
    pub fn query_stream<F>(
        &self,
        engine: &Engine,
        geometry: &Geometry,
        predicate: Predicate,
        mut consumer: F,
    ) -> usize
    where
        F: FnMut(&IndexEntry),
    {
        let query_bounds = geometry.bounds();
        let tree = &self.tree;
        thread::scope(|s| {
            // The receiver must drop before the scope joins the producer,
            // even when the consumer panics.
            let (sender, receiver) = bounded::<usize>(QUERY_CHANNEL_CAPACITY);
            s.spawn(move || {
                tree.visit_rect(query_bounds, |id| {
                    // Fails only once the consumer has gone away.
                    let _ = sender.send(id);
                });
                // `sender` is dropped here, closing the channel.
            });
            let mut matched = 0;
            for id in receiver.iter() {
                let entry = &self.entries[id];
                if entry.matches(engine, geometry, predicate) {
                    matched += 1;
                    consumer(entry);
                }
            }
            matched
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::{bounds_polygon, point};
    use std::collections::HashSet;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;

    fn cell(engine: &Engine, i: usize) -> Geometry {
        let x = (i % 10) as f64 * 10.;
        let y = (i / 10) as f64 * 10.;
        bounds_polygon(engine, Bounds::from_extents(x, y, x + 5., y + 5.)).unwrap()
    }

    fn grid(engine: &Engine, n: usize) -> SpatialIndex {
        let mut builder = engine.create_index().unwrap();
        for i in 0..n {
            assert_eq!(builder.add(engine, cell(engine, i)), i);
        }
        builder.build()
    }

    fn id_set(ids: Vec<usize>) -> HashSet<usize> {
        ids.into_iter().collect()
    }

    #[test]
    fn disjoint_entries_match_one() {
        let engine = Engine::default_engine().unwrap();
        let index = grid(&engine, 50);
        assert_eq!(index.len(), 50);
        for k in [0, 7, 23, 49] {
            let target = cell(&engine, k);
            for predicate in [Predicate::Intersects, Predicate::Contains, Predicate::BoundsOnly] {
                assert_eq!(index.query_ids(&engine, &target, predicate), vec![k]);
            }
        }
    }

    #[test]
    fn overlapping_entries_match_all() {
        let engine = Engine::default_engine().unwrap();
        let mut builder = engine.create_index_with_capacity(30).unwrap();
        for i in 0..30 {
            let offset = i as f64 * 0.1;
            let square = bounds_polygon(
                &engine,
                Bounds::from_extents(-10. + offset, -10., 10. + offset, 10.),
            )
            .unwrap();
            builder.add(&engine, square);
        }
        let index = builder.build();
        let target = point(&engine, 0.5, 0.5).unwrap();
        let expected: HashSet<usize> = (0..30).collect();
        assert_eq!(
            id_set(index.query_ids(&engine, &target, Predicate::Contains)),
            expected
        );
        assert_eq!(
            id_set(index.query_ids(&engine, &target, Predicate::Intersects)),
            expected
        );
    }

    #[test]
    fn exact_test_filters_candidates() {
        let engine = Engine::default_engine().unwrap();
        let mut builder = engine.create_index().unwrap();
        let triangle = engine
            .from_wkt("POLYGON((0 0,10 0,0 10,0 0))")
            .unwrap();
        builder.add(&engine, triangle);
        let index = builder.build();
        // Inside the bounds, outside the triangle.
        let target = point(&engine, 8., 8.).unwrap();
        assert_eq!(index.query_ids(&engine, &target, Predicate::BoundsOnly), vec![0]);
        assert!(index.query_ids(&engine, &target, Predicate::Intersects).is_empty());
    }

    #[test]
    fn empty_index_terminates() {
        let engine = Engine::default_engine().unwrap();
        let index = engine.create_index().unwrap().build();
        let target = point(&engine, 1., 1.).unwrap();
        assert!(index.query(&engine, &target, Predicate::Intersects).is_empty());
        let matched = index.query_stream(&engine, &target, Predicate::Intersects, |_| {
            panic!("no entries to match")
        });
        assert_eq!(matched, 0);
    }

    #[test]
    fn stream_matches_query() {
        let engine = Engine::default_engine().unwrap();
        // More entries than the channel holds at once.
        let index = grid(&engine, 100);
        let target = bounds_polygon(&engine, Bounds::from_extents(-1., -1., 1000., 1000.)).unwrap();
        let mut streamed = Vec::new();
        let matched = index.query_stream(&engine, &target, Predicate::Intersects, |entry| {
            streamed.push(entry.id())
        });
        assert_eq!(matched, 100);
        assert_eq!(
            id_set(streamed),
            id_set(index.query_ids(&engine, &target, Predicate::Intersects))
        );
    }

    #[test]
    fn panicking_consumer_does_not_hang() {
        let engine = Engine::default_engine().unwrap();
        // Far more candidates than the channel holds.
        let index = grid(&engine, 100);
        let target = bounds_polygon(&engine, Bounds::from_extents(-1., -1., 1000., 1000.)).unwrap();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            index.query_stream(&engine, &target, Predicate::BoundsOnly, |_| {
                panic!("consumer failed")
            })
        }));
        assert!(result.is_err());
        // The index stays usable afterwards.
        assert_eq!(index.query_ids(&engine, &target, Predicate::BoundsOnly).len(), 100);
    }

    #[test]
    fn unprepared_entries_still_match() {
        let engine = Engine::default_engine().unwrap();
        let mut builder = engine.create_index().unwrap();
        let mut seq = engine.create_coord_seq(2, 2).unwrap();
        seq.set_xy(0, 0., 0.).unwrap();
        seq.set_xy(1, f64::NAN, 1.).unwrap();
        let broken = seq.into_line_string(&engine).unwrap();
        builder.add(&engine, broken);
        builder.add(&engine, cell(&engine, 0));
        let index = builder.build();
        assert!(index.get(0).unwrap().prepared().is_none());
        assert!(index.get(1).unwrap().prepared().is_some());
        let target = point(&engine, 1., 1.).unwrap();
        assert_eq!(index.query_ids(&engine, &target, Predicate::Contains), vec![1]);
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn index_is_shareable() {
        assert_send_sync::<SpatialIndex>();
        assert_send_sync::<IndexEntry>();
    }

    #[test]
    fn shared_across_workers() {
        let engine = Engine::default_engine().unwrap();
        let index = Arc::new(grid(&engine, 20));
        let handles: Vec<_> = (0..4)
            .map(|k| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    let engine = Engine::default_engine().unwrap();
                    let target = cell(&engine, k);
                    index.query_ids(&engine, &target, Predicate::Intersects)
                })
            })
            .collect();
        for (k, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), vec![k]);
        }
    }

    #[test]
    fn index_keeps_geometries_alive() {
        let engine = Engine::default_engine().unwrap();
        let shared = cell(&engine, 3).into_shared();
        let mut builder = engine.create_index().unwrap();
        builder.add(&engine, Arc::clone(&shared));
        let index = builder.build();
        drop(shared);
        assert_eq!(engine.stats().live_geometries, 1);
        assert_eq!(engine.stats().live_prepared, 1);
        drop(index);
        assert_eq!(engine.stats().total(), 0);
    }
}
