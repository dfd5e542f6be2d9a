//! Engine contexts.
//!
//! An [`Engine`] is the entry point for constructing, serializing and testing
//! geometries. One engine serves one unit of work at a time: it may be moved
//! to a worker thread but never shared between threads. Fan-out uses one
//! engine per worker, see [`EnginePool`](crate::EnginePool).
//!
//! Every object created through an engine is counted until it is dropped.
//! Dropping never needs the engine, so geometries may outlive the context
//! that built them (e.g. inside a [`SpatialIndex`](crate::SpatialIndex)).

use crate::config::EngineConfig;
use crate::errors::Result;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct Counters {
    geometries: AtomicUsize,
    coord_seqs: AtomicUsize,
    prepared: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectKind {
    Geometry,
    CoordSeq,
    Prepared,
}

impl Counters {
    fn counter(&self, kind: ObjectKind) -> &AtomicUsize {
        match kind {
            ObjectKind::Geometry => &self.geometries,
            ObjectKind::CoordSeq => &self.coord_seqs,
            ObjectKind::Prepared => &self.prepared,
        }
    }
}

/// Marks one live object created by an engine; releases it on drop.
#[derive(Debug)]
pub(crate) struct LiveToken {
    counters: Arc<Counters>,
    kind: ObjectKind,
}

impl LiveToken {
    fn new(counters: &Arc<Counters>, kind: ObjectKind) -> Self {
        counters.counter(kind).fetch_add(1, Ordering::Relaxed);
        LiveToken {
            counters: Arc::clone(counters),
            kind,
        }
    }

    /// Transfer the token to a different kind of object.
    pub(crate) fn convert(self, kind: ObjectKind) -> LiveToken {
        LiveToken::new(&self.counters, kind)
    }
}

impl Clone for LiveToken {
    fn clone(&self) -> Self {
        LiveToken::new(&self.counters, self.kind)
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.counters
            .counter(self.kind)
            .fetch_sub(1, Ordering::Relaxed);
    }
}

/// Objects created through an engine that have not been dropped yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub live_geometries: usize,
    pub live_coord_seqs: usize,
    pub live_prepared: usize,
}

impl EngineStats {
    pub fn total(&self) -> usize {
        self.live_geometries + self.live_coord_seqs + self.live_prepared
    }
}

/// Outcome of a boolean predicate. The engine reports `Exception` when it
/// cannot decide, e.g. for non-finite coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    True,
    False,
    Exception(String),
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value {
            Outcome::True
        } else {
            Outcome::False
        }
    }
}

/// A thread-confined geometry engine context.
#[derive(Debug)]
pub struct Engine {
    id: u64,
    config: EngineConfig,
    counters: Arc<Counters>,
    // Send but not Sync.
    _not_sync: PhantomData<Cell<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Engine> {
        config.validate()?;
        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        debug!(target: "geom_engine", engine = id, ?config, "engine initialized");
        Ok(Engine {
            id,
            config,
            counters: Arc::new(Counters::default()),
            _not_sync: PhantomData,
        })
    }

    pub fn default_engine() -> Result<Engine> {
        Engine::new(EngineConfig::default())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            live_geometries: self.counters.geometries.load(Ordering::Relaxed),
            live_coord_seqs: self.counters.coord_seqs.load(Ordering::Relaxed),
            live_prepared: self.counters.prepared.load(Ordering::Relaxed),
        }
    }

    /// Release the context. Objects still alive stay valid; they are
    /// reported so leaks show up in the log.
    pub fn finish(self) -> EngineStats {
        let stats = self.stats();
        if stats.live_coord_seqs > 0 {
            warn!(
                target: "geom_engine",
                engine = self.id,
                live_coord_seqs = stats.live_coord_seqs,
                "engine finished with unconverted coordinate sequences"
            );
        }
        debug!(
            target: "geom_engine",
            engine = self.id,
            live_geometries = stats.live_geometries,
            live_prepared = stats.live_prepared,
            "engine finished"
        );
        stats
    }

    pub(crate) fn token(&self, kind: ObjectKind) -> LiveToken {
        LiveToken::new(&self.counters, kind)
    }

    /// Forward an engine diagnostic to the log. Never fails or blocks.
    pub(crate) fn notice(&self, operation: &str, message: &str) {
        warn!(target: "geom_engine", engine = self.id, operation, "{}", message);
    }

    /// Collapse a predicate outcome to a boolean; exceptions are logged and
    /// read as `false`.
    pub(crate) fn resolve(&self, operation: &str, outcome: Outcome) -> bool {
        match outcome {
            Outcome::True => true,
            Outcome::False => false,
            Outcome::Exception(message) => {
                self.notice(operation, &message);
                false
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        debug!(target: "geom_engine", engine = self.id, "engine released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeomError;

    fn assert_send<T: Send>() {}

    #[test]
    fn engine_is_send() {
        assert_send::<Engine>();
    }

    #[test]
    fn rejects_bad_config() {
        let config = EngineConfig {
            prepared_degree: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(GeomError::EngineInit(_))));
    }

    #[test]
    fn tokens_are_counted() {
        let engine = Engine::default_engine().unwrap();
        let a = engine.token(ObjectKind::Geometry);
        let b = a.clone();
        let seq = engine.token(ObjectKind::CoordSeq);
        assert_eq!(engine.stats().live_geometries, 2);
        assert_eq!(engine.stats().live_coord_seqs, 1);

        let converted = seq.convert(ObjectKind::Geometry);
        assert_eq!(engine.stats().live_coord_seqs, 0);
        assert_eq!(engine.stats().live_geometries, 3);

        drop((a, b, converted));
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn objects_outlive_engine() {
        let engine = Engine::default_engine().unwrap();
        let token = engine.token(ObjectKind::Prepared);
        let stats = engine.finish();
        assert_eq!(stats.live_prepared, 1);
        drop(token);
    }

    #[test]
    fn exceptions_resolve_to_false() {
        let engine = Engine::default_engine().unwrap();
        assert!(engine.resolve("test", Outcome::True));
        assert!(!engine.resolve("test", Outcome::False));
        assert!(!engine.resolve("test", Outcome::Exception("boom".to_owned())));
    }
}
