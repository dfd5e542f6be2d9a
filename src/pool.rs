//! A fixed set of engines handed out one worker at a time.

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::errors::{GeomError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::ops::{Deref, DerefMut};
use tracing::debug;

pub struct EnginePool {
    size: usize,
    idle_tx: Sender<Engine>,
    idle_rx: Receiver<Engine>,
}

impl EnginePool {
    pub fn new(size: usize, config: EngineConfig) -> Result<Self> {
        if size == 0 {
            return Err(GeomError::EngineInit("pool size must be positive".to_owned()));
        }
        let (idle_tx, idle_rx) = crossbeam_channel::bounded(size);
        for _ in 0..size {
            let engine = Engine::new(config.clone())?;
            idle_tx
                .send(engine)
                .map_err(|_| GeomError::EngineInit("pool channel closed".to_owned()))?;
        }
        debug!(target: "geom_engine", size, "engine pool initialized");
        Ok(EnginePool {
            size,
            idle_tx,
            idle_rx,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    /// Block until an engine is free.
    pub fn checkout(&self) -> Result<PooledEngine<'_>> {
        let engine = self
            .idle_rx
            .recv()
            .map_err(|_| GeomError::EngineInit("engine pool disconnected".to_owned()))?;
        Ok(PooledEngine {
            engine: Some(engine),
            pool: self,
        })
    }

    pub fn try_checkout(&self) -> Option<PooledEngine<'_>> {
        let engine = self.idle_rx.try_recv().ok()?;
        Some(PooledEngine {
            engine: Some(engine),
            pool: self,
        })
    }
}

/// An engine checked out of a pool; returned when dropped.
pub struct PooledEngine<'a> {
    engine: Option<Engine>,
    pool: &'a EnginePool,
}

impl Deref for PooledEngine<'_> {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        match &self.engine {
            Some(engine) => engine,
            None => unreachable!("pooled engine used after return"),
        }
    }
}

impl DerefMut for PooledEngine<'_> {
    fn deref_mut(&mut self) -> &mut Engine {
        match &mut self.engine {
            Some(engine) => engine,
            None => unreachable!("pooled engine used after return"),
        }
    }
}

impl Drop for PooledEngine<'_> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            // Capacity equals the number of engines, so this never blocks.
            let _ = self.pool.idle_tx.send(engine);
        }
    }
}
