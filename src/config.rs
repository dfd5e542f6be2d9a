//! Engine configuration.

use crate::errors::{GeomError, Result};
use serde::{Deserialize, Serialize};

/// Byte order used when writing WKB. Reading accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WkbByteOrder {
    Little,
    Big,
}

impl Default for WkbByteOrder {
    fn default() -> Self {
        WkbByteOrder::Little
    }
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum children per node of the spatial index tree.
    /// Default: 10
    pub index_node_capacity: usize,

    /// Degree of the per-geometry segment trees built by `prepare`.
    /// Default: 16
    pub prepared_degree: usize,

    /// Byte order of WKB output.
    pub wkb_byte_order: WkbByteOrder,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_node_capacity: 10,
            prepared_degree: 16,
            wkb_byte_order: WkbByteOrder::Little,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.index_node_capacity < 2 {
            return Err(GeomError::EngineInit(format!(
                "index_node_capacity must be at least 2, got {}",
                self.index_node_capacity
            )));
        }
        if self.prepared_degree < 2 {
            return Err(GeomError::EngineInit(format!(
                "prepared_degree must be at least 2, got {}",
                self.prepared_degree
            )));
        }
        Ok(())
    }
}
