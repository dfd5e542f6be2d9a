mod bounds;
mod config;
mod coord_seq;
mod coordinate;
mod engine;
mod flatbush;
mod geometry;
mod operations;
mod pool;
mod prepared;
mod seg_rtree;
mod segment_path;
mod spatial_index;
mod utils;
mod wkb_io;
mod wkt_io;

pub mod algorithms;
pub mod construction;
pub mod errors;
pub mod mapping;

pub use bounds::{Bounds, HasBounds};
pub use config::{EngineConfig, WkbByteOrder};
pub use coord_seq::CoordSeq;
pub use coordinate::Coordinate;
pub use engine::{Engine, EngineStats};
pub use errors::{GeomError, Result, ValidationError};
pub use flatbush::{Flatbush, FLATBUSH_DEFAULT_DEGREE};
pub use geometry::{Geometry, GeometryType, LinearRing, SharedGeometry};
pub use pool::{EnginePool, PooledEngine};
pub use prepared::PreparedGeometry;
pub use seg_rtree::SegRTree;
pub use segment_path::SegmentPath;
pub use spatial_index::{IndexBuilder, IndexEntry, Predicate, SpatialIndex};
pub use wkb_io::{read_wkb, write_wkb, MAX_NESTING};
pub use wkt_io::parse_wkt;
