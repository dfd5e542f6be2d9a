use crate::Coordinate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    #[error("Could not initialize engine: {0}")]
    EngineInit(String),

    #[error("Could not create {0}")]
    Create(String),

    #[error("Unable to write coordinate {index} of sequence with size {size}")]
    Write { index: usize, size: usize },

    #[error("Need at least two separate nodes for way, got {found}")]
    InsufficientPoints { found: usize },

    #[error("Could not normalize geometry: {0}")]
    Normalization(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(#[from] ValidationError),

    #[error("Could not serialize geometry: {0}")]
    Serialization(String),

    #[error("Could not parse geometry: {0}")]
    Parse(String),

    #[error("Could not prepare {0} geometry")]
    Prepare(String),

    #[error("Could not create index: {0}")]
    IndexCreate(String),

    #[error("Operation {operation} not supported for {geom_type}")]
    Unsupported {
        operation: &'static str,
        geom_type: String,
    },

    /// Ownership makes this unreachable through the public API; it exists so
    /// callers matching on the full taxonomy have a name for it.
    #[error("Double free of {0}")]
    DoubleFree(String),
}

impl GeomError {
    /// Whether a single-feature failure may be logged and skipped.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            GeomError::EngineInit(_) | GeomError::IndexCreate(_) | GeomError::DoubleFree(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GeomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Path has only 1 coordinate")]
    SinglePathCoordinate,

    #[error("Non-finite coordinate at index {index}")]
    NonFiniteCoordinate { index: usize },

    #[error("Degenenerate Segment {index} at {position:?}")]
    DegenerateSegment { index: usize, position: Coordinate },

    #[error("Overlapping segments {first_index} {second_index} between {start:?} and {end:?}")]
    OverlappingSegments {
        first_index: usize,
        second_index: usize,
        start: Coordinate,
        end: Coordinate,
    },

    #[error("Self-intersection for segments {first_index} {second_index} at {position:?}")]
    SelfIntersection {
        first_index: usize,
        second_index: usize,
        position: Coordinate,
    },

    #[error("Ring has {0} coordinates, needs at least 4")]
    TooFewCoordinates(usize),

    #[error("Path is not a loop: first and last coordinates are not equal.")]
    NotARing,

    #[error("Hole {0} is not inside the shell")]
    HoleNotValid(usize),

    #[error("Holes {0} and {1} intersect in more than one point")]
    MultipleIntersections(usize, usize),
}
