mod line_merge;
mod normalize;
mod point_in_polygon;
mod polygon_validation;
mod validation;

pub use line_merge::merge_lines;
pub use normalize::normalize_geometry;
pub use point_in_polygon::{locate_in_polygon, locate_in_ring, Location};
pub use polygon_validation::validate_polygon;
pub use validation::validate_geometry;
