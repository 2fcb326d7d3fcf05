// Core algorithm exports
pub mod containment;
pub mod distance;
pub mod geometry;
pub mod matcher;
pub mod scoring;

pub use containment::{geometry_contains, partition_zones, polygon_contains, Partition};
pub use distance::{bounding_box_around, haversine_distance, min_distance_to_boundary_km};
pub use geometry::{
    compute_bounding_box, compute_centroid, ensure_closed_rings, geometries_equal, normalize,
    Geometry, GeometryError,
};
pub use matcher::{MatchError, MatchOptions, MatchOutcome, Matcher};
pub use scoring::calculate_zone_score;
