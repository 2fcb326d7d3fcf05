// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, DemandLevel, FallbackDescriptor, Point, ScoringWeights, Service, Zone,
    ZoneMatch, FALLBACK_REASON,
};
pub use requests::{FeedQuery, MatchPointRequest, PublishEventRequest};
pub use responses::{
    ErrorResponse, FeedStatsResponse, HealthResponse, MatchPointResponse, PublishEventResponse,
};
