//! ZoneMatch - Zone coverage matching and live feed service for the Fixly marketplace
//!
//! This library matches geographic points against provider-defined service
//! coverage zones, ranks the zones that can serve a point (with a
//! nearest-zone fallback when nothing contains it), and fans marketplace
//! events out to live feed subscribers filtered by zone membership.

pub mod config;
pub mod core;
pub mod feed;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    geometry::{self, Geometry, GeometryError},
    MatchError, MatchOptions, MatchOutcome, Matcher,
};
pub use crate::feed::{EventMeta, FeedRegistry, SubscriberFilter};
pub use crate::models::{
    FallbackDescriptor, Point, ScoringWeights, Service, Zone, ZoneMatch, FALLBACK_REASON,
};
