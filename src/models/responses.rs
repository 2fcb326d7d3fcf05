use crate::models::domain::{FallbackDescriptor, ZoneMatch};
use serde::{Deserialize, Serialize};

/// Response for the point matching endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPointResponse {
    pub matches: Vec<ZoneMatch>,
    pub fallback: Option<FallbackDescriptor>,
    #[serde(rename = "totalServices")]
    pub total_services: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Response for the event publish endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishEventResponse {
    pub delivered: usize,
    #[serde(rename = "activeConnections")]
    pub active_connections: usize,
}

/// Live feed observability counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStatsResponse {
    #[serde(rename = "activeConnections")]
    pub active_connections: usize,
}
