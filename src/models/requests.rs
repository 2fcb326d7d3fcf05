use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to match a point against the zone catalogue
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchPointRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(alias = "radius_km", rename = "radiusKm", default)]
    #[validate(range(min = 0.001, max = 20000.0))]
    pub radius_km: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

/// Request to publish a marketplace event to the live feed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublishEventRequest {
    #[validate(length(min = 1))]
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Live feed filter, parsed from query parameters
///
/// `zoneIds` is a comma-separated list; `zoneId` adds a single id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "zoneId", default)]
    pub zone_id: Option<String>,
    #[serde(rename = "zoneIds", default)]
    pub zone_ids: Option<String>,
    #[serde(rename = "includeOutOfZone", default)]
    pub include_out_of_zone: bool,
    #[serde(rename = "outOfZoneOnly", default)]
    pub out_of_zone_only: bool,
}
