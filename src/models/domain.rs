use crate::core::geometry::{self, Geometry, GeometryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A geographic point, GeoJSON axis order (longitude first)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lng: f64,
    pub lat: f64,
}

/// Axis-aligned bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Demand level of a zone, used as a scoring tie-breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandLevel {
    Low,
    Medium,
    High,
}

impl DemandLevel {
    /// Scoring weight: high=3, medium=2, low=1
    pub fn weight(&self) -> f64 {
        match self {
            DemandLevel::Low => 1.0,
            DemandLevel::Medium => 2.0,
            DemandLevel::High => 3.0,
        }
    }
}

impl Default for DemandLevel {
    fn default() -> Self {
        DemandLevel::Medium
    }
}

/// A provider-defined service coverage zone
///
/// `centroid` and `bounding_box` are derived from `boundary` and recomputed
/// on every boundary change; they are never authored independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    #[serde(rename = "companyId")]
    pub company_id: String,
    pub name: String,
    pub boundary: Geometry,
    pub centroid: Point,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    #[serde(rename = "demandLevel", default)]
    pub demand_level: DemandLevel,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(rename = "isArchived", default)]
    pub is_archived: bool,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Zone {
    /// Build a zone from a validated boundary, deriving centroid and bounding box
    pub fn from_boundary(
        id: String,
        company_id: String,
        name: String,
        boundary: Geometry,
        demand_level: DemandLevel,
    ) -> Result<Self, GeometryError> {
        let boundary = geometry::ensure_closed_rings(boundary);
        let centroid =
            geometry::compute_centroid(&boundary).ok_or(GeometryError::DegenerateRing)?;
        let bounding_box = geometry::compute_bounding_box(std::slice::from_ref(&boundary))
            .ok_or(GeometryError::DegenerateRing)?;

        Ok(Self {
            id,
            company_id,
            name,
            boundary,
            centroid,
            bounding_box,
            demand_level,
            metadata: HashMap::new(),
            is_archived: false,
            updated_at: Some(chrono::Utc::now()),
        })
    }

    /// Replace the boundary and recompute the derived fields
    pub fn set_boundary(&mut self, boundary: Geometry) -> Result<(), GeometryError> {
        let boundary = geometry::ensure_closed_rings(boundary);
        self.centroid =
            geometry::compute_centroid(&boundary).ok_or(GeometryError::DegenerateRing)?;
        self.bounding_box = geometry::compute_bounding_box(std::slice::from_ref(&boundary))
            .ok_or(GeometryError::DegenerateRing)?;
        self.boundary = boundary;
        self.updated_at = Some(chrono::Utc::now());
        Ok(())
    }
}

/// A company-owned service, optionally scoped to specific zones
///
/// Read-only from the matching engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(rename = "companyId")]
    pub company_id: String,
    pub category: String,
    pub price: f64,
    /// Coverage join; empty means company-wide (every company zone)
    #[serde(rename = "zoneIds", default)]
    pub zone_ids: Vec<String>,
}

/// One ranked zone match; ephemeral, never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneMatch {
    pub zone: Zone,
    pub services: Vec<Service>,
    pub score: f64,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Reason string attached to every fallback match
pub const FALLBACK_REASON: &str = "closest-zone-projected";

/// Produced only when no zone geometrically contains the point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackDescriptor {
    pub reason: String,
    #[serde(rename = "zoneId")]
    pub zone_id: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Scoring weights
///
/// Defaults keep the ordering contract: the service term dominates any
/// demand spread (3 * demand + proximity <= 31 < 100), and the proximity
/// term (at most 1) can never outweigh one demand step (10).
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub service: f64,
    pub demand: f64,
    pub proximity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            service: 100.0,
            demand: 10.0,
            proximity: 1.0,
        }
    }
}
