use crate::core::geometry::{self, Geometry, GeometryError};
use crate::models::{DemandLevel, Zone};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Coordinate precision used for no-op boundary-edit detection
const BOUNDARY_PRECISION: u32 = 6;

/// Errors that can occur in the zone registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("boundary is not a usable Polygon or MultiPolygon")]
    UnsupportedBoundary,

    #[error("zone not found: {0}")]
    NotFound(String),

    #[error("failed to read zones file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse zones file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Zone registration/edit payload; boundary arrives as loose GeoJSON
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "companyId")]
    pub company_id: String,
    pub name: String,
    pub boundary: Value,
    #[serde(rename = "demandLevel", default)]
    pub demand_level: DemandLevel,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ZonesFile {
    #[serde(default)]
    zones: Vec<ZoneInput>,
}

/// In-memory zone store, the matching engine's read-side collaborator
///
/// The engine only ever reads per-request snapshots; all writes go through
/// `upsert`/`archive`, which own the invariant that `centroid` and
/// `bounding_box` are recomputed on every boundary change and never authored
/// independently.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: RwLock<HashMap<String, Zone>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from a JSON file (`{ "zones": [...] }`)
    ///
    /// Zones with invalid boundaries are skipped with a warning so one bad
    /// record does not block startup.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let file: ZonesFile = serde_json::from_str(&raw)?;

        let registry = Self::new();
        for input in file.zones {
            let name = input.name.clone();
            if let Err(e) = registry.upsert(input) {
                tracing::warn!("Skipping zone '{}' from seed file: {}", name, e);
            }
        }

        tracing::info!(
            "Zone registry loaded {} zones from {}",
            registry.len(),
            path.as_ref().display()
        );
        Ok(registry)
    }

    /// Create or update a zone
    ///
    /// The boundary is normalized and validated through the geometry kernel.
    /// A boundary edit that rounds to the existing coordinates is a no-op:
    /// derived fields and the updated timestamp stay untouched.
    pub fn upsert(&self, input: ZoneInput) -> Result<Zone, RegistryError> {
        let boundary = geometry::normalize(&input.boundary)?
            .ok_or(RegistryError::UnsupportedBoundary)?;
        if matches!(boundary, Geometry::Point { .. }) {
            return Err(RegistryError::UnsupportedBoundary);
        }

        let id = input.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut zones = self.write_lock();

        match zones.get_mut(&id) {
            Some(existing) => {
                existing.company_id = input.company_id;
                existing.name = input.name;
                existing.demand_level = input.demand_level;
                existing.metadata = input.metadata;
                if geometry::geometries_equal(&existing.boundary, &boundary, BOUNDARY_PRECISION) {
                    tracing::trace!("No-op boundary edit for zone {}", id);
                } else {
                    existing.set_boundary(boundary)?;
                }
                Ok(existing.clone())
            }
            None => {
                let mut zone = Zone::from_boundary(
                    id.clone(),
                    input.company_id,
                    input.name,
                    boundary,
                    input.demand_level,
                )?;
                zone.metadata = input.metadata;
                zones.insert(id, zone.clone());
                Ok(zone)
            }
        }
    }

    /// Soft-archive a zone; it stays stored but leaves the matching snapshot
    pub fn archive(&self, id: &str) -> Result<(), RegistryError> {
        let mut zones = self.write_lock();
        match zones.get_mut(id) {
            Some(zone) => {
                zone.is_archived = true;
                zone.updated_at = Some(chrono::Utc::now());
                Ok(())
            }
            None => Err(RegistryError::NotFound(id.to_string())),
        }
    }

    /// Clone of every non-archived zone, the per-request matching snapshot
    pub fn snapshot(&self) -> Vec<Zone> {
        self.read_lock()
            .values()
            .filter(|zone| !zone.is_archived)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Zone> {
        self.read_lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Zone>> {
        self.zones
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Zone>> {
        self.zones
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_boundary() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[-0.125, 51.5], [-0.09, 51.5], [-0.09, 51.53], [-0.125, 51.53], [-0.125, 51.5]]]
        })
    }

    fn input(id: &str, boundary: Value) -> ZoneInput {
        ZoneInput {
            id: Some(id.to_string()),
            company_id: "c1".to_string(),
            name: format!("Zone {}", id),
            boundary,
            demand_level: DemandLevel::Medium,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_upsert_creates_zone_with_derived_fields() {
        let registry = ZoneRegistry::new();
        let zone = registry.upsert(input("z1", square_boundary())).unwrap();

        assert_eq!(zone.id, "z1");
        assert!(zone.bounding_box.west <= zone.bounding_box.east);
        assert!(zone.centroid.lat >= zone.bounding_box.south);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_upsert_rejects_feature_collection() {
        let registry = ZoneRegistry::new();
        let result = registry.upsert(input(
            "z1",
            json!({ "type": "FeatureCollection", "features": [] }),
        ));

        assert!(matches!(result, Err(RegistryError::UnsupportedBoundary)));
    }

    #[test]
    fn test_upsert_rejects_point_boundary() {
        let registry = ZoneRegistry::new();
        let result = registry.upsert(input(
            "z1",
            json!({ "type": "Point", "coordinates": [-0.1, 51.5] }),
        ));

        assert!(matches!(result, Err(RegistryError::UnsupportedBoundary)));
    }

    #[test]
    fn test_boundary_edit_recomputes_derived_fields() {
        let registry = ZoneRegistry::new();
        let before = registry.upsert(input("z1", square_boundary())).unwrap();

        let shifted = json!({
            "type": "Polygon",
            "coordinates": [[[1.0, 10.0], [1.1, 10.0], [1.1, 10.1], [1.0, 10.1], [1.0, 10.0]]]
        });
        let after = registry.upsert(input("z1", shifted)).unwrap();

        assert_ne!(before.centroid, after.centroid);
        assert_ne!(before.bounding_box, after.bounding_box);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_noop_boundary_edit_detected() {
        let registry = ZoneRegistry::new();
        let before = registry.upsert(input("z1", square_boundary())).unwrap();

        // Identical coordinates with sub-precision jitter
        let jittered = json!({
            "type": "Polygon",
            "coordinates": [[[-0.1250000001, 51.5], [-0.09, 51.5], [-0.09, 51.53], [-0.125, 51.53], [-0.125, 51.5]]]
        });
        let after = registry.upsert(input("z1", jittered)).unwrap();

        assert_eq!(before.updated_at, after.updated_at);
        assert_eq!(before.centroid, after.centroid);
    }

    #[test]
    fn test_archive_excludes_from_snapshot() {
        let registry = ZoneRegistry::new();
        registry.upsert(input("z1", square_boundary())).unwrap();
        registry.upsert(input("z2", square_boundary())).unwrap();

        registry.archive("z1").unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "z2");
        // Archived zone is retained, not hard-deleted
        assert_eq!(registry.len(), 2);
        assert!(registry.get("z1").unwrap().is_archived);
    }

    #[test]
    fn test_archive_missing_zone() {
        let registry = ZoneRegistry::new();
        assert!(matches!(
            registry.archive("nope"),
            Err(RegistryError::NotFound(_))
        ));
    }
}
