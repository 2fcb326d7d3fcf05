use crate::models::{Service, Zone};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;

/// Errors that can occur loading the service catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read services file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse services file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ServicesFile {
    #[serde(default)]
    services: Vec<Service>,
}

/// Read-side service catalog collaborator
///
/// Supplies the per-zone service lists the matcher treats as opaque. A
/// service joins a zone when the company matches and the service's coverage
/// is either company-wide (empty `zone_ids`) or names the zone.
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    services: RwLock<Vec<Service>>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the catalog from a JSON file (`{ "services": [...] }`)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let file: ServicesFile = serde_json::from_str(&raw)?;

        tracing::info!(
            "Service catalog loaded {} services from {}",
            file.services.len(),
            path.as_ref().display()
        );
        Ok(Self {
            services: RwLock::new(file.services),
        })
    }

    pub fn upsert(&self, service: Service) {
        let mut services = self.write_lock();
        match services.iter_mut().find(|s| s.id == service.id) {
            Some(existing) => *existing = service,
            None => services.push(service),
        }
    }

    /// Resolve the coverage join for a zone snapshot
    pub fn services_for_zones(&self, zones: &[Zone]) -> HashMap<String, Vec<Service>> {
        let services = self.read_lock();
        zones
            .iter()
            .map(|zone| {
                let list: Vec<Service> = services
                    .iter()
                    .filter(|s| {
                        s.company_id == zone.company_id
                            && (s.zone_ids.is_empty() || s.zone_ids.iter().any(|z| z == &zone.id))
                    })
                    .cloned()
                    .collect();
                (zone.id.clone(), list)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Vec<Service>> {
        self.services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Service>> {
        self.services
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Geometry;
    use crate::models::DemandLevel;

    fn zone(id: &str, company_id: &str) -> Zone {
        Zone::from_boundary(
            id.to_string(),
            company_id.to_string(),
            format!("Zone {}", id),
            Geometry::Polygon {
                coordinates: vec![vec![
                    (-0.125, 51.5),
                    (-0.09, 51.5),
                    (-0.09, 51.53),
                    (-0.125, 51.53),
                    (-0.125, 51.5),
                ]],
            },
            DemandLevel::Medium,
        )
        .unwrap()
    }

    fn service(id: &str, company_id: &str, zone_ids: &[&str]) -> Service {
        Service {
            id: id.to_string(),
            company_id: company_id.to_string(),
            category: "plumbing".to_string(),
            price: 60.0,
            zone_ids: zone_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_company_wide_service_covers_all_company_zones() {
        let catalog = ServiceCatalog::new();
        catalog.upsert(service("s1", "c1", &[]));

        let zones = vec![zone("z1", "c1"), zone("z2", "c1"), zone("z3", "c2")];
        let by_zone = catalog.services_for_zones(&zones);

        assert_eq!(by_zone["z1"].len(), 1);
        assert_eq!(by_zone["z2"].len(), 1);
        assert!(by_zone["z3"].is_empty());
    }

    #[test]
    fn test_zone_scoped_service() {
        let catalog = ServiceCatalog::new();
        catalog.upsert(service("s1", "c1", &["z1"]));

        let zones = vec![zone("z1", "c1"), zone("z2", "c1")];
        let by_zone = catalog.services_for_zones(&zones);

        assert_eq!(by_zone["z1"].len(), 1);
        assert!(by_zone["z2"].is_empty());
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let catalog = ServiceCatalog::new();
        catalog.upsert(service("s1", "c1", &[]));
        let mut updated = service("s1", "c1", &[]);
        updated.price = 99.0;
        catalog.upsert(updated);

        assert_eq!(catalog.len(), 1);
    }
}
