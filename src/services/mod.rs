// Service exports
pub mod catalog;
pub mod registry;

pub use catalog::{CatalogError, ServiceCatalog};
pub use registry::{RegistryError, ZoneInput, ZoneRegistry};
