//! External collaborators
//!
//! Building registry, land-surface service and geocoder sit behind narrow
//! traits. The engine treats any provider error as missing data; only the
//! geocoder can fail a request, since without a point there is nothing to
//! assess.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;
use types::geo::GeoPoint;
use types::site::{BuildingFact, SpatialFact};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("no record for {0}")]
    NotFound(String),

    #[error("{provider} failed: {message}")]
    Upstream { provider: String, message: String },
}

/// Land-cover class, vegetation index, terrain and distance-to-forest facts.
pub trait SpatialAttributeProvider: Send + Sync {
    fn spatial_facts(&self, point: GeoPoint) -> Result<SpatialFact, ProviderError>;
}

/// Attributes of the building nearest to a point.
pub trait BuildingAttributeProvider: Send + Sync {
    fn building_facts(&self, point: GeoPoint) -> Result<BuildingFact, ProviderError>;
}

/// Address → point resolution.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> Result<GeoPoint, ProviderError>;
}

/// Collaborator that always answers with the same facts.
#[derive(Debug, Clone, Default)]
pub struct StaticSite {
    pub building: BuildingFact,
    pub spatial: SpatialFact,
}

impl StaticSite {
    pub fn new(building: BuildingFact, spatial: SpatialFact) -> Self {
        Self { building, spatial }
    }
}

impl SpatialAttributeProvider for StaticSite {
    fn spatial_facts(&self, _point: GeoPoint) -> Result<SpatialFact, ProviderError> {
        Ok(self.spatial.clone())
    }
}

impl BuildingAttributeProvider for StaticSite {
    fn building_facts(&self, _point: GeoPoint) -> Result<BuildingFact, ProviderError> {
        Ok(self.building.clone())
    }
}

/// Collaborator with no connectivity; every lookup fails.
///
/// The composer's default, so a bare engine runs on climate data alone with
/// every site attribute at its documented fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Unavailable {
    fn error() -> ProviderError {
        ProviderError::Upstream {
            provider: "unconfigured".to_string(),
            message: "no provider configured".to_string(),
        }
    }
}

impl SpatialAttributeProvider for Unavailable {
    fn spatial_facts(&self, _point: GeoPoint) -> Result<SpatialFact, ProviderError> {
        Err(Self::error())
    }
}

impl BuildingAttributeProvider for Unavailable {
    fn building_facts(&self, _point: GeoPoint) -> Result<BuildingFact, ProviderError> {
        Err(Self::error())
    }
}

impl Geocoder for Unavailable {
    fn geocode(&self, address: &str) -> Result<GeoPoint, ProviderError> {
        Err(ProviderError::NotFound(address.to_string()))
    }
}

/// In-memory address book.
#[derive(Debug, Default)]
pub struct AddressBook {
    entries: RwLock<HashMap<String, GeoPoint>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: &str, point: GeoPoint) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(normalize(address), point);
        }
    }

    pub fn with_entry(self, address: &str, point: GeoPoint) -> Self {
        self.insert(address, point);
        self
    }
}

fn normalize(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Geocoder for AddressBook {
    fn geocode(&self, address: &str) -> Result<GeoPoint, ProviderError> {
        let key = normalize(address);
        let entries = self.entries.read().map_err(|_| ProviderError::Upstream {
            provider: "address_book".to_string(),
            message: "lock poisoned".to_string(),
        })?;
        entries
            .get(&key)
            .copied()
            .ok_or(ProviderError::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::site::LandCover;

    fn seoul() -> GeoPoint {
        GeoPoint::new(37.5665, 126.978).unwrap()
    }

    #[test]
    fn test_static_site() {
        let site = StaticSite::new(
            BuildingFact {
                ground_floors: Some(12),
                ..BuildingFact::default()
            },
            SpatialFact {
                land_cover: Some(LandCover::Urban),
                ..SpatialFact::default()
            },
        );
        assert_eq!(site.building_facts(seoul()).unwrap().ground_floors, Some(12));
        assert_eq!(
            site.spatial_facts(seoul()).unwrap().land_cover,
            Some(LandCover::Urban)
        );
    }

    #[test]
    fn test_unavailable_always_fails() {
        assert!(Unavailable.building_facts(seoul()).is_err());
        assert!(Unavailable.spatial_facts(seoul()).is_err());
        assert!(matches!(
            Unavailable.geocode("anywhere"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_address_book_normalizes_whitespace() {
        let book = AddressBook::new().with_entry("Sejong-daero 110,  Jung-gu", seoul());
        assert_eq!(book.geocode(" Sejong-daero 110, Jung-gu ").unwrap(), seoul());
        assert!(matches!(
            book.geocode("Unknown-ro 1"),
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Timeout {
            provider: "building_registry".to_string(),
            timeout_ms: 3000,
        };
        assert_eq!(err.to_string(), "building_registry timed out after 3000ms");
    }
}
