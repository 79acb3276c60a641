//! Candidate catalog: loaded once at startup, read-only afterwards

use std::collections::HashSet;
use std::path::Path;

use crate::error::PlacenoteError;
use crate::types::Place;

/// Ordered, immutable collection of places with unique names
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    places: Vec<Place>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate place names
    pub fn from_places(places: Vec<Place>) -> Result<Self, PlacenoteError> {
        let mut names = HashSet::new();
        for place in &places {
            if !names.insert(place.name.as_str()) {
                return Err(PlacenoteError::DuplicatePlace(place.name.clone()));
            }
        }
        Ok(Self { places })
    }

    /// Places in catalog order
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Entry whose name matches the region identifier
    pub fn find(&self, name: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Load the catalog JSON array from disk
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, PlacenoteError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| PlacenoteError::CatalogIo {
        path: path.display().to_string(),
        source,
    })?;

    parse_catalog(&json)
}

/// Decode a catalog from its JSON text
pub fn parse_catalog(json: &str) -> Result<Catalog, PlacenoteError> {
    let places: Vec<Place> = serde_json::from_str(json)?;
    Catalog::from_places(places)
}
