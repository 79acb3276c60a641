//! Catalog entries and positions

use serde::{Deserialize, Serialize};

/// A geographic position (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers
    pub fn is_usable(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Squared planar distance in degree space. Only used for ordering.
    pub fn squared_distance(&self, other: &Coordinate) -> f64 {
        (self.lat - other.lat).powi(2) + (self.lng - other.lng).powi(2)
    }

    /// Great-circle distance in meters (haversine)
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// One catalog entry: a place paired with an exhibit.
///
/// Field names on the wire follow the catalog JSON produced upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Unique within a catalog; doubles as the region identifier
    #[serde(rename = "place_name")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Free-text review of the place
    pub review: String,
    /// Keyword to highlight inside `review`
    #[serde(rename = "place_iword")]
    pub place_keyword: String,
    pub exhibit_name: String,
    #[serde(default)]
    pub exhibit_id: String,
    /// Keyword to highlight inside `kaisetsu`
    #[serde(rename = "exhibit_iword")]
    pub exhibit_keyword: String,
    /// URL or local path of the exhibit image; empty for none
    #[serde(rename = "exhibit_image_url", default)]
    pub exhibit_image: String,
    /// Exhibit description
    pub kaisetsu: String,
}

impl Place {
    /// Position of the place
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Identity used by ranking comparisons and the differ
    pub fn identity(&self) -> PlaceIdentity {
        PlaceIdentity {
            name: self.name.clone(),
            exhibit_name: self.exhibit_name.clone(),
        }
    }

    /// Same (name, exhibit name); every other field is ignored
    pub fn same_identity(&self, other: &Place) -> bool {
        self.name == other.name && self.exhibit_name == other.exhibit_name
    }
}

/// The (name, exhibit name) pair that identifies a place across updates.
///
/// `Place` deliberately has no `PartialEq`: comparing reviews or
/// coordinates would change which regions the differ restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceIdentity {
    pub name: String,
    pub exhibit_name: String,
}

impl std::fmt::Display for PlaceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.name, self.exhibit_name)
    }
}
