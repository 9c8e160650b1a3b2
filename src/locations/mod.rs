//! Location search and resolution for the booking form.
//!
//! Curated admin locations and Google Places predictions are merged into a
//! single suggestion list, and a selection from either source is normalized
//! into a [`ResolvedLocation`].

pub mod admin_index;
pub mod places;
pub mod resolver;
pub mod sessions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::entities::admin_location::LocationCategory;
pub use admin_index::AdminLocationIndex;
pub use places::{PlacesSearchClient, PlacesSearchSession, ProviderState, SearchState};
pub use resolver::{LocationField, LocationResolver};

/// Maximum number of intermediate stops on one booking.
pub const MAX_STOPS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A hand-curated place that is always listed ahead of external results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLocation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub category: LocationCategory,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFormatting {
    pub main_text: String,
    #[serde(default)]
    pub secondary_text: String,
}

/// One autocomplete prediction from the places provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePrediction {
    pub place_id: String,
    pub description: String,
    pub structured_formatting: StructuredFormatting,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceDetails {
    pub coordinates: Option<Coordinates>,
    pub formatted_address: Option<String>,
    pub types: Vec<String>,
}

/// Which form field a location belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    Pickup,
    Dropoff,
    Stop,
}

/// Identifies one location input on the form: `pickup`, `dropoff` or `stop-N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Pickup,
    Dropoff,
    Stop(u8),
}

impl FieldKey {
    pub fn role(self) -> LocationRole {
        match self {
            FieldKey::Pickup => LocationRole::Pickup,
            FieldKey::Dropoff => LocationRole::Dropoff,
            FieldKey::Stop(_) => LocationRole::Stop,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Pickup => f.write_str("pickup"),
            FieldKey::Dropoff => f.write_str("dropoff"),
            FieldKey::Stop(n) => write!(f, "stop-{}", n),
        }
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(FieldKey::Pickup),
            "dropoff" => Ok(FieldKey::Dropoff),
            other => {
                let index: u8 = other
                    .strip_prefix("stop-")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| format!("Unknown location field '{}'", other))?;
                if index >= MAX_STOPS {
                    return Err(format!("At most {} stops are allowed", MAX_STOPS));
                }
                Ok(FieldKey::Stop(index))
            }
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Where a resolved location came from.
///
/// Admin selections always carry coordinates. Place selections are validated
/// even when the details lookup could not supply coordinates; distance
/// calculation rejects those later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSource {
    Unverified,
    Admin {
        admin_location_id: String,
        coordinates: Coordinates,
    },
    Place {
        place_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinates: Option<Coordinates>,
    },
}

/// Normalized location as held in form state and stored on a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: LocationRole,
    pub is_airport: bool,
    pub source: LocationSource,
}

impl ResolvedLocation {
    pub fn empty(role: LocationRole) -> Self {
        Self {
            address: String::new(),
            name: None,
            role,
            is_airport: false,
            source: LocationSource::Unverified,
        }
    }

    pub fn is_validated(&self) -> bool {
        !matches!(self.source, LocationSource::Unverified)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match &self.source {
            LocationSource::Unverified => None,
            LocationSource::Admin { coordinates, .. } => Some(*coordinates),
            LocationSource::Place { coordinates, .. } => *coordinates,
        }
    }

    pub fn admin_location_id(&self) -> Option<&str> {
        match &self.source {
            LocationSource::Admin {
                admin_location_id, ..
            } => Some(admin_location_id),
            _ => None,
        }
    }

    pub fn place_id(&self) -> Option<&str> {
        match &self.source {
            LocationSource::Place { place_id, .. } => Some(place_id),
            _ => None,
        }
    }
}

/// One row of the merged dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Suggestion {
    Admin(AdminLocation),
    Place(PlacePrediction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_parsing() {
        assert_eq!("pickup".parse::<FieldKey>().unwrap(), FieldKey::Pickup);
        assert_eq!("stop-2".parse::<FieldKey>().unwrap(), FieldKey::Stop(2));
        assert_eq!(FieldKey::Stop(2).to_string(), "stop-2");
        assert!("stop-9".parse::<FieldKey>().is_err());
        assert!("stop-x".parse::<FieldKey>().is_err());
        assert!("origin".parse::<FieldKey>().is_err());
    }

    #[test]
    fn test_resolved_location_survives_json() {
        let location = ResolvedLocation {
            address: "1 World Way, Los Angeles, CA 90045".to_string(),
            name: Some("LAX".to_string()),
            role: LocationRole::Pickup,
            is_airport: true,
            source: LocationSource::Place {
                place_id: "ChIJ".to_string(),
                coordinates: None,
            },
        };

        let json = serde_json::to_string(&location).unwrap();
        assert!(!json.contains("coordinates"));
        let back: ResolvedLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, location);
        assert!(back.is_validated());
        assert_eq!(back.coordinates(), None);
    }

    #[test]
    fn test_empty_location_is_unvalidated() {
        let location = ResolvedLocation::empty(LocationRole::Stop);
        assert!(!location.is_validated());
        assert!(location.admin_location_id().is_none());
        assert!(location.place_id().is_none());
    }
}
