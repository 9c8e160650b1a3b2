use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::time::Instant;

use super::places::{PlacesSearchClient, PlacesSearchSession, SearchState};
use super::{
    AdminLocation, AdminLocationIndex, FieldKey, LocationCategory, LocationRole, LocationSource,
    PlacePrediction, ResolvedLocation, Suggestion,
};

const AIRPORT: &str = "airport";

/// Merged dropdown contents for one keystroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<Suggestion>,
    pub places: SearchState,
}

/// Composes admin and external results and normalizes selections.
#[derive(Clone)]
pub struct LocationResolver {
    admin: Arc<AdminLocationIndex>,
    places: Arc<PlacesSearchClient>,
}

impl LocationResolver {
    pub fn new(admin: Arc<AdminLocationIndex>, places: Arc<PlacesSearchClient>) -> Self {
        Self { admin, places }
    }

    pub fn admin_index(&self) -> &AdminLocationIndex {
        &self.admin
    }

    pub fn places(&self) -> &Arc<PlacesSearchClient> {
        &self.places
    }

    /// Handle a keystroke: mark the field unvalidated, then search both sources.
    pub async fn suggest(&self, field: &LocationField, input: &str) -> Suggestions {
        field.type_text(input);

        let admin = self.admin.search(input);
        let places = field.search().search(input).await;

        Suggestions {
            suggestions: merge(admin, &places),
            places,
        }
    }

    /// Resolve an admin location by id and store it in the field.
    pub fn select_admin(
        &self,
        field: &LocationField,
        admin_location_id: &str,
    ) -> Option<ResolvedLocation> {
        let admin = self.admin.get(admin_location_id)?;
        let location = resolve_admin(field.key().role(), admin);
        field.select(location.clone());
        Some(location)
    }

    /// Resolve a place prediction (fetching its details) and store it in the field.
    pub async fn select_prediction(
        &self,
        field: &LocationField,
        prediction: &PlacePrediction,
    ) -> ResolvedLocation {
        let location = self.resolve_prediction(field.key().role(), prediction).await;
        field.select(location.clone());
        location
    }

    pub async fn resolve_prediction(
        &self,
        role: LocationRole,
        prediction: &PlacePrediction,
    ) -> ResolvedLocation {
        let details = self.places.place_details(&prediction.place_id).await;
        let types = details.as_ref().map(|d| d.types.as_slice()).unwrap_or(&[]);

        if details.is_none() {
            tracing::info!(
                place_id = %prediction.place_id,
                "Resolving place without coordinates"
            );
        }

        ResolvedLocation {
            address: prediction.description.clone(),
            name: Some(prediction.structured_formatting.main_text.clone()),
            role,
            is_airport: is_airport(types, &prediction.description),
            source: LocationSource::Place {
                place_id: prediction.place_id.clone(),
                coordinates: details.and_then(|d| d.coordinates),
            },
        }
    }

    /// Rebuild a client-supplied location from server-side data.
    ///
    /// Admin sources are replaced by the index entry; place sources get their
    /// coordinates and airport flag from a fresh details lookup. Free text
    /// stays unverified. `None` means the admin id is unknown.
    pub async fn verify(&self, location: &ResolvedLocation) -> Option<ResolvedLocation> {
        match &location.source {
            LocationSource::Unverified => Some(ResolvedLocation {
                address: location.address.clone(),
                ..ResolvedLocation::empty(location.role)
            }),
            LocationSource::Admin {
                admin_location_id, ..
            } => {
                let admin = self.admin.get(admin_location_id);
                if admin.is_none() {
                    tracing::warn!(
                        admin_location_id = %admin_location_id,
                        "Rejecting unknown admin location"
                    );
                }
                admin.map(|a| resolve_admin(location.role, a))
            }
            LocationSource::Place { place_id, .. } => {
                let details = self.places.place_details(place_id).await;
                let types = details.as_ref().map(|d| d.types.as_slice()).unwrap_or(&[]);

                Some(ResolvedLocation {
                    address: location.address.clone(),
                    name: location.name.clone(),
                    role: location.role,
                    is_airport: is_airport(types, &location.address),
                    source: LocationSource::Place {
                        place_id: place_id.clone(),
                        coordinates: details.and_then(|d| d.coordinates),
                    },
                })
            }
        }
    }
}

/// Admin results first, then external predictions; never interleaved.
pub fn merge(admin: Vec<AdminLocation>, places: &SearchState) -> Vec<Suggestion> {
    admin
        .into_iter()
        .map(Suggestion::Admin)
        .chain(places.predictions().iter().cloned().map(Suggestion::Place))
        .collect()
}

pub fn resolve_admin(role: LocationRole, admin: &AdminLocation) -> ResolvedLocation {
    ResolvedLocation {
        address: admin.address.clone(),
        name: Some(admin.name.clone()),
        role,
        is_airport: admin.category == LocationCategory::Airport,
        source: LocationSource::Admin {
            admin_location_id: admin.id.clone(),
            coordinates: admin.coordinates,
        },
    }
}

/// Type tags are not always complete, so the address text is checked too.
pub fn is_airport(types: &[String], description: &str) -> bool {
    types.iter().any(|t| t == AIRPORT) || description.to_lowercase().contains(AIRPORT)
}

/// State of one location input: the resolved value plus its search session.
///
/// Every update replaces the whole [`ResolvedLocation`] under one lock, so
/// readers never see a half-cleared value.
pub struct LocationField {
    key: FieldKey,
    location: Mutex<ResolvedLocation>,
    search: PlacesSearchSession,
    last_used: Mutex<Instant>,
}

impl LocationField {
    pub fn new(key: FieldKey, places: Arc<PlacesSearchClient>) -> Self {
        Self {
            key,
            location: Mutex::new(ResolvedLocation::empty(key.role())),
            search: PlacesSearchSession::new(places),
            last_used: Mutex::new(Instant::now()),
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn search(&self) -> &PlacesSearchSession {
        &self.search
    }

    pub fn location(&self) -> ResolvedLocation {
        self.lock_location().clone()
    }

    /// Free text: keep what was typed, drop the name, the airport flag and any
    /// back-reference. Runs on every keystroke.
    pub fn type_text(&self, text: &str) -> ResolvedLocation {
        let location = ResolvedLocation {
            address: text.to_string(),
            ..ResolvedLocation::empty(self.key.role())
        };
        self.replace(location.clone());
        location
    }

    pub fn select(&self, location: ResolvedLocation) {
        self.replace(ResolvedLocation {
            role: self.key.role(),
            ..location
        });
    }

    pub fn clear(&self) -> ResolvedLocation {
        let location = ResolvedLocation::empty(self.key.role());
        self.replace(location.clone());
        self.search.clear();
        location
    }

    pub fn idle_for(&self) -> std::time::Duration {
        self.last_used
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    pub fn touch(&self) {
        *self.last_used.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn replace(&self, location: ResolvedLocation) {
        *self.lock_location() = location;
        self.touch();
    }

    fn lock_location(&self) -> std::sync::MutexGuard<'_, ResolvedLocation> {
        self.location.lock().unwrap_or_else(|e| e.into_inner())
    }
}
