use crate::entities::admin_location;

use super::{AdminLocation, Coordinates};

/// Shortest query that is matched against the index.
pub const MIN_ADMIN_QUERY_LEN: usize = 2;

/// Immutable, in-memory list of curated locations.
///
/// Built once at start-up; lookups never mutate it, so it is shared behind an
/// `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct AdminLocationIndex {
    locations: Vec<AdminLocation>,
}

impl AdminLocationIndex {
    pub fn new(locations: Vec<AdminLocation>) -> Self {
        Self { locations }
    }

    /// Build the index from database rows, ordered by `sort_order`.
    pub fn from_models(mut models: Vec<admin_location::Model>) -> Self {
        models.sort_by_key(|m| m.sort_order);

        let locations = models
            .into_iter()
            .map(|m| {
                let aliases = match serde_json::from_value::<Vec<String>>(m.aliases) {
                    Ok(aliases) => aliases,
                    Err(e) => {
                        tracing::warn!(
                            location_id = %m.id,
                            error = %e,
                            "Ignoring malformed aliases"
                        );
                        Vec::new()
                    }
                };

                AdminLocation {
                    id: m.id,
                    name: m.name,
                    address: m.address,
                    category: m.category,
                    coordinates: Coordinates::new(m.lat, m.lng),
                    aliases,
                    icon: m.icon,
                }
            })
            .collect();

        Self::new(locations)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AdminLocation> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Case-insensitive substring search over name, address and aliases.
    ///
    /// The query is matched as typed, surrounding whitespace included. Queries
    /// shorter than two characters return nothing. Results keep the
    /// declaration order of the index.
    pub fn search(&self, query: &str) -> Vec<AdminLocation> {
        if query.chars().count() < MIN_ADMIN_QUERY_LEN {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.locations
            .iter()
            .filter(|l| matches(l, &needle))
            .cloned()
            .collect()
    }
}

fn matches(location: &AdminLocation, needle: &str) -> bool {
    location.name.to_lowercase().contains(needle)
        || location.address.to_lowercase().contains(needle)
        || location
            .aliases
            .iter()
            .any(|alias| alias.to_lowercase().contains(needle))
}
