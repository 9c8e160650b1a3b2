use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::places::PlacesSearchClient;
use super::resolver::LocationField;
use super::FieldKey;

/// Location fields of every open booking form, keyed by client session id.
///
/// Fields are independent of each other; each owns its own search session.
pub struct FieldSessions {
    places: Arc<PlacesSearchClient>,
    fields: Mutex<HashMap<(String, FieldKey), Arc<LocationField>>>,
    idle_timeout: Duration,
}

impl FieldSessions {
    pub fn new(places: Arc<PlacesSearchClient>, idle_timeout: Duration) -> Self {
        Self {
            places,
            fields: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Get the field, creating an empty one on first use.
    pub fn field(&self, session_id: &str, key: FieldKey) -> Arc<LocationField> {
        let mut fields = self.fields.lock().unwrap_or_else(|e| e.into_inner());
        let field = fields
            .entry((session_id.to_string(), key))
            .or_insert_with(|| Arc::new(LocationField::new(key, self.places.clone())))
            .clone();
        field.touch();
        field
    }

    pub fn existing(&self, session_id: &str, key: FieldKey) -> Option<Arc<LocationField>> {
        let fields = self.fields.lock().unwrap_or_else(|e| e.into_inner());
        fields.get(&(session_id.to_string(), key)).cloned()
    }

    pub fn len(&self) -> usize {
        self.fields.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop fields that have not been touched within the idle timeout.
    pub fn evict_idle(&self) -> usize {
        let mut fields = self.fields.lock().unwrap_or_else(|e| e.into_inner());
        let before = fields.len();
        fields.retain(|_, field| field.idle_for() < self.idle_timeout);
        let evicted = before - fields.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = fields.len(), "Evicted idle location fields");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::places::testing::{ready_client, FakePlaces};

    #[tokio::test(start_paused = true)]
    async fn test_fields_are_independent_per_session_and_key() {
        let places = ready_client(FakePlaces::default()).await;
        let sessions = FieldSessions::new(places, Duration::from_secs(60));

        let pickup = sessions.field("s1", FieldKey::Pickup);
        let dropoff = sessions.field("s1", FieldKey::Dropoff);
        let other = sessions.field("s2", FieldKey::Pickup);

        pickup.type_text("LAX");
        assert_eq!(sessions.field("s1", FieldKey::Pickup).location().address, "LAX");
        assert!(dropoff.location().address.is_empty());
        assert!(other.location().address.is_empty());
        assert_eq!(sessions.len(), 3);
        assert!(sessions.existing("s3", FieldKey::Pickup).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_fields_are_evicted() {
        let places = ready_client(FakePlaces::default()).await;
        let sessions = FieldSessions::new(places, Duration::from_secs(60));
        sessions.field("old", FieldKey::Pickup);

        tokio::time::advance(Duration::from_secs(45)).await;
        sessions.field("fresh", FieldKey::Pickup);
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(sessions.evict_idle(), 1);
        assert!(sessions.existing("old", FieldKey::Pickup).is_none());
        assert!(sessions.existing("fresh", FieldKey::Pickup).is_some());
    }
}
