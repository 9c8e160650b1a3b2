use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::locations::places::SearchState;
use crate::locations::resolver::Suggestions;
use crate::locations::{AdminLocation, FieldKey, PlacePrediction, ResolvedLocation};
use crate::AppState;

const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct AdminSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldQuery {
    pub session: String,
    pub field: FieldKey,
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub session: String,
    pub field: FieldKey,
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Selection {
    Admin { id: String },
    Place(PlacePrediction),
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub session: String,
    pub field: FieldKey,
    pub selection: Selection,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub field: FieldKey,
    pub location: ResolvedLocation,
    #[serde(flatten)]
    pub suggestions: Suggestions,
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub field: FieldKey,
    pub location: ResolvedLocation,
    pub places: SearchState,
}

fn check_session(session: &str) -> AppResult<()> {
    let valid = !session.is_empty()
        && session.len() <= MAX_SESSION_ID_LEN
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::BadRequest("Invalid session id".to_string()));
    }
    Ok(())
}

/// Search curated locations only
pub async fn admin_search(
    State(state): State<AppState>,
    Query(query): Query<AdminSearchQuery>,
) -> Json<Vec<AdminLocation>> {
    Json(state.resolver.admin_index().search(&query.q))
}

/// Keystroke in a location field: invalidate it and return merged suggestions
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> AppResult<Json<SuggestResponse>> {
    check_session(&query.session)?;

    let field = state.sessions.field(&query.session, query.field);
    let suggestions = state.resolver.suggest(&field, &query.input).await;

    Ok(Json(SuggestResponse {
        field: query.field,
        location: field.location(),
        suggestions,
    }))
}

/// Resolve a selected suggestion into the field
pub async fn select(
    State(state): State<AppState>,
    Json(payload): Json<SelectRequest>,
) -> AppResult<Json<ResolvedLocation>> {
    check_session(&payload.session)?;

    let field = state.sessions.field(&payload.session, payload.field);
    let location = match &payload.selection {
        Selection::Admin { id } => state
            .resolver
            .select_admin(&field, id)
            .ok_or_else(|| AppError::NotFound(format!("Admin location '{}' not found", id)))?,
        Selection::Place(prediction) => state.resolver.select_prediction(&field, prediction).await,
    };

    tracing::debug!(
        session = %payload.session,
        field = %payload.field,
        validated = location.is_validated(),
        has_coordinates = location.coordinates().is_some(),
        "Location selected"
    );

    Ok(Json(location))
}

/// Reset a field in one update
pub async fn clear_field(
    State(state): State<AppState>,
    Query(query): Query<FieldQuery>,
) -> AppResult<Json<ResolvedLocation>> {
    check_session(&query.session)?;

    let location = match state.sessions.existing(&query.session, query.field) {
        Some(field) => field.clear(),
        None => ResolvedLocation::empty(query.field.role()),
    };
    Ok(Json(location))
}

/// Current state of a field
pub async fn get_field(
    State(state): State<AppState>,
    Query(query): Query<FieldQuery>,
) -> AppResult<Json<FieldResponse>> {
    check_session(&query.session)?;

    let response = match state.sessions.existing(&query.session, query.field) {
        Some(field) => FieldResponse {
            field: query.field,
            location: field.location(),
            places: field.search().current(),
        },
        None => FieldResponse {
            field: query.field,
            location: ResolvedLocation::empty(query.field.role()),
            places: SearchState::empty(),
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids() {
        assert!(check_session("abc-123_XYZ").is_ok());
        assert!(check_session("").is_err());
        assert!(check_session("has space").is_err());
        assert!(check_session(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_selection_payloads() {
        let admin: SelectRequest = serde_json::from_value(serde_json::json!({
            "session": "s1",
            "field": "stop-0",
            "selection": { "source": "admin", "id": "lax" }
        }))
        .unwrap();
        assert_eq!(admin.field, FieldKey::Stop(0));
        assert!(matches!(admin.selection, Selection::Admin { ref id } if id == "lax"));

        let place: SelectRequest = serde_json::from_value(serde_json::json!({
            "session": "s1",
            "field": "dropoff",
            "selection": {
                "source": "place",
                "place_id": "ChIJ",
                "description": "Union Station, Los Angeles, CA, USA",
                "structured_formatting": {
                    "main_text": "Union Station",
                    "secondary_text": "Los Angeles, CA, USA"
                }
            }
        }))
        .unwrap();
        assert!(matches!(place.selection, Selection::Place(ref p) if p.place_id == "ChIJ"));
    }
}
