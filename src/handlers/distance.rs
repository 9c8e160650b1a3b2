use axum::{extract::State, Json};
use serde::Deserialize;

use crate::booking::verify_location;
use crate::error::AppResult;
use crate::locations::ResolvedLocation;
use crate::routing::RouteDistance;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DistanceRequest {
    pub pickup: ResolvedLocation,
    pub dropoff: ResolvedLocation,
    #[serde(default)]
    pub stops: Vec<ResolvedLocation>,
}

/// Driving distance through all stops, in yards
pub async fn route_distance(
    State(state): State<AppState>,
    Json(payload): Json<DistanceRequest>,
) -> AppResult<Json<RouteDistance>> {
    let pickup = verify_location(&state.resolver, &payload.pickup, "Pickup").await?;
    let dropoff = verify_location(&state.resolver, &payload.dropoff, "Dropoff").await?;
    let mut stops = Vec::with_capacity(payload.stops.len());
    for stop in &payload.stops {
        stops.push(verify_location(&state.resolver, stop, "Stop").await?);
    }

    let distance = state
        .distance
        .distance_between(&pickup, &dropoff, &stops)
        .await?;
    Ok(Json(distance))
}
