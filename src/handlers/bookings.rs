use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::EntityTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::booking::{self, BookingForm, BookingRecord};
use crate::entities::booking as booking_entity;
use crate::error::{AppError, AppResult};
use crate::routing::RouteDistance;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    pub booking: BookingRecord,
    pub route: RouteDistance,
}

/// Submit the booking form
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<BookingForm>,
) -> AppResult<(StatusCode, Json<CreateBookingResponse>)> {
    let (model, route) = booking::submit(
        &state.db,
        &state.resolver,
        &state.distance,
        &state.payments,
        payload,
    )
    .await?;
    let record = BookingRecord::from_model(model, &state.payments)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking: record,
            route,
        }),
    ))
}

/// Get a booking by id
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingRecord>> {
    let model = booking_entity::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(Json(BookingRecord::from_model(model, &state.payments)?))
}
