use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use tower::limit::ConcurrencyLimitLayer;

use crate::handlers::{bookings, distance, health, locations};
use crate::middleware::rate_limit::{create_public_governor, log_request};
use crate::AppState;

/// Upper bound on simultaneous Directions lookups (each one is a billed request).
const MAX_CONCURRENT_ROUTE_LOOKUPS: usize = 16;

pub fn create_router(state: AppState) -> Router {
    // IP-based rate limiting for everything the booking form calls
    let public_governor = create_public_governor();

    // Location search and selection (one call per keystroke, debounced server-side)
    let location_routes = Router::new()
        .route("/admin", get(locations::admin_search))
        .route("/suggest", get(locations::suggest))
        .route("/select", post(locations::select))
        .route(
            "/field",
            get(locations::get_field).delete(locations::clear_field),
        );

    let route_routes = Router::new()
        .route("/distance", post(distance::route_distance))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_ROUTE_LOOKUPS));

    // Submitting computes the route distance too
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_ROUTE_LOOKUPS))
        .route("/{id}", get(bookings::get_booking));

    let api = Router::new()
        .nest("/locations", location_routes)
        .nest("/routes", route_routes)
        .nest("/bookings", booking_routes)
        .layer(public_governor)
        .layer(middleware::from_fn(log_request));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/api", api)
        .with_state(state)
}
