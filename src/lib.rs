pub mod booking;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod google;
pub mod handlers;
pub mod locations;
pub mod middleware;
pub mod payment;
pub mod routes;
pub mod routing;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use locations::sessions::FieldSessions;
use locations::LocationResolver;
use payment::PaymentRegistry;
use routing::RouteDistanceCalculator;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub resolver: LocationResolver,
    pub sessions: Arc<FieldSessions>,
    pub distance: RouteDistanceCalculator,
    pub payments: Arc<PaymentRegistry>,
}
