use async_trait::async_trait;

use crate::google::ProviderError;
use crate::locations::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Driving,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    /// Intermediate stops in visit order.
    pub waypoints: Vec<Coordinates>,
    pub optimize_waypoints: bool,
    pub mode: TravelMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRoute {
    pub legs: Vec<RouteLeg>,
}

/// External route computation service.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Returns every route the provider found; an empty list means no route.
    async fn route(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<DirectionsRoute>, ProviderError>;
}
