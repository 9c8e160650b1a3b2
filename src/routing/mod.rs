//! Route distance for billing.

pub mod directions;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::google::ProviderError;
use crate::locations::{Coordinates, LocationRole, ResolvedLocation};

use directions::{DirectionsProvider, DirectionsRequest, TravelMode};

/// Yards per meter.
pub const YARDS_PER_METER: f64 = 1.09361;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("No route found between the given locations")]
    NoRouteFound,

    #[error("The {role:?} location has no coordinates")]
    MissingCoordinates { role: LocationRole },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Coordinates-only view of a resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub coordinates: Coordinates,
}

impl TryFrom<&ResolvedLocation> for RoutePoint {
    type Error = RouteError;

    fn try_from(location: &ResolvedLocation) -> Result<Self, Self::Error> {
        location
            .coordinates()
            .map(|coordinates| RoutePoint { coordinates })
            .ok_or(RouteError::MissingCoordinates {
                role: location.role,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteDistance {
    pub meters: f64,
    pub yards: i64,
    pub legs: usize,
}

pub fn meters_to_yards(meters: f64) -> i64 {
    (meters * YARDS_PER_METER).round() as i64
}

/// Sums the legs of a driving route through every stop, in the order given.
///
/// Stops are never reordered for a shorter route; the customer's visit order
/// wins.
#[derive(Clone)]
pub struct RouteDistanceCalculator {
    provider: Arc<dyn DirectionsProvider>,
}

impl RouteDistanceCalculator {
    pub fn new(provider: Arc<dyn DirectionsProvider>) -> Self {
        Self { provider }
    }

    pub async fn calculate_route_distance(
        &self,
        pickup: RoutePoint,
        dropoff: RoutePoint,
        stops: &[RoutePoint],
    ) -> Result<RouteDistance, RouteError> {
        let request = DirectionsRequest {
            origin: pickup.coordinates,
            destination: dropoff.coordinates,
            waypoints: stops.iter().map(|s| s.coordinates).collect(),
            optimize_waypoints: false,
            mode: TravelMode::Driving,
        };

        let routes = self.provider.route(&request).await?;
        let route = routes.into_iter().next().ok_or(RouteError::NoRouteFound)?;

        let meters: f64 = route.legs.iter().map(|l| l.distance_meters).sum();
        let distance = RouteDistance {
            meters,
            yards: meters_to_yards(meters),
            legs: route.legs.len(),
        };

        tracing::debug!(
            stops = stops.len(),
            legs = distance.legs,
            yards = distance.yards,
            "Route distance calculated"
        );

        Ok(distance)
    }

    /// Same as [`calculate_route_distance`](Self::calculate_route_distance) for
    /// resolved form locations; every one of them needs coordinates.
    pub async fn distance_between(
        &self,
        pickup: &ResolvedLocation,
        dropoff: &ResolvedLocation,
        stops: &[ResolvedLocation],
    ) -> Result<RouteDistance, RouteError> {
        let pickup = RoutePoint::try_from(pickup)?;
        let dropoff = RoutePoint::try_from(dropoff)?;
        let stops = stops
            .iter()
            .map(RoutePoint::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        self.calculate_route_distance(pickup, dropoff, &stops).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeDirections;
    use super::*;
    use crate::locations::LocationSource;

    fn point(lat: f64, lng: f64) -> RoutePoint {
        RoutePoint {
            coordinates: Coordinates::new(lat, lng),
        }
    }

    #[tokio::test]
    async fn test_single_leg_converts_to_yards() {
        let provider = FakeDirections::with_legs(&[1000.0]);
        let calculator = RouteDistanceCalculator::new(Arc::new(provider));

        let distance = calculator
            .calculate_route_distance(point(0.0, 0.0), point(0.0, 0.0), &[])
            .await
            .unwrap();

        assert_eq!(distance.yards, 1094);
        assert_eq!(distance.legs, 1);
    }

    #[tokio::test]
    async fn test_legs_are_summed_before_rounding() {
        let calculator = RouteDistanceCalculator::new(Arc::new(FakeDirections::with_legs(&[
            1000.4, 2000.3, 500.2,
        ])));

        let distance = calculator
            .calculate_route_distance(
                point(0.0, 0.0),
                point(1.0, 1.0),
                &[point(0.5, 0.5), point(0.7, 0.7)],
            )
            .await
            .unwrap();

        assert_eq!(distance.meters, 1000.4 + 2000.3 + 500.2);
        assert_eq!(distance.yards, meters_to_yards(3500.9));
        assert_eq!(distance.yards, 3829);
    }

    #[tokio::test]
    async fn test_zero_routes_is_no_route_found() {
        let calculator = RouteDistanceCalculator::new(Arc::new(FakeDirections::default()));

        let err = calculator
            .calculate_route_distance(point(0.0, 0.0), point(0.0, 0.0), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, RouteError::NoRouteFound));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = FakeDirections {
            fail: true,
            ..Default::default()
        };
        let calculator = RouteDistanceCalculator::new(Arc::new(provider));

        let err = calculator
            .calculate_route_distance(point(0.0, 0.0), point(0.0, 0.0), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, RouteError::Provider(_)));
    }

    #[tokio::test]
    async fn test_waypoints_keep_input_order() {
        let provider = Arc::new(FakeDirections::with_legs(&[1.0, 1.0, 1.0, 1.0]));
        let calculator = RouteDistanceCalculator::new(provider.clone());
        let stops = [point(3.0, 3.0), point(1.0, 1.0), point(2.0, 2.0)];

        calculator
            .calculate_route_distance(point(0.0, 0.0), point(9.0, 9.0), &stops)
            .await
            .unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(!request.optimize_waypoints);
        assert_eq!(request.mode, TravelMode::Driving);
        assert_eq!(request.origin, Coordinates::new(0.0, 0.0));
        assert_eq!(request.destination, Coordinates::new(9.0, 9.0));
        assert_eq!(
            request.waypoints,
            vec![
                Coordinates::new(3.0, 3.0),
                Coordinates::new(1.0, 1.0),
                Coordinates::new(2.0, 2.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_location_without_coordinates_is_rejected() {
        let provider = Arc::new(FakeDirections::with_legs(&[1000.0]));
        let calculator = RouteDistanceCalculator::new(provider.clone());

        let pickup = ResolvedLocation {
            address: "Somewhere".to_string(),
            name: None,
            role: LocationRole::Pickup,
            is_airport: false,
            source: LocationSource::Place {
                place_id: "abc".to_string(),
                coordinates: None,
            },
        };
        let mut dropoff = pickup.clone();
        dropoff.role = LocationRole::Dropoff;
        dropoff.source = LocationSource::Admin {
            admin_location_id: "lax".to_string(),
            coordinates: Coordinates::new(33.94, -118.40),
        };

        let err = calculator
            .distance_between(&pickup, &dropoff, &[])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RouteError::MissingCoordinates {
                role: LocationRole::Pickup
            }
        ));
        assert!(provider.requests.lock().unwrap().is_empty());
    }
}
