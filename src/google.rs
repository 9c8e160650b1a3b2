//! Google Maps web service adapter (Places Autocomplete, Place Details,
//! Directions) over `reqwest`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::locations::places::{AutocompleteFilter, PlacesProvider};
use crate::locations::{Coordinates, PlaceDetails, PlacePrediction, StructuredFormatting};
use crate::routing::directions::{DirectionsProvider, DirectionsRequest, DirectionsRoute, RouteLeg};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

const DETAILS_FIELDS: &str = "geometry,formatted_address,types";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Status { status: String, message: String },
}

/// Client for the Maps web services. Cheap to clone.
#[derive(Clone)]
pub struct GoogleMaps {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GoogleMaps {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let body = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(body)
    }
}

/// `OK` and `ZERO_RESULTS` are successful answers; everything else is an error.
fn check_status(status: &str, error_message: Option<String>) -> Result<(), ProviderError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(ProviderError::Status {
            status: other.to_string(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    predictions: Vec<AutocompletePrediction>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AutocompletePrediction {
    place_id: String,
    description: String,
    structured_formatting: Option<StructuredFormatting>,
}

impl From<AutocompletePrediction> for PlacePrediction {
    fn from(p: AutocompletePrediction) -> Self {
        let structured_formatting = p.structured_formatting.unwrap_or_else(|| StructuredFormatting {
            main_text: p.description.clone(),
            secondary_text: String::new(),
        });
        PlacePrediction {
            place_id: p.place_id,
            description: p.description,
            structured_formatting,
        }
    }
}

impl AutocompleteResponse {
    fn into_predictions(self) -> Result<Vec<PlacePrediction>, ProviderError> {
        check_status(&self.status, self.error_message)?;
        Ok(self.predictions.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<DetailsResult>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    geometry: Option<Geometry>,
    formatted_address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

impl DetailsResponse {
    fn into_details(self) -> Result<PlaceDetails, ProviderError> {
        if self.status != "OK" {
            return Err(ProviderError::Status {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            });
        }
        let result = self.result.ok_or_else(|| ProviderError::Status {
            status: "OK".to_string(),
            message: "details response without result".to_string(),
        })?;

        Ok(PlaceDetails {
            coordinates: result.geometry.map(|g| g.location),
            formatted_address: result.formatted_address,
            types: result.types,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<GoogleRoute>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    #[serde(default)]
    legs: Vec<GoogleLeg>,
}

#[derive(Debug, Deserialize)]
struct GoogleLeg {
    distance: TextValue,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: f64,
}

impl DirectionsResponse {
    fn into_routes(self) -> Result<Vec<DirectionsRoute>, ProviderError> {
        check_status(&self.status, self.error_message)?;
        Ok(self
            .routes
            .into_iter()
            .map(|r| DirectionsRoute {
                legs: r
                    .legs
                    .into_iter()
                    .map(|l| RouteLeg {
                        distance_meters: l.distance.value,
                    })
                    .collect(),
            })
            .collect())
    }
}

fn autocomplete_params(input: &str, filter: &AutocompleteFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("input", input.to_string()),
        ("components", format!("country:{}", filter.country)),
    ];
    if let Some(types) = &filter.types {
        params.push(("types", types.clone()));
    }
    params
}

/// Query parameters for a directions request, waypoints kept in visit order.
fn directions_params(request: &DirectionsRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("origin", request.origin.to_string()),
        ("destination", request.destination.to_string()),
        ("mode", request.mode.as_str().to_string()),
    ];

    if !request.waypoints.is_empty() {
        let mut waypoints = vec![format!("optimize:{}", request.optimize_waypoints)];
        waypoints.extend(request.waypoints.iter().map(|w| w.to_string()));
        params.push(("waypoints", waypoints.join("|")));
    }

    params
}

#[async_trait]
impl PlacesProvider for GoogleMaps {
    /// Check the key with a minimal autocomplete call; a denied key fails the load.
    async fn load(&self) -> Result<(), ProviderError> {
        let response: AutocompleteResponse = self
            .get("place/autocomplete/json", &[("input", "airport".to_string())])
            .await?;
        response.into_predictions().map(|_| ())
    }

    async fn autocomplete(
        &self,
        input: &str,
        filter: &AutocompleteFilter,
    ) -> Result<Vec<PlacePrediction>, ProviderError> {
        let params = autocomplete_params(input, filter);
        let response: AutocompleteResponse = self.get("place/autocomplete/json", &params).await?;
        response.into_predictions()
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError> {
        let params = [
            ("place_id", place_id.to_string()),
            ("fields", DETAILS_FIELDS.to_string()),
        ];
        let response: DetailsResponse = self.get("place/details/json", &params).await?;
        response.into_details()
    }
}

#[async_trait]
impl DirectionsProvider for GoogleMaps {
    async fn route(
        &self,
        request: &DirectionsRequest,
    ) -> Result<Vec<DirectionsRoute>, ProviderError> {
        let params = directions_params(request);
        let response: DirectionsResponse = self.get("directions/json", &params).await?;
        response.into_routes()
    }
}
