use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::google::ProviderError;

use super::{PlaceDetails, PlacePrediction};

/// Inputs shorter than this never reach the provider.
pub const MIN_PLACES_QUERY_LEN: usize = 3;

/// Restrictions sent with every autocomplete request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AutocompleteFilter {
    pub country: String,
    /// Pipe-separated place types; `None` lets every type through.
    pub types: Option<String>,
}

/// External place autocomplete / details service.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// One-time initialization. Called at most once per client.
    async fn load(&self) -> Result<(), ProviderError>;

    async fn autocomplete(
        &self,
        input: &str,
        filter: &AutocompleteFilter,
    ) -> Result<Vec<PlacePrediction>, ProviderError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

/// Outcome of a places search, as shown to the dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchState {
    /// Provider still loading, or a newer query superseded this one.
    Loading,
    Ready { predictions: Vec<PlacePrediction> },
    /// Provider failed to load; searches are disabled.
    Unavailable,
    Error { reason: String },
}

impl SearchState {
    pub fn empty() -> Self {
        SearchState::Ready {
            predictions: Vec::new(),
        }
    }

    pub fn predictions(&self) -> &[PlacePrediction] {
        match self {
            SearchState::Ready { predictions } => predictions,
            _ => &[],
        }
    }
}

/// Shared adapter over one places provider.
///
/// Owns the load-once lifecycle: `Uninitialized -> Loading -> Ready | Failed`.
/// A failed load is sticky; nothing retries it.
pub struct PlacesSearchClient {
    provider: Arc<dyn PlacesProvider>,
    state: Mutex<ProviderState>,
    loaded: OnceCell<ProviderState>,
    filter: AutocompleteFilter,
    debounce: Duration,
}

impl PlacesSearchClient {
    pub fn new(provider: Arc<dyn PlacesProvider>, country: &str, debounce: Duration) -> Self {
        Self {
            provider,
            state: Mutex::new(ProviderState::Uninitialized),
            loaded: OnceCell::new(),
            filter: AutocompleteFilter {
                country: country.to_string(),
                types: None,
            },
            debounce,
        }
    }

    /// Restrict predictions to the given place types. Blank means no restriction.
    pub fn with_types(mut self, types: Option<String>) -> Self {
        self.filter.types = types.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn state(&self) -> ProviderState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn set_state(&self, state: ProviderState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Load the provider. Concurrent callers share the same in-flight load.
    pub async fn load(&self) -> ProviderState {
        *self
            .loaded
            .get_or_init(|| async {
                self.set_state(ProviderState::Loading);
                let state = match self.provider.load().await {
                    Ok(()) => {
                        tracing::info!("Places provider ready");
                        ProviderState::Ready
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Places provider failed to load");
                        ProviderState::Failed
                    }
                };
                self.set_state(state);
                state
            })
            .await
    }

    /// Run one autocomplete query without debouncing.
    pub async fn search(&self, input: &str) -> SearchState {
        match self.state() {
            ProviderState::Uninitialized | ProviderState::Loading => return SearchState::Loading,
            ProviderState::Failed => return SearchState::Unavailable,
            ProviderState::Ready => {}
        }

        match self.provider.autocomplete(input, &self.filter).await {
            Ok(predictions) => SearchState::Ready { predictions },
            Err(e) => {
                tracing::warn!(input = %input, error = %e, "Place autocomplete failed");
                SearchState::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch coordinates and type tags for a prediction.
    ///
    /// `None` means "continue without coordinates": the client is not ready or
    /// the provider rejected the lookup.
    pub async fn place_details(&self, place_id: &str) -> Option<PlaceDetails> {
        if self.state() != ProviderState::Ready {
            tracing::debug!(place_id = %place_id, "Skipping place details, provider not ready");
            return None;
        }

        match self.provider.place_details(place_id).await {
            Ok(details) => Some(details),
            Err(e) => {
                tracing::warn!(place_id = %place_id, error = %e, "Place details lookup failed");
                None
            }
        }
    }
}

/// Per-field search state: debounce window plus the current prediction set.
///
/// Every call to [`search`](Self::search) takes a new generation number. A
/// call only dispatches if it is still the latest once the debounce window
/// has elapsed, and its response is only applied if no newer call has been
/// issued since.
pub struct PlacesSearchSession {
    client: Arc<PlacesSearchClient>,
    generation: AtomicU64,
    current: Mutex<SearchState>,
}

impl PlacesSearchSession {
    pub fn new(client: Arc<PlacesSearchClient>) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
            current: Mutex::new(SearchState::empty()),
        }
    }

    pub fn client(&self) -> &Arc<PlacesSearchClient> {
        &self.client
    }

    pub fn current(&self) -> SearchState {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Drop the prediction set and invalidate anything still pending.
    pub fn clear(&self) {
        let generation = self.next_generation();
        self.apply(generation, SearchState::empty());
    }

    pub async fn search(&self, input: &str) -> SearchState {
        let generation = self.next_generation();
        let input = input.trim();

        // Short input clears immediately, bypassing the debounce.
        if input.chars().count() < MIN_PLACES_QUERY_LEN {
            self.apply(generation, SearchState::empty());
            return SearchState::empty();
        }

        tokio::time::sleep(self.client.debounce()).await;
        if !self.is_latest(generation) {
            return SearchState::Loading;
        }

        let result = self.client.search(input).await;
        if self.apply(generation, result.clone()) {
            result
        } else {
            tracing::debug!(input = %input, generation, "Discarding stale place predictions");
            SearchState::Loading
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn apply(&self, generation: u64, state: SearchState) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_latest(generation) {
            return false;
        }
        *current = state;
        true
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn searches(provider: &Arc<FakePlaces>) -> Vec<String> {
        provider.search_calls.lock().unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_is_shared_between_callers() {
        let provider = Arc::new(FakePlaces::default());
        let client = PlacesSearchClient::new(provider.clone(), "us", Duration::from_millis(300));
        assert_eq!(client.state(), ProviderState::Uninitialized);

        let (a, b) = tokio::join!(client.load(), client.load());
        assert_eq!(a, ProviderState::Ready);
        assert_eq!(b, ProviderState::Ready);
        assert_eq!(client.load().await, ProviderState::Ready);
        assert_eq!(provider.load_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_is_sticky() {
        let provider = Arc::new(FakePlaces {
            fail_load: true,
            ..Default::default()
        });
        let client = PlacesSearchClient::new(provider.clone(), "us", Duration::from_millis(300));

        assert_eq!(client.load().await, ProviderState::Failed);
        assert_eq!(client.load().await, ProviderState::Failed);
        assert_eq!(provider.load_calls.load(Ordering::SeqCst), 1);

        assert_eq!(client.search("airport").await, SearchState::Unavailable);
        assert!(client.place_details("id-airport").await.is_none());
        assert!(searches(&provider).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_sends_country_and_types() {
        let provider = Arc::new(FakePlaces::default());
        let client = PlacesSearchClient::new(provider.clone(), "us", Duration::from_millis(300))
            .with_types(Some("airport|lodging".to_string()));
        client.load().await;

        client.search("santa monica").await;

        let filters = provider.filters.lock().unwrap().clone();
        assert_eq!(
            filters,
            vec![AutocompleteFilter {
                country: "us".to_string(),
                types: Some("airport|lodging".to_string()),
            }]
        );

        let blank = PlacesSearchClient::new(provider, "us", Duration::from_millis(300))
            .with_types(Some("  ".to_string()));
        assert_eq!(blank.filter.types, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_before_load_reports_loading() {
        let provider = Arc::new(FakePlaces::default());
        let client = PlacesSearchClient::new(provider.clone(), "us", Duration::from_millis(300));

        assert_eq!(client.search("airport").await, SearchState::Loading);
        assert!(client.place_details("anything").await.is_none());
        assert!(searches(&provider).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_calls_collapse_to_last_input() {
        let provider = Arc::new(FakePlaces::default());
        let client = Arc::new(PlacesSearchClient::new(
            provider.clone(),
            "us",
            Duration::from_millis(300),
        ));
        client.load().await;
        let session = PlacesSearchSession::new(client);

        let (a, b, c) = tokio::join!(
            session.search("los"),
            session.search("los a"),
            session.search("los angeles"),
        );

        assert_eq!(a, SearchState::Loading);
        assert_eq!(b, SearchState::Loading);
        assert_eq!(c.predictions()[0].description, "los angeles");
        assert_eq!(searches(&provider), vec!["los angeles".to_string()]);
        assert_eq!(session.current(), c);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_clears_without_waiting() {
        let provider = Arc::new(FakePlaces::default());
        let client = Arc::new(PlacesSearchClient::new(
            provider.clone(),
            "us",
            Duration::from_millis(300),
        ));
        client.load().await;
        let session = PlacesSearchSession::new(client);

        session.search("hotel").await;
        assert_eq!(session.current().predictions().len(), 1);

        let started = tokio::time::Instant::now();
        let result = session.search("ho").await;
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(result, SearchState::empty());
        assert_eq!(session.current(), SearchState::empty());
        assert_eq!(searches(&provider).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_does_not_overwrite_newer() {
        let mut provider = FakePlaces::default();
        provider
            .latency
            .insert("old query".to_string(), Duration::from_millis(2000));
        provider
            .latency
            .insert("new query".to_string(), Duration::from_millis(10));
        let provider = Arc::new(provider);
        let client = Arc::new(PlacesSearchClient::new(
            provider.clone(),
            "us",
            Duration::from_millis(300),
        ));
        client.load().await;
        let session = Arc::new(PlacesSearchSession::new(client));

        let older = {
            let session = session.clone();
            tokio::spawn(async move { session.search("old query").await })
        };
        // let the first query get past its debounce window and dispatch
        tokio::time::sleep(Duration::from_millis(350)).await;

        let newer = session.search("new query").await;
        assert_eq!(newer.predictions()[0].description, "new query");

        let older = older.await.unwrap();
        assert_eq!(older, SearchState::Loading);
        assert_eq!(session.current(), newer);
        assert_eq!(
            searches(&provider),
            vec!["old query".to_string(), "new query".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_error_is_reported_not_raised() {
        let provider = Arc::new(FakePlaces {
            fail_search: true,
            ..Default::default()
        });
        let client = Arc::new(PlacesSearchClient::new(
            provider,
            "us",
            Duration::from_millis(300),
        ));
        client.load().await;
        let session = PlacesSearchSession::new(client);

        let result = session.search("airport").await;
        assert!(matches!(result, SearchState::Error { .. }));
        assert!(result.predictions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_details_non_ok_becomes_none() {
        let mut provider = FakePlaces::default();
        provider
            .details
            .insert("known".to_string(), details(1.0, 2.0, &["airport"]));
        let client = ready_client(provider).await;

        assert!(client.place_details("known").await.is_some());
        assert!(client.place_details("unknown").await.is_none());
    }
}
