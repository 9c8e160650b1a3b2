use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub google_maps_api_key: String,
    pub server_host: String,
    pub server_port: u16,
    pub places_debounce_ms: u64,
    pub places_country: String,
    pub places_types: Option<String>,
    pub session_idle_minutes: u64,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// A missing Maps key is a configuration error: there is no search mode
    /// that works without it.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let google_maps_api_key = required("GOOGLE_MAPS_API_KEY")?;

        Ok(Self {
            database_url,
            google_maps_api_key,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parsed("SERVER_PORT", 3000)?,
            places_debounce_ms: parsed("PLACES_DEBOUNCE_MS", 300)?,
            places_country: env::var("PLACES_COUNTRY")
                .unwrap_or_else(|_| "us".to_string())
                .to_lowercase(),
            places_types: optional("PLACES_TYPES"),
            session_idle_minutes: parsed("SESSION_IDLE_MINUTES", 30)?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn places_debounce(&self) -> Duration {
        Duration::from_millis(self.places_debounce_ms)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }
}

fn required(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Configuration(format!("{} must be set", name))),
    }
}

/// Unset and blank both mean "not configured".
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a number", name))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_falls_back_to_default() {
        let value: u64 = parsed("RIDE_BOOKING_TEST_UNSET_VARIABLE", 300).unwrap();
        assert_eq!(value, 300);
    }

    #[test]
    fn test_optional_unset_is_none() {
        assert_eq!(optional("RIDE_BOOKING_TEST_UNSET_TYPES"), None);
    }

    #[test]
    fn test_required_rejects_missing() {
        let err = required("RIDE_BOOKING_TEST_MISSING_KEY").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
