//! Deployment configuration
//!
//! `NotehubConfig` gathers the constants the core consumes but never
//! computes: where the service lives, the static credential, the page size
//! and the search debounce interval. It is built once at startup (usually
//! from the environment) and split into the `ClientConfig` for the Request
//! Executor and the `BrowseSettings` for the controller.

use crate::client::ClientConfig;
use crate::services::BrowseSettings;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_ENDPOINT: &str = "https://notehub-public.goit.study/api/";
pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Accepted range for the search quiet interval
const MIN_DEBOUNCE_MS: u64 = 300;
const MAX_DEBOUNCE_MS: u64 = 500;

pub const ENV_BASE_URL: &str = "NOTEHUB_BASE_URL";
pub const ENV_TOKEN: &str = "NOTEHUB_TOKEN";
pub const ENV_PAGE_SIZE: &str = "NOTEHUB_PAGE_SIZE";
pub const ENV_DEBOUNCE_MS: &str = "NOTEHUB_DEBOUNCE_MS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidNumber { name: String, value: String },

    #[error("Page size must be at least 1")]
    ZeroPageSize,

    #[error("Debounce interval must be between {min} and {max} ms, got {actual}")]
    DebounceOutOfRange { min: u64, max: u64, actual: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotehubConfig {
    pub base_endpoint: String,
    pub credential: String,
    pub page_size: u32,
    pub debounce: Duration,
}

impl Default for NotehubConfig {
    fn default() -> Self {
        Self {
            base_endpoint: DEFAULT_BASE_ENDPOINT.to_string(),
            credential: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl NotehubConfig {
    /// Build configuration from `NOTEHUB_*` environment variables
    ///
    /// Unset variables fall back to defaults. A missing token only logs a
    /// warning; the service will answer with 401 and the session surfaces
    /// an auth error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_endpoint = lookup(ENV_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_endpoint);

        let credential = lookup(ENV_TOKEN).unwrap_or_default();
        if credential.trim().is_empty() {
            tracing::warn!("{} is not set; NoteHub requests will be unauthorized", ENV_TOKEN);
        }

        let page_size = match lookup(ENV_PAGE_SIZE) {
            Some(raw) => parse_number::<u32>(ENV_PAGE_SIZE, &raw)?,
            None => defaults.page_size,
        };

        let debounce = match lookup(ENV_DEBOUNCE_MS) {
            Some(raw) => Duration::from_millis(parse_number::<u64>(ENV_DEBOUNCE_MS, &raw)?),
            None => defaults.debounce,
        };

        let config = Self {
            base_endpoint,
            credential,
            page_size,
            debounce,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        let millis = self.debounce.as_millis() as u64;
        if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&millis) {
            return Err(ConfigError::DebounceOutOfRange {
                min: MIN_DEBOUNCE_MS,
                max: MAX_DEBOUNCE_MS,
                actual: millis,
            });
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_endpoint.clone(), self.credential.clone())
    }

    pub fn browse_settings(&self) -> BrowseSettings {
        BrowseSettings {
            page_size: self.page_size,
            debounce: self.debounce,
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = NotehubConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, NotehubConfig::default());
        assert_eq!(config.browse_settings().page_size, 12);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = NotehubConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://localhost:4000/api"),
            (ENV_TOKEN, "abc"),
            (ENV_PAGE_SIZE, "24"),
            (ENV_DEBOUNCE_MS, "500"),
        ]))
        .unwrap();

        assert_eq!(config.base_endpoint, "http://localhost:4000/api");
        assert_eq!(config.client_config().credential, "abc");
        assert_eq!(config.page_size, 24);
        assert_eq!(config.debounce, Duration::from_millis(500));
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert_eq!(
            NotehubConfig::from_lookup(lookup(&[(ENV_PAGE_SIZE, "twelve")])),
            Err(ConfigError::InvalidNumber {
                name: ENV_PAGE_SIZE.to_string(),
                value: "twelve".to_string()
            })
        );
        assert_eq!(
            NotehubConfig::from_lookup(lookup(&[(ENV_PAGE_SIZE, "0")])),
            Err(ConfigError::ZeroPageSize)
        );
        assert!(matches!(
            NotehubConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, "0")])),
            Err(ConfigError::DebounceOutOfRange { actual: 0, .. })
        ));
    }

    #[test]
    fn test_debounce_must_stay_within_quiet_interval_bounds() {
        for accepted in ["300", "400", "500"] {
            assert!(NotehubConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, accepted)])).is_ok());
        }
        assert_eq!(
            NotehubConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, "299")])),
            Err(ConfigError::DebounceOutOfRange {
                min: 300,
                max: 500,
                actual: 299
            })
        );
        assert!(matches!(
            NotehubConfig::from_lookup(lookup(&[(ENV_DEBOUNCE_MS, "5000")])),
            Err(ConfigError::DebounceOutOfRange { actual: 5000, .. })
        ));
    }
}
