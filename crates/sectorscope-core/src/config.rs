//! Client configuration.
//!
//! Values come from the environment and can be overridden by the caller
//! (the CLI applies its global flags on top of [`ClientConfig::from_env`]).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SECTORSCOPE_API_BASE_URL` | `http://localhost:8000/api` |
//! | `SECTORSCOPE_DATASET` | unset |
//! | `SECTORSCOPE_TIMEOUT_MS` | `10000` |
//! | `SECTORSCOPE_CACHE_TTL_SECS` | `0` (cache disabled, at most one day) |

use std::time::Duration;

use crate::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const MAX_CACHE_TTL_SECS: u64 = 86_400;

const ENV_BASE_URL: &str = "SECTORSCOPE_API_BASE_URL";
const ENV_DATASET: &str = "SECTORSCOPE_DATASET";
const ENV_TIMEOUT_MS: &str = "SECTORSCOPE_TIMEOUT_MS";
const ENV_CACHE_TTL: &str = "SECTORSCOPE_CACHE_TTL_SECS";

/// Connection settings for the screener REST backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    pub dataset: Option<String>,
    pub timeout_ms: u64,
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_API_BASE_URL),
            dataset: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_ttl: Duration::ZERO,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|value| !value.trim().is_empty()) {
            config.base_url = normalize_base_url(&url)?;
        }

        config.dataset = lookup(ENV_DATASET)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_number(ENV_TIMEOUT_MS, &raw)?;
        }

        if let Some(raw) = lookup(ENV_CACHE_TTL) {
            let secs = parse_number(ENV_CACHE_TTL, &raw)?;
            if secs > MAX_CACHE_TTL_SECS {
                return Err(ConfigError::CacheTtlTooLarge {
                    value: secs,
                    max: MAX_CACHE_TTL_SECS,
                });
            }
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        let dataset = dataset.into();
        self.dataset = if dataset.trim().is_empty() {
            None
        } else {
            Some(dataset)
        };
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn normalize_base_url(input: &str) -> Result<String, ConfigError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::UnsupportedScheme {
            value: input.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: raw.to_owned(),
        })
}
