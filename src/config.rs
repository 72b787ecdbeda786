use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_TRIVIA_URL: &str = "https://opentdb.com";
pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_INSTANT_ANSWER_URL: &str = "https://api.duckduckgo.com";
pub const DEFAULT_SEARCH_FALLBACK_URL: &str = "https://duckduckgo.com/";
pub const USER_AGENT: &str = concat!("trivia-quiz/", env!("CARGO_PKG_VERSION"));

/// Trait for types that can be assembled from environment variables.
pub trait FromEnv: Sized {
    /// Read the value after loading `.env` (silently skipped when absent).
    fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` delegates here so the
    /// parsing can be exercised without touching the process environment.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>;
}

/// Endpoints, transport timeout and cache location for the quiz pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizConfig {
    pub trivia_url: String,
    pub wikipedia_url: String,
    pub instant_answer_url: String,
    /// Base of the generic web-search link used when no source supplies one.
    pub search_fallback_url: String,
    pub http_timeout: Duration,
    pub cache_dir: PathBuf,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            trivia_url: DEFAULT_TRIVIA_URL.to_string(),
            wikipedia_url: DEFAULT_WIKIPEDIA_URL.to_string(),
            instant_answer_url: DEFAULT_INSTANT_ANSWER_URL.to_string(),
            search_fallback_url: DEFAULT_SEARCH_FALLBACK_URL.to_string(),
            http_timeout: Duration::from_secs(8),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("trivia-quiz")
}

impl FromEnv for QuizConfig {
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("TRIVIA_API_URL") {
            config.trivia_url = url;
        }
        if let Some(url) = lookup("WIKIPEDIA_API_URL") {
            config.wikipedia_url = url;
        }
        if let Some(url) = lookup("INSTANT_ANSWER_API_URL") {
            config.instant_answer_url = url;
        }
        if let Some(url) = lookup("SEARCH_FALLBACK_URL") {
            config.search_fallback_url = url;
        }
        if let Some(raw) = lookup("QUIZ_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "QUIZ_HTTP_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue { key: "QUIZ_HTTP_TIMEOUT_SECS", value: raw });
            }
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("QUIZ_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        debug!(?config, "Loaded quiz configuration");
        Ok(config)
    }
}

impl QuizConfig {
    /// Build the shared HTTP client. Every transport call is bounded by
    /// `http_timeout`; the pipelines add no deadline of their own.
    pub fn http_client(&self) -> Result<Client, ConfigError> {
        info!(timeout_secs = self.http_timeout.as_secs(), "Building HTTP client");
        Ok(Client::builder()
            .timeout(self.http_timeout)
            .user_agent(USER_AGENT)
            .build()?)
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = QuizConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.trivia_url, DEFAULT_TRIVIA_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(8));
    }

    #[test]
    fn overrides_are_applied() {
        let config = QuizConfig::from_lookup(lookup_from(&[
            ("TRIVIA_API_URL", "http://localhost:9000"),
            ("QUIZ_HTTP_TIMEOUT_SECS", "3"),
            ("QUIZ_CACHE_DIR", "/tmp/quiz"),
        ]))
        .unwrap();
        assert_eq!(config.trivia_url, "http://localhost:9000");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/quiz"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        assert!(QuizConfig::from_lookup(lookup_from(&[("QUIZ_HTTP_TIMEOUT_SECS", "soon")])).is_err());
        assert!(QuizConfig::from_lookup(lookup_from(&[("QUIZ_HTTP_TIMEOUT_SECS", "0")])).is_err());
    }
}
