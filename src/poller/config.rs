//! Poller configuration
//!
//! Plain serde structs with millisecond integer durations, loadable from
//! JSON and overridable from the environment.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::EndpointRequest;

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "AGENTOPS_BASE_URL";

/// Environment variable overriding `cache_ttl_ms`
pub const CACHE_TTL_ENV: &str = "AGENTOPS_CACHE_TTL_MS";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// One endpoint polled by a tier, stored in the snapshot under `key`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub key: String,
    pub request: EndpointRequest,
}

/// One refresh cadence and the endpoints it covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    /// Period between ticks in milliseconds
    pub interval_ms: u64,
    /// Event type notified after a successful refresh
    pub event: String,
    pub endpoints: Vec<EndpointConfig>,
}

impl TierConfig {
    /// New tier notifying `<name>_updated`
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        let name = name.into();
        Self {
            event: format!("{}_updated", name),
            name,
            interval_ms: interval.as_millis() as u64,
            endpoints: Vec::new(),
        }
    }

    /// Add an endpoint stored under `key`
    pub fn endpoint(mut self, key: impl Into<String>, request: EndpointRequest) -> Self {
        self.endpoints.push(EndpointConfig {
            key: key.into(),
            request,
        });
        self
    }

    /// Override the event type
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Everything a polling service needs: endpoints, intervals and TTL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Service name used in logs and metrics
    pub name: String,
    pub base_url: String,
    pub cache_ttl_ms: u64,
    pub request_timeout_ms: u64,
    pub tiers: Vec<TierConfig>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            name: "poller".to_string(),
            base_url: "http://localhost:3000".to_string(),
            cache_ttl_ms: 30_000,
            request_timeout_ms: 10_000,
            tiers: Vec::new(),
        }
    }
}

impl PollerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_tier(mut self, tier: TierConfig) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Look up a tier by name
    pub fn tier(&self, name: &str) -> Option<&TierConfig> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Parse JSON text, apply environment overrides and validate
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Self::parse(text, |key| std::env::var(key).ok())
    }

    /// Read a JSON file and load it like [`PollerConfig::from_json_str`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn parse<F>(text: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = serde_json::from_str(text)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AGENTOPS_BASE_URL` and `AGENTOPS_CACHE_TTL_MS` when set
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.base_url = base_url.trim().to_string();
            }
        }
        if let Some(ttl) = lookup(CACHE_TTL_ENV) {
            self.cache_ttl_ms = ttl.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} must be an integer, got {:?}", CACHE_TTL_ENV, ttl))
            })?;
        }
        Ok(())
    }

    /// Check the invariants the poller relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("service name is empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url is empty".to_string()));
        }
        if self.tiers.is_empty() {
            return Err(ConfigError::Invalid(format!("service '{}' has no tiers", self.name)));
        }

        let mut seen = HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate tier '{}'", tier.name)));
            }
            if tier.interval_ms == 0 {
                return Err(ConfigError::Invalid(format!("tier '{}' has a zero interval", tier.name)));
            }
            if tier.endpoints.is_empty() {
                return Err(ConfigError::Invalid(format!("tier '{}' has no endpoints", tier.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> PollerConfig {
        PollerConfig::new("sample").with_tier(
            TierConfig::new("basic", Duration::from_secs(15))
                .endpoint("summary", EndpointRequest::resource("agents/performance")),
        )
    }

    #[test]
    fn test_builder_defaults() {
        let config = sample();
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.tiers[0].event, "basic_updated");
        assert_eq!(config.tier("basic").unwrap().interval(), Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let json = r#"{
            "name": "queues",
            "tiers": [{
                "name": "queues",
                "interval_ms": 10000,
                "event": "queues_updated",
                "endpoints": [{"key": "queues", "request": {"path": "/api/enterprise/task-queues"}}]
            }]
        }"#;
        let config = PollerConfig::parse(json, |_| None).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.tiers[0].endpoints[0].request.query.is_empty());
    }

    #[test]
    fn test_validation_failures() {
        assert!(PollerConfig::new("empty").validate().is_err());

        let mut zero = sample();
        zero.tiers[0].interval_ms = 0;
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid(_))));

        let duplicate = sample().with_tier(
            TierConfig::new("basic", Duration::from_secs(60))
                .endpoint("x", EndpointRequest::resource("x")),
        );
        assert!(duplicate.validate().is_err());

        let no_endpoints = PollerConfig::new("s").with_tier(TierConfig::new("t", Duration::from_secs(1)));
        assert!(no_endpoints.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PollerConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    const QUEUES: &str = r#"{
        "name": "queues",
        "base_url": "http://monitor:3000",
        "tiers": [{
            "name": "queues",
            "interval_ms": 10000,
            "event": "queues_updated",
            "endpoints": [{"key": "queues", "request": {"path": "/api/enterprise/task-queues"}}]
        }]
    }"#;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_env_overrides_base_url_and_ttl() {
        let config = PollerConfig::parse(
            QUEUES,
            env(&[(BASE_URL_ENV, " http://override:9 "), (CACHE_TTL_ENV, "5000")]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://override:9");
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));

        let blank = PollerConfig::parse(QUEUES, env(&[(BASE_URL_ENV, "  ")])).unwrap();
        assert_eq!(blank.base_url, "http://monitor:3000");
    }

    #[test]
    fn test_non_integer_ttl_rejected() {
        let result = PollerConfig::parse(QUEUES, env(&[(CACHE_TTL_ENV, "thirty seconds")]));
        match result {
            Err(ConfigError::Invalid(message)) => assert!(message.contains(CACHE_TTL_ENV), "{}", message),
            other => panic!("expected invalid ttl, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("agentops-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, QUEUES).unwrap();
        let loaded = PollerConfig::from_file(&path);
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.name, "queues");
        assert_eq!(config.tiers[0].interval(), Duration::from_secs(10));
        assert_eq!(config.tiers[0].event, "queues_updated");

        let missing = std::env::temp_dir().join(format!("agentops-missing-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(PollerConfig::from_file(&missing), Err(ConfigError::Io(_))));
    }
}
