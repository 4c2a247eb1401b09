//! Polling services
//!
//! A [`PollingService`] owns a set of refresh tiers, each with its own
//! interval and endpoints. Ticks fetch the tier's endpoints, write them to
//! the response cache, merge them into an immutable [`MonitoringSnapshot`],
//! recompute derived metrics through a [`SnapshotAnalyzer`] and notify
//! subscribers.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod config;
pub mod service;

pub use config::{ConfigError, EndpointConfig, PollerConfig, TierConfig};
pub use service::{PollingService, TimerInfo};

/// Lifecycle of a polling service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Stopped,
    Starting,
    Monitoring,
}

/// Latest merged view of everything a service has fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    pub service: String,
    /// Increments on every merge
    pub sequence: u64,
    /// Endpoint key to latest body
    pub data: BTreeMap<String, Value>,
    /// Output of the service's analyzer
    pub derived: Value,
    /// Tier name to time of its last successful refresh
    pub refreshed_tiers: BTreeMap<String, DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonitoringSnapshot {
    /// Snapshot with no data, before the first refresh
    pub fn empty(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            sequence: 0,
            data: BTreeMap::new(),
            derived: Value::Null,
            refreshed_tiers: BTreeMap::new(),
            updated_at: None,
        }
    }

    /// Body stored under an endpoint key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Payload delivered to subscribers
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A tier refreshed at least one endpoint
    Updated {
        tier: String,
        snapshot: Arc<MonitoringSnapshot>,
    },
    /// A tier failed to fetch one or more endpoints
    Failed { tier: String, message: String },
    /// The service moved between lifecycle states
    StateChanged { from: ServiceState, to: ServiceState },
}

impl PollEvent {
    /// Snapshot carried by an `Updated` event
    pub fn snapshot(&self) -> Option<&Arc<MonitoringSnapshot>> {
        match self {
            PollEvent::Updated { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

/// Recomputes derived metrics from the merged endpoint data
pub trait SnapshotAnalyzer: Send + Sync {
    /// `fresh` lists the endpoint keys re-fetched by the merge being analyzed
    fn analyze(&self, data: &BTreeMap<String, Value>, fresh: &[String]) -> Value;
}

/// Analyzer that derives nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughAnalyzer;

impl SnapshotAnalyzer for PassthroughAnalyzer {
    fn analyze(&self, _data: &BTreeMap<String, Value>, _fresh: &[String]) -> Value {
        Value::Null
    }
}
