//! # AgentOps Monitor
//!
//! Polling services, derived-metric engines and dashboard view models for
//! monitoring a fleet of enterprise AI agents.
//!
//! ## Overview
//!
//! A [`PollingService`](poller::PollingService) refreshes groups of REST
//! endpoints ("tiers") on their own intervals, caches responses for a fixed
//! TTL, recomputes derived metrics and notifies subscribers. Four concrete
//! services are provided in [`services`]; the nine dashboard panels in
//! [`panels`] run on mock data from [`mock`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agentops::events::UPDATE_EVENT;
//! use agentops::services::AgentTaskQueueMonitoring;
//!
//! # async fn example() -> agentops::Result<()> {
//! let monitor = AgentTaskQueueMonitoring::connect("http://localhost:3000")?;
//! monitor.poller().subscribe(UPDATE_EVENT, |event| {
//!     if let Some(snapshot) = event.snapshot() {
//!         println!("queue health: {}", snapshot.derived["queue_health"]["overall_score"]);
//!     }
//!     Ok(())
//! });
//!
//! monitor.poller().start().await?;
//! let details = monitor.queue_details("email-outreach").await?;
//! println!("{}", details);
//! monitor.poller().stop().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`model`]: record types shared by panels and generators
//! - [`mock`]: randomized record generators
//! - [`panels`]: the nine dashboard panel view models
//! - [`analytics`]: health, benchmark, queue, trend and change engines
//! - [`fetch`]: the `Fetcher` trait and its HTTP implementation
//! - [`cache`]: TTL response cache
//! - [`events`]: subscriber registry
//! - [`poller`]: the generic polling service
//! - [`services`]: the four concrete monitoring services
//! - [`view`]: watch-channel view-model store
//! - [`metrics`]: Prometheus metrics
//! - [`telemetry`]: tracing setup

#![warn(rustdoc::missing_crate_level_docs)]

use thiserror::Error;

/// Result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Fetching a resource failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] poller::ConfigError),

    /// A tier name that the service does not define
    #[error("Unknown tier: {0}")]
    UnknownTier(String),
}

/// Record types
pub mod model;

/// Mock data generators
pub mod mock;

/// Dashboard panel view models
pub mod panels;

/// Derived-metric engines
pub mod analytics;

/// REST transport
pub mod fetch;

/// Response cache
pub mod cache;

/// Subscriber registry
pub mod events;

/// Generic polling service
pub mod poller;

/// Concrete monitoring services
pub mod services;

/// View-model store
pub mod view;

/// Prometheus metrics
pub mod metrics;

/// Tracing initialisation
pub mod telemetry;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: MonitorError = poller::ConfigError::Invalid("no tiers".to_string()).into();
        assert_eq!(err.to_string(), "Configuration error: Invalid configuration: no tiers");

        let err: MonitorError = fetch::FetchError::Status {
            path: "/api/enterprise/task-queues".to_string(),
            status: 503,
        }
        .into();
        assert!(err.to_string().contains("HTTP 503"));

        let err = MonitorError::UnknownTier("hourly".to_string());
        assert_eq!(err.to_string(), "Unknown tier: hourly");
    }
}
