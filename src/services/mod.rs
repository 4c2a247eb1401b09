//! Concrete monitoring services
//!
//! Each service is a [`PollingService`](crate::poller::PollingService)
//! configured with its own tiers and endpoints, plus an analyzer that
//! turns the merged payloads into derived metrics and a handful of
//! on-demand deep-dive reads served through the response cache.

use serde_json::Value;

use crate::analytics::fields;

pub mod performance;
pub mod monitoring;
pub mod queues;
pub mod triggers;

pub use monitoring::{AgentPerformanceMonitoring, MonitoringAnalyzer};
pub use performance::{AgentPerformanceAnalytics, PerformanceAnalyzer};
pub use queues::{AgentTaskQueueMonitoring, QueueAnalyzer};
pub use triggers::{TriggerAnalyzer, WorkflowTriggerTracking};

/// List stored under `field`, or the payload itself when it is already a list
pub(crate) fn items<'a>(payload: Option<&'a Value>, field: &str) -> &'a [Value] {
    match payload {
        Some(Value::Array(items)) => items.as_slice(),
        Some(value) => fields::array(value, field),
        None => &[],
    }
}

/// Nested summary object, or the payload itself when it has no summary
pub(crate) fn summary<'a>(payload: Option<&'a Value>) -> Option<&'a Value> {
    payload.map(|p| fields::lookup(p, "summary").unwrap_or(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_items_accepts_bare_and_wrapped_lists() {
        let bare = json!([{"id": 1}, {"id": 2}]);
        let wrapped = json!({"agents": [{"id": 1}]});
        assert_eq!(items(Some(&bare), "agents").len(), 2);
        assert_eq!(items(Some(&wrapped), "agents").len(), 1);
        assert!(items(Some(&wrapped), "queues").is_empty());
        assert!(items(None, "agents").is_empty());
    }

    #[test]
    fn test_summary_falls_back_to_payload() {
        let nested = json!({"summary": {"success_rate_percent": 97}});
        let flat = json!({"success_rate_percent": 91});
        assert_eq!(fields::number(summary(Some(&nested)).unwrap(), "success_rate_percent"), Some(97.0));
        assert_eq!(fields::number(summary(Some(&flat)).unwrap(), "success_rate_percent"), Some(91.0));
    }
}
