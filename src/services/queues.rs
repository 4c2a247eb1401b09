//! Agent task queue monitoring
//!
//! Queue depths every 10 s, worker pool every 30 s, throughput history
//! every minute.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::{items, summary};
use crate::analytics::health::round2;
use crate::analytics::{efficiency_rating, fields, Polarity, QueueHealthMonitor, TrendAnalyzer};
use crate::fetch::{EndpointRequest, Fetcher};
use crate::poller::{PollerConfig, PollingService, SnapshotAnalyzer, TierConfig};
use crate::Result;

/// Tasks per minute treated as full pace by the efficiency rating
const TARGET_TASKS_PER_MINUTE: f64 = 100.0;

/// Derived metrics for the task queue service
#[derive(Debug, Default)]
pub struct QueueAnalyzer {
    monitor: QueueHealthMonitor,
    trend: TrendAnalyzer,
}

fn worker_utilisation(workers: &[Value]) -> Value {
    let busy = workers
        .iter()
        .filter(|w| matches!(fields::text(w, "status"), "busy" | "processing"))
        .count();
    let idle = workers.iter().filter(|w| fields::text(w, "status") == "idle").count();
    let utilisation = if workers.is_empty() {
        0.0
    } else {
        round2(busy as f64 / workers.len() as f64 * 100.0)
    };
    json!({
        "total": workers.len(),
        "busy": busy,
        "idle": idle,
        "offline": workers.len() - busy - idle,
        "utilisation_percent": utilisation,
    })
}

impl SnapshotAnalyzer for QueueAnalyzer {
    fn analyze(&self, data: &BTreeMap<String, Value>, _fresh: &[String]) -> Value {
        let queues = items(data.get("queues"), "queues");
        let health = self.monitor.assess(queues);

        let workers = items(data.get("workers"), "workers");

        let history = items(data.get("throughput"), "history");
        let series = fields::numbers_in(history, "tasks_per_minute");
        let trend = self.trend.analyze(&series, Polarity::HigherIsBetter);
        let current = summary(data.get("throughput"))
            .and_then(|t| fields::first_number(t, &["current_per_minute", "tasks_per_minute"]))
            .or_else(|| series.last().copied())
            .unwrap_or(0.0);

        let completed: f64 = fields::numbers_in(queues, "completed_tasks").iter().sum();
        let efficiency = efficiency_rating(completed, health.total_failed, current, TARGET_TASKS_PER_MINUTE);

        json!({
            "queue_health": health,
            "workers": worker_utilisation(workers),
            "throughput": {
                "current_per_minute": current,
                "trend": trend,
            },
            "efficiency_rating": efficiency,
        })
    }
}

/// Agent task queue monitoring service
#[derive(Debug)]
pub struct AgentTaskQueueMonitoring {
    poller: PollingService,
}

impl AgentTaskQueueMonitoring {
    pub const NAME: &'static str = "agent_task_queue_monitoring";

    pub fn config(base_url: &str) -> PollerConfig {
        PollerConfig::new(Self::NAME)
            .with_base_url(base_url)
            .with_tier(
                TierConfig::new("queues", Duration::from_secs(10))
                    .endpoint("queues", EndpointRequest::resource("task-queues")),
            )
            .with_tier(
                TierConfig::new("workers", Duration::from_secs(30))
                    .endpoint("workers", EndpointRequest::resource("task-queues/workers")),
            )
            .with_tier(
                TierConfig::new("throughput", Duration::from_secs(60))
                    .endpoint("throughput", EndpointRequest::resource("task-queues/throughput")),
            )
    }

    pub fn connect(base_url: &str) -> Result<Self> {
        let poller = PollingService::connect(Self::config(base_url), Arc::new(QueueAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::with_config(Self::config("http://localhost:3000"), fetcher)
    }

    pub fn with_config(config: PollerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let poller = PollingService::new(config, fetcher, Arc::new(QueueAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn poller(&self) -> &PollingService {
        &self.poller
    }

    /// Full detail of one queue
    pub async fn queue_details(&self, queue: &str) -> Result<Value> {
        self.poller
            .fetch_cached(&EndpointRequest::item("task-queues", queue, None))
            .await
    }
}
