//! Workflow trigger status tracking
//!
//! Trigger states every 15 s, recent executions every 30 s and aggregate
//! statistics every 5 min.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::{items, summary};
use crate::analytics::health::round2;
use crate::analytics::{fields, HealthInputs, HealthScorer};
use crate::fetch::{EndpointRequest, Fetcher};
use crate::model::TriggerStatus;
use crate::poller::{PollerConfig, PollingService, SnapshotAnalyzer, TierConfig};
use crate::Result;

/// Triggers succeeding less often than this are reported as failing
const FAILING_SUCCESS_RATE: f64 = 80.0;

/// Default page size for `trigger_history`
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Derived metrics for the trigger tracking service
#[derive(Debug, Default)]
pub struct TriggerAnalyzer {
    scorer: HealthScorer,
}

fn status_name(status: TriggerStatus) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn success_rate(executions: f64, failures: f64) -> f64 {
    if executions <= 0.0 {
        100.0
    } else {
        round2((executions - failures.min(executions)) / executions * 100.0)
    }
}

impl SnapshotAnalyzer for TriggerAnalyzer {
    fn analyze(&self, data: &BTreeMap<String, Value>, _fresh: &[String]) -> Value {
        let triggers = items(data.get("triggers"), "triggers");

        let mut by_status: BTreeMap<String, usize> = TriggerStatus::ALL
            .iter()
            .map(|s| (status_name(*s), 0))
            .collect();
        let mut failing = Vec::new();
        let mut total_executions = 0.0;
        let mut total_failures = 0.0;

        for trigger in triggers {
            let status = fields::text(trigger, "status");
            *by_status.entry(status.to_string()).or_default() += 1;

            let executions = fields::number_or(trigger, "executions", 0.0);
            let failures = fields::number_or(trigger, "failures", 0.0);
            total_executions += executions;
            total_failures += failures;

            if status == "failed" || success_rate(executions, failures) < FAILING_SUCCESS_RATE {
                failing.push(fields::first_text(trigger, &["id", "name"]).to_string());
            }
        }

        let executions = items(data.get("executions"), "executions");
        let recent_failed = executions
            .iter()
            .filter(|e| matches!(fields::text(e, "status"), "failed" | "error"))
            .count();
        let recent_success_rate = success_rate(executions.len() as f64, recent_failed as f64);

        let statistics = summary(data.get("statistics")).cloned().unwrap_or(Value::Null);
        let overall_success_rate = success_rate(total_executions, total_failures);
        let health = self.scorer.score(&HealthInputs {
            success_rate_percent: Some(overall_success_rate),
            average_execution_time_ms: fields::first_number(
                &statistics,
                &["average_execution_time_ms", "avg_execution_time_ms"],
            ),
            uptime_percent: None,
            error_rate_percent: Some(round2(100.0 - recent_success_rate)),
        });

        json!({
            "total": triggers.len(),
            "by_status": by_status,
            "success_rate_percent": overall_success_rate,
            "recent_success_rate_percent": recent_success_rate,
            "failing_triggers": failing,
            "health": health,
        })
    }
}

/// Workflow trigger status tracking service
#[derive(Debug)]
pub struct WorkflowTriggerTracking {
    poller: PollingService,
}

impl WorkflowTriggerTracking {
    pub const NAME: &'static str = "workflow_trigger_tracking";

    pub fn config(base_url: &str) -> PollerConfig {
        PollerConfig::new(Self::NAME)
            .with_base_url(base_url)
            .with_tier(
                TierConfig::new("triggers", Duration::from_secs(15))
                    .endpoint("triggers", EndpointRequest::resource("workflow-triggers")),
            )
            .with_tier(
                TierConfig::new("executions", Duration::from_secs(30))
                    .endpoint("executions", EndpointRequest::resource("workflow-triggers/executions")),
            )
            .with_tier(
                TierConfig::new("statistics", Duration::from_secs(5 * 60))
                    .endpoint("statistics", EndpointRequest::resource("workflow-triggers/statistics")),
            )
    }

    pub fn connect(base_url: &str) -> Result<Self> {
        let poller = PollingService::connect(Self::config(base_url), Arc::new(TriggerAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::with_config(Self::config("http://localhost:3000"), fetcher)
    }

    pub fn with_config(config: PollerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let poller = PollingService::new(config, fetcher, Arc::new(TriggerAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn poller(&self) -> &PollingService {
        &self.poller
    }

    /// Most recent executions of one trigger, newest first
    pub async fn trigger_history(&self, trigger_id: &str, limit: usize) -> Result<Value> {
        let request =
            EndpointRequest::item("workflow-triggers", trigger_id, Some("executions")).with_query("limit", limit);
        self.poller.fetch_cached(&request).await
    }
}
