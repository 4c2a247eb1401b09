//! Agent performance monitoring
//!
//! Realtime agent metrics every 15 s, alerts every 30 s and system
//! metrics every minute.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::{items, summary};
use crate::analytics::{fields, HealthGrade, HealthScorer};
use crate::fetch::{EndpointRequest, Fetcher};
use crate::poller::{PollerConfig, PollingService, SnapshotAnalyzer, TierConfig};
use crate::Result;

/// Derived metrics for the monitoring service
#[derive(Debug, Default)]
pub struct MonitoringAnalyzer {
    scorer: HealthScorer,
}

impl MonitoringAnalyzer {
    fn system_load(&self, system: &Value) -> Value {
        let cpu = fields::first_number(system, &["cpu_usage_percent", "cpu_usage"]);
        let memory = fields::first_number(system, &["memory_usage_percent", "memory_usage"]);
        let saturated = cpu.map_or(false, |c| c >= 90.0) || memory.map_or(false, |m| m >= 90.0);
        json!({
            "cpu_usage_percent": cpu,
            "memory_usage_percent": memory,
            "saturated": saturated,
        })
    }
}

impl SnapshotAnalyzer for MonitoringAnalyzer {
    fn analyze(&self, data: &BTreeMap<String, Value>, _fresh: &[String]) -> Value {
        let agents = items(data.get("agents"), "agents");

        let mut degraded = Vec::new();
        let agent_health: Vec<Value> = agents
            .iter()
            .map(|agent| {
                let id = fields::first_text(agent, &["id", "agent_id"]);
                let report = self.scorer.score_value(agent);
                if report.grade <= HealthGrade::Fair {
                    degraded.push(id.to_string());
                }
                json!({"id": id, "score": report.score, "grade": report.grade})
            })
            .collect();

        let alerts = items(data.get("alerts"), "alerts");
        let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
        for alert in alerts {
            *by_severity
                .entry(fields::first_text(alert, &["severity", "level"]).to_string())
                .or_default() += 1;
        }
        let unacknowledged = alerts
            .iter()
            .filter(|a| !fields::lookup(a, "acknowledged").and_then(Value::as_bool).unwrap_or(false))
            .count();

        let system = summary(data.get("system")).cloned().unwrap_or(Value::Null);

        json!({
            "agent_health": agent_health,
            "degraded_agents": degraded,
            "alerts": {
                "total": alerts.len(),
                "unacknowledged": unacknowledged,
                "by_severity": by_severity,
            },
            "system_health": self.scorer.score_value(&system),
            "system_load": self.system_load(&system),
        })
    }
}

/// Agent performance monitoring service
#[derive(Debug)]
pub struct AgentPerformanceMonitoring {
    poller: PollingService,
}

impl AgentPerformanceMonitoring {
    pub const NAME: &'static str = "agent_performance_monitoring";

    pub fn config(base_url: &str) -> PollerConfig {
        PollerConfig::new(Self::NAME)
            .with_base_url(base_url)
            .with_tier(
                TierConfig::new("realtime", Duration::from_secs(15))
                    .endpoint("agents", EndpointRequest::resource("monitoring/agents")),
            )
            .with_tier(
                TierConfig::new("alerts", Duration::from_secs(30))
                    .endpoint("alerts", EndpointRequest::resource("monitoring/alerts")),
            )
            .with_tier(
                TierConfig::new("system", Duration::from_secs(60))
                    .endpoint("system", EndpointRequest::resource("monitoring/system")),
            )
    }

    pub fn connect(base_url: &str) -> Result<Self> {
        let poller = PollingService::connect(Self::config(base_url), Arc::new(MonitoringAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::with_config(Self::config("http://localhost:3000"), fetcher)
    }

    pub fn with_config(config: PollerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let poller = PollingService::new(config, fetcher, Arc::new(MonitoringAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn poller(&self) -> &PollingService {
        &self.poller
    }

    /// Live metrics of one agent
    pub async fn agent_metrics(&self, agent_id: &str) -> Result<Value> {
        self.poller
            .fetch_cached(&EndpointRequest::item("monitoring/agents", agent_id, None))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_tiers() {
        let config = AgentPerformanceMonitoring::config("http://monitor:3000");
        assert_eq!(config.tiers.len(), 3);
        assert_eq!(config.tier("alerts").unwrap().interval(), Duration::from_secs(30));
        assert_eq!(
            config.tier("system").unwrap().endpoints[0].request.path,
            "/api/enterprise/monitoring/system"
        );
    }

    #[test]
    fn test_degraded_agents_and_alerts() {
        let mut data = BTreeMap::new();
        data.insert(
            "agents".to_string(),
            json!([
                {"id": "fast", "success_rate_percent": 99, "average_response_time_ms": 250, "uptime_percent": 99.9},
                {"id": "slow", "success_rate_percent": 60, "average_response_time_ms": 9000, "uptime_percent": 70}
            ]),
        );
        data.insert(
            "alerts".to_string(),
            json!({"alerts": [
                {"severity": "critical", "acknowledged": false},
                {"severity": "warning", "acknowledged": true},
                {"severity": "critical"}
            ]}),
        );
        data.insert("system".to_string(), json!({"cpu_usage_percent": 95, "memory_usage_percent": 40}));

        let derived = MonitoringAnalyzer::default().analyze(&data, &[]);
        assert_eq!(derived["degraded_agents"], json!(["slow"]));
        assert_eq!(derived["alerts"]["total"], 3);
        assert_eq!(derived["alerts"]["unacknowledged"], 2);
        assert_eq!(derived["alerts"]["by_severity"]["critical"], 2);
        assert_eq!(derived["system_load"]["saturated"], true);
    }
}
