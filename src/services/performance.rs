//! Agent performance analytics
//!
//! Four tiers: a 15 s performance summary, a 60 s deep dive, a 5 min
//! fleet benchmark and a 10 min insight feed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::debug;

use super::{items, summary};
use crate::analytics::{
    efficiency_rating, fields, BenchmarkingEngine, ChangeDetector, ChangeSet, HealthReport, HealthScorer, Polarity,
    TrendAnalyzer,
};
use crate::fetch::{EndpointRequest, Fetcher};
use crate::poller::{PollerConfig, PollingService, SnapshotAnalyzer, TierConfig};
use crate::Result;

/// Success rate separating the fleet's above- and below-threshold agents
const SUCCESS_RATE_THRESHOLD: f64 = 90.0;

/// Tasks per hour treated as full pace by the efficiency rating
const TARGET_TASKS_PER_HOUR: f64 = 40.0;

/// Derived metrics for the performance analytics service
#[derive(Debug)]
pub struct PerformanceAnalyzer {
    scorer: HealthScorer,
    benchmark: BenchmarkingEngine,
    trend: TrendAnalyzer,
    changes: ChangeDetector,
    /// Changes from the last merge that re-fetched the summary
    last_changes: Mutex<ChangeSet>,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self {
            scorer: HealthScorer::default(),
            benchmark: BenchmarkingEngine::new("success_rate_percent", SUCCESS_RATE_THRESHOLD),
            trend: TrendAnalyzer::default(),
            changes: ChangeDetector::new(1.0),
            last_changes: Mutex::new(ChangeSet::default()),
        }
    }
}

impl SnapshotAnalyzer for PerformanceAnalyzer {
    fn analyze(&self, data: &BTreeMap<String, Value>, fresh: &[String]) -> Value {
        let performance = data.get("performance");
        let agents = items(performance, "agents");
        let overview = summary(performance).cloned().unwrap_or(Value::Null);

        let fleet = self.scorer.score_value(&overview);
        let agent_health: Vec<Value> = agents
            .iter()
            .map(|agent| {
                let report = self.scorer.score_value(agent);
                json!({
                    "id": fields::first_text(agent, &["id", "agent_id"]),
                    "score": report.score,
                    "grade": report.grade,
                })
            })
            .collect();

        let completed: f64 = fields::numbers_in(agents, "tasks_completed").iter().sum();
        let failed: f64 = fields::numbers_in(agents, "tasks_failed").iter().sum();
        let throughput = fields::first_number(&overview, &["tasks_per_hour", "throughput_per_hour"])
            .unwrap_or_else(|| fields::numbers_in(agents, "tasks_per_hour").iter().sum());
        let efficiency = efficiency_rating(completed, failed, throughput, TARGET_TASKS_PER_HOUR);

        let benchmark_source = match items(data.get("benchmarks"), "agents") {
            [] => agents,
            fleet_items => fleet_items,
        };
        let benchmark = self.benchmark.benchmark(benchmark_source);

        let history = items(data.get("deep_dive"), "history");
        let success_trend = self.trend.analyze(
            &fields::numbers_in(history, "success_rate_percent"),
            Polarity::HigherIsBetter,
        );
        let latency_trend = self.trend.analyze(
            &fields::numbers_in(history, "average_execution_time_ms"),
            Polarity::LowerIsBetter,
        );

        // Merges from other tiers keep the diff of the last two summary polls
        let changes = if fresh.iter().any(|key| key == "performance") {
            let changes = self.changes.detect(&overview);
            if !changes.is_empty() {
                debug!("performance summary changed in {} fields", changes.change_count());
            }
            *self.last_changes.lock() = changes.clone();
            changes
        } else {
            self.last_changes.lock().clone()
        };

        let insights = items(data.get("insights"), "insights");

        json!({
            "health": fleet,
            "agent_health": agent_health,
            "efficiency_rating": efficiency,
            "benchmark": benchmark,
            "success_rate_trend": success_trend,
            "latency_trend": latency_trend,
            "changes": changes,
            "insight_count": insights.len(),
        })
    }
}

/// Agent performance analytics service
#[derive(Debug)]
pub struct AgentPerformanceAnalytics {
    poller: PollingService,
}

impl AgentPerformanceAnalytics {
    pub const NAME: &'static str = "agent_performance_analytics";

    /// Default tiers against `base_url`
    pub fn config(base_url: &str) -> PollerConfig {
        PollerConfig::new(Self::NAME)
            .with_base_url(base_url)
            .with_tier(
                TierConfig::new("basic", Duration::from_secs(15))
                    .endpoint("performance", EndpointRequest::resource("agents/performance")),
            )
            .with_tier(
                TierConfig::new("deep", Duration::from_secs(60))
                    .endpoint("deep_dive", EndpointRequest::resource("agents/performance/deep-dive")),
            )
            .with_tier(
                TierConfig::new("benchmark", Duration::from_secs(5 * 60))
                    .endpoint("benchmarks", EndpointRequest::resource("agents/benchmarks")),
            )
            .with_tier(
                TierConfig::new("insight", Duration::from_secs(10 * 60))
                    .endpoint("insights", EndpointRequest::resource("agents/insights")),
            )
    }

    /// Poll `base_url` over HTTP
    pub fn connect(base_url: &str) -> Result<Self> {
        let poller = PollingService::connect(Self::config(base_url), Arc::new(PerformanceAnalyzer::default()))?;
        Ok(Self { poller })
    }

    /// Poll through a caller-supplied fetcher
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::with_config(Self::config("http://localhost:3000"), fetcher)
    }

    /// Poll with a custom config, e.g. different intervals or TTL
    pub fn with_config(config: PollerConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let poller = PollingService::new(config, fetcher, Arc::new(PerformanceAnalyzer::default()))?;
        Ok(Self { poller })
    }

    pub fn poller(&self) -> &PollingService {
        &self.poller
    }

    /// Detailed performance of one agent
    pub async fn agent_deep_dive(&self, agent_id: &str) -> Result<Value> {
        self.poller
            .fetch_cached(&EndpointRequest::item("agents", agent_id, Some("performance")))
            .await
    }

    /// Health score of one agent from its deep dive
    pub async fn agent_health(&self, agent_id: &str) -> Result<HealthReport> {
        let detail = self.agent_deep_dive(agent_id).await?;
        let overview = summary(Some(&detail)).unwrap_or(&detail);
        Ok(HealthScorer::default().score_value(overview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn fresh(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_changes_survive_merges_of_other_tiers() {
        let analyzer = PerformanceAnalyzer::default();
        let before = data(&[("performance", json!({"summary": {"success_rate_percent": 90}}))]);
        let after = data(&[("performance", json!({"summary": {"success_rate_percent": 70}}))]);

        analyzer.analyze(&before, &fresh(&["performance"]));
        let polled = analyzer.analyze(&after, &fresh(&["performance"]));
        assert_eq!(polled["changes"]["changed"][0]["delta"], -20.0);

        let merged = analyzer.analyze(&after, &fresh(&["deep_dive"]));
        assert_eq!(merged["changes"], polled["changes"]);

        let unchanged = analyzer.analyze(&after, &fresh(&["performance"]));
        assert_eq!(unchanged["changes"]["changed"], json!([]));
    }

    #[test]
    fn test_config_tiers() {
        let config = AgentPerformanceAnalytics::config("http://monitor:3000");
        let intervals: Vec<(String, u64)> = config
            .tiers
            .iter()
            .map(|t| (t.name.clone(), t.interval_ms))
            .collect();
        assert_eq!(
            intervals,
            vec![
                ("basic".to_string(), 15_000),
                ("deep".to_string(), 60_000),
                ("benchmark".to_string(), 300_000),
                ("insight".to_string(), 600_000),
            ]
        );
        assert_eq!(
            config.tiers[1].endpoints[0].request.path,
            "/api/enterprise/agents/performance/deep-dive"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analyze_empty_data() {
        let derived = PerformanceAnalyzer::default().analyze(&BTreeMap::new(), &[]);
        assert_eq!(derived["health"]["score"], 0.0);
        assert_eq!(derived["efficiency_rating"], 0.0);
        assert_eq!(derived["insight_count"], 0);
        assert_eq!(derived["success_rate_trend"]["direction"], "stable");
    }

    #[test]
    fn test_analyze_performance_payload() {
        let analyzer = PerformanceAnalyzer::default();
        let derived = analyzer.analyze(&data(&[
            (
                "performance",
                json!({
                    "summary": {"success_rate_percent": 96, "average_execution_time_ms": 400, "tasks_per_hour": 40},
                    "agents": [
                        {"id": "a1", "success_rate_percent": 98, "tasks_completed": 90, "tasks_failed": 10},
                        {"id": "a2", "success_rate_percent": 80, "tasks_completed": 90, "tasks_failed": 10}
                    ]
                }),
            ),
            (
                "deep_dive",
                json!({"history": [
                    {"success_rate_percent": 80}, {"success_rate_percent": 82},
                    {"success_rate_percent": 95}, {"success_rate_percent": 97}
                ]}),
            ),
        ]), &fresh(&["performance", "deep_dive"]));

        assert_eq!(derived["health"]["grade"], "excellent");
        assert_eq!(derived["efficiency_rating"], 90.0);
        assert_eq!(derived["benchmark"]["above_threshold"], json!(["a1"]));
        assert_eq!(derived["benchmark"]["below_threshold"], json!(["a2"]));
        assert_eq!(derived["success_rate_trend"]["outlook"], "improving");
        assert_eq!(derived["agent_health"].as_array().unwrap().len(), 2);
    }
}
