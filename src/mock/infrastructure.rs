use rand::Rng;

use super::{minutes_ago, pick, round1, sequential_id};
use crate::model::{ApiNode, NodeHealth, Trigger, TriggerKind, TriggerStatus};

const REGIONS: &[&str] = &["us-east-1", "us-west-2", "eu-west-1", "eu-central-1", "ap-southeast-1"];

const TRIGGER_NAMES: &[&str] = &[
    "New lead intake",
    "Nightly revenue rollup",
    "Churn risk escalation",
    "Invoice overdue reminder",
    "Inventory restock",
    "Support SLA breach",
    "Campaign budget guard",
];

const ACTIONS: &[&str] = &[
    "assign_sales_agent",
    "generate_report",
    "notify_account_manager",
    "send_reminder",
    "create_purchase_order",
    "page_on_call",
    "pause_campaign",
];

/// Generate `count` load-balanced API nodes
///
/// Health follows the sampled error rate and CPU load so the panel's
/// health badges stay consistent with the numbers next to them.
pub fn api_nodes<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<ApiNode> {
    (0..count)
        .map(|i| {
            let error_rate = round1(rng.gen_range(0.0..8.0));
            let cpu = round1(rng.gen_range(10.0..98.0));
            let health = if error_rate >= 5.0 || cpu >= 92.0 {
                NodeHealth::Unhealthy
            } else if error_rate >= 2.0 || cpu >= 80.0 {
                NodeHealth::Degraded
            } else {
                NodeHealth::Healthy
            };

            ApiNode {
                id: sequential_id("node", i),
                region: REGIONS[i % REGIONS.len()].to_string(),
                health,
                weight: rng.gen_range(1..=10),
                active_connections: rng.gen_range(0..1_500),
                requests_per_second: round1(rng.gen_range(5.0..2_500.0)),
                average_response_time_ms: round1(rng.gen_range(8.0..900.0)),
                error_rate_percent: error_rate,
                cpu_usage_percent: cpu,
            }
        })
        .collect()
}

/// Generate `count` workflow triggers
pub fn triggers<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Trigger> {
    (0..count)
        .map(|i| {
            let kind = pick(rng, TriggerKind::ALL);
            let status = pick(rng, TriggerStatus::ALL);
            let executions = if status == TriggerStatus::Disabled {
                0
            } else {
                rng.gen_range(0..5_000)
            };
            let failure_ceiling = if status == TriggerStatus::Failed { 0.5 } else { 0.08 };
            let failures = (executions as f64 * rng.gen_range(0.0..failure_ceiling)) as u32;
            let condition = match kind {
                TriggerKind::Schedule => format!("cron(0 {} * * *)", rng.gen_range(0..24)),
                TriggerKind::Webhook => format!("POST /hooks/{}", sequential_id("hook", i)),
                TriggerKind::Event => "crm.lead.created".to_string(),
                TriggerKind::Threshold => format!("queue_depth > {}", rng.gen_range(50..500)),
                TriggerKind::Manual => "operator".to_string(),
            };

            Trigger {
                id: sequential_id("trigger", i),
                name: TRIGGER_NAMES[i % TRIGGER_NAMES.len()].to_string(),
                kind,
                status,
                condition,
                action: pick(rng, ACTIONS).to_string(),
                executions,
                failures,
                last_fired: (executions > 0).then(|| minutes_ago(rng, 7 * 24 * 60)),
            }
        })
        .collect()
}
