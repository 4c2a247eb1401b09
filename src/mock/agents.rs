use rand::Rng;

use super::{minutes_ago, pick, round1, sequential_id};
use crate::model::{
    Agent, AgentStatus, AgentType, CommunicationEvent, Connection, ConnectionKind,
    CoordinationTask, MessageKind, MessagePriority, PerformanceMetric,
};

const AGENT_NAMES: &[&str] = &[
    "Atlas", "Beacon", "Cipher", "Delta", "Echo", "Forge", "Helix", "Ion", "Juno", "Kestrel",
    "Lumen", "Mira", "Nova", "Orion", "Pulse", "Quill", "Rune", "Sage", "Tern", "Vega",
];

const SUBJECTS: &[&str] = &[
    "Lead qualification result",
    "Quarterly forecast refresh",
    "Escalated support ticket",
    "Campaign performance digest",
    "Invoice reconciliation",
    "Inventory threshold reached",
    "Customer churn signal",
    "Contract renewal reminder",
];

const TASK_TITLES: &[&str] = &[
    "Enrich inbound leads",
    "Draft follow-up sequence",
    "Reconcile ledger entries",
    "Triage support backlog",
    "Refresh market snapshot",
    "Audit workflow triggers",
    "Summarize weekly KPIs",
];

/// Generate `count` agents with bounded operational figures
pub fn agents<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Agent> {
    (0..count)
        .map(|i| {
            let agent_type = pick(rng, AgentType::ALL);
            let name = format!(
                "{} {:?}",
                AGENT_NAMES[i % AGENT_NAMES.len()],
                agent_type
            );
            let tasks_completed = rng.gen_range(50..2_000);
            let tasks_failed = rng.gen_range(0..tasks_completed / 10 + 1);
            let success_rate =
                tasks_completed as f64 / (tasks_completed + tasks_failed) as f64 * 100.0;

            Agent {
                id: sequential_id("agent", i),
                name,
                agent_type,
                status: pick(rng, AgentStatus::ALL),
                tasks_completed,
                tasks_failed,
                success_rate_percent: round1(success_rate),
                average_response_time_ms: round1(rng.gen_range(120.0..4_500.0)),
                uptime_percent: round1(rng.gen_range(90.0..100.0)),
                cpu_usage_percent: round1(rng.gen_range(5.0..95.0)),
                memory_usage_percent: round1(rng.gen_range(10.0..90.0)),
                last_active: minutes_ago(rng, 120),
            }
        })
        .collect()
}

/// Generate `count` links between distinct agents
///
/// Returns an empty list when fewer than two agents are given.
pub fn connections<R: Rng + ?Sized>(rng: &mut R, agents: &[Agent], count: usize) -> Vec<Connection> {
    if agents.len() < 2 {
        return Vec::new();
    }

    (0..count)
        .map(|i| {
            let source = rng.gen_range(0..agents.len());
            let mut target = rng.gen_range(0..agents.len() - 1);
            if target >= source {
                target += 1;
            }

            Connection {
                id: sequential_id("link", i),
                source: agents[source].id.clone(),
                target: agents[target].id.clone(),
                kind: pick(rng, ConnectionKind::ALL),
                strength: (rng.gen_range(0.05..1.0_f64) * 100.0).round() / 100.0,
                messages_per_minute: round1(rng.gen_range(0.5..120.0)),
                latency_ms: round1(rng.gen_range(2.0..350.0)),
            }
        })
        .collect()
}

/// Generate `count` messages between agents, newest first
pub fn communication_events<R: Rng + ?Sized>(
    rng: &mut R,
    agents: &[Agent],
    count: usize,
) -> Vec<CommunicationEvent> {
    if agents.len() < 2 {
        return Vec::new();
    }

    let mut events: Vec<CommunicationEvent> = (0..count)
        .map(|i| {
            let from = rng.gen_range(0..agents.len());
            let mut to = rng.gen_range(0..agents.len() - 1);
            if to >= from {
                to += 1;
            }

            CommunicationEvent {
                id: sequential_id("msg", i),
                from_agent: agents[from].id.clone(),
                to_agent: agents[to].id.clone(),
                kind: pick(rng, MessageKind::ALL),
                priority: pick(rng, MessagePriority::ALL),
                subject: pick(rng, SUBJECTS).to_string(),
                payload_bytes: rng.gen_range(128..64_000),
                delivered: rng.gen_bool(0.95),
                timestamp: minutes_ago(rng, 60),
            }
        })
        .collect();

    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

/// Sample one performance metric row per agent
pub fn performance_metrics<R: Rng + ?Sized>(rng: &mut R, agents: &[Agent]) -> Vec<PerformanceMetric> {
    agents
        .iter()
        .map(|agent| PerformanceMetric {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            success_rate_percent: agent.success_rate_percent,
            average_execution_time_ms: agent.average_response_time_ms,
            tasks_per_hour: round1(rng.gen_range(2.0..60.0)),
            customer_satisfaction: round1(rng.gen_range(3.0..5.0)),
            revenue_generated: (rng.gen_range(1_000.0..250_000.0_f64)).round(),
            error_rate_percent: round1(100.0 - agent.success_rate_percent),
        })
        .collect()
}

/// Generate `count` coordination tasks, some left unassigned
pub fn coordination_tasks<R: Rng + ?Sized>(
    rng: &mut R,
    agents: &[Agent],
    count: usize,
) -> Vec<CoordinationTask> {
    (0..count)
        .map(|i| {
            let assigned_agent = if agents.is_empty() || rng.gen_bool(0.2) {
                None
            } else {
                Some(agents[rng.gen_range(0..agents.len())].id.clone())
            };
            let progress = if assigned_agent.is_some() {
                round1(rng.gen_range(0.0..100.0))
            } else {
                0.0
            };

            CoordinationTask {
                id: sequential_id("task", i),
                title: pick(rng, TASK_TITLES).to_string(),
                assigned_agent,
                priority: pick(rng, MessagePriority::ALL),
                progress_percent: progress,
                created_at: minutes_ago(rng, 24 * 60),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_agents_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let fleet = agents(&mut rng, 30);

        assert_eq!(fleet.len(), 30);
        for agent in &fleet {
            assert!((0.0..=100.0).contains(&agent.success_rate_percent));
            assert!((90.0..=100.0).contains(&agent.uptime_percent));
            assert!(agent.tasks_failed <= agent.tasks_completed);
        }
        assert_eq!(fleet[0].id, "agent-001");
    }

    #[test]
    fn test_connections_never_self_loop() {
        let mut rng = StdRng::seed_from_u64(1);
        let fleet = agents(&mut rng, 4);
        let links = connections(&mut rng, &fleet, 50);

        assert_eq!(links.len(), 50);
        assert!(links.iter().all(|l| l.source != l.target));
        assert!(links.iter().all(|l| (0.0..=1.0).contains(&l.strength)));
    }

    #[test]
    fn test_connections_need_two_agents() {
        let mut rng = StdRng::seed_from_u64(1);
        let fleet = agents(&mut rng, 1);
        assert!(connections(&mut rng, &fleet, 10).is_empty());
        assert!(communication_events(&mut rng, &fleet, 10).is_empty());
    }

    #[test]
    fn test_events_sorted_newest_first() {
        let mut rng = StdRng::seed_from_u64(9);
        let fleet = agents(&mut rng, 6);
        let events = communication_events(&mut rng, &fleet, 25);

        assert!(events.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_unassigned_tasks_have_no_progress() {
        let mut rng = StdRng::seed_from_u64(3);
        let fleet = agents(&mut rng, 5);
        let tasks = coordination_tasks(&mut rng, &fleet, 40);

        for task in tasks.iter().filter(|t| t.assigned_agent.is_none()) {
            assert_eq!(task.progress_percent, 0.0);
        }
    }
}
