//! Dashboard data contracts
//!
//! Plain value records shared by the mock generators, the panels and the
//! REST payloads. None of them enforce invariants beyond their shape, and
//! identifiers are only unique within a single generated batch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Declares a closed set of snake_case variants with an `ALL` table.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every declared variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }
    };
}

closed_enum!(
    /// Operational status of an agent
    AgentStatus { Active, Idle, Busy, Maintenance, Offline }
);

closed_enum!(
    /// Business function an agent serves
    AgentType { Sales, Marketing, Support, Analytics, Operations, Finance }
);

closed_enum!(
    /// Kind of link between two agents
    ConnectionKind { DataSync, TaskHandoff, Escalation, Broadcast }
);

closed_enum!(
    /// Kind of inter-agent message
    MessageKind { Request, Response, Notification, Handoff, Alert }
);

closed_enum!(
    /// Delivery priority of a message
    MessagePriority { Low, Normal, High, Critical }
);

closed_enum!(
    /// Sales pipeline stage of a lead
    LeadStage { Prospect, Qualified, Proposal, Negotiation, ClosedWon, ClosedLost }
);

closed_enum!(
    /// Delivery status of a project
    ProjectStatus { Planning, InProgress, AtRisk, Completed, OnHold }
);

closed_enum!(
    /// Status of a project milestone
    MilestoneStatus { Pending, InProgress, Completed, Overdue }
);

closed_enum!(
    /// Status of a workflow trigger
    TriggerStatus { Active, Paused, Failed, Disabled }
);

closed_enum!(
    /// What fires a workflow trigger
    TriggerKind { Schedule, Webhook, Event, Threshold, Manual }
);

closed_enum!(
    /// Health of a load-balanced API node
    NodeHealth { Healthy, Degraded, Unhealthy }
);

closed_enum!(
    /// Load balancing strategy
    BalancingStrategy { RoundRobin, LeastConnections, Weighted, ResponseTime }
);

closed_enum!(
    /// Direction of a market or metric trend
    TrendDirection { Up, Down, Stable }
);

closed_enum!(
    /// Kind of business calendar entry
    CalendarEventKind { Meeting, Deadline, Milestone, Review, Launch }
);

closed_enum!(
    /// How an agent is currently being coordinated
    CoordinationMode { Autonomous, Supervised, Collaborative, Paused }
);

impl LeadStage {
    /// Whether the lead has left the pipeline
    pub fn is_closed(self) -> bool {
        matches!(self, LeadStage::ClosedWon | LeadStage::ClosedLost)
    }
}

/// An AI agent in the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub tasks_completed: u32,
    pub tasks_failed: u32,
    pub success_rate_percent: f64,
    pub average_response_time_ms: f64,
    pub uptime_percent: f64,
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub last_active: DateTime<Utc>,
}

/// A directed link between two agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: ConnectionKind,
    /// Link strength in `0.0..=1.0`
    pub strength: f64,
    pub messages_per_minute: f64,
    pub latency_ms: f64,
}

/// A single message exchanged between agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationEvent {
    pub id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub kind: MessageKind,
    pub priority: MessagePriority,
    pub subject: String,
    pub payload_bytes: u32,
    pub delivered: bool,
    pub timestamp: DateTime<Utc>,
}

/// A sampled performance metric for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub agent_id: String,
    pub agent_name: String,
    pub success_rate_percent: f64,
    pub average_execution_time_ms: f64,
    pub tasks_per_hour: f64,
    pub customer_satisfaction: f64,
    pub revenue_generated: f64,
    pub error_rate_percent: f64,
}

/// Work item routed through the coordination panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationTask {
    pub id: String,
    pub title: String,
    pub assigned_agent: Option<String>,
    pub priority: MessagePriority,
    pub progress_percent: f64,
    pub created_at: DateTime<Utc>,
}

/// A backend node behind the API load balancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiNode {
    pub id: String,
    pub region: String,
    pub health: NodeHealth,
    pub weight: u32,
    pub active_connections: u32,
    pub requests_per_second: f64,
    pub average_response_time_ms: f64,
    pub error_rate_percent: f64,
    pub cpu_usage_percent: f64,
}

/// An entry on the business timeline calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub kind: CalendarEventKind,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub owner: String,
    pub completed: bool,
}

/// A sales lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub company: String,
    pub contact: String,
    pub stage: LeadStage,
    pub value: f64,
    /// Win probability in `0..=100`
    pub probability_percent: f64,
    pub source: String,
    pub assigned_agent: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate of the leads sitting in one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub stage: LeadStage,
    pub lead_count: usize,
    pub total_value: f64,
    pub weighted_value: f64,
    /// Share of leads that reached this stage or a later one
    pub conversion_rate_percent: f64,
}

/// A market segment trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
    pub id: String,
    pub segment: String,
    pub direction: TrendDirection,
    pub change_percent: f64,
    pub market_share_percent: f64,
    pub confidence_percent: f64,
    pub competitors: Vec<String>,
}

/// A project milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
}

/// A tracked project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub progress_percent: f64,
    pub budget: f64,
    pub spent: f64,
    pub owner: String,
    pub team_size: u32,
    pub milestones: Vec<Milestone>,
}

/// A workflow trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    pub name: String,
    pub kind: TriggerKind,
    pub status: TriggerStatus,
    pub condition: String,
    pub action: String,
    pub executions: u32,
    pub failures: u32,
    pub last_fired: Option<DateTime<Utc>>,
}

impl Trigger {
    /// Share of executions that did not fail, `100.0` when never fired
    pub fn success_rate_percent(&self) -> f64 {
        if self.executions == 0 {
            return 100.0;
        }
        let ok = self.executions.saturating_sub(self.failures) as f64;
        ok / self.executions as f64 * 100.0
    }
}
