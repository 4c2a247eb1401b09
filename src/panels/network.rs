use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{mean, round1, Panel};
use crate::mock;
use crate::model::{Agent, AgentStatus, Connection, ConnectionKind};

const AGENT_COUNT: usize = 12;
const CONNECTION_COUNT: usize = 24;

/// Graph layout the network is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkLayout {
    #[default]
    Force,
    Circular,
    Hierarchical,
}

#[derive(Debug, Default)]
struct NetworkData {
    agents: Vec<Agent>,
    connections: Vec<Connection>,
}

/// Render-ready network graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    pub layout: NetworkLayout,
    pub agents: Vec<Agent>,
    /// Connections passing the kind filter
    pub connections: Vec<Connection>,
    /// Connections touching the selected agent
    pub highlighted: Vec<String>,
    pub active_agents: usize,
    pub total_messages_per_minute: f64,
    pub average_latency_ms: f64,
}

/// Agent communication network panel
#[derive(Debug, Default)]
pub struct AgentCommunicationNetwork {
    data: Arc<NetworkData>,
    kind_filter: Option<ConnectionKind>,
    selected_agent: Option<String>,
    layout: NetworkLayout,
}

impl AgentCommunicationNetwork {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn filter_kind(&mut self, kind: Option<ConnectionKind>) {
        self.kind_filter = kind;
    }

    /// Select an agent; selecting an unknown ID clears the selection
    pub fn select_agent(&mut self, agent_id: Option<&str>) {
        self.selected_agent = agent_id
            .filter(|id| self.data.agents.iter().any(|a| a.id == *id))
            .map(str::to_string);
    }

    pub fn selected_agent(&self) -> Option<&str> {
        self.selected_agent.as_deref()
    }

    pub fn set_layout(&mut self, layout: NetworkLayout) {
        self.layout = layout;
    }
}

impl Panel for AgentCommunicationNetwork {
    type View = NetworkView;
    const TITLE: &'static str = "Agent Communication Network";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        let agents = mock::agents(rng, AGENT_COUNT);
        let connections = mock::connections(rng, &agents, CONNECTION_COUNT);
        self.data = Arc::new(NetworkData { agents, connections });
        // IDs are not stable across refreshes
        self.selected_agent = None;
    }

    fn view(&self) -> Arc<NetworkView> {
        let connections: Vec<Connection> = self
            .data
            .connections
            .iter()
            .filter(|c| self.kind_filter.map_or(true, |k| c.kind == k))
            .cloned()
            .collect();

        let highlighted = match &self.selected_agent {
            Some(id) => connections
                .iter()
                .filter(|c| &c.source == id || &c.target == id)
                .map(|c| c.id.clone())
                .collect(),
            None => Vec::new(),
        };

        Arc::new(NetworkView {
            layout: self.layout,
            agents: self.data.agents.clone(),
            highlighted,
            active_agents: self
                .data
                .agents
                .iter()
                .filter(|a| matches!(a.status, AgentStatus::Active | AgentStatus::Busy))
                .count(),
            total_messages_per_minute: round1(connections.iter().map(|c| c.messages_per_minute).sum()),
            average_latency_ms: round1(mean(connections.iter().map(|c| c.latency_ms))),
            connections,
        })
    }
}
