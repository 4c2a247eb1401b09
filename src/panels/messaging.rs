use std::collections::BTreeMap;
use std::sync::Arc;

use rand::RngCore;
use serde::Serialize;

use super::{round1, Panel};
use crate::mock;
use crate::model::{Agent, CommunicationEvent, MessageKind, MessagePriority};

const AGENT_COUNT: usize = 10;
const MESSAGE_COUNT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagingView {
    /// Matching messages, newest first
    pub messages: Vec<CommunicationEvent>,
    pub by_kind: BTreeMap<String, usize>,
    pub delivery_rate_percent: f64,
    pub critical_undelivered: usize,
}

#[derive(Debug, Default)]
struct MessagingData {
    agents: Vec<Agent>,
    messages: Vec<CommunicationEvent>,
}

/// Inter-agent communication panel
#[derive(Debug, Default)]
pub struct InterAgentCommunication {
    data: Arc<MessagingData>,
    kind_filter: Option<MessageKind>,
    min_priority: Option<MessagePriority>,
    agent_filter: Option<String>,
    search: String,
}

fn priority_rank(priority: MessagePriority) -> usize {
    MessagePriority::ALL
        .iter()
        .position(|p| *p == priority)
        .unwrap_or_default()
}

fn kind_name(kind: MessageKind) -> String {
    format!("{:?}", kind).to_lowercase()
}

impl InterAgentCommunication {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn filter_kind(&mut self, kind: Option<MessageKind>) {
        self.kind_filter = kind;
    }

    /// Show only messages at or above `priority`
    pub fn filter_min_priority(&mut self, priority: Option<MessagePriority>) {
        self.min_priority = priority;
    }

    /// Show only messages sent or received by one agent
    pub fn filter_agent(&mut self, agent_id: Option<&str>) {
        self.agent_filter = agent_id.map(str::to_string);
    }

    /// Case-insensitive subject search; empty matches everything
    pub fn search(&mut self, text: &str) {
        self.search = text.trim().to_lowercase();
    }

    pub fn agents(&self) -> &[Agent] {
        &self.data.agents
    }

    fn matches(&self, message: &CommunicationEvent) -> bool {
        self.kind_filter.map_or(true, |k| message.kind == k)
            && self
                .min_priority
                .map_or(true, |p| priority_rank(message.priority) >= priority_rank(p))
            && self
                .agent_filter
                .as_ref()
                .map_or(true, |id| &message.from_agent == id || &message.to_agent == id)
            && (self.search.is_empty() || message.subject.to_lowercase().contains(&self.search))
    }
}

impl Panel for InterAgentCommunication {
    type View = MessagingView;
    const TITLE: &'static str = "Inter-Agent Communication";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        let agents = mock::agents(rng, AGENT_COUNT);
        let messages = mock::communication_events(rng, &agents, MESSAGE_COUNT);
        self.data = Arc::new(MessagingData { agents, messages });
    }

    fn view(&self) -> Arc<MessagingView> {
        let messages: Vec<CommunicationEvent> = self
            .data
            .messages
            .iter()
            .filter(|m| self.matches(m))
            .cloned()
            .collect();

        let mut by_kind = BTreeMap::new();
        for message in &messages {
            *by_kind.entry(kind_name(message.kind)).or_insert(0) += 1;
        }

        let delivered = messages.iter().filter(|m| m.delivered).count();
        Arc::new(MessagingView {
            by_kind,
            delivery_rate_percent: if messages.is_empty() {
                100.0
            } else {
                round1(delivered as f64 / messages.len() as f64 * 100.0)
            },
            critical_undelivered: messages
                .iter()
                .filter(|m| m.priority == MessagePriority::Critical && !m.delivered)
                .count(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_filters_compose() {
        let mut rng = StdRng::seed_from_u64(30);
        let mut panel = InterAgentCommunication::new(&mut rng);
        assert_eq!(panel.view().messages.len(), MESSAGE_COUNT);

        panel.filter_min_priority(Some(MessagePriority::High));
        panel.filter_agent(Some("agent-003"));
        let view = panel.view();
        for m in &view.messages {
            assert!(matches!(m.priority, MessagePriority::High | MessagePriority::Critical));
            assert!(m.from_agent == "agent-003" || m.to_agent == "agent-003");
        }
        assert!(view.messages.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut panel = InterAgentCommunication::new(&mut rng);
        panel.search("  INVOICE ");
        assert!(panel
            .view()
            .messages
            .iter()
            .all(|m| m.subject.to_lowercase().contains("invoice")));

        panel.search("no subject contains this");
        let view = panel.view();
        assert!(view.messages.is_empty());
        assert_eq!(view.delivery_rate_percent, 100.0);
    }
}
