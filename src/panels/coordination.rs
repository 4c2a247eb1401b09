use std::collections::HashMap;
use std::sync::Arc;

use rand::RngCore;
use serde::Serialize;

use super::Panel;
use crate::mock;
use crate::model::{Agent, AgentStatus, CoordinationMode, CoordinationTask};

const AGENT_COUNT: usize = 8;
const TASK_COUNT: usize = 15;

#[derive(Debug, Default)]
struct CoordinationData {
    agents: Vec<Agent>,
    tasks: Vec<CoordinationTask>,
}

/// One agent row with its coordination mode and workload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatedAgent {
    pub agent: Agent,
    pub mode: CoordinationMode,
    pub assigned_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinationView {
    pub agents: Vec<CoordinatedAgent>,
    pub tasks: Vec<CoordinationTask>,
    pub unassigned_tasks: usize,
    pub paused_agents: usize,
}

/// Agent coordination controls panel
///
/// Modes and task assignments are operator edits held on top of the
/// generated data set; a refresh discards them.
#[derive(Debug, Default)]
pub struct AgentCoordinationControls {
    data: Arc<CoordinationData>,
    modes: HashMap<String, CoordinationMode>,
    assignments: HashMap<String, Option<String>>,
    status_filter: Option<AgentStatus>,
}

impl AgentCoordinationControls {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn filter_status(&mut self, status: Option<AgentStatus>) {
        self.status_filter = status;
    }

    /// Set one agent's mode; returns false for an unknown agent
    pub fn set_mode(&mut self, agent_id: &str, mode: CoordinationMode) -> bool {
        if !self.data.agents.iter().any(|a| a.id == agent_id) {
            return false;
        }
        self.modes.insert(agent_id.to_string(), mode);
        true
    }

    /// Pause every agent
    pub fn pause_all(&mut self) {
        for agent in &self.data.agents {
            self.modes.insert(agent.id.clone(), CoordinationMode::Paused);
        }
    }

    /// Assign a task to an agent, or unassign it with `None`
    pub fn assign_task(&mut self, task_id: &str, agent_id: Option<&str>) -> bool {
        let task_known = self.data.tasks.iter().any(|t| t.id == task_id);
        let agent_known = agent_id.map_or(true, |id| self.data.agents.iter().any(|a| a.id == id));
        if !task_known || !agent_known {
            return false;
        }
        self.assignments
            .insert(task_id.to_string(), agent_id.map(str::to_string));
        true
    }

    fn mode_of(&self, agent: &Agent) -> CoordinationMode {
        self.modes.get(&agent.id).copied().unwrap_or(match agent.status {
            AgentStatus::Maintenance | AgentStatus::Offline => CoordinationMode::Paused,
            _ => CoordinationMode::Autonomous,
        })
    }
}

impl Panel for AgentCoordinationControls {
    type View = CoordinationView;
    const TITLE: &'static str = "Agent Coordination Controls";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        let agents = mock::agents(rng, AGENT_COUNT);
        let tasks = mock::coordination_tasks(rng, &agents, TASK_COUNT);
        self.data = Arc::new(CoordinationData { agents, tasks });
        self.modes.clear();
        self.assignments.clear();
    }

    fn view(&self) -> Arc<CoordinationView> {
        let tasks: Vec<CoordinationTask> = self
            .data
            .tasks
            .iter()
            .map(|task| match self.assignments.get(&task.id) {
                Some(assigned) => {
                    let mut task = task.clone();
                    if assigned.is_none() {
                        task.progress_percent = 0.0;
                    }
                    task.assigned_agent = assigned.clone();
                    task
                }
                None => task.clone(),
            })
            .collect();

        let agents: Vec<CoordinatedAgent> = self
            .data
            .agents
            .iter()
            .filter(|a| self.status_filter.map_or(true, |s| a.status == s))
            .map(|agent| CoordinatedAgent {
                mode: self.mode_of(agent),
                assigned_tasks: tasks
                    .iter()
                    .filter(|t| t.assigned_agent.as_deref() == Some(agent.id.as_str()))
                    .count(),
                agent: agent.clone(),
            })
            .collect();

        Arc::new(CoordinationView {
            unassigned_tasks: tasks.iter().filter(|t| t.assigned_agent.is_none()).count(),
            paused_agents: self
                .data
                .agents
                .iter()
                .filter(|a| self.mode_of(a) == CoordinationMode::Paused)
                .count(),
            agents,
            tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pause_all() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut panel = AgentCoordinationControls::new(&mut rng);
        panel.pause_all();
        let view = panel.view();
        assert_eq!(view.paused_agents, AGENT_COUNT);
        assert!(view.agents.iter().all(|a| a.mode == CoordinationMode::Paused));

        panel.refresh(&mut rng);
        assert!(panel.modes.is_empty());
        for row in &panel.view().agents {
            let expected = matches!(row.agent.status, AgentStatus::Maintenance | AgentStatus::Offline);
            assert_eq!(row.mode == CoordinationMode::Paused, expected);
        }
    }

    #[test]
    fn test_assignment_edits() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut panel = AgentCoordinationControls::new(&mut rng);

        assert!(panel.assign_task("task-001", Some("agent-002")));
        assert!(!panel.assign_task("task-999", Some("agent-002")));
        assert!(!panel.assign_task("task-001", Some("agent-999")));
        assert!(!panel.set_mode("agent-999", CoordinationMode::Supervised));

        let view = panel.view();
        assert_eq!(view.tasks[0].assigned_agent.as_deref(), Some("agent-002"));
        let agent = view.agents.iter().find(|a| a.agent.id == "agent-002").unwrap();
        assert!(agent.assigned_tasks >= 1);

        assert!(panel.assign_task("task-001", None));
        let view = panel.view();
        assert!(view.tasks[0].assigned_agent.is_none());
        assert_eq!(view.tasks[0].progress_percent, 0.0);
    }
}
