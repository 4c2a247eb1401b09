use std::cmp::Ordering;
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{mean, round1, Panel};
use crate::mock;
use crate::model::{AgentType, PerformanceMetric};

const AGENT_COUNT: usize = 10;

/// Column the scoreboard is ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreboardSort {
    #[default]
    SuccessRate,
    Revenue,
    TasksPerHour,
    Satisfaction,
    /// Fastest first
    ExecutionTime,
}

impl ScoreboardSort {
    fn compare(self, a: &PerformanceMetric, b: &PerformanceMetric) -> Ordering {
        let (x, y) = match self {
            ScoreboardSort::SuccessRate => (b.success_rate_percent, a.success_rate_percent),
            ScoreboardSort::Revenue => (b.revenue_generated, a.revenue_generated),
            ScoreboardSort::TasksPerHour => (b.tasks_per_hour, a.tasks_per_hour),
            ScoreboardSort::Satisfaction => (b.customer_satisfaction, a.customer_satisfaction),
            ScoreboardSort::ExecutionTime => (a.average_execution_time_ms, b.average_execution_time_ms),
        };
        x.total_cmp(&y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardRow {
    /// 1-based position under the current sort
    pub rank: usize,
    pub agent_type: AgentType,
    pub metric: PerformanceMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardView {
    pub sort: ScoreboardSort,
    pub rows: Vec<ScoreboardRow>,
    pub average_success_rate_percent: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Default)]
struct ScoreboardData {
    rows: Vec<(AgentType, PerformanceMetric)>,
}

/// Agent performance scoreboard panel
#[derive(Debug, Default)]
pub struct AgentPerformanceScoreboard {
    data: Arc<ScoreboardData>,
    sort: ScoreboardSort,
    type_filter: Option<AgentType>,
}

impl AgentPerformanceScoreboard {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn sort_by(&mut self, sort: ScoreboardSort) {
        self.sort = sort;
    }

    pub fn filter_type(&mut self, agent_type: Option<AgentType>) {
        self.type_filter = agent_type;
    }
}

impl Panel for AgentPerformanceScoreboard {
    type View = ScoreboardView;
    const TITLE: &'static str = "Agent Performance Scoreboard";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        let agents = mock::agents(rng, AGENT_COUNT);
        let metrics = mock::performance_metrics(rng, &agents);
        let rows = agents.iter().map(|a| a.agent_type).zip(metrics).collect();
        self.data = Arc::new(ScoreboardData { rows });
    }

    fn view(&self) -> Arc<ScoreboardView> {
        let mut visible: Vec<&(AgentType, PerformanceMetric)> = self
            .data
            .rows
            .iter()
            .filter(|(t, _)| self.type_filter.map_or(true, |f| *t == f))
            .collect();
        visible.sort_by(|(_, a), (_, b)| self.sort.compare(a, b));

        let rows: Vec<ScoreboardRow> = visible
            .into_iter()
            .enumerate()
            .map(|(i, (agent_type, metric))| ScoreboardRow {
                rank: i + 1,
                agent_type: *agent_type,
                metric: metric.clone(),
            })
            .collect();

        Arc::new(ScoreboardView {
            sort: self.sort,
            average_success_rate_percent: round1(mean(rows.iter().map(|r| r.metric.success_rate_percent))),
            total_revenue: rows.iter().map(|r| r.metric.revenue_generated).sum(),
            rows,
        })
    }
}
