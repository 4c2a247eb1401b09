use std::sync::Arc;

use rand::RngCore;
use serde::Serialize;

use super::Panel;
use crate::mock;
use crate::model::{Lead, LeadStage, PipelineStage};

const LEAD_COUNT: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineView {
    pub stages: Vec<PipelineStage>,
    /// Leads in the selected stage, or every lead, by value descending
    pub leads: Vec<Lead>,
    pub selected_stage: Option<LeadStage>,
    pub open_pipeline_value: f64,
    pub weighted_forecast: f64,
    pub won_value: f64,
    /// Won share of closed leads, `0.0` when nothing has closed
    pub win_rate_percent: f64,
}

/// Lead pipeline panel
#[derive(Debug, Default)]
pub struct LeadPipeline {
    leads: Arc<Vec<Lead>>,
    selected_stage: Option<LeadStage>,
    min_value: f64,
}

impl LeadPipeline {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn select_stage(&mut self, stage: Option<LeadStage>) {
        self.selected_stage = stage;
    }

    /// Hide leads worth less than `min_value` from the lead list
    pub fn filter_min_value(&mut self, min_value: f64) {
        self.min_value = min_value.max(0.0);
    }
}

impl Panel for LeadPipeline {
    type View = PipelineView;
    const TITLE: &'static str = "Lead Pipeline";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        self.leads = Arc::new(mock::leads(rng, LEAD_COUNT));
    }

    fn view(&self) -> Arc<PipelineView> {
        let stages = mock::pipeline_stages(&self.leads);

        let mut leads: Vec<Lead> = self
            .leads
            .iter()
            .filter(|l| self.selected_stage.map_or(true, |s| l.stage == s))
            .filter(|l| l.value >= self.min_value)
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.value.total_cmp(&a.value));

        let open = stages.iter().filter(|s| !s.stage.is_closed());
        let open_pipeline_value: f64 = open.clone().map(|s| s.total_value).sum();
        let weighted_forecast: f64 = open.map(|s| s.weighted_value).sum();

        let count_of = |stage: LeadStage| {
            stages
                .iter()
                .find(|s| s.stage == stage)
                .map(|s| s.lead_count)
                .unwrap_or(0)
        };
        let won = count_of(LeadStage::ClosedWon);
        let lost = count_of(LeadStage::ClosedLost);

        Arc::new(PipelineView {
            won_value: stages
                .iter()
                .filter(|s| s.stage == LeadStage::ClosedWon)
                .map(|s| s.total_value)
                .sum(),
            win_rate_percent: if won + lost == 0 {
                0.0
            } else {
                super::round1(won as f64 / (won + lost) as f64 * 100.0)
            },
            selected_stage: self.selected_stage,
            open_pipeline_value,
            weighted_forecast,
            leads,
            stages,
        })
    }
}
