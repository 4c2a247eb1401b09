use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use serde::Serialize;

use super::{mean, round1, Panel};
use crate::mock;
use crate::model::{Milestone, MilestoneStatus, Project, ProjectStatus};

const PROJECT_COUNT: usize = 8;

/// One project row with its derived figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project: Project,
    /// Spent share of budget in percent
    pub budget_used_percent: f64,
    pub over_budget: bool,
    pub overdue_milestones: usize,
    /// Earliest milestone not yet completed
    pub next_milestone: Option<Milestone>,
}

impl ProjectSummary {
    fn new(project: &Project) -> Self {
        let budget_used_percent = if project.budget > 0.0 {
            round1(project.spent / project.budget * 100.0)
        } else {
            0.0
        };
        let next_milestone = project
            .milestones
            .iter()
            .filter(|m| m.status != MilestoneStatus::Completed)
            .min_by_key(|m| m.due_date)
            .cloned();

        Self {
            budget_used_percent,
            over_budget: project.spent > project.budget,
            overdue_milestones: project
                .milestones
                .iter()
                .filter(|m| m.status == MilestoneStatus::Overdue)
                .count(),
            next_milestone,
            project: project.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectView {
    pub projects: Vec<ProjectSummary>,
    pub selected: Option<ProjectSummary>,
    pub average_progress_percent: f64,
    pub at_risk: usize,
    /// Milestones due within the next 14 days across visible projects
    pub due_soon: usize,
}

/// Project status tracking panel
#[derive(Debug, Default)]
pub struct ProjectStatusTracking {
    projects: Arc<Vec<Project>>,
    status_filter: Option<ProjectStatus>,
    selected: Option<String>,
}

impl ProjectStatusTracking {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn filter_status(&mut self, status: Option<ProjectStatus>) {
        self.status_filter = status;
    }

    pub fn select(&mut self, project_id: Option<&str>) {
        self.selected = project_id.map(str::to_string);
    }
}

impl Panel for ProjectStatusTracking {
    type View = ProjectView;
    const TITLE: &'static str = "Project Status Tracking";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        self.projects = Arc::new(mock::projects(rng, PROJECT_COUNT));
        self.selected = None;
    }

    fn view(&self) -> Arc<ProjectView> {
        let projects: Vec<ProjectSummary> = self
            .projects
            .iter()
            .filter(|p| self.status_filter.map_or(true, |s| p.status == s))
            .map(ProjectSummary::new)
            .collect();

        let today = Utc::now().date_naive();
        let horizon = today + chrono::Duration::days(14);
        let due_soon = projects
            .iter()
            .flat_map(|p| &p.project.milestones)
            .filter(|m| m.status != MilestoneStatus::Completed && m.due_date >= today && m.due_date <= horizon)
            .count();

        let selected = self
            .selected
            .as_ref()
            .and_then(|id| self.projects.iter().find(|p| &p.id == id))
            .map(ProjectSummary::new);

        Arc::new(ProjectView {
            average_progress_percent: round1(mean(projects.iter().map(|p| p.project.progress_percent))),
            at_risk: projects
                .iter()
                .filter(|p| p.project.status == ProjectStatus::AtRisk || p.over_budget)
                .count(),
            due_soon,
            selected,
            projects,
        })
    }
}
