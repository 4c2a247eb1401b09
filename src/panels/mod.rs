//! Dashboard panel view models
//!
//! A panel owns its local UI state (filters, selection, sort or view mode)
//! and an immutable data set held in an `Arc`. `refresh` regenerates the
//! data set and swaps it in wholesale; UI state changes only recompute the
//! derived view from the data already held.

use std::sync::Arc;

use rand::RngCore;

mod calendar;
mod coordination;
mod load_balancing;
mod market;
mod messaging;
mod network;
mod pipeline;
mod projects;
mod scoreboard;

pub use calendar::{BusinessTimelineCalendar, CalendarView, CalendarViewMode, DaySummary};
pub use coordination::{AgentCoordinationControls, CoordinationView, CoordinatedAgent};
pub use load_balancing::{ApiLoadBalancing, LoadBalancingView, NodeShare};
pub use market::{MarketAnalysis, MarketSort, MarketView};
pub use messaging::{InterAgentCommunication, MessagingView};
pub use network::{AgentCommunicationNetwork, NetworkLayout, NetworkView};
pub use pipeline::{LeadPipeline, PipelineView};
pub use projects::{ProjectStatusTracking, ProjectSummary, ProjectView};
pub use scoreboard::{AgentPerformanceScoreboard, ScoreboardRow, ScoreboardSort, ScoreboardView};

/// Common surface of every panel
pub trait Panel {
    /// Derived, render-ready view
    type View;

    /// Heading shown above the panel
    const TITLE: &'static str;

    /// Regenerate the panel's data set
    fn refresh(&mut self, rng: &mut dyn RngCore);

    /// Current view, rebuilt from the held data and the local UI state
    fn view(&self) -> Arc<Self::View>;
}

pub(crate) use crate::mock::round1;

/// Mean of a sequence, `0.0` when empty
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(Vec::<f64>::new()), 0.0);
        assert_eq!(mean(vec![1.0, 2.0, 6.0]), 3.0);
    }
}
