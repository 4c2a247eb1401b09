use std::collections::BTreeMap;
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{mean, round1, Panel};
use crate::mock;
use crate::model::{MarketTrend, TrendDirection};

const SEGMENT_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSort {
    /// Largest movement first, either direction
    #[default]
    Change,
    MarketShare,
    Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketView {
    pub trends: Vec<MarketTrend>,
    pub sort: MarketSort,
    pub growing_segments: usize,
    pub declining_segments: usize,
    pub average_confidence_percent: f64,
    /// How many segments each competitor appears in
    pub competitor_presence: BTreeMap<String, usize>,
}

/// Market analysis panel
#[derive(Debug, Default)]
pub struct MarketAnalysis {
    trends: Arc<Vec<MarketTrend>>,
    direction_filter: Option<TrendDirection>,
    sort: MarketSort,
}

impl MarketAnalysis {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let mut panel = Self::default();
        panel.refresh(rng);
        panel
    }

    pub fn filter_direction(&mut self, direction: Option<TrendDirection>) {
        self.direction_filter = direction;
    }

    pub fn sort_by(&mut self, sort: MarketSort) {
        self.sort = sort;
    }
}

impl Panel for MarketAnalysis {
    type View = MarketView;
    const TITLE: &'static str = "Market Analysis";

    fn refresh(&mut self, rng: &mut dyn RngCore) {
        self.trends = Arc::new(mock::market_trends(rng, SEGMENT_COUNT));
    }

    fn view(&self) -> Arc<MarketView> {
        let mut trends: Vec<MarketTrend> = self
            .trends
            .iter()
            .filter(|t| self.direction_filter.map_or(true, |d| t.direction == d))
            .cloned()
            .collect();

        match self.sort {
            MarketSort::Change => trends.sort_by(|a, b| b.change_percent.abs().total_cmp(&a.change_percent.abs())),
            MarketSort::MarketShare => trends.sort_by(|a, b| b.market_share_percent.total_cmp(&a.market_share_percent)),
            MarketSort::Confidence => trends.sort_by(|a, b| b.confidence_percent.total_cmp(&a.confidence_percent)),
        }

        let mut competitor_presence = BTreeMap::new();
        for trend in &trends {
            let mut seen: Vec<&String> = trend.competitors.iter().collect();
            seen.sort();
            seen.dedup();
            for competitor in seen {
                *competitor_presence.entry(competitor.clone()).or_insert(0) += 1;
            }
        }

        Arc::new(MarketView {
            sort: self.sort,
            growing_segments: trends.iter().filter(|t| t.direction == TrendDirection::Up).count(),
            declining_segments: trends.iter().filter(|t| t.direction == TrendDirection::Down).count(),
            average_confidence_percent: round1(mean(trends.iter().map(|t| t.confidence_percent))),
            competitor_presence,
            trends,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sorted_by_absolute_change() {
        let mut rng = StdRng::seed_from_u64(12);
        let panel = MarketAnalysis::new(&mut rng);
        let view = panel.view();
        assert_eq!(view.trends.len(), SEGMENT_COUNT);
        assert!(view
            .trends
            .windows(2)
            .all(|w| w[0].change_percent.abs() >= w[1].change_percent.abs()));
        assert_eq!(
            view.growing_segments + view.declining_segments
                + view.trends.iter().filter(|t| t.direction == TrendDirection::Stable).count(),
            SEGMENT_COUNT
        );
    }

    #[test]
    fn test_competitor_presence_counts_segments_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut panel = MarketAnalysis::new(&mut rng);
        panel.filter_direction(Some(TrendDirection::Up));
        let view = panel.view();
        for count in view.competitor_presence.values() {
            assert!(*count <= view.trends.len());
        }
    }
}
