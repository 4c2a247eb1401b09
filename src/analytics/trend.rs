//! Trend direction and efficiency
//!
//! Compares the mean of the older half of a series with the newer half.

use serde::{Deserialize, Serialize};

use super::health::round2;
use crate::model::TrendDirection;

/// Whether a rising metric is good news
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Qualitative reading of a trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendOutlook {
    Improving,
    Declining,
    Stable,
}

/// Trend of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub direction: TrendDirection,
    pub outlook: TrendOutlook,
    /// Relative change of the newer half against the older half, in percent
    pub change_percent: f64,
}

/// Classifies a series as rising, falling or flat
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    /// Relative change (percent) below which a series is stable
    stable_band_percent: f64,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self {
            stable_band_percent: 5.0,
        }
    }
}

impl TrendAnalyzer {
    pub fn new(stable_band_percent: f64) -> Self {
        Self {
            stable_band_percent: stable_band_percent.abs(),
        }
    }

    /// Analyze a series ordered oldest first; fewer than two points is stable
    pub fn analyze(&self, series: &[f64], polarity: Polarity) -> TrendReport {
        if series.len() < 2 {
            return TrendReport {
                direction: TrendDirection::Stable,
                outlook: TrendOutlook::Stable,
                change_percent: 0.0,
            };
        }

        let mid = series.len() / 2;
        let older = mean(&series[..mid]);
        let newer = mean(&series[series.len() - mid..]);

        let change_percent = if older.abs() > f64::EPSILON {
            (newer - older) / older.abs() * 100.0
        } else if newer.abs() > f64::EPSILON {
            100.0 * newer.signum()
        } else {
            0.0
        };

        let direction = if change_percent > self.stable_band_percent {
            TrendDirection::Up
        } else if change_percent < -self.stable_band_percent {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        let outlook = match (direction, polarity) {
            (TrendDirection::Stable, _) => TrendOutlook::Stable,
            (TrendDirection::Up, Polarity::HigherIsBetter)
            | (TrendDirection::Down, Polarity::LowerIsBetter) => TrendOutlook::Improving,
            _ => TrendOutlook::Declining,
        };

        TrendReport {
            direction,
            outlook,
            change_percent: round2(change_percent),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Efficiency on a `0..=100` scale
///
/// Completion ratio scaled by throughput against a target rate; throughput
/// above target does not raise the rating past the completion ratio.
pub fn efficiency_rating(completed: f64, failed: f64, throughput: f64, target_throughput: f64) -> f64 {
    let attempted = completed + failed;
    if attempted <= 0.0 {
        return 0.0;
    }
    let completion = (completed / attempted).clamp(0.0, 1.0);
    let pace = if target_throughput > 0.0 {
        (throughput / target_throughput).clamp(0.0, 1.0)
    } else {
        1.0
    };
    round2(completion * pace * 100.0)
}
