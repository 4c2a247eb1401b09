//! Health scoring
//!
//! Maps success rate, latency, uptime and error rate onto a single
//! `0..=100` score. Inputs missing from a payload drop out of the
//! weighted sum and the remaining weights are renormalized, so a partial
//! payload still yields a meaningful score.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;

/// Qualitative bucket for a `0..=100` score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGrade {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl HealthGrade {
    /// Bucket a score: excellent ≥ 90, good ≥ 75, fair ≥ 50, otherwise poor
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthGrade::Excellent
        } else if score >= 75.0 {
            HealthGrade::Good
        } else if score >= 50.0 {
            HealthGrade::Fair
        } else {
            HealthGrade::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthGrade::Excellent => "excellent",
            HealthGrade::Good => "good",
            HealthGrade::Fair => "fair",
            HealthGrade::Poor => "poor",
        }
    }
}

/// Relative weight of each health component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthWeights {
    pub success_rate: f64,
    pub latency: f64,
    pub uptime: f64,
    pub error_rate: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            success_rate: 0.4,
            latency: 0.3,
            uptime: 0.2,
            error_rate: 0.1,
        }
    }
}

/// Raw inputs to the health score; `None` means "not reported"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthInputs {
    pub success_rate_percent: Option<f64>,
    pub average_execution_time_ms: Option<f64>,
    pub uptime_percent: Option<f64>,
    pub error_rate_percent: Option<f64>,
}

impl HealthInputs {
    /// Read inputs from a payload, accepting the field aliases the API uses
    pub fn from_value(value: &Value) -> Self {
        Self {
            success_rate_percent: fields::first_number(value, &["success_rate_percent", "success_rate"]),
            average_execution_time_ms: fields::first_number(
                value,
                &[
                    "average_execution_time_ms",
                    "average_response_time_ms",
                    "avg_response_time_ms",
                    "response_time_ms",
                ],
            ),
            uptime_percent: fields::first_number(value, &["uptime_percent", "uptime"]),
            error_rate_percent: fields::first_number(value, &["error_rate_percent", "error_rate"]),
        }
    }
}

/// Per-component sub-scores, each in `0..=100`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthComponents {
    pub success_rate: Option<f64>,
    pub latency: Option<f64>,
    pub uptime: Option<f64>,
    pub error_rate: Option<f64>,
}

/// Result of scoring one payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub score: f64,
    pub grade: HealthGrade,
    pub components: HealthComponents,
}

/// Weighted health scorer
#[derive(Debug, Clone)]
pub struct HealthScorer {
    weights: HealthWeights,
    /// Latency at or below this scores 100
    target_latency_ms: f64,
    /// Latency at or above this scores 0
    max_latency_ms: f64,
    /// Error rate at or above this scores 0
    max_error_rate_percent: f64,
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self {
            weights: HealthWeights::default(),
            target_latency_ms: 500.0,
            max_latency_ms: 10_000.0,
            max_error_rate_percent: 20.0,
        }
    }
}

impl HealthScorer {
    pub fn new(weights: HealthWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    /// Override the latency band used for the latency component
    pub fn with_latency_band(mut self, target_ms: f64, max_ms: f64) -> Self {
        self.target_latency_ms = target_ms;
        self.max_latency_ms = max_ms.max(target_ms + 1.0);
        self
    }

    /// Score a raw payload
    pub fn score_value(&self, value: &Value) -> HealthReport {
        self.score(&HealthInputs::from_value(value))
    }

    /// Score already-extracted inputs
    pub fn score(&self, inputs: &HealthInputs) -> HealthReport {
        let components = HealthComponents {
            success_rate: inputs.success_rate_percent.map(clamp_percent),
            latency: inputs.average_execution_time_ms.map(|ms| self.latency_score(ms)),
            uptime: inputs.uptime_percent.map(clamp_percent),
            error_rate: inputs.error_rate_percent.map(|rate| self.error_rate_score(rate)),
        };

        let weighted = [
            (components.success_rate, self.weights.success_rate),
            (components.latency, self.weights.latency),
            (components.uptime, self.weights.uptime),
            (components.error_rate, self.weights.error_rate),
        ];

        let (sum, weight_total) = weighted
            .iter()
            .filter_map(|(component, weight)| component.map(|c| (c * weight, *weight)))
            .fold((0.0, 0.0), |(s, w), (cs, cw)| (s + cs, w + cw));

        let score = if weight_total > 0.0 {
            round2(sum / weight_total)
        } else {
            0.0
        };

        HealthReport {
            score,
            grade: HealthGrade::from_score(score),
            components,
        }
    }

    fn latency_score(&self, latency_ms: f64) -> f64 {
        if latency_ms <= self.target_latency_ms {
            return 100.0;
        }
        let span = self.max_latency_ms - self.target_latency_ms;
        clamp_percent(100.0 * (1.0 - (latency_ms - self.target_latency_ms) / span))
    }

    fn error_rate_score(&self, error_rate_percent: f64) -> f64 {
        if error_rate_percent.is_nan() {
            return 0.0;
        }
        clamp_percent(100.0 * (1.0 - error_rate_percent.max(0.0) / self.max_error_rate_percent))
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
