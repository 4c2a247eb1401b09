//! Fleet benchmarking
//!
//! Ranks items of a payload array (usually agents) on one numeric metric
//! against the fleet distribution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;
use super::health::round2;

/// Where an item sits relative to the fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkRank {
    TopPerformer,
    AboveAverage,
    BelowAverage,
    Underperformer,
}

/// Fleet distribution of one metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

/// One ranked item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: String,
    pub value: f64,
    pub rank: BenchmarkRank,
}

/// Full benchmark of a metric across a fleet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub metric: String,
    pub distribution: Distribution,
    pub items: Vec<RankedItem>,
    /// IDs at or above the threshold
    pub above_threshold: Vec<String>,
    /// IDs below the threshold
    pub below_threshold: Vec<String>,
}

/// Benchmarks a metric against the fleet
#[derive(Debug, Clone)]
pub struct BenchmarkingEngine {
    metric: String,
    id_field: String,
    threshold: f64,
    higher_is_better: bool,
}

impl BenchmarkingEngine {
    /// Benchmark `metric`, splitting items at `threshold`
    pub fn new(metric: impl Into<String>, threshold: f64) -> Self {
        Self {
            metric: metric.into(),
            id_field: "id".to_string(),
            threshold,
            higher_is_better: true,
        }
    }

    /// Treat lower values as better, as for latencies
    pub fn lower_is_better(mut self) -> Self {
        self.higher_is_better = false;
        self
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Benchmark the items of a payload array; items lacking the metric are skipped
    pub fn benchmark(&self, items: &[Value]) -> BenchmarkReport {
        let samples: Vec<(String, f64)> = items
            .iter()
            .filter_map(|item| {
                let value = fields::number(item, &self.metric)?;
                Some((fields::text(item, &self.id_field).to_string(), value))
            })
            .collect();

        let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let distribution = distribution(&values);

        let mut report = BenchmarkReport {
            metric: self.metric.clone(),
            distribution,
            ..BenchmarkReport::default()
        };

        for (id, value) in samples {
            let better_than_threshold = if self.higher_is_better {
                value >= self.threshold
            } else {
                value <= self.threshold
            };
            if better_than_threshold {
                report.above_threshold.push(id.clone());
            } else {
                report.below_threshold.push(id.clone());
            }

            report.items.push(RankedItem {
                rank: self.rank(value, &report.distribution),
                id,
                value,
            });
        }

        report
    }

    fn rank(&self, value: f64, dist: &Distribution) -> BenchmarkRank {
        // Mirror the value for lower-is-better metrics so one comparison chain serves both
        let (v, mean, p90, low) = if self.higher_is_better {
            (value, dist.mean, dist.p90, dist.p10)
        } else {
            (-value, -dist.mean, -dist.p10, -dist.p90)
        };

        if v >= p90 {
            BenchmarkRank::TopPerformer
        } else if v >= mean {
            BenchmarkRank::AboveAverage
        } else if v > low {
            BenchmarkRank::BelowAverage
        } else {
            BenchmarkRank::Underperformer
        }
    }
}

/// Summarize a set of samples
pub fn distribution(values: &[f64]) -> Distribution {
    if values.is_empty() {
        return Distribution::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Distribution {
        count: sorted.len(),
        mean: round2(sorted.iter().sum::<f64>() / sorted.len() as f64),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p10: percentile(&sorted, 10.0),
        p50: percentile(&sorted, 50.0),
        p90: percentile(&sorted, 90.0),
        p95: percentile(&sorted, 95.0),
    }
}

/// Nearest-rank percentile of an ascending slice, `0.0` when empty
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_percentile_nearest_rank() {
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&sorted, 50.0), 5.0);
        assert_eq!(percentile(&sorted, 90.0), 9.0);
        assert_eq!(percentile(&sorted, 95.0), 10.0);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_threshold_split_skips_missing() {
        let agents = vec![
            json!({"id": "a1", "success_rate_percent": 99}),
            json!({"id": "a2", "success_rate_percent": 80}),
            json!({"id": "a3"}),
            json!({"id": "a4", "success_rate_percent": 95}),
        ];
        let report = BenchmarkingEngine::new("success_rate_percent", 90.0).benchmark(&agents);

        assert_eq!(report.distribution.count, 3);
        assert_eq!(report.above_threshold, vec!["a1", "a4"]);
        assert_eq!(report.below_threshold, vec!["a2"]);
        assert_eq!(report.distribution.max, 99.0);
    }

    #[test]
    fn test_lower_is_better_ranks_fast_items_on_top() {
        let agents: Vec<Value> = (1..=10)
            .map(|i| json!({"id": format!("a{}", i), "latency_ms": i * 100}))
            .collect();
        let report = BenchmarkingEngine::new("latency_ms", 500.0)
            .lower_is_better()
            .benchmark(&agents);

        let fastest = report.items.iter().find(|i| i.id == "a1").unwrap();
        let slowest = report.items.iter().find(|i| i.id == "a10").unwrap();
        assert_eq!(fastest.rank, BenchmarkRank::TopPerformer);
        assert_eq!(slowest.rank, BenchmarkRank::Underperformer);
        assert_eq!(report.above_threshold.len(), 5);
    }

    #[test]
    fn test_empty_fleet() {
        let report = BenchmarkingEngine::new("x", 1.0).benchmark(&[]);
        assert_eq!(report.distribution, Distribution::default());
        assert!(report.items.is_empty());
    }
}
