//! Task queue health
//!
//! Scores each queue from its depth, failure ratio, wait time and
//! throughput, then rolls the queues up into an overall status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields;
use super::health::round2;

/// Coarse queue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Healthy,
    Degraded,
    Critical,
}

impl QueueStatus {
    fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            QueueStatus::Healthy
        } else if score >= 45.0 {
            QueueStatus::Degraded
        } else {
            QueueStatus::Critical
        }
    }
}

/// Limits the queue monitor scores against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueThresholds {
    /// Pending depth at which a queue counts as a bottleneck
    pub max_pending: f64,
    /// Wait time that zeroes the wait component
    pub max_wait_time_ms: f64,
    /// Failure share that zeroes the failure component
    pub max_failure_ratio: f64,
}

impl Default for QueueThresholds {
    fn default() -> Self {
        Self {
            max_pending: 500.0,
            max_wait_time_ms: 60_000.0,
            max_failure_ratio: 0.25,
        }
    }
}

/// Health of one queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueHealth {
    pub name: String,
    pub score: f64,
    pub status: QueueStatus,
    pub pending: f64,
    pub processing: f64,
    pub failed: f64,
    /// Minutes to drain the pending backlog at current throughput, `None` when stalled
    pub estimated_drain_minutes: Option<f64>,
}

/// Roll-up across all queues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueHealthReport {
    pub overall_score: f64,
    pub status: QueueStatus,
    pub total_pending: f64,
    pub total_processing: f64,
    pub total_failed: f64,
    pub bottlenecks: Vec<String>,
    pub queues: Vec<QueueHealth>,
}

/// Scores task queues
#[derive(Debug, Clone, Default)]
pub struct QueueHealthMonitor {
    thresholds: QueueThresholds,
}

impl QueueHealthMonitor {
    pub fn new(thresholds: QueueThresholds) -> Self {
        Self { thresholds }
    }

    /// Score one queue object
    pub fn assess_queue(&self, queue: &Value) -> QueueHealth {
        // Counts, waits and rates are never negative
        let count = |paths: &[&str]| fields::first_number(queue, paths).unwrap_or(0.0).max(0.0);
        let pending = count(&["pending_tasks", "pending"]);
        let processing = count(&["processing_tasks", "processing"]);
        let failed = count(&["failed_tasks", "failed"]);
        let completed = count(&["completed_tasks", "completed"]);
        let wait_ms = count(&["average_wait_time_ms", "avg_wait_time_ms"]);
        let throughput = count(&["throughput_per_minute", "throughput"]);

        let depth_score = 100.0 * (1.0 - pending / self.thresholds.max_pending).clamp(0.0, 1.0);
        let attempted = completed + failed;
        let failure_ratio = if attempted > 0.0 { failed / attempted } else { 0.0 };
        let failure_score =
            100.0 * (1.0 - failure_ratio / self.thresholds.max_failure_ratio).clamp(0.0, 1.0);
        let wait_score = 100.0 * (1.0 - wait_ms / self.thresholds.max_wait_time_ms).clamp(0.0, 1.0);

        let score = round2(depth_score * 0.4 + failure_score * 0.35 + wait_score * 0.25);
        let estimated_drain_minutes = if pending == 0.0 {
            Some(0.0)
        } else if throughput > 0.0 {
            Some(round2(pending / throughput))
        } else {
            None
        };

        QueueHealth {
            name: fields::first_text(queue, &["name", "queue", "id"]).to_string(),
            score,
            status: QueueStatus::from_score(score),
            pending,
            processing,
            failed,
            estimated_drain_minutes,
        }
    }

    /// Score every queue in the list and roll them up
    ///
    /// The overall score is the pending-weighted mean so that a deep,
    /// unhealthy queue dominates a handful of idle ones.
    pub fn assess(&self, queues: &[Value]) -> QueueHealthReport {
        let assessed: Vec<QueueHealth> = queues.iter().map(|q| self.assess_queue(q)).collect();

        let total_pending: f64 = assessed.iter().map(|q| q.pending).sum();
        let total_processing: f64 = assessed.iter().map(|q| q.processing).sum();
        let total_failed: f64 = assessed.iter().map(|q| q.failed).sum();

        let overall_score = if assessed.is_empty() {
            100.0
        } else {
            let weights: Vec<f64> = assessed.iter().map(|q| q.pending + 1.0).collect();
            let weight_total: f64 = weights.iter().sum();
            round2(
                assessed
                    .iter()
                    .zip(&weights)
                    .map(|(q, w)| q.score * w)
                    .sum::<f64>()
                    / weight_total,
            )
        };

        let bottlenecks = assessed
            .iter()
            .filter(|q| q.pending >= self.thresholds.max_pending || q.status == QueueStatus::Critical)
            .map(|q| q.name.clone())
            .collect();

        QueueHealthReport {
            overall_score,
            status: QueueStatus::from_score(overall_score),
            total_pending,
            total_processing,
            total_failed,
            bottlenecks,
            queues: assessed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_negative_counts_are_clamped() {
        let report = QueueHealthMonitor::default().assess(&[
            json!({"name": "a", "pending_tasks": -1, "failed_tasks": -5, "completed_tasks": 10}),
            json!({"name": "b", "pending": "-1"}),
        ]);
        assert!(report.overall_score.is_finite());
        assert_eq!(report.overall_score, 100.0);
        assert_eq!(report.total_pending, 0.0);
        assert_eq!(report.total_failed, 0.0);
        assert_eq!(report.queues[0].estimated_drain_minutes, Some(0.0));
    }

    #[test]
    fn test_idle_queue_is_healthy() {
        let monitor = QueueHealthMonitor::default();
        let health = monitor.assess_queue(&json!({"name": "email", "pending_tasks": 0}));
        assert_eq!(health.score, 100.0);
        assert_eq!(health.status, QueueStatus::Healthy);
        assert_eq!(health.estimated_drain_minutes, Some(0.0));
    }

    #[test]
    fn test_stalled_backlog_is_critical() {
        let monitor = QueueHealthMonitor::default();
        let health = monitor.assess_queue(&json!({
            "name": "billing",
            "pending_tasks": 900,
            "failed_tasks": 40,
            "completed_tasks": 60,
            "average_wait_time_ms": 120000,
            "throughput_per_minute": 0
        }));
        assert_eq!(health.score, 0.0);
        assert_eq!(health.status, QueueStatus::Critical);
        assert!(health.estimated_drain_minutes.is_none());
    }

    #[test]
    fn test_rollup_flags_bottlenecks() {
        let monitor = QueueHealthMonitor::default();
        let report = monitor.assess(&[
            json!({"name": "fast", "pending_tasks": 2, "throughput_per_minute": 10}),
            json!({"name": "slow", "pending_tasks": 650, "average_wait_time_ms": 50000}),
        ]);

        assert_eq!(report.total_pending, 652.0);
        assert_eq!(report.bottlenecks, vec!["slow".to_string()]);
        assert!(report.overall_score < report.queues[0].score);
    }

    #[test]
    fn test_no_queues() {
        let report = QueueHealthMonitor::default().assess(&[]);
        assert_eq!(report.overall_score, 100.0);
        assert_eq!(report.status, QueueStatus::Healthy);
    }
}
