//! Derived-metric engines
//!
//! Deterministic arithmetic over already-fetched JSON: weighted health
//! scores, percentile benchmarks, queue health, trend direction and
//! poll-to-poll change detection. Every engine tolerates missing fields.

pub mod benchmark;
pub mod change;
pub mod fields;
pub mod health;
pub mod queue;
pub mod trend;

pub use benchmark::{BenchmarkRank, BenchmarkReport, BenchmarkingEngine, Distribution};
pub use change::{ChangeDetector, ChangeSet, MetricChange};
pub use health::{HealthGrade, HealthInputs, HealthReport, HealthScorer, HealthWeights};
pub use queue::{QueueHealth, QueueHealthMonitor, QueueHealthReport, QueueStatus, QueueThresholds};
pub use trend::{efficiency_rating, Polarity, TrendAnalyzer, TrendOutlook, TrendReport};
