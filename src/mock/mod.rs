//! Randomized mock data for the dashboard panels
//!
//! Every generator is a pure function of the random source it is handed,
//! so tests can pass a seeded `StdRng` and get reproducible batches while
//! the panels use `thread_rng()`. IDs come from index counters and carry
//! no identity across batches.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;

mod agents;
mod business;
mod infrastructure;

pub use agents::{agents, communication_events, connections, coordination_tasks, performance_metrics};
pub use business::{calendar_events, leads, market_trends, pipeline_stages, projects};
pub use infrastructure::{api_nodes, triggers};

/// Pick one element of a non-empty table
pub(crate) fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, table: &[T]) -> T {
    table[rng.gen_range(0..table.len())]
}

/// Round to one decimal place, the precision the panels display
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Timestamp up to `max_minutes` in the past
pub(crate) fn minutes_ago<R: Rng + ?Sized>(rng: &mut R, max_minutes: i64) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::minutes(rng.gen_range(0..=max_minutes))
}

pub(crate) fn sequential_id(prefix: &str, index: usize) -> String {
    format!("{}-{:03}", prefix, index + 1)
}
