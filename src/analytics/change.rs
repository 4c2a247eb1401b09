//! Change detection between consecutive polls
//!
//! Keeps the flattened numeric fields of the previous payload and reports
//! every field whose absolute change meets the magnitude threshold.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Change of one numeric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub field: String,
    pub previous: f64,
    pub current: f64,
    pub delta: f64,
}

/// Diff of two consecutive polls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changed: Vec<MetricChange>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of reported changes
    pub fn change_count(&self) -> usize {
        self.changed.len() + self.added.len() + self.removed.len()
    }
}

/// Stateful detector holding the previous snapshot
#[derive(Debug)]
pub struct ChangeDetector {
    threshold: f64,
    previous: Mutex<Option<BTreeMap<String, f64>>>,
}

impl ChangeDetector {
    /// Report changes whose magnitude is at least `threshold`
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
            previous: Mutex::new(None),
        }
    }

    /// Diff `current` against the previous call and remember it
    ///
    /// The first call only primes the detector and returns an empty set.
    pub fn detect(&self, current: &Value) -> ChangeSet {
        let flat = flatten_numbers(current);
        let mut previous = self.previous.lock();

        let changes = match previous.as_ref() {
            Some(before) => diff(before, &flat, self.threshold),
            None => ChangeSet::default(),
        };

        *previous = Some(flat);
        changes
    }

    /// Forget the previous snapshot
    pub fn reset(&self) {
        *self.previous.lock() = None;
    }
}

fn diff(before: &BTreeMap<String, f64>, after: &BTreeMap<String, f64>, threshold: f64) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (field, &current) in after {
        match before.get(field) {
            Some(&previous) => {
                let delta = current - previous;
                if delta.abs() >= threshold && delta != 0.0 {
                    changes.changed.push(MetricChange {
                        field: field.clone(),
                        previous,
                        current,
                        delta,
                    });
                }
            }
            None => changes.added.push(field.clone()),
        }
    }

    changes.removed = before
        .keys()
        .filter(|k| !after.contains_key(*k))
        .cloned()
        .collect();

    changes
}

/// Flatten every numeric leaf into `dotted.path -> value`
pub fn flatten_numbers(value: &Value) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    walk(value, String::new(), &mut out);
    out
}

fn walk(value: &Value, prefix: String, out: &mut BTreeMap<String, f64>) {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                out.insert(prefix, f);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                walk(child, path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = if prefix.is_empty() {
                    i.to_string()
                } else {
                    format!("{}.{}", prefix, i)
                };
                walk(child, path, out);
            }
        }
        _ => {}
    }
}
