//! Shared test fetcher

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agentops::fetch::{EndpointRequest, FetchError, Fetcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// In-memory fetcher with per-path bodies, failures and call counts
#[derive(Default)]
pub struct ScriptedFetcher {
    bodies: Mutex<HashMap<String, Value>>,
    failing: Mutex<Vec<String>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `path` (cache key, including any query)
    pub fn respond(&self, path: &str, body: Value) {
        self.bodies.lock().insert(path.to_string(), body);
    }

    /// Make every request whose cache key starts with `prefix` fail
    pub fn fail(&self, prefix: &str) {
        self.failing.lock().push(prefix.to_string());
    }

    pub fn recover(&self) {
        self.failing.lock().clear();
    }

    /// Sleep this long inside every fetch
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &EndpointRequest) -> Result<Value, FetchError> {
        let key = request.cache_key();
        *self.calls.lock().entry(key.clone()).or_default() += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().iter().any(|prefix| key.starts_with(prefix.as_str())) {
            return Err(FetchError::Status {
                path: request.path.clone(),
                status: 503,
            });
        }

        let body = self.bodies.lock().get(&key).cloned();
        Ok(body.unwrap_or_else(|| json!({"path": key})))
    }
}
