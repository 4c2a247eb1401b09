//! Polling service lifecycle and tick execution

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::{MonitoringSnapshot, PollEvent, PollerConfig, ServiceState, SnapshotAnalyzer, TierConfig};
use crate::cache::ResponseCache;
use crate::events::{DeliveryReport, SubscriberRegistry, SubscriptionId, ERROR_EVENT, STATE_EVENT, UPDATE_EVENT};
use crate::fetch::{EndpointRequest, Fetcher, HttpFetcher};
use crate::metrics::{MetricsCollector, Timer};
use crate::{MonitorError, Result};

/// An armed tier timer as reported by [`PollingService::active_timers`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerInfo {
    pub tier: String,
    pub period: Duration,
}

struct ActiveTimer {
    info: TimerInfo,
    handle: JoinHandle<()>,
}

/// State shared between the service handle and its timer tasks
struct Shared {
    config: PollerConfig,
    fetcher: Arc<dyn Fetcher>,
    analyzer: Arc<dyn SnapshotAnalyzer>,
    cache: ResponseCache,
    subscribers: SubscriberRegistry<PollEvent>,
    snapshot: ArcSwap<MonitoringSnapshot>,
    /// Serializes snapshot read-modify-write across concurrently ticking tiers
    merge_lock: Mutex<()>,
    state: RwLock<ServiceState>,
    metrics: MetricsCollector,
}

/// Interval-driven poller over a set of REST endpoints
///
/// Nothing runs until [`start`](Self::start); the caller owns the
/// lifecycle. Dropping the service cancels its timers.
pub struct PollingService {
    shared: Arc<Shared>,
    /// Serializes `start` and `stop`
    lifecycle: tokio::sync::Mutex<()>,
    timers: Mutex<Vec<ActiveTimer>>,
}

impl std::fmt::Debug for PollingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingService")
            .field("name", &self.shared.config.name)
            .field("state", &self.state())
            .field("timers", &self.timers.lock().len())
            .finish()
    }
}

impl PollingService {
    /// Build a service from a validated config
    pub fn new(
        config: PollerConfig,
        fetcher: Arc<dyn Fetcher>,
        analyzer: Arc<dyn SnapshotAnalyzer>,
    ) -> Result<Self> {
        config.validate()?;

        let shared = Shared {
            cache: ResponseCache::new(config.cache_ttl()),
            snapshot: ArcSwap::from_pointee(MonitoringSnapshot::empty(config.name.clone())),
            metrics: MetricsCollector::new(config.name.clone()),
            subscribers: SubscriberRegistry::new(),
            merge_lock: Mutex::new(()),
            state: RwLock::new(ServiceState::Stopped),
            config,
            fetcher,
            analyzer,
        };

        Ok(Self {
            shared: Arc::new(shared),
            lifecycle: tokio::sync::Mutex::new(()),
            timers: Mutex::new(Vec::new()),
        })
    }

    /// Build a service that fetches over HTTP from `config.base_url`
    pub fn connect(config: PollerConfig, analyzer: Arc<dyn SnapshotAnalyzer>) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.base_url, config.request_timeout())?;
        Self::new(config, Arc::new(fetcher), analyzer)
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &PollerConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ServiceState {
        *self.shared.state.read()
    }

    pub fn is_monitoring(&self) -> bool {
        self.state() == ServiceState::Monitoring
    }

    /// Latest merged snapshot
    pub fn snapshot(&self) -> Arc<MonitoringSnapshot> {
        self.shared.snapshot.load_full()
    }

    /// Load every tier once, then arm one timer per tier
    ///
    /// A no-op while already monitoring. If the initial load fails the
    /// error is returned, the service goes back to `Stopped` and no timer
    /// is armed.
    pub async fn start(&self) -> Result<()> {
        let _guard = self.lifecycle.lock().await;

        if self.state() == ServiceState::Monitoring {
            debug!("{} already monitoring", self.name());
            return Ok(());
        }

        self.shared.transition(ServiceState::Starting);

        for tier in &self.shared.config.tiers {
            if let Err(e) = self.shared.refresh_tier(tier).await {
                error!("{} failed initial load of tier '{}': {}", self.name(), tier.name, e);
                self.shared.transition(ServiceState::Stopped);
                return Err(e);
            }
        }

        let armed: Vec<ActiveTimer> = self
            .shared
            .config
            .tiers
            .iter()
            .map(|tier| self.arm(tier.clone()))
            .collect();

        {
            let mut timers = self.timers.lock();
            for stale in timers.drain(..) {
                stale.handle.abort();
            }
            *timers = armed;
            self.shared.metrics.set_active_timers(timers.len());
        }

        self.shared.transition(ServiceState::Monitoring);
        info!(
            "{} monitoring {} tiers",
            self.name(),
            self.shared.config.tiers.len()
        );
        Ok(())
    }

    /// Cancel every timer; idempotent
    ///
    /// A tick in flight is aborted at its next await point.
    pub async fn stop(&self) {
        let _guard = self.lifecycle.lock().await;
        self.cancel_timers();

        if self.state() != ServiceState::Stopped {
            self.shared.transition(ServiceState::Stopped);
            info!("{} stopped", self.name());
        }
    }

    fn cancel_timers(&self) {
        let mut timers = self.timers.lock();
        for timer in timers.drain(..) {
            timer.handle.abort();
        }
        self.shared.metrics.set_active_timers(0);
    }

    fn arm(&self, tier: TierConfig) -> ActiveTimer {
        let period = tier.interval();
        let info = TimerInfo {
            tier: tier.name.clone(),
            period,
        };
        let shared = Arc::clone(&self.shared);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures were already logged and notified
                let _ = shared.refresh_tier(&tier).await;
            }
        });

        debug!("armed tier '{}' every {:?}", info.tier, period);
        ActiveTimer { info, handle }
    }

    /// Timers currently armed, sorted by tier name
    pub fn active_timers(&self) -> Vec<TimerInfo> {
        let mut infos: Vec<TimerInfo> = self
            .timers
            .lock()
            .iter()
            .filter(|t| !t.handle.is_finished())
            .map(|t| t.info.clone())
            .collect();
        infos.sort();
        infos
    }

    /// Refresh every tier now, regardless of lifecycle state
    ///
    /// Used for manual refresh and retry after a failed start. Returns the
    /// first tier error after attempting all tiers.
    pub async fn refresh_all(&self) -> Result<Arc<MonitoringSnapshot>> {
        let mut first_error = None;
        for tier in &self.shared.config.tiers {
            if let Err(e) = self.shared.refresh_tier(tier).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(self.snapshot()),
        }
    }

    /// Refresh one tier by name
    pub async fn refresh_tier(&self, tier: &str) -> Result<Arc<MonitoringSnapshot>> {
        let tier = self
            .shared
            .config
            .tier(tier)
            .ok_or_else(|| MonitorError::UnknownTier(tier.to_string()))?;
        self.shared.refresh_tier(tier).await?;
        Ok(self.snapshot())
    }

    /// Read one resource through the TTL cache
    ///
    /// Within the TTL the cached body is returned without a fetch; an
    /// expired or missing entry is filled by exactly one fetch.
    pub async fn fetch_cached(&self, request: &EndpointRequest) -> Result<Value> {
        let shared = &self.shared;
        let (value, _) = shared
            .cache
            .get_or_fetch(&request.cache_key(), || async {
                let timer = Timer::start();
                let result = shared.fetcher.fetch(request).await;
                shared.metrics.record_fetch(timer.elapsed_secs());
                result
            })
            .await?;
        Ok(value)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.shared.cache
    }

    /// Register a callback for an event type
    pub fn subscribe<F>(&self, event_type: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&PollEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(event_type, callback)
    }

    pub fn unsubscribe(&self, event_type: &str, id: SubscriptionId) -> bool {
        self.shared.subscribers.unsubscribe(event_type, id)
    }

    /// Deliver an event to every subscriber of `event_type`
    pub fn notify(&self, event_type: &str, event: &PollEvent) -> DeliveryReport {
        self.shared.subscribers.notify(event_type, event)
    }

    pub fn subscribers(&self) -> &SubscriberRegistry<PollEvent> {
        &self.shared.subscribers
    }
}

impl Drop for PollingService {
    fn drop(&mut self) {
        for timer in self.timers.get_mut().drain(..) {
            timer.handle.abort();
        }
    }
}

impl Shared {
    fn transition(&self, to: ServiceState) {
        let from = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, to)
        };
        if from != to {
            debug!("{}: {:?} -> {:?}", self.config.name, from, to);
            self.subscribers
                .notify(STATE_EVENT, &PollEvent::StateChanged { from, to });
        }
    }

    /// Fetch a tier's endpoints, merge what arrived and notify
    ///
    /// Successful endpoints are merged even when a sibling fails; the
    /// failure is then reported as an `error` event and returned.
    #[instrument(skip(self, tier), fields(service = %self.config.name, tier = %tier.name))]
    async fn refresh_tier(&self, tier: &TierConfig) -> Result<()> {
        let fetches = tier.endpoints.iter().map(|endpoint| async move {
            let timer = Timer::start();
            let result = self.fetcher.fetch(&endpoint.request).await;
            self.metrics.record_fetch(timer.elapsed_secs());
            (endpoint, result)
        });

        let mut fresh = Vec::new();
        let mut first_error = None;
        for (endpoint, result) in join_all(fetches).await {
            match result {
                Ok(body) => {
                    self.cache.insert(&endpoint.request.cache_key(), body.clone()).await;
                    fresh.push((endpoint.key.clone(), body));
                }
                Err(e) => {
                    warn!("fetch of '{}' failed: {}", endpoint.key, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if !fresh.is_empty() {
            let snapshot = self.merge(&tier.name, fresh);
            let event = PollEvent::Updated {
                tier: tier.name.clone(),
                snapshot,
            };
            self.subscribers.notify(&tier.event, &event);
            self.subscribers.notify(UPDATE_EVENT, &event);
        }

        match first_error {
            Some(e) => {
                self.metrics.record_tick(&tier.name, false);
                self.subscribers.notify(
                    ERROR_EVENT,
                    &PollEvent::Failed {
                        tier: tier.name.clone(),
                        message: e.to_string(),
                    },
                );
                Err(e.into())
            }
            None => {
                self.metrics.record_tick(&tier.name, true);
                Ok(())
            }
        }
    }

    fn merge(&self, tier: &str, fresh: Vec<(String, Value)>) -> Arc<MonitoringSnapshot> {
        let _guard = self.merge_lock.lock();
        let current = self.snapshot.load();

        let keys: Vec<String> = fresh.iter().map(|(key, _)| key.clone()).collect();
        let mut next = MonitoringSnapshot::clone(&current);
        next.data.extend(fresh);
        next.derived = self.analyzer.analyze(&next.data, &keys);
        next.sequence += 1;
        let now = Utc::now();
        next.refreshed_tiers.insert(tier.to_string(), now);
        next.updated_at = Some(now);

        let next = Arc::new(next);
        self.snapshot.store(Arc::clone(&next));
        next
    }
}
