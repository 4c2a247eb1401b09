mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agentops::events::{ERROR_EVENT, STATE_EVENT, UPDATE_EVENT};
use agentops::fetch::EndpointRequest;
use agentops::poller::{
    PassthroughAnalyzer, PollEvent, PollerConfig, PollingService, ServiceState, TierConfig, TimerInfo,
};
use agentops::MonitorError;
use common::ScriptedFetcher;
use futures::future::join_all;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;

const FAST: &str = "/api/enterprise/fast";
const SLOW: &str = "/api/enterprise/slow";

fn config() -> PollerConfig {
    PollerConfig::new("test_poller")
        .with_cache_ttl(Duration::from_secs(30))
        .with_tier(
            TierConfig::new("fast", Duration::from_secs(1))
                .endpoint("fast", EndpointRequest::resource("fast")),
        )
        .with_tier(
            TierConfig::new("slow", Duration::from_secs(60))
                .endpoint("slow", EndpointRequest::resource("slow")),
        )
}

fn service(fetcher: &Arc<ScriptedFetcher>) -> PollingService {
    PollingService::new(config(), fetcher.clone(), Arc::new(PassthroughAnalyzer)).unwrap()
}

fn counter(service: &PollingService, event_type: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    service.subscribe(event_type, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    count
}

fn expected_timers() -> Vec<TimerInfo> {
    vec![
        TimerInfo {
            tier: "fast".to_string(),
            period: Duration::from_secs(1),
        },
        TimerInfo {
            tier: "slow".to_string(),
            period: Duration::from_secs(60),
        },
    ]
}

/// Start performs one initial load and arms one timer per tier
#[tokio::test(start_paused = true)]
async fn test_start_loads_and_arms_timers() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);
    assert_eq!(service.state(), ServiceState::Stopped);
    assert!(service.active_timers().is_empty());

    service.start().await.unwrap();

    assert_eq!(service.state(), ServiceState::Monitoring);
    assert_eq!(service.active_timers(), expected_timers());
    assert_eq!(fetcher.calls(FAST), 1);
    assert_eq!(fetcher.calls(SLOW), 1);

    let snapshot = service.snapshot();
    assert_eq!(snapshot.service, "test_poller");
    assert_eq!(snapshot.sequence, 2);
    assert_eq!(snapshot.get("fast"), Some(&json!({"path": FAST})));
    assert!(snapshot.updated_at.is_some());
}

/// A second start without stop arms nothing new and does not reload
#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);

    service.start().await.unwrap();
    service.start().await.unwrap();

    assert_eq!(service.active_timers(), expected_timers());
    assert_eq!(fetcher.calls(SLOW), 1);
}

/// Concurrent starts are serialized into one
#[tokio::test(start_paused = true)]
async fn test_concurrent_starts() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.set_delay(Duration::from_millis(100));
    let service = service(&fetcher);

    let results = join_all((0..4).map(|_| service.start())).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(service.active_timers(), expected_timers());
    assert_eq!(fetcher.calls(SLOW), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_start_restores_same_timers() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);

    service.start().await.unwrap();
    let first = service.active_timers();

    service.stop().await;
    assert_eq!(service.state(), ServiceState::Stopped);
    assert!(service.active_timers().is_empty());
    service.stop().await;

    service.start().await.unwrap();
    assert_eq!(service.active_timers(), first);
    service.stop().await;
}

/// Stopped services do not tick
#[tokio::test(start_paused = true)]
async fn test_stop_cancels_ticks() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);

    service.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let ticked = fetcher.calls(FAST);
    assert_eq!(ticked, 3);

    service.stop().await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fetcher.calls(FAST), ticked);
}

/// A failed tick emits an error event and the timer keeps firing
#[tokio::test(start_paused = true)]
async fn test_failed_tick_keeps_timer_running() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);
    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let e = errors.clone();
    service.subscribe(ERROR_EVENT, move |event| {
        if let PollEvent::Failed { tier, .. } = event {
            e.lock().push(tier.clone());
        }
        Ok(())
    });
    let fast_updates = counter(&service, "fast_updated");

    service.start().await.unwrap();
    assert_eq!(fast_updates.load(Ordering::SeqCst), 1);

    fetcher.fail(FAST);
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(*errors.lock(), vec!["fast".to_string()]);
    assert_eq!(fast_updates.load(Ordering::SeqCst), 1);

    fetcher.recover();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fast_updates.load(Ordering::SeqCst), 2);
    assert_eq!(errors.lock().len(), 1);
    assert_eq!(service.active_timers(), expected_timers());
    service.stop().await;
}

/// A failed initial load leaves the service stopped with no timers
#[tokio::test(start_paused = true)]
async fn test_failed_start_reverts_to_stopped() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.fail(SLOW);
    let service = service(&fetcher);
    let errors = counter(&service, ERROR_EVENT);

    let result = service.start().await;
    assert!(matches!(result, Err(MonitorError::Fetch(_))));
    assert_eq!(service.state(), ServiceState::Stopped);
    assert!(service.active_timers().is_empty());
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    // Retry once the source recovers
    fetcher.recover();
    service.start().await.unwrap();
    assert_eq!(service.state(), ServiceState::Monitoring);
    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_partial_tier_failure_keeps_successful_endpoints() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.fail("/api/enterprise/broken");
    let config = PollerConfig::new("partial").with_tier(
        TierConfig::new("mixed", Duration::from_secs(5))
            .endpoint("ok", EndpointRequest::resource("ok"))
            .endpoint("broken", EndpointRequest::resource("broken")),
    );
    let service = PollingService::new(config, fetcher.clone(), Arc::new(PassthroughAnalyzer)).unwrap();
    let updates = counter(&service, UPDATE_EVENT);
    let errors = counter(&service, ERROR_EVENT);

    assert!(service.refresh_tier("mixed").await.is_err());
    let snapshot = service.snapshot();
    assert!(snapshot.get("ok").is_some());
    assert!(snapshot.get("broken").is_none());
    assert_eq!(updates.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_state_events() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);
    let transitions: Arc<Mutex<Vec<(ServiceState, ServiceState)>>> = Arc::new(Mutex::new(Vec::new()));
    let t = transitions.clone();
    service.subscribe(STATE_EVENT, move |event| {
        if let PollEvent::StateChanged { from, to } = event {
            t.lock().push((*from, *to));
        }
        Ok(())
    });

    service.start().await.unwrap();
    service.stop().await;

    assert_eq!(
        *transitions.lock(),
        vec![
            (ServiceState::Stopped, ServiceState::Starting),
            (ServiceState::Starting, ServiceState::Monitoring),
            (ServiceState::Monitoring, ServiceState::Stopped),
        ]
    );
}

/// Within the TTL the cache answers; after expiry one fetch refills it
#[tokio::test(start_paused = true)]
async fn test_fetch_cached_ttl() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.set_delay(Duration::from_millis(50));
    let service = service(&fetcher);
    let request = EndpointRequest::item("agents", "agent-007", Some("performance"));
    let key = request.cache_key();

    let first = service.fetch_cached(&request).await.unwrap();
    let second = service.fetch_cached(&request).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fetcher.calls(&key), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;

    let readers = join_all((0..5).map(|_| service.fetch_cached(&request))).await;
    assert!(readers.iter().all(|r| r.is_ok()));
    assert_eq!(fetcher.calls(&key), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_cached_does_not_cache_failures() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);
    let request = EndpointRequest::resource("task-queues/email");

    fetcher.fail("/api/enterprise/task-queues");
    assert!(service.fetch_cached(&request).await.is_err());

    fetcher.recover();
    assert!(service.fetch_cached(&request).await.is_ok());
    assert!(service.fetch_cached(&request).await.is_ok());
    assert_eq!(fetcher.calls(&request.cache_key()), 2);
}

/// Ticks write through to the cache, so a deep read right after is free
#[tokio::test(start_paused = true)]
async fn test_ticks_populate_cache() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);
    service.refresh_all().await.unwrap();

    let cached = service.fetch_cached(&EndpointRequest::resource("slow")).await.unwrap();
    assert_eq!(cached, json!({"path": SLOW}));
    assert_eq!(fetcher.calls(SLOW), 1);
}

/// An erroring or panicking subscriber does not block the others
#[tokio::test(start_paused = true)]
async fn test_subscriber_isolation() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);

    service.subscribe(UPDATE_EVENT, |_| anyhow::bail!("subscriber broke"));
    service.subscribe(UPDATE_EVENT, |_| panic!("subscriber panicked"));
    let healthy = counter(&service, UPDATE_EVENT);

    service.refresh_tier("fast").await.unwrap();
    assert_eq!(healthy.load(Ordering::SeqCst), 1);

    let report = service.notify(UPDATE_EVENT, &PollEvent::Failed {
        tier: "manual".to_string(),
        message: "synthetic".to_string(),
    });
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(healthy.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribe_stops_delivery() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let service = service(&fetcher);
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let id = service.subscribe("slow_updated", move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    service.refresh_tier("slow").await.unwrap();
    assert!(service.unsubscribe("slow_updated", id));
    service.refresh_tier("slow").await.unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(service.subscribers().subscriber_count("slow_updated"), 0);
}
