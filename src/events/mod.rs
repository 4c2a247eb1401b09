//! Subscriber registry
//!
//! Maps event-type strings to callbacks. Delivery is synchronous and
//! isolated: a callback that returns an error or panics is logged and
//! counted, and the remaining callbacks still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{error, warn};
use uuid::Uuid;

use crate::metrics;

/// Emitted when a tick or the initial load fails
pub const ERROR_EVENT: &str = "error";

/// Emitted after any tier merges fresh data, alongside the tier's own event
pub const UPDATE_EVENT: &str = "update";

/// Emitted on every lifecycle transition
pub const STATE_EVENT: &str = "state";

/// Handle returned by `subscribe`, needed to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered callback
pub type Callback<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// Outcome of one `notify` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Event-type to callback registry
pub struct SubscriberRegistry<E> {
    subscribers: DashMap<String, Vec<(SubscriptionId, Callback<E>)>>,
}

impl<E> Default for SubscriberRegistry<E> {
    fn default() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }
}

impl<E> std::fmt::Debug for SubscriberRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("event_types", &self.subscribers.len())
            .finish()
    }
}

impl<E> SubscriberRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event_type`
    pub fn subscribe<F>(&self, event_type: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.subscribers
            .entry(event_type.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove one subscription; returns whether it existed
    pub fn unsubscribe(&self, event_type: &str, id: SubscriptionId) -> bool {
        let mut removed = false;
        if let Some(mut entry) = self.subscribers.get_mut(event_type) {
            let before = entry.len();
            entry.retain(|(sub, _)| *sub != id);
            removed = entry.len() != before;
        }
        self.subscribers.remove_if(event_type, |_, subs| subs.is_empty());
        removed
    }

    /// Number of callbacks registered for `event_type`
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers.get(event_type).map(|s| s.len()).unwrap_or(0)
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.subscribers.clear();
    }

    /// Invoke every callback registered for `event_type`
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn notify(&self, event_type: &str, event: &E) -> DeliveryReport {
        let callbacks: Vec<(SubscriptionId, Callback<E>)> = match self.subscribers.get(event_type) {
            Some(subs) => subs.iter().map(|(id, cb)| (*id, Arc::clone(cb))).collect(),
            None => return DeliveryReport::default(),
        };

        let mut report = DeliveryReport::default();
        for (id, callback) in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!("Subscriber {} for '{}' failed: {:#}", id, event_type, e);
                    metrics::record_subscriber_failure(event_type);
                    report.failed += 1;
                }
                Err(panic) => {
                    error!(
                        "Subscriber {} for '{}' panicked: {}",
                        id,
                        event_type,
                        panic_message(panic.as_ref())
                    );
                    metrics::record_subscriber_failure(event_type);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_unsubscribe() {
        let registry: SubscriberRegistry<u32> = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = registry.subscribe("tick", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        registry.notify("tick", &1);
        assert!(registry.unsubscribe("tick", id));
        assert!(!registry.unsubscribe("tick", id));
        registry.notify("tick", &2);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriber_count("tick"), 0);
    }

    #[test]
    fn test_event_types_are_independent() {
        let registry: SubscriberRegistry<&str> = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        registry.subscribe("a", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = registry.notify("b", &"x");
        assert_eq!(report, DeliveryReport::default());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reentrant_unsubscribe() {
        let registry: Arc<SubscriberRegistry<()>> = Arc::new(SubscriberRegistry::new());
        let slot: Arc<parking_lot::Mutex<Option<SubscriptionId>>> = Arc::new(parking_lot::Mutex::new(None));

        let r = Arc::clone(&registry);
        let s = Arc::clone(&slot);
        let id = registry.subscribe("once", move |_| {
            if let Some(id) = *s.lock() {
                r.unsubscribe("once", id);
            }
            Ok(())
        });
        *slot.lock() = Some(id);

        assert_eq!(registry.notify("once", &()).delivered, 1);
        assert_eq!(registry.notify("once", &()).delivered, 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
