//! View-model store
//!
//! Holds one immutable view value behind a `watch` channel. Every update
//! replaces the whole value; consumers hold a receiver (or a
//! `WatchStream`) and always see the latest state.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::events::{SubscriptionId, ERROR_EVENT};
use crate::poller::{MonitoringSnapshot, PollEvent, PollingService};

/// What a consumer renders
#[derive(Debug)]
pub enum ViewState<T> {
    /// Nothing has arrived yet
    Loading,
    Ready(Arc<T>),
    /// The source failed before any data arrived
    Failed { message: String },
}

// Manual impl: `T` itself need not be `Clone`
impl<T> Clone for ViewState<T> {
    fn clone(&self) -> Self {
        match self {
            ViewState::Loading => ViewState::Loading,
            ViewState::Ready(view) => ViewState::Ready(Arc::clone(view)),
            ViewState::Failed { message } => ViewState::Failed {
                message: message.clone(),
            },
        }
    }
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&Arc<T>> {
        match self {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Single-value store replaced wholesale on every update
#[derive(Debug)]
pub struct ViewModelStore<T> {
    sender: watch::Sender<ViewState<T>>,
}

impl<T: Send + Sync + 'static> Default for ViewModelStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> ViewModelStore<T> {
    /// Store starting in `Loading`
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ViewState::Loading);
        Self { sender }
    }

    /// Current state
    pub fn current(&self) -> ViewState<T> {
        self.sender.borrow().clone()
    }

    /// Replace the view
    pub fn publish(&self, view: T) {
        self.sender.send_replace(ViewState::Ready(Arc::new(view)));
    }

    /// Record a failure; ignored once a view is ready so partial data stays visible
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.sender.send_if_modified(|state| {
            if state.ready().is_some() {
                debug!("keeping ready view despite error: {}", message);
                return false;
            }
            *state = ViewState::Failed { message };
            true
        })
    }

    /// Receiver that observes every replacement
    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.sender.subscribe()
    }

    /// Stream of states, starting with the current one
    pub fn stream(&self) -> WatchStream<ViewState<T>> {
        WatchStream::new(self.sender.subscribe())
    }
}

/// Subscriptions held on a poller for a bound store
#[derive(Debug, Clone)]
pub struct ViewBinding {
    subscriptions: Vec<(String, SubscriptionId)>,
}

impl ViewBinding {
    /// Remove every subscription from the poller
    pub fn unbind(self, poller: &PollingService) {
        for (event_type, id) in self.subscriptions {
            poller.unsubscribe(&event_type, id);
        }
    }
}

impl<T: Send + Sync + 'static> ViewModelStore<T> {
    /// Rebuild the view from each snapshot the poller publishes
    ///
    /// Every `Updated` event on one of `event_types` is mapped to a new
    /// view; `error` events mark the store failed only while no view has
    /// been published.
    pub fn bind<F>(self: &Arc<Self>, poller: &PollingService, event_types: &[&str], mapper: F) -> ViewBinding
    where
        F: Fn(&MonitoringSnapshot) -> T + Send + Sync + 'static,
    {
        let mapper = Arc::new(mapper);
        let mut subscriptions = Vec::with_capacity(event_types.len() + 1);

        for event_type in event_types {
            let store = Arc::clone(self);
            let mapper = Arc::clone(&mapper);
            let id = poller.subscribe(event_type, move |event| {
                if let Some(snapshot) = event.snapshot() {
                    store.publish(mapper(snapshot));
                }
                Ok(())
            });
            subscriptions.push((event_type.to_string(), id));
        }

        let store = Arc::clone(self);
        let id = poller.subscribe(ERROR_EVENT, move |event| {
            if let PollEvent::Failed { tier, message } = event {
                store.fail(format!("{}: {}", tier, message));
            }
            Ok(())
        });
        subscriptions.push((ERROR_EVENT.to_string(), id));

        // A poller that already has data should not leave the view loading
        let snapshot = poller.snapshot();
        if !snapshot.is_empty() {
            self.publish(mapper(&snapshot));
        }

        ViewBinding { subscriptions }
    }
}
