//! Named-channel publish/subscribe registry.
//!
//! The bus decouples producers of decoded stream events from whoever
//! consumes them (console loggers, UI state, tests). It knows nothing about
//! streaming: a channel is just a name with an ordered list of handlers.
//!
//! Dispatch is synchronous. `publish` takes a snapshot of the channel's
//! handlers, releases the registry lock and then calls them in subscription
//! order, so handlers may subscribe, unsubscribe or publish re-entrantly.
//! Panics raised by handlers are not caught.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

struct Registration<P> {
    id: u64,
    handler: Handler<P>,
}

struct Registry<P> {
    channels: HashMap<String, Vec<Registration<P>>>,
    next_id: u64,
}

impl<P> Registry<P> {
    fn remove(&mut self, channel: &str, id: u64) -> bool {
        let Some(handlers) = self.channels.get_mut(channel) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|registration| registration.id != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            self.channels.remove(channel);
        }
        removed
    }
}

/// Thread-safe event bus keyed by channel name.
///
/// Cloning the bus is cheap; clones share the same registrations.
///
/// # Example
///
/// ```
/// use sse_tap::bus::EventBus;
/// use std::sync::{Arc, Mutex};
///
/// let bus: EventBus<i32> = EventBus::new();
/// let total = Arc::new(Mutex::new(0));
///
/// let sink = total.clone();
/// let subscription = bus.subscribe("increase", move |add| *sink.lock().unwrap() += add);
///
/// bus.publish("increase", &1);
/// bus.publish("increase", &10);
/// assert_eq!(*total.lock().unwrap(), 11);
///
/// subscription.unsubscribe();
/// bus.publish("increase", &100);
/// assert_eq!(*total.lock().unwrap(), 11);
/// ```
pub struct EventBus<P> {
    inner: Arc<Mutex<Registry<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                channels: HashMap::new(),
                next_id: 0,
            })),
        }
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        let mut channels: Vec<(&str, usize)> = registry
            .channels
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        channels.sort_unstable();
        f.debug_struct("EventBus")
            .field("channels", &channels)
            .finish()
    }
}

impl<P: 'static> EventBus<P> {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` on `channel`.
    ///
    /// Unknown channels are created on first use. The same closure may be
    /// registered several times; each registration gets its own
    /// [`Subscription`] and is removed independently.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.registry();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .channels
                .entry(channel.to_string())
                .or_default()
                .push(Registration {
                    id,
                    handler: Arc::new(handler),
                });
            id
        };
        trace!(channel, id, "handler subscribed");

        let weak: Weak<Mutex<Registry<P>>> = Arc::downgrade(&self.inner);
        let channel_name = channel.to_string();
        Subscription {
            channel: channel.to_string(),
            id,
            remover: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut registry = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    if registry.remove(&channel_name, id) {
                        trace!(channel = %channel_name, id, "handler unsubscribed");
                    }
                }
            })),
        }
    }

    /// Invoke every handler currently registered on `channel`.
    ///
    /// Handlers run in subscription order on the caller's thread. Handlers
    /// added during this call are not invoked by it. Returns the number of
    /// handlers invoked.
    pub fn publish(&self, channel: &str, payload: &P) -> usize {
        let snapshot: Vec<Handler<P>> = match self.registry().channels.get(channel) {
            Some(handlers) => handlers
                .iter()
                .map(|registration| Arc::clone(&registration.handler))
                .collect(),
            None => return 0,
        };

        trace!(channel, handlers = snapshot.len(), "publish");
        for handler in &snapshot {
            handler(payload);
        }
        snapshot.len()
    }

    /// Number of handlers registered on `channel`.
    pub fn handler_count(&self, channel: &str) -> usize {
        self.registry()
            .channels
            .get(channel)
            .map_or(0, Vec::len)
    }

    /// Remove every handler from `channel`.
    ///
    /// Outstanding [`Subscription`]s for the channel become no-ops.
    pub fn clear(&self, channel: &str) {
        self.registry().channels.remove(channel);
    }
}

impl<P> EventBus<P> {
    fn registry(&self) -> MutexGuard<'_, Registry<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Token returned by [`EventBus::subscribe`].
///
/// Calling [`unsubscribe`](Subscription::unsubscribe) removes exactly the
/// registration it was issued for. Dropping the token without calling it
/// leaves the handler registered.
pub struct Subscription {
    channel: String,
    id: u64,
    remover: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Channel this registration belongs to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Remove the registration. No-op if the bus is gone or the channel was
    /// cleared.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remover.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .finish()
    }
}
