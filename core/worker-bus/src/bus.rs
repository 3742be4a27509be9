//! Core event bus implementation
//!
//! Type-keyed synchronous publish/subscribe. Subscribers register a typed
//! callback; publishing a message invokes every current subscriber for that
//! exact type, in subscription order, against a snapshot of the list taken
//! at publish time.

use crate::messages::Message;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Monotonic bus identity source, shared by every bus in the process
static NEXT_BUS_ID: AtomicU64 = AtomicU64::new(1);

/// One registered callback slot
struct Slot {
    id: u64,
    handler: Handler,
}

/// Event bus for typed pub/sub
///
/// # Design
/// - Subscriber lists indexed by `TypeId`, in subscription order
/// - Dispatch runs against a snapshot, so handlers may subscribe or
///   unsubscribe mid-publish without corrupting iteration
/// - Each handler invocation is isolated; a panicking subscriber does not
///   block delivery to the rest of the snapshot
pub struct EventBus {
    /// Identity stamped into handles, so a foreign bus's handle cannot
    /// remove a colliding subscription here
    bus_id: u64,

    /// Subscriber slots for each message type
    subscribers: Arc<DashMap<TypeId, Vec<Slot>>>,

    /// Statistics
    stats: Arc<DashMap<&'static str, BusStats>>,

    /// Monotonic subscription id source
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Default)]
pub struct BusStats {
    pub published: u64,
    pub delivered: u64,
    pub panicked: u64,
}

/// Opaque token for one registered callback, used to cancel the registration
///
/// Release is explicit: call [`EventBus::unsubscribe`] when the owner is torn
/// down. A handle that is never released keeps its callback firing for the
/// lifetime of the bus. Handles are bound to the bus that issued them;
/// presenting one to a different bus is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    bus_id: u64,
    type_id: TypeId,
    id: u64,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            bus_id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
            subscribers: Arc::new(DashMap::new()),
            stats: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register `handler` for message type `M`
    pub fn subscribe<M, F>(&self, handler: F) -> Subscription
    where
        M: Message,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<M>();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let handler: Handler = Arc::new(move |any| {
            if let Some(message) = any.downcast_ref::<M>() {
                handler(message);
            }
        });

        self.subscribers
            .entry(type_id)
            .or_default()
            .push(Slot { id, handler });

        debug!("subscribed {} (id {})", std::any::type_name::<M>(), id);
        Subscription { bus_id: self.bus_id, type_id, id }
    }

    /// Deliver `message` to all current subscribers for its type
    ///
    /// No-op when the type has no subscribers. Handlers run synchronously in
    /// subscription order against a snapshot of the list.
    pub fn publish<M: Message>(&self, message: &M) {
        let type_id = TypeId::of::<M>();
        let message_type = message.message_type();
        self.update_stats(message_type, |stats| stats.published += 1);

        // Clone the handler list and release the map guard before dispatch,
        // so reentrant subscribe/unsubscribe cannot deadlock or corrupt
        // iteration.
        let snapshot: Vec<Handler> = match self.subscribers.get(&type_id) {
            Some(slots) => slots.iter().map(|slot| slot.handler.clone()).collect(),
            None => return,
        };

        for handler in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(message))) {
                Ok(()) => {
                    self.update_stats(message_type, |stats| stats.delivered += 1);
                }
                Err(_) => {
                    warn!("subscriber for {} panicked during dispatch", message_type);
                    self.update_stats(message_type, |stats| stats.panicked += 1);
                }
            }
        }
    }

    /// Remove the registration behind `subscription`
    ///
    /// Idempotent: already-removed handles, and handles issued by a
    /// different bus, are a silent no-op.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        if subscription.bus_id != self.bus_id {
            return;
        }
        if let Some(mut slots) = self.subscribers.get_mut(&subscription.type_id) {
            slots.retain(|slot| slot.id != subscription.id);
        }
    }

    /// Get statistics for one message type identifier
    pub fn stats_for(&self, message_type: &str) -> Option<BusStats> {
        self.stats.get(message_type).map(|stats| stats.clone())
    }

    /// Get statistics for all message types seen so far
    pub fn get_stats(&self) -> Vec<(&'static str, BusStats)> {
        self.stats
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    fn update_stats<F>(&self, message_type: &'static str, f: F)
    where
        F: FnOnce(&mut BusStats),
    {
        f(self
            .stats
            .entry(message_type)
            .or_insert_with(BusStats::default)
            .value_mut());
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            bus_id: self.bus_id,
            subscribers: self.subscribers.clone(),
            stats: self.stats.clone(),
            next_id: self.next_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{NavigationChanged, PiEstimate, PiProgress};
    use std::sync::Mutex;

    fn nav(path: &str) -> NavigationChanged {
        NavigationChanged { path: path.to_string() }
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = seen.clone();
        bus.subscribe(move |_: &NavigationChanged| seen_a.lock().unwrap().push("first"));
        let seen_b = seen.clone();
        bus.subscribe(move |_: &NavigationChanged| seen_b.lock().unwrap().push("second"));

        bus.publish(&nav("/home"));

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_publish_without_subscribers_delivers_nothing() {
        let bus = EventBus::new();
        bus.publish(&PiEstimate { value: 3.14 });

        let stats = bus.stats_for("pi_estimate").unwrap();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[test]
    fn test_distinct_types_do_not_cross() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_progress = seen.clone();
        bus.subscribe(move |message: &PiProgress| {
            seen_progress.lock().unwrap().push(message.index)
        });

        bus.publish(&PiEstimate { value: 3.14 });
        assert!(seen.lock().unwrap().is_empty());

        bus.publish(&PiProgress { index: 7 });
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = seen.clone();
        let sub_a = bus.subscribe(move |_: &NavigationChanged| seen_a.lock().unwrap().push("a"));
        let seen_b = seen.clone();
        bus.subscribe(move |_: &NavigationChanged| seen_b.lock().unwrap().push("b"));

        bus.unsubscribe(&sub_a);
        bus.publish(&nav("/settings"));
        assert_eq!(*seen.lock().unwrap(), vec!["b"]);

        // Removing an already-removed handle must not raise
        bus.unsubscribe(&sub_a);
        bus.publish(&nav("/settings"));
        assert_eq!(*seen.lock().unwrap(), vec!["b", "b"]);
    }

    #[test]
    fn test_handle_from_another_bus_is_noop() {
        let bus_a = EventBus::new();
        let bus_b = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        // Both buses hand out the same numeric slot id here
        let handle_a = bus_a.subscribe(|_: &NavigationChanged| {});
        let seen_b = seen.clone();
        bus_b.subscribe(move |_: &NavigationChanged| seen_b.lock().unwrap().push("b"));

        bus_b.unsubscribe(&handle_a);
        bus_b.publish(&nav("/home"));
        assert_eq!(*seen.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe(|_: &NavigationChanged| panic!("boom"));
        let seen_ok = seen.clone();
        bus.subscribe(move |_: &NavigationChanged| seen_ok.lock().unwrap().push("ok"));

        bus.publish(&nav("/crash"));

        assert_eq!(*seen.lock().unwrap(), vec!["ok"]);
        let stats = bus.stats_for("navigation_changed").unwrap();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.panicked, 1);
    }

    #[test]
    fn test_subscribe_during_dispatch_misses_current_publish() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let reentrant_bus = bus.clone();
        let seen_late = seen.clone();
        bus.subscribe(move |_: &NavigationChanged| {
            let seen_inner = seen_late.clone();
            reentrant_bus.subscribe(move |_: &NavigationChanged| {
                seen_inner.lock().unwrap().push("late")
            });
        });

        // Handler added mid-dispatch is not part of the snapshot
        bus.publish(&nav("/first"));
        assert!(seen.lock().unwrap().is_empty());

        // It fires on the next publish
        bus.publish(&nav("/second"));
        assert_eq!(*seen.lock().unwrap(), vec!["late"]);
    }
}
