//! Change bus: cross-context storage notifications.
//!
//! Every mutation of a [`SharedStorage`](crate::SharedStorage) publishes a
//! [`StoreChange`] on this bus. Subscribers registered through a
//! [`StoreContext`](crate::StoreContext) see changes made by *other*
//! contexts only, mirroring the browser `storage` event contract.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A mutation that does not change the stored value publishes nothing.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 4. The change carries both the old and new value so consumers can
//!    decide relevance without re-reading.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Identifier for the context that performed a mutation.
pub type ContextId = u64;

/// A single storage mutation, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// The key that changed.
    pub key: String,
    /// Value before the mutation (`None` for a fresh key).
    pub old: Option<String>,
    /// Value after the mutation (`None` for a removal).
    pub new: Option<String>,
    /// The context that made the change.
    pub origin: ContextId,
}

type Callback = Rc<dyn Fn(&StoreChange)>;

#[derive(Default)]
struct BusInner {
    subscribers: RefCell<Vec<(u64, Callback)>>,
    next_id: std::cell::Cell<u64>,
}

/// Publish/subscribe channel for [`StoreChange`] events.
///
/// Single-threaded (`Rc`-based), like the rest of a per-tab context.
#[derive(Clone, Default)]
pub struct ChangeBus {
    inner: Rc<BusInner>,
}

impl ChangeBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every published change.
    ///
    /// The returned [`Subscription`] unsubscribes on drop.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn(&StoreChange) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Deliver `change` to every live subscriber, in registration order.
    pub fn publish(&self, change: &StoreChange) {
        // Snapshot so a callback may subscribe/unsubscribe re-entrantly.
        let snapshot: Vec<Callback> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for cb in snapshot {
            cb(change);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// RAII guard for a bus subscription. Dropping it unsubscribes.
#[must_use = "dropping the subscription immediately unsubscribes"]
pub struct Subscription {
    bus: Weak<BusInner>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
