//! Event-driven half of the refresh pipeline.
//!
//! The bridge subscribes to the store's external-change notifications,
//! filters them down to the keys a view actually displays, and invokes
//! the view's refresh callback with the changed key. Consumers filter by
//! key prefix; the store delivers every change and relevance is decided
//! here.
//!
//! Teardown is RAII: dropping the bridge drops the underlying bus
//! subscription, so a closed view can never be called back.

use campusq_store::keys::{
    APPOINTMENTS_PREFIX, USER_TOKEN_PREFIX, appointments_key, current_token_key,
    total_tokens_key,
};
use campusq_store::{StoreContext, Subscription};
use tracing::trace;

/// Which storage keys a view cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    /// Counters and bindings of one queue service.
    Queue { service: String },
    /// The booking list of one appointment service.
    Bookings { service: String },
    /// Booking lists of every service (the "my appointments" view).
    AllBookings,
    /// Every key. The coarse fallback the original used on pages that
    /// re-read everything anyway.
    Any,
}

impl Interest {
    /// Interest in one queue's counters and token bindings.
    #[must_use]
    pub fn queue(service: &str) -> Self {
        Self::Queue {
            service: service.to_owned(),
        }
    }

    /// Interest in one service's booking list.
    #[must_use]
    pub fn bookings(service: &str) -> Self {
        Self::Bookings {
            service: service.to_owned(),
        }
    }

    /// Interest in every booking list.
    #[must_use]
    pub fn all_bookings() -> Self {
        Self::AllBookings
    }

    /// Interest in everything.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Whether a change to `key` is relevant.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Queue { service } => {
                key == current_token_key(service)
                    || key == total_tokens_key(service)
                    || key
                        .strip_prefix(USER_TOKEN_PREFIX)
                        .and_then(|rest| rest.strip_prefix(service.as_str()))
                        .is_some_and(|rest| rest.starts_with('_'))
            }
            Self::Bookings { service } => key == appointments_key(service),
            Self::AllBookings => key.starts_with(APPOINTMENTS_PREFIX),
            Self::Any => true,
        }
    }
}

/// Subscribes a refresh callback to relevant external changes.
///
/// Holds the bus subscription; drop to disconnect.
pub struct SyncBridge {
    _sub: Subscription,
    interest: Interest,
}

impl SyncBridge {
    /// Bridge external changes on `ctx` matching `interest` into
    /// `refresh`, which receives the changed key.
    #[must_use = "dropping the bridge disconnects the refresh callback"]
    pub fn new(
        ctx: &StoreContext,
        interest: Interest,
        refresh: impl Fn(&str) + 'static,
    ) -> Self {
        let filter = interest.clone();
        let sub = ctx.on_external_change(move |change| {
            if filter.matches(&change.key) {
                trace!(key = %change.key, "external change triggers refresh");
                refresh(&change.key);
            }
        });
        Self {
            _sub: sub,
            interest,
        }
    }

    /// The interest this bridge filters by.
    #[must_use]
    pub fn interest(&self) -> &Interest {
        &self.interest
    }
}

impl std::fmt::Debug for SyncBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBridge")
            .field("interest", &self.interest)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusq_store::{KeyValueStore, SharedStorage};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn queue_interest_matches_all_three_key_kinds() {
        let interest = Interest::queue("main-gym");
        assert!(interest.matches("currentToken_main-gym"));
        assert!(interest.matches("totalTokens_main-gym"));
        assert!(interest.matches("userToken_main-gym_u-7"));

        assert!(!interest.matches("currentToken_mens-mess-1"));
        assert!(!interest.matches("appointments_main-gym"));
        // Service ids that merely share a prefix must not leak through.
        assert!(!interest.matches("userToken_main-gym-2_u-7"));
    }

    #[test]
    fn booking_interests_match_by_key() {
        assert!(Interest::bookings("hod-cse").matches("appointments_hod-cse"));
        assert!(!Interest::bookings("hod-cse").matches("appointments_proctor-jane"));

        assert!(Interest::all_bookings().matches("appointments_proctor-jane"));
        assert!(!Interest::all_bookings().matches("totalTokens_hod-cse"));

        assert!(Interest::any().matches("anything_at_all"));
    }

    #[test]
    fn bridge_refreshes_on_relevant_external_change_only() {
        let storage = SharedStorage::new();
        let view_tab = storage.open_context();
        let other_tab = storage.open_context();

        let keys = Rc::new(RefCell::new(Vec::new()));
        let k = Rc::clone(&keys);
        let _bridge = SyncBridge::new(
            &view_tab,
            Interest::queue("mens-mess-1"),
            move |key| k.borrow_mut().push(key.to_owned()),
        );

        other_tab.set("currentToken_mens-mess-1", "2").unwrap();
        other_tab.set("appointments_hod-cse", "[]").unwrap();
        other_tab.set("totalTokens_main-gym", "9").unwrap();

        assert_eq!(*keys.borrow(), vec!["currentToken_mens-mess-1".to_string()]);
    }

    #[test]
    fn bridge_ignores_own_context_writes() {
        let storage = SharedStorage::new();
        let view_tab = storage.open_context();

        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let _bridge = SyncBridge::new(&view_tab, Interest::any(), move |_| {
            *c.borrow_mut() += 1;
        });

        view_tab.set("currentToken_mens-mess-1", "1").unwrap();
        assert_eq!(*count.borrow(), 0, "own writes already updated the view");
    }

    #[test]
    fn dropping_the_bridge_disconnects() {
        let storage = SharedStorage::new();
        let view_tab = storage.open_context();
        let other_tab = storage.open_context();

        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let bridge = SyncBridge::new(&view_tab, Interest::any(), move |_| {
            *c.borrow_mut() += 1;
        });

        other_tab.set("k", "1").unwrap();
        assert_eq!(*count.borrow(), 1);

        drop(bridge);
        other_tab.set("k", "2").unwrap();
        assert_eq!(*count.borrow(), 1);
    }
}
