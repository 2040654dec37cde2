//! One-shot "it's your turn" alerts.
//!
//! [`QueueModel::is_my_turn`](crate::QueueModel::is_my_turn) is a level,
//! not an edge: it stays true forever once the user's token is reached.
//! [`TurnWatcher`] turns that level into a single alert per token
//! binding: fired on the false-to-true transition, latched until the user
//! takes a fresh token (or the watcher is rebuilt, which is what a view
//! remount does).
//!
//! Alerts are gated by the `notification_permission` key: anything other
//! than the exact value `"granted"` suppresses delivery without setting
//! the latch, so a later grant still gets the alert.

use std::cell::Cell;

use campusq_store::KeyValueStore;
use campusq_store::keys::NOTIFICATION_PERMISSION_KEY;
use tracing::debug;

use crate::queue::{QueueModel, Token};

/// Payload handed to the alert sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnAlert {
    pub service_id: String,
    /// The user's token, now being served.
    pub token: Token,
}

/// Delivery target for turn alerts. The UI layer adapts this to its
/// notification mechanism; tests capture alerts in a `Vec`.
pub trait AlertSink {
    fn notify(&self, alert: &TurnAlert);
}

impl<F: Fn(&TurnAlert)> AlertSink for F {
    fn notify(&self, alert: &TurnAlert) {
        self(alert);
    }
}

/// Latched edge detector over one user's turn state.
pub struct TurnWatcher<S> {
    model: QueueModel<S>,
    user: String,
    notified_for: Cell<Option<Token>>,
}

impl<S: KeyValueStore> TurnWatcher<S> {
    /// Watch `user`'s turn on the given queue. The latch starts clear.
    #[must_use]
    pub fn new(model: QueueModel<S>, user: &str) -> Self {
        Self {
            model,
            user: user.to_owned(),
            notified_for: Cell::new(None),
        }
    }

    /// Re-evaluate turn state, delivering at most one alert per token.
    ///
    /// Call after every refresh (external change or poll). Returns
    /// whether an alert was delivered on this call.
    pub fn check(&self, sink: &dyn AlertSink) -> bool {
        let Some(token) = self.model.user_token(&self.user) else {
            // Binding gone (left queue / logged out): clear the latch so
            // a future token alerts again.
            self.notified_for.set(None);
            return false;
        };
        if self.notified_for.get() == Some(token) {
            return false;
        }
        if !self.model.is_my_turn(&self.user) {
            return false;
        }
        if !self.permission_granted() {
            // Keep the latch clear: granting permission later should
            // still deliver the pending alert.
            return false;
        }

        let alert = TurnAlert {
            service_id: self.model.service_id().to_owned(),
            token,
        };
        sink.notify(&alert);
        self.notified_for.set(Some(token));
        debug!(service = %alert.service_id, token, "turn alert delivered");
        true
    }

    /// Clear the latch, as a view remount does.
    pub fn reset(&self) {
        self.notified_for.set(None);
    }

    fn permission_granted(&self) -> bool {
        self.model
            .store
            .get(NOTIFICATION_PERMISSION_KEY)
            .is_some_and(|v| v == "granted")
    }
}

impl<S> std::fmt::Debug for TurnWatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnWatcher")
            .field("user", &self.user)
            .field("notified_for", &self.notified_for.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Directory;
    use campusq_store::{KeyValueStore, SharedStorage, StoreContext};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Fixture {
        storage: SharedStorage,
        queue: QueueModel<StoreContext>,
        watcher: TurnWatcher<StoreContext>,
        alerts: Rc<RefCell<Vec<TurnAlert>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = SharedStorage::new();
            let tab = storage.open_context();
            tab.set(NOTIFICATION_PERMISSION_KEY, "granted").unwrap();
            let queue =
                QueueModel::new(tab.clone(), Directory::campus(), "mens-mess-1");
            let watcher = TurnWatcher::new(queue.clone(), "u1");
            Self {
                storage,
                queue,
                watcher,
                alerts: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn check(&self) -> bool {
            let alerts = Rc::clone(&self.alerts);
            self.watcher
                .check(&move |a: &TurnAlert| alerts.borrow_mut().push(a.clone()))
        }
    }

    #[test]
    fn no_alert_before_turn() {
        let fx = Fixture::new();
        fx.queue.take_token("u1").unwrap();
        assert!(!fx.check());
        assert!(fx.alerts.borrow().is_empty());
    }

    #[test]
    fn alert_fires_once_when_turn_arrives() {
        let fx = Fixture::new();
        fx.queue.take_token("u1").unwrap();
        fx.queue.serve_next().unwrap();

        assert!(fx.check());
        assert!(!fx.check(), "latched: second check must not re-fire");
        assert!(!fx.check());

        let alerts = fx.alerts.borrow();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0],
            TurnAlert {
                service_id: "mens-mess-1".into(),
                token: 1,
            }
        );
    }

    #[test]
    fn no_alert_without_binding() {
        let fx = Fixture::new();
        assert!(!fx.check());
    }

    #[test]
    fn permission_gate_defers_without_latching() {
        let fx = Fixture::new();
        let tab = fx.storage.open_context();
        tab.set(NOTIFICATION_PERMISSION_KEY, "denied").unwrap();

        fx.queue.take_token("u1").unwrap();
        fx.queue.serve_next().unwrap();
        assert!(!fx.check(), "denied permission suppresses delivery");

        // Granting later still delivers the pending alert.
        tab.set(NOTIFICATION_PERMISSION_KEY, "granted").unwrap();
        assert!(fx.check());
        assert_eq!(fx.alerts.borrow().len(), 1);
    }

    #[test]
    fn fresh_token_rearms_the_latch() {
        let fx = Fixture::new();
        fx.queue.take_token("u1").unwrap();
        fx.queue.serve_next().unwrap();
        assert!(fx.check());

        fx.queue.leave_queue("u1").unwrap();
        assert!(!fx.check(), "no binding, no alert");

        fx.queue.take_token("u1").unwrap();
        assert!(!fx.check(), "new token not yet served");
        fx.queue.serve_next().unwrap();
        assert!(fx.check(), "new binding alerts again");
        assert_eq!(fx.alerts.borrow().len(), 2);
    }

    #[test]
    fn reset_mimics_view_remount() {
        let fx = Fixture::new();
        fx.queue.take_token("u1").unwrap();
        fx.queue.serve_next().unwrap();
        assert!(fx.check());

        fx.watcher.reset();
        assert!(fx.check(), "remounted view re-fires for the same token");
    }
}
