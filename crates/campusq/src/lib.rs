#![forbid(unsafe_code)]

//! CampusQ: virtual queues and appointment booking over a shared
//! key-value store.
//!
//! This facade re-exports the three layers:
//!
//! - [`store`] — the shared namespace, per-context handles, change bus;
//! - [`model`] — queue counters, token bindings, slot bookings, turn
//!   alerts;
//! - [`sync`] — event-driven and polling refresh triggers.
//!
//! # Quick start
//!
//! ```
//! use campusq::prelude::*;
//!
//! let storage = SharedStorage::new();
//! let queue = QueueModel::new(storage.open_context(), Directory::campus(), "mens-mess-1");
//!
//! let token = queue.take_token("student-1").unwrap();
//! assert_eq!(token, 1);
//!
//! // The admin view runs in its own context on the same storage.
//! let admin = QueueModel::new(storage.open_context(), Directory::campus(), "mens-mess-1");
//! admin.serve_next().unwrap();
//! assert!(queue.is_my_turn("student-1"));
//! ```

pub use campusq_model as model;
pub use campusq_store as store;
pub use campusq_sync as sync;

/// The types almost every consumer touches.
pub mod prelude {
    pub use campusq_model::{
        AlertSink, BookingError, BookingModel, BookingRecord, BookingSummary, Directory,
        QueueError, QueueModel, QueuePosition, QueueStatus, Service, ServiceKind,
        ServiceStatus, SlotTime, Token, TurnAlert, TurnWatcher, my_bookings,
        seed_demo_bookings,
    };
    pub use campusq_store::{
        KeyValueStore, SharedStorage, StoreChange, StoreContext, StoreError, Subscription,
    };
    pub use campusq_sync::{Interest, PollTicker, RefreshDriver, RefreshReason, SyncBridge};
}
