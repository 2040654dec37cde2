#![forbid(unsafe_code)]

//! Queue and booking state models for CampusQ.
//!
//! Everything here operates on a [`KeyValueStore`](campusq_store::KeyValueStore)
//! handle injected at construction (never a global), so tests substitute
//! an in-memory store and multiple "tabs" are just multiple handles onto
//! the same [`SharedStorage`](campusq_store::SharedStorage).
//!
//! # Consistency model
//!
//! The store has no transactions and no compare-and-swap. Every mutation
//! in this crate is a read-then-write sequence, so two contexts acting
//! between the read and the write can race: two tabs can issue the same
//! token number, and two students can book the same slot. The original
//! system accepts this (single browser, advisory counters); this crate
//! keeps the semantics and documents the gap instead of silently fixing
//! it. A server-mediated atomic increment would be the real fix.

pub mod booking;
pub mod notify;
pub mod queue;
pub mod service;

pub use booking::{
    BookingError, BookingModel, BookingRecord, BookingSummary, SlotTime, my_bookings,
    seed_demo_bookings,
};
pub use notify::{AlertSink, TurnAlert, TurnWatcher};
pub use queue::{QueueError, QueueModel, QueuePosition, QueueStatus, Token};
pub use service::{Directory, Service, ServiceKind, ServiceStatus};
