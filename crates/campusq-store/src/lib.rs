#![forbid(unsafe_code)]

//! Shared key-value storage for CampusQ.
//!
//! This crate models a per-origin string key/value namespace shared by
//! multiple execution contexts (browser tabs, in the original deployment).
//! Each context gets its own [`StoreContext`] handle onto one
//! [`SharedStorage`]; writes are immediately visible to every handle, and
//! a change notification is delivered to every *other* context via the
//! internal change bus.
//!
//! There is no locking or compare-and-swap: read-then-write sequences in
//! higher layers race when two contexts interleave. That limitation is
//! part of the contract, not an oversight; see the model crate docs.

pub mod events;
pub mod keys;
pub mod kv;
pub mod memory;

pub use events::{ChangeBus, ContextId, StoreChange, Subscription};
pub use kv::{KeyValueStore, StoreError};
pub use memory::{SharedStorage, StoreContext};
