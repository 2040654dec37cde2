//! The key-value store contract and its error type.
//!
//! # Invariants
//!
//! 1. `get` after a successful `set` for the same key returns the written
//!    value until the next `set`/`remove` for that key.
//! 2. A failed `set` leaves the store unchanged; the write simply did
//!    not happen, and callers must not assume success silently.
//! 3. `remove` of an absent key is a no-op, not an error.
//! 4. A key-format mismatch reads as "no data" (`None`), never an error.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Quota exhausted | Store full | `Err(StoreError::QuotaExceeded)`, write dropped |
//! | Missing key | Never written / removed | `get` returns `None` |

/// Errors from store mutations.
///
/// Reads never fail; only `set`/`remove` can return an error, and the
/// only expected cause is quota exhaustion. The mutation is dropped and
/// callers should re-read rather than trust optimistic local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write would exceed the storage quota. The store is unchanged.
    QuotaExceeded {
        /// The key whose write was rejected.
        key: String,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded { key } => {
                write!(f, "storage quota exceeded writing key '{key}'")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// String key/value storage shared by all contexts of one origin.
///
/// Implementations persist across reloads until explicitly cleared. All
/// operations are synchronous with respect to the local context.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key` and its value. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently present, in sorted order.
    ///
    /// The booking model scans the whole namespace by key prefix, so
    /// enumeration is part of the store contract.
    fn keys(&self) -> Vec<String>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}
