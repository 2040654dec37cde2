//! In-memory shared storage with per-context handles.
//!
//! [`SharedStorage`] is one origin-wide namespace. Each simulated tab or
//! window opens its own [`StoreContext`] handle; all handles read and
//! write the same map, and every mutation is broadcast on the shared
//! [`ChangeBus`] tagged with the originating context.
//!
//! # Invariants
//!
//! 1. A write is visible to every handle immediately after `set` returns.
//! 2. [`StoreContext::on_external_change`] callbacks never fire for the
//!    handle's own writes, only for other contexts' mutations.
//! 3. Writing a value equal to the stored one publishes no change.
//! 4. With a byte quota configured, a rejected write leaves the map and
//!    the bus untouched.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Quota exceeded | Write pushes byte total over the limit | `Err`, no mutation, no event |
//! | Stale handle | `SharedStorage` dropped | Cannot happen; handles keep it alive |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use tracing::trace;

use crate::events::{ChangeBus, ContextId, StoreChange, Subscription};
use crate::kv::{KeyValueStore, StoreError};

struct StorageInner {
    map: RefCell<AHashMap<String, String>>,
    bus: ChangeBus,
    quota_bytes: Option<usize>,
    next_context: Cell<ContextId>,
}

impl StorageInner {
    /// Total stored bytes (keys + values), the unit the quota is checked in.
    fn used_bytes(&self) -> usize {
        self.map
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

/// One origin-wide key/value namespace shared by every context.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Rc<StorageInner>,
}

impl SharedStorage {
    /// Create an empty namespace with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::with_inner(None)
    }

    /// Create an empty namespace that rejects writes once the summed
    /// length of all keys and values would exceed `limit` bytes.
    ///
    /// Used by tests to provoke [`StoreError::QuotaExceeded`]
    /// deterministically.
    #[must_use]
    pub fn with_quota_bytes(limit: usize) -> Self {
        Self::with_inner(Some(limit))
    }

    fn with_inner(quota_bytes: Option<usize>) -> Self {
        Self {
            inner: Rc::new(StorageInner {
                map: RefCell::new(AHashMap::new()),
                bus: ChangeBus::new(),
                quota_bytes,
                next_context: Cell::new(0),
            }),
        }
    }

    /// Open a new context handle (one per simulated tab/window).
    #[must_use]
    pub fn open_context(&self) -> StoreContext {
        let id = self.inner.next_context.get();
        self.inner.next_context.set(id + 1);
        StoreContext {
            inner: Rc::clone(&self.inner),
            context: id,
        }
    }

    /// The shared change bus, for consumers that want every event
    /// regardless of origin.
    #[must_use]
    pub fn bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.map.borrow().len()
    }

    /// Whether the namespace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.map.borrow().is_empty()
    }
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStorage")
            .field("keys", &self.len())
            .field("quota_bytes", &self.inner.quota_bytes)
            .finish()
    }
}

/// A per-context handle onto a [`SharedStorage`].
///
/// Implements [`KeyValueStore`]. Mutations publish on the shared bus;
/// [`Self::on_external_change`] filters the bus down to other contexts'
/// writes, mirroring the browser `storage` event.
#[derive(Clone)]
pub struct StoreContext {
    inner: Rc<StorageInner>,
    context: ContextId,
}

impl StoreContext {
    /// This handle's context id.
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context
    }

    /// Subscribe to changes made by *other* contexts.
    ///
    /// The callback never fires for this handle's own writes. Dropping
    /// the returned [`Subscription`] unsubscribes.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn on_external_change(
        &self,
        callback: impl Fn(&StoreChange) + 'static,
    ) -> Subscription {
        let own = self.context;
        self.inner.bus.subscribe(move |change| {
            if change.origin != own {
                callback(change);
            }
        })
    }

    fn publish(&self, key: &str, old: Option<String>, new: Option<String>) {
        self.inner.bus.publish(&StoreChange {
            key: key.to_owned(),
            old,
            new,
            origin: self.context,
        });
    }
}

impl KeyValueStore for StoreContext {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let old = self.get(key);
        if old.as_deref() == Some(value) {
            return Ok(());
        }
        if let Some(limit) = self.inner.quota_bytes {
            let freed = old.as_ref().map_or(0, |v| key.len() + v.len());
            let added = key.len() + value.len();
            if self.inner.used_bytes() - freed + added > limit {
                return Err(StoreError::QuotaExceeded { key: key.to_owned() });
            }
        }
        self.inner
            .map
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        trace!(context = self.context, key, value, "store set");
        self.publish(key, old, Some(value.to_owned()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let old = self.inner.map.borrow_mut().remove(key);
        if let Some(old) = old {
            trace!(context = self.context, key, "store remove");
            self.publish(key, Some(old), None);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.map.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("context", &self.context)
            .finish()
    }
}
