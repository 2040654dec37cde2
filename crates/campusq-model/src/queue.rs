//! Per-service token counters and user token bindings.
//!
//! A queue is two persisted counters plus one binding per waiting user:
//!
//! - `current` — the token being served right now,
//! - `total` — the highest token ever issued (`total + 1` is the next
//!   token to hand out),
//! - `userToken_{service}_{user}` — the waiting user's own token.
//!
//! Queue state is created implicitly on first read (both counters
//! default to 0) and never deleted; it survives until the storage is
//! cleared.
//!
//! # Invariants
//!
//! 1. `current <= total` after every operation. The trailing-token
//!    reclaim in [`QueueModel::leave_queue`] is clamped so it cannot
//!    drag `total` below `current`.
//! 2. At most one active binding per (service, user): a user must leave
//!    before taking a fresh token.
//! 3. `current` only moves forward, and only via
//!    [`QueueModel::serve_next`].
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Take while queued | Binding already present | `Err(AlreadyQueued)` |
//! | Take while closed | Service closed/unknown | `Err(ServiceClosed)` |
//! | Leave without binding | Never joined / already left | `Err(NotQueued)` |
//! | Serve on empty queue | `current >= total` | `Err(QueueEmpty)` |
//! | Quota exhausted | Store full | `Err(Storage)`, re-read before retrying |
//! | Concurrent take in two tabs | Read-then-write race | Duplicate token numbers; not detected |
//!
//! The duplicate-token race is inherited from the storage layer, which
//! has no atomic increment. It is documented, not handled.

use campusq_store::keys::{current_token_key, total_tokens_key, user_token_key};
use campusq_store::{KeyValueStore, StoreError};
use tracing::debug;

use crate::service::Directory;

/// A queue token number. Token 0 is never issued; it is the "nothing
/// served yet" value of the `current` counter.
pub type Token = u32;

/// Fixed per-person service-time estimate, in minutes. A simplification,
/// not a measured average.
pub const MINUTES_PER_PERSON: u32 = 2;

/// Snapshot of the two per-service counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    /// Token presently being served (0 before the first serve).
    pub current: Token,
    /// Highest token ever issued.
    pub total: Token,
}

impl QueueStatus {
    /// Number of tokens issued but not yet served.
    #[must_use]
    pub fn waiting(&self) -> u32 {
        self.total.saturating_sub(self.current)
    }
}

/// A waiting user's derived position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePosition {
    /// Tokens between the user and the service window.
    pub people_ahead: u32,
    /// `people_ahead * MINUTES_PER_PERSON`.
    pub estimated_wait_minutes: u32,
}

/// Expected rejections and storage faults from queue operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The user already holds a token; leave before rejoining.
    AlreadyQueued { service: String, token: Token },
    /// The service is closed (or unknown) and issues no new tokens.
    ServiceClosed { service: String },
    /// The user has no active token binding.
    NotQueued { service: String },
    /// Nothing left to serve: `current >= total`.
    QueueEmpty { service: String },
    /// The underlying write failed; persisted state is unchanged.
    Storage(StoreError),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyQueued { service, token } => {
                write!(f, "already holding token #{token} for '{service}'")
            }
            Self::ServiceClosed { service } => {
                write!(f, "service '{service}' is not accepting tokens")
            }
            Self::NotQueued { service } => {
                write!(f, "no active token for '{service}'")
            }
            Self::QueueEmpty { service } => {
                write!(f, "queue for '{service}' has no waiting tokens")
            }
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for QueueError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err)
    }
}

/// Token counter model for one service.
///
/// Holds an injected store handle; user identity is passed per call so
/// one model instance serves both the user view and the admin view.
///
/// # Example
///
/// ```
/// use campusq_model::{Directory, QueueModel};
/// use campusq_store::SharedStorage;
///
/// let storage = SharedStorage::new();
/// let queue = QueueModel::new(storage.open_context(), Directory::campus(), "mens-mess-1");
///
/// let token = queue.take_token("student-1").unwrap();
/// assert_eq!(token, 1);
/// assert_eq!(queue.status().total, 1);
/// ```
#[derive(Debug, Clone)]
pub struct QueueModel<S> {
    pub(crate) store: S,
    directory: Directory,
    service: String,
}

impl<S: KeyValueStore> QueueModel<S> {
    /// Create a model over `store` for the service named `service_id`.
    #[must_use]
    pub fn new(store: S, directory: Directory, service_id: &str) -> Self {
        Self {
            store,
            directory,
            service: service_id.to_owned(),
        }
    }

    /// The service this model reads and writes.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service
    }

    /// Read both counters. Never fails: absent or unparseable values
    /// read as defaults (`total` falls back to `current`, `current` to 0).
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        let current = self
            .read_counter(&current_token_key(&self.service))
            .unwrap_or(0);
        let total = self
            .read_counter(&total_tokens_key(&self.service))
            .unwrap_or(current);
        QueueStatus { current, total }
    }

    /// The user's active token binding, if any.
    #[must_use]
    pub fn user_token(&self, user: &str) -> Option<Token> {
        self.read_counter(&user_token_key(&self.service, user))
    }

    /// Issue the next token to `user`.
    ///
    /// Rejects users who already hold a token and services that are not
    /// open. The `total` read and write are not atomic across contexts;
    /// two tabs taking tokens concurrently can be issued the same number.
    pub fn take_token(&self, user: &str) -> Result<Token, QueueError> {
        if let Some(token) = self.user_token(user) {
            return Err(QueueError::AlreadyQueued {
                service: self.service.clone(),
                token,
            });
        }
        if !self.directory.is_open(&self.service) {
            return Err(QueueError::ServiceClosed {
                service: self.service.clone(),
            });
        }

        let token = self.status().total + 1;
        self.store
            .set(&total_tokens_key(&self.service), &token.to_string())?;
        self.store.set(
            &user_token_key(&self.service, user),
            &token.to_string(),
        )?;
        debug!(service = %self.service, user, token, "token issued");
        Ok(token)
    }

    /// Drop `user`'s token binding.
    ///
    /// When the departing token is the most recently issued one, `total`
    /// is decremented to reclaim the unused trailing slot. The reclaim is
    /// best-effort only: a user leaving from the middle of the queue
    /// leaves `total` unchanged, so their number is simply skipped when
    /// served. The decrement is clamped at `current` so the counter
    /// invariant survives a user who leaves after being served.
    pub fn leave_queue(&self, user: &str) -> Result<(), QueueError> {
        let Some(token) = self.user_token(user) else {
            return Err(QueueError::NotQueued {
                service: self.service.clone(),
            });
        };

        let status = self.status();
        if token == status.total && status.total > status.current {
            self.store.set(
                &total_tokens_key(&self.service),
                &(status.total - 1).to_string(),
            )?;
        }
        self.store.remove(&user_token_key(&self.service, user))?;
        debug!(service = %self.service, user, token, "left queue");
        Ok(())
    }

    /// Advance the served counter by one (admin action).
    ///
    /// Returns the token now being served, or `QueueEmpty` when every
    /// issued token has already been served.
    pub fn serve_next(&self) -> Result<Token, QueueError> {
        let status = self.status();
        if status.current >= status.total {
            return Err(QueueError::QueueEmpty {
                service: self.service.clone(),
            });
        }
        let next = status.current + 1;
        self.store
            .set(&current_token_key(&self.service), &next.to_string())?;
        debug!(service = %self.service, token = next, "serving next token");
        Ok(next)
    }

    /// The user's place in line, or `None` without an active binding.
    #[must_use]
    pub fn my_position(&self, user: &str) -> Option<QueuePosition> {
        let token = self.user_token(user)?;
        let current = self.status().current;
        // max(0, token - current - 1): people still queued ahead.
        let people_ahead = token.saturating_sub(current.saturating_add(1));
        Some(QueuePosition {
            people_ahead,
            estimated_wait_minutes: people_ahead * MINUTES_PER_PERSON,
        })
    }

    /// Whether the user's token has been reached.
    ///
    /// Deliberately stays `true` forever once served: the UI uses it as a
    /// terminal "served" display state, not a one-shot edge. The one-shot
    /// behavior lives in [`TurnWatcher`](crate::notify::TurnWatcher).
    #[must_use]
    pub fn is_my_turn(&self, user: &str) -> bool {
        self.user_token(user)
            .is_some_and(|token| token <= self.status().current)
    }

    /// The next `limit` token numbers awaiting service, for the admin
    /// "upcoming" strip.
    #[must_use]
    pub fn upcoming_tokens(&self, limit: usize) -> Vec<Token> {
        let status = self.status();
        (status.current + 1..=status.total).take(limit).collect()
    }

    fn read_counter(&self, key: &str) -> Option<Token> {
        self.store.get(key)?.trim().parse().ok()
    }
}
