#![forbid(unsafe_code)]

//! Refresh plumbing between the shared store and a view's models.
//!
//! A view holding queue or booking models goes stale in two ways: another
//! context mutates the store (covered by [`SyncBridge`], event-driven),
//! or a mutation happens somewhere the change bus cannot see, which for
//! the original browser deployment meant the same tab, where the
//! `storage` event never fires for local views of *other* pages. The
//! [`PollTicker`] covers that with a fixed-period re-read.
//!
//! The two triggers are independent and feed one refresh callback
//! through [`RefreshDriver`]; either can be left out, which is how tests
//! exercise them in isolation.

pub mod bridge;
pub mod poll;

pub use bridge::{Interest, SyncBridge};
pub use poll::{DEFAULT_POLL_PERIOD, PollTicker};

use web_time::Instant;

use campusq_store::StoreContext;

/// Why a refresh is being requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshReason {
    /// Another context changed a relevant key.
    ExternalChange { key: String },
    /// The poll period elapsed.
    Poll,
}

/// Event and poll triggers merged into one refresh callback.
///
/// Owns the bridge subscription; dropping the driver tears everything
/// down. The poll side is pumped manually: the embedding event loop
/// calls [`Self::pump`] with its notion of "now", the same way the
/// original ran a timer alongside the storage listener.
pub struct RefreshDriver {
    bridge: Option<SyncBridge>,
    ticker: Option<PollTicker>,
    refresh: std::rc::Rc<dyn Fn(&RefreshReason)>,
}

impl RefreshDriver {
    /// A driver with neither trigger; combine with [`Self::with_bridge`]
    /// and [`Self::with_poll`].
    #[must_use]
    pub fn new(refresh: impl Fn(&RefreshReason) + 'static) -> Self {
        Self {
            bridge: None,
            ticker: None,
            refresh: std::rc::Rc::new(refresh),
        }
    }

    /// Add the event-driven trigger: external changes matching
    /// `interest` on `ctx` invoke the refresh callback.
    #[must_use]
    pub fn with_bridge(mut self, ctx: &StoreContext, interest: Interest) -> Self {
        let refresh = std::rc::Rc::clone(&self.refresh);
        self.bridge = Some(SyncBridge::new(ctx, interest, move |key| {
            refresh(&RefreshReason::ExternalChange { key: key.to_owned() });
        }));
        self
    }

    /// Add the polling trigger with the given period.
    #[must_use]
    pub fn with_poll(mut self, ticker: PollTicker) -> Self {
        self.ticker = Some(ticker);
        self
    }

    /// Run the poll trigger if its period has elapsed. Returns whether a
    /// refresh was requested.
    pub fn pump(&self, now: Instant) -> bool {
        match &self.ticker {
            Some(ticker) if ticker.tick(now) => {
                (self.refresh)(&RefreshReason::Poll);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for RefreshDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshDriver")
            .field("bridged", &self.bridge.is_some())
            .field("polled", &self.ticker.is_some())
            .finish()
    }
}
