//! Fixed-period polling, the fallback half of the refresh pipeline.
//!
//! The change bus only covers *other* contexts; a view that shares its
//! context with another view (the original's admin page and user page
//! open in one tab) sees no event for local writes. A short fixed-period
//! re-read papers over that. No backoff, no jitter; the period is a few
//! seconds and the reads are cheap.
//!
//! The ticker is passive: it never owns a thread or timer. The embedding
//! loop asks [`PollTicker::tick`] with its current instant, which keeps
//! tests deterministic (feed synthetic instants) and leaves scheduling
//! to whoever already has a loop.

use std::cell::Cell;
use std::time::Duration;

use web_time::Instant;

/// The poll period the original deployment used.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(3);

/// Due-checker for a fixed-period poll.
#[derive(Debug)]
pub struct PollTicker {
    period: Duration,
    next_due: Cell<Instant>,
}

impl PollTicker {
    /// A ticker with the given period, first due one period from now.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self::starting_at(period, Instant::now())
    }

    /// A ticker whose clock starts at `start` (for deterministic tests).
    #[must_use]
    pub fn starting_at(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_due: Cell::new(start + period),
        }
    }

    /// A ticker with [`DEFAULT_POLL_PERIOD`].
    #[must_use]
    pub fn default_period() -> Self {
        Self::new(DEFAULT_POLL_PERIOD)
    }

    /// The configured period.
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the period has elapsed. When due, re-arms for one period
    /// after `now` (periods do not accumulate while unpumped; a stalled
    /// loop triggers one refresh, not a burst).
    pub fn tick(&self, now: Instant) -> bool {
        if now >= self.next_due.get() {
            self.next_due.set(now + self.period);
            true
        } else {
            false
        }
    }
}
