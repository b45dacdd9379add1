//! Explicit cancellation plumbing.
//!
//! The system this gateway replaces relies on implicit cooperative
//! cancellation. We pass an explicit token through every call that may
//! suspend, and require collaborators to honor it: a deadline instant plus
//! a cooperative cancel flag, checked at each suspension point rather than
//! relying on a `select!` race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A deadline plus a cooperative cancellation signal, threaded through
/// every pipeline stage call that may suspend on I/O.
#[derive(Clone, Debug)]
pub struct Deadline {
    expires_at: Instant,
    cancelled: Arc<AtomicBool>,
}

impl Deadline {
    /// Construct a deadline `timeout` from now, not yet cancelled.
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now() + timeout,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Construct a deadline that never expires and is never cancelled.
    /// Intended for tests and offline tooling, not for request handling.
    pub fn unbounded() -> Self {
        Self::after(Duration::from_secs(u64::MAX / 2))
    }

    /// Time remaining until expiry, zero if already past.
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// True once an external caller has requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True if either the deadline has passed or cancellation was
    /// requested. Collaborators should check this at every suspension
    /// point before starting new I/O.
    pub fn should_stop(&self) -> bool {
        self.is_expired() || self.is_cancelled()
    }

    /// A clonable handle a caller can use to cancel this deadline from
    /// another task (e.g. a client disconnect).
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: self.cancelled.clone(),
        }
    }
}

/// A handle that can cancel its originating [`Deadline`] from elsewhere.
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fresh_deadline_is_not_expired_or_cancelled() {
        let d = Deadline::after(Duration::from_secs(5));
        assert!(!d.is_expired());
        assert!(!d.is_cancelled());
        assert!(!d.should_stop());
    }

    #[test]
    fn cancel_handle_propagates_to_deadline() {
        let d = Deadline::after(Duration::from_secs(5));
        let handle = d.cancel_handle();
        assert!(!d.is_cancelled());
        handle.cancel();
        assert!(d.is_cancelled());
        assert!(d.should_stop());
    }

    #[tokio::test]
    async fn expired_deadline_reports_should_stop() {
        let d = Deadline::after(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(d.is_expired());
        assert!(d.should_stop());
    }
}
