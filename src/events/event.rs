//! # Lifecycle events emitted by the supervisor.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (service name, retry count, backoff delay, free-form reason). Each event
//! gets a globally unique, monotonically increasing sequence number so
//! subscribers can restore order when delivery interleaves.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use servisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_service("worker")
//!     .with_retries(2)
//!     .with_delay(Duration::from_millis(500));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.service.as_deref(), Some("worker"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervisor lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An instance is about to launch (first launch or relaunch).
    ///
    /// Sets: `service`, `retries`.
    ServiceStarting,

    /// An instance exited with a success status.
    ///
    /// Sets: `service`, `retries`.
    ServiceStopped,

    /// An instance exited with a failure status.
    ///
    /// Sets: `service`, `retries`.
    ServiceFailed,

    /// A failed instance was scheduled for a delayed relaunch.
    ///
    /// Sets: `service`, `retries`, `delay_ms`.
    BackoffScheduled,

    /// A formation-wide restart was requested through the notifier.
    RestartRequested,

    /// A stop sequence began; no relaunches happen afterwards.
    ///
    /// Sets: `reason` (the signal label).
    StopRequested,

    /// A formation entry asked for more instances than the service's limit;
    /// the count was clamped.
    ///
    /// Sets: `service`, `reason`.
    LimitClamped,
}

/// One lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - remaining fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the service, if applicable.
    pub service: Option<Arc<str>>,
    /// Launch count of the instance (1-based; counts relaunches).
    pub retries: Option<u32>,
    /// Backoff delay before the relaunch, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Human-readable reason (signal label, clamp detail, error text).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind with the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            retries: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches the instance's launch count.
    #[inline]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self.kind {
            EventKind::ServiceStarting => "starting",
            EventKind::ServiceStopped => "stopped",
            EventKind::ServiceFailed => "failed",
            EventKind::BackoffScheduled => "backoff",
            EventKind::RestartRequested => "restart-requested",
            EventKind::StopRequested => "stop-requested",
            EventKind::LimitClamped => "limit-clamped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::ServiceStarting);
        let b = Event::new(EventKind::ServiceStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_attach_metadata() {
        let ev = Event::new(EventKind::BackoffScheduled)
            .with_service("worker")
            .with_retries(3)
            .with_delay(Duration::from_millis(1500))
            .with_reason("crash loop");
        assert_eq!(ev.service.as_deref(), Some("worker"));
        assert_eq!(ev.retries, Some(3));
        assert_eq!(ev.delay_ms, Some(1500));
        assert_eq!(ev.reason.as_deref(), Some("crash loop"));
        assert_eq!(ev.as_label(), "backoff");
    }
}
