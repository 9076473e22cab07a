//! # Lifecycle events emitted by a monitoring run.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: state machine transitions and readiness
//! - **Pipeline events**: advertisement events applied to the tracker, scan failures
//! - **Shutdown events**: shutdown request and how the node exited
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the new
//! run state, a reason, or the progress counters of an applied advertisement.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use provwatch::{Event, EventKind, RunState};
//!
//! let ev = Event::new(EventKind::StateChanged).with_state(RunState::Monitoring);
//!
//! assert_eq!(ev.kind, EventKind::StateChanged);
//! assert_eq!(ev.state, Some(RunState::Monitoring));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::RunState;
use crate::tracker::ApplyOutcome;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Run events ===
    /// The run state machine moved to a new state.
    ///
    /// Sets:
    /// - `state`: the state entered
    StateChanged,

    /// The readiness marker was seen on the control stream.
    NodeReady,

    // === Pipeline events ===
    /// One advertisement event was applied to the tracker.
    ///
    /// Sets:
    /// - `progress`: counters after the event
    /// - `reason`: the event's prefix
    ProvideApplied,

    /// A stream scan stopped on an error (e.g. a line over capacity).
    ///
    /// Sets:
    /// - `source`: stream name
    /// - `reason`: error message
    ScanFailed,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// Node exited within the grace period after SIGTERM.
    ///
    /// Sets:
    /// - `grace_ms`: configured grace period
    NodeExited,

    /// Grace period exceeded; node was killed.
    ///
    /// Sets:
    /// - `grace_ms`: configured grace period
    NodeKilled,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// State entered (only for `StateChanged`).
    pub state: Option<RunState>,
    /// Human-readable reason (errors, prefixes, overflow details).
    pub reason: Option<Arc<str>>,
    /// Name of the emitting component, if applicable.
    pub source: Option<Arc<str>>,
    /// Tracker counters after an applied advertisement.
    pub progress: Option<ApplyOutcome>,
    /// Shutdown grace period in milliseconds (compact).
    pub grace_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            state: None,
            reason: None,
            source: None,
            progress: None,
            grace_ms: None,
        }
    }

    /// Attaches the state entered.
    #[inline]
    pub fn with_state(mut self, state: RunState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the emitting component name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches tracker counters.
    #[inline]
    pub fn with_progress(mut self, progress: ApplyOutcome) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attaches a grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Creates a state transition event.
    #[inline]
    pub fn state_changed(state: RunState) -> Self {
        Event::new(EventKind::StateChanged).with_state(state)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::NodeReady);
        let b = Event::new(EventKind::NodeReady);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn grace_is_stored_in_millis_and_saturates() {
        let ev = Event::new(EventKind::NodeKilled).with_grace(Duration::from_secs(15));
        assert_eq!(ev.grace_ms, Some(15_000));

        let ev = Event::new(EventKind::NodeKilled).with_grace(Duration::from_secs(u64::MAX));
        assert_eq!(ev.grace_ms, Some(u32::MAX));
    }

    #[test]
    fn overflow_event_carries_subscriber_name() {
        let ev = Event::subscriber_overflow("log", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.source.as_deref(), Some("log"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
    }
}
