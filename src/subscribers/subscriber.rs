//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom handlers into a run.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use provwatch::{Event, EventKind, Subscribe};
//!
//! struct NewKeys;
//!
//! #[async_trait]
//! impl Subscribe for NewKeys {
//!     async fn on_event(&self, ev: &Event) {
//!         if let (EventKind::ProvideApplied, Some(p)) = (ev.kind, &ev.progress) {
//!             if p.new > 0 {
//!                 // push to a dashboard, etc.
//!             }
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "new-keys" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for run observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this subscriber's queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
