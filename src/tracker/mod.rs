//! Per-digest advertisement counters.
//!
//! - [`ProvideTracker`]: the lock-guarded table, exposing only `apply`, `snapshot` and `count`
//! - [`ApplyOutcome`]: counters after one applied event (drives the progress line)
//! - [`Snapshot`]: consistent read-only view consumed by the reporter

mod snapshot;
mod table;

pub use snapshot::{Snapshot, Unadvertised};
pub use table::{ApplyOutcome, ProvideTracker};
