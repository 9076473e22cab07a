//! # Event subscribers for a monitoring run.
//!
//! ```text
//! publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                              │
//!                                    ┌─────────┴─────────┐
//!                                    ▼                   ▼
//!                                LogWriter            Custom ...
//! ```
//!
//! - [`Subscribe`]: trait for custom handlers
//! - [`SubscriberSet`]: per-subscriber queues and workers
//! - [`LogWriter`]: built-in handler that renders events through `tracing`

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
