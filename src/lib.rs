//! # provwatch
//!
//! **provwatch** observes how completely and how often a content node
//! advertises its records into the DHT.
//!
//! It prepares a fresh node repository, publishes a directory of content,
//! starts the node daemon with verbose DHT logging and counts, per tracked
//! content digest, how many advertisement events carried it. A status report
//! is printed periodically until the monitor is interrupted.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌───────────────┐   ┌───────────────┐
//!     │  node::       │   │  node::       │
//!     │  bootstrap    │──►│  ingest       │──► ProvideTracker::from_ids
//!     └───────────────┘   └───────────────┘          │
//!                                                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  RunController (run lifecycle)                                    │
//! │  - Bus (broadcast events)                                         │
//! │  - NodeProcess (SIGTERM → grace → kill, once)                     │
//! │  - SubscriberSet (fans out to subscribers)                        │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!   ┌──────────┐     ┌─────────────┐     ┌───────────┐         │
//!   │ stdout   │     │ stderr      │     │ Reporter  │         │
//!   │ readiness│     │ scan task   │     │ (ticker)  │         │
//!   └────┬─────┘     └──────┬──────┘     └─────┬─────┘         │
//!        │ NodeReady        │ apply()          │ snapshot()    │ StateChanged
//!        │                  ▼                  │               │ NodeExited/Killed
//!        │          ┌───────────────┐          │               │
//!        │          │ProvideTracker │◄─────────┘               │
//!        │          └───────┬───────┘                          │
//!        │                  │ ProvideApplied                   │
//!        ▼                  ▼                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                    (capacity: Config::bus_capacity)               │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                    LogWriter   sub2  ...  subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Bootstrapping ─► Ingesting ─► Starting ─► AwaitingReady ─► Monitoring
//!                                                               │
//!        (failure in any earlier state) ─────────────► ShuttingDown ─► Terminated
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                         |
//! |-------------------|----------------------------------------------------------------|--------------------------------------------|
//! | **Run**           | Sequence a monitoring run and wire interrupts to shutdown.     | [`RunController`], [`RunState`]            |
//! | **Process**       | Start the node, stop it once: SIGTERM, grace, kill.            | [`NodeProcess`], [`ShutdownOutcome`]       |
//! | **Extraction**    | Bounded line scans, readiness, advertisement events.           | [`LineScanner`], [`ProvideExtractor`]      |
//! | **Tracking**      | Per-digest advertisement counts and consistent snapshots.      | [`ProvideTracker`], [`Snapshot`]           |
//! | **Reporting**     | Periodic distribution summary.                                 | [`Reporter`], [`StatusReport`]             |
//! | **Subscriber API**| Hook into run events (logging, custom subscribers).            | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors for fatal and scan failures.                      | [`MonitorError`], [`ScanError`]            |
//! | **Configuration** | Centralize run settings.                                       | [`Config`], [`NodeSettings`]               |
//!
//! ## Example
//! ```rust
//! use provwatch::{ProvideEvent, ProvideExtractor, ProvideTracker};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tracker = ProvideTracker::new(vec![(vec![1u8, 1], "a".to_string())]);
//! let mut extractor = ProvideExtractor::new("sent provider record");
//!
//! let line = r#"DEBUG sent provider record {"prefix":"0","keys":["AQE="]}"#;
//! let ev: ProvideEvent = extractor.extract(line).unwrap();
//! let outcome = tracker.apply(&ev).await;
//!
//! assert_eq!((outcome.new, outcome.advertised, outcome.total), (1, 1, 1));
//! assert_eq!(tracker.count(&[1, 1]).await, Some(1));
//! # }
//! ```

mod config;
mod core;
mod error;
mod events;
mod extract;
mod report;
mod subscribers;
mod tracker;

pub mod ident;
pub mod node;

// ---- Public re-exports ----

pub use config::{Config, EMPTY_DIR_CID, LOG_LEVEL_ENV, NodeSettings, REPO_PATH_ENV};
pub use crate::core::{NodeProcess, NodeStreams, RunController, RunOutcome, RunState, ShutdownOutcome};
pub use error::{MonitorError, ScanError};
pub use events::{Bus, Event, EventKind};
pub use extract::{
    DIAGNOSTIC_STREAM, LineScanner, ProvideEvent, ProvideExtractor, await_ready, scan_provides,
};
pub use report::{Reporter, StatusReport};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tracker::{ApplyOutcome, ProvideTracker, Snapshot, Unadvertised};
