//! Runtime core: the node process and the run lifecycle.
//!
//! The public entry point is [`RunController`], which sequences a whole run.
//!
//! Internal modules:
//! - [`controller`]: bootstrap → ingest → start → await-ready → monitor → shutdown;
//! - [`process`]: node process with once-only graceful/forced shutdown;
//! - [`shutdown`]: OS interrupt handling;
//! - [`state`]: run states and outcomes.

mod controller;
mod process;
mod shutdown;
mod state;

pub use controller::RunController;
pub use process::{NodeProcess, NodeStreams, ShutdownOutcome};
pub use state::{RunOutcome, RunState};
