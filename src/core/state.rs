//! # Run state machine.
//!
//! ```text
//! Bootstrapping ─► Ingesting ─► Starting ─► AwaitingReady ─► Monitoring
//!       │              │            │              │              │
//!       └──────────────┴────────────┴──────────────┴──────────────┴─► ShuttingDown ─► Terminated
//! ```
//!
//! A failure in any state before `Monitoring` goes straight to `ShuttingDown`.
//! `Monitoring` is left only through interruption.

use std::fmt;

/// Phase of a monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Wiping and initializing the node repository.
    Bootstrapping,
    /// Publishing content into the repository.
    Ingesting,
    /// Launching the node daemon.
    Starting,
    /// Waiting for the readiness marker on the control stream.
    AwaitingReady,
    /// Node is ready; advertisements are tracked and reported.
    Monitoring,
    /// Stopping the node (graceful signal, grace period, kill).
    ShuttingDown,
    /// Nothing left running.
    Terminated,
}

impl RunState {
    /// Stable kebab-case name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Bootstrapping => "bootstrapping",
            RunState::Ingesting => "ingesting",
            RunState::Starting => "starting",
            RunState::AwaitingReady => "awaiting-ready",
            RunState::Monitoring => "monitoring",
            RunState::ShuttingDown => "shutting-down",
            RunState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended.
///
/// Monitoring has no natural end, so every outcome is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// An OS signal ended the run.
    Interrupted,
    /// A fatal error aborted the run.
    Failed,
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Interrupted | RunOutcome::Failed => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_kebab_case() {
        assert_eq!(RunState::AwaitingReady.to_string(), "awaiting-ready");
        assert_eq!(RunState::ShuttingDown.to_string(), "shutting-down");
    }

    #[test]
    fn every_outcome_exits_non_zero() {
        assert_eq!(RunOutcome::Interrupted.exit_code(), 1);
        assert_eq!(RunOutcome::Failed.exit_code(), 1);
    }
}
