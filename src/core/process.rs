//! # Node process supervision.
//!
//! [`NodeProcess`] owns the running daemon. It hands out the two output
//! streams once, at start, and stops the process in a fixed order:
//!
//! ```text
//! shutdown()
//!   ├─ already exited?          → AlreadyExited
//!   ├─ SIGTERM
//!   ├─ wait ≤ grace ─ exited    → Exited  (NodeExited)
//!   └─ grace elapsed ─ SIGKILL  → Killed  (NodeKilled)
//! ```
//!
//! Shutdown runs at most once. Concurrent and later callers await the same
//! sequence and receive the same [`ShutdownOutcome`].
//!
//! Once the process is gone its streams close, which ends any reader.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{Mutex, OnceCell};

use crate::error::MonitorError;
use crate::events::{Bus, Event, EventKind};

/// How [`NodeProcess::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The process exited within the grace period after SIGTERM.
    Exited,
    /// The grace period elapsed and the process was killed.
    Killed,
    /// The process had already exited before shutdown began.
    AlreadyExited,
}

impl ShutdownOutcome {
    /// Stable label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownOutcome::Exited => "exited",
            ShutdownOutcome::Killed => "killed",
            ShutdownOutcome::AlreadyExited => "already-exited",
        }
    }
}

/// Output streams of a started node.
pub struct NodeStreams {
    /// Control stream (readiness and lifecycle messages).
    pub stdout: ChildStdout,
    /// Diagnostic stream (debug logs, advertisement events).
    pub stderr: ChildStderr,
}

/// Handle to the running node.
///
/// Shared through `Arc` between the controller and the interrupt listener.
pub struct NodeProcess {
    program: String,
    child: Mutex<Child>,
    grace: Duration,
    bus: Bus,
    outcome: OnceCell<ShutdownOutcome>,
}

impl NodeProcess {
    /// Launches `program` with `args` and the extra environment `env`.
    ///
    /// Stdin is closed; stdout and stderr are piped and returned.
    pub fn start(
        program: &str,
        args: &[&str],
        env: &[(String, String)],
        grace: Duration,
        bus: Bus,
    ) -> Result<(Arc<Self>, NodeStreams), MonitorError> {
        let start_err = |source| MonitorError::Start {
            program: program.to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(start_err)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| start_err(std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| start_err(std::io::Error::other("stderr not captured")))?;

        tracing::debug!(program, pid = child.id(), "node started");
        let proc = Arc::new(Self {
            program: program.to_string(),
            child: Mutex::new(child),
            grace,
            bus,
            outcome: OnceCell::new(),
        });
        Ok((proc, NodeStreams { stdout, stderr }))
    }

    /// Returns `true` once the process has exited.
    pub async fn has_exited(&self) -> bool {
        matches!(self.child.lock().await.try_wait(), Ok(Some(_)))
    }

    /// Stops the process, once.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        *self.outcome.get_or_init(|| self.stop()).await
    }

    async fn stop(&self) -> ShutdownOutcome {
        let mut child = self.child.lock().await;
        if let Ok(Some(status)) = child.try_wait() {
            tracing::debug!(program = %self.program, %status, "node already exited");
            return ShutdownOutcome::AlreadyExited;
        }

        terminate(&mut child);
        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(_) => {
                self.bus
                    .publish(Event::new(EventKind::NodeExited).with_grace(self.grace));
                ShutdownOutcome::Exited
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(program = %self.program, error = %e, "kill failed");
                }
                self.bus
                    .publish(Event::new(EventKind::NodeKilled).with_grace(self.grace));
                ShutdownOutcome::Killed
            }
        }
    }
}

/// Asks the process to exit gracefully.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        tracing::warn!(pid, error = %e, "SIGTERM failed, killing");
        let _ = child.start_kill();
    }
}

/// No graceful signal outside unix: kill right away.
#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.start_kill();
}
