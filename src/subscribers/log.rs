//! # LogWriter: renders run events through `tracing`
//!
//! ## Example output
//! ```text
//! INFO provwatch: state -> awaiting-ready
//! INFO provwatch: node is ready
//! INFO provwatch: [provide #12] prefix=0110 keys=3 new=1 | 40/258
//! WARN provwatch: [node-killed] grace=15000ms elapsed
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::StateChanged => {
                if let Some(state) = e.state {
                    tracing::info!(seq = e.seq, "state -> {state}");
                }
            }
            EventKind::NodeReady => {
                tracing::info!("node is ready");
            }
            EventKind::ProvideApplied => {
                if let Some(p) = &e.progress {
                    tracing::info!(
                        "[provide #{}] prefix={} keys={} new={} | {}/{}",
                        p.record,
                        e.reason.as_deref().unwrap_or("?"),
                        p.keys,
                        p.new,
                        p.advertised,
                        p.total,
                    );
                }
            }
            EventKind::ScanFailed => {
                tracing::error!(
                    stream = e.source.as_deref().unwrap_or("unknown"),
                    "[scan-failed] {}",
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
            EventKind::ShutdownRequested => {
                tracing::info!("[shutdown-requested]");
            }
            EventKind::NodeExited => {
                tracing::info!("[node-exited] within grace={:?}ms", e.grace_ms);
            }
            EventKind::NodeKilled => {
                tracing::warn!("[node-killed] grace={:?}ms elapsed", e.grace_ms);
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.source,
                    e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(
                    "[subscriber-panicked] subscriber={} info={}",
                    e.source.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
