//! # RunController: sequences one monitoring run.
//!
//! ```text
//! run()
//!   ├─ subscriber_listener(): Bus ─► SubscriberSet::emit (fire-and-forget)
//!   ├─ Interrupts::register()
//!   ├─ prepare()                       (raced against an interrupt)
//!   │    Bootstrapping ─► node::bootstrap
//!   │    Ingesting     ─► node::ingest ─► ProvideTracker::from_ids(files + dir + empty dir)
//!   │    Starting      ─► NodeProcess::start("daemon")
//!   └─ supervise()
//!        ├─ spawn scan task: stderr ─► scan_provides ─► tracker
//!        ├─ spawn interrupt listener: interrupt ─► ShutdownRequested ─► cancel ─► shutdown()
//!        ├─ AwaitingReady ─► await_ready(stdout) [optional deadline]
//!        ├─ Monitoring    ─► spawn stdout drain; Reporter::run until cancelled
//!        └─ ShuttingDown  ─► NodeProcess::shutdown() ─► Terminated
//! ```
//!
//! The diagnostic stream is scanned from the moment the node starts so that
//! its pipe never fills up while readiness is awaited.
//!
//! Any failure before `Monitoring` goes straight to `ShuttingDown`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, EMPTY_DIR_CID};
use crate::core::process::{NodeProcess, NodeStreams};
use crate::core::shutdown::Interrupts;
use crate::core::{RunOutcome, RunState};
use crate::error::MonitorError;
use crate::events::{Bus, Event, EventKind};
use crate::extract::{LineScanner, ProvideExtractor, await_ready, scan_provides};
use crate::node::{self, NodeCli};
use crate::report::Reporter;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tracker::ProvideTracker;

/// How long the scan task may keep reading after the node is gone.
const STREAM_SETTLE: Duration = Duration::from_secs(2);

/// Drives a run through its states and owns the event bus.
pub struct RunController {
    cfg: Config,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RunController {
    /// Creates a controller. Events are delivered to `subscribers` during [`run`](Self::run).
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            bus,
            subscribers,
        }
    }

    /// The bus every run event is published on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs bootstrap, ingest and the daemon until interrupted or failed.
    pub async fn run(&self) -> RunOutcome {
        let stop = CancellationToken::new();
        let listener = self.subscriber_listener(stop.clone());

        let outcome = self.run_phases().await;

        stop.cancel();
        let _ = listener.await;
        outcome
    }

    async fn run_phases(&self) -> RunOutcome {
        let mut interrupts = match Interrupts::register() {
            Ok(i) => i,
            Err(e) => return self.abort(MonitorError::Signal(e)),
        };

        let prepared = tokio::select! {
            r = self.prepare() => r,
            _ = interrupts.wait() => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                self.transition(RunState::ShuttingDown);
                self.transition(RunState::Terminated);
                return RunOutcome::Interrupted;
            }
        };

        match prepared {
            Ok((proc, streams, tracker)) => {
                self.supervise(proc, streams, tracker, async move { interrupts.wait().await })
                    .await
            }
            Err(e) => self.abort(e),
        }
    }

    /// Bootstrapping → Ingesting → Starting.
    async fn prepare(
        &self,
    ) -> Result<(Arc<NodeProcess>, NodeStreams, Arc<ProvideTracker>), MonitorError> {
        let cli = NodeCli::from_config(&self.cfg);

        self.transition(RunState::Bootstrapping);
        node::bootstrap(&cli, &self.cfg).await?;

        self.transition(RunState::Ingesting);
        let ingested = node::ingest(&cli, &self.cfg.content_dir).await?;
        let tracker = Arc::new(ProvideTracker::from_ids(
            ingested.ids().chain(std::iter::once(EMPTY_DIR_CID)),
        ));
        tracing::info!(tracked = tracker.total(), "tracking identifiers");

        self.transition(RunState::Starting);
        let (proc, streams) = NodeProcess::start(
            &self.cfg.program,
            &["daemon"],
            &self.cfg.daemon_env(),
            self.cfg.grace,
            self.bus.clone(),
        )?;
        Ok((proc, streams, tracker))
    }

    /// Runs a started node from `AwaitingReady` to `Terminated`.
    ///
    /// `interrupt` resolving ends the run: the node is shut down and
    /// monitoring is cancelled.
    pub async fn supervise<F>(
        &self,
        proc: Arc<NodeProcess>,
        streams: NodeStreams,
        tracker: Arc<ProvideTracker>,
        interrupt: F,
    ) -> RunOutcome
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let mut scan = self.spawn_scan(streams.stderr, Arc::clone(&tracker), token.clone());
        let listener = self.spawn_interrupt_listener(interrupt, Arc::clone(&proc), token.clone());

        let result = self.await_and_monitor(streams.stdout, tracker, &token).await;
        let outcome = match result {
            Ok(()) => RunOutcome::Interrupted,
            // The interrupt closed the node's streams before readiness was seen.
            Err(_) if token.is_cancelled() => RunOutcome::Interrupted,
            Err(e) => {
                report_failure(&e);
                RunOutcome::Failed
            }
        };

        self.transition(RunState::ShuttingDown);
        token.cancel();
        let stopped = proc.shutdown().await;
        tracing::debug!(outcome = stopped.as_str(), "node stopped");
        let _ = listener.await;
        if tokio::time::timeout(STREAM_SETTLE, &mut scan).await.is_err() {
            scan.abort();
        }
        self.transition(RunState::Terminated);
        outcome
    }

    /// AwaitingReady → Monitoring. Returns once `token` is cancelled.
    async fn await_and_monitor<R>(
        &self,
        stdout: R,
        tracker: Arc<ProvideTracker>,
        token: &CancellationToken,
    ) -> Result<(), MonitorError>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        self.transition(RunState::AwaitingReady);
        let mut control = LineScanner::new(stdout, self.cfg.line_capacity_clamped());
        let ready = await_ready(&mut control, &self.cfg.ready_marker, |line| {
            tracing::info!("  {line}")
        });
        let ready = async {
            match self.cfg.readiness_deadline() {
                None => ready.await,
                Some(timeout) => tokio::time::timeout(timeout, ready)
                    .await
                    .unwrap_or(Err(MonitorError::ReadinessTimeout { timeout })),
            }
        };
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            r = ready => r?,
        }
        self.bus.publish(Event::new(EventKind::NodeReady));

        tokio::spawn(control.drain());
        self.transition(RunState::Monitoring);
        Reporter::new(tracker, &self.cfg)
            .run(self.cfg.report_interval, token.clone())
            .await;
        Ok(())
    }

    /// Scans the diagnostic stream into `tracker` until it closes.
    fn spawn_scan<R>(
        &self,
        stderr: R,
        tracker: Arc<ProvideTracker>,
        token: CancellationToken,
    ) -> JoinHandle<()>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let scanner = LineScanner::new(stderr, self.cfg.line_capacity_clamped());
        let extractor = ProvideExtractor::new(self.cfg.event_marker.clone());
        let bus = self.bus.clone();
        tokio::spawn(async move {
            match scan_provides(scanner, extractor, tracker, bus).await {
                Ok(n) if !token.is_cancelled() => {
                    tracing::warn!(events = n, "diagnostic stream closed");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(label = e.as_label(), "provide scan stopped: {e}"),
            }
        })
    }

    /// Waits for `interrupt`, then cancels the run and shuts the node down.
    ///
    /// Streams closing after the cancel are not node failures.
    fn spawn_interrupt_listener<F>(
        &self,
        interrupt: F,
        proc: Arc<NodeProcess>,
        token: CancellationToken,
    ) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bus = self.bus.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt => {
                    bus.publish(Event::new(EventKind::ShutdownRequested));
                    token.cancel();
                    proc.shutdown().await;
                }
                _ = token.cancelled() => {}
            }
        })
    }

    /// Failure before the node started: ShuttingDown → Terminated.
    fn abort(&self, e: MonitorError) -> RunOutcome {
        report_failure(&e);
        self.transition(RunState::ShuttingDown);
        self.transition(RunState::Terminated);
        RunOutcome::Failed
    }

    fn transition(&self, state: RunState) {
        self.bus.publish(Event::state_changed(state));
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Once `stop` is cancelled, already published events are still delivered.
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(ev),
                        Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "event listener lagged"),
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(ev);
            }
            set.shutdown().await;
        })
    }
}

fn report_failure(e: &MonitorError) {
    tracing::error!(label = e.as_label(), "run failed: {}", e.as_message());
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use tokio::sync::broadcast;

    fn controller(cfg: Config) -> RunController {
        RunController::new(cfg, Vec::new())
    }

    fn start(ctl: &RunController, script: &str) -> (Arc<NodeProcess>, NodeStreams) {
        NodeProcess::start("sh", &["-c", script], &[], Duration::from_secs(5), ctl.bus().clone())
            .unwrap()
    }

    fn states(rx: &mut broadcast::Receiver<Event>) -> Vec<RunState> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let Some(s) = ev.state {
                out.push(s);
            }
        }
        out
    }

    #[tokio::test]
    async fn readiness_eof_fails_without_monitoring() {
        let ctl = controller(Config::default());
        let mut rx = ctl.bus().subscribe();
        let (proc, streams) = start(&ctl, "echo 'Initializing daemon...'; exit 0");
        let tracker = Arc::new(ProvideTracker::from_ids([EMPTY_DIR_CID]));

        let outcome = ctl
            .supervise(proc, streams, tracker, std::future::pending())
            .await;
        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(
            states(&mut rx),
            vec![
                RunState::AwaitingReady,
                RunState::ShuttingDown,
                RunState::Terminated
            ]
        );
    }

    #[tokio::test]
    async fn readiness_deadline_fails_and_stops_node() {
        let ctl = controller(Config {
            readiness_timeout: Duration::from_millis(200),
            ..Config::default()
        });
        let (proc, streams) = start(&ctl, "exec sleep 30");
        let tracker = Arc::new(ProvideTracker::from_ids([EMPTY_DIR_CID]));

        let outcome = ctl
            .supervise(Arc::clone(&proc), streams, tracker, std::future::pending())
            .await;
        assert_eq!(outcome, RunOutcome::Failed);
        assert!(proc.has_exited().await);
    }

    #[tokio::test]
    async fn interrupt_ends_monitoring() {
        let ctl = controller(Config::default());
        let mut rx = ctl.bus().subscribe();

        let digest = crate::ident::digest_of(EMPTY_DIR_CID).unwrap();
        let script = format!(
            "echo 'Daemon is ready'; echo 'DEBUG sent provider record {{\"prefix\":\"00\",\"keys\":[\"{}\"]}}' >&2; exec sleep 30",
            STANDARD.encode(&digest)
        );
        let (proc, streams) = start(&ctl, &script);
        let tracker = Arc::new(ProvideTracker::from_ids([EMPTY_DIR_CID]));

        let watched = Arc::clone(&tracker);
        let mut watch_rx = ctl.bus().subscribe();
        let interrupt = async move {
            while let Ok(ev) = watch_rx.recv().await {
                if ev.state == Some(RunState::Monitoring) {
                    break;
                }
            }
            while watched.snapshot().await.total_records == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        let outcome = ctl
            .supervise(Arc::clone(&proc), streams, Arc::clone(&tracker), interrupt)
            .await;

        assert_eq!(outcome, RunOutcome::Interrupted);
        assert!(proc.has_exited().await);
        assert_eq!(tracker.count(&digest).await, Some(1));

        let seen = states(&mut rx);
        assert!(seen.contains(&RunState::Monitoring));
        assert_eq!(
            &seen[seen.len() - 2..],
            &[RunState::ShuttingDown, RunState::Terminated]
        );
    }

    #[tokio::test]
    async fn interrupt_while_awaiting_ready_is_not_a_failure() {
        let ctl = controller(Config::default());
        let mut rx = ctl.bus().subscribe();
        let (proc, streams) = start(&ctl, "exec sleep 30");
        let tracker = Arc::new(ProvideTracker::from_ids([EMPTY_DIR_CID]));

        let interrupt = tokio::time::sleep(Duration::from_millis(200));
        let outcome = ctl
            .supervise(Arc::clone(&proc), streams, tracker, interrupt)
            .await;

        assert_eq!(outcome, RunOutcome::Interrupted);
        assert!(proc.has_exited().await);

        let mut kinds = Vec::new();
        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
            if let Some(s) = ev.state {
                seen.push(s);
            }
        }
        assert!(kinds.contains(&EventKind::ShutdownRequested));
        assert_eq!(
            seen,
            vec![
                RunState::AwaitingReady,
                RunState::ShuttingDown,
                RunState::Terminated
            ]
        );
    }
}
