//! # Periodic status report.
//!
//! ```text
//! ============================================================
//! STATUS (2m0s elapsed, reprovide interval: 10m0s)
//!   Total provide records: 41
//!   CIDs advertised: 250/258 (96.9%)
//!   Unknown keys: 3
//!   Distinct prefixes: 17
//!   Advertisement count distribution:
//!     0x: 8 CIDs
//!     1x: 250 CIDs
//!   Not yet advertised (8):
//!     prefix=0x3a kadID=3a91c07d5e2b8f14 bafkrei...
//!   Provide prefixes seen (17): 0, 00, 01, ...
//! ============================================================
//! ```
//!
//! Distribution lines stop at the histogram cap: entries advertised more often
//! are counted in the header totals only.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::tracker::{ProvideTracker, Snapshot, Unadvertised};

const BORDER_WIDTH: usize = 60;

/// One rendered status report.
pub struct StatusReport<'a> {
    /// Time since monitoring started.
    pub elapsed: Duration,
    /// Reprovide interval configured on the node.
    pub reprovide_interval: Duration,
    /// Tracker state being reported.
    pub snapshot: &'a Snapshot,
    /// Highest advertisement count listed in the distribution.
    pub histogram_cap: u64,
    /// Unadvertised entries are listed only when at most this many remain.
    pub missing_list_limit: usize,
}

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.snapshot;
        let border = "=".repeat(BORDER_WIDTH);

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "STATUS ({} elapsed, reprovide interval: {})",
            HumanDuration(self.elapsed),
            HumanDuration(self.reprovide_interval),
        )?;
        writeln!(f, "  Total provide records: {}", s.total_records)?;
        writeln!(
            f,
            "  CIDs advertised: {}/{} ({:.1}%)",
            s.distinct_advertised,
            s.total_tracked,
            s.coverage_percent()
        )?;
        writeln!(f, "  Unknown keys: {}", s.unknown_keys)?;
        writeln!(f, "  Distinct prefixes: {}", s.distinct_prefixes())?;
        writeln!(f, "  Advertisement count distribution:")?;
        for (count, entries) in s.buckets_upto(self.histogram_cap) {
            writeln!(f, "    {count}x: {entries} CIDs")?;
        }
        if !s.unadvertised.is_empty() && s.unadvertised.len() <= self.missing_list_limit {
            writeln!(f, "  Not yet advertised ({}):", s.unadvertised.len())?;
            for u in &s.unadvertised {
                writeln!(
                    f,
                    "    prefix=0x{:02x} kadID={} {}",
                    u.kad_prefix(),
                    hex::encode(&u.kad_id[..8]),
                    u.id
                )?;
            }
            writeln!(
                f,
                "  Provide prefixes seen ({}): {}",
                s.prefixes.len(),
                s.prefixes.join(", ")
            )?;
        }
        write!(f, "{border}")
    }
}

/// Durations the way the node prints them: `1h2m3s`, `10m0s`, `45s`.
struct HumanDuration(Duration);

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs_f64().round() as u64;
        let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
        if h > 0 {
            write!(f, "{h}h{m}m{s}s")
        } else if m > 0 {
            write!(f, "{m}m{s}s")
        } else {
            write!(f, "{s}s")
        }
    }
}

/// Renders tracker snapshots on a fixed period.
pub struct Reporter {
    tracker: Arc<ProvideTracker>,
    started: Instant,
    reprovide_interval: Duration,
    histogram_cap: u64,
    missing_list_limit: usize,
}

impl Reporter {
    /// Creates a reporter whose elapsed time counts from now.
    pub fn new(tracker: Arc<ProvideTracker>, cfg: &Config) -> Self {
        Self {
            tracker,
            started: Instant::now(),
            reprovide_interval: cfg.node.reprovide_interval,
            histogram_cap: cfg.histogram_cap,
            missing_list_limit: cfg.missing_list_limit,
        }
    }

    /// Takes a snapshot and renders it.
    pub async fn render(&self) -> String {
        let snapshot = self.tracker.snapshot().await;
        StatusReport {
            elapsed: self.started.elapsed(),
            reprovide_interval: self.reprovide_interval,
            snapshot: &snapshot,
            histogram_cap: self.histogram_cap,
            missing_list_limit: self.missing_list_limit,
        }
        .to_string()
    }

    /// Prints a report to stdout every `period` until `token` is cancelled.
    ///
    /// The first report comes one full period after the call.
    pub async fn run(&self, period: Duration, token: CancellationToken) {
        let period = period.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticker.tick() => println!("\n{}", self.render().await),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn missing(id: &str, first: u8) -> Unadvertised {
        let mut kad_id = [0xab; 32];
        kad_id[0] = first;
        Unadvertised {
            id: id.to_string(),
            kad_id,
        }
    }

    fn snapshot(histogram: BTreeMap<u64, usize>, unadvertised: Vec<Unadvertised>) -> Snapshot {
        let total: usize = histogram.values().sum();
        Snapshot {
            total_tracked: total,
            distinct_advertised: total - histogram.get(&0).copied().unwrap_or(0),
            total_records: 7,
            unknown_keys: 2,
            prefixes: vec!["0".to_string(), "01".to_string(), "1".to_string()],
            histogram,
            unadvertised,
        }
    }

    fn render(s: &Snapshot, cap: u64) -> String {
        StatusReport {
            elapsed: Duration::from_secs(125),
            reprovide_interval: Duration::from_secs(600),
            snapshot: s,
            histogram_cap: cap,
            missing_list_limit: 2,
        }
        .to_string()
    }

    #[test]
    fn renders_header_and_totals() {
        let s = snapshot(BTreeMap::from([(0, 1), (2, 3)]), vec![missing("bafk-missing", 0x3a)]);
        let out = render(&s, 100);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "STATUS (2m5s elapsed, reprovide interval: 10m0s)");
        assert_eq!(lines[2], "  Total provide records: 7");
        assert_eq!(lines[3], "  CIDs advertised: 3/4 (75.0%)");
        assert!(out.contains("    0x: 1 CIDs\n    2x: 3 CIDs\n"));
        assert_eq!(lines[5], "  Distinct prefixes: 3");
        assert!(out.contains(
            "  Not yet advertised (1):\n    prefix=0x3a kadID=3aababababababab bafk-missing\n"
        ));
        assert!(out.contains("  Provide prefixes seen (3): 0, 01, 1\n"));
        assert_eq!(*lines.last().unwrap(), "=".repeat(60));
    }

    #[test]
    fn distribution_is_capped() {
        let s = snapshot((0..150).map(|n| (n, 1)).collect(), Vec::new());
        let out = render(&s, 100);

        let dist: Vec<&str> = out.lines().filter(|l| l.ends_with(" CIDs")).collect();
        assert_eq!(dist.len(), 101);
        assert_eq!(dist[0], "    0x: 1 CIDs");
        assert_eq!(dist[100], "    100x: 1 CIDs");
        assert!(!out.contains("101x"));
    }

    #[test]
    fn long_missing_list_is_not_printed() {
        let ids = vec![missing("a", 1), missing("b", 2), missing("c", 3)];
        let s = snapshot(BTreeMap::from([(0, 3)]), ids);
        let out = render(&s, 100);
        assert!(!out.contains("Not yet advertised"));
        assert!(!out.contains("Provide prefixes seen"));
    }

    #[test]
    fn durations_use_largest_units() {
        assert_eq!(HumanDuration(Duration::from_secs(45)).to_string(), "45s");
        assert_eq!(HumanDuration(Duration::from_secs(60)).to_string(), "1m0s");
        assert_eq!(HumanDuration(Duration::from_secs(3723)).to_string(), "1h2m3s");
    }

    #[tokio::test(start_paused = true)]
    async fn reporter_stops_on_cancel() {
        let tracker = Arc::new(ProvideTracker::new(Vec::<(Vec<u8>, String)>::new()));
        let reporter = Reporter::new(tracker, &Config::default());
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(150)).await;
            cancel.cancel();
        });
        reporter.run(Duration::from_secs(60), token).await;
        assert!(reporter.render().await.contains("CIDs advertised: 0/0"));
    }
}
