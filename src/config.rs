//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for a monitoring run, and
//! [`NodeSettings`] the values written into the node repository at bootstrap.
//!
//! Config is used in three places:
//! 1. **Bootstrap/ingest**: `node::bootstrap(&cfg)`, `node::ingest(&cfg)`
//! 2. **Process supervision**: program, environment and shutdown grace
//! 3. **Pipeline**: markers, scan capacity, report period and histogram cap
//!
//! ## Sentinel values
//! - `readiness_timeout = 0s` → wait for readiness indefinitely
//! - `line_capacity = 0` → clamped to 1 byte (every non-empty line is too long)
//! - `bus_capacity = 0` → clamped to 1

use std::path::PathBuf;
use std::time::Duration;

/// Identifier of the empty directory every fresh repository holds.
///
/// It is always tracked in addition to the ingested content.
pub const EMPTY_DIR_CID: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

/// Environment variable that points the node CLI at its repository.
pub const REPO_PATH_ENV: &str = "IPFS_PATH";

/// Environment variable that controls the node's diagnostic verbosity.
pub const LOG_LEVEL_ENV: &str = "GOLOG_LOG_LEVEL";

/// Configuration for a monitoring run.
///
/// ## Field semantics
/// - `grace`: Maximum wait for the node to exit after SIGTERM before it is killed
/// - `report_interval`: Period between status reports
/// - `readiness_timeout`: Deadline for the readiness marker (`0s` = none)
/// - `line_capacity`: Per-line scan buffer in bytes; longer lines abort the scan
/// - `histogram_cap`: Highest advertisement count shown in the distribution
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Node executable.
    pub program: String,

    /// Repository directory handed to the node through [`REPO_PATH_ENV`].
    ///
    /// Wiped and re-initialized at bootstrap.
    pub repo_path: PathBuf,

    /// Directory whose contents are published before the daemon starts.
    pub content_dir: PathBuf,

    /// Maximum time to wait for the node to exit after a graceful signal.
    pub grace: Duration,

    /// Period between status reports.
    pub report_interval: Duration,

    /// Deadline for the readiness marker to appear.
    ///
    /// - `Duration::ZERO` = wait until the marker appears or the stream closes
    /// - `> 0` = fail with `MonitorError::ReadinessTimeout` when it elapses
    pub readiness_timeout: Duration,

    /// Per-line buffer capacity for stream scans, in bytes.
    pub line_capacity: usize,

    /// Substring that marks the node as ready on its control stream.
    pub ready_marker: String,

    /// Substring that marks an advertisement event on the diagnostic stream.
    pub event_marker: String,

    /// Value for [`LOG_LEVEL_ENV`] when the daemon is started.
    pub node_log_level: String,

    /// Highest count value rendered in the distribution.
    ///
    /// Entries holding a larger count are still tracked, just not displayed.
    pub histogram_cap: u64,

    /// Maximum number of unadvertised identifiers listed in a report.
    ///
    /// When more identifiers are still missing, only their number is printed.
    pub missing_list_limit: usize,

    /// Capacity of the lifecycle event bus.
    pub bus_capacity: usize,

    /// Values written into the node repository at bootstrap.
    pub node: NodeSettings,
}

impl Config {
    /// Returns the readiness deadline as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → give up after `d`
    #[inline]
    pub fn readiness_deadline(&self) -> Option<Duration> {
        if self.readiness_timeout == Duration::ZERO {
            None
        } else {
            Some(self.readiness_timeout)
        }
    }

    /// Returns the scan line capacity clamped to a minimum of 1.
    #[inline]
    pub fn line_capacity_clamped(&self) -> usize {
        self.line_capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Environment for node CLI invocations.
    pub fn node_env(&self) -> Vec<(String, String)> {
        vec![(
            REPO_PATH_ENV.to_string(),
            self.repo_path.to_string_lossy().into_owned(),
        )]
    }

    /// Environment for the long-running daemon: repository plus verbosity.
    pub fn daemon_env(&self) -> Vec<(String, String)> {
        let mut env = self.node_env();
        env.push((LOG_LEVEL_ENV.to_string(), self.node_log_level.clone()));
        env
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `program = "ipfs"`, repository `.ipfs`, content `generated_files`
    /// - `grace = 15s`
    /// - `report_interval = 60s`
    /// - `readiness_timeout = 0s` (wait indefinitely)
    /// - `line_capacity = 1 MiB`
    /// - `histogram_cap = 100`
    fn default() -> Self {
        Self {
            program: "ipfs".to_string(),
            repo_path: PathBuf::from(".ipfs"),
            content_dir: PathBuf::from("generated_files"),
            grace: Duration::from_secs(15),
            report_interval: Duration::from_secs(60),
            readiness_timeout: Duration::ZERO,
            line_capacity: 1 << 20,
            ready_marker: "Daemon is ready".to_string(),
            event_marker: "sent provider record".to_string(),
            node_log_level: "dht=debug,dht/provider=debug".to_string(),
            histogram_cap: 100,
            missing_list_limit: 16,
            bus_capacity: 1024,
            node: NodeSettings::default(),
        }
    }
}

/// Repository settings applied at bootstrap.
#[derive(Clone, Debug)]
pub struct NodeSettings {
    /// How often the node re-announces its content.
    pub reprovide_interval: Duration,
    /// Which content the node announces (`all`, `pinned`, `roots`).
    pub strategy: String,
    /// RPC API listen address.
    pub api_addr: String,
    /// HTTP gateway listen address.
    pub gateway_addr: String,
    /// Swarm listen addresses.
    pub swarm_addrs: Vec<String>,
    /// Fixed peer identity so the node's own DHT position is known in advance.
    pub peer_id: String,
    /// Base64 protobuf-encoded private key matching `peer_id`.
    pub priv_key: String,
}

impl NodeSettings {
    /// Interval rendered the way the node config expects it (`"10m"`).
    pub fn interval_literal(&self) -> String {
        let secs = self.reprovide_interval.as_secs();
        if secs % 3600 == 0 && secs > 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 && secs > 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{secs}s")
        }
    }
}

impl Default for NodeSettings {
    /// Alternate ports avoid clashing with a node already running on the host.
    ///
    /// The identity's DHT key starts with `0x00`.
    fn default() -> Self {
        Self {
            reprovide_interval: Duration::from_secs(10 * 60),
            strategy: "pinned".to_string(),
            api_addr: "/ip4/127.0.0.1/tcp/5401".to_string(),
            gateway_addr: "/ip4/127.0.0.1/tcp/8480".to_string(),
            swarm_addrs: vec![
                "/ip4/0.0.0.0/tcp/4401".to_string(),
                "/ip6/::/tcp/4401".to_string(),
                "/ip4/0.0.0.0/udp/4401/quic-v1".to_string(),
                "/ip6/::/udp/4401/quic-v1".to_string(),
            ],
            peer_id: "12D3KooWPGUHammYxStT9qMmKidZBUChutLLLXjmumoXhQRofhNp".to_string(),
            priv_key: "CAESQCDaw5OT66egT4ShrkA7WoFY6FT7NSGPvOlG3Phh3qGZx9fy2KzoCFA2VkLQUtLIiv4rbiDmpff4wlwUwolvgiE=".to_string(),
        }
    }
}
