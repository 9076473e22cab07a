//! # Advertisement tracker.
//!
//! Maintains how many times each tracked digest has been advertised.
//!
//! ## Architecture
//! ```text
//! provide scan task ──► ProvideTracker::apply(&ProvideEvent)
//!                                  │  (one lock per event)
//!                                  ▼
//!                   HashMap<digest, TrackedEntry{display_id, count}>
//!                                  ▲
//! reporter tick ──► ProvideTracker::snapshot()
//! ```
//!
//! ## Rules
//! - The key set is fixed at construction; entries are never added or removed
//! - `count` only increases
//! - `advertised` increases by exactly one on each 0 → 1 transition
//! - `records` increases by exactly one per applied event, hit or miss
//! - A key that is not valid base64 is skipped; the rest of the event still applies

use std::collections::{BTreeMap, BTreeSet, HashMap};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tokio::sync::Mutex;

use crate::extract::ProvideEvent;
use crate::ident;
use crate::tracker::{Snapshot, Unadvertised};

/// One tracked digest.
#[derive(Debug, Clone)]
struct TrackedEntry {
    /// Identifier text the digest was derived from.
    display_id: String,
    /// DHT placement key of the digest.
    kad_id: [u8; 32],
    /// Number of advertisement events that carried this digest.
    count: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    entries: HashMap<Vec<u8>, TrackedEntry>,
    advertised: usize,
    records: u64,
    unknown_keys: u64,
    prefixes: BTreeSet<String>,
}

/// Counters reported after applying one event.
///
/// `new` is the number of entries this event moved from 0 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Ordinal of this event among all applied events (1-based).
    pub record: u64,
    /// Keys carried by the event, including undecodable ones.
    pub keys: usize,
    /// Keys that matched a tracked digest.
    pub hits: usize,
    /// Tracked digests advertised for the first time by this event.
    pub new: usize,
    /// Tracked digests advertised at least once so far.
    pub advertised: usize,
    /// Size of the tracked set.
    pub total: usize,
}

/// Thread-safe table of advertisement counts.
///
/// ### Responsibilities
/// - Applies advertisement events atomically with respect to readers
/// - Produces consistent [`Snapshot`]s for the reporter
///
/// The table itself is never exposed.
pub struct ProvideTracker {
    state: Mutex<TrackerState>,
    total: usize,
}

impl ProvideTracker {
    /// Creates a tracker over the given `(digest, display id)` pairs.
    ///
    /// A digest listed twice is tracked once, under its first display id.
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, String)>,
        K: Into<Vec<u8>>,
    {
        let mut map = HashMap::new();
        for (digest, display_id) in entries {
            let digest: Vec<u8> = digest.into();
            let kad_id = ident::kad_id(&digest);
            map.entry(digest).or_insert(TrackedEntry {
                display_id,
                kad_id,
                count: 0,
            });
        }
        let total = map.len();
        Self {
            state: Mutex::new(TrackerState {
                entries: map,
                ..TrackerState::default()
            }),
            total,
        }
    }

    /// Creates a tracker from identifier strings, keyed by their digests.
    ///
    /// Identifiers that fail to decode are logged and skipped.
    pub fn from_ids<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let entries = ids.into_iter().filter_map(|id| match ident::digest_of(id) {
            Ok(digest) => Some((digest, id.to_string())),
            Err(e) => {
                tracing::warn!(id, error = %e, "skipping undecodable identifier");
                None
            }
        });
        Self::new(entries)
    }

    /// Number of tracked digests. Fixed for the tracker's lifetime.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Applies one advertisement event under the lock.
    pub async fn apply(&self, ev: &ProvideEvent) -> ApplyOutcome {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        state.records += 1;
        if !state.prefixes.contains(&ev.prefix) {
            state.prefixes.insert(ev.prefix.clone());
        }

        let mut hits = 0;
        let mut new = 0;
        for key in &ev.keys {
            let Ok(raw) = STANDARD.decode(key) else {
                continue;
            };
            match state.entries.get_mut(&raw) {
                Some(entry) => {
                    if entry.count == 0 {
                        state.advertised += 1;
                        new += 1;
                    }
                    entry.count += 1;
                    hits += 1;
                }
                None => state.unknown_keys += 1,
            }
        }

        ApplyOutcome {
            record: state.records,
            keys: ev.keys.len(),
            hits,
            new,
            advertised: state.advertised,
            total: self.total,
        }
    }

    /// Returns a consistent view of the counters.
    ///
    /// Reflects every event applied before the lock was taken, none partially.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().await;

        let mut histogram = BTreeMap::new();
        let mut unadvertised = Vec::new();
        for entry in state.entries.values() {
            *histogram.entry(entry.count).or_insert(0usize) += 1;
            if entry.count == 0 {
                unadvertised.push(Unadvertised {
                    id: entry.display_id.clone(),
                    kad_id: entry.kad_id,
                });
            }
        }
        unadvertised.sort_unstable_by(|a, b| (a.kad_prefix(), &a.id).cmp(&(b.kad_prefix(), &b.id)));

        Snapshot {
            total_tracked: self.total,
            distinct_advertised: state.advertised,
            total_records: state.records,
            unknown_keys: state.unknown_keys,
            prefixes: state.prefixes.iter().cloned().collect(),
            histogram,
            unadvertised,
        }
    }

    /// Returns the advertisement count of `digest`, or `None` if it is not tracked.
    pub async fn count(&self, digest: &[u8]) -> Option<u64> {
        self.state.lock().await.entries.get(digest).map(|e| e.count)
    }
}
