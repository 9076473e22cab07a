use std::collections::BTreeMap;

/// Read-only view of the tracker at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Size of the tracked set.
    pub total_tracked: usize,
    /// Tracked digests advertised at least once.
    pub distinct_advertised: usize,
    /// Advertisement events applied (not keys).
    pub total_records: u64,
    /// Decoded keys that were not tracked.
    pub unknown_keys: u64,
    /// Distinct `prefix` values seen across events, sorted.
    pub prefixes: Vec<String>,
    /// Advertisement count → number of entries holding exactly that count.
    pub histogram: BTreeMap<u64, usize>,
    /// Entries never advertised, grouped by KadID prefix.
    pub unadvertised: Vec<Unadvertised>,
}

/// A tracked entry that has not been advertised yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unadvertised {
    /// Identifier text.
    pub id: String,
    /// DHT placement key of its digest.
    pub kad_id: [u8; 32],
}

impl Unadvertised {
    /// First byte of the KadID.
    #[inline]
    pub fn kad_prefix(&self) -> u8 {
        self.kad_id[0]
    }
}

impl Snapshot {
    /// Number of distinct `prefix` values seen.
    #[inline]
    pub fn distinct_prefixes(&self) -> usize {
        self.prefixes.len()
    }

    /// Histogram buckets with a count of at most `cap`, in ascending order.
    pub fn buckets_upto(&self, cap: u64) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.histogram.range(..=cap).map(|(count, n)| (*count, *n))
    }

    /// Share of tracked digests advertised so far, in percent.
    pub fn coverage_percent(&self) -> f64 {
        if self.total_tracked == 0 {
            return 0.0;
        }
        self.distinct_advertised as f64 * 100.0 / self.total_tracked as f64
    }
}
