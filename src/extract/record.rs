//! # Advertisement event extraction.
//!
//! The node logs each provide batch as free text followed by a JSON object:
//!
//! ```text
//! 2025-01-01T00:00:00Z DEBUG dht/provider sent provider record {"prefix":"0110","keys":["EiD..."]}
//! ```
//!
//! Extraction is best effort. A line is skipped without error when:
//! - it lacks the event marker,
//! - it has no `{` after which a payload could start,
//! - the text from the first `{` is not a JSON object with the expected shape.

use serde::Deserialize;

/// One advertisement batch observed in the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideEvent {
    /// Ordinal among events extracted from this stream (1-based).
    pub seq: u64,
    /// Keyspace prefix the batch was sent for.
    pub prefix: String,
    /// Base64-encoded digests, in logged order.
    pub keys: Vec<String>,
}

/// Wire shape of the embedded payload. Missing or null fields decode as empty.
#[derive(Debug, Deserialize)]
struct ProvidePayload {
    #[serde(default)]
    keys: Option<Vec<String>>,
    #[serde(default)]
    prefix: Option<String>,
}

/// Turns diagnostic lines into [`ProvideEvent`]s.
#[derive(Debug, Clone)]
pub struct ProvideExtractor {
    marker: String,
    seq: u64,
}

impl ProvideExtractor {
    /// Creates an extractor that only considers lines containing `marker`.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            seq: 0,
        }
    }

    /// Extracts an event from `line`, or `None` if the line is not one.
    pub fn extract(&mut self, line: &str) -> Option<ProvideEvent> {
        if !line.contains(self.marker.as_str()) {
            return None;
        }
        let start = line.find('{')?;
        let payload: ProvidePayload = serde_json::from_str(&line[start..]).ok()?;

        self.seq += 1;
        Some(ProvideEvent {
            seq: self.seq,
            prefix: payload.prefix.unwrap_or_default(),
            keys: payload.keys.unwrap_or_default(),
        })
    }

    /// Number of events extracted so far.
    #[inline]
    pub fn extracted(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "sent provider record";

    #[test]
    fn extracts_keys_and_prefix() {
        let mut x = ProvideExtractor::new(MARKER);
        let line = r#"2025-05-01T10:00:00.000Z	DEBUG	dht/provider	sent provider record	{"prefix": "0110", "keys": ["AAE=", "AgM="], "count": 2}"#;

        let ev = x.extract(line).expect("event");
        assert_eq!(ev.seq, 1);
        assert_eq!(ev.prefix, "0110");
        assert_eq!(ev.keys, vec!["AAE=".to_string(), "AgM=".to_string()]);
    }

    #[test]
    fn skips_lines_without_marker() {
        let mut x = ProvideExtractor::new(MARKER);
        assert!(x.extract(r#"DEBUG dht looking up {"keys": ["AAE="]}"#).is_none());
        assert_eq!(x.extracted(), 0);
    }

    #[test]
    fn skips_lines_without_payload() {
        let mut x = ProvideExtractor::new(MARKER);
        assert!(x.extract("DEBUG sent provider record to 12 peers").is_none());
    }

    #[test]
    fn skips_malformed_payloads() {
        let mut x = ProvideExtractor::new(MARKER);
        for line in [
            r#"sent provider record {"keys": ["AAE="]"#,
            r#"sent provider record {"keys": "AAE="}"#,
            r#"sent provider record {"keys": []} trailing"#,
            "sent provider record {not json}",
        ] {
            assert!(x.extract(line).is_none(), "{line}");
        }
        assert_eq!(x.extracted(), 0);
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let mut x = ProvideExtractor::new(MARKER);
        let ev = x.extract(r#"sent provider record {}"#).expect("event");
        assert!(ev.keys.is_empty());
        assert_eq!(ev.prefix, "");
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let mut x = ProvideExtractor::new(MARKER);
        let ev = x
            .extract(r#"sent provider record {"prefix": "01", "keys": null}"#)
            .expect("event");
        assert!(ev.keys.is_empty());
        assert_eq!(ev.prefix, "01");

        let ev = x
            .extract(r#"sent provider record {"prefix": null, "keys": ["AAE="]}"#)
            .expect("event");
        assert_eq!(ev.prefix, "");
        assert_eq!(ev.keys, vec!["AAE=".to_string()]);
        assert_eq!(x.extracted(), 2);
    }

    #[test]
    fn payload_starts_at_first_brace() {
        let mut x = ProvideExtractor::new(MARKER);
        // A brace before the marker still starts the payload.
        assert!(x.extract(r#"{x} sent provider record {"keys": []}"#).is_none());
        let ev = x.extract(r#"sent provider record {"prefix": "1"}"#).unwrap();
        assert_eq!(ev.seq, 1);
    }
}
