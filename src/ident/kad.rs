//! Identifier list → KadID conversion and prefix selection.
//!
//! Input: one identifier per line (first whitespace-separated field; the rest
//! of the line is ignored).
//!
//! - [`convert`] writes `<hex kadid> <identifier>` per line.
//! - [`select`] keeps the first identifier for each 8-bit KadID prefix.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::ident::{digest_of, kad_id};

/// Totals of a conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KadSummary {
    /// Identifiers written to the output.
    pub converted: usize,
    /// Identifiers that did not decode.
    pub skipped: usize,
}

/// Decodes each identifier of `input` and hands it to `f` with its KadID.
fn for_each_id<R, F>(input: R, summary: &mut KadSummary, mut f: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(&str, [u8; 32]) -> io::Result<()>,
{
    for line in input.lines() {
        let line = line?;
        let Some(id) = line.split_whitespace().next() else {
            continue;
        };
        match digest_of(id) {
            Ok(digest) => f(id, kad_id(&digest))?,
            Err(e) => {
                warn!(id, error = %e, "skipping identifier");
                summary.skipped += 1;
            }
        }
    }
    Ok(())
}

/// Converts every identifier read from `input`, writing results to `out`.
///
/// Blank lines are ignored. Identifiers that do not decode are logged and
/// counted as skipped.
pub fn convert<R: BufRead, W: Write>(input: R, mut out: W) -> io::Result<KadSummary> {
    let mut summary = KadSummary::default();
    let mut converted = 0;
    for_each_id(input, &mut summary, |id, kad| {
        converted += 1;
        writeln!(out, "{} {id}", hex::encode(kad))
    })?;
    summary.converted = converted;
    out.flush()?;
    Ok(summary)
}

/// Writes the first identifier seen for each 8-bit KadID prefix to `out`,
/// ordered by prefix.
///
/// `converted` counts the selected identifiers (at most 256).
pub fn select<R: BufRead, W: Write>(input: R, mut out: W) -> io::Result<KadSummary> {
    let mut summary = KadSummary::default();
    let mut chosen: BTreeMap<u8, String> = BTreeMap::new();
    for_each_id(input, &mut summary, |id, kad| {
        chosen.entry(kad[0]).or_insert_with(|| id.to_string());
        Ok(())
    })?;
    for id in chosen.values() {
        writeln!(out, "{id}")?;
    }
    summary.converted = chosen.len();
    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EMPTY_DIR_CID;

    #[test]
    fn converts_first_field_and_skips_bad_lines() {
        let input = format!("{EMPTY_DIR_CID} extra fields\n\n   \nnope\n{EMPTY_DIR_CID}\n");
        let mut out = Vec::new();

        let summary = convert(input.as_bytes(), &mut out).unwrap();
        assert_eq!(summary, KadSummary { converted: 2, skipped: 1 });

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);

        let (hex_id, id) = lines[0].split_once(' ').unwrap();
        assert_eq!(id, EMPTY_DIR_CID);
        assert_eq!(hex_id.len(), 64);
        let digest = digest_of(EMPTY_DIR_CID).unwrap();
        assert_eq!(hex_id, hex::encode(kad_id(&digest)));
    }

    #[test]
    fn select_keeps_first_identifier_per_prefix() {
        let (a, _) = crate::ident::raw_content_id(b"a").unwrap();
        let (b, _) = crate::ident::raw_content_id(b"b").unwrap();
        let input = format!("{a}\n{EMPTY_DIR_CID}\nnope\n{b}\n{a}\n");
        let mut out = Vec::new();

        let summary = select(input.as_bytes(), &mut out).unwrap();
        assert_eq!(summary.skipped, 1);

        let prefix = |id: &str| kad_id(&digest_of(id).unwrap())[0];
        let mut expected: BTreeMap<u8, String> = BTreeMap::new();
        for id in [a.to_string(), EMPTY_DIR_CID.to_string(), b.to_string()] {
            expected.entry(prefix(&id)).or_insert(id);
        }
        let text = String::from_utf8(out).unwrap();
        let got: Vec<&str> = text.lines().collect();
        let want: Vec<&str> = expected.values().map(String::as_str).collect();
        assert_eq!(got, want);
        assert_eq!(summary.converted, want.len());
    }
}
