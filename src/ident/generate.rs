//! Test content covering every KadID prefix of a chosen width.
//!
//! | Width   | Files | Candidate content | File name            |
//! |---------|-------|-------------------|----------------------|
//! | 8 bits  | 256   | `ipfs-test-{n}\n` | `prefix-{hex:02x}.txt` |
//! | 10 bits | 1024  | `{n}\n`           | `prefix-{dec:04}.txt`  |
//!
//! Candidates are tried for n = 0, 1, 2, ... The first candidate whose raw
//! identifier lands in a new prefix is kept until every prefix is covered.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::fs;

use crate::ident::{kad_id, raw_content_id};

/// How many leading KadID bits a prefix spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixWidth {
    #[default]
    Bits8,
    Bits10,
}

impl PrefixWidth {
    /// Number of distinct prefixes.
    pub fn slots(self) -> usize {
        match self {
            Self::Bits8 => 256,
            Self::Bits10 => 1024,
        }
    }

    /// Leading bits of `kad` as an integer.
    pub fn prefix_of(self, kad: &[u8; 32]) -> u16 {
        match self {
            Self::Bits8 => u16::from(kad[0]),
            Self::Bits10 => (u16::from(kad[0]) << 2) | u16::from(kad[1] >> 6),
        }
    }

    fn candidate(self, n: u64) -> String {
        match self {
            Self::Bits8 => format!("ipfs-test-{n}\n"),
            Self::Bits10 => format!("{n}\n"),
        }
    }

    fn file_name(self, prefix: u16) -> String {
        match self {
            Self::Bits8 => format!("prefix-{prefix:02x}.txt"),
            Self::Bits10 => format!("prefix-{prefix:04}.txt"),
        }
    }
}

impl FromStr for PrefixWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "8" => Ok(Self::Bits8),
            "10" => Ok(Self::Bits10),
            other => Err(format!("unsupported prefix width {other:?} (use 8 or 10)")),
        }
    }
}

/// One generated content file.
#[derive(Debug, Clone)]
pub struct PrefixFile {
    /// Prefix width this file was generated for.
    pub width: PrefixWidth,
    /// Leading KadID bits the content lands in.
    pub prefix: u16,
    /// File body.
    pub content: String,
    /// Raw CIDv1 of `content`.
    pub cid: String,
    /// Full KadID of the content's digest.
    pub kad_id: [u8; 32],
}

impl PrefixFile {
    /// Name of the file inside the output directory.
    pub fn file_name(&self) -> String {
        self.width.file_name(self.prefix)
    }
}

/// Finds one content per prefix. Returns the files ordered by prefix and the
/// number of candidates tried.
pub fn cover_prefixes(width: PrefixWidth) -> Result<(Vec<PrefixFile>, u64), cid::Error> {
    let slots = width.slots();
    let mut found: Vec<Option<PrefixFile>> = vec![None; slots];
    let mut covered = 0;
    let mut n = 0u64;

    while covered < slots {
        let content = width.candidate(n);
        n += 1;
        let (cid, digest) = raw_content_id(content.as_bytes())?;
        let kad = kad_id(&digest);
        let prefix = width.prefix_of(&kad);
        let slot = &mut found[usize::from(prefix)];
        if slot.is_none() {
            *slot = Some(PrefixFile {
                width,
                prefix,
                content,
                cid: cid.to_string(),
                kad_id: kad,
            });
            covered += 1;
        }
    }
    Ok((found.into_iter().flatten().collect(), n))
}

/// Default summary location: `gen_output.txt` next to `out_dir`.
pub fn default_summary_path(out_dir: &Path) -> PathBuf {
    match out_dir.parent() {
        Some(parent) => parent.join("gen_output.txt"),
        None => out_dir.join("gen_output.txt"),
    }
}

/// Writes every file into `out_dir` and the `<cid> <kadid hex>` summary to `summary`.
pub async fn write_files(files: &[PrefixFile], out_dir: &Path, summary: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out_dir).await?;
    let mut listing = String::with_capacity(files.len() * 128);
    for f in files {
        fs::write(out_dir.join(f.file_name()), &f.content).await?;
        listing.push_str(&f.cid);
        listing.push(' ');
        listing.push_str(&hex::encode(f.kad_id));
        listing.push('\n');
    }
    fs::write(summary, listing).await
}
