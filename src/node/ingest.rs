//! Content ingestion: publish a directory and collect its identifiers.

use std::path::Path;

use crate::error::MonitorError;
use crate::node::NodeCli;

/// Identifiers produced by ingesting a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// One identifier per file, in output order.
    pub files: Vec<String>,
    /// Identifier of the directory itself.
    pub dir: String,
}

impl Ingested {
    /// File identifiers followed by the directory identifier.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.dir.as_str()))
    }

    /// Splits quiet `add` output: the last line is the directory.
    pub fn parse(output: &str, dir: &Path) -> Result<Self, MonitorError> {
        let mut lines: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        let Some(root) = lines.pop() else {
            return Err(MonitorError::Ingest {
                dir: dir.to_path_buf(),
            });
        };
        Ok(Self {
            files: lines,
            dir: root,
        })
    }
}

/// Adds `dir` recursively as CIDv1 with raw leaves.
pub async fn ingest(cli: &NodeCli, dir: &Path) -> Result<Ingested, MonitorError> {
    let path = dir.to_string_lossy();
    let out = cli
        .run(&["add", "-r", "-q", "--cid-version=1", "--raw-leaves", &path])
        .await?;
    let ingested = Ingested::parse(&out, dir)?;
    tracing::info!(files = ingested.files.len(), dir_id = %ingested.dir, "content ingested");
    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_line_is_the_directory() {
        let got = Ingested::parse("bafkA\nbafkB\n\nbafyDir\n", Path::new("d")).unwrap();
        assert_eq!(got.files, vec!["bafkA", "bafkB"]);
        assert_eq!(got.dir, "bafyDir");
        assert_eq!(got.ids().collect::<Vec<_>>(), vec!["bafkA", "bafkB", "bafyDir"]);
    }

    #[test]
    fn empty_output_is_an_error() {
        let err = Ingested::parse("\n  \n", Path::new("d")).unwrap_err();
        assert!(matches!(err, MonitorError::Ingest { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn ingest_runs_quiet_recursive_add() {
        // `echo` prints the arguments it was given as the single output line.
        let cli = NodeCli::new("echo", Vec::new());
        let got = ingest(&cli, Path::new("generated_files")).await.unwrap();
        assert!(got.files.is_empty());
        assert_eq!(got.dir, "add -r -q --cid-version=1 --raw-leaves generated_files");
    }
}
