//! # Readiness detection on the control stream.
//!
//! Scans until a line contains the readiness marker, echoing every line
//! (marker line included) to the caller.
//!
//! There is no deadline here; callers that want one wrap the future in
//! `tokio::time::timeout`.

use tokio::io::AsyncRead;

use crate::error::MonitorError;
use crate::extract::LineScanner;

/// Blocks until `marker` appears on the stream.
///
/// Returns [`MonitorError::Readiness`] if the stream ends first and
/// [`MonitorError::Scan`] if a line cannot be read.
/// On success the scanner is positioned right after the marker line.
pub async fn await_ready<R, F>(
    scanner: &mut LineScanner<R>,
    marker: &str,
    mut echo: F,
) -> Result<(), MonitorError>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    while let Some(line) = scanner.next_line().await? {
        echo(&line);
        if line.contains(marker) {
            return Ok(());
        }
    }
    Err(MonitorError::Readiness {
        marker: marker.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Daemon is ready";

    #[tokio::test]
    async fn returns_after_marker_and_echoes_every_line() {
        let input = &b"Initializing daemon...\nAPI server listening\nDaemon is ready\nafter\n"[..];
        let mut sc = LineScanner::new(input, 1024);
        let mut seen = Vec::new();

        await_ready(&mut sc, MARKER, |l| seen.push(l.to_string()))
            .await
            .unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(sc.next_line().await.unwrap().as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn end_of_stream_without_marker_is_an_error() {
        let mut sc = LineScanner::new(&b"Initializing daemon...\nError: lock held\n"[..], 1024);
        let err = await_ready(&mut sc, MARKER, |_| {}).await.unwrap_err();
        assert!(matches!(err, MonitorError::Readiness { .. }));
    }

    #[tokio::test]
    async fn oversized_line_is_a_scan_error() {
        let mut sc = LineScanner::new(&b"0123456789abcdef\nDaemon is ready\n"[..], 4);
        let err = await_ready(&mut sc, MARKER, |_| {}).await.unwrap_err();
        assert!(matches!(err, MonitorError::Scan(_)));
    }
}
