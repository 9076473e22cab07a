//! # Provide scan: diagnostic stream → tracker.
//!
//! ```text
//! stderr ──► LineScanner ──► ProvideExtractor ──► ProvideTracker::apply
//!                                                       │
//!                                                       └──► Bus: ProvideApplied
//! ```
//!
//! Events are applied strictly in the order they are parsed (single producer).

use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::error::ScanError;
use crate::events::{Bus, Event, EventKind};
use crate::extract::{LineScanner, ProvideExtractor};
use crate::tracker::ProvideTracker;

/// Name used for this stream in events.
pub const DIAGNOSTIC_STREAM: &str = "diagnostic";

/// Scans `scanner` to end-of-stream, applying every extracted event to `tracker`.
///
/// Returns the number of events applied. If a line cannot be read, a
/// `ScanFailed` event is published, the rest of the stream is discarded so the
/// writer never blocks, and the error is returned once the stream closes.
pub async fn scan_provides<R>(
    mut scanner: LineScanner<R>,
    mut extractor: ProvideExtractor,
    tracker: Arc<ProvideTracker>,
    bus: Bus,
) -> Result<u64, ScanError>
where
    R: AsyncRead + Unpin,
{
    loop {
        match scanner.next_line().await {
            Ok(Some(line)) => {
                let Some(ev) = extractor.extract(&line) else {
                    continue;
                };
                let outcome = tracker.apply(&ev).await;
                bus.publish(
                    Event::new(EventKind::ProvideApplied)
                        .with_progress(outcome)
                        .with_reason(ev.prefix),
                );
            }
            Ok(None) => return Ok(extractor.extracted()),
            Err(e) => {
                bus.publish(
                    Event::new(EventKind::ScanFailed)
                        .with_source(DIAGNOSTIC_STREAM)
                        .with_reason(e.to_string()),
                );
                let _ = scanner.drain().await;
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    const MARKER: &str = "sent provider record";

    fn tracker() -> Arc<ProvideTracker> {
        Arc::new(ProvideTracker::new(vec![
            (vec![1u8, 1], "a".to_string()),
            (vec![2u8, 2], "b".to_string()),
        ]))
    }

    fn line(keys: &[Vec<u8>]) -> String {
        let keys: Vec<String> = keys.iter().map(|k| format!("\"{}\"", STANDARD.encode(k))).collect();
        format!("DEBUG {MARKER} {{\"prefix\":\"01\",\"keys\":[{}]}}\n", keys.join(","))
    }

    #[tokio::test]
    async fn noise_leaves_tracker_untouched() {
        let t = tracker();
        let before = t.snapshot().await;
        let input = format!(
            "{}\n{}\n{}\n{}\n",
            "INFO unrelated line",
            "DEBUG sent provider record without payload",
            "DEBUG sent provider record {\"keys\": [\"AQE=\"",
            "DEBUG other {\"keys\": [\"AQE=\"]}",
        );
        let sc = LineScanner::new(input.as_bytes(), 1024);

        let n = scan_provides(sc, ProvideExtractor::new(MARKER), t.clone(), Bus::new(8))
            .await
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(t.snapshot().await, before);
    }

    #[tokio::test]
    async fn applies_events_in_order_and_publishes_progress() {
        let t = tracker();
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let input = format!("{}noise\n{}", line(&[vec![1, 1]]), line(&[vec![1, 1], vec![2, 2], vec![9]]));
        let sc = LineScanner::new(input.as_bytes(), 1024);

        let n = scan_provides(sc, ProvideExtractor::new(MARKER), t.clone(), bus)
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(t.count(&[1, 1]).await, Some(2));
        assert_eq!(t.count(&[2, 2]).await, Some(1));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.progress.unwrap().new, 1);
        assert_eq!(first.reason.as_deref(), Some("01"));
        let p = second.progress.unwrap();
        assert_eq!((p.record, p.keys, p.new, p.advertised, p.total), (2, 3, 1, 2, 2));
    }

    #[tokio::test]
    async fn oversized_line_stops_the_scan() {
        let t = tracker();
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let input = format!("{}{}\n{}", line(&[vec![1, 1]]), "x".repeat(200), line(&[vec![2, 2]]));
        let sc = LineScanner::new(input.as_bytes(), 100);

        let err = scan_provides(sc, ProvideExtractor::new(MARKER), t.clone(), bus)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::LineTooLong { capacity: 100 }));
        // Nothing after the oversized line is applied.
        assert_eq!(t.count(&[2, 2]).await, Some(0));

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProvideApplied);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ScanFailed);
    }
}
