//! Log event extraction: turning the node's text streams into structured signals.
//!
//! - [`LineScanner`]: bounded, line-oriented reader (fatal on over-capacity lines)
//! - [`await_ready`]: blocks until the readiness marker appears on the control stream
//! - [`ProvideExtractor`]: best-effort parse of advertisement lines into [`ProvideEvent`]s
//! - [`scan_provides`]: drives the diagnostic stream into the tracker

mod lines;
mod provide;
mod readiness;
mod record;

pub use lines::LineScanner;
pub use provide::{DIAGNOSTIC_STREAM, scan_provides};
pub use readiness::await_ready;
pub use record::{ProvideEvent, ProvideExtractor};
