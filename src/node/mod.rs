//! Node repository preparation, run before the daemon starts.
//!
//! - [`NodeCli`]: one-shot CLI invocations against the repository
//! - [`bootstrap`]: fresh repository with fixed settings and identity
//! - [`ingest`]: publish the content directory, collect identifiers

mod bootstrap;
mod cli;
mod ingest;

pub use bootstrap::{bootstrap, config_commands, write_identity};
pub use cli::NodeCli;
pub use ingest::{Ingested, ingest};
