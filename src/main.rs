//! # provwatch CLI
//!
//! ```bash
//! # Bootstrap a repository, publish ./generated_files and monitor advertisements
//! provwatch monitor --content-dir generated_files --report-interval-secs 60
//!
//! # Print the DHT key of every identifier in a list
//! provwatch kad-ids cids.txt
//!
//! # Find a peer identity whose DHT key starts with 0x00
//! provwatch vanity --prefix-byte 0x00
//!
//! # Keep one identifier per 8-bit DHT key prefix
//! provwatch kad-ids --select cids.txt > output.txt
//!
//! # Write one content file per 8-bit (or 10-bit) DHT key prefix
//! provwatch generate --out generated_files [--bits 10]
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`). Reports and utility output
//! go to stdout.

use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;

use provwatch::ident::generate::PrefixWidth;
use provwatch::ident::{generate, kad, vanity};
use provwatch::{Config, LogWriter, RunController, Subscribe};

#[derive(FromArgs)]
/// provwatch - observe DHT advertisement coverage of a content node
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Monitor(MonitorArgs),
    KadIds(KadIdsArgs),
    Vanity(VanityArgs),
    Generate(GenerateArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "monitor")]
/// bootstrap a node, publish content and monitor its advertisements
struct MonitorArgs {
    /// node executable
    #[argh(option, default = "\"ipfs\".into()")]
    program: String,

    /// repository directory (wiped on start)
    #[argh(option, default = "PathBuf::from(\".ipfs\")")]
    repo: PathBuf,

    /// directory to publish and track
    #[argh(option, default = "PathBuf::from(\"generated_files\")")]
    content_dir: PathBuf,

    /// seconds to wait for the node to exit after SIGTERM
    #[argh(option, default = "15")]
    grace_secs: u64,

    /// seconds between status reports
    #[argh(option, default = "60")]
    report_interval_secs: u64,

    /// seconds to wait for readiness (0 = no deadline)
    #[argh(option, default = "0")]
    readiness_timeout_secs: u64,

    /// reprovide interval configured on the node, in seconds
    #[argh(option, default = "600")]
    reprovide_secs: u64,

    /// provide strategy configured on the node
    #[argh(option, default = "\"pinned\".into()")]
    strategy: String,

    /// highest advertisement count shown in the distribution
    #[argh(option, default = "100")]
    histogram_cap: u64,

    /// list unadvertised identifiers when at most this many remain
    #[argh(option, default = "16")]
    missing_list_limit: usize,

    /// maximum diagnostic line length in bytes
    #[argh(option, default = "1 << 20")]
    line_capacity: usize,
}

impl MonitorArgs {
    fn into_config(self) -> Config {
        let mut cfg = Config {
            program: self.program,
            repo_path: self.repo,
            content_dir: self.content_dir,
            grace: Duration::from_secs(self.grace_secs),
            report_interval: Duration::from_secs(self.report_interval_secs),
            readiness_timeout: Duration::from_secs(self.readiness_timeout_secs),
            histogram_cap: self.histogram_cap,
            missing_list_limit: self.missing_list_limit,
            line_capacity: self.line_capacity,
            ..Config::default()
        };
        cfg.node.reprovide_interval = Duration::from_secs(self.reprovide_secs);
        cfg.node.strategy = self.strategy;
        cfg
    }
}

#[derive(FromArgs)]
#[argh(subcommand, name = "kad-ids")]
/// print `<kadid hex> <identifier>` for each identifier in a file
struct KadIdsArgs {
    /// file with one identifier per line
    #[argh(positional)]
    file: PathBuf,

    /// print only the first identifier for each 8-bit DHT key prefix
    #[argh(switch)]
    select: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "vanity")]
/// search for a peer identity whose DHT key starts with a given byte
struct VanityArgs {
    /// wanted first byte of the DHT key (decimal or 0x-prefixed hex)
    #[argh(option, default = "0", from_str_fn(parse_byte))]
    prefix_byte: u8,

    /// give up after this many attempts
    #[argh(option)]
    max_attempts: Option<u64>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "generate")]
/// write one content file per DHT key prefix
struct GenerateArgs {
    /// output directory
    #[argh(option, default = "PathBuf::from(\"generated_files\")")]
    out: PathBuf,

    /// prefix width in bits: 8 (256 files) or 10 (1024 files)
    #[argh(option, default = "PrefixWidth::Bits8")]
    bits: PrefixWidth,

    /// summary file (default: gen_output.txt next to the output directory)
    #[argh(option)]
    summary: Option<PathBuf>,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte {s:?}: {e}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli: Cli = argh::from_env();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Monitor(args) => {
            let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
            let controller = RunController::new(args.into_config(), subs);
            let outcome = controller.run().await;
            Ok(ExitCode::from(outcome.exit_code()))
        }
        Commands::KadIds(args) => {
            let file = std::fs::File::open(&args.file)
                .with_context(|| format!("open {}", args.file.display()))?;
            let (input, out) = (BufReader::new(file), std::io::stdout().lock());
            if args.select {
                let summary = kad::select(input, out)?;
                tracing::info!(selected = summary.converted, skipped = summary.skipped, "selected one identifier per prefix");
            } else {
                let summary = kad::convert(input, out)?;
                tracing::info!(converted = summary.converted, skipped = summary.skipped, "done");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Vanity(args) => {
            let prefix = args.prefix_byte;
            let mined = tokio::task::spawn_blocking(move || vanity::mine(prefix, args.max_attempts))
                .await
                .context("vanity search panicked")?;
            let Some((id, attempts)) = mined else {
                anyhow::bail!("no identity with prefix {prefix:#04x} found");
            };
            let mut out = std::io::stdout().lock();
            writeln!(out, "Found after {attempts} attempts!")?;
            writeln!(out, "PeerID:  {}", id.peer_id())?;
            writeln!(out, "PrivKey: {}", id.priv_key())?;
            writeln!(out, "KadID:   {}", id.kad_hex())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate(args) => {
            let (files, tried) = generate::cover_prefixes(args.bits)?;
            let summary = args
                .summary
                .unwrap_or_else(|| generate::default_summary_path(&args.out));
            generate::write_files(&files, &args.out, &summary)
                .await
                .with_context(|| format!("write {}", args.out.display()))?;
            println!("Needed {tried} iterations to cover all {} prefixes", files.len());
            println!("Wrote {} files to {}", files.len(), args.out.display());
            println!("Wrote CID + KadID list to {}", summary.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
