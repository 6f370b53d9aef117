use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Parser;
use codestream::config::Config;
use codestream::logging::init_tracing;
use codestream::stream::{drive, ChunkStream, Reconciled, SessionOutcome};
use codestream::Snapshot;
use futures::stream;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Replays a recorded generation response and prints the artifacts it
/// produces once patches are reconciled.
#[derive(Debug, Parser)]
#[command(name = "codestream", version)]
struct Cli {
    /// Response transcript to replay; reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// JSON object mapping paths to their content before the session.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Bytes per replayed chunk.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// Print how each patch operation matched to stderr.
    #[arg(long)]
    report: bool,

    /// Report artifacts as they change while the response is replayed.
    #[arg(long)]
    progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    config.validate()?;
    init_tracing(&config)?;

    if cli.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let response = read_response(cli.input.as_deref())?;
    let snapshot = load_snapshot(cli.snapshot.as_deref())?;

    let progress = cli.progress;
    let outcome = drive(
        replay(&response, cli.chunk_size),
        &snapshot,
        config.session_options(),
        |update| {
            if !progress {
                return;
            }
            for path in &update.changed {
                let size = update.artifacts.get(path).map_or(0, str::len);
                eprintln!("~ {path} ({size} bytes)");
            }
        },
    )
    .await?;

    if cli.report {
        if let SessionOutcome::Artifacts(reconciled) = &outcome {
            print_report(reconciled);
        }
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn read_response(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response {}", path.display())),
        None => {
            let mut response = String::new();
            std::io::stdin()
                .read_to_string(&mut response)
                .context("Failed to read response from stdin")?;
            Ok(response)
        }
    }
}

fn load_snapshot(path: Option<&Path>) -> Result<Snapshot> {
    let Some(path) = path else {
        return Ok(Snapshot::empty());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Snapshot {} is not a JSON object of strings", path.display()))
}

fn replay(response: &str, chunk_size: usize) -> ChunkStream {
    let chunks: Vec<Result<Bytes>> = response
        .as_bytes()
        .chunks(chunk_size)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    Box::pin(stream::iter(chunks))
}

fn print_report(reconciled: &Reconciled) {
    for (path, content) in &reconciled.files {
        let Some(report) = reconciled.patches.get(path) else {
            eprintln!("= {path} rewritten ({} bytes)", content.len());
            continue;
        };
        eprintln!(
            "= {path} patched ({}/{} operations applied)",
            report.operations.len() - report.failures().count(),
            report.operations.len()
        );
        for outcome in &report.operations {
            eprintln!("  {}", outcome.summary());
        }
    }
}
