// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `ics`: thin demo/debug front door over `ics-session` (§6 CLI surface).
//!
//! `ics [sources-dir]` loads every source file already on disk under
//! `sources-dir` into a fresh session, compiles once, and prints the
//! resulting diagnostics and loaded modules. It exists only to give the
//! workspace a runnable entry point to poke at — real clients are
//! expected to embed `ics-session` directly rather than shell out to
//! this binary. The worker side of §6 ("`progname --server ...`") is a
//! separate binary, `ics-worker`; see `crates/session/src/spawn.rs` for
//! why this binary doesn't re-exec itself the way the specification's
//! single-binary model assumes.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ics_core::{SessionConfig, UpdateBatch};
use ics_session::{IdeSession, ProcessSpawner, WorkerSpawner};

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "ics", about = "Interactive compilation session demo client")]
struct Cli {
    /// Directory of source modules to load into the demo session.
    sources_dir: Option<PathBuf>,

    /// Root directory for the session's working/data/temp directories.
    /// Defaults to a fresh temporary directory.
    #[arg(long)]
    session_root: Option<PathBuf>,

    /// Path to the `ics-worker` binary. Defaults to a sibling of this
    /// executable named `ics-worker`.
    #[arg(long)]
    worker_exe: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// TOML file of persisted static options (static compiler flags,
    /// package-db stack, source extensions) to merge onto the session
    /// config. See `ics_core::config::StaticOptionsFile`.
    #[arg(long)]
    static_options: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Compile once and print diagnostics plus loaded modules (the default).
    Compile,
    /// Compile once, then run `module.identifier` and stream its output.
    Run {
        module: String,
        identifier: String,
    },
}

fn default_worker_exe() -> anyhow::Result<PathBuf> {
    let mut exe = std::env::current_exe()?;
    exe.pop();
    exe.push(if cfg!(windows) { "ics-worker.exe" } else { "ics-worker" });
    Ok(exe)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let session_root = match cli.session_root {
        Some(root) => root,
        None => tempfile::tempdir()?.keep(),
    };
    let sources_dir = cli.sources_dir.unwrap_or_else(|| session_root.join("src"));
    let mut config = SessionConfig::new(
        sources_dir.clone(),
        session_root.join("work"),
        session_root.join("data"),
        session_root.join("tmp"),
    );
    if let Some(path) = &cli.static_options {
        config = config.merge_static_options_file(ics_core::config::load_static_options(path)?);
    }

    let worker_exe = match cli.worker_exe {
        Some(path) => path,
        None => default_worker_exe()?,
    };
    let spawner: Arc<dyn WorkerSpawner> = Arc::new(ProcessSpawner::new(worker_exe));
    let session = IdeSession::init(config, spawner);

    let batch = load_sources(&sources_dir)?;
    let session = if batch.is_empty() { session } else { session.update_files(batch)? };

    let handle = session.update_session().await?;
    let session = handle
        .wait(|progress| tracing::info!(step = progress.step, message = %progress.message, "compiling"))
        .await?;

    match cli.command.unwrap_or(Command::Compile) {
        Command::Compile => {
            output::print_compile_result(cli.format, &session)?;
            if session.get_source_errors()?.iter().any(|d| d.is_error()) {
                anyhow::bail!("compilation produced errors");
            }
        }
        Command::Run { module, identifier } => {
            let run = session.run_stmt(&module, &identifier).await?;
            let outcome = run
                .wait(|bytes| {
                    use std::io::Write;
                    let _ = std::io::stdout().write_all(bytes);
                })
                .await?;
            output::print_run_outcome(cli.format, &outcome)?;
        }
    }

    session.shutdown().await?;
    Ok(())
}

/// Reads every file already on disk under `sources_dir` into an
/// `UpdateBatch`, so a fresh demo session starts from whatever the user
/// already has on disk rather than requiring a separate "upload" step.
fn load_sources(sources_dir: &std::path::Path) -> anyhow::Result<UpdateBatch> {
    let mut batch = UpdateBatch::empty();
    if !sources_dir.exists() {
        return Ok(batch);
    }
    for entry in std::fs::read_dir(sources_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let contents = std::fs::read(&path)?;
        batch = batch.put_module(name, contents);
    }
    Ok(batch)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
