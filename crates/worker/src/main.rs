// SPDX-License-Identifier: MIT

//! Worker process entry point (§6): the session re-executes its own
//! binary with argv `["--server", <opts...>, "--ghc-opts-end", <tempdir>]`.
//! Everything left of the sentinel is static compiler options; everything
//! right of it is transport parameters (currently just a scratch tempdir,
//! unused by the toy engine but reserved for a real one).

use ics_worker::{serve, ToyEngine};

/// Split `--server <opts...> --ghc-opts-end <tempdir>` out of a full argv.
fn parse_server_args(args: &[String]) -> Option<(Vec<String>, std::path::PathBuf)> {
    let server_idx = args.iter().position(|a| a == "--server")?;
    let rest = &args[server_idx + 1..];
    let sentinel_idx = rest.iter().position(|a| a == "--ghc-opts-end")?;
    let static_options = rest[..sentinel_idx].to_vec();
    let tempdir = rest.get(sentinel_idx + 1).map(std::path::PathBuf::from)?;
    Some((static_options, tempdir))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some((static_options, tempdir)) = parse_server_args(&args) else {
        eprintln!("usage: {} --server [opts...] --ghc-opts-end <tempdir>", args[0]);
        std::process::exit(2);
    };

    tracing::info!(?static_options, ?tempdir, "worker starting");

    let mut engine = ToyEngine::new();
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    if let Err(err) = serve(stdin, stdout, static_options, &mut engine).await {
        tracing::error!(%err, "worker exiting on transport error");
        std::process::exit(1);
    }
}
