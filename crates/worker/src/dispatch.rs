// SPDX-License-Identifier: MIT

//! The worker's RPC dispatch loop (C8): reads one [`ClientFrame`] at a
//! time (the exactly-one-in-flight rule of §4.6), drives the engine, and
//! streams back `Progress`/`Result` frames.
//!
//! The engine is a synchronous, opaque collaborator (§1) with no
//! preemption point to cancel into, so it is driven straight off this
//! loop rather than handed to a background task. Cancellation (§5, §8
//! scenario 6) is instead a client-side concern: `cancel()` sends
//! `Shutdown`, which this loop picks up as soon as the in-flight
//! request's `Result` has gone out, and the client stops waiting rather
//! than requiring the worker to abort mid-compile.

use ics_core::{ComputedResult, Diagnostic, ExplicitSharingCache, Progress};
use ics_wire::{
    read_client_frame, write_ping, write_progress, write_result, ClientFrame, ProgressFrame,
    ProtocolError, Request, ResultFrame, RunOutcome,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::engine::{CompileEngine, CompileRequest};
use crate::error::{EngineError, WorkerError};

/// Run the dispatch loop until the client sends `Shutdown` or the
/// transport is gone. `static_options` are the options the worker was
/// booted with (its argv, left of `--ghc-opts-end`); they are prepended
/// to whatever dynamic options the client supplies, per §9's "static set
/// the worker keeps, dynamic portion replaced per-request" rule.
pub async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    static_options: Vec<String>,
    engine: &mut dyn CompileEngine,
) -> Result<(), WorkerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut dynamic_options: Vec<String> = Vec::new();

    loop {
        let frame = match read_client_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(ProtocolError::WorkerGone) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        match frame {
            ClientFrame::Shutdown => return Ok(()),
            ClientFrame::Ping => write_ping(&mut writer).await?,
            ClientFrame::Request(Request::Compile {
                dynamic_options: requested_options,
                sources_dir,
                generate_code,
                source_extensions,
            }) => {
                if let Some(requested) = requested_options {
                    dynamic_options = requested;
                }
                let options: Vec<String> =
                    static_options.iter().cloned().chain(dynamic_options.iter().cloned()).collect();

                let mut compiled = Vec::new();
                let request = CompileRequest {
                    options: &options,
                    sources_dir: &sources_dir,
                    generate_code,
                    source_extensions: &source_extensions,
                };
                let outcome = engine.compile(&request, &mut |m| compiled.push(m.to_string()));

                emit_progress(&mut writer, &compiled).await?;
                let computed = fold_compile_outcome(outcome, engine);
                write_result(&mut writer, &ResultFrame::Computed(computed)).await?;
            }
            ClientFrame::Request(Request::Run { module, identifier, env_overlay }) => {
                let mut chunks: Vec<Vec<u8>> = Vec::new();
                let outcome = engine.run(&module, &identifier, &env_overlay, &mut |bytes| {
                    chunks.push(bytes.to_vec())
                });

                for chunk in &chunks {
                    write_progress(&mut writer, &ProgressFrame::Output(chunk.clone())).await?;
                }

                let run_outcome = match outcome {
                    Ok(outcome) => outcome,
                    Err(EngineError::Exception { message, .. }) => {
                        engine.reset();
                        RunOutcome::Exception { message }
                    }
                    Err(EngineError::Io(err)) => RunOutcome::Exception { message: err.to_string() },
                };
                write_result(&mut writer, &ResultFrame::Run(run_outcome)).await?;
            }
        }
    }
}

async fn emit_progress<W: AsyncWrite + Unpin>(
    writer: &mut W,
    compiled: &[String],
) -> Result<(), WorkerError> {
    let mut progress: Option<Progress> = None;
    for module in compiled {
        let message = format!("compiling {module} ... done.");
        let next = match &progress {
            None => Progress::start(message),
            Some(prev) => prev.advance(message),
        };
        write_progress(writer, &ProgressFrame::Compiling(next.clone())).await?;
        progress = Some(next);
    }
    Ok(())
}

/// Fold an engine outcome into the `Computed` result the session sees.
/// An `Exception` is the §4.7 resilience path: already-collected
/// diagnostics are kept, an `OtherError` is appended, and the engine is
/// reset so the next request starts clean. A preliminary `Io` failure
/// (e.g. `sourcesDir` unreadable) is folded the same way but does not
/// reset the engine, since nothing about its internal state is at fault.
fn fold_compile_outcome(
    outcome: Result<ComputedResult, EngineError>,
    engine: &mut dyn CompileEngine,
) -> ComputedResult {
    match outcome {
        Ok(computed) => computed,
        Err(EngineError::Exception { message, mut partial_diagnostics }) => {
            partial_diagnostics.push(Diagnostic::other(message));
            engine.reset();
            ComputedResult {
                diagnostics: partial_diagnostics,
                loaded_modules: Vec::new(),
                strings: ExplicitSharingCache::new(),
                module_diffs: Default::default(),
            }
        }
        Err(EngineError::Io(err)) => ComputedResult {
            diagnostics: vec![Diagnostic::other(err.to_string())],
            loaded_modules: Vec::new(),
            strings: ExplicitSharingCache::new(),
            module_diffs: Default::default(),
        },
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
