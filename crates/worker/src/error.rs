// SPDX-License-Identifier: MIT

//! Worker-process error types (§7 taxonomy items 3, 4, 6, 7).

use thiserror::Error;

/// A fault raised by the embedded [`crate::engine::CompileEngine`] while
/// handling a single request.
///
/// `Exception` is the caught-uncaught-exception case of §4.7: the engine
/// carries along whatever diagnostics it had already collected before the
/// fault, so the dispatch loop can still ship a `Computed` result rather
/// than losing the whole request.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("compile engine exception: {message}")]
    Exception { message: String, partial_diagnostics: Vec<ics_core::Diagnostic> },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Faults that can end the worker's dispatch loop outright.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Protocol(#[from] ics_wire::ProtocolError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
