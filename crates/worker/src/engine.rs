// SPDX-License-Identifier: MIT

//! The compiler engine seam (§1): "the compiler itself, treated as an
//! opaque engine offering: compile a set of source files under a set of
//! options, emit diagnostics, emit module metadata; run a named entry
//! point; generate HTML documentation." `CompileEngine` is that
//! interface; [`crate::toy_engine`] is the one implementation this
//! workspace ships, since a real compiler is out of scope.

use std::path::Path;

use ics_core::ComputedResult;
use ics_wire::RunOutcome;

use crate::error::EngineError;

/// The inputs to a single `Compile` request (§4.7), already resolved to
/// the options the worker actually compiles with — the caller
/// (`dispatch::serve`) is responsible for combining static boot-time
/// options with the per-request dynamic override per §9.
pub struct CompileRequest<'a> {
    pub options: &'a [String],
    pub sources_dir: &'a Path,
    pub generate_code: bool,
    pub source_extensions: &'a [String],
}

/// Hosts one compiler instance across the worker's lifetime.
///
/// A `CompileEngine` is expected to be stateful: successive `compile`
/// calls see the previous call's loaded modules for the purpose of
/// computing `ModuleDiff`s, until `reset` wipes that history (as happens
/// after a caught exception, §4.7).
pub trait CompileEngine: Send {
    /// Compile `request.sources_dir` under `request.options`. `on_compiling`
    /// is invoked once per module as it finishes, in compilation order —
    /// the dispatch loop turns each call into one `Progress` frame.
    fn compile(
        &mut self,
        request: &CompileRequest<'_>,
        on_compiling: &mut dyn FnMut(&str),
    ) -> Result<ComputedResult, EngineError>;

    /// Run `identifier` inside `module`. `on_output` is invoked with
    /// successive chunks of captured stdout, in order.
    fn run(
        &mut self,
        module: &str,
        identifier: &str,
        env_overlay: &[(String, Option<String>)],
        on_output: &mut dyn FnMut(&[u8]),
    ) -> Result<RunOutcome, EngineError>;

    /// Discard any remembered compile history. Called after a caught
    /// exception so the next request starts fresh (§4.7).
    fn reset(&mut self);
}
