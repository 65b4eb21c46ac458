// SPDX-License-Identifier: MIT

//! A minimal [`CompileEngine`] standing in for the real compiler (§1
//! names the compiler itself out of scope). Good enough to exercise the
//! RPC plumbing and the §8 scenarios: it treats each source file as one
//! module, flags a binding whose right-hand side is empty as a
//! `SrcError`, and tracks per-module import lists across compiles so it
//! can report a real `ModuleDiff`.
//!
//! Two marker lines, recognised nowhere in the specification, give tests
//! a deterministic way to trigger the paths a real compiler would only
//! hit nondeterministically:
//! - a line `-- RAISE_ENGINE_EXCEPTION` anywhere in a module aborts the
//!   compile after that module, exercising §8 scenario 5 (worker crash
//!   recovery) without needing an actual crashing compiler;
//! - a binding's right-hand side `RAISE_RUNTIME_EXCEPTION` makes `run`
//!   report [`RunOutcome::Exception`] instead of executing anything.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ics_core::{ComputedResult, Diagnostic, ExplicitSharingCache, ImportEntry, ModuleDiff, SourceSpan};
use ics_wire::RunOutcome;

use crate::engine::{CompileEngine, CompileRequest};
use crate::error::EngineError;

const CRASH_MARKER: &str = "RAISE_ENGINE_EXCEPTION";
const RUNTIME_CRASH_MARKER: &str = "RAISE_RUNTIME_EXCEPTION";

#[derive(Default)]
pub struct ToyEngine {
    /// The previous compile's import list per module, for diffing.
    module_imports: HashMap<String, Vec<ImportEntry>>,
    /// Source text of each successfully-loaded module, so `run` can find
    /// the binding it was asked to execute.
    module_sources: HashMap<String, String>,
}

impl ToyEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn collect_source_files(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()).is_some_and(|ext| {
                extensions.iter().any(|wanted| wanted == ext)
            }) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn module_name(path: &Path, sources_dir: &Path) -> String {
    let mut rel = path.strip_prefix(sources_dir).unwrap_or(path).to_path_buf();
    rel.set_extension("");
    rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join(".")
}

/// Parse one module's text: imports, and a dangling-binding diagnostic
/// if any line looks like `name =` with nothing (meaningful) after the
/// `=`. Lines after the module header are otherwise ignored — this is a
/// stand-in for a real parser, not one.
fn parse_module(file: &str, text: &str) -> (Vec<ImportEntry>, Vec<Diagnostic>) {
    let mut imports = Vec::new();
    let mut diagnostics = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let trimmed = line.trim();
        if let Some(imported) = trimmed.strip_prefix("import ") {
            imports.push(ImportEntry { module: imported.trim().to_string() });
            continue;
        }
        if trimmed.starts_with("module ") || trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        if let Some(eq_idx) = trimmed.find('=') {
            let rhs = trimmed[eq_idx + 1..].trim();
            if rhs.is_empty() {
                let col = (eq_idx + 2) as u32;
                diagnostics.push(Diagnostic::error(
                    file.to_string(),
                    SourceSpan::new(line_no, col, line_no, col),
                    "parse error: missing right-hand side of binding",
                ));
            }
        }
    }

    (imports, diagnostics)
}

impl CompileEngine for ToyEngine {
    fn compile(
        &mut self,
        request: &CompileRequest<'_>,
        on_compiling: &mut dyn FnMut(&str),
    ) -> Result<ComputedResult, EngineError> {
        let _ = request.options;
        let _ = request.generate_code;

        let files = collect_source_files(request.sources_dir, request.source_extensions)?;

        let mut diagnostics = Vec::new();
        let mut loaded_modules = Vec::new();
        let mut module_diffs = HashMap::new();
        let mut seen_imports = HashMap::new();
        let mut seen_sources = HashMap::new();

        for path in files {
            let module = module_name(&path, request.sources_dir);
            let text = std::fs::read_to_string(&path)?;

            if text.contains(CRASH_MARKER) {
                return Err(EngineError::Exception {
                    message: format!("engine crashed while compiling {module}"),
                    partial_diagnostics: diagnostics,
                });
            }

            let (imports, module_diagnostics) = parse_module(&module, &text);
            let has_errors = module_diagnostics.iter().any(Diagnostic::is_error);
            diagnostics.extend(module_diagnostics);

            let prev_imports = self.module_imports.get(&module).cloned().unwrap_or_default();
            module_diffs.insert(
                module.clone(),
                ModuleDiff { imports: ics_core::Diff::between(&prev_imports, &imports), ..Default::default() },
            );
            seen_imports.insert(module.clone(), imports);
            seen_sources.insert(module.clone(), text);

            if !has_errors {
                loaded_modules.push(module.clone());
            }
            on_compiling(&module);
        }

        self.module_imports = seen_imports;
        self.module_sources = seen_sources;

        Ok(ComputedResult { diagnostics, loaded_modules, strings: ExplicitSharingCache::new(), module_diffs })
    }

    fn run(
        &mut self,
        module: &str,
        identifier: &str,
        _env_overlay: &[(String, Option<String>)],
        on_output: &mut dyn FnMut(&[u8]),
    ) -> Result<RunOutcome, EngineError> {
        let Some(text) = self.module_sources.get(module) else {
            return Ok(RunOutcome::Exception { message: format!("module not loaded: {module}") });
        };

        let needle = format!("{identifier} =");
        let Some(line) = text.lines().find(|l| l.trim_start().starts_with(&needle)) else {
            return Ok(RunOutcome::Exception {
                message: format!("no such identifier: {identifier} in module {module}"),
            });
        };
        let rhs = line.trim_start().trim_start_matches(&needle).trim();

        if rhs.contains(RUNTIME_CRASH_MARKER) {
            return Ok(RunOutcome::Exception { message: "runtime exception".to_string() });
        }

        on_output(format!("{rhs}\n").as_bytes());
        Ok(RunOutcome::Completed)
    }

    fn reset(&mut self) {
        self.module_imports.clear();
        self.module_sources.clear();
    }
}

#[cfg(test)]
#[path = "toy_engine_tests.rs"]
mod tests;
