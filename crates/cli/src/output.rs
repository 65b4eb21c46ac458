// SPDX-License-Identifier: MIT

//! Text/JSON rendering for the demo CLI's two commands (§6 CLI surface).

use clap::ValueEnum;
use ics_session::IdeSession;
use ics_wire::RunOutcome;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct CompileReport<'a> {
    errors: usize,
    warnings: usize,
    diagnostics: &'a [ics_core::Diagnostic],
    loaded_modules: &'a [String],
}

/// Print the diagnostics and loaded-module set of the session's current
/// `Computed` result (§6: the diagnostic JSON encoding in text-mode
/// prints one line per diagnostic; JSON-mode prints the structured
/// encoding directly, `kind`/`file`/`startline`/... as-is).
pub fn print_compile_result(format: OutputFormat, session: &IdeSession) -> anyhow::Result<()> {
    let diagnostics = session.get_source_errors()?;
    let loaded_modules = session.get_loaded_modules()?;
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;

    match format {
        OutputFormat::Json => {
            let report = CompileReport { errors, warnings, diagnostics: &diagnostics, loaded_modules: &loaded_modules };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for diagnostic in &diagnostics {
                println!("{}", format_diagnostic(diagnostic));
            }
            println!(
                "{} error(s), {} warning(s), {} module(s) loaded",
                errors,
                warnings,
                loaded_modules.len()
            );
            if !loaded_modules.is_empty() {
                println!("loaded: {}", loaded_modules.join(", "));
            }
        }
    }
    Ok(())
}

fn format_diagnostic(diagnostic: &ics_core::Diagnostic) -> String {
    match diagnostic {
        ics_core::Diagnostic::SrcError { kind, file, span, message } => {
            let kind = match kind {
                ics_core::DiagnosticKind::Error => "error",
                ics_core::DiagnosticKind::Warning => "warning",
            };
            format!(
                "{file}:{}:{}-{}:{}: {kind}: {message}",
                span.start_line, span.start_col, span.end_line, span.end_col
            )
        }
        ics_core::Diagnostic::OtherError { message } => format!("error: {message}"),
    }
}

/// Print the terminal outcome of a `runStmt` (§4.4). Captured stdout is
/// streamed to the real stdout by the caller as it arrives; this only
/// reports the outcome once the run has finished.
pub fn print_run_outcome(format: OutputFormat, outcome: &RunOutcome) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => match outcome {
            RunOutcome::Completed => println!("(run completed)"),
            RunOutcome::Exception { message } => println!("(run raised an exception: {message})"),
            RunOutcome::Stopped => println!("(run stopped)"),
        },
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
