// SPDX-License-Identifier: MIT

//! Diagnostic model (C4): typed errors/warnings with source spans.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self { start_line, start_col, end_line, end_col }
    }
}

/// A compiler-produced diagnostic, or an out-of-band failure.
///
/// `OtherError` is how a caught compile-engine exception (§4.7, §7) is
/// folded back into a `ComputedResult` without killing the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    SrcError { kind: DiagnosticKind, file: String, span: SourceSpan, message: String },
    OtherError { message: String },
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: SourceSpan, message: impl Into<String>) -> Self {
        Diagnostic::SrcError { kind: DiagnosticKind::Error, file: file.into(), span, message: message.into() }
    }

    pub fn warning(file: impl Into<String>, span: SourceSpan, message: impl Into<String>) -> Self {
        Diagnostic::SrcError { kind: DiagnosticKind::Warning, file: file.into(), span, message: message.into() }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Diagnostic::OtherError { message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::SrcError { kind: DiagnosticKind::Error, .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Diagnostic::SrcError { message, .. } => message,
            Diagnostic::OtherError { message } => message,
        }
    }
}

// Manual (de)serialization to match the external JSON encoding of §6 exactly:
// a flat object with `kind ∈ {"Error","Warning","message"}`, `file`,
// `startline`, `startcol`, `endline`, `endcol`, `message` — `OtherError`
// omits the span/file fields rather than nesting them.
impl Serialize for Diagnostic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Diagnostic::SrcError { kind, file, span, message } => {
                let kind_str = match kind {
                    DiagnosticKind::Error => "Error",
                    DiagnosticKind::Warning => "Warning",
                };
                map.serialize_entry("kind", kind_str)?;
                map.serialize_entry("file", file)?;
                map.serialize_entry("startline", &span.start_line)?;
                map.serialize_entry("startcol", &span.start_col)?;
                map.serialize_entry("endline", &span.end_line)?;
                map.serialize_entry("endcol", &span.end_col)?;
                map.serialize_entry("message", message)?;
            }
            Diagnostic::OtherError { message } => {
                map.serialize_entry("kind", "message")?;
                map.serialize_entry("message", message)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Diagnostic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            kind: String,
            #[serde(default)]
            file: Option<String>,
            #[serde(default)]
            startline: Option<u32>,
            #[serde(default)]
            startcol: Option<u32>,
            #[serde(default)]
            endline: Option<u32>,
            #[serde(default)]
            endcol: Option<u32>,
            message: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        match raw.kind.as_str() {
            "Error" | "Warning" => {
                let kind =
                    if raw.kind == "Error" { DiagnosticKind::Error } else { DiagnosticKind::Warning };
                let file = raw.file.ok_or_else(|| serde::de::Error::missing_field("file"))?;
                let span = SourceSpan {
                    start_line: raw
                        .startline
                        .ok_or_else(|| serde::de::Error::missing_field("startline"))?,
                    start_col: raw
                        .startcol
                        .ok_or_else(|| serde::de::Error::missing_field("startcol"))?,
                    end_line: raw
                        .endline
                        .ok_or_else(|| serde::de::Error::missing_field("endline"))?,
                    end_col: raw.endcol.ok_or_else(|| serde::de::Error::missing_field("endcol"))?,
                };
                Ok(Diagnostic::SrcError { kind, file, span, message: raw.message })
            }
            "message" => Ok(Diagnostic::OtherError { message: raw.message }),
            other => Err(serde::de::Error::custom(format!("unknown diagnostic kind: {other}"))),
        }
    }
}

#[cfg(test)]
#[path = "diagnostic_tests.rs"]
mod tests;
