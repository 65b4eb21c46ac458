// SPDX-License-Identifier: MIT

//! `ComputedResult` (C4): the aggregated output of the last successful compile.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::diagnostic::{Diagnostic, SourceSpan};
use crate::interner::{ExplicitSharingCache, InternId};

/// An additive diff between two snapshots of a per-module list: entries
/// present in the new snapshot but not the old are `added`; entries
/// present in the old but not the new are `removed`. Diffing relative to
/// the prior `ComputedResult` (rather than shipping full snapshots) is
/// the wire-economy technique described in §3/§9.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T: PartialEq + Clone> Diff<T> {
    pub fn between(prev: &[T], next: &[T]) -> Self {
        let added = next.iter().filter(|x| !prev.contains(x)).cloned().collect();
        let removed = prev.iter().filter(|x| !next.contains(x)).cloned().collect();
        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCompletionEntry {
    pub identifier: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanInfoEntry {
    pub span: SourceSpan,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependency {
    pub package: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpTypeEntry {
    pub span: SourceSpan,
    pub type_name_id: InternId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseSiteEntry {
    pub span: SourceSpan,
    pub definition_site_id: InternId,
}

/// Per-module diffs carried by a `ComputedResult`, relative to the prior one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDiff {
    pub imports: Diff<ImportEntry>,
    pub auto_completion: Diff<AutoCompletionEntry>,
    pub span_info: Diff<SpanInfoEntry>,
    pub package_deps: Diff<PackageDependency>,
    pub exp_types: Diff<ExpTypeEntry>,
    pub use_sites: Diff<UseSiteEntry>,
}

/// The aggregated output of a successful compile cycle (§3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedResult {
    pub diagnostics: Vec<Diagnostic>,
    pub loaded_modules: Vec<String>,
    pub strings: ExplicitSharingCache,
    pub module_diffs: HashMap<String, ModuleDiff>,
}

impl ComputedResult {
    pub fn source_errors(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The added/removed set of loaded modules relative to `prev`
    /// (SPEC_FULL §3's supplemented loaded-module diff, alongside the
    /// plain `loaded_modules` snapshot spec.md's `getLoadedModules` needs).
    pub fn loaded_module_diff(&self, prev: Option<&ComputedResult>) -> Diff<String> {
        let prev_modules: &[String] = prev.map(|p| p.loaded_modules.as_slice()).unwrap_or(&[]);
        Diff::between(prev_modules, &self.loaded_modules)
    }

    pub fn module_diff(&self, module: &str) -> Option<&ModuleDiff> {
        self.module_diffs.get(module)
    }
}

#[cfg(test)]
#[path = "computed_tests.rs"]
mod tests;
