// SPDX-License-Identifier: MIT

//! Session configuration (§3) and the static-options TOML loader
//! (SPEC_FULL §2 ambient config layer).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Source file extensions the embedded compiler accepts. §4.7 names
/// `.hs`/`.lhs` as examples of GHC's set; a different `CompileEngine`
/// (see `ics-worker`) generalises this to whatever it accepts.
pub fn default_source_extensions() -> Vec<String> {
    vec!["hs".to_string(), "lhs".to_string()]
}

/// The four working directories plus static configuration a session is
/// born with (§3).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where the compiler reads source modules from, overlaid by the
    /// virtual file store.
    pub sources_dir: PathBuf,
    /// Interface files and compiler intermediates.
    pub working_dir: PathBuf,
    /// Runtime CWD for programs executed via `runStmt`.
    pub data_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub package_db_stack: Vec<PathBuf>,
    pub extra_search_paths: Vec<PathBuf>,
    pub relative_include_dirs: Vec<PathBuf>,
    pub delete_temp_files_on_shutdown: bool,
    pub initial_static_options: Vec<String>,
    pub source_extensions: Vec<String>,
}

impl SessionConfig {
    pub fn new(sources_dir: PathBuf, working_dir: PathBuf, data_dir: PathBuf, temp_dir: PathBuf) -> Self {
        Self {
            sources_dir,
            working_dir,
            data_dir,
            temp_dir,
            package_db_stack: Vec::new(),
            extra_search_paths: Vec::new(),
            relative_include_dirs: Vec::new(),
            delete_temp_files_on_shutdown: true,
            initial_static_options: Vec::new(),
            source_extensions: default_source_extensions(),
        }
    }

    pub fn with_static_options(mut self, options: Vec<String>) -> Self {
        self.initial_static_options = options;
        self
    }

    pub fn with_package_db_stack(mut self, stack: Vec<PathBuf>) -> Self {
        self.package_db_stack = stack;
        self
    }

    pub fn with_source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    pub fn with_delete_temp_files_on_shutdown(mut self, delete: bool) -> Self {
        self.delete_temp_files_on_shutdown = delete;
        self
    }

    /// Merge in settings loaded from a [`StaticOptionsFile`], without
    /// overwriting fields the file leaves empty.
    pub fn merge_static_options_file(mut self, file: StaticOptionsFile) -> Self {
        if !file.static_options.is_empty() {
            self.initial_static_options = file.static_options;
        }
        if !file.package_db_stack.is_empty() {
            self.package_db_stack = file.package_db_stack;
        }
        if !file.source_extensions.is_empty() {
            self.source_extensions = file.source_extensions;
        }
        self
    }
}

/// Persisted static options, loaded independently of the rest of
/// `SessionConfig` so a host CLI can keep per-project defaults on disk
/// without the core session types knowing about files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticOptionsFile {
    #[serde(default)]
    pub static_options: Vec<String>,
    #[serde(default)]
    pub package_db_stack: Vec<PathBuf>,
    #[serde(default)]
    pub source_extensions: Vec<String>,
}

pub fn load_static_options(path: &Path) -> Result<StaticOptionsFile, SessionError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| SessionError::Config(e.to_string()))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
