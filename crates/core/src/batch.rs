// SPDX-License-Identifier: MIT

//! Update batch (C3): a composable, deferred group of mutations.
//!
//! Modeled as an ordered list of tagged mutation records with a trivial
//! combine operator, per the design notes in §9 — not as composed
//! closures — so batches stay introspectable and comparable in tests.

use serde::{Deserialize, Serialize};

use crate::vfs::VirtualFileStore;

/// A single staged mutation. See §3 DATA MODEL for the recognised set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Put a source module, identified by module name; `path` is the
    /// module name resolved to a file path under `sourcesDir`.
    PutModule { name: String, path: String, contents: Vec<u8> },
    DeleteModule { name: String, path: String },
    PutDataFile { path: String, contents: Vec<u8> },
    DeleteDataFile { path: String },
    /// Full replace of the dynamic compiler option list.
    SetDynamicOptions(Vec<String>),
    SetGenerateCode(bool),
    /// Full replace of the process-environment overlay used for `run`.
    /// `None` for a value means "unset this variable".
    SetEnvOverlay(Vec<(String, Option<String>)>),
}

/// An ordered, composable batch of [`Mutation`]s.
///
/// `UpdateBatch::empty()` is the monoid identity and `append` is the
/// monoid operation: `empty().append(b) == b`, `b.append(empty()) == b`,
/// and `append` is associative, because both sides reduce to
/// concatenating the same two mutation lists in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch {
    mutations: Vec<Mutation>,
}

impl UpdateBatch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Run `self`'s effects, then `other`'s.
    pub fn append(mut self, other: UpdateBatch) -> Self {
        self.mutations.extend(other.mutations);
        self
    }

    pub fn put_module(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let path = format!("{name}.hs");
        self.mutations.push(Mutation::PutModule { name, path, contents: contents.into() });
        self
    }

    pub fn delete_module(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = format!("{name}.hs");
        self.mutations.push(Mutation::DeleteModule { name, path });
        self
    }

    pub fn put_data_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.mutations.push(Mutation::PutDataFile { path: path.into(), contents: contents.into() });
        self
    }

    pub fn delete_data_file(mut self, path: impl Into<String>) -> Self {
        self.mutations.push(Mutation::DeleteDataFile { path: path.into() });
        self
    }

    pub fn set_dynamic_options(mut self, options: Vec<String>) -> Self {
        self.mutations.push(Mutation::SetDynamicOptions(options));
        self
    }

    pub fn set_generate_code(mut self, generate: bool) -> Self {
        self.mutations.push(Mutation::SetGenerateCode(generate));
        self
    }

    pub fn set_env_overlay(mut self, overlay: Vec<(String, Option<String>)>) -> Self {
        self.mutations.push(Mutation::SetEnvOverlay(overlay));
        self
    }

    /// Apply the batch's effects in order, atomically from the observer's
    /// standpoint (the caller is expected to hold the token lock for the
    /// duration — see `ics-session`'s `updateFiles`).
    pub fn apply(
        &self,
        vfs: &VirtualFileStore,
        dynamic_options: &mut Option<Vec<String>>,
        generate_code: &mut bool,
        env_overlay: &mut Vec<(String, Option<String>)>,
    ) {
        for mutation in &self.mutations {
            match mutation {
                Mutation::PutModule { path, contents, .. } => vfs.put(path.clone(), contents.clone()),
                Mutation::DeleteModule { path, .. } => vfs.delete(path),
                Mutation::PutDataFile { path, contents } => vfs.put(path.clone(), contents.clone()),
                Mutation::DeleteDataFile { path } => vfs.delete(path),
                Mutation::SetDynamicOptions(options) => *dynamic_options = Some(options.clone()),
                Mutation::SetGenerateCode(flag) => *generate_code = *flag,
                Mutation::SetEnvOverlay(overlay) => *env_overlay = overlay.clone(),
            }
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
