// SPDX-License-Identifier: MIT

//! Virtual file store (C2): an in-memory overlay over a real directory.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::SessionError;

/// Binary-safe mapping from logical path to overlay content, shared
/// across the whole process.
///
/// Lookup policy: if `path` is present in the overlay, its bytes are
/// returned; otherwise the real file is read from beneath `base_dir`.
/// Writes only ever touch the overlay map — the real filesystem is never
/// mutated by `put`/`delete`. The store holds no directory itself and
/// has no opinion about which base applies: a session passes
/// `sourcesDir` when resolving a module and `dataDir` when resolving a
/// data file, so one store correctly overlays two distinct real trees.
#[derive(Debug, Clone)]
pub struct VirtualFileStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl VirtualFileStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Insert or overwrite an overlay entry.
    pub fn put(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.inner.lock().insert(path.into(), bytes);
    }

    /// Remove an overlay entry, if any. Does not touch the disk fallback.
    pub fn delete(&self, path: &str) {
        self.inner.lock().remove(path);
    }

    /// Overlay lookup, falling back to disk under `base_dir`.
    pub fn read(&self, path: &str, base_dir: &Path) -> Result<Vec<u8>, SessionError> {
        if let Some(bytes) = self.inner.lock().get(path) {
            return Ok(bytes.clone());
        }
        std::fs::read(base_dir.join(path)).map_err(SessionError::Io)
    }

    /// True if `path` has an overlay entry (regardless of disk contents).
    pub fn contains_overlay(&self, path: &str) -> bool {
        self.inner.lock().contains_key(path)
    }

    /// All overlay paths, sorted. Backs the supplemented `getAllSourceModules`
    /// / `getAllDataFiles` enumeration queries (SPEC_FULL §3).
    pub fn overlay_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.inner.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for VirtualFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "vfs_tests.rs"]
mod tests;
