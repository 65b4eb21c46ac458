// SPDX-License-Identifier: MIT

//! Worker process spawning (§6): "the parent re-executes its own binary
//! with argv `--server <opts...> --ghc-opts-end <tempdir>`." This crate
//! ships as a library rather than the self-contained binary the
//! specification assumes, so the thing re-executed is the sibling
//! `ics-worker` binary rather than literally `argv[0]` — [`ProcessSpawner`]
//! takes that binary's path explicitly. [`WorkerSpawner`] is the seam
//! that lets tests swap in an in-process worker instead of paying for a
//! real subprocess per test.

use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;

/// One end of a freshly spawned worker: the framed transport halves plus
/// (for a real subprocess) the child handle needed to reap it. `WorkerLink`
/// takes ownership of `child` for the link's lifetime — see its doc comment
/// for why that matters with `kill_on_drop`.
pub struct SpawnedWorker {
    pub reader: Box<dyn AsyncRead + Unpin + Send>,
    pub writer: Box<dyn AsyncWrite + Unpin + Send>,
    pub child: Option<Child>,
}

/// Spawns the child process that hosts a [`ics_worker::CompileEngine`].
///
/// Implementations are synchronous to spawn (matching `std::process::Command`/
/// `tokio::process::Command`'s own spawn call) even though the resulting
/// transport is driven asynchronously.
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self, static_options: &[String], tempdir: &Path) -> std::io::Result<SpawnedWorker>;
}

/// Spawns the real `ics-worker` binary per §6's argv convention.
pub struct ProcessSpawner {
    pub worker_exe: PathBuf,
}

impl ProcessSpawner {
    pub fn new(worker_exe: impl Into<PathBuf>) -> Self {
        Self { worker_exe: worker_exe.into() }
    }
}

impl WorkerSpawner for ProcessSpawner {
    fn spawn(&self, static_options: &[String], tempdir: &Path) -> std::io::Result<SpawnedWorker> {
        let mut command = tokio::process::Command::new(&self.worker_exe);
        command
            .arg("--server")
            .args(static_options)
            .arg("--ghc-opts-end")
            .arg(tempdir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            // §6: stderr is free-form debug output for human eyes, never parsed by the parent.
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| {
            std::io::Error::other("spawned worker child has no piped stdin")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::other("spawned worker child has no piped stdout")
        })?;

        Ok(SpawnedWorker { reader: Box::new(stdout), writer: Box::new(stdin), child: Some(child) })
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use ics_worker::ToyEngine;

    /// Runs a [`ToyEngine`]-backed worker as a background task over an
    /// in-memory duplex pipe instead of a real subprocess, for fast tests
    /// that don't need to exercise actual process lifecycle.
    pub struct InProcessSpawner;

    impl WorkerSpawner for InProcessSpawner {
        fn spawn(&self, static_options: &[String], _tempdir: &Path) -> std::io::Result<SpawnedWorker> {
            let (client_side, worker_side) = tokio::io::duplex(64 * 1024);
            let static_options = static_options.to_vec();
            let (worker_reader, worker_writer) = tokio::io::split(worker_side);
            tokio::spawn(async move {
                let mut engine = ToyEngine::new();
                let _ = ics_worker::serve(worker_reader, worker_writer, static_options, &mut engine).await;
            });
            let (client_reader, client_writer) = tokio::io::split(client_side);
            Ok(SpawnedWorker {
                reader: Box::new(client_reader),
                writer: Box::new(client_writer),
                child: None,
            })
        }
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
