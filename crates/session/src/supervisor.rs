// SPDX-License-Identifier: MIT

//! Worker process lifecycle (§4.9 worker state machine, §7 recovery
//! policy for `ProtocolViolation`/`WorkerGone`): owns the single live
//! [`WorkerLink`] for one session lineage, replacing it lazily the next
//! time it's needed rather than eagerly on death, and counting restarts
//! for the SPEC_FULL §3 session-restart-counter supplement.

use std::path::PathBuf;
use std::sync::Arc;

use ics_core::SessionError;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::link::WorkerLink;
use crate::spawn::WorkerSpawner;

pub struct WorkerSupervisor {
    spawner: Arc<dyn WorkerSpawner>,
    static_options: Vec<String>,
    tempdir: PathBuf,
    link: AsyncMutex<Option<Arc<WorkerLink>>>,
    restart_count: SyncMutex<u64>,
}

impl WorkerSupervisor {
    pub fn new(spawner: Arc<dyn WorkerSpawner>, static_options: Vec<String>, tempdir: PathBuf) -> Self {
        Self {
            spawner,
            static_options,
            tempdir,
            link: AsyncMutex::new(None),
            restart_count: SyncMutex::new(0),
        }
    }

    /// Number of times the worker has been replaced after being found
    /// dead, i.e. excluding the very first spawn. Advisory only — it
    /// does not gate any operation, unlike [`ics_core::StateToken`].
    pub fn restart_count(&self) -> u64 {
        *self.restart_count.lock()
    }

    /// Returns the current worker link, spawning (or respawning, if the
    /// previous one died) as needed. Every mutating session call that
    /// needs the worker routes through here, which is what makes "the
    /// next mutating call restarts the worker" (§7) true without any
    /// call site having to know about restarts.
    pub async fn ensure_link(&self) -> Result<Arc<WorkerLink>, SessionError> {
        let mut guard = self.link.lock().await;
        if let Some(link) = guard.as_ref() {
            if link.is_alive() {
                return Ok(link.clone());
            }
        }
        let had_previous = guard.is_some();

        let spawned = self.spawner.spawn(&self.static_options, &self.tempdir)?;
        let new_link = Arc::new(WorkerLink::new(spawned));
        *guard = Some(new_link.clone());
        drop(guard);

        if had_previous {
            let count = {
                let mut restart_count = self.restart_count.lock();
                *restart_count += 1;
                *restart_count
            };
            tracing::warn!(count, "worker restarted after previous link died");
        } else {
            tracing::info!("worker spawned");
        }

        Ok(new_link)
    }

    /// Idle liveness probe (SPEC_FULL §3): ping the current link without
    /// forcing a respawn if none exists yet or the existing one is dead.
    /// Returns `false` rather than propagating `WorkerGone`/`Io` — a
    /// failed probe just means the next real request will respawn.
    pub async fn probe(&self) -> bool {
        let guard = self.link.lock().await;
        match guard.as_ref() {
            Some(link) if link.is_alive() => link.ping().await.is_ok(),
            _ => false,
        }
    }

    pub async fn shutdown(&self) {
        let mut guard = self.link.lock().await;
        if let Some(link) = guard.take() {
            link.shutdown().await;
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
