// SPDX-License-Identifier: MIT

//! One live connection to a worker process: the §4.6 progress-RPC
//! client half. Owns the write side directly; a background task owns
//! the read side permanently and forwards whatever frame it reads to
//! whichever [`ProgressHandle`] is currently "in flight" — mirroring
//! §5's "one reader thread per in-flight RPC", just as a long-lived
//! tokio task rather than a thread spawned fresh per request, since the
//! exactly-one-in-flight rule (§4.6) means there is never more than one
//! to forward to anyway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ics_core::SessionError;
use ics_wire::{write_ping, write_request, write_shutdown, ProtocolError, Request, WorkerFrame};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::spawn::SpawnedWorker;

/// A still-open request: progress frames trickle in on `rx` until the
/// terminal `Result` (or the link reports the worker gone/violating
/// protocol, or the caller cancels).
pub struct ProgressHandle {
    rx: mpsc::UnboundedReceiver<Result<WorkerFrame, SessionError>>,
    cancel: CancellationToken,
    shared: Arc<Shared>,
}

impl ProgressHandle {
    /// Drain progress frames, invoking `on_frame` for each, until the
    /// terminal frame arrives. Returns that terminal [`WorkerFrame`]
    /// (always `Result` — `ShutdownAck`/`Pong` never appear mid-request).
    pub async fn wait(
        mut self,
        mut on_frame: impl FnMut(&WorkerFrame),
    ) -> Result<WorkerFrame, SessionError> {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(SessionError::Cancelled);
                }
                frame = self.rx.recv() => {
                    match frame {
                        Some(Ok(WorkerFrame::Result(result))) => return Ok(WorkerFrame::Result(result)),
                        Some(Ok(other)) => on_frame(&other),
                        Some(Err(err)) => return Err(err),
                        None => return Err(SessionError::WorkerGone),
                    }
                }
            }
        }
    }

    /// Send `Shutdown`, aborting the in-flight request (§4.6). Any
    /// frames the worker still emits for it are discarded once the
    /// reader task stops forwarding to this handle (it already has: the
    /// wait loop is about to return `Cancelled` instead of recv'ing again).
    pub fn cancel(&self) {
        self.canceller().cancel();
    }

    /// A cheaply-cloneable handle that can cancel this request without
    /// holding on to the (non-`Clone`) receiver half — needed because
    /// `wait` consumes `self` while a caller typically wants to race
    /// `wait` against a `cancel` issued from elsewhere (§5, §8 scenario 6).
    pub fn canceller(&self) -> Canceller {
        Canceller { cancel: self.cancel.clone(), shared: self.shared.clone() }
    }
}

/// See [`ProgressHandle::canceller`].
#[derive(Clone)]
pub struct Canceller {
    cancel: CancellationToken,
    shared: Arc<Shared>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.cancel.cancel();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let mut writer = shared.writer.lock().await;
            let _ = write_shutdown(&mut *writer).await;
        });
    }
}

/// One connection's state shared between the link and its reader task.
struct Shared {
    writer: Mutex<Box<dyn tokio::io::AsyncWrite + Unpin + Send>>,
    forward: Mutex<Option<mpsc::UnboundedSender<Result<WorkerFrame, SessionError>>>>,
    alive: AtomicBool,
}

pub struct WorkerLink {
    shared: Arc<Shared>,
    reader_task: tokio::task::JoinHandle<()>,
    /// Owns the child process for as long as this link lives. A real
    /// `ProcessSpawner` sets `kill_on_drop(true)` (§6), so dropping this
    /// early — as opposed to holding it for the link's whole lifetime —
    /// would send the worker a kill signal the moment it was spawned.
    /// `None` for an in-process test worker, which has no child to own.
    child: Mutex<Option<tokio::process::Child>>,
}

impl WorkerLink {
    pub fn new(spawned: SpawnedWorker) -> Self {
        let shared = Arc::new(Shared {
            writer: Mutex::new(spawned.writer),
            forward: Mutex::new(None),
            alive: AtomicBool::new(true),
        });

        let reader_shared = shared.clone();
        let mut reader = spawned.reader;
        let reader_task = tokio::spawn(async move {
            loop {
                let outcome = ics_wire::read_worker_frame(&mut reader).await;
                let forwarded = match outcome {
                    Ok(frame) => Ok(frame),
                    Err(ProtocolError::WorkerGone) => {
                        reader_shared.alive.store(false, Ordering::SeqCst);
                        Err(SessionError::WorkerGone)
                    }
                    Err(err) => {
                        reader_shared.alive.store(false, Ordering::SeqCst);
                        Err(SessionError::ProtocolViolation(err.to_string()))
                    }
                };
                let is_fatal = forwarded.is_err();
                if let Some(tx) = reader_shared.forward.lock().await.as_ref() {
                    let _ = tx.send(forwarded);
                }
                if is_fatal {
                    return;
                }
            }
        });

        Self { shared, reader_task, child: Mutex::new(spawned.child) }
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    async fn send(&self, request: Request) -> Result<ProgressHandle, SessionError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.forward.lock().await = Some(tx);

        let mut writer = self.shared.writer.lock().await;
        write_request(&mut *writer, &request).await.map_err(protocol_to_session_error)?;
        drop(writer);

        Ok(ProgressHandle { rx, cancel: CancellationToken::new(), shared: self.shared.clone() })
    }

    pub async fn send_compile(&self, request: Request) -> Result<ProgressHandle, SessionError> {
        self.send(request).await
    }

    pub async fn send_run(&self, request: Request) -> Result<ProgressHandle, SessionError> {
        self.send(request).await
    }

    pub async fn ping(&self) -> Result<(), SessionError> {
        let mut writer = self.shared.writer.lock().await;
        write_ping(&mut *writer).await.map_err(protocol_to_session_error)
    }

    /// Send the worker a graceful `Shutdown` (§4.4) and wait for it to
    /// exit. Falls back to `kill` if it doesn't exit on its own —
    /// belt-and-braces alongside the `kill_on_drop` the child already
    /// carries, since this waits synchronously rather than relying on a
    /// `Drop` that `shutdown`'s caller has no way to await.
    pub async fn shutdown(&self) {
        {
            let mut writer = self.shared.writer.lock().await;
            let _ = write_shutdown(&mut *writer).await;
        }
        if let Some(child) = self.child.lock().await.as_mut() {
            let _ = child.wait().await;
        }
    }

    pub async fn join(self) {
        let _ = self.reader_task.await;
    }
}

fn protocol_to_session_error(err: ProtocolError) -> SessionError {
    match err {
        ProtocolError::WorkerGone => SessionError::WorkerGone,
        ProtocolError::Decode(msg) => SessionError::ProtocolViolation(msg),
        ProtocolError::Io(io) => SessionError::Io(io),
    }
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;
