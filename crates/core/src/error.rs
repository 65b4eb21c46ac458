// SPDX-License-Identifier: MIT

//! Error taxonomy shared by every layer of the session coupling stack (§7).

use thiserror::Error;

/// Errors a client can observe from a session operation.
///
/// Recovery policy (§7): `StaleSession` and `NoComputedYet` are surfaced
/// as-is and never retried automatically. `ProtocolViolation` and
/// `WorkerGone` are fatal to the *worker*, not the session — the next
/// mutating call restarts the worker and the failure is folded into the
/// returned diagnostics as an `OtherError` rather than propagated here.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("stale session: handle carries token {given}, current is {current}")]
    StaleSession { given: u64, current: u64 },

    #[error("no computed result yet (before first compile, or since the last mutation)")]
    NoComputedYet,

    #[error("worker protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("worker process is gone")]
    WorkerGone,

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A `ProgressHandle::wait` on a cancelled request (§5, §8 scenario 6).
    #[error("request was cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn is_stale(&self) -> bool {
        matches!(self, SessionError::StaleSession { .. })
    }

    pub fn is_not_computed(&self) -> bool {
        matches!(self, SessionError::NoComputedYet)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
