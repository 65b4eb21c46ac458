// SPDX-License-Identifier: MIT

//! Process-wide monotonic state token (C1).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::SessionError;

/// A point-in-time version of the process-wide session state.
///
/// Every session remembers the token it was last synced to; any
/// operation whose remembered token no longer matches [`TokenCell::current`]
/// fails with [`SessionError::StaleSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateToken(u64);

impl StateToken {
    pub const INITIAL: StateToken = StateToken(0);

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StateToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exclusive-access cell guarding the single linear version counter.
///
/// A process constructs exactly one `TokenCell` and shares clones of it
/// with every session (it is `Arc`-backed, so clones observe the same
/// counter). The counter never decreases and never resets within a
/// process lifetime; it counts all session transitions across all
/// sessions, not just one session's own mutations.
#[derive(Debug, Clone)]
pub struct TokenCell {
    inner: Arc<Mutex<u64>>,
}

impl TokenCell {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(0)) }
    }

    /// Current token value. Does not itself count as a mutation.
    pub fn current(&self) -> StateToken {
        StateToken(*self.inner.lock())
    }

    /// Fail with `StaleSession` if `token` no longer matches the current value.
    pub fn check(&self, token: StateToken) -> Result<(), SessionError> {
        let current = *self.inner.lock();
        if token.0 != current {
            return Err(SessionError::StaleSession { given: token.0, current });
        }
        Ok(())
    }

    /// Atomically increment and return the new token.
    pub fn advance(&self) -> StateToken {
        let mut guard = self.inner.lock();
        *guard += 1;
        StateToken(*guard)
    }
}

impl Default for TokenCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
