// SPDX-License-Identifier: MIT

//! Progress event (C5): a non-decreasing step counter with a free-form message.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub step: u64,
    pub message: String,
}

impl Progress {
    /// The first progress event of a request, at step 1.
    pub fn start(message: impl Into<String>) -> Self {
        Self { step: 1, message: message.into() }
    }

    /// The next progress event, one step on from `self`.
    pub fn advance(&self, message: impl Into<String>) -> Self {
        Self { step: self.step + 1, message: message.into() }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
