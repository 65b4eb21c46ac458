// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ics-core: pure data types and in-process state for the interactive
//! compilation session coupling layer.
//!
//! No I/O beyond the virtual file store's disk fallback, no process
//! spawning, no transport — just the state token (C1), virtual file
//! store (C2), update batch (C3), diagnostic model (C4) and progress
//! carrier (C5) that every other crate in this workspace builds on.

pub mod batch;
pub mod computed;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod id;
pub mod interner;
pub mod progress;
pub mod token;
pub mod vfs;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use batch::{Mutation, UpdateBatch};
pub use computed::{
    AutoCompletionEntry, ComputedResult, Diff, ExpTypeEntry, ImportEntry, ModuleDiff,
    PackageDependency, SpanInfoEntry, UseSiteEntry,
};
pub use config::{SessionConfig, StaticOptionsFile};
pub use diagnostic::{Diagnostic, DiagnosticKind, SourceSpan};
pub use error::SessionError;
pub use id::{RequestId, SessionId};
pub use interner::{ExplicitSharingCache, InternId};
pub use progress::Progress;
pub use token::{StateToken, TokenCell};
pub use vfs::VirtualFileStore;
