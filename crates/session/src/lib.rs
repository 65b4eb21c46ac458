// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ics-session: the client-visible session façade (C9) and package-build
//! driver (C10) — everything a host CLI or IDE plugin calls to open a
//! session, push file updates, trigger compiles, read back diagnostics
//! and module metadata, run statements, and build executables/docs.

pub mod build;
pub mod link;
pub mod session;
pub mod spawn;
pub mod supervisor;

pub use build::{BuildOutcome, BuildStep, BuildTool, ExecutableTarget, NullBuildTool, PackageDescription};
pub use link::{Canceller, ProgressHandle, WorkerLink};
pub use session::{IdeSession, RunHandle, UpdateHandle};
pub use spawn::{ProcessSpawner, SpawnedWorker, WorkerSpawner};
pub use supervisor::WorkerSupervisor;
