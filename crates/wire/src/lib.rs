// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ics-wire: the worker IPC transport (C6) and progress-RPC protocol (C7).
//!
//! Length-prefixed JSON frames with a leading tag byte, exchanged over
//! whatever `AsyncRead`/`AsyncWrite` pair connects a session to its
//! worker process — a pipe pair in production, an in-memory duplex in
//! tests.

pub mod protocol;
pub mod transport;

pub use protocol::{
    read_client_frame, read_worker_frame, write_ping, write_progress, write_request,
    write_result, write_shutdown, ClientFrame, FrameTag, ProgressFrame, Request, ResultFrame,
    RunOutcome, WorkerFrame,
};
pub use transport::{decode, encode, read_message, write_message, ProtocolError};
