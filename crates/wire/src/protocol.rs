// SPDX-License-Identifier: MIT

//! Progress-RPC protocol (C7): request → (many Progress)* → Result, with
//! a leading tag byte per frame identifying which of the three it is.
//!
//! | Tag  | Direction       | Meaning                          |
//! |------|-----------------|-----------------------------------|
//! | 0x00 | client→worker   | Request payload follows           |
//! | 0x01 | worker→client   | Progress payload follows (non-terminal) |
//! | 0x02 | worker→client   | Result payload follows (terminal)  |
//! | 0x03 | either          | Shutdown request / ack             |
//! | 0x04 | either          | Ping / Pong liveness check (SPEC_FULL §3 — its own tag rather than overloading Shutdown) |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWrite};

use ics_core::{ComputedResult, Progress};

use crate::transport::{decode, encode, read_message, write_message, ProtocolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameTag {
    Request = 0x00,
    Progress = 0x01,
    Result = 0x02,
    Shutdown = 0x03,
    Ping = 0x04,
}

impl TryFrom<u8> for FrameTag {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(FrameTag::Request),
            0x01 => Ok(FrameTag::Progress),
            0x02 => Ok(FrameTag::Result),
            0x03 => Ok(FrameTag::Shutdown),
            0x04 => Ok(FrameTag::Ping),
            other => Err(ProtocolError::Decode(format!("unknown frame tag: 0x{other:02x}"))),
        }
    }
}

/// A request the client can send once no other request is in flight
/// (the exactly-one-in-flight rule of §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Recompile under (optionally replaced) dynamic options.
    Compile {
        /// `None` means "reuse the previous dynamic options" (§9).
        dynamic_options: Option<Vec<String>>,
        sources_dir: PathBuf,
        generate_code: bool,
        source_extensions: Vec<String>,
    },
    /// Execute a named entry point inside a previously loaded module.
    Run { module: String, identifier: String, env_overlay: Vec<(String, Option<String>)> },
}

/// A non-terminal frame emitted while a request is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressFrame {
    Compiling(Progress),
    /// A chunk of a running program's captured stdout.
    Output(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Completed,
    Exception { message: String },
    /// Stopped externally, e.g. by a session `Shutdown` mid-run.
    Stopped,
}

/// The terminal frame for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResultFrame {
    Computed(ComputedResult),
    Run(RunOutcome),
}

/// What the worker's dispatch loop can read from the client.
#[derive(Debug, Clone)]
pub enum ClientFrame {
    Request(Request),
    Shutdown,
    Ping,
}

/// What the client's RPC reader can read from the worker while a
/// request is in flight.
#[derive(Debug, Clone)]
pub enum WorkerFrame {
    Progress(ProgressFrame),
    Result(ResultFrame),
    ShutdownAck,
    Pong,
}

async fn write_tagged<W: AsyncWrite + Unpin>(
    writer: &mut W,
    tag: FrameTag,
    body: &[u8],
) -> Result<(), ProtocolError> {
    let mut framed = Vec::with_capacity(1 + body.len());
    framed.push(tag as u8);
    framed.extend_from_slice(body);
    write_message(writer, &framed).await
}

async fn read_tagged<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<(FrameTag, Vec<u8>), ProtocolError> {
    let raw = read_message(reader).await?;
    let (&tag_byte, body) =
        raw.split_first().ok_or_else(|| ProtocolError::Decode("empty frame".to_string()))?;
    let tag = FrameTag::try_from(tag_byte)?;
    Ok((tag, body.to_vec()))
}

pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request: &Request,
) -> Result<(), ProtocolError> {
    write_tagged(writer, FrameTag::Request, &encode(request)?).await
}

pub async fn write_shutdown<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), ProtocolError> {
    write_tagged(writer, FrameTag::Shutdown, &[]).await
}

pub async fn write_ping<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), ProtocolError> {
    write_tagged(writer, FrameTag::Ping, &[]).await
}

pub async fn write_progress<W: AsyncWrite + Unpin>(
    writer: &mut W,
    progress: &ProgressFrame,
) -> Result<(), ProtocolError> {
    write_tagged(writer, FrameTag::Progress, &encode(progress)?).await
}

pub async fn write_result<W: AsyncWrite + Unpin>(
    writer: &mut W,
    result: &ResultFrame,
) -> Result<(), ProtocolError> {
    write_tagged(writer, FrameTag::Result, &encode(result)?).await
}

/// Read the next frame from the client, on the worker side.
pub async fn read_client_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<ClientFrame, ProtocolError> {
    let (tag, body) = read_tagged(reader).await?;
    match tag {
        FrameTag::Request => Ok(ClientFrame::Request(decode(&body)?)),
        FrameTag::Shutdown => Ok(ClientFrame::Shutdown),
        FrameTag::Ping => Ok(ClientFrame::Ping),
        other => Err(ProtocolError::Decode(format!("unexpected tag from client: {other:?}"))),
    }
}

/// Read the next frame from the worker, on the client side.
pub async fn read_worker_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<WorkerFrame, ProtocolError> {
    let (tag, body) = read_tagged(reader).await?;
    match tag {
        FrameTag::Progress => Ok(WorkerFrame::Progress(decode(&body)?)),
        FrameTag::Result => Ok(WorkerFrame::Result(decode(&body)?)),
        FrameTag::Shutdown => Ok(WorkerFrame::ShutdownAck),
        FrameTag::Ping => Ok(WorkerFrame::Pong),
        other => Err(ProtocolError::Decode(format!("unexpected tag from worker: {other:?}"))),
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
