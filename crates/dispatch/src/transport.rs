//! The response side of the transport.
//!
//! The dispatch layer never writes to a socket itself. A host integrates it by
//! implementing [`ResponseSink`] on top of its connection, and by wrapping the
//! request body it received into a [`ReqBody`](crate::ReqBody).
//!
//! Each response uses exactly one of the sink's primitives: one of the
//! single-shot `send_*` calls, or [`open_stream`](ResponseSink::open_stream)
//! followed by any number of chunk sends on the returned [`StreamSink`].

use crate::error::SendError;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::path::PathBuf;

/// Response primitives offered by a transport for one request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Sends a complete response with a binary body.
    async fn send_bytes(&self, status: StatusCode, headers: HeaderMap, body: Bytes) -> Result<(), SendError>;

    /// Sends a complete response with a text body.
    async fn send_string(&self, status: StatusCode, headers: HeaderMap, body: String) -> Result<(), SendError>;

    /// Sends the content of the file at `path` as the response body.
    async fn send_file(&self, status: StatusCode, headers: HeaderMap, path: PathBuf) -> Result<(), SendError>;

    /// Commits the status and headers and returns a sink for the body chunks.
    ///
    /// The response ends when the returned sink is dropped.
    async fn open_stream(&self, status: StatusCode, headers: HeaderMap) -> Result<Box<dyn StreamSink>, SendError>;
}

/// An opened streaming response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamSink: Send {
    async fn send_bytes(&mut self, chunk: Bytes) -> Result<(), SendError>;

    async fn send_string(&mut self, chunk: String) -> Result<(), SendError>;
}
