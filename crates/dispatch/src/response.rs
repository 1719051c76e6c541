//! The abstract responses handlers return.
//!
//! A [`Response`] says *what* to send; turning it into transport calls is the
//! job of [`respond`](crate::respond). The set of variants is closed, so every
//! kind of response is handled in one place.

use crate::error::BoxError;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use http::StatusCode;
use mime::Mime;
use std::fmt;
use std::path::PathBuf;

/// A single-shot response body, either text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Bytes),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Bytes(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&'static str> for Payload {
    fn from(text: &'static str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(bytes))
    }
}

/// One chunk of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Bytes(Bytes),
}

impl From<&'static str> for Chunk {
    fn from(text: &'static str) -> Self {
        Chunk::Text(text.to_owned())
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::Text(text)
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Chunk::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk::Bytes(Bytes::from(bytes))
    }
}

/// The chunk producer of a [`Response::Stream`]. A producer error ends the
/// stream early.
pub type ChunkStream = BoxStream<'static, Result<Chunk, BoxError>>;

/// What a handler asks to send back.
pub enum Response {
    /// `text/plain; charset=utf-8`
    PlainText { status: StatusCode, payload: Payload },
    /// `application/json`, serialized when the response is sent
    Json { status: StatusCode, value: serde_json::Value },
    /// `text/html; charset=utf-8`
    Html { status: StatusCode, payload: Payload },
    /// a file handed to the transport as an `application/octet-stream` attachment
    File { status: StatusCode, path: PathBuf },
    /// a body produced chunk by chunk
    Stream { status: StatusCode, content_type: Mime, chunks: ChunkStream },
}

impl Response {
    pub fn text(payload: impl Into<Payload>) -> Self {
        Response::PlainText { status: StatusCode::OK, payload: payload.into() }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Response::Json { status: StatusCode::OK, value }
    }

    /// Serializes `value` into a JSON response.
    pub fn json_from<T: serde::Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Response::json)
    }

    pub fn html(payload: impl Into<Payload>) -> Self {
        Response::Html { status: StatusCode::OK, payload: payload.into() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Response::File { status: StatusCode::OK, path: path.into() }
    }

    /// A streamed response with an explicit content type.
    pub fn stream<S, C, E>(content_type: Mime, chunks: S) -> Self
    where
        S: Stream<Item = Result<C, E>> + Send + 'static,
        C: Into<Chunk>,
        E: Into<BoxError>,
    {
        let chunks = chunks.map(|item| item.map(Into::into).map_err(Into::into)).boxed();
        Response::Stream { status: StatusCode::OK, content_type, chunks }
    }

    /// A streamed `application/octet-stream` response.
    pub fn octet_stream<S, C, E>(chunks: S) -> Self
    where
        S: Stream<Item = Result<C, E>> + Send + 'static,
        C: Into<Chunk>,
        E: Into<BoxError>,
    {
        Self::stream(mime::APPLICATION_OCTET_STREAM, chunks)
    }

    pub fn not_found() -> Self {
        Response::text("Not Found").with_status(StatusCode::NOT_FOUND)
    }

    pub fn internal_server_error() -> Self {
        Response::text("Internal Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Replaces the status code.
    pub fn with_status(mut self, new_status: StatusCode) -> Self {
        match &mut self {
            Response::PlainText { status, .. }
            | Response::Json { status, .. }
            | Response::Html { status, .. }
            | Response::File { status, .. }
            | Response::Stream { status, .. } => *status = new_status,
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Response::PlainText { status, .. }
            | Response::Json { status, .. }
            | Response::Html { status, .. }
            | Response::File { status, .. }
            | Response::Stream { status, .. } => *status,
        }
    }

    /// The `Content-Type` the response is sent with.
    pub fn content_type(&self) -> Mime {
        match self {
            Response::PlainText { .. } => mime::TEXT_PLAIN_UTF_8,
            Response::Json { .. } => mime::APPLICATION_JSON,
            Response::Html { .. } => mime::TEXT_HTML_UTF_8,
            Response::File { .. } => mime::APPLICATION_OCTET_STREAM,
            Response::Stream { content_type, .. } => content_type.clone(),
        }
    }
}

impl From<&'static str> for Response {
    fn from(text: &'static str) -> Self {
        Response::text(text)
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Response::text(text)
    }
}

impl From<serde_json::Value> for Response {
    fn from(value: serde_json::Value) -> Self {
        Response::json(value)
    }
}

/// `(StatusCode, T)` sets the status along with the content.
impl<T: Into<Response>> From<(StatusCode, T)> for Response {
    fn from((status, response): (StatusCode, T)) -> Self {
        response.into().with_status(status)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::PlainText { status, payload } => {
                f.debug_struct("PlainText").field("status", status).field("payload", payload).finish()
            }
            Response::Json { status, value } => f.debug_struct("Json").field("status", status).field("value", value).finish(),
            Response::Html { status, payload } => {
                f.debug_struct("Html").field("status", status).field("payload", payload).finish()
            }
            Response::File { status, path } => f.debug_struct("File").field("status", status).field("path", path).finish(),
            Response::Stream { status, content_type, .. } => {
                f.debug_struct("Stream").field("status", status).field("content_type", content_type).finish_non_exhaustive()
            }
        }
    }
}
