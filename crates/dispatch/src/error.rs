//! Error types shared across the dispatch layer.
//!
//! Errors fall in three groups:
//!
//! - [`RouteError`]: configuration errors raised while building the route table
//! - [`DecodeError`]: failures materializing a request body or query string
//! - [`TransportError`] / [`SendError`]: failures of the underlying transport,
//!   on the reading and the writing side respectively

use std::convert::Infallible;
use std::error::Error;
use std::io;
use thiserror::Error;

/// Boxed error returned by request handlers.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("route '{method} {path}' is already registered")]
    DuplicateRoute { path: String, method: String },

    #[error("a fallback route is already registered for method '{existing}'")]
    DuplicateFallback { existing: String },

    #[error("template '{template}' contains an empty capture '{{}}'")]
    EmptyCapture { template: String },

    #[error("template '{template}' captures '{name}' more than once")]
    DuplicateCapture { template: String, name: String },
}

impl RouteError {
    pub fn duplicate_route<P: ToString, M: ToString>(path: P, method: M) -> Self {
        Self::DuplicateRoute { path: path.to_string(), method: method.to_string() }
    }

    pub fn duplicate_fallback<M: ToString>(existing: M) -> Self {
        Self::DuplicateFallback { existing: existing.to_string() }
    }

    pub fn empty_capture<S: ToString>(template: S) -> Self {
        Self::EmptyCapture { template: template.to_string() }
    }

    pub fn duplicate_capture<S: ToString, N: ToString>(template: S, name: N) -> Self {
        Self::DuplicateCapture { template: template.to_string(), name: name.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("body size exceed the limit {limit}")]
    BodyTooLarge { limit: usize },

    #[error("multipart/form-data request has no boundary parameter")]
    MissingBoundary,

    #[error("invalid json body: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid form body: {source}")]
    Form {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid multipart body: {reason}")]
    Multipart { reason: String },

    #[error("unsupported charset: {charset}")]
    UnsupportedCharset { charset: String },

    #[error("body is not valid {charset}, invalid sequence at byte {valid_up_to}")]
    InvalidEncoding { charset: String, valid_up_to: usize },

    #[error("request body has been consumed")]
    AlreadyConsumed,

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },
}

impl DecodeError {
    pub fn body_too_large(limit: usize) -> Self {
        Self::BodyTooLarge { limit }
    }

    pub fn multipart<S: ToString>(str: S) -> Self {
        Self::Multipart { reason: str.to_string() }
    }

    pub fn unsupported_charset<S: ToString>(charset: S) -> Self {
        Self::UnsupportedCharset { charset: charset.to_string() }
    }

    pub fn invalid_encoding<S: ToString>(charset: S, valid_up_to: usize) -> Self {
        Self::InvalidEncoding { charset: charset.to_string(), valid_up_to }
    }
}

/// Failure reading the request body from the transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection closed before the body completed")]
    Incomplete,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("{cause}")]
    Other { cause: BoxError },
}

impl TransportError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn other<E: Into<BoxError>>(e: E) -> Self {
        Self::Other { cause: e.into() }
    }
}

impl From<Infallible> for TransportError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Failure handing a response to the transport.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
