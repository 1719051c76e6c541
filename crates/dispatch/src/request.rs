//! Request handling module that provides access to HTTP request information and path parameters.
//!
//! This module contains the core types handed to request handlers:
//! - `RequestContext`: the request head plus lazily decoded query string and body
//! - `PathParams`: named segments captured by a parametric route

use crate::body::ReqBody;
use crate::decode::{self, DecodedBody, FormData};
use crate::error::DecodeError;
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, Uri, Version};
use std::sync::Arc;

/// Per-request state, owned by the single task serving the request.
///
/// The body can be consumed in one of two ways, and a handler should pick one:
/// - [`body`](Self::body) reads and decodes it once, then keeps the result
/// - [`body_stream`](Self::body_stream) hands out the raw chunk stream
///
/// Whichever runs first takes the stream; afterwards `body_stream` and an
/// undecoded `body` fail with [`DecodeError::AlreadyConsumed`].
#[derive(Debug)]
pub struct RequestContext {
    head: Parts,
    body: Option<ReqBody>,
    body_limit: usize,
    decoded_body: Option<DecodedBody>,
    args: Option<FormData>,
}

impl RequestContext {
    /// Creates a new RequestContext from the request head and the body stream.
    ///
    /// `body_limit` caps how many bytes [`body`](Self::body) will buffer.
    pub fn new(head: Parts, body: ReqBody, body_limit: usize) -> Self {
        Self { head, body: Some(body), body_limit, decoded_body: None, args: None }
    }

    pub fn from_request(request: Request<ReqBody>, body_limit: usize) -> Self {
        let (head, body) = request.into_parts();
        Self::new(head, body, body_limit)
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    /// Returns the raw query string, without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.head.uri.query()
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.head.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.head.headers.get(http::header::CONTENT_TYPE)
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// The decoded query string, parsed on first access.
    ///
    /// A key seen once maps to a single value, a repeated key to the list of
    /// its values. A request without a query string yields an empty map.
    pub fn args(&mut self) -> Result<&FormData, DecodeError> {
        let args = match self.args.take() {
            Some(args) => args,
            None => decode::parse_form(self.head.uri.query().unwrap_or_default())?,
        };
        Ok(self.args.insert(args))
    }

    /// The request body decoded according to its `Content-Type`.
    ///
    /// The stream is read and decoded on the first call only; later calls
    /// return the same value. A decoding failure is returned to the caller and
    /// leaves the stream consumed.
    pub async fn body(&mut self) -> Result<&DecodedBody, DecodeError> {
        let decoded = match self.decoded_body.take() {
            Some(decoded) => decoded,
            None => {
                let body = self.body.take().ok_or(DecodeError::AlreadyConsumed)?;
                let content_type = self.head.headers.get(http::header::CONTENT_TYPE);
                decode::decode(content_type, body, self.body_limit).await?
            }
        };
        Ok(self.decoded_body.insert(decoded))
    }

    /// Takes the raw body stream, for handlers that read chunks themselves.
    pub fn body_stream(&mut self) -> Result<ReqBody, DecodeError> {
        self.body.take().ok_or(DecodeError::AlreadyConsumed)
    }

    /// Returns true once the body stream has been handed out or read.
    pub fn is_body_consumed(&self) -> bool {
        self.body.is_none()
    }
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be extracted and accessed
/// by name. For example, in the path "/users/{id}", "id" is a path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(Arc<str>, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self { params: Vec::with_capacity(capacity) }
    }

    pub(crate) fn push(&mut self, name: Arc<str>, value: &str) {
        self.params.push((name, value.to_owned()));
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name.as_ref() == key).map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_ref(), value.as_str()))
    }
}
