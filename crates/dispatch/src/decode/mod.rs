//! Content-type aware request body decoding.
//!
//! The decoder looks only at the MIME essence of the `Content-Type` header:
//!
//! | content type                        | result                      |
//! |-------------------------------------|-----------------------------|
//! | `application/json`                  | [`DecodedBody::Json`]       |
//! | `application/x-www-form-urlencoded` | [`DecodedBody::Form`]       |
//! | `multipart/form-data`               | [`DecodedBody::Multipart`]  |
//! | anything else, or no header         | [`DecodedBody::Raw`]        |
//!
//! Parameters such as `charset` and `boundary` are read separately.

mod charset;
mod form;
pub mod multipart;

pub use charset::Charset;
pub use form::{FieldValue, Fields, FormData, parse_form};
pub use multipart::{FilePart, MultipartData, Part};

use crate::body::{ReqBody, read_all};
use crate::error::DecodeError;
use bytes::Bytes;
use http::HeaderValue;
use mime::Mime;
use tracing::debug;

/// A request body decoded according to its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    Json(serde_json::Value),
    Form(FormData),
    Multipart(MultipartData),
    Raw(Bytes),
}

impl DecodedBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            DecodedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            DecodedBody::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_multipart(&self) -> Option<&MultipartData> {
        match self {
            DecodedBody::Multipart(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Bytes> {
        match self {
            DecodedBody::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// What a `Content-Type` header asks the decoder to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Json { charset: Option<String> },
    Form { charset: Option<String> },
    Multipart { boundary: Option<String> },
    Raw,
}

impl ContentKind {
    /// Classifies a `Content-Type` header by its MIME essence. A missing
    /// header, or one whose essence is not recognized, is treated as
    /// `application/octet-stream`.
    ///
    /// Parameters the `mime` crate refuses (an unquoted `=` in a boundary, a
    /// bare `charset`) do not change the essence; they are read with a
    /// lenient scan instead.
    pub fn from_header(content_type: Option<&HeaderValue>) -> Self {
        let Some(value) = content_type.and_then(|value| value.to_str().ok()) else {
            return ContentKind::Raw;
        };

        match value.parse::<Mime>() {
            Ok(parsed) => Self::classify(parsed.essence_str(), |name| {
                parsed.get_param(name).map(|value| value.as_str().trim_matches('"').to_owned())
            }),
            Err(e) => {
                debug!(content_type = value, cause = %e, "falling back to lenient content type parsing");
                let essence = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
                let params = multipart::disposition_params(value);
                Self::classify(&essence, |name| multipart::param(&params, name.as_str()).map(str::to_owned))
            }
        }
    }

    fn classify(essence: &str, param: impl Fn(mime::Name<'static>) -> Option<String>) -> Self {
        match essence {
            "application/json" => ContentKind::Json { charset: param(mime::CHARSET) },
            "application/x-www-form-urlencoded" => ContentKind::Form { charset: param(mime::CHARSET) },
            "multipart/form-data" => {
                ContentKind::Multipart { boundary: param(mime::BOUNDARY).filter(|boundary| !boundary.is_empty()) }
            }
            _ => ContentKind::Raw,
        }
    }
}

/// Reads the body (at most `limit` bytes) and decodes it per `content_type`.
///
/// A `multipart/form-data` request without a boundary fails before anything
/// is read.
pub async fn decode(content_type: Option<&HeaderValue>, body: ReqBody, limit: usize) -> Result<DecodedBody, DecodeError> {
    let kind = ContentKind::from_header(content_type);
    if matches!(kind, ContentKind::Multipart { boundary: None }) {
        return Err(DecodeError::MissingBoundary);
    }

    let bytes = read_all(body, limit).await?;
    debug!(len = bytes.len(), kind = ?kind, "decoding request body");
    decode_bytes(&kind, bytes)
}

/// Decodes an already buffered body.
pub fn decode_bytes(kind: &ContentKind, bytes: Bytes) -> Result<DecodedBody, DecodeError> {
    match kind {
        ContentKind::Json { charset } => {
            let text = decode_text(charset.as_deref(), bytes)?;
            Ok(DecodedBody::Json(serde_json::from_str(&text)?))
        }
        ContentKind::Form { charset } => {
            let text = decode_text(charset.as_deref(), bytes)?;
            Ok(DecodedBody::Form(parse_form(&text)?))
        }
        ContentKind::Multipart { boundary: Some(boundary) } => Ok(DecodedBody::Multipart(multipart::parse(&bytes, boundary)?)),
        ContentKind::Multipart { boundary: None } => Err(DecodeError::MissingBoundary),
        ContentKind::Raw => Ok(DecodedBody::Raw(bytes)),
    }
}

fn decode_text(charset: Option<&str>, bytes: Bytes) -> Result<String, DecodeError> {
    let charset = charset.map_or(Ok(Charset::Utf8), Charset::from_label)?;
    charset.decode(bytes.into())
}
