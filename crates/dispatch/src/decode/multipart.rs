//! Decoder for `multipart/form-data` bodies ([RFC 7578](https://tools.ietf.org/html/rfc7578)).
//!
//! The body is a sequence of parts, each introduced by a `--boundary` line and
//! made of a header block followed by raw content:
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="field"\r\n
//! \r\n
//! value\r\n
//! --boundary--\r\n
//! ```
//!
//! Parts carrying a `filename` become [`Part::File`], the others are decoded as
//! UTF-8 text, replacing invalid sequences.

use crate::decode::charset::Charset;
use crate::decode::form::Fields;
use crate::error::DecodeError;
use bytes::Bytes;
use httparse::Status;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use tracing::trace;

const MAX_PART_HEADERS: usize = 16;

/// One decoded multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    File(FilePart),
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    /// The part's own `Content-Type`, `application/octet-stream` when absent.
    pub content_type: String,
    pub content: Bytes,
}

impl Part {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FilePart> {
        match self {
            Part::Text(_) => None,
            Part::File(file) => Some(file),
        }
    }
}

/// Decoded `multipart/form-data`: field names to parts, in body order.
pub type MultipartData = Fields<Part>;

/// Splits `body` on `boundary` and decodes every part.
///
/// The preamble before the first delimiter and the epilogue after the closing
/// delimiter are ignored. Fails on broken framing or on a part without a
/// `name` in its `Content-Disposition`.
pub fn parse(body: &Bytes, boundary: &str) -> Result<MultipartData, DecodeError> {
    if boundary.is_empty() {
        return Err(DecodeError::MissingBoundary);
    }

    let delimiter = format!("--{boundary}").into_bytes();
    let mut next_delimiter = b"\r\n".to_vec();
    next_delimiter.extend_from_slice(&delimiter);

    let mut cursor = if body.starts_with(&delimiter) {
        delimiter.len()
    } else {
        find(body, &next_delimiter, 0).ok_or_else(|| DecodeError::multipart("missing opening boundary"))?
            + next_delimiter.len()
    };

    let mut fields = MultipartData::new();
    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            trace!(fields = fields.len(), "finished reading multipart body");
            return Ok(fields);
        }

        // transport padding may follow the boundary before the line break
        let padding = rest.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        if !rest[padding..].starts_with(b"\r\n") {
            return Err(DecodeError::multipart("boundary is not followed by a line break"));
        }

        let start = cursor + padding + 2;
        let end = find(body, &next_delimiter, start).ok_or_else(|| DecodeError::multipart("missing closing boundary"))?;

        let (name, part) = parse_part(body.slice(start..end))?;
        trace!(name = %name, "read multipart field");
        fields.insert(name, part);

        cursor = end + next_delimiter.len();
    }
}

fn parse_part(raw: Bytes) -> Result<(String, Part), DecodeError> {
    let mut header_buf = [httparse::EMPTY_HEADER; MAX_PART_HEADERS];
    let (header_len, headers) = match httparse::parse_headers(&raw, &mut header_buf) {
        Ok(Status::Complete(parsed)) => parsed,
        Ok(Status::Partial) => return Err(DecodeError::multipart("unterminated part headers")),
        Err(e) => return Err(DecodeError::multipart(format!("invalid part headers: {e}"))),
    };

    let mut disposition = None;
    let mut content_type = None;
    for header in headers {
        if header.name.eq_ignore_ascii_case("content-disposition") {
            disposition = Some(String::from_utf8_lossy(header.value));
        } else if header.name.eq_ignore_ascii_case("content-type") {
            content_type = Some(String::from_utf8_lossy(header.value).trim().to_owned());
        }
    }

    let disposition = disposition.ok_or_else(|| DecodeError::multipart("part has no Content-Disposition header"))?;
    let params = disposition_params(&disposition);

    let name = param(&params, "name").ok_or_else(|| DecodeError::multipart("part has no name"))?.to_owned();
    let filename = param(&params, "filename*")
        .and_then(decode_ext_value)
        .or_else(|| param(&params, "filename").map(str::to_owned));

    let content = raw.slice(header_len..);
    let part = match filename {
        Some(filename) => Part::File(FilePart {
            filename,
            content_type: content_type.unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
            content,
        }),
        None => Part::Text(String::from_utf8_lossy(&content).into_owned()),
    };

    Ok((name, part))
}

pub(super) fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}

/// Parameters of a `Content-Disposition` value, names lowercased.
///
/// Also used for `Content-Type` values the `mime` crate refuses.
pub(super) fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let Some((_, mut rest)) = value.split_once(';') else {
        return params;
    };

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_ascii_whitespace());
        if rest.is_empty() {
            return params;
        }

        let name_end = rest.find(['=', ';']).unwrap_or(rest.len());
        let name = rest[..name_end].trim().to_ascii_lowercase();
        rest = &rest[name_end..];

        let Some(raw_value) = rest.strip_prefix('=') else {
            continue;
        };
        let raw_value = raw_value.trim_start();

        let (value, remaining) = match raw_value.strip_prefix('"') {
            Some(quoted) => unquote(quoted),
            None => {
                let end = raw_value.find(';').unwrap_or(raw_value.len());
                (Cow::Borrowed(raw_value[..end].trim()), &raw_value[end..])
            }
        };
        params.push((name, value.into_owned()));
        rest = remaining;
    }
}

/// Reads a quoted-string whose opening quote was already consumed, returning
/// the value and the input after the closing quote.
///
/// A backslash only escapes `"` and `\`; browsers send Windows paths unescaped.
fn unquote(input: &str) -> (Cow<'_, str>, &str) {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return (Cow::Owned(value), &input[i + 1..]),
            '\\' if matches!(chars.peek(), Some((_, '"' | '\\'))) => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            c => value.push(c),
        }
    }
    (Cow::Owned(value), "")
}

/// Decodes an RFC 5987 extended value: `charset'language'percent-encoded`.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut pieces = value.splitn(3, '\'');
    let charset = Charset::from_label(pieces.next()?).ok()?;
    let _language = pieces.next()?;
    let encoded = pieces.next()?;
    charset.decode(percent_decode_str(encoded).collect()).ok()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..].windows(needle.len()).position(|window| window == needle).map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::{Part, disposition_params, parse};
    use crate::decode::form::FieldValue;
    use crate::error::DecodeError;
    use bytes::Bytes;
    use indoc::indoc;

    fn crlf(text: &str) -> Bytes {
        Bytes::from(text.replace('\n', "\r\n"))
    }

    #[test]
    fn test_repeated_names_become_lists() {
        let body = crlf(indoc! {r#"
            --XyZ
            Content-Disposition: form-data; name="tag"

            x
            --XyZ
            Content-Disposition: form-data; name="tag"

            y
            --XyZ--
        "#});

        let fields = parse(&body, "XyZ").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("tag"), Some(&FieldValue::Many(vec![Part::Text("x".into()), Part::Text("y".into())])));
    }

    #[test]
    fn test_third_occurrence_appends_in_body_order() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; name="n"

            3
            --b
            Content-Disposition: form-data; name="other"

            -
            --b
            Content-Disposition: form-data; name="n"

            1
            --b
            Content-Disposition: form-data; name="n"

            2
            --b--
        "#});

        let fields = parse(&body, "b").unwrap();
        let values: Vec<&str> = fields.get("n").unwrap().iter().filter_map(Part::as_text).collect();
        assert_eq!(values, ["3", "1", "2"]);
        let names: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["n", "other"]);
    }

    #[test]
    fn test_file_part_keeps_binary_content() {
        let mut raw = b"--boundary\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\n\
            Content-Type: application/pdf\r\n\
            \r\n"
            .to_vec();
        let content = [0x25, 0x50, 0x44, 0x46, 0x00, 0xff, b'\r', b'\n', 0x80];
        raw.extend_from_slice(&content);
        raw.extend_from_slice(b"\r\n--boundary--\r\n");

        let fields = parse(&Bytes::from(raw), "boundary").unwrap();
        let file = fields.first("file").and_then(Part::as_file).unwrap();
        assert_eq!(file.filename, "report.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.content.as_ref(), content);
    }

    #[test]
    fn test_file_part_default_content_type() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; name="upload"; filename="notes.txt"

            hello
            --b--
        "#});

        let fields = parse(&body, "b").unwrap();
        let file = fields.first("upload").and_then(Part::as_file).unwrap();
        assert_eq!(file.content_type, "application/octet-stream");
        assert_eq!(file.content, Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_extended_filename_is_preferred() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; name="f"; filename="fallback.txt"; filename*=UTF-8''na%C3%AFve%20file.txt

            data
            --b--
        "#});

        let fields = parse(&body, "b").unwrap();
        let file = fields.first("f").and_then(Part::as_file).unwrap();
        assert_eq!(file.filename, "naïve file.txt");
    }

    #[test]
    fn test_extended_filename_latin1_keeps_stray_percent() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; name="f"; filename*=iso-8859-1'fr'caf%E9%zz.txt

            data
            --b--
        "#});

        let fields = parse(&body, "b").unwrap();
        let file = fields.first("f").and_then(Part::as_file).unwrap();
        assert_eq!(file.filename, "café%zz.txt");
    }

    #[test]
    fn test_text_part_invalid_utf8_is_replaced() {
        let raw = b"--b\r\nContent-Disposition: form-data; name=\"t\"\r\n\r\nok\xff\r\n--b--".to_vec();

        let fields = parse(&Bytes::from(raw), "b").unwrap();
        assert_eq!(fields.first("t").and_then(Part::as_text), Some("ok\u{fffd}"));
    }

    #[test]
    fn test_preamble_epilogue_and_padding() {
        let body = crlf(indoc! {r#"
            this is a preamble
            --b
            content-disposition: form-data; name="a"

            1
            --b--
            this is an epilogue
        "#});

        let fields = parse(&body, "b").unwrap();
        assert_eq!(fields.first("a").and_then(Part::as_text), Some("1"));
    }

    #[test]
    fn test_empty_part_content() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; name="empty"


            --b--
        "#});

        let fields = parse(&body, "b").unwrap();
        assert_eq!(fields.first("empty").and_then(Part::as_text), Some(""));
    }

    #[test]
    fn test_multiline_text_value() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; name="msg"

            line one
            line two
            --b--
        "#});

        let fields = parse(&body, "b").unwrap();
        assert_eq!(fields.first("msg").and_then(Part::as_text), Some("line one\r\nline two"));
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let body = crlf(indoc! {r#"
            --b
            Content-Disposition: form-data; filename="a.txt"

            data
            --b--
        "#});

        assert!(matches!(parse(&body, "b"), Err(DecodeError::Multipart { .. })));
    }

    #[test]
    fn test_missing_disposition_is_an_error() {
        let body = crlf("--b\nContent-Type: text/plain\n\ndata\n--b--\n");
        assert!(matches!(parse(&body, "b"), Err(DecodeError::Multipart { .. })));
    }

    #[test]
    fn test_missing_closing_boundary() {
        let body = crlf("--b\nContent-Disposition: form-data; name=\"a\"\n\nunterminated");
        assert!(matches!(parse(&body, "b"), Err(DecodeError::Multipart { .. })));
    }

    #[test]
    fn test_missing_opening_boundary() {
        let body = crlf("no boundary here at all");
        assert!(matches!(parse(&body, "b"), Err(DecodeError::Multipart { .. })));
    }

    #[test]
    fn test_empty_boundary() {
        assert!(matches!(parse(&Bytes::new(), ""), Err(DecodeError::MissingBoundary)));
    }

    #[test]
    fn test_no_parts() {
        let fields = parse(&crlf("--b--\n"), "b").unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_disposition_params() {
        let params = disposition_params(r#"form-data; name="a \"b\""; filename=C:\dir\x.txt; flag; other=plain"#);
        assert_eq!(
            params,
            vec![
                ("name".to_string(), "a \"b\"".to_string()),
                ("filename".to_string(), r"C:\dir\x.txt".to_string()),
                ("other".to_string(), "plain".to_string()),
            ]
        );
    }
}
