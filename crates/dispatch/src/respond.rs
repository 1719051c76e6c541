//! Translates a [`Response`] into calls on a [`ResponseSink`].

use crate::error::{BoxError, SendError};
use crate::response::{Chunk, Payload, Response};
use crate::transport::ResponseSink;
use futures::StreamExt;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use mime::Mime;
use std::path::Path;

/// How far a response got.
#[derive(Debug)]
pub enum Delivery {
    /// The response was handed to the transport in full.
    Sent(StatusCode),
    /// Nothing was committed: the primitive used to start the response failed,
    /// so a different response may still be sent.
    Rejected(SendError),
    /// A stream was opened and then failed, by the producer or the transport.
    /// The status line is already out.
    Interrupted(BoxError),
}

/// Sends `response` through exactly one of the sink's primitives.
pub async fn respond(response: Response, sink: &dyn ResponseSink) -> Delivery {
    let status = response.status();
    let content_type = response.content_type();

    let result = match response {
        Response::PlainText { payload, .. } | Response::Html { payload, .. } => {
            send_payload(sink, status, &content_type, payload).await
        }
        Response::Json { value, .. } => match serde_json::to_string(&value) {
            Ok(json) => send_payload(sink, status, &content_type, Payload::Text(json)).await,
            Err(e) => Err(SendError::invalid_body(e)),
        },
        Response::File { path, .. } => match file_headers(&path) {
            Ok(headers) => sink.send_file(status, headers, path).await,
            Err(e) => Err(e),
        },
        Response::Stream { mut chunks, .. } => {
            let mut stream = match content_headers(&content_type) {
                Ok(headers) => match sink.open_stream(status, headers).await {
                    Ok(stream) => stream,
                    Err(e) => return Delivery::Rejected(e),
                },
                Err(e) => return Delivery::Rejected(e),
            };

            while let Some(chunk) = chunks.next().await {
                let sent = match chunk {
                    Ok(Chunk::Text(text)) => stream.send_string(text).await.map_err(BoxError::from),
                    Ok(Chunk::Bytes(bytes)) => stream.send_bytes(bytes).await.map_err(BoxError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    return Delivery::Interrupted(e);
                }
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => Delivery::Sent(status),
        Err(e) => Delivery::Rejected(e),
    }
}

async fn send_payload(sink: &dyn ResponseSink, status: StatusCode, content_type: &Mime, payload: Payload) -> Result<(), SendError> {
    let headers = content_headers(content_type)?;
    match payload {
        Payload::Text(text) => sink.send_string(status, headers, text).await,
        Payload::Bytes(bytes) => sink.send_bytes(status, headers, bytes).await,
    }
}

fn content_headers(content_type: &Mime) -> Result<HeaderMap, SendError> {
    let mut headers = HeaderMap::with_capacity(2);
    let value = HeaderValue::from_str(content_type.as_ref()).map_err(SendError::invalid_header)?;
    headers.insert(CONTENT_TYPE, value);
    Ok(headers)
}

fn file_headers(path: &Path) -> Result<HeaderMap, SendError> {
    let mut headers = content_headers(&mime::APPLICATION_OCTET_STREAM)?;
    headers.insert(CONTENT_DISPOSITION, attachment(path)?);
    Ok(headers)
}

/// `attachment; filename="<basename>"`, with `"` and `\` escaped.
fn attachment(path: &Path) -> Result<HeaderValue, SendError> {
    let name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();

    let mut value = String::with_capacity(name.len() + 24);
    value.push_str("attachment; filename=\"");
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            value.push('\\');
        }
        value.push(c);
    }
    value.push('"');

    HeaderValue::from_bytes(value.as_bytes()).map_err(SendError::invalid_header)
}

#[cfg(test)]
mod tests {
    use super::{Delivery, attachment, respond};
    use crate::error::SendError;
    use crate::response::{Chunk, Response};
    use crate::transport::{MockResponseSink, MockStreamSink, StreamSink};
    use bytes::Bytes;
    use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use http::{HeaderMap, StatusCode};
    use mockall::Sequence;
    use serde_json::json;
    use std::convert::Infallible;
    use std::path::Path;

    fn content_type(headers: &HeaderMap) -> &str {
        headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_plain_text() {
        let mut sink = MockResponseSink::new();
        sink.expect_send_string()
            .withf(|status, headers, body| {
                *status == StatusCode::OK && content_type(headers) == "text/plain; charset=utf-8" && body == "Hello, World!"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let delivery = respond(Response::text("Hello, World!"), &sink).await;
        assert!(matches!(delivery, Delivery::Sent(status) if status == StatusCode::OK));
    }

    #[tokio::test]
    async fn test_bytes_payload_uses_send_bytes() {
        let mut sink = MockResponseSink::new();
        sink.expect_send_bytes()
            .withf(|status, headers, body| {
                *status == StatusCode::CREATED && content_type(headers) == "text/html; charset=utf-8" && body == "<b>x</b>"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let response = Response::html(Bytes::from_static(b"<b>x</b>")).with_status(StatusCode::CREATED);
        assert!(matches!(respond(response, &sink).await, Delivery::Sent(status) if status == StatusCode::CREATED));
    }

    #[tokio::test]
    async fn test_json_is_serialized() {
        let mut sink = MockResponseSink::new();
        sink.expect_send_string()
            .withf(|_, headers, body| content_type(headers) == "application/json" && body == r#"{"x":1}"#)
            .times(1)
            .returning(|_, _, _| Ok(()));

        assert!(matches!(respond(Response::json(json!({"x": 1})), &sink).await, Delivery::Sent(status) if status == StatusCode::OK));
    }

    #[tokio::test]
    async fn test_file_headers() {
        let mut sink = MockResponseSink::new();
        sink.expect_send_file()
            .withf(|status, headers, path| {
                *status == StatusCode::OK
                    && content_type(headers) == "application/octet-stream"
                    && headers[CONTENT_DISPOSITION] == "attachment; filename=\"test.txt\""
                    && path == Path::new("static/test.txt")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        assert!(matches!(respond(Response::file("static/test.txt"), &sink).await, Delivery::Sent(status) if status == StatusCode::OK));
    }

    #[test]
    fn test_attachment_escaping() {
        let value = attachment(Path::new("dir/we\"ird\\name.txt")).unwrap();
        assert_eq!(value, r#"attachment; filename="we\"ird\\name.txt""#);

        let value = attachment(Path::new("résumé.pdf")).unwrap();
        assert_eq!(value.as_bytes(), "attachment; filename=\"résumé.pdf\"".as_bytes());

        assert!(matches!(attachment(Path::new("bad\nname")), Err(SendError::InvalidHeader { .. })));
    }

    #[tokio::test]
    async fn test_rejected_single_shot() {
        let mut sink = MockResponseSink::new();
        sink.expect_send_string().times(1).returning(|_, _, _| Err(SendError::Closed));

        assert!(matches!(respond(Response::text("x"), &sink).await, Delivery::Rejected(SendError::Closed)));
    }

    #[tokio::test]
    async fn test_stream_chunks_in_order() {
        let mut seq = Sequence::new();
        let mut stream = MockStreamSink::new();
        stream.expect_send_string().withf(|c| c == "a").times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        stream.expect_send_bytes().withf(|c| c == "b").times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        stream.expect_send_string().withf(|c| c == "c").times(1).in_sequence(&mut seq).returning(|_| Ok(()));

        let mut sink = MockResponseSink::new();
        sink.expect_open_stream()
            .withf(|status, headers| *status == StatusCode::OK && content_type(headers) == "text/event-stream")
            .times(1)
            .return_once(move |_, _| Ok(Box::new(stream) as Box<dyn StreamSink>));

        let chunks = futures::stream::iter(vec![
            Ok::<_, Infallible>(Chunk::from("a")),
            Ok(Chunk::from(Bytes::from_static(b"b"))),
            Ok(Chunk::from("c")),
        ]);
        let delivery = respond(Response::stream(mime::TEXT_EVENT_STREAM, chunks), &sink).await;
        assert!(matches!(delivery, Delivery::Sent(status) if status == StatusCode::OK));
    }

    #[tokio::test]
    async fn test_stream_producer_error_interrupts() {
        let mut stream = MockStreamSink::new();
        stream.expect_send_string().times(1).returning(|_| Ok(()));

        let mut sink = MockResponseSink::new();
        sink.expect_open_stream().times(1).return_once(move |_, _| Ok(Box::new(stream) as Box<dyn StreamSink>));

        let chunks = futures::stream::iter(vec![Ok("first"), Err("producer failed"), Ok("never sent")]);
        let delivery = respond(Response::octet_stream(chunks), &sink).await;
        assert!(matches!(delivery, Delivery::Interrupted(e) if e.to_string() == "producer failed"));
    }

    #[tokio::test]
    async fn test_stream_transport_error_interrupts() {
        let mut stream = MockStreamSink::new();
        stream.expect_send_bytes().times(1).returning(|_| Err(SendError::Closed));

        let mut sink = MockResponseSink::new();
        sink.expect_open_stream().times(1).return_once(move |_, _| Ok(Box::new(stream) as Box<dyn StreamSink>));

        let chunks = futures::stream::iter(vec![Ok::<_, Infallible>(Bytes::from_static(b"x")), Ok(Bytes::from_static(b"y"))]);
        let delivery = respond(Response::octet_stream(chunks), &sink).await;
        assert!(matches!(delivery, Delivery::Interrupted(_)));
    }

    #[tokio::test]
    async fn test_open_stream_failure_is_rejected() {
        let mut sink = MockResponseSink::new();
        sink.expect_open_stream().times(1).returning(|_, _| Err(SendError::Closed));

        let chunks = futures::stream::empty::<Result<Bytes, Infallible>>();
        let delivery = respond(Response::octet_stream(chunks), &sink).await;
        assert!(matches!(delivery, Delivery::Rejected(SendError::Closed)));
    }
}
