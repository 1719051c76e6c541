//! Request body as delivered by the transport.
//!
//! [`ReqBody`] erases whatever body type the transport produces into a single
//! chunk stream, and [`read_all`] buffers it up to a size ceiling.

use crate::error::{DecodeError, TransportError};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt, TryStreamExt};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

/// Default ceiling for a buffered request body: 10 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// The request body stream, consumed at most once.
///
/// Implements [`Stream`] over the data chunks of the body; trailer frames are
/// skipped.
pub struct ReqBody {
    inner: UnsyncBoxBody<Bytes, TransportError>,
}

impl ReqBody {
    /// Wraps any `http_body::Body` producing [`Bytes`].
    pub fn new<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<TransportError>,
    {
        Self { inner: body.map_err(Into::into).boxed_unsync() }
    }

    pub fn empty() -> Self {
        Self::new(Empty::<Bytes>::new())
    }

    pub fn full(bytes: impl Into<Bytes>) -> Self {
        Self::new(Full::new(bytes.into()))
    }

    /// Wraps a stream of byte chunks, such as the chunk iterator of a transport.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<TransportError> + 'static,
    {
        let frames = stream.map_ok(Frame::data).map_err(Into::<TransportError>::into);
        Self::new(StreamBody::new(frames))
    }

    /// Size hint reported by the transport, usually derived from `Content-Length`.
    pub fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Stream for ReqBody {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let inner = &mut self.get_mut().inner;
        loop {
            match ready!(Pin::new(&mut *inner).poll_frame(cx)) {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        return Poll::Ready(Some(Ok(data)));
                    }
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}

impl fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqBody").field("size_hint", &self.inner.size_hint()).finish_non_exhaustive()
    }
}

/// Reads the whole body, failing as soon as more than `limit` bytes arrived.
///
/// The size is checked at every chunk boundary; once the limit is exceeded the
/// remaining chunks are left unread. Draining them for connection reuse is up
/// to the transport.
pub async fn read_all(mut body: ReqBody, limit: usize) -> Result<Bytes, DecodeError> {
    let limit_u64 = u64::try_from(limit).unwrap_or(u64::MAX);
    if body.size_hint().lower() > limit_u64 {
        return Err(DecodeError::body_too_large(limit));
    }

    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(DecodeError::body_too_large(limit));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::{ReqBody, read_all};
    use crate::error::{DecodeError, TransportError};
    use bytes::Bytes;
    use futures::StreamExt;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chunked(chunks: &[&'static str]) -> ReqBody {
        let items: Vec<Result<Bytes, TransportError>> = chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        ReqBody::from_stream(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn test_read_all_concatenates_in_order() {
        let bytes = read_all(chunked(&["hello", " ", "world"]), 1024).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_read_all_empty_body() {
        let bytes = read_all(ReqBody::empty(), 0).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_read_all_exact_limit() {
        let bytes = read_all(chunked(&["abc", "def"]), 6).await.unwrap();
        assert_eq!(bytes.len(), 6);
    }

    #[tokio::test]
    async fn test_read_all_stops_after_limit() {
        let polled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polled);
        let items: Vec<Result<Bytes, TransportError>> =
            vec![Ok(Bytes::from_static(b"aaaa")), Ok(Bytes::from_static(b"bbbb")), Ok(Bytes::from_static(b"cccc"))];
        let stream = futures::stream::iter(items).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = read_all(ReqBody::from_stream(stream), 6).await;

        assert!(matches!(result, Err(DecodeError::BodyTooLarge { limit: 6 })));
        assert_eq!(polled.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_read_all_rejects_by_size_hint() {
        let result = read_all(ReqBody::full(vec![b'x'; 20]), 10).await;
        assert!(matches!(result, Err(DecodeError::BodyTooLarge { limit: 10 })));
    }

    #[tokio::test]
    async fn test_read_all_transport_error() {
        let items: Vec<Result<Bytes, io::Error>> =
            vec![Ok(Bytes::from_static(b"partial")), Err(io::Error::from(io::ErrorKind::ConnectionReset))];
        let body = ReqBody::from_stream(futures::stream::iter(items));

        let result = read_all(body, 1024).await;
        assert!(matches!(result, Err(DecodeError::Transport { source: TransportError::Io { .. } })));
    }

    #[tokio::test]
    async fn test_stream_yields_chunks() {
        let mut body = chunked(&["a", "b"]);
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"a"));
        assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"b"));
        assert!(body.next().await.is_none());
    }
}
