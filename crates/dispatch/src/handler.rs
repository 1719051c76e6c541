use crate::error::BoxError;
use crate::request::{PathParams, RequestContext};
use crate::response::Response;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Serves a matched request.
///
/// Static and fallback routes receive empty [`PathParams`]; parametric routes
/// receive the segments their template captured.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, ctx: RequestContext, params: PathParams) -> Result<Response, BoxError>;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    async fn invoke(&self, ctx: RequestContext, params: PathParams) -> Result<Response, BoxError> {
        (**self).invoke(ctx, params).await
    }
}

/// a `Fn` holder which represents any async fn of `(RequestContext, PathParams)`
pub struct FnHandler<F, R, E> {
    f: F,
    _phantom: PhantomData<fn() -> (R, E)>,
}

impl<F, R, E> FnHandler<F, R, E> {
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

impl<F, R, E> fmt::Debug for FnHandler<F, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("f", &std::any::type_name::<F>()).finish()
    }
}

/// Adapts an async function into a [`RequestHandler`].
///
/// The function may return anything convertible into a [`Response`] and any
/// error convertible into a [`BoxError`].
pub fn handler_fn<F, Fut, R, E>(f: F) -> FnHandler<F, R, E>
where
    F: Fn(RequestContext, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<Response>,
    E: Into<BoxError>,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Fut, R, E> RequestHandler for FnHandler<F, R, E>
where
    F: Fn(RequestContext, PathParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<Response> + 'static,
    E: Into<BoxError> + 'static,
{
    async fn invoke(&self, ctx: RequestContext, params: PathParams) -> Result<Response, BoxError> {
        match (self.f)(ctx, params).await {
            Ok(response) => Ok(response.into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestHandler, handler_fn};
    use crate::body::ReqBody;
    use crate::request::{PathParams, RequestContext};
    use crate::response::{Payload, Response};
    use http::Request;
    use std::convert::Infallible;

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    fn context() -> RequestContext {
        RequestContext::from_request(Request::builder().uri("/").body(ReqBody::empty()).unwrap(), 1024)
    }

    #[test]
    fn assert_fn_is_handler() {
        async fn index(_ctx: RequestContext, _params: PathParams) -> Result<&'static str, Infallible> {
            Ok("Hello, World!")
        }

        async fn fallible(_ctx: RequestContext, _params: PathParams) -> Result<Response, std::io::Error> {
            Err(std::io::Error::other("nope"))
        }

        assert_is_handler(&handler_fn(index));
        assert_is_handler(&handler_fn(fallible));
        let boxed: Box<dyn RequestHandler> = Box::new(handler_fn(index));
        assert_is_handler(&boxed);
    }

    #[tokio::test]
    async fn test_invoke_converts_result() {
        let handler = handler_fn(|_ctx, _params| async { Ok::<_, Infallible>(String::from("ok")) });
        let response = handler.invoke(context(), PathParams::empty()).await.unwrap();
        assert!(matches!(response, Response::PlainText { payload: Payload::Text(text), .. } if text == "ok"));

        let handler = handler_fn(|_ctx, _params| async { Err::<Response, _>("boom") });
        let err = handler.invoke(context(), PathParams::empty()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
