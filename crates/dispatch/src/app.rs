use crate::body::ReqBody;
use crate::config::Config;
use crate::logging;
use crate::request::RequestContext;
use crate::respond::{Delivery, respond};
use crate::response::Response;
use crate::router::RouteTable;
use crate::transport::ResponseSink;

use futures::FutureExt;
use http::{Request, StatusCode};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span};

/// Builds an [`App`] from a route table and settings.
#[derive(Debug)]
pub struct AppBuilder {
    routes: Option<RouteTable>,
    config: Config,
}

impl AppBuilder {
    fn new() -> Self {
        Self { routes: None, config: Config::default() }
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Replaces all settings at once.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn enable_logging(mut self, enable_logging: bool) -> Self {
        self.config.enable_logging = enable_logging;
        self
    }

    pub fn body_limit(mut self, body_limit: usize) -> Self {
        self.config.body_limit = body_limit;
        self
    }

    /// Builds the app, installing the global log subscriber if logging is enabled.
    pub fn build(self) -> Result<App, AppBuildError> {
        let routes = self.routes.ok_or(AppBuildError::MissingRoutes)?;
        if self.config.enable_logging {
            logging::init(self.config.debug);
        }
        info!(app = %self.config.name, routes = routes.len(), "app built");
        Ok(App { routes, config: self.config })
    }
}

#[derive(Error, Debug)]
pub enum AppBuildError {
    #[error("routes must be set")]
    MissingRoutes,
}

/// Dispatches requests to the handlers of a frozen [`RouteTable`].
///
/// An `App` holds no per-request state and is shared between request tasks,
/// typically behind an `Arc`.
#[derive(Debug)]
pub struct App {
    routes: RouteTable,
    config: Config,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Serves one request end to end and returns the status that was logged.
    ///
    /// The response goes out through `sink`. When the sink refuses a response
    /// before anything was committed, a `500 Internal Server Error` is sent
    /// instead; when a streamed response breaks midway the failure is only
    /// logged.
    pub async fn dispatch(&self, request: Request<ReqBody>, sink: &dyn ResponseSink) -> StatusCode {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let span = info_span!("dispatch", app = %self.config.name);

        async move {
            let response = self.handle(request).await;
            let status = match respond(response, sink).await {
                Delivery::Sent(status) => status,
                Delivery::Rejected(e) => {
                    error!("failed to send response for {} {}: {}", method, path, e);
                    debug!("send error detail: {:?}", e);
                    send_internal_error(sink).await;
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                Delivery::Interrupted(e) => {
                    error!("stream for {} {} interrupted: {}", method, path, e);
                    debug!("stream error detail: {:?}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };

            info!("{} {} - {}", method, path, status.as_u16());
            status
        }
        .instrument(span)
        .await
    }

    /// Runs the handler matched by `request` and returns its response.
    ///
    /// Unmatched requests get `404 Not Found`; a handler that fails or panics
    /// gets `500 Internal Server Error`, with the detail only logged.
    pub async fn handle(&self, request: Request<ReqBody>) -> Response {
        let (head, body) = request.into_parts();
        let Some(resolved) = self.routes.resolve(head.uri.path(), &head.method) else {
            debug!("no route for {} {}", head.method, head.uri.path());
            return Response::not_found();
        };

        let method = head.method.clone();
        let path = head.uri.path().to_owned();
        let (handler, params) = resolved.into_parts();
        let ctx = RequestContext::new(head, body, self.config.body_limit);

        match AssertUnwindSafe(handler.invoke(ctx, params)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!("error in handler for {} {}: {}", method, path, e);
                debug!("handler error detail: {:?}", e);
                Response::internal_server_error()
            }
            Err(panic) => {
                error!("handler for {} {} panicked", method, path);
                debug!("handler panic payload: {:?}", panic_message(panic.as_ref()));
                Response::internal_server_error()
            }
        }
    }
}

async fn send_internal_error(sink: &dyn ResponseSink) {
    match respond(Response::internal_server_error(), sink).await {
        Delivery::Sent(_) => {}
        Delivery::Rejected(e) => debug!(cause = %e, "failed to send fallback 500 response"),
        Delivery::Interrupted(e) => debug!(cause = %e, "failed to send fallback 500 response"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
