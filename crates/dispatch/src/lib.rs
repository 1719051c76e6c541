//! An async request dispatch layer.
//!
//! micro-dispatch sits between a transport, which parses requests and writes
//! responses, and plain async handler functions:
//!
//! - [`RouteTable`] matches `(method, path)` against static, parametric and
//!   fallback routes
//! - [`RequestContext`] exposes the request head and decodes the query string
//!   and the body lazily, according to the `Content-Type`
//! - [`Response`] is what handlers return; [`App::dispatch`] translates it
//!   into calls on a [`ResponseSink`]
//!
//! # Example
//!
//! ```no_run
//! use micro_dispatch::{App, PathParams, RequestContext, RouteTable, handler_fn};
//! use std::convert::Infallible;
//!
//! async fn index(_ctx: RequestContext, _params: PathParams) -> Result<&'static str, Infallible> {
//!     Ok("Hello, World!")
//! }
//!
//! async fn serve_file(_ctx: RequestContext, params: PathParams) -> Result<String, Infallible> {
//!     Ok(format!("Serving static file: {}", params.get("file").unwrap_or_default()))
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let routes = RouteTable::builder()
//!     .get("/", handler_fn(index))?
//!     .get("/test/{file}", handler_fn(serve_file))?
//!     .build();
//!
//! let app = App::builder().routes(routes).name("example").enable_logging(true).build()?;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

mod app;
mod body;
mod config;
mod handler;
mod request;
mod respond;
mod response;

pub mod decode;
pub mod error;
pub mod logging;
pub mod router;
pub mod transport;

pub use app::{App, AppBuildError, AppBuilder};
pub use body::{DEFAULT_BODY_LIMIT, ReqBody, read_all};
pub use config::Config;
pub use decode::DecodedBody;
pub use handler::{FnHandler, RequestHandler, handler_fn};
pub use request::{PathParams, RequestContext};
pub use respond::{Delivery, respond};
pub use response::{Chunk, ChunkStream, Payload, Response};
pub use router::{MethodFilter, RouteTable, RouteTableBuilder};
pub use transport::{ResponseSink, StreamSink};
