//! Dispatches a few in-memory requests and prints what would go on the wire.
//!
//! cargo run --example hello_world

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, Request, StatusCode};
use micro_dispatch::error::{BoxError, SendError};
use micro_dispatch::{App, PathParams, ReqBody, RequestContext, Response, ResponseSink, RouteTable, StreamSink, handler_fn};
use std::convert::Infallible;
use std::path::PathBuf;

/// Prints every response instead of writing it to a socket.
struct StdoutSink;

#[async_trait]
impl ResponseSink for StdoutSink {
    async fn send_bytes(&self, status: StatusCode, headers: HeaderMap, body: Bytes) -> Result<(), SendError> {
        println!("{status} {headers:?}\n{body:?}\n");
        Ok(())
    }

    async fn send_string(&self, status: StatusCode, headers: HeaderMap, body: String) -> Result<(), SendError> {
        println!("{status} {headers:?}\n{body}\n");
        Ok(())
    }

    async fn send_file(&self, status: StatusCode, headers: HeaderMap, path: PathBuf) -> Result<(), SendError> {
        println!("{status} {headers:?}\n<content of {}>\n", path.display());
        Ok(())
    }

    async fn open_stream(&self, status: StatusCode, headers: HeaderMap) -> Result<Box<dyn StreamSink>, SendError> {
        println!("{status} {headers:?}");
        Ok(Box::new(StdoutSink))
    }
}

#[async_trait]
impl StreamSink for StdoutSink {
    async fn send_bytes(&mut self, chunk: Bytes) -> Result<(), SendError> {
        println!("chunk: {chunk:?}");
        Ok(())
    }

    async fn send_string(&mut self, chunk: String) -> Result<(), SendError> {
        println!("chunk: {chunk}");
        Ok(())
    }
}

async fn index(_ctx: RequestContext, _params: PathParams) -> Result<&'static str, Infallible> {
    Ok("Hello, World!")
}

async fn echo(mut ctx: RequestContext, _params: PathParams) -> Result<String, BoxError> {
    let args = ctx.args()?;
    Ok(args.first("echo").cloned().unwrap_or_else(|| "No echo parameter provided".to_owned()))
}

async fn send_file_test(_ctx: RequestContext, _params: PathParams) -> Result<Response, Infallible> {
    Ok(Response::file("test.txt"))
}

async fn serve_file(_ctx: RequestContext, params: PathParams) -> Result<String, Infallible> {
    Ok(format!("Serving static file: {}", params.get("file").unwrap_or_default()))
}

async fn get_body(mut ctx: RequestContext, _params: PathParams) -> Result<String, BoxError> {
    let body = ctx.body().await?;
    Ok(format!("{body:?}"))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let routes = RouteTable::builder()
        .get("/", handler_fn(index))?
        .get("/echo", handler_fn(echo))?
        .get("/testfile", handler_fn(send_file_test))?
        .get("/test/{file}", handler_fn(serve_file))?
        .post("/get-body", handler_fn(get_body))?
        .build();

    let app = App::builder().routes(routes).name("hello_world").enable_logging(true).debug(true).build()?;

    let requests = [
        (Method::GET, "/", None),
        (Method::GET, "/echo?echo=hi", None),
        (Method::GET, "/testfile", None),
        (Method::GET, "/test/report.pdf", None),
        (Method::POST, "/get-body", Some(r#"{"x":1}"#)),
        (Method::GET, "/missing", None),
    ];

    for (method, uri, json) in requests {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match json {
            Some(json) => {
                builder = builder.header(http::header::CONTENT_TYPE, "application/json");
                ReqBody::full(json)
            }
            None => ReqBody::empty(),
        };
        app.dispatch(builder.body(body)?, &StdoutSink).await;
    }

    Ok(())
}
