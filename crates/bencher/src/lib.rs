use bytes::Bytes;
use micro_dispatch::{PathParams, RequestContext, RouteTable, handler_fn};
use std::convert::Infallible;

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self { name, group, file }
    }

    pub fn small(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Small, file)
    }

    pub fn large(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Large, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

/// A fixture compiled into the bench binary.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// The content with every line break turned into CRLF, as sent on the wire.
    pub fn wire_bytes(&self) -> Bytes {
        Bytes::from(self.content.replace("\r\n", "\n").replace('\n', "\r\n"))
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

async fn noop(_ctx: RequestContext, _params: PathParams) -> Result<&'static str, Infallible> {
    Ok("")
}

/// A table with `size` static routes and `size` parametric routes.
///
/// Static routes are `/static/{i}`, parametric ones `/api/v{i}/items/{id}`,
/// so the last parametric route is the slowest to reach.
pub fn route_table(size: usize) -> RouteTable {
    let mut builder = RouteTable::builder();
    for i in 0..size {
        builder = match builder.get(&format!("/static/{i}"), handler_fn(noop)) {
            Ok(builder) => builder,
            Err(e) => panic!("invalid bench route: {e}"),
        };
        builder = match builder.get(&format!("/api/v{i}/items/{{id}}"), handler_fn(noop)) {
            Ok(builder) => builder,
            Err(e) => panic!("invalid bench route: {e}"),
        };
    }
    builder.build()
}
