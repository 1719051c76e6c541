pub mod filter;
mod pattern;

pub use filter::MethodFilter;
pub use pattern::PathPattern;

use crate::PathParams;
use crate::error::RouteError;
use crate::handler::RequestHandler;

use http::Method;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// The path that registers a fallback route.
pub const FALLBACK_PATH: &str = "*";

/// Immutable table of routes, built once by [`RouteTableBuilder`].
///
/// Resolution order:
/// 1. static routes, an exact method before [`MethodFilter::Any`]
/// 2. parametric routes, in registration order
/// 3. the fallback route
pub struct RouteTable {
    statics: HashMap<String, Vec<RouteItem>>,
    parametric: Vec<(PathPattern, RouteItem)>,
    fallback: Option<RouteItem>,
}

/// A method filter and the handler it guards
pub struct RouteItem {
    filter: MethodFilter,
    handler: Box<dyn RequestHandler>,
}

/// Which kind of route answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Static,
    Parametric,
    Fallback,
}

/// Result of resolving a request, containing the handler and path parameters
pub struct Resolved<'router> {
    handler: &'router dyn RequestHandler,
    params: PathParams,
    kind: RouteKind,
}

impl RouteTable {
    /// Creates a new, empty route table builder
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Finds the handler for a request.
    ///
    /// Returns `None` when no route matches, which the dispatcher answers with
    /// `404 Not Found`. Standard methods match regardless of case.
    pub fn resolve(&self, path: &str, method: &Method) -> Option<Resolved<'_>> {
        let method: &Method = &filter::canonical(method);
        if let Some(items) = self.statics.get(path) {
            let exact = items.iter().find(|item| !item.filter.is_any() && item.filter.matches(method));
            if let Some(item) = exact.or_else(|| items.iter().find(|item| item.filter.is_any())) {
                return Some(Resolved::new(item.handler(), PathParams::empty(), RouteKind::Static));
            }
        }

        for (pattern, item) in &self.parametric {
            if !item.filter.matches(method) {
                continue;
            }
            if let Some(params) = pattern.matches(path) {
                return Some(Resolved::new(item.handler(), params, RouteKind::Parametric));
            }
        }

        self.fallback
            .as_ref()
            .filter(|item| item.filter.matches(method))
            .map(|item| Resolved::new(item.handler(), PathParams::empty(), RouteKind::Fallback))
    }

    /// Number of registered routes, the fallback included
    pub fn len(&self) -> usize {
        self.statics.values().map(Vec::len).sum::<usize>() + self.parametric.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RouteItem {
    /// Gets the method filter for this route item
    pub fn filter(&self) -> &MethodFilter {
        &self.filter
    }

    /// Gets the request handler for this route item
    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }
}

impl<'router> Resolved<'router> {
    fn new(handler: &'router dyn RequestHandler, params: PathParams, kind: RouteKind) -> Self {
        Self { handler, params, kind }
    }

    pub fn handler(&self) -> &'router dyn RequestHandler {
        self.handler
    }

    /// Gets the path parameters captured by the matched route
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn into_parts(self) -> (&'router dyn RequestHandler, PathParams) {
        (self.handler, self.params)
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("statics", &self.statics)
            .field("parametric", &self.parametric)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl fmt::Debug for RouteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteItem").field("filter", &self.filter).finish_non_exhaustive()
    }
}

impl fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved").field("params", &self.params).field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Collects routes and rejects conflicting registrations as they arrive.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    statics: HashMap<String, Vec<RouteItem>>,
    parametric: Vec<(PathPattern, RouteItem)>,
    fallback: Option<RouteItem>,
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Registers `handler` for ", stringify!($method), " requests to `path`.")]
        pub fn $name<H: RequestHandler + 'static>(self, path: &str, handler: H) -> Result<Self, RouteError> {
            self.register(path, Method::$method, handler)
        }
    };
}

impl RouteTableBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// - `"*"` installs the fallback route; only one may exist.
    /// - a path without `{` is a static route; `(path, method)` must be unique.
    /// - any other path is compiled into a [`PathPattern`] and tried after the
    ///   static routes, in registration order.
    pub fn register<H: RequestHandler + 'static>(
        mut self,
        path: &str,
        method: impl Into<MethodFilter>,
        handler: H,
    ) -> Result<Self, RouteError> {
        let item = RouteItem { filter: method.into(), handler: Box::new(handler) };

        if path == FALLBACK_PATH {
            if let Some(existing) = &self.fallback {
                return Err(RouteError::duplicate_fallback(&existing.filter));
            }
            debug!("registered fallback route for method: {}", item.filter);
            self.fallback = Some(item);
            return Ok(self);
        }

        if !path.contains('{') {
            let items = self.statics.entry(path.to_owned()).or_default();
            if items.iter().any(|existing| existing.filter == item.filter) {
                return Err(RouteError::duplicate_route(path, &item.filter));
            }
            debug!("registered static route: {} {}", item.filter, path);
            items.push(item);
            return Ok(self);
        }

        let pattern = PathPattern::compile(path)?;
        debug!(captures = pattern.captures(), "registered parametric route: {} {}", item.filter, pattern);
        self.parametric.push((pattern, item));
        Ok(self)
    }

    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);
    method_route!(options, OPTIONS);

    /// Registers `handler` for every method on `path`.
    pub fn any<H: RequestHandler + 'static>(self, path: &str, handler: H) -> Result<Self, RouteError> {
        self.register(path, MethodFilter::Any, handler)
    }

    /// Registers the route used when nothing else matches.
    pub fn fallback<H: RequestHandler + 'static>(self, method: impl Into<MethodFilter>, handler: H) -> Result<Self, RouteError> {
        self.register(FALLBACK_PATH, method, handler)
    }

    /// Freezes the routes into an immutable table
    pub fn build(self) -> RouteTable {
        RouteTable { statics: self.statics, parametric: self.parametric, fallback: self.fallback }
    }
}
