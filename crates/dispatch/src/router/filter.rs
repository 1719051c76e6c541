//! Method filters attached to routes.
//!
//! A route either serves one concrete HTTP method or every method. The
//! wildcard is spelled `"*"` when a filter is parsed from text.

use http::Method;
use http::method::InvalidMethod;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Which request methods a route answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodFilter {
    /// Matches every method.
    Any,
    /// Matches exactly one method.
    Only(Method),
}

impl MethodFilter {
    /// Check if the request method matches this filter.
    #[inline]
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(expected) => expected == method,
        }
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, MethodFilter::Any)
    }
}

macro_rules! method_filter {
    ($method:ident, $method_name:ident) => {
        #[doc = concat!("Creates a filter that matches ", stringify!($method_name), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter::Only(Method::$method_name)
        }
    };
}

method_filter!(get_method, GET);
method_filter!(post_method, POST);
method_filter!(put_method, PUT);
method_filter!(delete_method, DELETE);
method_filter!(head_method, HEAD);
method_filter!(options_method, OPTIONS);
method_filter!(patch_method, PATCH);

/// Creates a filter that matches every method.
#[inline]
pub fn any_method() -> MethodFilter {
    MethodFilter::Any
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(method)
    }
}

impl FromStr for MethodFilter {
    type Err = InvalidMethod;

    /// Parses `"*"` as [`MethodFilter::Any`]; anything else must be a method
    /// token. Standard method names are accepted in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(MethodFilter::Any);
        }
        let upper = s.to_ascii_uppercase();
        let method = match Method::from_bytes(upper.as_bytes())? {
            extension if is_standard(&extension) => extension,
            _ => Method::from_bytes(s.as_bytes())?,
        };
        Ok(MethodFilter::Only(method))
    }
}

/// Upper-cases a standard method that arrived in another case, so `get`
/// matches a `GET` route. Extension methods are compared as sent.
pub(crate) fn canonical(method: &Method) -> Cow<'_, Method> {
    if !method.as_str().bytes().any(|b| b.is_ascii_lowercase()) {
        return Cow::Borrowed(method);
    }
    match Method::from_bytes(method.as_str().to_ascii_uppercase().as_bytes()) {
        Ok(upper) if is_standard(&upper) => Cow::Owned(upper),
        _ => Cow::Borrowed(method),
    }
}

fn is_standard(method: &Method) -> bool {
    const STANDARD: [Method; 9] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::CONNECT,
        Method::PATCH,
        Method::TRACE,
    ];
    STANDARD.contains(method)
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("*"),
            MethodFilter::Only(method) => f.write_str(method.as_str()),
        }
    }
}
