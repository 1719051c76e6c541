//! Compiled route templates.
//!
//! A template such as `/users/{id}/posts` is split into segments; a segment of
//! the exact form `{name}` captures one non-empty path segment, every other
//! segment must be equal to the path segment byte for byte.

use crate::PathParams;
use crate::error::RouteError;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(Arc<str>),
}

/// A route template compiled into a sequence of segment matchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    captures: usize,
}

impl PathPattern {
    /// Compiles `template` into a matcher.
    ///
    /// Leading and trailing slashes are ignored, so `/a/{b}/` and `a/{b}` compile
    /// to the same pattern. Fails when a capture is empty (`{}`) or when the same
    /// capture name appears twice.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let trimmed = template.trim_matches('/');
        let mut segments = Vec::new();
        let mut names: Vec<Arc<str>> = Vec::new();

        for raw in trimmed.split('/') {
            let segment = match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some("") => return Err(RouteError::empty_capture(template)),
                Some(name) => {
                    if names.iter().any(|n| n.as_ref() == name) {
                        return Err(RouteError::duplicate_capture(template, name));
                    }
                    let name: Arc<str> = Arc::from(name);
                    names.push(Arc::clone(&name));
                    Segment::Capture(name)
                }
                None => Segment::Literal(raw.to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self { segments, captures: names.len() })
    }

    /// Number of named captures in the pattern.
    #[inline]
    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Matches the whole of `path` against the pattern.
    ///
    /// The path must start with `/` and have exactly as many segments as the
    /// pattern; on success the captured segments are returned by name.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = PathParams::with_capacity(self.captures);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(name) => params.push(Arc::clone(name), part),
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => write!(f, "/{literal}")?,
                Segment::Capture(name) => write!(f, "/{{{name}}}")?,
            }
        }
        Ok(())
    }
}
