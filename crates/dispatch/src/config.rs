use crate::body::DEFAULT_BODY_LIMIT;

/// Application settings, usually filled in through [`AppBuilder`](crate::AppBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name attached to the tracing span of every request.
    pub name: String,
    /// Logs at DEBUG instead of INFO when logging is enabled.
    pub debug: bool,
    /// Installs a global `tracing` subscriber when the app is built.
    pub enable_logging: bool,
    /// Ceiling for a buffered request body, in bytes.
    pub body_limit: usize,
}

impl Config {
    pub const DEFAULT_NAME: &'static str = "micro-dispatch";
}

impl Default for Config {
    fn default() -> Self {
        Self { name: Self::DEFAULT_NAME.to_owned(), debug: false, enable_logging: false, body_limit: DEFAULT_BODY_LIMIT }
    }
}
