//! Configuration structures consumed by the dispatcher.
//!
//! [`HTTPOutputBuilder`](crate::builders::HTTPOutputBuilder) validates and
//! constructs these values before handing them to
//! [`Dispatcher`](super::Dispatcher) for runtime use.

use std::time::Duration;

use crate::formatter::SharedFormatter;
use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;
use crate::status_codes::StatusCodeSet;

/// Default timeout for establishing connections.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(60);
/// Default timeout for waiting on response data once the request is sent.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP methods supported by the dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HTTPMethod {
    #[default]
    POST,
    PUT,
}

impl HTTPMethod {
    /// Convert to the string representation used by ureq.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::POST => "POST",
            Self::PUT => "PUT",
        }
    }

    /// Parse a configuration value (`post` or `put`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "post" => Some(Self::POST),
            "put" => Some(Self::PUT),
            _ => None,
        }
    }
}

/// Authentication configuration for HTTP requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// No authentication.
    #[default]
    None,
    /// HTTP Basic authentication with username and password.
    Basic { username: String, password: String },
}

/// Built-in serialisation formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerialisationFormat {
    /// URL-encoded form data.
    #[default]
    Form,
    Json,
}

impl SerialisationFormat {
    /// Parse a configuration value (`form` or `json`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "form" => Some(Self::Form),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration object describing how to construct a
/// [`Dispatcher`](super::Dispatcher).
#[derive(Clone, Debug)]
pub struct HTTPOutputConfig {
    /// Target URL for HTTP requests.
    pub endpoint_url: String,
    pub method: HTTPMethod,
    pub format: SerialisationFormat,
    /// Custom formatter overriding `format` when present.
    pub formatter: Option<SharedFormatter>,
    pub auth: AuthConfig,
    /// Minimum interval between send attempts; `None` disables throttling.
    pub rate_limit: Option<Duration>,
    /// Timeout for establishing connections.
    pub open_timeout: Duration,
    /// Timeout for reading the response after the request is sent.
    pub read_timeout: Duration,
    /// Surface transport failures to the caller.
    pub raise_on_error: bool,
    /// Treat non-2xx responses outside `ignore_status_codes` as failures.
    pub raise_on_http_failure: bool,
    /// Statuses tolerated when `raise_on_http_failure` is set.
    pub ignore_status_codes: StatusCodeSet,
    /// Interval between summaries of throttled records.
    pub warn_interval: Duration,
}

impl Default for HTTPOutputConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            method: HTTPMethod::default(),
            format: SerialisationFormat::default(),
            formatter: None,
            auth: AuthConfig::default(),
            rate_limit: None,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            raise_on_error: true,
            raise_on_http_failure: false,
            ignore_status_codes: StatusCodeSet::empty(),
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}
