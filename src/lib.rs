//! Deliver structured records to an HTTP endpoint, one request per record.
//!
//! The crate compiles an output configuration once (endpoint, method,
//! serialiser, credentials, rate limit, timeouts, failure policy and the
//! status-code ignore list) into a [`Dispatcher`], then hands each
//! [`Record`] to [`Dispatcher::dispatch`].

pub mod builders;
pub mod file_config;
pub mod formatter;
pub mod http_output;
pub mod rate_limited_warner;
pub mod rate_limiter;
pub mod record;
pub mod status_codes;

pub use builders::{ConfigError, HTTPOutputBuilder};
pub use file_config::{load_output_config, parse_output_section};
pub use formatter::{FormatterRegistry, RecordFormatter, SharedFormatter};
pub use http_output::{
    AuthConfig, DispatchError, DispatchOutcome, Dispatcher, HTTPMethod, HTTPOutputConfig,
    OutboundRequest, Payload, SerialisationError, SerialisationFormat, Transport, TransportError,
    TransportErrorKind, UreqTransport,
};
pub use record::{Fields, Record, Value};
pub use status_codes::{StatusCodeSet, StatusCodeSpecError};
