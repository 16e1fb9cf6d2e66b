//! HTTP output: one request per record.
//!
//! This module defines [`Dispatcher`], which serialises a
//! [`Record`](crate::record::Record), applies the configured rate limit,
//! sends the request through a [`Transport`], and classifies the outcome.
//!
//! # Serialization Formats
//!
//! - **Form** (default): `application/x-www-form-urlencoded` key/value pairs.
//!   Only map records can be encoded this way.
//! - **JSON**: `application/json`, for map and array records alike.
//! - **Custom**: a named [`RecordFormatter`](crate::formatter::RecordFormatter)
//!   produces the whole payload.
//!
//! # Failure Semantics
//!
//! - **Throttled**: dropped silently, never an error.
//! - **No response** (refused, DNS, timeout): raised unless `raise_on_error`
//!   is off, in which case it is logged and swallowed.
//! - **2xx**: success.
//! - **Other statuses**: logged only, unless `raise_on_http_failure` is on;
//!   then raised unless the status is in the ignore set.
//!
//! There is no retry loop; retrying is the caller's decision.

mod config;
mod dispatcher;
mod serialise;
mod transport;
mod url_encoding;


pub use config::{
    AuthConfig, DEFAULT_OPEN_TIMEOUT, DEFAULT_READ_TIMEOUT, HTTPMethod, HTTPOutputConfig,
    SerialisationFormat,
};
pub use dispatcher::{DispatchError, DispatchOutcome, Dispatcher};
pub use serialise::{
    FORM_CONTENT_TYPE, JSON_CONTENT_TYPE, Payload, SerialisationError, serialise_form,
    serialise_json,
};
pub use transport::{
    OutboundRequest, Transport, TransportError, TransportErrorKind, UreqTransport,
};
