//! Builders for HTTP outputs.
//!
//! Builders collect optional settings, validate them, and produce a
//! [`Dispatcher`](crate::http_output::Dispatcher). Every configuration-time
//! failure, including a malformed ignore list, is reported as a
//! [`ConfigError`] so construction aborts before any record is handled.

use std::io;

use thiserror::Error;

use crate::status_codes::StatusCodeSpecError;

mod http_output_builder;

pub use http_output_builder::HTTPOutputBuilder;

/// Errors that may occur while configuring an output.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid output configuration: {0}")]
    InvalidConfig(String),
    /// `ignore_http_status_code` could not be compiled.
    #[error("invalid ignore_http_status_code: {0}")]
    InvalidStatusSpec(#[from] StatusCodeSpecError),
    /// `format` names a formatter that was never registered.
    #[error("unknown formatter {0:?}")]
    UnknownFormatter(String),
    /// A configuration file could not be parsed.
    #[error("{path} is invalid: {message}")]
    Parse { path: String, message: String },
    /// Underlying I/O error whilst reading configuration.
    #[error(transparent)]
    Io(#[from] io::Error),
}
