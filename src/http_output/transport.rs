//! Transport abstraction and the blocking ureq implementation.
//!
//! The dispatcher only decides *what* to send and how to read the outcome.
//! Moving bytes over the network is delegated to a [`Transport`], which lets
//! tests substitute an in-memory double.

use std::{error::Error as _, fmt, io, time::Duration};

use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use super::config::HTTPMethod;

/// A fully built outbound request.
#[derive(Clone, Debug)]
pub struct OutboundRequest<'a> {
    pub method: HTTPMethod,
    pub url: &'a str,
    pub headers: Vec<(&'static str, String)>,
    pub body: &'a [u8],
}

impl OutboundRequest<'_> {
    /// Return the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Broad cause of a failure to obtain a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Host name resolution failed.
    Dns,
    /// The connection was refused or could not be established.
    Connect,
    /// Connecting or waiting for the response exceeded its timeout.
    Timeout,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dns => "dns failure",
            Self::Connect => "connection failure",
            Self::Timeout => "timeout",
            Self::Other => "transport failure",
        })
    }
}

/// No response was obtained for a request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// Sends a request and reports the response status.
///
/// Any status code, 2xx or not, counts as a response. Only failures to
/// obtain a response are errors.
pub trait Transport: Send + Sync {
    /// Send `request` and return the response status code.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    fn send(&self, request: &OutboundRequest<'_>) -> Result<u16, TransportError>;
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Clone, Debug)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build an agent with separate connect and read timeouts.
    ///
    /// Redirects are not followed; a 3xx is returned as its own status.
    pub fn new(open_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(open_timeout)
            .timeout_read(read_timeout)
            .redirects(0)
            .build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &OutboundRequest<'_>) -> Result<u16, TransportError> {
        let mut req = self.agent.request(request.method.as_str(), request.url);
        for (key, value) in &request.headers {
            req = req.set(key, value);
        }
        match req.send_bytes(request.body) {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(transport)) => Err(classify_transport(&transport)),
        }
    }
}

fn classify_transport(err: &ureq::Transport) -> TransportError {
    let kind = if is_timeout(err) {
        TransportErrorKind::Timeout
    } else {
        match err.kind() {
            ureq::ErrorKind::Dns => TransportErrorKind::Dns,
            ureq::ErrorKind::ConnectionFailed => TransportErrorKind::Connect,
            _ => TransportErrorKind::Other,
        }
    };
    TransportError::new(kind, err.to_string())
}

fn is_timeout(err: &ureq::Transport) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
