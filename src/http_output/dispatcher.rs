//! Per-record dispatch: throttle, serialise, send, classify.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    rate_limited_warner::RateLimitedWarner,
    rate_limiter::{RateLimiter, TimeProvider, system_time_provider},
    record::Record,
};

use super::{
    config::{AuthConfig, HTTPOutputConfig, SerialisationFormat},
    serialise::{Payload, SerialisationError, serialise_form, serialise_json},
    transport::{OutboundRequest, Transport, TransportError, UreqTransport},
};

/// Result of delivering one record that did not raise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A response was obtained and was not treated as a failure.
    Sent { status: u16 },
    /// The rate limiter suppressed the attempt; nothing was sent.
    Throttled,
    /// No response was obtained and `raise_on_error` is off.
    TransportFailure { reason: TransportError },
}

impl DispatchOutcome {
    /// Return `true` when a response with a 2xx status was obtained.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Sent { status } if (200..300).contains(status))
    }
}

/// Fatal per-record failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The record could not be encoded.
    #[error(transparent)]
    Serialisation(#[from] SerialisationError),
    /// No response was obtained.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    /// The response status is a failure under the configured policy.
    #[error("HTTP {status} from {url}")]
    HttpFailure { status: u16, url: String },
}

impl DispatchError {
    /// Status code carried by an HTTP failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpFailure { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Classification of a response status under the failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponseClass {
    /// 2xx.
    Success,
    /// Non-2xx while `raise_on_http_failure` is off.
    Unchecked,
    /// Non-2xx listed in the ignore set.
    Tolerated,
    /// Non-2xx that must be raised.
    Failure,
}

/// Classify `status` according to `config`.
///
/// * **2xx** → [`ResponseClass::Success`]
/// * any status while `raise_on_http_failure` is off → [`ResponseClass::Unchecked`]
/// * statuses in the ignore set → [`ResponseClass::Tolerated`]
/// * **Other** → [`ResponseClass::Failure`]
pub(crate) fn classify_status(status: u16, config: &HTTPOutputConfig) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        _ if !config.raise_on_http_failure => ResponseClass::Unchecked,
        s if config.ignore_status_codes.contains(s) => ResponseClass::Tolerated,
        _ => ResponseClass::Failure,
    }
}

/// Delivers records to one configured endpoint.
///
/// Each dispatcher owns its rate-limiter state, so independently configured
/// outputs never throttle each other. `dispatch` takes `&self` and the type
/// is `Sync`, so one instance may be shared between worker threads.
pub struct Dispatcher<T: Transport = UreqTransport> {
    config: HTTPOutputConfig,
    transport: T,
    limiter: RateLimiter,
    warner: RateLimitedWarner,
}

impl Dispatcher<UreqTransport> {
    /// Construct a dispatcher sending through a ureq agent.
    pub fn with_config(config: HTTPOutputConfig) -> Self {
        let transport = UreqTransport::new(config.open_timeout, config.read_timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Construct a dispatcher over an arbitrary transport.
    pub fn with_transport(config: HTTPOutputConfig, transport: T) -> Self {
        Self::with_transport_and_clock(config, transport, Arc::new(system_time_provider))
    }

    /// Construct a dispatcher with an explicit millisecond clock for the
    /// rate limiter.
    pub fn with_transport_and_clock(
        config: HTTPOutputConfig,
        transport: T,
        clock: TimeProvider,
    ) -> Self {
        let limiter = RateLimiter::new(config.rate_limit, clock);
        let warner = RateLimitedWarner::new(config.warn_interval);
        Self {
            config,
            transport,
            limiter,
            warner,
        }
    }

    pub fn config(&self) -> &HTTPOutputConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Deliver one record.
    ///
    /// # Errors
    ///
    /// * [`DispatchError::Serialisation`] - the record cannot be encoded
    /// * [`DispatchError::Transport`] - no response and `raise_on_error` is set
    /// * [`DispatchError::HttpFailure`] - a non-2xx status outside the ignore
    ///   set while `raise_on_http_failure` is set
    pub fn dispatch(&self, record: &Record) -> Result<DispatchOutcome, DispatchError> {
        if !self.limiter.try_acquire() {
            self.note_throttled();
            return Ok(DispatchOutcome::Throttled);
        }

        let payload = self.serialise(record)?;
        let request = self.build_request(&payload);
        match self.transport.send(&request) {
            Ok(status) => self.handle_status(status),
            Err(err) => self.handle_transport_error(err),
        }
    }

    /// Deliver records in order, stopping at the first fatal error.
    ///
    /// # Errors
    ///
    /// Returns the first [`DispatchError`] raised; later records are not sent.
    pub fn dispatch_all<'a, I>(&self, records: I) -> Result<Vec<DispatchOutcome>, DispatchError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records
            .into_iter()
            .map(|record| self.dispatch(record))
            .collect()
    }

    /// Report throttled records that have not been summarised yet.
    pub fn flush_warnings(&self) {
        self.warner.flush(|count| {
            info!(
                "HTTP output {} dropped {count} records inside the rate limit interval",
                self.config.endpoint_url
            );
        });
    }

    fn serialise(&self, record: &Record) -> Result<Payload, SerialisationError> {
        if let Some(formatter) = &self.config.formatter {
            return formatter.format(record);
        }
        match self.config.format {
            SerialisationFormat::Form => serialise_form(record),
            SerialisationFormat::Json => serialise_json(record),
        }
    }

    fn build_request<'a>(&'a self, payload: &'a Payload) -> OutboundRequest<'a> {
        let mut headers = vec![("Content-Type", payload.content_type.to_string())];
        if let Some(auth) = authorization_header(&self.config.auth) {
            headers.push(("Authorization", auth));
        }
        OutboundRequest {
            method: self.config.method,
            url: &self.config.endpoint_url,
            headers,
            body: &payload.body,
        }
    }

    fn handle_status(&self, status: u16) -> Result<DispatchOutcome, DispatchError> {
        let url = &self.config.endpoint_url;
        match classify_status(status, &self.config) {
            ResponseClass::Success => Ok(DispatchOutcome::Sent { status }),
            ResponseClass::Unchecked => {
                warn!("HTTP output {url} responded with status {status}");
                Ok(DispatchOutcome::Sent { status })
            }
            ResponseClass::Tolerated => {
                debug!("HTTP output {url} ignored status {status}");
                Ok(DispatchOutcome::Sent { status })
            }
            ResponseClass::Failure => Err(DispatchError::HttpFailure {
                status,
                url: url.clone(),
            }),
        }
    }

    fn handle_transport_error(
        &self,
        err: TransportError,
    ) -> Result<DispatchOutcome, DispatchError> {
        let url = &self.config.endpoint_url;
        if self.config.raise_on_error {
            return Err(DispatchError::Transport {
                url: url.clone(),
                source: err,
            });
        }
        warn!("HTTP output {url} request failed: {err}");
        Ok(DispatchOutcome::TransportFailure { reason: err })
    }

    fn note_throttled(&self) {
        debug!(
            "HTTP output {} throttled a record",
            self.config.endpoint_url
        );
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            info!(
                "HTTP output {} dropped {count} records inside the rate limit interval",
                self.config.endpoint_url
            );
        });
    }
}

impl<T: Transport> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint_url", &self.config.endpoint_url)
            .field("method", &self.config.method)
            .field("limiter", &self.limiter)
            .finish()
    }
}

/// Build the `Authorization` header value for `auth`, if any.
pub(crate) fn authorization_header(auth: &AuthConfig) -> Option<String> {
    match auth {
        AuthConfig::None => None,
        AuthConfig::Basic { username, password } => {
            let credentials = format!("{username}:{password}");
            Some(format!("Basic {}", BASE64_STANDARD.encode(credentials)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_codes::StatusCodeSet;
    use rstest::rstest;

    fn policy(raise_on_http_failure: bool, ignore: &str) -> HTTPOutputConfig {
        HTTPOutputConfig {
            raise_on_http_failure,
            ignore_status_codes: StatusCodeSet::parse(ignore).expect("valid spec"),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(200, ResponseClass::Success)]
    #[case(201, ResponseClass::Success)]
    #[case(204, ResponseClass::Success)]
    #[case(404, ResponseClass::Unchecked)]
    #[case(500, ResponseClass::Unchecked)]
    fn default_policy_never_fails(#[case] status: u16, #[case] expected: ResponseClass) {
        assert_eq!(classify_status(status, &policy(false, "409")), expected);
    }

    #[rstest]
    #[case("", 409, ResponseClass::Failure)]
    #[case("", 500, ResponseClass::Failure)]
    #[case("409", 409, ResponseClass::Tolerated)]
    #[case("409", 404, ResponseClass::Failure)]
    #[case("400..499", 404, ResponseClass::Tolerated)]
    #[case("400..499", 500, ResponseClass::Failure)]
    #[case("400..599", 500, ResponseClass::Tolerated)]
    #[case("400..599", 201, ResponseClass::Success)]
    fn raising_policy_consults_ignore_set(
        #[case] ignore: &str,
        #[case] status: u16,
        #[case] expected: ResponseClass,
    ) {
        assert_eq!(classify_status(status, &policy(true, ignore)), expected);
    }

    #[rstest]
    fn basic_auth_header_encodes_credentials() {
        let auth = AuthConfig::Basic {
            username: "alice".into(),
            password: "secret!".into(),
        };
        assert_eq!(
            authorization_header(&auth).as_deref(),
            Some("Basic YWxpY2U6c2VjcmV0IQ==")
        );
        assert_eq!(authorization_header(&AuthConfig::None), None);
    }

    #[rstest]
    fn outcome_success_requires_2xx() {
        assert!(DispatchOutcome::Sent { status: 201 }.is_success());
        assert!(!DispatchOutcome::Sent { status: 409 }.is_success());
        assert!(!DispatchOutcome::Throttled.is_success());
    }
}
