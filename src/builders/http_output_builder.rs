//! Builder for [`Dispatcher`].
//!
//! Exposes endpoint, method, serialisation, authentication, rate limiting,
//! timeouts, and failure policy. The option names follow the configuration
//! keys read by [`file_config`](crate::file_config).

use std::time::Duration;

use crate::formatter::{FormatterRegistry, RecordFormatter};
use crate::http_output::{
    AuthConfig, Dispatcher, HTTPMethod, HTTPOutputConfig, SerialisationFormat, Transport,
    UreqTransport,
};
use crate::status_codes::StatusCodeSet;

use super::ConfigError;

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`Dispatcher`] instances.
#[derive(Clone, Debug, Default)]
pub struct HTTPOutputBuilder {
    endpoint_url: Option<String>,
    method: Option<HTTPMethod>,
    format: Option<SerialisationFormat>,
    formatter_name: Option<String>,
    formatters: FormatterRegistry,
    auth: Option<AuthConfig>,
    rate_limit_ms: Option<u64>,
    open_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    raise_on_error: Option<bool>,
    raise_on_http_failure: Option<bool>,
    ignore_http_status_code: Option<String>,
    warn_interval: Option<Duration>,
}

impl HTTPOutputBuilder {
    /// Create a new builder with no endpoint configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target URL for HTTP requests (required).
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Configure HTTP Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = Some(AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Make formatters available to [`with_formatter`](Self::with_formatter).
    pub fn with_formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = formatters;
        self
    }

    /// Register a single named formatter.
    pub fn register_formatter<F>(mut self, name: impl Into<String>, formatter: F) -> Self
    where
        F: RecordFormatter + 'static,
    {
        self.formatters.register(name, formatter);
        self
    }

    /// Select a registered formatter by name, overriding the serialiser.
    pub fn with_formatter(mut self, name: impl Into<String>) -> Self {
        self.formatter_name = Some(name.into());
        self
    }

    /// Tolerate the statuses named by `spec` (e.g. `"400..409,300"`).
    pub fn with_ignore_http_status_code(mut self, spec: impl Into<String>) -> Self {
        self.ignore_http_status_code = Some(spec.into());
        self
    }

    option_setter!(
        #[doc = "Set the HTTP method. Defaults to POST."]
        with_method,
        method,
        HTTPMethod
    );
    option_setter!(
        #[doc = "Set the built-in serialiser. Defaults to form encoding."]
        with_format,
        format,
        SerialisationFormat
    );
    option_setter!(
        #[doc = "Set the authentication mode."]
        with_auth,
        auth,
        AuthConfig
    );
    option_setter!(
        #[doc = "Set the minimum interval between attempts in milliseconds; 0 disables it."]
        with_rate_limit_ms,
        rate_limit_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the connection timeout in seconds."]
        with_open_timeout_secs,
        open_timeout_secs,
        u64
    );
    option_setter!(
        #[doc = "Set the response read timeout in seconds."]
        with_read_timeout_secs,
        read_timeout_secs,
        u64
    );
    option_setter!(
        #[doc = "Raise transport failures to the caller. Defaults to true."]
        with_raise_on_error,
        raise_on_error,
        bool
    );
    option_setter!(
        #[doc = "Raise non-2xx responses outside the ignore set. Defaults to false."]
        with_raise_on_http_failure,
        raise_on_http_failure,
        bool
    );
    option_setter!(
        #[doc = "Set the interval between summaries of throttled records."]
        with_warn_interval,
        warn_interval,
        Duration
    );

    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_url()?;
        self.validate_timeouts()?;
        self.validate_auth()?;
        Ok(())
    }

    fn validate_url(&self) -> Result<(), ConfigError> {
        match &self.endpoint_url {
            None => Err(ConfigError::InvalidConfig(
                "HTTP output requires endpoint_url".into(),
            )),
            Some(url) if url.trim().is_empty() => Err(ConfigError::InvalidConfig(
                "endpoint_url must not be empty".into(),
            )),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => Err(
                ConfigError::InvalidConfig(format!("endpoint_url {url:?} must be http or https")),
            ),
            _ => Ok(()),
        }
    }

    fn validate_timeouts(&self) -> Result<(), ConfigError> {
        if let Some(timeout) = self.open_timeout_secs {
            ensure_positive!(timeout, "open_timeout")?;
        }
        if let Some(timeout) = self.read_timeout_secs {
            ensure_positive!(timeout, "read_timeout")?;
        }
        Ok(())
    }

    fn validate_auth(&self) -> Result<(), ConfigError> {
        match &self.auth {
            Some(AuthConfig::Basic { username, .. }) if username.is_empty() => Err(
                ConfigError::InvalidConfig("basic authentication requires a username".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Validate the settings and produce the runtime configuration.
    ///
    /// The ignore list is compiled here, once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a missing endpoint, zero timeouts, an
    /// unknown formatter name, or a malformed ignore list.
    pub fn build_config(&self) -> Result<HTTPOutputConfig, ConfigError> {
        self.validate()?;

        let formatter = match &self.formatter_name {
            Some(name) => Some(
                self.formatters
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownFormatter(name.clone()))?,
            ),
            None => None,
        };
        let ignore_status_codes = match &self.ignore_http_status_code {
            Some(spec) => StatusCodeSet::parse(spec)?,
            None => StatusCodeSet::empty(),
        };

        let defaults = HTTPOutputConfig::default();
        Ok(HTTPOutputConfig {
            endpoint_url: self.endpoint_url.clone().unwrap_or_default(),
            method: self.method.unwrap_or(defaults.method),
            format: self.format.unwrap_or(defaults.format),
            formatter,
            auth: self.auth.clone().unwrap_or(defaults.auth),
            rate_limit: self
                .rate_limit_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            open_timeout: self
                .open_timeout_secs
                .map_or(defaults.open_timeout, Duration::from_secs),
            read_timeout: self
                .read_timeout_secs
                .map_or(defaults.read_timeout, Duration::from_secs),
            raise_on_error: self.raise_on_error.unwrap_or(defaults.raise_on_error),
            raise_on_http_failure: self
                .raise_on_http_failure
                .unwrap_or(defaults.raise_on_http_failure),
            ignore_status_codes,
            warn_interval: self.warn_interval.unwrap_or(defaults.warn_interval),
        })
    }

    /// Build a dispatcher that sends through ureq.
    ///
    /// # Errors
    ///
    /// See [`build_config`](Self::build_config).
    pub fn build(&self) -> Result<Dispatcher<UreqTransport>, ConfigError> {
        Ok(Dispatcher::with_config(self.build_config()?))
    }

    /// Build a dispatcher over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// See [`build_config`](Self::build_config).
    pub fn build_with_transport<T: Transport>(
        &self,
        transport: T,
    ) -> Result<Dispatcher<T>, ConfigError> {
        Ok(Dispatcher::with_transport(self.build_config()?, transport))
    }
}
