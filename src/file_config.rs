//! Loading output configuration from INI files.
//!
//! Each output is described by one section whose keys mirror the builder
//! options:
//!
//! ```ini
//! [metrics]
//! endpoint_url = http://127.0.0.1:5126/api/
//! serializer = json
//! raise_on_http_failure = true
//! ignore_http_status_code = 400..499
//! ```
//!
//! Files are decoded with `encoding_rs` (UTF-8 unless told otherwise) and
//! parsed with `rust-ini`.

use std::fs;
use std::io::ErrorKind;

use encoding_rs::Encoding;
use ini::{Ini, Properties};

use crate::builders::{ConfigError, HTTPOutputBuilder};
use crate::http_output::{AuthConfig, HTTPMethod, SerialisationFormat};

const DEFAULT_ENCODING: &str = "utf-8";

/// Read `path` and turn `section` into a builder.
///
/// Use `None` for keys written before any section header.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read,
/// [`ConfigError::Parse`] for undecodable or malformed files, and
/// [`ConfigError::InvalidConfig`] for missing sections, unknown keys, or
/// values of the wrong shape.
pub fn load_output_config(
    path: &str,
    section: Option<&str>,
    encoding: Option<&str>,
) -> Result<HTTPOutputBuilder, ConfigError> {
    let bytes = read_file_bytes(path)?;
    let text = decode_contents(path, &bytes, encoding.unwrap_or(DEFAULT_ENCODING))?;
    parse_output_section(path, &text, section)
}

fn read_file_bytes(path: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigError::Io(std::io::Error::new(
            ErrorKind::NotFound,
            format!("{path} doesn't exist"),
        )),
        _ => ConfigError::Io(err),
    })
}

fn decode_contents(path: &str, bytes: &[u8], label: &str) -> Result<String, ConfigError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes()).ok_or_else(|| {
        ConfigError::InvalidConfig(format!("unknown encoding {label}"))
    })?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigError::Parse {
            path: path.to_owned(),
            message: format!("not valid {}", encoding.name()),
        });
    }
    Ok(decoded.into_owned())
}

/// Parse INI `text` and apply `section` to a fresh builder.
///
/// # Errors
///
/// See [`load_output_config`].
pub fn parse_output_section(
    path: &str,
    text: &str,
    section: Option<&str>,
) -> Result<HTTPOutputBuilder, ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })?;
    let props = ini.section(section).ok_or_else(|| {
        ConfigError::InvalidConfig(format!(
            "{path} has no section {}",
            section.unwrap_or("<general>")
        ))
    })?;
    apply_section(props)
}

#[derive(Default)]
struct Credentials {
    mode: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

fn apply_section(props: &Properties) -> Result<HTTPOutputBuilder, ConfigError> {
    let mut builder = HTTPOutputBuilder::new();
    let mut credentials = Credentials::default();
    for (key, value) in props.iter() {
        builder = match key {
            "endpoint_url" => builder.with_endpoint_url(value),
            "http_method" => builder.with_method(
                HTTPMethod::parse(value).ok_or_else(|| invalid_choice(key, value, "post, put"))?,
            ),
            "serializer" => builder.with_format(
                SerialisationFormat::parse(value)
                    .ok_or_else(|| invalid_choice(key, value, "form, json"))?,
            ),
            "format" => builder.with_formatter(value),
            "authentication" => {
                credentials.mode = Some(value.to_ascii_lowercase());
                builder
            }
            "username" => {
                credentials.username = Some(value.to_owned());
                builder
            }
            "password" => {
                credentials.password = Some(value.to_owned());
                builder
            }
            "raise_on_error" => builder.with_raise_on_error(parse_bool(key, value)?),
            "raise_on_http_failure" => {
                builder.with_raise_on_http_failure(parse_bool(key, value)?)
            }
            "ignore_http_status_code" => builder.with_ignore_http_status_code(value),
            "rate_limit_msec" => builder.with_rate_limit_ms(parse_u64(key, value)?),
            "read_timeout" => builder.with_read_timeout_secs(parse_u64(key, value)?),
            "open_timeout" => builder.with_open_timeout_secs(parse_u64(key, value)?),
            other => {
                return Err(ConfigError::InvalidConfig(format!(
                    "unknown option {other:?}"
                )));
            }
        };
    }
    apply_credentials(builder, credentials)
}

fn apply_credentials(
    builder: HTTPOutputBuilder,
    credentials: Credentials,
) -> Result<HTTPOutputBuilder, ConfigError> {
    match credentials.mode.as_deref() {
        None | Some("none") => Ok(builder.with_auth(AuthConfig::None)),
        Some("basic") => Ok(builder.with_basic_auth(
            credentials.username.unwrap_or_default(),
            credentials.password.unwrap_or_default(),
        )),
        Some(other) => Err(invalid_choice("authentication", other, "none, basic")),
    }
}

fn invalid_choice(key: &str, value: &str, allowed: &str) -> ConfigError {
    ConfigError::InvalidConfig(format!("{key} must be one of {allowed}, got {value:?}"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidConfig(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| {
        ConfigError::InvalidConfig(format!("{key} must be a non-negative integer, got {value:?}"))
    })
}
