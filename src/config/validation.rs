//! Configuration validation.
//!
//! Turns a `RawConfig` into a `ProxyConfig`. Every failure here is fatal at
//! startup; nothing is bound until validation succeeds.

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::{
    BackendConfig, ListenerConfig, ProxyConfig, RawConfig, TunnelConfig, DEFAULT_LISTEN_HOST,
    DEFAULT_WEBSOCKET_SCHEME,
};
use crate::headers::InjectedHeader;

/// Reasons a configuration is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("you must specify the address of the backend server to proxy")]
    MissingBackend,

    #[error("you must specify a local port number on which to listen")]
    MissingPort,

    #[error(
        "--insert-header and --insert-header-val must be specified the same number of times \
         (got {names} names and {values} values)"
    )]
    MismatchedHeaders { names: usize, values: usize },

    #[error("failure parsing the address of the backend server {url:?}: {source}")]
    InvalidBackend {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend address {0:?} has no host")]
    BackendWithoutHost(String),

    #[error("websocket scheme {scheme:?} cannot be applied to backend {backend}")]
    InvalidScheme { scheme: String, backend: String },

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),
}

/// Validate raw settings and build the immutable proxy configuration.
pub fn validate_config(raw: RawConfig) -> Result<ProxyConfig, ConfigError> {
    let backend = raw.backend.filter(|b| !b.is_empty()).ok_or(ConfigError::MissingBackend)?;
    let port = raw.port.filter(|p| *p != 0).ok_or(ConfigError::MissingPort)?;

    if raw.insert_header.len() != raw.insert_header_val.len() {
        return Err(ConfigError::MismatchedHeaders {
            names: raw.insert_header.len(),
            values: raw.insert_header_val.len(),
        });
    }

    let url = Url::parse(&backend).map_err(|source| ConfigError::InvalidBackend {
        url: backend.clone(),
        source,
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::BackendWithoutHost(backend));
    }

    let websocket_scheme = raw
        .websocket_scheme
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_SCHEME.to_string());
    let websocket_url = websocket_url(&url, &websocket_scheme)?;

    let injected_headers = raw
        .insert_header
        .into_iter()
        .zip(raw.insert_header_val)
        .map(|(name, value)| parse_injected(name, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ProxyConfig {
        listener: ListenerConfig {
            host: raw.host.unwrap_or_else(|| DEFAULT_LISTEN_HOST.to_string()),
            port,
        },
        backend: BackendConfig {
            url,
            websocket_scheme,
            websocket_url,
        },
        injected_headers,
        tunnel: TunnelConfig {
            close_together: raw.close_together.unwrap_or(false),
        },
    })
}

/// Replace the scheme of `backend`, keeping host, port, path and query.
pub fn websocket_url(backend: &Url, scheme: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidScheme {
        scheme: scheme.to_string(),
        backend: backend.to_string(),
    };

    let mut url = backend.clone();
    if url.set_scheme(scheme).is_ok() {
        return Ok(url);
    }

    // `set_scheme` refuses to cross between special and non-special schemes.
    let rest = &backend.as_str()[backend.scheme().len()..];
    let url = Url::parse(&format!("{scheme}{rest}")).map_err(|_| invalid())?;
    if url.scheme() != scheme {
        return Err(invalid());
    }
    Ok(url)
}

fn parse_injected(name: String, value: String) -> Result<InjectedHeader, ConfigError> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.clone()))?;
    let header_value =
        HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidHeaderValue(name))?;
    Ok(InjectedHeader::new(header_name, header_value))
}
