use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Configuration Errors
    #[error("No proxy specified")]
    EmptyProxySpec,
    #[error("Proxy has no host")]
    NoProxyHost,
    #[error("Invalid SOCKS protocol {0:?}")]
    InvalidProxyProtocol(String),
    #[error("Invalid SOCKS type {0} (expected 4 or 5)")]
    InvalidProxyType(i64),
    #[error("Invalid proxy port {0:?}")]
    InvalidProxyPort(String),
    #[error("Invalid proxy URL {input:?}: {source}")]
    InvalidProxyUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid proxy specification: {0}")]
    InvalidProxySpec(String),

    // Resolution Errors
    #[error("Name not resolved: {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },

    // Tunnel Errors
    #[error("No host defined")]
    NoDestinationHost,
    #[error("Proxy connection to {host}:{port} failed: {source}")]
    ProxyConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("SOCKS connection failed at hop {hop} ({proxy}): {source}")]
    SocksConnectionFailed {
        hop: usize,
        proxy: String,
        #[source]
        source: Arc<tokio_socks::Error>,
    },

    // TLS Errors
    #[error("SSL protocol error: {0}")]
    SslProtocolError(String),
    #[error("SSL handshake with {host} failed: {reason}")]
    SslHandshakeFailed { host: String, reason: String },

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("HTTP error: {0}")]
    Http(String),
}

impl NetError {
    /// Numeric code in the style of Chromium's `net_error_list.h`.
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError(_) => -107,
            NetError::SocksConnectionFailed { .. } => -120,
            NetError::ProxyConnectionFailed { .. } => -130,
            NetError::EmptyProxySpec
            | NetError::NoProxyHost
            | NetError::InvalidProxyProtocol(_)
            | NetError::InvalidProxyType(_)
            | NetError::InvalidProxyPort(_)
            | NetError::InvalidProxyUrl { .. }
            | NetError::InvalidProxySpec(_) => -131,
            NetError::SslHandshakeFailed { .. } => -148,
            NetError::InvalidUrl => -300,
            NetError::Http(_) => -370,
            NetError::NoDestinationHost => -108,
        }
    }

    /// Returns true for errors raised while building an agent from proxy input.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            NetError::EmptyProxySpec
                | NetError::NoProxyHost
                | NetError::InvalidProxyProtocol(_)
                | NetError::InvalidProxyType(_)
                | NetError::InvalidProxyPort(_)
                | NetError::InvalidProxyUrl { .. }
                | NetError::InvalidProxySpec(_)
        )
    }

    pub fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        NetError::ProxyConnectionFailed {
            host: host.to_string(),
            port,
            source: Arc::new(source),
        }
    }

    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }
}
