use boring::ssl::SslVersion;

/// TLS protocol versions accepted in [`TlsOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

impl TlsVersion {
    pub(crate) fn as_ssl_version(self) -> SslVersion {
        match self {
            TlsVersion::Tls1_0 => SslVersion::TLS1,
            TlsVersion::Tls1_1 => SslVersion::TLS1_1,
            TlsVersion::Tls1_2 => SslVersion::TLS1_2,
            TlsVersion::Tls1_3 => SslVersion::TLS1_3,
        }
    }
}

/// TLS options applied when a secure endpoint is reached through the tunnel.
///
/// Host, port and path never live here: they describe the destination, not
/// the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    /// Verify the certificate chain and hostname.
    pub reject_unauthorized: bool,

    /// ALPN protocols, in preference order.
    pub alpn_protocols: Vec<String>,

    /// Minimum TLS version.
    pub min_tls_version: Option<TlsVersion>,

    /// Maximum TLS version.
    pub max_tls_version: Option<TlsVersion>,

    /// Cipher suite configuration string.
    pub cipher_list: Option<String>,

    /// Supported curves list.
    pub curves_list: Option<String>,

    /// Extra trusted roots, PEM encoded.
    pub ca_certificates: Vec<Vec<u8>>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            reject_unauthorized: true,
            alpn_protocols: vec!["http/1.1".to_string()],
            min_tls_version: Some(TlsVersion::Tls1_2),
            max_tls_version: Some(TlsVersion::Tls1_3),
            cipher_list: None,
            curves_list: None,
            ca_certificates: Vec::new(),
        }
    }
}

impl TlsOptions {
    pub fn builder() -> TlsOptionsBuilder {
        TlsOptionsBuilder::new()
    }
}

/// Builder for `TlsOptions`.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct TlsOptionsBuilder {
    config: TlsOptions,
}

impl TlsOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_unauthorized(mut self, reject: bool) -> Self {
        self.config.reject_unauthorized = reject;
        self
    }

    pub fn alpn_protocols(mut self, alpn: &[&str]) -> Self {
        self.config.alpn_protocols = alpn.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn min_tls_version(mut self, version: TlsVersion) -> Self {
        self.config.min_tls_version = Some(version);
        self
    }

    pub fn max_tls_version(mut self, version: TlsVersion) -> Self {
        self.config.max_tls_version = Some(version);
        self
    }

    pub fn cipher_list(mut self, ciphers: &str) -> Self {
        self.config.cipher_list = Some(ciphers.to_string());
        self
    }

    pub fn curves_list(mut self, curves: &str) -> Self {
        self.config.curves_list = Some(curves.to_string());
        self
    }

    /// Trust an additional root certificate (PEM).
    pub fn add_ca_certificate(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.config.ca_certificates.push(pem.into());
        self
    }

    pub fn build(self) -> TlsOptions {
        self.config
    }
}
