//! TLS over an established tunnel.
//!
//! The handshake reuses the tunneled socket as its transport; no new TCP
//! connection is opened.

use crate::base::neterror::NetError;
use crate::socket::stream::{BoxedSocket, SocketKind};
use boring::ssl::{SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode};
use boring::x509::X509;

pub mod options;

pub use self::options::{TlsOptions, TlsOptionsBuilder, TlsVersion};

fn ssl_error(e: impl std::fmt::Display) -> NetError {
    NetError::SslProtocolError(e.to_string())
}

/// Everything one handshake needs, copied field by field from the caller's
/// [`TlsOptions`]. Destination host, port and path are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConnectOptions {
    pub servername: String,
    pub reject_unauthorized: bool,
    pub alpn_protocols: Vec<String>,
    pub min_tls_version: Option<TlsVersion>,
    pub max_tls_version: Option<TlsVersion>,
    pub cipher_list: Option<String>,
    pub curves_list: Option<String>,
    pub ca_certificates: Vec<Vec<u8>>,
}

impl TlsConnectOptions {
    pub fn new(servername: impl Into<String>, options: &TlsOptions) -> Self {
        Self {
            servername: servername.into(),
            reject_unauthorized: options.reject_unauthorized,
            alpn_protocols: options.alpn_protocols.clone(),
            min_tls_version: options.min_tls_version,
            max_tls_version: options.max_tls_version,
            cipher_list: options.cipher_list.clone(),
            curves_list: options.curves_list.clone(),
            ca_certificates: options.ca_certificates.clone(),
        }
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_tls_version {
            builder
                .set_min_proto_version(Some(min.as_ssl_version()))
                .map_err(ssl_error)?;
        }
        if let Some(max) = self.max_tls_version {
            builder
                .set_max_proto_version(Some(max.as_ssl_version()))
                .map_err(ssl_error)?;
        }

        if let Some(ciphers) = &self.cipher_list {
            builder.set_cipher_list(ciphers).map_err(ssl_error)?;
        }
        if let Some(curves) = &self.curves_list {
            builder.set_curves_list(curves).map_err(ssl_error)?;
        }

        if !self.alpn_protocols.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protocols {
                if proto.is_empty() || proto.len() > 255 {
                    return Err(NetError::SslProtocolError(format!(
                        "invalid ALPN protocol {:?}",
                        proto
                    )));
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder.set_alpn_protos(&alpn_wire).map_err(ssl_error)?;
        }

        for pem in &self.ca_certificates {
            let cert = X509::from_pem(pem).map_err(ssl_error)?;
            builder.cert_store_mut().add_cert(cert).map_err(ssl_error)?;
        }

        if self.reject_unauthorized {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }

    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(&self) -> bool {
        self.servername
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .is_err()
    }
}

/// Run a TLS client handshake over `socket`.
pub async fn upgrade(
    socket: BoxedSocket,
    options: &TlsConnectOptions,
) -> Result<BoxedSocket, NetError> {
    let mut builder = SslConnector::builder(SslMethod::tls()).map_err(ssl_error)?;
    options.apply_to_builder(&mut builder)?;
    let connector = builder.build();

    let mut config = connector.configure().map_err(ssl_error)?;
    config.set_use_server_name_indication(options.should_set_sni());
    if !options.reject_unauthorized {
        config.set_verify_hostname(false);
    }

    tracing::debug!(
        servername = %options.servername,
        verify = options.reject_unauthorized,
        "starting TLS handshake over tunnel"
    );
    let stream = tokio_boring::connect(config, &options.servername, socket)
        .await
        .map_err(|e| {
            tracing::debug!(servername = %options.servername, error = %e, "TLS handshake failed");
            NetError::SslHandshakeFailed {
                host: options.servername.clone(),
                reason: e.to_string(),
            }
        })?;

    Ok(BoxedSocket::new(stream, SocketKind::Tls))
}
