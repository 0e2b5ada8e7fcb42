use crate::base::loadstate::ConnectState;
use crate::base::neterror::NetError;
use crate::dns::{Name, Resolve};
use crate::socket::proxy::{ProxyChain, ProxyDescriptor, SocksVersion};
use crate::socket::socks::{self, target_addr};
use crate::socket::stream::BoxedSocket;
use crate::socket::tls::{self, TlsConnectOptions, TlsOptions};
use http::Uri;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio_socks::TargetAddr;

/// One outgoing connection: where to go and whether to speak TLS there.
#[derive(Debug, Clone, Default)]
pub struct ConnectRequest {
    pub host: String,
    pub port: u16,
    pub secure_endpoint: bool,
    /// SNI / certificate name override.
    pub servername: Option<String>,
    /// Request path. Logged with the TLS upgrade; never reaches TLS.
    pub path: Option<String>,
    /// Replaces the agent's default TLS options for this request.
    pub tls: Option<TlsOptions>,
}

impl ConnectRequest {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Derive a request from an absolute URI. `https` and `wss` are secure;
    /// missing ports default to 80 / 443.
    pub fn from_uri(uri: &Uri) -> Result<Self, NetError> {
        let host = uri.host().ok_or(NetError::InvalidUrl)?;
        let secure = matches!(uri.scheme_str(), Some("https") | Some("wss"));
        let port = uri.port_u16().unwrap_or(if secure { 443 } else { 80 });

        let mut request = Self::new(host.trim_start_matches('[').trim_end_matches(']'), port)
            .secure_endpoint(secure);
        request.path = uri.path_and_query().map(|pq| pq.as_str().to_string());
        Ok(request)
    }

    pub fn secure_endpoint(mut self, secure: bool) -> Self {
        self.secure_endpoint = secure;
        self
    }

    pub fn servername(mut self, servername: impl Into<String>) -> Self {
        self.servername = Some(servername.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn tls_options(mut self, options: TlsOptions) -> Self {
        self.tls = Some(options);
        self
    }
}

/// Progress notifications from a connect attempt.
#[derive(Debug)]
pub enum ConnectEvent<'a> {
    StateChanged(ConnectState),
    HostResolved { host: &'a str, addr: IpAddr },
    HopConnected { index: usize, proxy: &'a ProxyDescriptor },
    Failed(&'a NetError),
}

/// Receives [`ConnectEvent`]s. Implemented for any matching closure.
pub trait ConnectObserver: Send + Sync {
    fn on_event(&self, event: &ConnectEvent<'_>);
}

impl<F> ConnectObserver for F
where
    F: Fn(&ConnectEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &ConnectEvent<'_>) {
        self(event)
    }
}

/// Manages one connection attempt: DNS -> SOCKS tunnel -> TLS.
/// Roughly equivalent to net::ConnectJob, with the proxy chain in place of
/// a direct TCP connect.
pub struct ConnectJob {
    chain: Arc<ProxyChain>,
    resolver: Arc<dyn Resolve>,
    default_tls: Arc<TlsOptions>,
    observer: Option<Arc<dyn ConnectObserver>>,
    state: ConnectState,
}

impl ConnectJob {
    pub fn new(
        chain: Arc<ProxyChain>,
        resolver: Arc<dyn Resolve>,
        default_tls: Arc<TlsOptions>,
        observer: Option<Arc<dyn ConnectObserver>>,
    ) -> Self {
        Self {
            chain,
            resolver,
            default_tls,
            observer,
            state: ConnectState::Idle,
        }
    }

    pub fn state(&self) -> ConnectState {
        self.state
    }

    fn emit(&self, event: ConnectEvent<'_>) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    fn transition(&mut self, next: ConnectState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal connect transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(from = ?self.state, to = ?next, "connect state");
        self.state = next;
        self.emit(ConnectEvent::StateChanged(next));
    }

    /// Produce a tunneled, optionally TLS-wrapped socket for `request`.
    pub async fn connect(&mut self, request: &ConnectRequest) -> Result<BoxedSocket, NetError> {
        match self.run(request).await {
            Ok(socket) => {
                self.transition(ConnectState::Ready);
                Ok(socket)
            }
            Err(e) => {
                if !self.state.is_terminal() {
                    self.transition(ConnectState::Failed);
                }
                self.emit(ConnectEvent::Failed(&e));
                Err(e)
            }
        }
    }

    async fn run(&mut self, request: &ConnectRequest) -> Result<BoxedSocket, NetError> {
        if request.host.is_empty() {
            return Err(NetError::NoDestinationHost);
        }

        // IP literals go out as-is whatever the chain asks for.
        let destination = match target_addr(&request.host, request.port) {
            TargetAddr::Domain(..) if self.chain.requires_local_resolution() => {
                self.transition(ConnectState::ResolvingHost);
                let ip = self.resolve_destination(&request.host).await?;
                TargetAddr::Ip(SocketAddr::new(ip, request.port))
            }
            literal => literal,
        };

        self.transition(ConnectState::EstablishingProxyTunnel);
        let chain = Arc::clone(&self.chain);
        let socket = if chain.is_chained() {
            tracing::debug!(
                hops = chain.hop_count(),
                host = %request.host,
                port = request.port,
                "establishing chained SOCKS tunnel"
            );
            socks::connect_chain(chain.hops(), destination, |index, proxy| {
                tracing::debug!(hop = index, proxy = %proxy, "SOCKS hop established");
                self.emit(ConnectEvent::HopConnected { index, proxy });
            })
            .await?
        } else {
            let proxy = &chain.first().descriptor;
            tracing::debug!(
                proxy = %proxy,
                host = %request.host,
                port = request.port,
                "establishing SOCKS tunnel"
            );
            let socket = socks::connect(proxy, destination).await?;
            self.emit(ConnectEvent::HopConnected { index: 0, proxy });
            socket
        };

        if !request.secure_endpoint {
            return Ok(socket);
        }

        self.transition(ConnectState::SslHandshake);
        let options = request.tls.as_ref().unwrap_or(self.default_tls.as_ref());
        let servername = request.servername.as_deref().unwrap_or(&request.host);
        tracing::debug!(
            host = %request.host,
            servername = %servername,
            path = request.path.as_deref().unwrap_or("/"),
            "upgrading tunnel to TLS"
        );
        tls::upgrade(socket, &TlsConnectOptions::new(servername, options)).await
    }

    /// One lookup for the destination. Only the exit hop sends the address
    /// on, and SOCKS4 cannot carry IPv6, so a SOCKS4 exit prefers IPv4.
    async fn resolve_destination(&self, host: &str) -> Result<IpAddr, NetError> {
        let addrs: Vec<SocketAddr> = self.resolver.resolve(Name::new(host)).await?.collect();
        let prefer_v4 = self.chain.last().descriptor.version == SocksVersion::V4;

        let ip = addrs
            .iter()
            .find(|addr| !prefer_v4 || addr.is_ipv4())
            .or_else(|| addrs.first())
            .map(|addr| addr.ip())
            .ok_or_else(|| {
                NetError::dns_failed(
                    host,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "resolver returned no addresses"),
                )
            })?;

        tracing::debug!(host = %host, addr = %ip, "resolved destination on the client");
        self.emit(ConnectEvent::HostResolved { host, addr: ip });
        Ok(ip)
    }
}
