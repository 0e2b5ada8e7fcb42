//! SOCKS tunnel establishment over one hop or a chain of hops.
//!
//! The wire protocol itself comes from `tokio-socks`; this module decides
//! which handshake each hop gets and what it is asked to connect to.

use crate::base::neterror::NetError;
use crate::socket::proxy::{ChainHop, ProxyDescriptor, SocksVersion};
use crate::socket::stream::{BoxedSocket, SocketKind, StreamSocket};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_socks::tcp::{Socks4Stream, Socks5Stream};
use tokio_socks::TargetAddr;

/// Build the address a hop is asked to `CONNECT` to. IP literals go out as
/// addresses, anything else as a domain for the proxy to resolve.
pub fn target_addr(host: &str, port: u16) -> TargetAddr<'static> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(ip) => TargetAddr::Ip(SocketAddr::new(ip, port)),
        Err(_) => TargetAddr::Domain(bare.to_string().into(), port),
    }
}

/// Run one SOCKS handshake over `socket`, asking `proxy` to reach `target`.
async fn handshake<S: StreamSocket>(
    socket: S,
    proxy: &ProxyDescriptor,
    target: TargetAddr<'static>,
) -> Result<BoxedSocket, tokio_socks::Error> {
    let credentials = proxy.credentials();
    let stream = match proxy.version {
        SocksVersion::V4 => match credentials.and_then(|c| c.socks4_user_id()) {
            Some(user_id) => BoxedSocket::new(
                Socks4Stream::connect_with_userid_and_socket(socket, target, user_id).await?,
                SocketKind::Tunnel { hops: 1 },
            ),
            None => BoxedSocket::new(
                Socks4Stream::connect_with_socket(socket, target).await?,
                SocketKind::Tunnel { hops: 1 },
            ),
        },
        SocksVersion::V5 => match credentials.and_then(|c| c.socks5_auth()) {
            Some((username, password)) => BoxedSocket::new(
                Socks5Stream::connect_with_password_and_socket(socket, target, username, password)
                    .await?,
                SocketKind::Tunnel { hops: 1 },
            ),
            None => BoxedSocket::new(
                Socks5Stream::connect_with_socket(socket, target).await?,
                SocketKind::Tunnel { hops: 1 },
            ),
        },
    };
    Ok(stream)
}

async fn dial(proxy: &ProxyDescriptor) -> Result<TcpStream, NetError> {
    tracing::trace!(proxy = %proxy, "dialing first hop");
    let stream = TcpStream::connect((proxy.host.as_str(), proxy.port))
        .await
        .map_err(|e| NetError::connection_failed_to(&proxy.host, proxy.port, e))?;
    // Small handshake frames; don't let Nagle hold them back.
    let _ = stream.set_nodelay(true);
    Ok(stream)
}

fn hop_error(hop: usize, proxy: &ProxyDescriptor, source: tokio_socks::Error) -> NetError {
    tracing::debug!(hop, proxy = %proxy, error = %source, "SOCKS handshake failed");
    NetError::SocksConnectionFailed {
        hop,
        proxy: proxy.to_string(),
        source: Arc::new(source),
    }
}

/// Tunnel to `destination` through a single proxy.
pub async fn connect(
    proxy: &ProxyDescriptor,
    destination: TargetAddr<'static>,
) -> Result<BoxedSocket, NetError> {
    let tcp = dial(proxy).await?;
    handshake(tcp, proxy, destination)
        .await
        .map_err(|e| hop_error(0, proxy, e))
}

/// Tunnel to `destination` through every hop in order.
///
/// Hop `i` is asked to connect to hop `i + 1`; the last hop connects to the
/// destination. Each handshake runs inside the previous hop's tunnel.
/// `on_hop` fires after each hop's handshake succeeds.
pub async fn connect_chain<F>(
    hops: &[ChainHop],
    destination: TargetAddr<'static>,
    mut on_hop: F,
) -> Result<BoxedSocket, NetError>
where
    F: FnMut(usize, &ProxyDescriptor),
{
    let first = match hops.first() {
        Some(hop) => &hop.descriptor,
        None => return Err(NetError::EmptyProxySpec),
    };

    let mut socket = BoxedSocket::new(dial(first).await?, SocketKind::Tcp);
    for (index, hop) in hops.iter().enumerate() {
        let proxy = &hop.descriptor;
        let target = match hops.get(index + 1) {
            Some(next) => target_addr(&next.descriptor.host, next.descriptor.port),
            None => destination.clone(),
        };
        socket = handshake(socket, proxy, target)
            .await
            .map_err(|e| hop_error(index, proxy, e))?;
        on_hop(index, proxy);
    }

    Ok(BoxedSocket::new(socket, SocketKind::Tunnel { hops: hops.len() }))
}
