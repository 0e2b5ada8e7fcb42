//! Type-erased sockets for nested tunnels.
//!
//! A chain of N hops produces N nested SOCKS stream types, optionally wrapped
//! in TLS. [`BoxedSocket`] erases that nesting so every hop, and the final
//! socket handed to the caller, has one concrete type.
//!
//! Based on Chromium's `StreamSocket` interface which provides polymorphism
//! for `TcpClientSocket`, `SSLClientSocket`, and nested tunnel sockets.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_boring::SslStream;
use tokio_socks::tcp::{Socks4Stream, Socks5Stream};

/// Any socket that can carry a tunnel or a TLS session.
///
/// Chromium equivalent: `net::StreamSocket`
pub trait StreamSocket: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static {}

impl StreamSocket for TcpStream {}

impl<S: StreamSocket> StreamSocket for SslStream<S> {}

impl<S: StreamSocket> StreamSocket for Socks4Stream<S> {}

impl<S: StreamSocket> StreamSocket for Socks5Stream<S> {}

impl StreamSocket for BoxedSocket {}

/// A connected socket with its concrete layering erased.
pub struct BoxedSocket {
    inner: Pin<Box<dyn StreamSocket>>,
    kind: SocketKind,
}

/// What the outermost layer of a [`BoxedSocket`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    /// Direct TCP connection to the first hop.
    Tcp,
    /// SOCKS tunnel through `hops` proxies.
    Tunnel { hops: usize },
    /// TLS session over a tunnel.
    Tls,
}

impl BoxedSocket {
    pub fn new<S: StreamSocket>(socket: S, kind: SocketKind) -> Self {
        Self {
            inner: Box::pin(socket),
            kind,
        }
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    pub fn is_tls(&self) -> bool {
        self.kind == SocketKind::Tls
    }
}

impl fmt::Debug for BoxedSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSocket").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl AsyncRead for BoxedSocket {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl AsyncWrite for BoxedSocket {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.inner.as_mut().poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_shutdown(cx)
    }
}
