//! System DNS resolver using getaddrinfo.
//!
//! Resolution runs on tokio's blocking pool so a slow lookup never stalls a
//! runtime worker.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use std::{
    io,
    net::{IpAddr, SocketAddr, ToSocketAddrs},
};

/// System DNS resolver using `getaddrinfo` in a thread pool.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let domain = name.as_str().to_string();

            // IP literals never reach the system resolver.
            if let Ok(ip) = domain.parse::<IpAddr>() {
                return Ok(Box::new(std::iter::once(SocketAddr::new(ip, 0))) as Addrs);
            }

            let host = domain.clone();
            let addrs = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>())
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "DNS resolution task failed");
                NetError::dns_failed(&domain, io::Error::new(io::ErrorKind::Other, e))
            })?
            .map_err(|e| NetError::dns_failed(&domain, e))?;

            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    &domain,
                    io::Error::new(io::ErrorKind::NotFound, "No addresses returned by getaddrinfo"),
                ));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "DNS resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
