//! Socket and tunnel management.
//!
//! Mirrors the shape of Chromium's `net/socket/`, narrowed to SOCKS tunnels:
//! - [`proxy`]: proxy spec parsing into descriptors and chains
//! - [`socks`]: single-hop and chained SOCKS handshakes
//! - [`tls`]: TLS over the tunnel with BoringSSL
//! - [`connectjob`]: DNS → tunnel → TLS connection flow
//! - [`stream`]: type-erased sockets

pub mod connectjob;
pub mod proxy;
pub mod socks;
pub mod stream;
pub mod tls;
