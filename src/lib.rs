//! # socksagent
//!
//! An HTTP(S) connection agent that routes every request through one or more
//! chained SOCKS proxies.
//!
//! `socksagent` parses proxy specifications (`socks4://`, `socks4a://`,
//! `socks5://`, `socks5h://`, `socks://`, structured fields, or lists of
//! these) into an immutable chain, then, once per request, resolves the
//! destination when the chain asks for client-side resolution, walks the
//! SOCKS handshakes hop by hop, and layers TLS on top for secure endpoints.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use socksagent::SocksProxyAgent;
//! use http::Request;
//! use http_body_util::Full;
//!
//! #[tokio::main]
//! async fn main() {
//!     let agent = SocksProxyAgent::new("socks5h://127.0.0.1:9050").unwrap();
//!     let request = Request::get("http://example.com/")
//!         .body(Full::default())
//!         .unwrap();
//!     let response = agent.request(request).await.unwrap();
//!     println!("Status: {}", response.status());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`agent`] - The agent, its builder and configuration
//! - [`base`] - Error definitions and connect states
//! - [`dns`] - Client-side destination resolution
//! - [`socket`] - Proxy parsing, SOCKS tunnels, TLS and sockets

pub mod agent;
pub mod base;
pub mod dns;
pub mod socket;

pub use agent::{AgentBuilder, AgentConfig, SocksProxyAgent};
pub use base::neterror::NetError;
pub use socket::connectjob::{ConnectEvent, ConnectObserver, ConnectRequest};
pub use socket::proxy::{ProxyChain, ProxyDescriptor, ProxyFields, ProxyInput, ProxySpec, SocksVersion};
pub use socket::stream::BoxedSocket;
pub use socket::tls::TlsOptions;
