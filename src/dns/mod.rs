//! DNS Resolution Module
//!
//! Client-side resolution of destinations for SOCKS hops that cannot carry a
//! hostname (`socks4:`, `socks5:`). The [`Resolve`] trait is the seam; the
//! agent defaults to [`GaiResolver`] and wraps it in
//! [`DnsResolverWithOverrides`] when hostname overrides are configured.
//!
//! # Example
//!
//! ```rust,ignore
//! use socksagent::dns::{GaiResolver, Name, Resolve};
//!
//! let addrs = GaiResolver::new().resolve(Name::new("example.com")).await?;
//! ```

mod gai;
mod resolve;

pub use gai::GaiResolver;
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
