//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): configuration, resolution, tunnel and TLS errors
//! - [`ConnectState`](loadstate::ConnectState): per-request connect states

pub mod loadstate;
pub mod neterror;
