//! # Gatekey Transport
//!
//! Outbound HTTP client provider.
//!
//! Remote backend calls can be routed through a rotating proxy pool: when the
//! pool endpoint is configured in the environment, [`acquire`] fetches one
//! proxy from the pool and returns an HTTP client whose requests route
//! through it. When unconfigured, a direct-connection client is returned.
//!
//! A fresh proxy is drawn per acquisition; callers wanting rotation simply
//! call [`acquire`] again.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod proxy;

pub use error::TransportError;
pub use proxy::{ProxyPoolConfig, acquire, acquire_with};
