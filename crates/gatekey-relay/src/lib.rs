//! # Gatekey Relay
//!
//! Relay/signaling server selection and per-session key derivation for
//! peer-relayed ("tan") lobby sessions.
//!
//! This crate provides:
//! - The relay server pool model with its eligibility filter
//! - Load-spreading random selection over servers and data ports
//! - Join-flow address resolution by recorded server id
//! - AES-128-ECB derivation of the relay and signaling channel key material
//!
//! ## Channel layout
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      Relay server                          │
//! │   data port  <- relay channel  (encrypt/decrypt key pair)  │
//! │   signal port <- signaling channel (seed + ticket)         │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both channels key off the caller's user token: the relay channel through
//! the backend's one-way token transform, the signaling channel through the
//! raw token bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keys;
pub mod pool;

pub use error::RelayError;
pub use keys::SessionKeyMaterial;
pub use pool::{RelayAddresses, RelayServerEntry, resolve_server_by_id, select_server};

/// Size of each random block drawn during key derivation
pub const SESSION_RANDOM_SIZE: usize = 16;

/// AES block size used by the ECB construction
pub const AES_BLOCK_SIZE: usize = 16;
