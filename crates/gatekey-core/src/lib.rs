//! # Gatekey Core
//!
//! Entry-mode orchestration and relay session flows for a multiplayer
//! service.
//!
//! The two jobs of this crate:
//!
//! - [`entry::enter`] takes a server selector and runs the matching remote
//!   call sequence (search, purchase/unlock, enter, session-token
//!   generation), normalizing the outcome into one [`entry::EntryResult`]
//!   credential bundle.
//! - [`relay_session`] establishes peer-relayed ("tan") lobby sessions:
//!   hosting picks a relay server at random and derives fresh channel keys,
//!   joining resolves the host's recorded relay server and derives its own.
//!
//! All remote calls go through the [`client::RemoteClient`] trait; the
//! backend client owns its authentication state and this crate only reads
//! it (populating the cached user-detail record at most once per client).
//!
//! ```text
//! caller ──> entry::enter ──> RemoteClient ──> account/game backend
//!                └─> EntryResult {address, chain info, identity}
//!
//! caller ──> relay_session::create / join
//!                ├─> gatekey_relay::pool   (server + port selection)
//!                └─> gatekey_relay::keys   (channel key material)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod entry;
pub mod error;
pub mod relay_session;
pub mod session;

pub use client::{RemoteClient, RemoteError};
pub use entry::mode::EntryMode;
pub use entry::{EntryRequest, EntryResult, enter};
pub use error::Error;
pub use relay_session::{
    RelayJoinBundle, RelaySessionBundle, create_relay_session, join_relay_session,
};
pub use session::{SessionRecord, SessionStore};
