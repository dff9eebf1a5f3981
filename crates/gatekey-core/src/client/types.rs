//! Response envelope and entity types at the remote-client seam.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-level response envelope.
///
/// Every backend call that reports an application status wraps its payload
/// in one of these; code 0 means success and anything else is interpreted
/// per operation (a few operations accept additional codes).
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    /// Application status code, 0 on success
    pub code: i32,
    /// Remote status message
    pub message: String,
    /// Payload, meaningful when the code is accepted
    pub body: T,
}

impl<T> Envelope<T> {
    /// Successful envelope around `body`.
    pub fn ok(body: T) -> Self {
        Self {
            code: 0,
            message: String::new(),
            body,
        }
    }

    /// Failed envelope with a status code and message.
    pub fn status(code: i32, message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            code,
            message: message.into(),
            body: T::default(),
        }
    }

    /// Unwrap the payload, accepting only code 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] carrying `op`, the remote message, and the
    /// code for any other status.
    pub fn accept(self, op: &'static str) -> Result<T, Error> {
        self.accept_any(op, &[0])
    }

    /// Unwrap the payload, accepting any status in `codes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for a status outside `codes`.
    pub fn accept_any(self, op: &'static str, codes: &[i32]) -> Result<T, Error> {
        if codes.contains(&self.code) {
            Ok(self.body)
        } else {
            Err(Error::Api {
                op,
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// Account detail record cached on the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    /// Account entity id
    pub entity_id: String,
    /// Display name; empty until the account picks one
    pub name: String,
    /// Account growth level
    pub level: i64,
}

/// One hit from a room or rental-server search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHit {
    /// Canonical entity id of the hit
    pub entity_id: String,
}

/// Lobby room detail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomInfo {
    /// Resource behind the room, purchased/unlocked before entry
    pub resource_id: String,
    /// Whether the room requires a password
    pub password_required: bool,
}

/// A `host:port` pair as returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPort {
    /// Host name or address
    pub host: String,
    /// TCP/UDP port
    pub port: u16,
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Main city connection info
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainCityInfo {
    /// Game server host
    pub host: String,
    /// Game server port
    pub port: u16,
    /// City number, used as the session-token scope
    pub city_no: i64,
}

/// One relay-hosted room as returned by the room lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayRoomInfo {
    /// Room unique id (join code)
    pub room_unique_id: String,
    /// Numeric room id as a string
    pub rid: String,
    /// Hosting user's unique id
    pub owner_id: u32,
    /// Id of the relay server the room was created on; 0 when unset
    pub relay_server_id: u32,
    /// Mod item ids attached to the room; may contain blank or "0" filler
    pub item_ids: Vec<String>,
}

/// Download location for a mod item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadInfo {
    /// Resource download URL
    pub resource_url: String,
}

/// Release metadata cached on the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    /// Engine version string
    pub engine_version: String,
    /// Latest patch version string
    pub patch_version: String,
}

/// Scope a session token is generated for.
///
/// The backend issues session tokens ("chain info") bound to the target the
/// client is about to connect to and the client's public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenScope {
    /// Lobby room (or main city, scoped by city number)
    Lobby {
        /// Canonical room id, or the city number as a string
        room_id: String,
    },
    /// Lobby room entered through a PC client, scoped by resource
    PcLobby {
        /// Resource id of the room
        resource_id: String,
    },
    /// Network-hosted game
    Network {
        /// Game code
        game_code: String,
    },
    /// Rental server world
    Rental {
        /// Rental server id
        server_id: String,
    },
}
