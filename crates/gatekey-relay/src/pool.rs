//! Relay server pool and selection.
//!
//! The backend publishes a pool of relay/signaling servers. Hosting a session
//! picks one eligible entry and one of its data ports uniformly at random so
//! client load spreads across the pool and across ports on an entry. Joining
//! an existing session resolves addresses by the server id the room recorded
//! when it was created.

use crate::error::RelayError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One relay/signaling server as published by the backend.
///
/// Field names follow the backend's JSON: the relay data ports arrive as
/// `ports` and the signaling port as `SignalWebPort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayServerEntry {
    /// Server id referenced by rooms hosted on this entry
    #[serde(default)]
    pub id: u32,
    /// Health/status flag as reported by the backend
    #[serde(default)]
    pub status: i32,
    /// Server host
    #[serde(rename = "ip", default)]
    pub host: String,
    /// Signaling (websocket) port
    #[serde(rename = "SignalWebPort", default)]
    pub signal_port: u16,
    /// Relay data ports
    #[serde(rename = "ports", default)]
    pub data_ports: Vec<u16>,
}

impl RelayServerEntry {
    /// Whether this entry qualifies for selection.
    ///
    /// An entry needs a host, a signaling port, and at least one data port.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        !self.host.is_empty() && self.signal_port != 0 && !self.data_ports.is_empty()
    }
}

/// Resolved relay and signaling endpoints, both as `host:port` strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayAddresses {
    /// Relay data endpoint
    pub relay: String,
    /// Signaling endpoint
    pub signaling: String,
}

/// Select a relay server and data port uniformly at random.
///
/// Selection runs over the eligible subset of `pool` only. The choice is
/// deliberately not deterministic; use [`select_server_with`] and a seeded
/// generator when reproducibility matters.
///
/// # Errors
///
/// Returns [`RelayError::NoAvailableServer`] when no entry passes the
/// eligibility filter.
pub fn select_server(pool: &[RelayServerEntry]) -> Result<RelayAddresses, RelayError> {
    select_server_with(pool, &mut rand::thread_rng())
}

/// [`select_server`] with a caller-supplied random source.
///
/// Each orchestration can hand in its own generator instance, which keeps
/// concurrent selections independent and lets tests inject seeds.
///
/// # Errors
///
/// Returns [`RelayError::NoAvailableServer`] when no entry passes the
/// eligibility filter.
pub fn select_server_with<R: Rng>(
    pool: &[RelayServerEntry],
    rng: &mut R,
) -> Result<RelayAddresses, RelayError> {
    let eligible: Vec<&RelayServerEntry> = pool.iter().filter(|e| e.is_eligible()).collect();
    if eligible.is_empty() {
        return Err(RelayError::NoAvailableServer);
    }

    let entry = eligible[rng.gen_range(0..eligible.len())];
    let port = entry.data_ports[rng.gen_range(0..entry.data_ports.len())];

    Ok(RelayAddresses {
        relay: format!("{}:{}", entry.host, port),
        signaling: format!("{}:{}", entry.host, entry.signal_port),
    })
}

/// Resolve relay and signaling addresses by recorded server id.
///
/// Used by the join flow: rooms record the id of the relay server they were
/// hosted on, so joining clients connect to the same entry instead of picking
/// at random. The relay address uses the entry's first data port.
///
/// Returns `None` when the id is unknown or the entry is missing either a
/// data port or a signaling port.
#[must_use]
pub fn resolve_server_by_id(pool: &[RelayServerEntry], id: u32) -> Option<RelayAddresses> {
    let entry = pool.iter().find(|e| e.id == id)?;
    let port = entry.data_ports.first()?;
    if entry.signal_port == 0 {
        return None;
    }
    Some(RelayAddresses {
        relay: format!("{}:{}", entry.host, port),
        signaling: format!("{}:{}", entry.host, entry.signal_port),
    })
}
