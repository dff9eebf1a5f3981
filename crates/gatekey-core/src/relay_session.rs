//! Peer-relayed ("tan") lobby session flows.
//!
//! Hosting (`create`) picks a relay server at random from the current pool
//! and derives fresh channel key material. Joining resolves the relay server
//! the room was created on instead of picking at random, and additionally
//! carries the room's mod download set. Both flows share one key derivation.

use crate::client::RemoteClient;
use crate::error::Error;
use gatekey_relay::keys::SessionKeyMaterial;
use gatekey_relay::pool::{resolve_server_by_id, select_server};
use gatekey_relay::SESSION_RANDOM_SIZE;
use serde::Serialize;
use tracing::debug;

/// Rendezvous and key material for one relay session
#[derive(Debug, Clone, Serialize)]
pub struct RelaySessionBundle {
    /// Caller's numeric user id
    pub user_unique_id: u32,
    /// Caller's display name; falls back to the user id
    pub display_name: String,
    /// Relay data endpoint as `host:port`
    pub relay_address: String,
    /// Signaling endpoint as `host:port`
    pub signaling_address: String,
    /// Random half of the relay channel keys
    pub relay_random: [u8; SESSION_RANDOM_SIZE],
    /// Relay random encrypted under the transformed token
    pub relay_encrypted_random: [u8; SESSION_RANDOM_SIZE],
    /// Relay channel send key
    pub encrypt_key: Vec<u8>,
    /// Relay channel receive key
    pub decrypt_key: Vec<u8>,
    /// Signaling channel seed
    pub signaling_seed: [u8; SESSION_RANDOM_SIZE],
    /// Signaling channel ticket
    pub signaling_ticket: [u8; SESSION_RANDOM_SIZE],
}

/// [`RelaySessionBundle`] plus the room data a joiner needs
#[derive(Debug, Clone, Serialize)]
pub struct RelayJoinBundle {
    /// Session rendezvous and key material
    #[serde(flatten)]
    pub session: RelaySessionBundle,
    /// Hosting user's numeric id
    pub room_owner_id: u32,
    /// Mod item ids attached to the room
    pub mod_item_ids: Vec<String>,
    /// Download URL per mod item, same order as `mod_item_ids`
    pub mod_download_urls: Vec<String>,
    /// Per-mod encryption keys; currently always absent
    pub mod_encrypt_keys: Vec<Option<Vec<u8>>>,
}

/// Establish relay-session material for hosting a room.
///
/// # Errors
///
/// Returns [`Error::Precondition`] when the client has no user token or a
/// non-numeric user id, [`gatekey_relay::RelayError::NoAvailableServer`]
/// (as [`Error::Relay`]) when the pool has no eligible entry, and the usual
/// transport/api errors.
pub async fn create_relay_session(
    client: &dyn RemoteClient,
) -> Result<RelaySessionBundle, Error> {
    let user_token = client.user_token();
    if user_token.is_empty() {
        return Err(Error::Precondition("missing user token".to_string()));
    }

    ensure_user_detail(client).await?;

    let pool = client
        .get_relay_server_pool()
        .await
        .map_err(|e| Error::transport("get_relay_server_pool", e))?;
    let addresses = select_server(&pool)?;
    debug!(relay = %addresses.relay, "selected relay server");

    let material = SessionKeyMaterial::derive(&user_token, &client.encrypted_user_token())?;

    assemble(client, addresses.relay, addresses.signaling, &material)
}

/// Establish relay-session material for joining an existing room.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when the room lookup yields nothing or the
/// room's recorded relay server cannot be resolved to a complete address
/// pair; otherwise as [`create_relay_session`].
pub async fn join_relay_session(
    client: &dyn RemoteClient,
    room_id: &str,
) -> Result<RelayJoinBundle, Error> {
    let rooms = client
        .find_relay_room(room_id)
        .await
        .map_err(|e| Error::transport("find_relay_room", e))?
        .accept("find_relay_room")?;
    let target = rooms
        .iter()
        .find(|room| room.room_unique_id == room_id || room.rid == room_id)
        .or_else(|| rooms.first())
        .ok_or(Error::NotFound { what: "relay room" })?
        .clone();

    // Join tolerates a missing user detail; the name just falls back.
    if client.cached_user_detail().is_none() {
        if let Ok(envelope) = client.get_user_detail().await {
            if envelope.code == 0 {
                client.cache_user_detail(envelope.body);
            }
        }
    }

    let material =
        SessionKeyMaterial::derive(&client.user_token(), &client.encrypted_user_token())?;

    let mut mod_item_ids = Vec::new();
    let mut mod_download_urls = Vec::new();
    let mut mod_encrypt_keys = Vec::new();
    for raw_id in &target.item_ids {
        let item_id = raw_id.trim();
        if item_id.is_empty() || item_id == "0" {
            continue;
        }
        let info = client
            .get_download_info(item_id)
            .await
            .map_err(|e| Error::transport("get_download_info", e))?
            .accept("get_download_info")?;
        mod_item_ids.push(item_id.to_string());
        mod_download_urls.push(info.resource_url);
        mod_encrypt_keys.push(None);
    }

    let addresses = if target.relay_server_id == 0 {
        None
    } else {
        let pool = client
            .get_relay_server_pool()
            .await
            .map_err(|e| Error::transport("get_relay_server_pool", e))?;
        resolve_server_by_id(&pool, target.relay_server_id)
    };
    let addresses = addresses.ok_or(Error::NotFound {
        what: "relay server for room",
    })?;

    let session = assemble(client, addresses.relay, addresses.signaling, &material)?;
    Ok(RelayJoinBundle {
        session,
        room_owner_id: target.owner_id,
        mod_item_ids,
        mod_download_urls,
        mod_encrypt_keys,
    })
}

fn assemble(
    client: &dyn RemoteClient,
    relay_address: String,
    signaling_address: String,
    material: &SessionKeyMaterial,
) -> Result<RelaySessionBundle, Error> {
    let user_id = client.user_id();
    let user_unique_id = parse_user_unique_id(&user_id)?;
    let display_name = match client.cached_user_detail() {
        Some(detail) if !detail.name.is_empty() => detail.name,
        _ => user_id,
    };

    Ok(RelaySessionBundle {
        user_unique_id,
        display_name,
        relay_address,
        signaling_address,
        relay_random: material.relay_random,
        relay_encrypted_random: material.relay_encrypted_random,
        encrypt_key: material.encrypt_key.clone(),
        decrypt_key: material.decrypt_key.clone(),
        signaling_seed: material.signaling_seed,
        signaling_ticket: material.signaling_ticket,
    })
}

/// Parse the backend's decimal user id, truncating to the wire's u32.
fn parse_user_unique_id(user_id: &str) -> Result<u32, Error> {
    user_id
        .parse::<u64>()
        .map(|id| id as u32)
        .map_err(|_| Error::Precondition(format!("user id {user_id:?} is not numeric")))
}

/// Fetch-and-cache the user detail record when the cache is empty.
async fn ensure_user_detail(client: &dyn RemoteClient) -> Result<(), Error> {
    if client.cached_user_detail().is_some() {
        return Ok(());
    }
    let detail = client
        .get_user_detail()
        .await
        .map_err(|e| Error::transport("get_user_detail", e))?
        .accept("get_user_detail")?;
    client.cache_user_detail(detail);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_unique_id() {
        assert_eq!(parse_user_unique_id("12345").unwrap(), 12345);
        // Backend ids above u32::MAX truncate, matching the wire field width.
        assert_eq!(
            parse_user_unique_id("4294967298").unwrap(),
            2
        );
        assert!(parse_user_unique_id("abc").is_err());
        assert!(parse_user_unique_id("").is_err());
    }
}
