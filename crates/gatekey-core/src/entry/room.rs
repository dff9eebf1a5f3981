//! Lobby room resolution.

use crate::client::RemoteClient;
use crate::error::Error;
use tracing::debug;

/// Length of a canonical room id; anything else is a search keyword
pub const CANONICAL_ROOM_ID_LEN: usize = 19;

/// A resolved lobby room, ready for purchase and entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomHandle {
    /// Canonical room id
    pub id: String,
    /// Resource purchased/unlocked before entering
    pub resource_id: String,
    /// Whether the room expects a password
    pub password_required: bool,
}

/// Map a caller-supplied room identifier to a canonical room handle.
///
/// A 19-character identifier is taken as already canonical; anything else
/// runs exactly one keyword search limited to one hit. The canonical id is
/// then dereferenced to pick up the room's resource id.
///
/// Handles are never cached; each entry attempt resolves afresh.
///
/// # Errors
///
/// Returns [`Error::NotFound`] when the search yields nothing, and the
/// usual transport/api errors from the underlying calls.
pub async fn resolve_room(
    client: &dyn RemoteClient,
    identifier: &str,
) -> Result<RoomHandle, Error> {
    let room_id = if identifier.len() == CANONICAL_ROOM_ID_LEN {
        identifier.to_string()
    } else {
        debug!(keyword = identifier, "room identifier not canonical, searching");
        let hits = client
            .search_room_by_keyword(identifier, 1, 0)
            .await
            .map_err(|e| Error::transport("search_room_by_keyword", e))?
            .accept("search_room_by_keyword")?;
        hits.into_iter()
            .next()
            .map(|hit| hit.entity_id)
            .ok_or(Error::NotFound { what: "room" })?
    };

    let info = client
        .get_room(&room_id)
        .await
        .map_err(|e| Error::transport("get_room", e))?
        .accept("get_room")?;

    Ok(RoomHandle {
        id: room_id,
        resource_id: info.resource_id,
        password_required: info.password_required,
    })
}
