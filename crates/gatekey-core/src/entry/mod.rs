//! Entry-mode orchestration.
//!
//! [`enter`] runs the remote call sequence for one entry attempt and
//! normalizes the outcome into an [`EntryResult`]. All calls are sequential;
//! a later step is never issued before the prior one succeeded. The only
//! retries are the room-entry loop (3 attempts on the room-busy code) and
//! the bounded PC re-authentication loop.

pub mod mode;
pub mod room;

use crate::client::{RemoteClient, RemoteError, TokenScope};
use crate::error::Error;
use mode::{EntryMode, normalize_password};
use rand::Rng;
use room::resolve_room;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Room-entry attempts before the room-busy code becomes fatal
pub const ROOM_ENTER_MAX_ATTEMPTS: u32 = 3;
/// Delay between room-entry attempts
pub const ROOM_ENTER_BACKOFF: Duration = Duration::from_millis(500);
/// PC re-authentication attempts before giving up
pub const PC_REAUTH_MAX_ATTEMPTS: u32 = 60;
/// Delay before each PC re-authentication attempt
pub const PC_REAUTH_DELAY: Duration = Duration::from_secs(1);

/// Room-busy/full status; retried during room entry
const CODE_ROOM_BUSY: i32 = 501;
/// Purchase statuses treated as success (0, plus two "already owned" aliases)
const PURCHASE_ACCEPTED: [i32; 3] = [0, 502, 44];

/// One entry attempt as requested by the caller
#[derive(Debug, Clone)]
pub struct EntryRequest {
    /// Mode-prefixed selector, or a bare rental-server name
    pub server_selector: String,
    /// Room/world password; placeholder runs are stripped before use
    pub password: String,
    /// Caller's public key, bound into the session token
    pub client_public_key: String,
}

/// Normalized credential bundle for one successful entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    /// Account user id
    pub user_id: String,
    /// Account entity id
    pub entity_id: String,
    /// Display name; falls back to the user id when the account has none
    pub display_name: String,
    /// Game server endpoint as `host:port`
    pub ip_address: String,
    /// Opaque authorization blob the game server requires on connect
    pub chain_info: String,
    /// Account growth level
    pub bot_level: i64,
    /// Engine version from release metadata
    pub engine_version: String,
    /// Patch version from release metadata
    pub patch_version: String,
    /// Whether the session was established through a PC client
    pub is_pc: bool,
}

/// Execute the entry sequence for `request` against `client`.
///
/// Side effect: ensures the client has a cached user-detail record, and
/// sends a generated placeholder nickname (`AE` + nine digits) when the
/// account has no display name yet. The placeholder is not written into the
/// cache, so the result's display name falls back to the user id.
///
/// # Errors
///
/// See [`Error`]; application codes outside an operation's accepted set and
/// all transport failures are fatal for this call.
pub async fn enter(
    client: &dyn RemoteClient,
    request: &EntryRequest,
) -> Result<EntryResult, Error> {
    let entry_mode = EntryMode::parse(&request.server_selector)?;

    ensure_user_detail(client).await?;
    ensure_display_name(client).await?;

    let password = normalize_password(&request.password);
    let public_key = request.client_public_key.as_str();
    debug!(?entry_mode, "dispatching entry");

    match entry_mode {
        EntryMode::Lobby { room } => {
            let (ip_address, chain_info) =
                enter_lobby_room(client, &room, &password, public_key, false).await?;
            Ok(assemble(client, ip_address, chain_info, false))
        }
        EntryMode::PcLobby { room } => {
            let pc_box = reauthenticate_pc(client).await?;
            let pc_client: &dyn RemoteClient = &*pc_box;
            ensure_user_detail(pc_client).await?;
            let (ip_address, chain_info) =
                enter_lobby_room(pc_client, &room, &password, public_key, true).await?;
            Ok(assemble(pc_client, ip_address, chain_info, true))
        }
        EntryMode::Network { code } => {
            let address = client
                .get_server_address(&code)
                .await
                .map_err(|e| Error::transport("get_server_address", e))?
                .accept("get_server_address")?;
            let scope = TokenScope::Network { game_code: code };
            let chain_info = fetch_chain_info(client, scope, public_key).await?;
            Ok(assemble(client, address.to_string(), chain_info, false))
        }
        EntryMode::MainCity => {
            // Stale game/city presence blocks city entry; both leave calls
            // are best-effort.
            let _ = client.leave_game().await;
            let _ = client.leave_main_city().await;

            let city = client
                .enter_main_city()
                .await
                .map_err(|e| Error::transport("enter_main_city", e))?
                .accept("enter_main_city")?;
            let ip_address = format!("{}:{}", city.host, city.port);
            let scope = TokenScope::Lobby {
                room_id: city.city_no.to_string(),
            };
            let chain_info = fetch_chain_info(client, scope, public_key).await?;
            Ok(assemble(client, ip_address, chain_info, false))
        }
        EntryMode::Rental { name } => {
            let hits = client
                .search_rental_server(&name)
                .await
                .map_err(|e| Error::transport("search_rental_server", e))?
                .accept("search_rental_server")?;
            let server_id = hits
                .into_iter()
                .next()
                .map(|hit| hit.entity_id)
                .ok_or(Error::NotFound {
                    what: "rental server",
                })?;

            let world = client
                .enter_rental_world(&server_id, &password)
                .await
                .map_err(|e| Error::transport("enter_rental_world", e))?
                .accept("enter_rental_world")?;
            let scope = TokenScope::Rental { server_id };
            let chain_info = fetch_chain_info(client, scope, public_key).await?;
            Ok(assemble(client, world.to_string(), chain_info, false))
        }
    }
}

/// Resolve, unlock, and enter a lobby room, returning address + chain info.
async fn enter_lobby_room(
    client: &dyn RemoteClient,
    room: &str,
    password: &str,
    public_key: &str,
    pc: bool,
) -> Result<(String, String), Error> {
    let handle = resolve_room(client, room).await?;

    client
        .purchase_item(&handle.resource_id)
        .await
        .map_err(|e| Error::transport("purchase_item", e))?
        .accept_any("purchase_item", &PURCHASE_ACCEPTED)?;

    let mut outcome = client
        .enter_room(&handle.id, password)
        .await
        .map_err(|e| Error::transport("enter_room", e))?;
    for attempt in 1..ROOM_ENTER_MAX_ATTEMPTS {
        if outcome.code != CODE_ROOM_BUSY {
            break;
        }
        // The busy code can mean the unlock has not propagated yet;
        // re-purchase, back off, and try again.
        warn!(attempt, room = %handle.id, "room busy, re-purchasing and retrying");
        let _ = client.purchase_item(&handle.resource_id).await;
        sleep(ROOM_ENTER_BACKOFF).await;
        outcome = client
            .enter_room(&handle.id, password)
            .await
            .map_err(|e| Error::transport("enter_room", e))?;
    }
    outcome.accept("enter_room")?;

    let game = client
        .enter_room_game()
        .await
        .map_err(|e| Error::transport("enter_room_game", e))?
        .accept("enter_room_game")?;

    let scope = if pc {
        TokenScope::PcLobby {
            resource_id: handle.resource_id.clone(),
        }
    } else {
        TokenScope::Lobby {
            room_id: handle.id.clone(),
        }
    };
    let chain_info = fetch_chain_info(client, scope, public_key).await?;

    Ok((game.to_string(), chain_info))
}

/// Generate and submit a session-token request, returning the chain info.
async fn fetch_chain_info(
    client: &dyn RemoteClient,
    scope: TokenScope,
    public_key: &str,
) -> Result<String, Error> {
    let payload = client
        .generate_session_token(scope, public_key)
        .await
        .map_err(|e| Error::transport("generate_session_token", e))?;
    let chain_info = client
        .send_session_token_request(&payload)
        .await
        .map_err(|e| Error::transport("send_session_token_request", e))?;
    Ok(String::from_utf8_lossy(&chain_info).into_owned())
}

/// Authenticate a fresh PC client, retrying only while the backend throttles.
async fn reauthenticate_pc(client: &dyn RemoteClient) -> Result<Box<dyn RemoteClient>, Error> {
    for attempt in 1..=PC_REAUTH_MAX_ATTEMPTS {
        sleep(PC_REAUTH_DELAY).await;
        match client.reauthenticate().await {
            Ok(pc_client) => return Ok(pc_client),
            Err(RemoteError::TooFrequent) => {
                debug!(attempt, "PC re-authentication throttled");
            }
            Err(e) => return Err(Error::transport("reauthenticate", e)),
        }
    }
    Err(Error::ReauthExhausted {
        attempts: PC_REAUTH_MAX_ATTEMPTS,
    })
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

/// Send a placeholder nickname when the account has none.
async fn ensure_display_name(client: &dyn RemoteClient) -> Result<(), Error> {
    let Some(detail) = client.cached_user_detail() else {
        return Ok(());
    };
    if !detail.name.is_empty() {
        return Ok(());
    }
    let name = format!("AE{:09}", rand::thread_rng().gen_range(0..1_000_000_000));
    debug!(%name, "account has no display name, sending placeholder");
    client
        .update_nickname(&name)
        .await
        .map_err(|e| Error::transport("update_nickname", e))?
        .accept("update_nickname")?;
    Ok(())
}

/// Assemble the result from the client's post-call state.
fn assemble(
    client: &dyn RemoteClient,
    ip_address: String,
    chain_info: String,
    is_pc: bool,
) -> EntryResult {
    let detail = client.cached_user_detail().unwrap_or_default();
    let user_id = client.user_id();
    let display_name = if detail.name.is_empty() {
        user_id.clone()
    } else {
        detail.name
    };
    let release = client.release_metadata();

    EntryResult {
        user_id,
        entity_id: detail.entity_id,
        display_name,
        ip_address,
        chain_info,
        bot_level: detail.level,
        engine_version: release.engine_version,
        patch_version: release.patch_version,
        is_pc,
    }
}
