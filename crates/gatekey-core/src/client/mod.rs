//! Remote client contract.
//!
//! The account/game backend is reached through an opaque client that owns
//! its own authentication state (token, user id, cached user detail, cached
//! release metadata). The orchestration core only reads that state, except
//! for populating a missing cached user-detail record once per client
//! instance.
//!
//! Every remote operation either fails at the transport level
//! ([`RemoteError`]) or yields an application [`Envelope`] whose numeric
//! code the core interprets; code 0 always means success.

pub mod types;

use async_trait::async_trait;
use gatekey_relay::RelayServerEntry;
use thiserror::Error;
pub use types::{
    DownloadInfo, Envelope, HostPort, MainCityInfo, RelayRoomInfo, ReleaseMetadata, RoomInfo,
    SearchHit, TokenScope, UserDetail,
};

/// Typed failures from the remote client collaborator
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Network/IO failure reaching the backend
    #[error("transport: {0}")]
    Transport(String),

    /// The backend throttled the call; retry after a delay
    #[error("rate limited by backend")]
    TooFrequent,
}

/// Authenticated client for the account/game backend.
///
/// Implementations perform the actual HTTP/wire calls; the orchestration
/// core drives them strictly sequentially within one flow.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Account user id as the backend reports it (decimal string).
    fn user_id(&self) -> String;

    /// Session user token; empty when unauthenticated.
    fn user_token(&self) -> String;

    /// Backend-specific one-way transform of the user token.
    ///
    /// Opaque to the core; used as relay-channel keying material.
    fn encrypted_user_token(&self) -> Vec<u8>;

    /// Cached release metadata (engine and patch versions).
    fn release_metadata(&self) -> ReleaseMetadata;

    /// Cached user-detail record, if fetched before.
    fn cached_user_detail(&self) -> Option<UserDetail>;

    /// Populate the user-detail cache.
    ///
    /// The core calls this at most once per client instance, and only when
    /// the cache is empty.
    fn cache_user_detail(&self, detail: UserDetail);

    /// Fetch the account's user-detail record.
    async fn get_user_detail(&self) -> Result<Envelope<UserDetail>, RemoteError>;

    /// Set the account display name.
    async fn update_nickname(&self, name: &str) -> Result<Envelope<()>, RemoteError>;

    /// Search lobby rooms by keyword.
    async fn search_room_by_keyword(
        &self,
        keyword: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Envelope<Vec<SearchHit>>, RemoteError>;

    /// Fetch a lobby room by canonical id.
    async fn get_room(&self, room_id: &str) -> Result<Envelope<RoomInfo>, RemoteError>;

    /// Purchase or unlock an item resource.
    async fn purchase_item(&self, resource_id: &str) -> Result<Envelope<()>, RemoteError>;

    /// Enter a lobby room.
    async fn enter_room(&self, room_id: &str, password: &str)
    -> Result<Envelope<()>, RemoteError>;

    /// Enter the game instance of the room entered last.
    async fn enter_room_game(&self) -> Result<Envelope<HostPort>, RemoteError>;

    /// Resolve a network-hosted game's server address.
    async fn get_server_address(&self, game_code: &str)
    -> Result<Envelope<HostPort>, RemoteError>;

    /// Enter the default main city.
    async fn enter_main_city(&self) -> Result<Envelope<MainCityInfo>, RemoteError>;

    /// Leave whatever game is currently entered.
    async fn leave_game(&self) -> Result<(), RemoteError>;

    /// Leave the main city.
    async fn leave_main_city(&self) -> Result<Envelope<()>, RemoteError>;

    /// Search rental servers by name.
    async fn search_rental_server(
        &self,
        name: &str,
    ) -> Result<Envelope<Vec<SearchHit>>, RemoteError>;

    /// Enter a rental server's world.
    async fn enter_rental_world(
        &self,
        server_id: &str,
        password: &str,
    ) -> Result<Envelope<HostPort>, RemoteError>;

    /// Generate a session-token payload for `scope` and the caller's key.
    async fn generate_session_token(
        &self,
        scope: TokenScope,
        public_key: &str,
    ) -> Result<Vec<u8>, RemoteError>;

    /// Submit a session-token payload, returning the chain-info blob.
    async fn send_session_token_request(&self, payload: &[u8]) -> Result<Vec<u8>, RemoteError>;

    /// Fetch the current relay/signaling server pool.
    async fn get_relay_server_pool(&self) -> Result<Vec<RelayServerEntry>, RemoteError>;

    /// Look relay-hosted rooms up by join code or name.
    async fn find_relay_room(
        &self,
        name: &str,
    ) -> Result<Envelope<Vec<RelayRoomInfo>>, RemoteError>;

    /// Resolve a mod item's download location.
    async fn get_download_info(&self, item_id: &str)
    -> Result<Envelope<DownloadInfo>, RemoteError>;

    /// Authenticate a fresh PC client from the same credential.
    ///
    /// One attempt; a throttled backend surfaces as
    /// [`RemoteError::TooFrequent`] so the caller decides the retry policy.
    async fn reauthenticate(&self) -> Result<Box<dyn RemoteClient>, RemoteError>;
}
