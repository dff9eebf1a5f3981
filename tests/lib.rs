//! Shared fixtures for Gatekey integration tests.
//!
//! [`ScriptedClient`] is a programmable [`RemoteClient`] that records every
//! remote call and answers from configured scripts, so tests can assert both
//! outcomes and exact call sequences.

use async_trait::async_trait;
use gatekey_core::client::{
    DownloadInfo, Envelope, HostPort, MainCityInfo, RelayRoomInfo, ReleaseMetadata, RemoteClient,
    RemoteError, RoomInfo, SearchHit, TokenScope, UserDetail,
};
use gatekey_relay::RelayServerEntry;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default user id used by the fixture
pub const TEST_USER_ID: &str = "123456789";
/// Default user token used by the fixture
pub const TEST_USER_TOKEN: &str = "7f9c2ba4e88f827d616045507605853e";
/// Chain-info blob the fixture's token flow returns
pub const TEST_CHAIN_INFO: &str = "chain-info-blob";

/// Programmable remote client that records calls.
///
/// All state is shared through `Arc`, so the client handed back by
/// [`RemoteClient::reauthenticate`] logs into the same call sequence and
/// answers from the same scripts.
#[derive(Clone)]
pub struct ScriptedClient {
    user_id: String,
    user_token: String,
    release: ReleaseMetadata,
    calls: Arc<Mutex<Vec<String>>>,
    detail: Arc<Mutex<Option<UserDetail>>>,
    room_hits: Arc<Vec<SearchHit>>,
    rental_hits: Arc<Vec<SearchHit>>,
    enter_room_codes: Arc<Mutex<VecDeque<i32>>>,
    relay_pool: Arc<Vec<RelayServerEntry>>,
    relay_rooms: Arc<Vec<RelayRoomInfo>>,
    reauth_throttled: Arc<Mutex<ReauthScript>>,
    sent_nickname: Arc<Mutex<Option<String>>>,
}

#[derive(Clone, Copy)]
enum ReauthScript {
    /// Succeed after this many throttled attempts
    ThrottledFor(u32),
    /// Never stop throttling
    Always,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    /// Fixture with a named account, one lobby room hit, and a healthy pool.
    pub fn new() -> Self {
        Self {
            user_id: TEST_USER_ID.to_string(),
            user_token: TEST_USER_TOKEN.to_string(),
            release: ReleaseMetadata {
                engine_version: "2.7.0".to_string(),
                patch_version: "2.7.0.179066".to_string(),
            },
            calls: Arc::new(Mutex::new(Vec::new())),
            detail: Arc::new(Mutex::new(Some(UserDetail {
                entity_id: "ent-1001".to_string(),
                name: "Steve".to_string(),
                level: 12,
            }))),
            room_hits: Arc::new(vec![SearchHit {
                entity_id: "1234567890123456789".to_string(),
            }]),
            rental_hits: Arc::new(vec![SearchHit {
                entity_id: "rental-42".to_string(),
            }]),
            enter_room_codes: Arc::new(Mutex::new(VecDeque::new())),
            relay_pool: Arc::new(vec![RelayServerEntry {
                id: 6,
                status: 1,
                host: "198.51.100.7".to_string(),
                signal_port: 19132,
                data_ports: vec![8000, 8001],
            }]),
            relay_rooms: Arc::new(Vec::new()),
            reauth_throttled: Arc::new(Mutex::new(ReauthScript::ThrottledFor(0))),
            sent_nickname: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the cached user detail (None = cache empty).
    pub fn with_detail(mut self, detail: Option<UserDetail>) -> Self {
        self.detail = Arc::new(Mutex::new(detail));
        self
    }

    /// Clear the user token.
    pub fn without_token(mut self) -> Self {
        self.user_token = String::new();
        self
    }

    /// Script the application codes of successive enter-room calls
    /// (exhausted entries answer 0).
    pub fn with_enter_room_codes(self, codes: &[i32]) -> Self {
        *self.enter_room_codes.lock().unwrap() = codes.iter().copied().collect();
        self
    }

    /// Replace the lobby room search hits.
    pub fn with_room_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.room_hits = Arc::new(hits);
        self
    }

    /// Replace the rental server search hits.
    pub fn with_rental_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.rental_hits = Arc::new(hits);
        self
    }

    /// Replace the relay server pool.
    pub fn with_relay_pool(mut self, pool: Vec<RelayServerEntry>) -> Self {
        self.relay_pool = Arc::new(pool);
        self
    }

    /// Replace the relay room lookup result.
    pub fn with_relay_rooms(mut self, rooms: Vec<RelayRoomInfo>) -> Self {
        self.relay_rooms = Arc::new(rooms);
        self
    }

    /// Throttle the first `attempts` re-authentication attempts.
    pub fn with_reauth_throttled_for(self, attempts: u32) -> Self {
        *self.reauth_throttled.lock().unwrap() = ReauthScript::ThrottledFor(attempts);
        self
    }

    /// Throttle every re-authentication attempt.
    pub fn with_reauth_always_throttled(self) -> Self {
        *self.reauth_throttled.lock().unwrap() = ReauthScript::Always;
        self
    }

    /// Snapshot of the recorded call names, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times `op` was called.
    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    /// The nickname sent by the last update-nickname call, if any.
    pub fn sent_nickname(&self) -> Option<String> {
        self.sent_nickname.lock().unwrap().clone()
    }

    fn log(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    fn user_id(&self) -> String {
        self.user_id.clone()
    }

    fn user_token(&self) -> String {
        self.user_token.clone()
    }

    fn encrypted_user_token(&self) -> Vec<u8> {
        // Any deterministic transform works for tests.
        self.user_token.as_bytes().iter().map(|b| b ^ 0x5a).collect()
    }

    fn release_metadata(&self) -> ReleaseMetadata {
        self.release.clone()
    }

    fn cached_user_detail(&self) -> Option<UserDetail> {
        self.detail.lock().unwrap().clone()
    }

    fn cache_user_detail(&self, detail: UserDetail) {
        *self.detail.lock().unwrap() = Some(detail);
    }

    async fn get_user_detail(&self) -> Result<Envelope<UserDetail>, RemoteError> {
        self.log("get_user_detail");
        Ok(Envelope::ok(UserDetail {
            entity_id: "ent-1001".to_string(),
            name: "Steve".to_string(),
            level: 12,
        }))
    }

    async fn update_nickname(&self, name: &str) -> Result<Envelope<()>, RemoteError> {
        self.log("update_nickname");
        *self.sent_nickname.lock().unwrap() = Some(name.to_string());
        Ok(Envelope::ok(()))
    }

    async fn search_room_by_keyword(
        &self,
        _keyword: &str,
        _limit: u32,
        _offset: u32,
    ) -> Result<Envelope<Vec<SearchHit>>, RemoteError> {
        self.log("search_room_by_keyword");
        Ok(Envelope::ok(self.room_hits.as_ref().clone()))
    }

    async fn get_room(&self, _room_id: &str) -> Result<Envelope<RoomInfo>, RemoteError> {
        self.log("get_room");
        Ok(Envelope::ok(RoomInfo {
            resource_id: "res-77".to_string(),
            password_required: false,
        }))
    }

    async fn purchase_item(&self, _resource_id: &str) -> Result<Envelope<()>, RemoteError> {
        self.log("purchase_item");
        Ok(Envelope::ok(()))
    }

    async fn enter_room(
        &self,
        _room_id: &str,
        _password: &str,
    ) -> Result<Envelope<()>, RemoteError> {
        self.log("enter_room");
        let code = self
            .enter_room_codes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(0);
        if code == 0 {
            Ok(Envelope::ok(()))
        } else {
            Ok(Envelope::status(code, "room is busy"))
        }
    }

    async fn enter_room_game(&self) -> Result<Envelope<HostPort>, RemoteError> {
        self.log("enter_room_game");
        Ok(Envelope::ok(HostPort {
            host: "203.0.113.9".to_string(),
            port: 19134,
        }))
    }

    async fn get_server_address(
        &self,
        _game_code: &str,
    ) -> Result<Envelope<HostPort>, RemoteError> {
        self.log("get_server_address");
        Ok(Envelope::ok(HostPort {
            host: "203.0.113.40".to_string(),
            port: 30000,
        }))
    }

    async fn enter_main_city(&self) -> Result<Envelope<MainCityInfo>, RemoteError> {
        self.log("enter_main_city");
        Ok(Envelope::ok(MainCityInfo {
            host: "203.0.113.17".to_string(),
            port: 19130,
            city_no: 3,
        }))
    }

    async fn leave_game(&self) -> Result<(), RemoteError> {
        self.log("leave_game");
        Ok(())
    }

    async fn leave_main_city(&self) -> Result<Envelope<()>, RemoteError> {
        self.log("leave_main_city");
        Ok(Envelope::ok(()))
    }

    async fn search_rental_server(
        &self,
        _name: &str,
    ) -> Result<Envelope<Vec<SearchHit>>, RemoteError> {
        self.log("search_rental_server");
        Ok(Envelope::ok(self.rental_hits.as_ref().clone()))
    }

    async fn enter_rental_world(
        &self,
        _server_id: &str,
        _password: &str,
    ) -> Result<Envelope<HostPort>, RemoteError> {
        self.log("enter_rental_world");
        Ok(Envelope::ok(HostPort {
            host: "203.0.113.25".to_string(),
            port: 19136,
        }))
    }

    async fn generate_session_token(
        &self,
        _scope: TokenScope,
        _public_key: &str,
    ) -> Result<Vec<u8>, RemoteError> {
        self.log("generate_session_token");
        Ok(b"token-payload".to_vec())
    }

    async fn send_session_token_request(&self, _payload: &[u8]) -> Result<Vec<u8>, RemoteError> {
        self.log("send_session_token_request");
        Ok(TEST_CHAIN_INFO.as_bytes().to_vec())
    }

    async fn get_relay_server_pool(&self) -> Result<Vec<RelayServerEntry>, RemoteError> {
        self.log("get_relay_server_pool");
        Ok(self.relay_pool.as_ref().clone())
    }

    async fn find_relay_room(
        &self,
        _name: &str,
    ) -> Result<Envelope<Vec<RelayRoomInfo>>, RemoteError> {
        self.log("find_relay_room");
        Ok(Envelope::ok(self.relay_rooms.as_ref().clone()))
    }

    async fn get_download_info(
        &self,
        item_id: &str,
    ) -> Result<Envelope<DownloadInfo>, RemoteError> {
        self.log("get_download_info");
        Ok(Envelope::ok(DownloadInfo {
            resource_url: format!("https://cdn.example.net/items/{item_id}.zip"),
        }))
    }

    async fn reauthenticate(&self) -> Result<Box<dyn RemoteClient>, RemoteError> {
        self.log("reauthenticate");
        let mut script = self.reauth_throttled.lock().unwrap();
        match *script {
            ReauthScript::Always => Err(RemoteError::TooFrequent),
            ReauthScript::ThrottledFor(0) => Ok(Box::new(self.clone())),
            ReauthScript::ThrottledFor(n) => {
                *script = ReauthScript::ThrottledFor(n - 1);
                Err(RemoteError::TooFrequent)
            }
        }
    }
}
