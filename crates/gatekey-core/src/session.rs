//! Bearer-keyed session store.
//!
//! After a successful entry orchestration the HTTP-facing layer stashes a
//! few fields per bearer token for reuse by later unrelated calls (checksum
//! generation and the like). Entries expire after a TTL and the store holds
//! a bounded number of them; hitting the bound evicts the entry closest to
//! expiry.

use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Default entry lifetime
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
/// Default store capacity
pub const DEFAULT_SESSION_CAPACITY: usize = 4096;

/// Fields retained per bearer after a successful entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    /// Account user id
    pub user_id: String,
    /// Account entity id
    pub entity_id: String,
    /// Engine version the entry ran against
    pub engine_version: String,
    /// Patch version the entry ran against
    pub patch_version: String,
}

#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    expires_at: Instant,
}

/// Expiring, size-bounded map from bearer token to [`SessionRecord`]
#[derive(Debug)]
pub struct SessionStore {
    entries: DashMap<String, StoredSession>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    /// Create a store with an explicit TTL and capacity.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Store `record` under `bearer`, resetting its lifetime.
    ///
    /// When the store is full, expired entries are purged first; if it is
    /// still full the entry closest to expiry is evicted.
    pub fn insert(&self, bearer: impl Into<String>, record: SessionRecord) {
        let bearer = bearer.into();
        if !self.entries.contains_key(&bearer) && self.entries.len() >= self.capacity {
            self.purge_expired();
            while self.entries.len() >= self.capacity {
                let Some(oldest) = self
                    .entries
                    .iter()
                    .min_by_key(|entry| entry.value().expires_at)
                    .map(|entry| entry.key().clone())
                else {
                    break;
                };
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            bearer,
            StoredSession {
                record,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Fetch the record for `bearer`, if present and not expired.
    ///
    /// Expired entries are removed on access.
    #[must_use]
    pub fn get(&self, bearer: &str) -> Option<SessionRecord> {
        let expired = match self.entries.get(bearer) {
            None => return None,
            Some(entry) if entry.expires_at <= Instant::now() => true,
            Some(entry) => return Some(entry.record.clone()),
        };
        if expired {
            self.entries.remove(bearer);
        }
        None
    }

    /// Drop the record for `bearer`, if any.
    pub fn remove(&self, bearer: &str) {
        self.entries.remove(bearer);
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, stored| stored.expires_at > now);
    }

    /// Number of entries currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_SESSION_CAPACITY)
    }
}
