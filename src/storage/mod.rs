//! Persistence adapter for the last known session.
//!
//! DESIGN
//! ======
//! Two layers. `KeyValueStore` is a dumb string-keyed slot store (memory or
//! a profile directory on disk). `SessionCache` sits on top and owns the one
//! key holding the JSON-encoded `CachedSession`.
//!
//! ERROR HANDLING
//! ==============
//! The key-value layer reports `StorageError`. The session layer never
//! does: a read failure or an unparsable value is an absent session, and
//! write failures are logged and dropped. Start-up must never block on a
//! bad cache. `SessionCache::try_clear` is the one reporting path, for
//! callers that must know whether the slot is gone.


pub mod file;
pub mod memory;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::session::SessionRecord;

pub use file::FileKv;
pub use memory::MemoryKv;

/// Storage key used by the admin console for the cached session.
pub const DEFAULT_SESSION_KEY: &str = "health_web_admin";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String-keyed persistent slots.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Session record plus the time the provider last confirmed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSession {
    pub record: SessionRecord,
    /// Unix seconds of the last profile-store confirmation.
    pub confirmed_at: i64,
}

impl CachedSession {
    #[must_use]
    pub fn new(record: SessionRecord, confirmed_at: i64) -> Self {
        Self { record, confirmed_at }
    }

    /// Stamp `record` with the current wall-clock time.
    #[must_use]
    pub fn confirmed_now(record: SessionRecord) -> Self {
        Self::new(record, now_unix())
    }
}

#[must_use]
pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Synchronous cache of the last known session.
pub trait SessionStore: Send + Sync {
    /// Last written session, or `None` when absent or unreadable.
    fn load(&self) -> Option<CachedSession>;

    /// Overwrite the cached session. Visible to the next `load`.
    fn save(&self, session: &CachedSession);

    /// Remove the cached session. Idempotent.
    fn clear(&self);
}

/// `SessionStore` backed by one slot of a `KeyValueStore`.
pub struct SessionCache<K> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> SessionCache<K> {
    pub fn new(kv: K, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    pub fn with_default_key(kv: K) -> Self {
        Self::new(kv, DEFAULT_SESSION_KEY)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Remove the cached session, reporting storage failures.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the slot cannot be removed.
    pub fn try_clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key)
    }
}

impl<K: KeyValueStore> SessionStore for SessionCache<K> {
    fn load(&self) -> Option<CachedSession> {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "session cache unreadable; treating as absent");
                return None;
            }
        };
        match serde_json::from_str::<CachedSession>(&raw) {
            Ok(session) if session.record.is_complete() => Some(session),
            Ok(_) => {
                warn!(key = %self.key, "cached session has no identity; treating as absent");
                None
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "cached session corrupt; treating as absent");
                None
            }
        }
    }

    fn save(&self, session: &CachedSession) {
        if !session.record.is_complete() {
            warn!(key = %self.key, "refusing to cache a session without identity");
            return;
        }
        let raw = match serde_json::to_string(session) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "session encode failed; cache not written");
                return;
            }
        };
        match self.kv.set(&self.key, &raw) {
            Ok(()) => debug!(key = %self.key, identity = %session.record.identity, "session cached"),
            Err(e) => warn!(key = %self.key, error = %e, "session cache write failed"),
        }
    }

    fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!(key = %self.key, error = %e, "session cache clear failed");
        }
    }
}
