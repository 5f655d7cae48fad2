//! # Session Module
//!
//! Single source of truth for the client's credential. The bearer token and
//! the user id live in a [`KeyValueStorage`] that may be shared with other
//! processes; nothing is cached in memory, every read goes to storage.
//!
//! Storage failures never surface as errors. A store without storage reads
//! every entry as absent and ignores writes.

pub mod events;
pub mod storage;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::auth::{SessionState, is_token_expired, parse_user_id_str};

pub use events::StorageEvent;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "assetshare_auth_token";

/// Storage key of the user id, stored in its decimal string form
pub const USER_ID_KEY: &str = "assetshare_user_id";

const SESSION_KEYS: [&str; 2] = [TOKEN_KEY, USER_ID_KEY];
const EVENT_CAPACITY: usize = 64;

/// Handle to the persisted session. Clones share storage and subscribers.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    storage: Option<Arc<dyn KeyValueStorage>>,
    /// Values this handle last wrote or observed, used to spot external writes
    last_seen: Mutex<HashMap<&'static str, Option<String>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::build(Some(storage))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Store persisted to a JSON file at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    /// Store for contexts without durable storage
    pub fn unavailable() -> Self {
        Self::build(None)
    }

    fn build(storage: Option<Arc<dyn KeyValueStorage>>) -> Self {
        let last_seen = SESSION_KEYS
            .iter()
            .map(|&key| (key, storage.as_ref().and_then(|s| s.get_item(key))))
            .collect();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                storage,
                last_seen: Mutex::new(last_seen),
                events,
            }),
        }
    }

    pub fn is_available(&self) -> bool {
        self.inner.storage.is_some()
    }

    fn read(&self, key: &str) -> Option<String> {
        self.inner.storage.as_ref()?.get_item(key)
    }

    fn write(&self, key: &'static str, value: Option<String>) {
        let Some(storage) = &self.inner.storage else {
            return;
        };

        let mut last_seen = self.inner.last_seen.lock();
        let old_value = storage.get_item(key);
        match &value {
            Some(value) => storage.set_item(key, value),
            None => storage.remove_item(key),
        }
        last_seen.insert(key, value.clone());
        drop(last_seen);

        if old_value != value {
            // No subscribers is fine.
            let _ = self.inner.events.send(StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: value,
                external: false,
            });
        }
    }

    /// The stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// The stored user id; absent when unset or not numeric
    pub fn user_id(&self) -> Option<i64> {
        self.read(USER_ID_KEY).as_deref().and_then(parse_user_id_str)
    }

    /// Store `token`, or remove the entry for `None` and empty strings
    pub fn set_token(&self, token: Option<&str>) {
        let token = token.filter(|t| !t.is_empty()).map(str::to_string);
        self.write(TOKEN_KEY, token);
    }

    /// Store `user_id`, or remove the entry for `None`
    pub fn set_user_id(&self, user_id: Option<i64>) {
        self.write(USER_ID_KEY, user_id.map(|id| id.to_string()));
    }

    /// Remove both the token and the user id
    pub fn clear(&self) {
        self.set_token(None);
        self.set_user_id(None);
        debug!("session cleared");
    }

    /// True when no token is stored or the stored token is past its expiry
    /// (minus skew). Tokens whose claims cannot be read count as not expired.
    pub fn is_expired(&self) -> bool {
        self.token().is_none_or(|token| is_token_expired(&token))
    }

    /// Session state derivable without asking the backend
    pub fn local_state(&self) -> SessionState {
        match self.token() {
            None => SessionState::Anonymous,
            Some(token) if is_token_expired(&token) => SessionState::Invalid,
            Some(_) => SessionState::Unverified,
        }
    }

    /// Receive a [`StorageEvent`] for every change to the session entries
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }
}
