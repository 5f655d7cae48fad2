//! Change notifications for the session entries.
//!
//! Writes made through a [`SessionStore`] are announced immediately. Writes made
//! by another process sharing the same durable storage are only noticed when the
//! store reconciles, either on demand or from the polling task started by
//! [`SessionStore::watch`].

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{SESSION_KEYS, SessionStore};

/// A change to one session entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Made by someone other than this store
    pub external: bool,
}

impl SessionStore {
    /// Compare storage against the values this store last saw and announce
    /// every difference as an external change.
    pub fn reconcile(&self) -> Vec<StorageEvent> {
        let Some(storage) = &self.inner.storage else {
            return Vec::new();
        };

        let mut changes = Vec::new();
        let mut last_seen = self.inner.last_seen.lock();
        for key in SESSION_KEYS {
            let current = storage.get_item(key);
            let previous = last_seen.get(key).cloned().flatten();
            if current != previous {
                last_seen.insert(key, current.clone());
                changes.push(StorageEvent {
                    key: key.to_string(),
                    old_value: previous,
                    new_value: current,
                    external: true,
                });
            }
        }
        drop(last_seen);

        for change in &changes {
            debug!(key = %change.key, "session entry changed externally");
            let _ = self.inner.events.send(change.clone());
        }
        changes
    }

    /// Reconcile every `every` until `cancel` fires
    pub fn watch(&self, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Watching session storage every {:?}", every);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        store.reconcile();
                    }
                }
            }

            info!("Session watcher stopped");
        })
    }
}
