//! Session persistence.
//!
//! The server only talks to a [`SessionStore`]; [`MemoryStore`] is the implementation the binary
//! ships with.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{self, BoxFuture};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use super::SessionKey;

/// A key/value store for session data.
///
/// The store owns expiry: a value stays retrievable for the `ttl` it was [set](Self::set) with,
/// and is gone afterwards.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, if it exists and hasn't expired.
    fn get(&self, key: SessionKey) -> BoxFuture<'_, Result<Option<String>, StoreError>>;

    /// Stores `value` under `key` for `ttl`, replacing any previous value.
    fn set(
        &self,
        key: SessionKey,
        value: String,
        ttl: time::Duration,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Removes the value stored under `key`.
    ///
    /// Deleting a key that doesn't exist is not an error.
    fn delete(&self, key: SessionKey) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// The store could not be reached, or failed to carry out an operation.
#[derive(Debug)]
pub struct StoreError {
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl StoreError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self { source: source.into() }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "session store unavailable: {}", self.source)
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

/// An in-process [`SessionStore`].
///
/// Expired entries are evicted lazily when they're read, and in bulk by [`sweep()`].
/// Sessions don't survive a restart.
///
/// [`sweep()`]: MemoryStore::sweep
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<SessionKey, Entry>>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: OffsetDateTime,
}

impl Entry {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries, including expired ones that haven't been swept yet.
    pub fn len(&self) -> usize {
        self.entries().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all expired entries and returns how many there were.
    #[tracing::instrument(level = "debug", skip(self), ret(level = "debug"))]
    pub fn sweep(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let Ok(mut entries) = self.entries() else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Calls [`sweep()`](Self::sweep) every `interval` until `cancellation_token` is cancelled.
    pub async fn run_sweeper(
        self: Arc<Self>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancellation_token.cancelled() => {
                    debug!("session sweeper shutting down");
                    break;
                },
                _ = interval.tick() => {
                    self.sweep();
                },
            }
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<SessionKey, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::new("memory store lock poisoned"))
    }

    #[tracing::instrument(level = "trace", skip(self), err(level = "debug"))]
    fn get_now(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries()?;

        match entries.get(&key) {
            None => Ok(None),
            Some(entry) if entry.is_expired(OffsetDateTime::now_utc()) => {
                entries.remove(&key);
                Ok(None)
            },
            Some(entry) => Ok(Some(entry.value.clone())),
        }
    }

    #[tracing::instrument(level = "trace", skip(self, value), err(level = "debug"))]
    fn set_now(&self, key: SessionKey, value: String, ttl: time::Duration) -> Result<(), StoreError> {
        let expires_at = OffsetDateTime::now_utc().saturating_add(ttl);
        self.entries()?.insert(key, Entry { value, expires_at });
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self), err(level = "debug"))]
    fn delete_now(&self, key: SessionKey) -> Result<(), StoreError> {
        self.entries()?.remove(&key);
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: SessionKey) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        Box::pin(future::ready(self.get_now(key)))
    }

    fn set(
        &self,
        key: SessionKey,
        value: String,
        ttl: time::Duration,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(future::ready(self.set_now(key, value, ttl)))
    }

    fn delete(&self, key: SessionKey) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(future::ready(self.delete_now(key)))
    }
}
