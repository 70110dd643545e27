//! The live cache handle.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use log::debug;
use log::warn;

use super::CacheConfig;
use super::CacheHandle;
use super::sqlite;
use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::error::CacheError;
use crate::store::Store;

/// A persistent key-value cache with per-item TTL.
///
/// A `Cache` evaluates each operation against the clock's current instant.
/// Use [`snapshot`](CacheHandle::snapshot) for a sequence of operations
/// that must observe one instant.
///
/// Closing the cache (explicitly or by dropping it) removes items whose
/// expiry has passed, unless disabled with
/// [`CacheConfig::with_gc_on_close`].
///
/// # Example
///
/// ```no_run
/// use sqlcache_lib::cache::{Cache, CacheConfig, CacheHandle};
///
/// let cache = Cache::open(CacheConfig::at("cache.db"))?;
/// cache.set("greeting", "hello", 3600)?;
/// cache.close()?;
/// # Ok::<(), sqlcache_lib::error::CacheError>(())
/// ```
pub struct Cache {
    // Taken by `shutdown`; present for the whole usable life of the cache.
    store: Option<Store>,
    clock: Arc<dyn Clock>,
    gc_on_close: bool,
}

impl Cache {
    /// Opens the cache described by `config`, using the system clock.
    pub fn open(config: CacheConfig) -> Result<Self, CacheError> {
        Self::open_with_clock(config, SystemClock)
    }

    /// Opens the cache described by `config` with a custom clock.
    pub fn open_with_clock(config: CacheConfig, clock: impl Clock + 'static) -> Result<Self, CacheError> {
        let store = Store::open(&config)?;
        Ok(Self {
            store: Some(store),
            clock: Arc::new(clock),
            gc_on_close: config.gc_on_close,
        })
    }

    /// Opens a private in-memory cache.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::open(CacheConfig::in_memory())
    }

    /// Closes the cache, removing expired items first if configured to.
    ///
    /// Errors from the sweep and from closing the connection are returned.
    /// The connection is released either way.
    pub fn close(mut self) -> Result<(), CacheError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), CacheError> {
        let Some(store) = self.store.take() else {
            return Ok(());
        };

        let swept = if store.has_open_transaction() {
            warn!("closing cache with an open transaction; committing without expiry sweep");
            store.commit_transaction()
        } else if self.gc_on_close {
            sqlite::remove_expired(&store, self.clock.now())
                .map(|removed| debug!("removed {removed} expired items on close"))
        } else {
            Ok(())
        };
        let closed = store.close();
        swept.and(closed)
    }
}

impl CacheHandle for Cache {
    fn store(&self) -> &Store {
        self.store.as_ref().expect("store should not be closed")
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn frozen_now(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("failed to close cache cleanly: {err}");
        }
    }
}
