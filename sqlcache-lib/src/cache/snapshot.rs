//! Snapshots: a frozen instant inside a store transaction.

use chrono::DateTime;
use chrono::Utc;
use log::debug;
use log::warn;

use super::CacheHandle;
use crate::error::CacheError;
use crate::store::Store;

/// A cache handle whose "now" is fixed.
///
/// Every read and write through a snapshot is evaluated against the same
/// instant and runs inside one store transaction, so a `has` followed by a
/// `get` cannot straddle an expiry boundary. Only one snapshot can be open
/// on a store at a time.
///
/// The transaction is committed by [`close`](Self::close), or when the
/// snapshot is dropped.
///
/// # Example
///
/// ```
/// use sqlcache_lib::cache::{Cache, CacheHandle};
///
/// let cache = Cache::open_in_memory()?;
/// cache.set("token", "abc", 1)?;
///
/// let snapshot = cache.snapshot()?;
/// if snapshot.has("token")? {
///     assert!(snapshot.get("token")?.is_some());
/// }
/// snapshot.close()?;
/// # Ok::<(), sqlcache_lib::error::CacheError>(())
/// ```
pub struct Snapshot<'c> {
    store: &'c Store,
    now: DateTime<Utc>,
    owns_transaction: bool,
    closed: bool,
}

impl<'c> Snapshot<'c> {
    /// Opens a transaction on `store` and freezes `now`.
    pub(crate) fn begin(store: &'c Store, now: DateTime<Utc>) -> Result<Self, CacheError> {
        store.begin_transaction()?;
        debug!("snapshot opened at {now}");
        Ok(Self {
            store,
            now,
            owns_transaction: true,
            closed: false,
        })
    }

    /// A frozen view that rides on a transaction owned elsewhere.
    pub(crate) fn view(store: &'c Store, now: DateTime<Utc>) -> Self {
        Self {
            store,
            now,
            owns_transaction: false,
            closed: false,
        }
    }

    /// Commits the snapshot's transaction.
    pub fn close(mut self) -> Result<(), CacheError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), CacheError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if !self.owns_transaction {
            return Ok(());
        }

        if let Err(err) = self.store.commit_transaction() {
            // Leave the connection usable for the next snapshot.
            if let Err(rollback_err) = self.store.raw_exec("ROLLBACK") {
                warn!("rollback after failed snapshot commit failed: {rollback_err}");
            }
            return Err(err);
        }
        debug!("snapshot at {} committed", self.now);
        Ok(())
    }
}

impl CacheHandle for Snapshot<'_> {
    fn store(&self) -> &Store {
        self.store
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn frozen_now(&self) -> Option<DateTime<Utc>> {
        Some(self.now)
    }
}

impl Drop for Snapshot<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            warn!("failed to commit snapshot on drop: {err}");
        }
    }
}
