//! Operations shared by live caches and snapshots.

use chrono::DateTime;
use chrono::Utc;
use log::debug;
use serde::de::DeserializeOwned;

use super::Expiry;
use super::Freshness;
use super::Snapshot;
use super::Ttl;
use super::freshness::Visibility;
use super::sqlite;
use crate::error::CacheError;
use crate::model::CacheItem;
use crate::model::FromValue;
use crate::model::Value;
use crate::store::Store;

/// A handle to the cache: either a live [`Cache`](super::Cache), which reads
/// the clock on every call, or a [`Snapshot`], which evaluates every call
/// against one frozen instant inside a store transaction.
///
/// All cache operations are provided methods of this trait, so both kinds
/// of handle behave identically apart from where "now" comes from.
///
/// # Example
///
/// ```
/// use sqlcache_lib::cache::{Cache, CacheHandle, Ttl};
///
/// let cache = Cache::open_in_memory()?;
/// cache.set("answer", 42, Ttl::Never)?;
/// assert_eq!(cache.get_int("answer", 0)?, 42);
/// assert_eq!(cache.get_string("answer", "none")?, "none");
/// # Ok::<(), sqlcache_lib::error::CacheError>(())
/// ```
pub trait CacheHandle {
    /// The store this handle operates on.
    fn store(&self) -> &Store;

    /// The instant operations are evaluated against.
    fn now(&self) -> DateTime<Utc>;

    /// The frozen instant, if this handle is a snapshot.
    fn frozen_now(&self) -> Option<DateTime<Utc>>;

    /// Returns `true` if this handle is a snapshot.
    fn is_snapshot(&self) -> bool {
        self.frozen_now().is_some()
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Opens a snapshot frozen at the current instant.
    ///
    /// Fails with [`CacheError::AlreadySnapshotted`] on a snapshot, and with
    /// [`CacheError::TransactionConflict`] while another snapshot is open.
    fn snapshot(&self) -> Result<Snapshot<'_>, CacheError> {
        self.snapshot_at(self.now())
    }

    /// Opens a snapshot frozen at `now`.
    fn snapshot_at(&self, now: DateTime<Utc>) -> Result<Snapshot<'_>, CacheError> {
        if self.is_snapshot() {
            return Err(CacheError::AlreadySnapshotted);
        }
        Snapshot::begin(self.store(), now)
    }

    /// Runs `read` against a single frozen instant.
    ///
    /// On a snapshot this reuses the snapshot's instant. On a live cache a
    /// snapshot is opened for the duration of `read` and committed after.
    fn with_snapshot<T>(
        &self,
        read: impl FnOnce(&Snapshot<'_>) -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        match self.frozen_now() {
            Some(now) => read(&Snapshot::view(self.store(), now)),
            None => {
                let snapshot = self.snapshot()?;
                let result = read(&snapshot);
                snapshot.close()?;
                result
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the value stored under `key`, if visible.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.get_within(key, Freshness::Any)
    }

    /// Returns the value stored under `key` if it is visible under `freshness`.
    fn get_within(&self, key: &str, freshness: Freshness) -> Result<Option<Value>, CacheError> {
        sqlite::fetch(self.store(), key, Visibility::new(self.now(), freshness))
    }

    /// Returns the value stored under `key`, or `default` if not visible.
    fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value, CacheError> {
        Ok(self.get(key)?.unwrap_or_else(|| default.into()))
    }

    /// Returns the item stored under `key` with its metadata, if visible
    /// under `freshness`.
    fn item(&self, key: &str, freshness: Freshness) -> Result<Option<CacheItem>, CacheError> {
        let now = self.now();
        Ok(sqlite::fetch_item(self.store(), key)?.filter(|item| item.is_visible(now, freshness)))
    }

    /// Returns `true` if a visible value is stored under `key`.
    fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.has_within(key, Freshness::Any)
    }

    /// Returns `true` if a value visible under `freshness` is stored under `key`.
    fn has_within(&self, key: &str, freshness: Freshness) -> Result<bool, CacheError> {
        sqlite::exists(self.store(), key, Visibility::new(self.now(), freshness))
    }

    /// Returns the values for `keys`, in order, with `None` for keys that
    /// are not visible.
    fn get_multiple<I, K>(
        &self,
        keys: I,
        freshness: Freshness,
    ) -> Result<Vec<(String, Option<Value>)>, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                Ok((key.to_string(), self.get_within(key, freshness)?))
            })
            .collect()
    }

    /// Returns the number of visible items.
    fn item_count(&self, freshness: Freshness) -> Result<usize, CacheError> {
        sqlite::count(self.store(), Visibility::new(self.now(), freshness))
    }

    /// Returns the keys of all visible items, sorted.
    fn all_keys(&self, freshness: Freshness) -> Result<Vec<String>, CacheError> {
        sqlite::keys(self.store(), Visibility::new(self.now(), freshness))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores `value` under `key` for `ttl`.
    ///
    /// A TTL that is not in the future deletes the key instead. Rewriting an
    /// identical value with an identical expiry leaves the item untouched,
    /// so its freshness window is not reset.
    fn set(&self, key: &str, value: impl Into<Value>, ttl: impl Into<Ttl>) -> Result<(), CacheError> {
        let now = self.now();
        match ttl.into().resolve(now) {
            Expiry::Elapsed => {
                self.delete(key)?;
            }
            expiry => {
                sqlite::upsert(self.store(), key, &value.into(), expiry.instant(), now)?;
            }
        }
        Ok(())
    }

    /// Stores each `(key, value)` pair with the same `ttl`, one at a time.
    fn set_multiple<I, K, V>(&self, items: I, ttl: impl Into<Ttl>) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let ttl = ttl.into();
        for (key, value) in items {
            self.set(key.as_ref(), value, ttl)?;
        }
        Ok(())
    }

    /// Removes `key`. Returns `true` if a row was removed.
    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        sqlite::remove(self.store(), key)
    }

    /// Removes each of `keys`, one at a time. Returns how many rows were removed.
    fn delete_multiple<I, K>(&self, keys: I) -> Result<usize, CacheError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut removed = 0;
        for key in keys {
            if self.delete(key.as_ref())? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every item. Returns how many rows were removed.
    fn clear(&self) -> Result<usize, CacheError> {
        let removed = sqlite::remove_all(self.store())?;
        debug!("cleared {removed} items");
        Ok(removed)
    }

    /// Removes items whose absolute expiry has passed. Returns how many rows
    /// were removed.
    fn clear_expired(&self) -> Result<usize, CacheError> {
        let removed = sqlite::remove_expired(self.store(), self.now())?;
        debug!("removed {removed} expired items");
        Ok(removed)
    }

    // =========================================================================
    // Typed reads
    // =========================================================================

    /// Returns the value under `key` narrowed to `T`, or `default` if it is
    /// absent or of another kind.
    ///
    /// The existence check and the read observe the same instant. This is
    /// the windowed form of [`get_int`](Self::get_int) and the other
    /// typed getters, which accept any age.
    fn get_typed<T: FromValue>(&self, key: &str, default: T, freshness: Freshness) -> Result<T, CacheError> {
        let value = self.with_snapshot(|snapshot| {
            if !snapshot.has_within(key, freshness)? {
                return Ok(None);
            }
            snapshot.get_within(key, freshness)
        })?;
        Ok(value.and_then(T::from_value).unwrap_or(default))
    }

    /// Returns the integer under `key`, or `default`.
    fn get_int(&self, key: &str, default: i64) -> Result<i64, CacheError> {
        self.get_typed(key, default, Freshness::Any)
    }

    /// Returns the float under `key`, or `default`.
    fn get_float(&self, key: &str, default: f64) -> Result<f64, CacheError> {
        self.get_typed(key, default, Freshness::Any)
    }

    /// Returns the boolean under `key`, or `default`.
    fn get_bool(&self, key: &str, default: bool) -> Result<bool, CacheError> {
        self.get_typed(key, default, Freshness::Any)
    }

    /// Returns the string under `key`, or `default`.
    fn get_string(&self, key: &str, default: impl Into<String>) -> Result<String, CacheError> {
        self.get_typed(key, default.into(), Freshness::Any)
    }

    /// Returns the bytes under `key`, or `default`.
    fn get_bytes(&self, key: &str, default: Vec<u8>) -> Result<Vec<u8>, CacheError> {
        self.get_typed(key, default, Freshness::Any)
    }

    /// Returns the array under `key`, or `default`.
    fn get_array(&self, key: &str, default: Vec<Value>) -> Result<Vec<Value>, CacheError> {
        self.get_typed(key, default, Freshness::Any)
    }

    /// Returns the map under `key`, or `default`.
    fn get_map(
        &self,
        key: &str,
        default: std::collections::BTreeMap<String, Value>,
    ) -> Result<std::collections::BTreeMap<String, Value>, CacheError> {
        self.get_typed(key, default, Freshness::Any)
    }

    /// Returns the instance of `T` stored under `key` with
    /// [`Value::instance`], or `default` if the key holds anything else.
    ///
    /// An instance tagged as `T` whose payload no longer decodes also
    /// yields `default`.
    fn get_instance_of<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, CacheError> {
        self.get_instance_of_within(key, default, Freshness::Any)
    }

    /// Like [`get_instance_of`](Self::get_instance_of), but only accepts an
    /// instance visible under `freshness`.
    fn get_instance_of_within<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
        freshness: Freshness,
    ) -> Result<T, CacheError> {
        let value: Value = self.get_typed(key, Value::Null, freshness)?;
        Ok(value.into_instance().unwrap_or(default))
    }
}
