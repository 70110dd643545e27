//! SQL statements over the `cache_items` table.
//!
//! Every read pushes the visibility predicate down into the query, so a
//! row that is expired or outside the freshness window is never decoded.

use chrono::DateTime;
use chrono::Utc;
use log::trace;
use rusqlite::OptionalExtension;
use rusqlite::named_params;

use super::freshness::Visibility;
use super::freshness::visible_sql;
use crate::codec;
use crate::error::CacheError;
use crate::model::CacheItem;
use crate::model::Value;
use crate::store::Store;

/// Insert-or-update that leaves the row untouched when neither the value
/// nor the expiry changes. A row whose expiry has passed counts as absent
/// and is rewritten from scratch.
const UPSERT: &str = "
    INSERT INTO cache_items (key, value, expires_at, added_at, set_at)
    VALUES (:key, :value, :expires_at, :now, :now)
    ON CONFLICT (key) DO UPDATE SET
        value = excluded.value,
        expires_at = excluded.expires_at,
        added_at = CASE
            WHEN cache_items.expires_at <= excluded.set_at THEN excluded.added_at
            ELSE cache_items.added_at
        END,
        set_at = MAX(cache_items.added_at, excluded.set_at)
    WHERE cache_items.value IS NOT excluded.value
       OR cache_items.expires_at IS NOT excluded.expires_at
       OR cache_items.expires_at <= excluded.set_at
";

pub(crate) fn fetch(store: &Store, key: &str, visibility: Visibility) -> Result<Option<Value>, CacheError> {
    let mut stmt = store.prepare(concat!(
        "SELECT value FROM cache_items WHERE key = :key AND ",
        visible_sql!()
    ))?;
    let data = stmt
        .query_row(
            named_params! { ":key": key, ":now": visibility.now, ":max_age": visibility.max_age },
            |row| row.get::<_, Option<Vec<u8>>>(0),
        )
        .optional()?;

    match data {
        Some(data) => Ok(Some(codec::decode(data.as_deref())?)),
        None => Ok(None),
    }
}

pub(crate) fn exists(store: &Store, key: &str, visibility: Visibility) -> Result<bool, CacheError> {
    let mut stmt = store.prepare(concat!(
        "SELECT 1 FROM cache_items WHERE key = :key AND ",
        visible_sql!()
    ))?;
    Ok(stmt.exists(named_params! {
        ":key": key,
        ":now": visibility.now,
        ":max_age": visibility.max_age,
    })?)
}

/// Reads a row with its metadata, regardless of visibility.
pub(crate) fn fetch_item(store: &Store, key: &str) -> Result<Option<CacheItem>, CacheError> {
    let mut stmt = store.prepare(
        "SELECT key, value, expires_at, added_at, set_at FROM cache_items WHERE key = :key",
    )?;
    let row = stmt
        .query_row(named_params! { ":key": key }, |row| {
            let key: String = row.get(0)?;
            let data: Option<Vec<u8>> = row.get(1)?;
            let expires_at: Option<i64> = row.get(2)?;
            let added_at: i64 = row.get(3)?;
            let set_at: i64 = row.get(4)?;
            Ok((key, data, expires_at, added_at, set_at))
        })
        .optional()?;

    let Some((key, data, expires_at, added_at, set_at)) = row else {
        return Ok(None);
    };
    Ok(Some(CacheItem {
        key,
        value: codec::decode(data.as_deref())?,
        expires_at: expires_at.map(codec::from_millis).transpose()?,
        added_at: codec::from_millis(added_at)?,
        set_at: codec::from_millis(set_at)?,
    }))
}

/// Writes a value. Returns `false` if the stored row was already identical.
pub(crate) fn upsert(
    store: &Store,
    key: &str,
    value: &Value,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, CacheError> {
    let data = codec::encode(value)?;
    let mut stmt = store.prepare(UPSERT)?;
    let changed = stmt.execute(named_params! {
        ":key": key,
        ":value": data,
        ":expires_at": expires_at.map(codec::to_millis),
        ":now": codec::to_millis(now),
    })?;

    if changed == 0 {
        trace!("set {key}: unchanged, write skipped");
    } else {
        trace!("set {key}: written (expires_at={expires_at:?})");
    }
    Ok(changed > 0)
}

pub(crate) fn remove(store: &Store, key: &str) -> Result<bool, CacheError> {
    let mut stmt = store.prepare("DELETE FROM cache_items WHERE key = :key")?;
    let removed = stmt.execute(named_params! { ":key": key })?;
    trace!("delete {key}: removed={removed}");
    Ok(removed > 0)
}

pub(crate) fn remove_all(store: &Store) -> Result<usize, CacheError> {
    let mut stmt = store.prepare("DELETE FROM cache_items")?;
    Ok(stmt.execute([])?)
}

pub(crate) fn remove_expired(store: &Store, now: DateTime<Utc>) -> Result<usize, CacheError> {
    let mut stmt = store.prepare("DELETE FROM cache_items WHERE expires_at <= :now")?;
    Ok(stmt.execute(named_params! { ":now": codec::to_millis(now) })?)
}

pub(crate) fn count(store: &Store, visibility: Visibility) -> Result<usize, CacheError> {
    let mut stmt = store.prepare(concat!("SELECT COUNT(*) FROM cache_items WHERE ", visible_sql!()))?;
    let count = stmt.query_row(
        named_params! { ":now": visibility.now, ":max_age": visibility.max_age },
        |row| row.get::<_, i64>(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub(crate) fn keys(store: &Store, visibility: Visibility) -> Result<Vec<String>, CacheError> {
    let mut stmt = store.prepare(concat!(
        "SELECT key FROM cache_items WHERE ",
        visible_sql!(),
        " ORDER BY key"
    ))?;
    let rows = stmt.query_map(
        named_params! { ":now": visibility.now, ":max_age": visibility.max_age },
        |row| row.get(0),
    )?;
    Ok(rows.collect::<Result<Vec<String>, _>>()?)
}
