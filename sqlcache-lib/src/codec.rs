//! Encoding of values and instants into their stored form.
//!
//! Values are bincode-encoded [`Value`]s; `Value::Null` is stored as SQL
//! NULL. Instants are stored as Unix epoch milliseconds.

use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;

use crate::error::CacheError;
use crate::model::Value;

/// Encodes a value for storage. `Null` encodes to `None`.
pub fn encode(value: &Value) -> Result<Option<Vec<u8>>, CacheError> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(bincode::serialize(value)?))
}

/// Decodes a stored value. A missing payload decodes to `Null`.
pub fn decode(data: Option<&[u8]>) -> Result<Value, CacheError> {
    match data {
        Some(bytes) => Ok(bincode::deserialize(bytes)?),
        None => Ok(Value::Null),
    }
}

pub(crate) fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>, CacheError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(CacheError::InvalidTimestamp(millis))
}
