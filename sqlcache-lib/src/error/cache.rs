//! Cache error types

/// Errors that can occur while operating on the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A value could not be encoded to or decoded from its stored form.
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// A snapshot was requested from a handle that is already a snapshot.
    #[error("handle is already a snapshot; snapshots cannot be nested")]
    AlreadySnapshotted,

    /// Another snapshot transaction is already open on the store.
    #[error("a snapshot transaction is already open on this store")]
    TransactionConflict,

    /// Error reported by the underlying SQLite store.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Filesystem error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored instant is outside the representable range.
    #[error("invalid stored timestamp: {0}ms")]
    InvalidTimestamp(i64),
}

impl CacheError {
    /// Returns `true` if this error is a misuse of the snapshot API
    /// rather than a storage or encoding failure.
    pub fn is_snapshot_misuse(&self) -> bool {
        matches!(self, Self::AlreadySnapshotted | Self::TransactionConflict)
    }

    /// Returns `true` if the store reported that the database is locked
    /// by another connection.
    pub(crate) fn is_busy(err: &rusqlite::Error) -> bool {
        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_misuse() {
        assert!(CacheError::AlreadySnapshotted.is_snapshot_misuse());
        assert!(CacheError::TransactionConflict.is_snapshot_misuse());
        assert!(!CacheError::InvalidTimestamp(0).is_snapshot_misuse());
    }

    #[test]
    fn test_display() {
        let display = format!("{}", CacheError::InvalidTimestamp(-5));
        assert!(display.contains("-5"));
    }
}
