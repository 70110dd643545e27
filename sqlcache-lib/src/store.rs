//! SQLite store underneath the cache.
//!
//! The store owns the single connection all cache reads and writes go
//! through. It knows nothing about expiry or freshness; it only provides
//! statements, raw execution and transaction control.

use log::debug;
use rusqlite::CachedStatement;
use rusqlite::Connection;

use crate::cache::CacheConfig;
use crate::error::CacheError;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache_items (
        key TEXT PRIMARY KEY NOT NULL,
        value BLOB,
        expires_at INTEGER,
        added_at INTEGER NOT NULL,
        set_at INTEGER NOT NULL,
        CHECK (set_at >= added_at)
    ) WITHOUT ROWID;

    -- Index for efficient GC queries
    CREATE INDEX IF NOT EXISTS idx_cache_items_expires_at ON cache_items(expires_at);
";

/// A single SQLite connection holding the `cache_items` table.
///
/// # Example
///
/// ```
/// use sqlcache_lib::store::Store;
///
/// let store = Store::open_in_memory()?;
/// assert!(!store.has_open_transaction());
/// # Ok::<(), sqlcache_lib::error::CacheError>(())
/// ```
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens the store described by `config`.
    ///
    /// Creates the parent directory, the database file and the schema if
    /// they don't exist.
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let conn = match &config.path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(path)?;
                let mode: String = conn.pragma_update_and_check(
                    None,
                    "journal_mode",
                    config.journal_mode.as_str(),
                    |row| row.get(0),
                )?;
                debug!("opened cache store at {} (journal_mode={mode})", path.display());
                conn
            }
            None => {
                debug!("opened in-memory cache store");
                Connection::open_in_memory()?
            }
        };
        conn.busy_timeout(config.busy_timeout)?;

        Self::init_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Opens a private in-memory store with default settings.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::open(&CacheConfig::in_memory())
    }

    fn init_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Prepares a statement, reusing a cached one for repeated SQL.
    pub fn prepare(&self, sql: &str) -> Result<CachedStatement<'_>, CacheError> {
        Ok(self.conn.prepare_cached(sql)?)
    }

    /// Executes one or more statements without parameters.
    pub fn raw_exec(&self, sql: &str) -> Result<(), CacheError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Returns `true` if a transaction is open on this connection.
    pub fn has_open_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Begins a write transaction.
    ///
    /// Fails with [`CacheError::TransactionConflict`] if a transaction is
    /// already open on this connection, or if another connection holds the
    /// database's write lock past the busy timeout.
    pub fn begin_transaction(&self) -> Result<(), CacheError> {
        if self.has_open_transaction() {
            return Err(CacheError::TransactionConflict);
        }
        match self.conn.execute_batch("BEGIN IMMEDIATE") {
            Ok(()) => Ok(()),
            Err(err) if CacheError::is_busy(&err) => Err(CacheError::TransactionConflict),
            Err(err) => Err(err.into()),
        }
    }

    /// Commits the open transaction. Does nothing if none is open.
    pub fn commit_transaction(&self) -> Result<(), CacheError> {
        if self.has_open_transaction() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Closes the connection, reporting any error SQLite raises while doing
    /// so. An open transaction is rolled back.
    pub fn close(self) -> Result<(), CacheError> {
        self.conn.close().map_err(|(_, err)| CacheError::from(err))?;
        debug!("closed cache store");
        Ok(())
    }
}
