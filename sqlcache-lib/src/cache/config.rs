//! Cache configuration

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// SQLite journal mode applied when the store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    /// Rollback journal, deleted at the end of each transaction.
    Delete,
    /// Rollback journal, truncated instead of deleted.
    Truncate,
    /// Write-ahead log.
    #[default]
    Wal,
    /// Journal kept in memory.
    Memory,
}

impl JournalMode {
    /// The pragma value for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Wal => "WAL",
            Self::Memory => "MEMORY",
        }
    }
}

/// Configuration for opening a [`Cache`](super::Cache).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sqlcache_lib::cache::{CacheConfig, JournalMode};
///
/// let config = CacheConfig::at("cache.db")
///     .with_journal_mode(JournalMode::Delete)
///     .with_busy_timeout(Duration::from_secs(1))
///     .with_gc_on_close(false);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Database file. `None` opens a private in-memory database.
    ///
    /// Default: `None`
    pub path: Option<PathBuf>,

    /// Journal mode for file-backed databases. Ignored in memory.
    ///
    /// Default: WAL
    pub journal_mode: JournalMode,

    /// How long to wait on a database locked by another connection.
    ///
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Remove expired items when the cache is closed.
    ///
    /// Default: `true`
    pub gc_on_close: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            journal_mode: JournalMode::Wal,
            busy_timeout: Duration::from_secs(5),
            gc_on_close: true,
        }
    }
}

impl CacheConfig {
    /// Creates a config for an in-memory cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a config for a cache stored at `path`.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Creates a config for a cache in the platform cache directory.
    ///
    /// Returns `None` if no home directory can be determined.
    /// See [`paths::cache_db`](crate::paths::cache_db).
    pub fn in_cache_dir(qualifier: &str, organization: &str, application: &str) -> Option<Self> {
        crate::paths::cache_db(qualifier, organization, application).map(Self::at)
    }

    /// Sets the journal mode.
    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Sets the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Enables or disables garbage collection on close.
    pub fn with_gc_on_close(mut self, enabled: bool) -> Self {
        self.gc_on_close = enabled;
        self
    }

    /// Returns `true` if this config opens an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }
}
