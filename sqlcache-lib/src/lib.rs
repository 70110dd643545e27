//! Durable key-value cache on SQLite
//!
//! A single-writer cache with per-item time-to-live, freshness windows on
//! reads, and snapshots that evaluate a sequence of operations against one
//! frozen instant.
//!
//! ```
//! use sqlcache_lib::cache::{Cache, CacheHandle, Freshness, Ttl};
//!
//! let cache = Cache::open_in_memory()?;
//! cache.set("page", "<html>", 300)?;
//! assert!(cache.has_within("page", Freshness::max_age_secs(60))?);
//! cache.set("page", "<html>", -1)?;
//! assert!(!cache.has("page")?);
//! # Ok::<(), sqlcache_lib::error::CacheError>(())
//! ```

pub mod cache;
pub mod clock;
pub mod codec;
pub mod error;
pub mod model;
pub mod paths;
pub mod store;

pub use cache::Cache;
pub use cache::CacheHandle;
pub use error::CacheError;
