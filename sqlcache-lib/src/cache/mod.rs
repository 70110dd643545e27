//! Persistent TTL cache
//!
//! A [`Cache`] stores [`Value`](crate::model::Value)s in SQLite with an
//! optional absolute expiry per item. Reads can additionally demand a
//! [`Freshness`] window measured from the item's last change. A
//! [`Snapshot`] freezes "now" so several operations agree on which items
//! are visible.

mod config;
mod facade;
mod freshness;
mod live;
mod snapshot;
mod sqlite;
mod ttl;

pub use config::*;
pub use facade::*;
pub use freshness::Freshness;
pub use live::*;
pub use snapshot::*;
pub use ttl::*;
