//! The persisted cache item

use chrono::DateTime;
use chrono::Utc;

use super::Value;
use crate::cache::Freshness;

/// A cache entry together with its timing metadata.
///
/// `added_at` is fixed when the key is first written. `set_at` moves only
/// when a write changes the value or the expiry, so `set_at >= added_at`
/// always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    /// Unique key.
    pub key: String,
    /// The decoded payload.
    pub value: Value,
    /// Absolute expiry, or `None` if the item never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the key was first written.
    pub added_at: DateTime<Utc>,
    /// When the value or expiry last changed.
    pub set_at: DateTime<Utc>,
}

impl CacheItem {
    /// Returns `true` if the item's absolute expiry has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Returns how long ago the item was last changed, as of `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.set_at
    }

    /// Returns `true` if the item is visible at `now` under `freshness`.
    ///
    /// The absolute expiry always applies. A `MaxAge` window additionally
    /// requires `set_at + max_age > now`.
    pub fn is_visible(&self, now: DateTime<Utc>, freshness: Freshness) -> bool {
        if self.is_expired_at(now) {
            return false;
        }
        match freshness.max_age() {
            Some(max_age) => self
                .set_at
                .checked_add_signed(max_age)
                .is_none_or(|deadline| deadline > now),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn item(set_at: i64, expires_at: Option<i64>) -> CacheItem {
        CacheItem {
            key: "k".to_string(),
            value: Value::Null,
            expires_at: expires_at.map(at),
            added_at: at(0),
            set_at: at(set_at),
        }
    }

    #[test]
    fn test_ttl_only() {
        let never = item(10, None);
        assert!(never.is_visible(at(1_000_000), Freshness::Any));

        let expiring = item(10, Some(20));
        assert!(expiring.is_visible(at(19), Freshness::Any));
        assert!(!expiring.is_visible(at(20), Freshness::Any));
    }

    #[test]
    fn test_max_age_window() {
        let item = item(100, None);
        let window = Freshness::max_age_secs(5);
        assert!(item.is_visible(at(104), window));
        assert!(!item.is_visible(at(105), window));
        assert!(!item.is_visible(at(106), window));
    }

    #[test]
    fn test_max_age_does_not_override_expiry() {
        let item = item(100, Some(102));
        let generous = Freshness::MaxAge(Duration::from_secs(3600));
        assert!(item.is_visible(at(101), generous));
        assert!(!item.is_visible(at(103), generous));
    }

    #[test]
    fn test_zero_max_age_means_any() {
        let item = item(100, None);
        assert!(item.is_visible(at(10_000), Freshness::max_age_secs(0)));
    }

    #[test]
    fn test_age() {
        let item = item(100, None);
        assert_eq!(item.age_at(at(130)), chrono::Duration::seconds(30));
    }
}
