//! Staleness windows for cache reads.
//!
//! An item is visible when its absolute expiry has not passed and, if a
//! [`Freshness::MaxAge`] window is given, it was last changed within that
//! window. The window supplements the expiry, it never replaces it.

use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

use crate::codec;

/// Staleness tolerance for a read.
///
/// `Freshness::Any` applies only the absolute expiry. A zero `MaxAge`
/// behaves exactly like `Any`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sqlcache_lib::cache::Freshness;
///
/// assert_eq!(Freshness::max_age_secs(0), Freshness::Any);
/// assert_eq!(Freshness::from(Some(30u64)), Freshness::MaxAge(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Freshness {
    /// Any age is acceptable; only the absolute expiry matters.
    #[default]
    Any,
    /// The item must have been set less than this long ago.
    MaxAge(Duration),
}

impl Freshness {
    /// Creates a window of whole seconds. Zero means [`Freshness::Any`].
    pub fn max_age_secs(secs: u64) -> Self {
        Self::from(Duration::from_secs(secs))
    }

    /// Returns the window length, or `None` if no window applies.
    ///
    /// Instants are stored with millisecond resolution, so the window is
    /// rounded up to whole milliseconds.
    pub fn max_age(&self) -> Option<chrono::Duration> {
        self.max_age_millis()
            .map(|millis| chrono::Duration::try_milliseconds(millis).unwrap_or(chrono::TimeDelta::MAX))
    }

    /// Returns `true` if a staleness window applies.
    pub fn is_bounded(&self) -> bool {
        self.max_age_millis().is_some()
    }

    fn max_age_millis(&self) -> Option<i64> {
        match self {
            Self::MaxAge(window) if !window.is_zero() => {
                let millis = window.as_nanos().div_ceil(1_000_000);
                Some(i64::try_from(millis).unwrap_or(i64::MAX))
            }
            _ => None,
        }
    }
}

impl From<Duration> for Freshness {
    fn from(window: Duration) -> Self {
        if window.is_zero() {
            Self::Any
        } else {
            Self::MaxAge(window)
        }
    }
}

impl From<u64> for Freshness {
    fn from(secs: u64) -> Self {
        Self::max_age_secs(secs)
    }
}

impl From<Option<u64>> for Freshness {
    fn from(secs: Option<u64>) -> Self {
        secs.map(Self::max_age_secs).unwrap_or_default()
    }
}

/// SQL form of the visibility predicate over `cache_items`.
///
/// Binds `:now` and `:max_age` (milliseconds, NULL for no window).
macro_rules! visible_sql {
    () => {
        "(expires_at IS NULL OR expires_at > :now) AND (:max_age IS NULL OR set_at + :max_age > :now)"
    };
}

pub(crate) use visible_sql;

/// Bound parameters for [`visible_sql!`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Visibility {
    pub(crate) now: i64,
    pub(crate) max_age: Option<i64>,
}

impl Visibility {
    pub(crate) fn new(now: DateTime<Utc>, freshness: Freshness) -> Self {
        Self {
            now: codec::to_millis(now),
            max_age: freshness.max_age_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_zero_and_none_collapse() {
        assert_eq!(Freshness::from(None::<u64>), Freshness::Any);
        assert_eq!(Freshness::from(Some(0u64)), Freshness::Any);
        assert_eq!(Freshness::from(0u64), Freshness::Any);
        assert!(!Freshness::MaxAge(Duration::ZERO).is_bounded());
        assert_eq!(Freshness::MaxAge(Duration::ZERO).max_age(), None);
    }

    #[test]
    fn test_window() {
        let window = Freshness::max_age_secs(5);
        assert!(window.is_bounded());
        assert_eq!(window.max_age(), Some(chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_sub_millisecond_window_rounds_up() {
        let window = Freshness::MaxAge(Duration::from_micros(900));
        assert!(window.is_bounded());
        assert_eq!(window.max_age_millis(), Some(1));
        assert_eq!(window.max_age(), Some(chrono::Duration::milliseconds(1)));

        let window = Freshness::MaxAge(Duration::from_micros(1500));
        assert_eq!(window.max_age_millis(), Some(2));
        assert_eq!(window.max_age(), Some(chrono::Duration::milliseconds(2)));
    }

    #[test]
    fn test_huge_window_saturates() {
        let window = Freshness::MaxAge(Duration::from_secs(u64::MAX));
        assert_eq!(window.max_age(), Some(chrono::TimeDelta::MAX));
        assert_eq!(window.max_age_millis(), Some(i64::MAX));
    }

    #[test]
    fn test_visibility_params() {
        let now = Utc.timestamp_opt(100, 0).unwrap();
        let visibility = Visibility::new(now, Freshness::max_age_secs(2));
        assert_eq!(visibility.now, 100_000);
        assert_eq!(visibility.max_age, Some(2_000));
        assert_eq!(Visibility::new(now, Freshness::Any).max_age, None);
    }
}
