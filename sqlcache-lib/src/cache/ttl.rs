//! Time-to-live specifications and their resolution to absolute expiry.

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;

/// How long a written item should live.
///
/// Integer conversions are seconds, so `cache.set("k", v, 60)` keeps the
/// item for a minute and `cache.set("k", v, -1)` deletes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// The item never expires.
    #[default]
    Never,
    /// The item expires this long after the write.
    After(chrono::Duration),
    /// The item expires at this instant.
    At(DateTime<Utc>),
    /// The item expires this many seconds after the write.
    Seconds(i64),
}

/// A [`Ttl`] resolved against a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// No absolute expiry.
    Never,
    /// Expires at this instant, which is after the reference instant.
    At(DateTime<Utc>),
    /// The expiry is not in the future; the write becomes a delete.
    Elapsed,
}

impl Ttl {
    /// Resolves this TTL to an absolute expiry as of `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Expiry {
        let expires_at = match *self {
            Ttl::Never => return Expiry::Never,
            Ttl::At(instant) => instant,
            Ttl::After(duration) => match now.checked_add_signed(duration) {
                Some(instant) => instant,
                None if duration > TimeDelta::zero() => return Expiry::Never,
                None => return Expiry::Elapsed,
            },
            Ttl::Seconds(secs) => {
                if secs <= 0 {
                    return Expiry::Elapsed;
                }
                match TimeDelta::try_seconds(secs).and_then(|d| now.checked_add_signed(d)) {
                    Some(instant) => instant,
                    // Beyond the representable range.
                    None => return Expiry::Never,
                }
            }
        };

        if expires_at > now {
            Expiry::At(expires_at)
        } else {
            Expiry::Elapsed
        }
    }
}

impl Expiry {
    /// The absolute expiry instant, if any.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::At(instant) => Some(*instant),
            _ => None,
        }
    }
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<i32> for Ttl {
    fn from(secs: i32) -> Self {
        Ttl::Seconds(i64::from(secs))
    }
}

impl From<u32> for Ttl {
    fn from(secs: u32) -> Self {
        Ttl::Seconds(i64::from(secs))
    }
}

impl From<u64> for Ttl {
    fn from(secs: u64) -> Self {
        Ttl::Seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

impl From<std::time::Duration> for Ttl {
    fn from(duration: std::time::Duration) -> Self {
        Ttl::After(chrono::Duration::from_std(duration).unwrap_or(TimeDelta::MAX))
    }
}

impl From<chrono::Duration> for Ttl {
    fn from(duration: chrono::Duration) -> Self {
        Ttl::After(duration)
    }
}

impl From<DateTime<Utc>> for Ttl {
    fn from(instant: DateTime<Utc>) -> Self {
        Ttl::At(instant)
    }
}

impl<T: Into<Ttl>> From<Option<T>> for Ttl {
    fn from(ttl: Option<T>) -> Self {
        ttl.map(Into::into).unwrap_or_default()
    }
}
