//! Unix timestamps bounding signed authorizations.
//!
//! Every authorization a smart account accepts carries a `[validAfter, validBefore)`
//! window. Both bounds, as well as the block time of the execution environment,
//! are expressed as a [`UnixTimestamp`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};
use std::time::SystemTime;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// - **`validAfter`**: the earliest time an authorization can be executed (inclusive)
/// - **`validBefore`**: the time from which the authorization is rejected (exclusive)
///
/// # Serialization
///
/// Serialized as a stringified integer to avoid loss of precision in JSON, since
/// JavaScript's `Number` type cannot safely represent all 64-bit integers.
///
/// ```json
/// "1699999999"
/// ```
///
/// # Example
///
/// ```
/// use aa_types::timestamp::UnixTimestamp;
///
/// let now = UnixTimestamp::now();
/// let expires = now + 60;
/// let started = now - 60;
/// assert!(started < now && now < expires);
///
/// let specific = UnixTimestamp::from_secs(1699999999);
/// assert_eq!(specific.as_secs(), 1699999999);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Default)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(UnixTimestamp(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

/// Saturates at the epoch.
impl Sub<u64> for UnixTimestamp {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_sub(rhs))
    }
}

impl From<u64> for UnixTimestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl UnixTimestamp {
    /// The Unix epoch itself. Used as an "always valid" lower bound.
    pub const EPOCH: UnixTimestamp = UnixTimestamp(0);

    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A clock set before the Unix epoch reads as [`UnixTimestamp::EPOCH`].
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whether `self` lies inside the half-open window `[valid_after, valid_before)`.
    ///
    /// ```
    /// use aa_types::timestamp::UnixTimestamp;
    ///
    /// let after = UnixTimestamp::from_secs(100);
    /// let before = UnixTimestamp::from_secs(200);
    /// assert!(UnixTimestamp::from_secs(100).is_within(after, before));
    /// assert!(UnixTimestamp::from_secs(199).is_within(after, before));
    /// assert!(!UnixTimestamp::from_secs(200).is_within(after, before));
    /// ```
    pub fn is_within(&self, valid_after: UnixTimestamp, valid_before: UnixTimestamp) -> bool {
        *self >= valid_after && *self < valid_before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_as_string() {
        let ts = UnixTimestamp::from_secs(1699999999);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1699999999\"");
    }

    #[test]
    fn test_deserialize_from_string() {
        let ts: UnixTimestamp = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(ts.as_secs(), 42);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let result: Result<UnixTimestamp, _> = serde_json::from_str("\"-1\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_sub_saturates_at_epoch() {
        let ts = UnixTimestamp::from_secs(30);
        assert_eq!(ts - 60, UnixTimestamp::EPOCH);
    }

    #[test]
    fn test_window_is_half_open() {
        let after = UnixTimestamp::from_secs(10);
        let before = UnixTimestamp::from_secs(20);
        assert!(!UnixTimestamp::from_secs(9).is_within(after, before));
        assert!(UnixTimestamp::from_secs(10).is_within(after, before));
        assert!(UnixTimestamp::from_secs(19).is_within(after, before));
        assert!(!UnixTimestamp::from_secs(20).is_within(after, before));
    }
}
