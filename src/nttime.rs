//! NTTIME: 100-nanosecond ticks since 1601-01-01 UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Result, TrustError};

/// NTTIME of the Unix epoch.
pub const UNIX_EPOCH_AS_NTTIME: u64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Converts whole Unix seconds to NTTIME. Instants before 1970 clamp to the Unix epoch.
#[inline]
#[must_use]
pub fn unix_to_nttime(secs: i64) -> u64 {
    u64::try_from(secs)
        .unwrap_or(0)
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(UNIX_EPOCH_AS_NTTIME)
}

/// Converts an instant to NTTIME with one-second precision.
#[inline]
#[must_use]
pub fn datetime_to_nttime(instant: DateTime<Utc>) -> u64 {
    unix_to_nttime(instant.timestamp())
}

#[inline]
#[must_use]
pub fn now() -> u64 {
    datetime_to_nttime(Utc::now())
}

/// Parses an LDAP `GeneralizedTime` value (`20240102030405Z`, fractional seconds allowed).
///
/// # Errors
/// - [`TrustError::Validation`] if the value is not a UTC generalized time.
#[inline]
pub fn parse_generalized_time(value: &str) -> Result<DateTime<Utc>> {
    let invalid = || TrustError::validation("modifyTimestamp", format!("'{value}' is not a generalized time"));
    let digits = value.strip_suffix('Z').ok_or_else(invalid)?;
    let whole = digits.split_once('.').map_or(digits, |(whole, _)| whole);
    NaiveDateTime::parse_from_str(whole, "%Y%m%d%H%M%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unix_epoch() {
        assert_eq!(unix_to_nttime(0), UNIX_EPOCH_AS_NTTIME);
    }

    #[test]
    fn known_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            datetime_to_nttime(instant),
            1_704_164_645 * 10_000_000 + UNIX_EPOCH_AS_NTTIME
        );
    }

    #[test]
    fn generalized_time() {
        let parsed = parse_generalized_time("20240102030405Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let fractional = parse_generalized_time("20240102030405.123Z").unwrap();
        assert_eq!(fractional, parsed);
    }

    #[test]
    fn generalized_time_requires_utc() {
        assert!(parse_generalized_time("20240102030405").is_err());
        assert!(parse_generalized_time("yesterdayZ").is_err());
    }

    #[test]
    fn pre_epoch_clamps() {
        assert_eq!(unix_to_nttime(-5), UNIX_EPOCH_AS_NTTIME);
    }
}
