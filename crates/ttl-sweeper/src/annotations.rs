//! TTL annotation parsing and age arithmetic.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Parses a raw annotation value into a TTL in seconds.
///
/// Anything that is not a non-negative base-10 integer (after trimming) is
/// treated as "no directive": empty strings, negative numbers, floats and
/// trailing garbage all yield `None`.
#[must_use]
pub fn parse_ttl(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Extracts the TTL directive stored under `key`, if any.
#[must_use]
pub fn ttl_seconds(annotations: &BTreeMap<String, String>, key: &str) -> Option<u64> {
    annotations.get(key).and_then(|raw| parse_ttl(raw))
}

/// Whole seconds elapsed between `created` and `now`, rounded toward negative
/// infinity. Objects stamped in the future get a negative age.
#[must_use]
pub fn age_seconds(now: DateTime<Utc>, created: DateTime<Utc>) -> i64 {
    (now - created).num_milliseconds().div_euclid(1000)
}

/// Returns true once `age` is strictly greater than `ttl`.
#[must_use]
pub fn is_expired(age: i64, ttl: u64) -> bool {
    u64::try_from(age).is_ok_and(|age| age > ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const KEY: &str = "cleanup.cto.dev/ttl-seconds";

    fn annotations(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(KEY.to_string(), value.to_string())])
    }

    #[test]
    fn parses_plain_and_padded_integers() {
        assert_eq!(parse_ttl("3600"), Some(3600));
        assert_eq!(parse_ttl(" 50\n"), Some(50));
        assert_eq!(parse_ttl("0"), Some(0));
    }

    #[test]
    fn rejects_non_numeric_values() {
        for raw in ["", "  ", "abc", "-5", "1.5", "50s", "1e3"] {
            assert_eq!(parse_ttl(raw), None, "expected no directive for {raw:?}");
        }
    }

    #[test]
    fn missing_key_is_no_directive() {
        let other = BTreeMap::from([("unrelated".to_string(), "10".to_string())]);
        assert_eq!(ttl_seconds(&other, KEY), None);
        assert_eq!(ttl_seconds(&BTreeMap::new(), KEY), None);
    }

    #[test]
    fn invalid_value_is_no_directive() {
        assert_eq!(ttl_seconds(&annotations("soon"), KEY), None);
        assert_eq!(ttl_seconds(&annotations("120"), KEY), Some(120));
    }

    #[test]
    fn age_floors_fractional_seconds() {
        let now = Utc::now();
        assert_eq!(age_seconds(now, now - Duration::milliseconds(100_900)), 100);
        assert_eq!(age_seconds(now, now), 0);
        assert_eq!(age_seconds(now, now + Duration::milliseconds(500)), -1);
    }

    #[test]
    fn expiry_boundary_is_strict() {
        assert!(is_expired(51, 50));
        assert!(!is_expired(50, 50));
        assert!(!is_expired(49, 50));
        assert!(!is_expired(-10, 0));
        assert!(is_expired(1, 0));
    }
}
