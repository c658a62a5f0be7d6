use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::error::ConfigError;

/// Date format used for Gerrit's `mergedafter:` clause.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unit of a relative age token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Hours,
    Days,
    Weeks,
}

impl AgeUnit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "h" => Some(AgeUnit::Hours),
            "d" => Some(AgeUnit::Days),
            "w" => Some(AgeUnit::Weeks),
            _ => None,
        }
    }
}

/// A parsed relative age such as `7d` or `36h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub amount: i64,
    pub unit: AgeUnit,
}

impl Age {
    /// Length of the age as a duration, or `None` if it overflows.
    pub fn duration(&self) -> Option<Duration> {
        match self.unit {
            AgeUnit::Hours => Duration::try_hours(self.amount),
            AgeUnit::Days => Duration::try_days(self.amount),
            AgeUnit::Weeks => Duration::try_weeks(self.amount),
        }
    }
}

/// Parses a `<integer><unit>` token; units are `h`, `d` and `w`
/// (case-insensitive).
pub fn parse_age(token: &str) -> Result<Age, ConfigError> {
    static AGE_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^([0-9]+)([a-z])$").expect("age pattern is valid"));

    let normalized = token.trim().to_lowercase();
    let captures = AGE_PATTERN
        .captures(&normalized)
        .ok_or_else(|| ConfigError::InvalidAge(token.to_string()))?;

    let unit = AgeUnit::from_suffix(&captures[2])
        .ok_or_else(|| ConfigError::InvalidAge(token.to_string()))?;
    let amount = captures[1]
        .parse::<i64>()
        .map_err(|_| ConfigError::AgeOutOfRange(token.to_string()))?;

    Ok(Age { amount, unit })
}

/// Resolves the `mergedafter` date for a run.
///
/// A non-empty `merged_after` override wins and is returned verbatim; the age
/// token is not looked at in that case. Otherwise the date is `now` minus the
/// age, formatted as `YYYY-MM-DD` in UTC.
pub fn resolve_merged_after(
    age: &str,
    merged_after: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, ConfigError> {
    if let Some(date) = merged_after.map(str::trim).filter(|d| !d.is_empty()) {
        validate_date(date)?;
        return Ok(date.to_string());
    }

    let cutoff = parse_age(age)?
        .duration()
        .and_then(|duration| now.checked_sub_signed(duration))
        .ok_or_else(|| ConfigError::AgeOutOfRange(age.to_string()))?;

    Ok(cutoff.format(DATE_FORMAT).to_string())
}

fn validate_date(date: &str) -> Result<(), ConfigError> {
    // chrono accepts unpadded fields; Gerrit and the output schema want the
    // fixed-width form.
    if date.len() != 10 || NaiveDate::parse_from_str(date, DATE_FORMAT).is_err() {
        return Err(ConfigError::InvalidDate(date.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 5, 10, 0, 0).unwrap()
    }

    #[test]
    fn days_subtract_from_reference_date() {
        for (token, expected) in [
            ("0d", "2025-09-05"),
            ("1d", "2025-09-04"),
            ("7d", "2025-08-29"),
            ("30d", "2025-08-06"),
            ("365d", "2024-09-05"),
        ] {
            assert_eq!(
                resolve_merged_after(token, None, reference()).unwrap(),
                expected,
                "token {token}"
            );
        }
    }

    #[test]
    fn hours_and_weeks() {
        assert_eq!(
            resolve_merged_after("36h", None, reference()).unwrap(),
            "2025-09-03"
        );
        assert_eq!(
            resolve_merged_after("10h", None, reference()).unwrap(),
            "2025-09-05"
        );
        assert_eq!(
            resolve_merged_after("2w", None, reference()).unwrap(),
            "2025-08-22"
        );
    }

    #[test]
    fn unit_is_case_insensitive_and_trimmed() {
        assert_eq!(
            parse_age(" 7D ").unwrap(),
            Age {
                amount: 7,
                unit: AgeUnit::Days
            }
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in [
            "", "d", "7", "d7", "-1d", "1.5d", "7m", "7 days", "7dd", "٣d", "７d",
        ] {
            assert!(
                matches!(parse_age(token), Err(ConfigError::InvalidAge(_))),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_ages_outside_calendar_range() {
        assert!(matches!(
            resolve_merged_after("99999999999999999999d", None, reference()),
            Err(ConfigError::AgeOutOfRange(_))
        ));
        assert!(matches!(
            resolve_merged_after("100000000d", None, reference()),
            Err(ConfigError::AgeOutOfRange(_))
        ));
    }

    #[test]
    fn override_wins_even_with_malformed_age() {
        assert_eq!(
            resolve_merged_after("not-an-age", Some("2025-08-29"), reference()).unwrap(),
            "2025-08-29"
        );
    }

    #[test]
    fn blank_override_falls_back_to_age() {
        assert_eq!(
            resolve_merged_after("1d", Some("  "), reference()).unwrap(),
            "2025-09-04"
        );
    }

    #[test]
    fn override_must_be_a_calendar_date() {
        for date in ["2025-13-01", "2025-02-30", "2025-8-1", "yesterday"] {
            assert!(
                matches!(
                    resolve_merged_after("1d", Some(date), reference()),
                    Err(ConfigError::InvalidDate(_))
                ),
                "date {date:?} should be rejected"
            );
        }
    }
}
