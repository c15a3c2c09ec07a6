//! Human-friendly duration strings.
//!
//! Accepts the usual unit suffixes (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`),
//! compound and fractional values such as `1h30m` or `1.5h`, and a whole
//! day form `Nd` that is expanded to `N * 24h`.

use chrono::Duration;
use tracing::debug;

use crate::error::{Result, ScheduleError};

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;

/// Parse `value` as a duration. `field` names the setting it came from and
/// ends up in the error message.
pub fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    if let Some(duration) = parse_standard(value) {
        return Ok(duration);
    }

    debug!(field, value, "not a unit-suffixed duration, trying day suffix");

    parse_days(value).ok_or_else(|| ScheduleError::InvalidDuration {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Fractional hours, the unit every report line uses.
pub fn as_hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

fn parse_standard(input: &str) -> Option<Duration> {
    let (negative, mut rest) = if let Some(stripped) = input.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = input.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, input)
    };

    if rest == "0" {
        return Some(Duration::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);

        let (frac_part, after) = match after.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", after),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_len);
        let scale = unit_nanos(unit)?;

        if !int_part.is_empty() {
            let whole: i128 = int_part.parse().ok()?;
            total = total.checked_add(whole.checked_mul(scale)?)?;
        }

        if !frac_part.is_empty() {
            // Anything past 18 fractional digits is below nanosecond resolution.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: i128 = digits.parse().ok()?;
            let denominator = 10i128.pow(digits.len() as u32);
            total = total.checked_add(numerator * scale / denominator)?;
        }

        rest = after;
    }

    let nanos = i64::try_from(total).ok()?;
    Some(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

fn parse_days(input: &str) -> Option<Duration> {
    let digits = input.strip_suffix('d')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let days: i64 = digits.parse().ok()?;
    Duration::try_days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> Result<Duration> {
        parse_duration("test", value)
    }

    #[test]
    fn test_day_suffix() {
        let duration = parse("27d").unwrap();
        assert_eq!(duration.num_hours(), 648);

        assert_eq!(parse("1095d").unwrap(), Duration::hours(1095 * 24));
        assert_eq!(parse("0d").unwrap(), Duration::zero());
    }

    #[test]
    fn test_standard_units() {
        assert_eq!(parse("2h").unwrap().num_hours(), 2);
        assert_eq!(parse("90m").unwrap(), Duration::minutes(90));
        assert_eq!(parse("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse("250ms").unwrap(), Duration::milliseconds(250));
        assert_eq!(parse("3us").unwrap(), Duration::microseconds(3));
        assert_eq!(parse("3µs").unwrap(), Duration::microseconds(3));
        assert_eq!(parse("7ns").unwrap(), Duration::nanoseconds(7));
        assert_eq!(parse("0").unwrap(), Duration::zero());
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(
            parse("1h30m").unwrap(),
            Duration::hours(1) + Duration::minutes(30)
        );
        assert_eq!(parse("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse(".5h").unwrap(), Duration::minutes(30));
        assert_eq!(parse("-2h").unwrap(), Duration::hours(-2));
        assert_eq!(parse("+2h").unwrap(), Duration::hours(2));
    }

    #[test]
    fn test_malformed_input() {
        for value in ["abc", "", "d", "5", "h", ".h", "1.5d", "-3d", "3 d", "1w", "12dd"] {
            match parse(value) {
                Err(ScheduleError::InvalidDuration { field, value: v }) => {
                    assert_eq!(field, "test");
                    assert_eq!(v, value);
                }
                other => panic!("expected error for {:?}, got {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(parse("99999999999999999999h").is_err());
        assert!(parse("9999999999999999999d").is_err());
    }

    #[test]
    fn test_as_hours() {
        assert_eq!(as_hours(Duration::days(27)), 648.0);
        assert_eq!(as_hours(Duration::minutes(90)), 1.5);
    }
}
