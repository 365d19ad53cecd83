use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};

/// Parses `250ms`, `10s`, `5m`, `1h`, or a bare number of seconds.
///
/// Zero is accepted; callers treat it as "disabled" where that makes sense.
///
/// # Errors
///
/// Returns a validation error for empty input, a missing number, an unknown
/// unit, or a value that overflows.
pub fn parse_duration_value(value: &str) -> AppResult<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(ValidationError::DurationEmpty));
    }

    let digits_len = value
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return Err(AppError::validation(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        }));
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
    })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let overflow = || AppError::validation(ValidationError::DurationOverflow);
    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(overflow),
        "h" => number
            .checked_mul(3_600)
            .map(Duration::from_secs)
            .ok_or_else(overflow),
        _ => Err(AppError::validation(ValidationError::InvalidDurationUnit {
            unit: unit.to_owned(),
        })),
    }
}

/// Rounds up to whole seconds, so `1500ms` becomes 2.
#[must_use]
pub fn whole_seconds(duration: Duration) -> u64 {
    if duration.subsec_nanos() == 0 {
        duration.as_secs()
    } else {
        duration.as_secs().saturating_add(1)
    }
}
