use std::{fmt::Display, ops::RangeInclusive, str::FromStr, time::Duration};

use humantime::parse_duration;

const TASK_COUNT_RANGE: RangeInclusive<usize> = 1..=1024;

pub fn parse_range_inclusive<N: PartialEq + PartialOrd + FromStr + Display>(
    s: &str,
    range: RangeInclusive<N>,
) -> Result<N, String> {
    let value: N = s.parse().map_err(|_| "invalid numeric value")?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{} is not in range {}-{}",
            value,
            range.start(),
            range.end(),
        ))
    }
}

pub fn parse_task_count(s: &str) -> Result<usize, String> {
    parse_range_inclusive(s, TASK_COUNT_RANGE)
}

/// A `humantime` duration such as `90s` or `2h 30m`; zero is rejected.
pub fn parse_nonzero_duration(s: &str) -> Result<Duration, String> {
    let duration = parse_duration(s).map_err(|err| err.to_string())?;
    if duration.is_zero() {
        Err("duration must be greater than zero".to_owned())
    } else {
        Ok(duration)
    }
}
