//! Human duration parsing and formatting.
//!
//! Administrative input writes durations as `3`, `90s`, `5m` or `1.5h`; a bare number
//! means minutes.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,
    #[error("invalid duration: {0:?}")]
    Invalid(String),
    #[error("duration must be greater than zero: {0:?}")]
    Zero(String),
}

/// Parse a single duration token. Bare numbers are minutes.
pub fn parse_duration(raw: &str) -> Result<Duration, DurationParseError> {
    let token = raw.trim().to_ascii_lowercase();
    if token.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let (number, unit_secs) = if let Some(n) = token.strip_suffix('h') {
        (n, 3600.0)
    } else if let Some(n) = token.strip_suffix("min") {
        (n, 60.0)
    } else if let Some(n) = token.strip_suffix('m') {
        (n, 60.0)
    } else if let Some(n) = token.strip_suffix('s') {
        (n, 1.0)
    } else {
        (token.as_str(), 60.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| DurationParseError::Invalid(raw.trim().to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(DurationParseError::Invalid(raw.trim().to_string()));
    }

    let secs = (value * unit_secs).round() as u64;
    if secs == 0 {
        return Err(DurationParseError::Zero(raw.trim().to_string()));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a comma and/or whitespace separated list, e.g. `3,5,4` or `90s 2m`.
pub fn parse_duration_list(raw: &str) -> Result<Vec<Duration>, DurationParseError> {
    let parsed = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.trim().is_empty())
        .map(parse_duration)
        .collect::<Result<Vec<_>, _>>()?;
    if parsed.is_empty() {
        return Err(DurationParseError::Empty);
    }
    Ok(parsed)
}

/// Compact rendering such as `1h 5m`, `4m` or `45s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}
