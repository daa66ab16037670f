//! Timestamp parsing and formatting utilities.
//!
//! Human-entered event bounds come in three shapes: `SS`, `MM:SS` and
//! `HH:MM:SS`, each component optionally fractional (`05:30.5`).

use thiserror::Error;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    /// Invalid numeric value for a component
    #[error("Invalid {0} value: '{1}'")]
    InvalidValue(&'static str, String),

    /// Wrong number of `:`-separated components
    #[error("Invalid timestamp format '{0}'. Use SS, MM:SS or HH:MM:SS")]
    InvalidFormat(String),

    /// Components are finite but their total is not
    #[error("Timestamp '{0}' is out of range")]
    OutOfRange(String),
}

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `HH:MM:SS` or `HH:MM:SS.mmm`
/// - `MM:SS` or `MM:SS.mmm`
/// - `SS` or `SS.mmm`
///
/// Whitespace around the whole string and around each component is ignored.
/// Negative values are passed through; range checks belong to the caller.
///
/// # Examples
/// ```
/// use hoopclip_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("1:02:03").unwrap(), 3723.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp(" 45 ").unwrap(), 45.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let parts: Vec<&str> = ts.trim().split(':').map(str::trim).collect();

    let total = match parts.as_slice() {
        [seconds] => parse_component("seconds", seconds)?,
        [minutes, seconds] => {
            let minutes = parse_component("minutes", minutes)?;
            let seconds = parse_component("seconds", seconds)?;
            minutes * 60.0 + seconds
        }
        [hours, minutes, seconds] => {
            let hours = parse_component("hours", hours)?;
            let minutes = parse_component("minutes", minutes)?;
            let seconds = parse_component("seconds", seconds)?;
            hours * 3600.0 + minutes * 60.0 + seconds
        }
        _ => return Err(TimestampError::InvalidFormat(ts.trim().to_string())),
    };

    if !total.is_finite() {
        return Err(TimestampError::OutOfRange(ts.trim().to_string()));
    }
    Ok(total)
}

/// Parse one component, rejecting anything that is not a finite number.
fn parse_component(name: &'static str, value: &str) -> Result<f64, TimestampError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TimestampError::InvalidValue(name, value.to_string()))
}

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    // Include milliseconds if present
    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_hh_mm_ss() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("1:02:03").unwrap(), 3723.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
    }

    #[test]
    fn test_parse_timestamp_mm_ss() {
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("00:05").unwrap(), 5.0);
    }

    #[test]
    fn test_parse_timestamp_ss() {
        assert_eq!(parse_timestamp("45").unwrap(), 45.0);
        assert_eq!(parse_timestamp("0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_timestamp_fractional() {
        let result = parse_timestamp("00:00:30.500").unwrap();
        assert!((result - 30.5).abs() < 0.001);
        assert!((parse_timestamp("1:2.25").unwrap() - 62.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_timestamp_strips_whitespace() {
        assert_eq!(parse_timestamp("  05:30  ").unwrap(), 330.0);
        assert_eq!(parse_timestamp(" 1 : 02 : 03 ").unwrap(), 3723.0);
    }

    #[test]
    fn test_parse_timestamp_passes_negatives_through() {
        assert_eq!(parse_timestamp("-5").unwrap(), -5.0);
        assert_eq!(parse_timestamp("-1:00").unwrap(), -60.0);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::InvalidValue(_, _))));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue(_, _))));
        assert!(matches!(parse_timestamp("1:xx"), Err(TimestampError::InvalidValue("seconds", _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_timestamp("inf"), Err(TimestampError::InvalidValue(_, _))));
        assert!(matches!(parse_timestamp("NaN"), Err(TimestampError::InvalidValue(_, _))));
    }

    #[test]
    fn test_parse_timestamp_rejects_overflowing_total() {
        assert!(matches!(parse_timestamp("1e308:00"), Err(TimestampError::OutOfRange(_))));
        assert!(matches!(parse_timestamp("1e308:0:0"), Err(TimestampError::OutOfRange(_))));
        assert!(matches!(parse_timestamp("0:1e308:0"), Err(TimestampError::OutOfRange(_))));
        assert!(parse_timestamp("1e300:00").unwrap().is_finite());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.0), "01:01:01");
        assert_eq!(format_seconds(12.5), "00:00:12.500");
    }
}
