//! `H:MM:SS` timecodes used on the command line and by the download tools.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimecodeError {
    #[error("Empty timecode")]
    Empty,

    #[error("Timecode '{0}' has too many components (expected HH:MM:SS)")]
    TooManyParts(String),

    #[error("Timecode '{input}' has an invalid component '{part}'")]
    InvalidPart { input: String, part: String },

    #[error("Timecode '{input}' has out-of-range minutes or seconds")]
    OutOfRange { input: String },
}

/// Format seconds as `H:MM:SS` (hours are not zero-padded)
pub fn format_timecode(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse `HH:MM:SS`, `MM:SS` or plain seconds
pub fn parse_timecode(input: &str) -> Result<u64, TimecodeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimecodeError::Empty);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(TimecodeError::TooManyParts(input.to_string()));
    }

    let mut values = Vec::with_capacity(parts.len());
    for part in &parts {
        let value: u64 = part.parse().map_err(|_| TimecodeError::InvalidPart {
            input: input.to_string(),
            part: part.to_string(),
        })?;
        values.push(value);
    }

    // Leading component is unbounded; the rest must fit a clock face
    if values.iter().skip(1).any(|v| *v >= 60) {
        return Err(TimecodeError::OutOfRange {
            input: input.to_string(),
        });
    }

    Ok(values.iter().fold(0, |acc, v| acc * 60 + v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format_timecode(0), "0:00:00");
        assert_eq!(format_timecode(85), "0:01:25");
        assert_eq!(format_timecode(5520), "1:32:00");
        assert_eq!(format_timecode(36_061), "10:01:01");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_timecode("01:32:00"), Ok(5520));
        assert_eq!(parse_timecode("2:46:00"), Ok(9960));
        assert_eq!(parse_timecode("01:05"), Ok(65));
        assert_eq!(parse_timecode("90"), Ok(90));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_timecode("  "), Err(TimecodeError::Empty));
        assert!(matches!(
            parse_timecode("1:2:3:4"),
            Err(TimecodeError::TooManyParts(_))
        ));
        assert!(matches!(
            parse_timecode("1:xx:00"),
            Err(TimecodeError::InvalidPart { .. })
        ));
        assert!(matches!(
            parse_timecode("1:61:00"),
            Err(TimecodeError::OutOfRange { .. })
        ));
    }
}
