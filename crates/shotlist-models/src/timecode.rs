//! Fixed-frame-rate timecode formatting and parsing.
//!
//! Timecodes are rendered as `HH:MM:SS:FF` where `FF` is the frame number
//! within the second. The frame rate is an assumption supplied by the
//! caller, it is never read from the source media.

/// Frame rate assumed when none is configured.
pub const DEFAULT_FPS: u32 = 30;

/// Format seconds as an `HH:MM:SS:FF` timecode at `fps`.
///
/// The total frame count is `round(seconds * fps)`; negative and non-finite
/// input clamps to zero.
///
/// # Examples
/// ```
/// use shotlist_models::timecode::to_timecode;
/// assert_eq!(to_timecode(0.0, 30), "00:00:00:00");
/// assert_eq!(to_timecode(45.5, 30), "00:00:45:15");
/// assert_eq!(to_timecode(3661.0, 30), "01:01:01:00");
/// ```
pub fn to_timecode(seconds: f64, fps: u32) -> String {
    let fps = fps.max(1) as u64;
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

    let total_frames = (seconds * fps as f64).round() as u64;
    let frames = total_frames % fps;
    let total_secs = total_frames / fps;

    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    format!("{:02}:{:02}:{:02}:{:02}", hours, mins, secs, frames)
}

/// Parse an `HH:MM:SS:FF` timecode back into seconds at `fps`.
///
/// # Examples
/// ```
/// use shotlist_models::timecode::from_timecode;
/// assert_eq!(from_timecode("00:00:10:00", 30).unwrap(), 10.0);
/// assert_eq!(from_timecode("00:01:00:15", 30).unwrap(), 60.5);
/// ```
pub fn from_timecode(tc: &str, fps: u32) -> Result<f64, TimecodeError> {
    let tc = tc.trim();
    if tc.is_empty() {
        return Err(TimecodeError::Empty);
    }

    let parts: Vec<&str> = tc.split(':').collect();
    if parts.len() != 4 {
        return Err(TimecodeError::InvalidFormat(tc.to_string()));
    }

    let field = |name: &'static str, raw: &str| -> Result<u64, TimecodeError> {
        raw.parse::<u64>()
            .map_err(|_| TimecodeError::InvalidValue(name, raw.to_string()))
    };

    let hours = field("hours", parts[0])?;
    let mins = field("minutes", parts[1])?;
    let secs = field("seconds", parts[2])?;
    let frames = field("frames", parts[3])?;

    if mins >= 60 {
        return Err(TimecodeError::OutOfRange("minutes", mins));
    }
    if secs >= 60 {
        return Err(TimecodeError::OutOfRange("seconds", secs));
    }
    let fps = fps.max(1) as u64;
    if frames >= fps {
        return Err(TimecodeError::OutOfRange("frames", frames));
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(mins * 60 + secs))
        .ok_or(TimecodeError::OutOfRange("hours", hours))?;
    Ok(whole as f64 + frames as f64 / fps as f64)
}

/// Timecode parsing error.
#[derive(Debug, Clone, PartialEq)]
pub enum TimecodeError {
    /// Timecode string is empty
    Empty,
    /// Not four colon-separated fields
    InvalidFormat(String),
    /// A field is not a non-negative integer
    InvalidValue(&'static str, String),
    /// A field exceeds its range (minutes/seconds < 60, frames < fps)
    OutOfRange(&'static str, u64),
}

impl std::fmt::Display for TimecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timecode cannot be empty"),
            Self::InvalidFormat(tc) => {
                write!(f, "Invalid timecode format '{}'. Use HH:MM:SS:FF", tc)
            }
            Self::InvalidValue(component, value) => {
                write!(f, "Invalid {} value: {}", component, value)
            }
            Self::OutOfRange(component, value) => {
                write!(f, "{} value {} is out of range", component, value)
            }
        }
    }
}

impl std::error::Error for TimecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_timecode_zero_padding() {
        assert_eq!(to_timecode(0.0, 30), "00:00:00:00");
        assert_eq!(to_timecode(10.0, 30), "00:00:10:00");
        assert_eq!(to_timecode(30.0, 30), "00:00:30:00");
        assert_eq!(to_timecode(45.0, 30), "00:00:45:00");
        assert_eq!(to_timecode(60.0, 30), "00:01:00:00");
    }

    #[test]
    fn test_to_timecode_frames() {
        assert_eq!(to_timecode(1.5, 30), "00:00:01:15");
        assert_eq!(to_timecode(2.0 + 1.0 / 30.0, 30), "00:00:02:01");
        assert_eq!(to_timecode(1.48, 25), "00:00:01:12");
    }

    #[test]
    fn test_to_timecode_rounds_up_into_next_second() {
        // 59.99s is 1799.7 frames which rounds to a whole minute
        assert_eq!(to_timecode(59.99, 30), "00:01:00:00");
    }

    #[test]
    fn test_to_timecode_clamps_invalid_input() {
        assert_eq!(to_timecode(-4.0, 30), "00:00:00:00");
        assert_eq!(to_timecode(f64::NAN, 30), "00:00:00:00");
        assert_eq!(to_timecode(f64::INFINITY, 30), "00:00:00:00");
    }

    #[test]
    fn test_from_timecode() {
        assert_eq!(from_timecode("00:00:00:00", 30).unwrap(), 0.0);
        assert_eq!(from_timecode("01:01:01:00", 30).unwrap(), 3661.0);
        assert!((from_timecode("00:00:01:15", 30).unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_from_timecode_errors() {
        assert_eq!(from_timecode("", 30), Err(TimecodeError::Empty));
        assert!(matches!(
            from_timecode("00:00:10", 30),
            Err(TimecodeError::InvalidFormat(_))
        ));
        assert!(matches!(
            from_timecode("00:xx:10:00", 30),
            Err(TimecodeError::InvalidValue("minutes", _))
        ));
        assert_eq!(
            from_timecode("00:00:10:30", 30),
            Err(TimecodeError::OutOfRange("frames", 30))
        );
        assert_eq!(
            from_timecode("00:61:00:00", 30),
            Err(TimecodeError::OutOfRange("minutes", 61))
        );
    }

    #[test]
    fn test_from_timecode_huge_hours() {
        assert_eq!(
            from_timecode("99999999999999999:00:00:00", 30),
            Err(TimecodeError::OutOfRange("hours", 99_999_999_999_999_999))
        );
        assert_eq!(
            from_timecode("1000:00:00:00", 30).unwrap(),
            3_600_000.0
        );
    }

    #[test]
    fn test_round_trip_within_one_frame() {
        let fps = 30;
        let tolerance = 1.0 / fps as f64;
        let mut seconds = 0.0;
        while seconds < 86_400.0 {
            let tc = to_timecode(seconds, fps);
            let back = from_timecode(&tc, fps).unwrap();
            assert!(
                (back - seconds).abs() <= tolerance,
                "{} -> {} -> {}",
                seconds,
                tc,
                back
            );
            seconds += 7.123_456;
        }
    }

    #[test]
    fn test_round_trip_near_day_boundary() {
        let back = from_timecode(&to_timecode(86_399.99, 30), 30).unwrap();
        assert!((back - 86_399.99).abs() <= 1.0 / 30.0);
    }
}
