//! MLT Timecode Codec
//!
//! MLT time attributes are either a bare frame count ("125") or a colon
//! separated timecode ("00:00:05.000", comma accepted as the decimal mark for
//! locale tolerance). Both decode to a [`RationalTime`] at the project rate.

use crate::error::{MltError, MltResult};
use crate::types::{FrameRatio, RationalTime};

/// Decodes an MLT time string at the given frame rate.
///
/// Segments are weighted right to left: the innermost segment is frames when
/// the string has no colon, otherwise seconds, with each outer segment worth
/// sixty of the next. The result is rounded to thousandths of a frame.
pub fn parse_time(clock: &str, rate: f64) -> MltResult<RationalTime> {
    let normalized = clock.replace(',', ".");
    let segments: Vec<&str> = normalized.split(':').collect();

    // A single segment with no separator is a raw frame count.
    let mut multiplier = if segments.len() > 1 { rate } else { 1.0 };
    let mut frames = 0.0;
    for segment in segments.iter().rev() {
        let value: f64 = segment
            .trim()
            .parse()
            .map_err(|_| MltError::InvalidTimecode(clock.to_string()))?;
        frames += value * multiplier;
        multiplier *= 60.0;
    }

    Ok(RationalTime::new((frames * 1000.0).round() / 1000.0, rate))
}

/// Exact numerator/denominator pair for a frame rate.
///
/// The three NTSC fractional rates map to their 1001-denominator forms;
/// every other rate is rounded to an integer over 1.
pub fn rate_to_ratio(rate: f64) -> FrameRatio {
    match (rate * 100.0).round() as i64 {
        2398 => FrameRatio::new(24000, 1001),
        2997 => FrameRatio::new(30000, 1001),
        5994 => FrameRatio::new(60000, 1001),
        _ => FrameRatio::new(rate.round() as i64, 1),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_timecode() {
        // 3h 25m 15.25s at 25 fps.
        let t = parse_time("3:25:15.250", 25.0).unwrap();
        assert_eq!(t, RationalTime::new(307881.25, 25.0));
    }

    #[test]
    fn test_parse_comma_decimal_mark() {
        let t = parse_time("00:00:05,500", 25.0).unwrap();
        assert_eq!(t, RationalTime::new(137.5, 25.0));
    }

    #[test]
    fn test_parse_bare_frame_count() {
        let t = parse_time("125", 25.0).unwrap();
        assert_eq!(t, RationalTime::new(125.0, 25.0));
    }

    #[test]
    fn test_parse_fractional_frame_count() {
        // No colon means frames, even with a decimal part.
        let t = parse_time("15.5", 25.0).unwrap();
        assert_eq!(t, RationalTime::new(15.5, 25.0));
    }

    #[test]
    fn test_parse_minutes_seconds() {
        let t = parse_time("1:30", 30.0).unwrap();
        assert_eq!(t, RationalTime::new(2700.0, 30.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_time("abc", 25.0),
            Err(MltError::InvalidTimecode(_))
        ));
        assert!(matches!(
            parse_time("00:xx:05", 25.0),
            Err(MltError::InvalidTimecode(_))
        ));
    }

    #[test]
    fn test_rate_to_ratio_ntsc() {
        assert_eq!(rate_to_ratio(23.98), FrameRatio::new(24000, 1001));
        assert_eq!(rate_to_ratio(29.97), FrameRatio::new(30000, 1001));
        assert_eq!(rate_to_ratio(59.94), FrameRatio::new(60000, 1001));
    }

    #[test]
    fn test_rate_to_ratio_integer() {
        assert_eq!(rate_to_ratio(25.0), FrameRatio::new(25, 1));
        assert_eq!(rate_to_ratio(24.0), FrameRatio::new(24, 1));
        assert_eq!(rate_to_ratio(30.0), FrameRatio::new(30, 1));
    }
}
