//! Keyframe String Codec
//!
//! Animated filter parameters are stored as one string of semicolon separated
//! `time=value` pairs, where the `=` may be prefixed with `~` (smooth) or `|`
//! (discrete). Interpolation markers are accepted and discarded.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::mlt::timecode::parse_time;
use crate::types::RationalTime;

fn keyframe_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([^|~=;]*)[|~]?=([^;]*)").expect("keyframe pattern is a valid regex")
    })
}

/// Decodes a keyframe string into time/value pairs, in string order.
///
/// Values stay raw strings. A pair whose time does not decode is skipped; a
/// repeated time replaces the earlier value.
pub fn parse_keyframes(kfstring: &str, rate: f64) -> Vec<(RationalTime, String)> {
    let mut keyframes: Vec<(RationalTime, String)> = Vec::new();
    for capture in keyframe_pattern().captures_iter(kfstring) {
        let time = match parse_time(&capture[1], rate) {
            Ok(time) => time,
            Err(_) => {
                warn!(entry = &capture[1], "skipping keyframe with unreadable time");
                continue;
            }
        };
        match keyframes.iter_mut().find(|(t, _)| *t == time) {
            Some((_, value)) => *value = capture[2].to_string(),
            None => keyframes.push((time, capture[2].to_string())),
        }
    }
    keyframes
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_linear_keyframes() {
        let kf = parse_keyframes("0=0;50=100", 25.0);
        assert_eq!(
            kf,
            vec![
                (RationalTime::new(0.0, 25.0), "0".to_string()),
                (RationalTime::new(50.0, 25.0), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_mixed_interpolation_markers() {
        let kf = parse_keyframes("0=0;25~=100;50|=50", 25.0);
        assert_eq!(kf.len(), 3);
        assert_eq!(kf[0], (RationalTime::new(0.0, 25.0), "0".to_string()));
        assert_eq!(kf[1], (RationalTime::new(25.0, 25.0), "100".to_string()));
        assert_eq!(kf[2], (RationalTime::new(50.0, 25.0), "50".to_string()));
    }

    #[test]
    fn test_parse_timecode_keys() {
        let kf = parse_keyframes("00:00:01.000=0.5", 25.0);
        assert_eq!(kf, vec![(RationalTime::new(25.0, 25.0), "0.5".to_string())]);
    }

    #[test]
    fn test_duplicate_time_replaces_value() {
        let kf = parse_keyframes("10=1;10=2", 25.0);
        assert_eq!(kf, vec![(RationalTime::new(10.0, 25.0), "2".to_string())]);
    }

    #[test]
    fn test_unreadable_entry_is_skipped() {
        let kf = parse_keyframes("0=0;bogus=1;50=100", 25.0);
        assert_eq!(kf.len(), 2);
        assert_eq!(kf[1], (RationalTime::new(50.0, 25.0), "100".to_string()));
    }

    #[test]
    fn test_empty_string_yields_no_keyframes() {
        assert!(parse_keyframes("", 25.0).is_empty());
    }
}
