//! Core Time Type Definitions
//!
//! Defines the rational-time primitives shared by the timeline model and the
//! MLT adapter: frame counts paired with a frame rate, time ranges, and the
//! exact numerator/denominator rate pairs used by profile headers.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Rational Time
// =============================================================================

/// A frame count paired with a frame rate.
///
/// The value may be fractional (the MLT dialect carries times to thousandths
/// of a frame). Arithmetic is rate-consistent: the right operand is rescaled
/// to the left operand's rate before the frame counts are combined.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RationalTime {
    /// Frame count, possibly fractional
    pub value: f64,
    /// Frames per second
    pub rate: f64,
}

impl RationalTime {
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    /// Returns an equivalent time expressed at another rate.
    pub fn rescaled_to(&self, rate: f64) -> Self {
        if self.rate == rate || self.rate == 0.0 {
            return Self { value: self.value, rate };
        }
        Self {
            value: self.value * rate / self.rate,
            rate,
        }
    }

    /// Whole-frame count, truncated toward zero.
    ///
    /// The MLT dialect accepts raw frame integers for `in`/`out`/`length`
    /// attributes, so this is all the writer needs.
    pub fn to_frames(&self) -> i64 {
        self.value.trunc() as i64
    }
}

impl Add for RationalTime {
    type Output = RationalTime;

    fn add(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescaled_to(self.rate);
        RationalTime::new(self.value + rhs.value, self.rate)
    }
}

impl Sub for RationalTime {
    type Output = RationalTime;

    fn sub(self, rhs: RationalTime) -> RationalTime {
        let rhs = rhs.rescaled_to(self.rate);
        RationalTime::new(self.value - rhs.value, self.rate)
    }
}

// =============================================================================
// Time Range
// =============================================================================

/// A span of time: start plus duration, both rational.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    pub fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self {
            start_time,
            duration,
        }
    }

    /// Returns the first time past the end of the range.
    pub fn end_time_exclusive(&self) -> RationalTime {
        self.start_time + self.duration
    }
}

// =============================================================================
// Frame Ratio
// =============================================================================

/// An exact frame-rate ratio (e.g. 30000/1001 for 29.97 NTSC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRatio {
    /// Numerator
    pub num: i64,
    /// Denominator
    pub den: i64,
}

impl FrameRatio {
    /// Creates a new ratio with validation
    pub fn new(num: i64, den: i64) -> Self {
        if den == 0 {
            warn!("FrameRatio created with zero denominator, defaulting to 1");
            return Self { num, den: 1 };
        }
        Self { num, den }
    }

    /// Converts to floating point value
    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_time_add_same_rate() {
        let a = RationalTime::new(25.0, 25.0);
        let b = RationalTime::new(50.0, 25.0);
        assert_eq!(a + b, RationalTime::new(75.0, 25.0));
    }

    #[test]
    fn test_rational_time_sub_same_rate() {
        let a = RationalTime::new(50.0, 25.0);
        let b = RationalTime::new(25.0, 25.0);
        assert_eq!(a - b, RationalTime::new(25.0, 25.0));
    }

    #[test]
    fn test_rational_time_arithmetic_rescales_rhs() {
        // 25 frames at 25fps is one second, i.e. 30 frames at 30fps.
        let a = RationalTime::new(30.0, 30.0);
        let b = RationalTime::new(25.0, 25.0);
        assert_eq!(a + b, RationalTime::new(60.0, 30.0));
    }

    #[test]
    fn test_to_frames_truncates() {
        assert_eq!(RationalTime::new(10.9, 25.0).to_frames(), 10);
        assert_eq!(RationalTime::new(10.0, 25.0).to_frames(), 10);
        assert_eq!(RationalTime::new(0.25, 25.0).to_frames(), 0);
    }

    #[test]
    fn test_time_range_end() {
        let range = TimeRange::new(
            RationalTime::new(10.0, 25.0),
            RationalTime::new(40.0, 25.0),
        );
        assert_eq!(range.end_time_exclusive(), RationalTime::new(50.0, 25.0));
    }

    #[test]
    fn test_frame_ratio_as_f64() {
        assert!((FrameRatio::new(30000, 1001).as_f64() - 29.97).abs() < 0.01);
        assert_eq!(FrameRatio::new(25, 1).as_f64(), 25.0);
    }

    #[test]
    fn test_frame_ratio_zero_denominator() {
        let ratio = FrameRatio::new(30, 0);
        assert_eq!(ratio.den, 1);
    }

    #[test]
    fn test_rational_time_serialization() {
        let t = RationalTime::new(308637.25, 25.0);
        let json = serde_json::to_string(&t).unwrap();
        let parsed: RationalTime = serde_json::from_str(&json).unwrap();
        assert_eq!(t, parsed);
    }
}
