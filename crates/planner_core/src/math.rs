//! Fixed-point math and game-clock utilities.
//!
//! Resource and energy accounting uses fixed-point arithmetic so that
//! re-running the same build order always produces bit-identical results.
//! Rational constants are built from integer ratios, never from floats.

use fixed::types::I32F32;

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Numerator of the frame rate (22.4 = 112 / 5 frames per second).
pub const FRAMES_PER_SECOND_NUM: u32 = 112;

/// Denominator of the frame rate.
pub const FRAMES_PER_SECOND_DEN: u32 = 5;

/// Build a fixed-point value from an integer ratio.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// Convert whole seconds to frames, rounding to the nearest frame.
///
/// Saturates at `u32::MAX` frames.
#[must_use]
pub const fn seconds_to_frames(seconds: u32) -> u32 {
    // seconds * 22.4, rounded half up
    let doubled = (seconds as u64) * (FRAMES_PER_SECOND_NUM as u64) * 2 + FRAMES_PER_SECOND_DEN as u64;
    let frames = doubled / (FRAMES_PER_SECOND_DEN as u64 * 2);
    if frames > u32::MAX as u64 {
        u32::MAX
    } else {
        frames as u32
    }
}

/// Convert a per-second rate to a per-frame rate.
#[must_use]
pub fn per_frame(rate_per_second: Fixed) -> Fixed {
    rate_per_second * Fixed::from_num(FRAMES_PER_SECOND_DEN)
        / Fixed::from_num(FRAMES_PER_SECOND_NUM)
}

/// Whole seconds elapsed at the given frame (truncated).
#[must_use]
pub const fn frames_to_seconds(frames: u32) -> u32 {
    ((frames as u64) * (FRAMES_PER_SECOND_DEN as u64) / (FRAMES_PER_SECOND_NUM as u64)) as u32
}

/// Format a frame as an `m:ss` game clock.
#[must_use]
pub fn format_clock(frames: u32) -> String {
    let seconds = frames_to_seconds(frames);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}
