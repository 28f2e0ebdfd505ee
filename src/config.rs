//! Threshold configuration: three temperature bands mapped to LED colors.
//!
//! The table is owned by the classifier and replaced wholesale whenever the
//! operator posts a new one — never field-mutated in place, so a reader can
//! never observe a half-updated set of bands.
//!
//! The legacy operator UI never checked that bands were ordered; here the
//! HTTP ingest path rejects inverted or out-of-order bands before anything
//! reaches the classifier. The classifier itself tolerates any table it is
//! handed (overlaps resolve high-first, gaps fall back to the low color).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One 8-bit-per-channel LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A contiguous temperature sub-range mapped to one indicator color.
/// Bounds are inclusive on both ends, matching the deployed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub lower: i32,
    pub upper: i32,
    pub color: Rgb,
}

impl Band {
    pub const fn new(lower: i32, upper: i32, color: Rgb) -> Self {
        Self { lower, upper, color }
    }

    /// Whether `t` falls inside this band.
    pub fn contains(&self, t: f32) -> bool {
        t >= self.lower as f32 && t <= self.upper as f32
    }
}

/// The active mapping from temperature sub-ranges to indicator colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub low: Band,
    pub medium: Band,
    pub high: Band,
}

impl Default for ThresholdConfig {
    /// Hard-coded boot-time table, in force until the operator posts one.
    fn default() -> Self {
        Self {
            low: Band::new(-40, 18, Rgb::new(0, 0, 255)),
            medium: Band::new(19, 27, Rgb::new(0, 255, 0)),
            high: Band::new(28, 85, Rgb::new(255, 0, 0)),
        }
    }
}

impl ThresholdConfig {
    /// Validate band geometry before the table is allowed near the classifier.
    ///
    /// Each band must have `lower <= upper`, and the bands must be ordered
    /// `low.upper <= medium.lower` and `medium.upper <= high.lower`. Gaps
    /// between bands are fine — unmatched readings map to the low color.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low.lower > self.low.upper {
            return Err(ConfigError::InvertedBand("low"));
        }
        if self.medium.lower > self.medium.upper {
            return Err(ConfigError::InvertedBand("medium"));
        }
        if self.high.lower > self.high.upper {
            return Err(ConfigError::InvertedBand("high"));
        }
        if self.low.upper > self.medium.lower {
            return Err(ConfigError::UnorderedBands("low overlaps medium"));
        }
        if self.medium.upper > self.high.lower {
            return Err(ConfigError::UnorderedBands("medium overlaps high"));
        }
        Ok(())
    }
}
