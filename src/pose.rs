//! Head orientation samples and the neutral reference they are measured against.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One rotational axis of the head
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Looking up/down
    Pitch,
    /// Looking left/right
    Yaw,
    /// Tilting the head towards a shoulder
    Roll,
}

impl Axis {
    /// All axes in processing order
    pub const ALL: [Self; 3] = [Self::Pitch, Self::Yaw, Self::Roll];

    /// Lowercase name used in configuration keys
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pitch => "pitch",
            Self::Yaw => "yaw",
            Self::Roll => "roll",
        }
    }

    /// Position of the axis in [`Axis::ALL`]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Pitch => 0,
            Self::Yaw => 1,
            Self::Roll => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pitch" => Ok(Self::Pitch),
            "yaw" => Ok(Self::Yaw),
            "roll" => Ok(Self::Roll),
            other => Err(Error::InvalidInput(format!("Unknown axis: {other}"))),
        }
    }
}

/// Instantaneous head orientation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Rotation about the lateral axis
    pub pitch: f64,
    /// Rotation about the vertical axis
    pub yaw: f64,
    /// Rotation about the viewing axis
    pub roll: f64,
}

impl Pose {
    /// Create a pose from its three angles
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Angle of a single axis
    #[must_use]
    pub const fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Yaw => self.yaw,
            Axis::Roll => self.roll,
        }
    }

    /// Replace the angle of a single axis
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::Pitch => self.pitch = value,
            Axis::Yaw => self.yaw = value,
            Axis::Roll => self.roll = value,
        }
    }

    /// Express this pose relative to a neutral reference
    #[must_use]
    pub fn relative_to(&self, neutral: &NeutralOffsets) -> Self {
        Self {
            pitch: self.pitch - neutral.pitch,
            yaw: self.yaw - neutral.yaw,
            roll: self.roll - neutral.roll,
        }
    }
}

/// Pose reading treated as zero for each axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralOffsets {
    /// Neutral pitch offset
    pub pitch: f64,
    /// Neutral yaw offset
    pub yaw: f64,
    /// Neutral roll offset
    pub roll: f64,
}

impl NeutralOffsets {
    /// Offset of a single axis
    #[must_use]
    pub const fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Pitch => self.pitch,
            Axis::Yaw => self.yaw,
            Axis::Roll => self.roll,
        }
    }
}

impl From<Pose> for NeutralOffsets {
    fn from(pose: Pose) -> Self {
        Self {
            pitch: pose.pitch,
            yaw: pose.yaw,
            roll: pose.roll,
        }
    }
}
