//! Per-axis mapping configuration and the operations that mutate it.

use crate::{
    constants::{DEFAULT_INPUT_MAX, DEFAULT_INPUT_MIN, MIDI_CHANNEL_MAX, MIDI_DATA_MAX},
    mapping::map_value,
    pose::Axis,
    utils::safe_cast::i64_to_u8_clamp,
    Error, Result,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which end of an input range a sample defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// Lower input bound
    Min,
    /// Upper input bound
    Max,
}

/// Mapping from one head axis to one MIDI controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    /// Whether this axis produces MIDI output
    pub enabled: bool,
    /// Angle mapped to `output_min`, in degrees
    pub input_min: f64,
    /// Angle mapped to `output_max`, in degrees
    pub input_max: f64,
    /// MIDI value at the lower end of the range
    pub output_min: u8,
    /// MIDI value at the upper end of the range
    pub output_max: u8,
    /// Control Change number
    pub cc_number: u8,
    /// Zero-based MIDI channel
    pub channel: u8,
}

impl AxisCalibration {
    /// Built-in defaults for an axis
    ///
    /// Pitch drives the modulation wheel (CC 1), yaw the breath controller
    /// (CC 2) and roll the undefined CC 3, all on channel 0.
    #[must_use]
    pub const fn default_for(axis: Axis) -> Self {
        let cc_number = match axis {
            Axis::Pitch => 1,
            Axis::Yaw => 2,
            Axis::Roll => 3,
        };
        Self {
            enabled: true,
            input_min: DEFAULT_INPUT_MIN,
            input_max: DEFAULT_INPUT_MAX,
            output_min: 0,
            output_max: MIDI_DATA_MAX,
            cc_number,
            channel: 0,
        }
    }

    /// Write one input bound directly; ordering is not enforced here
    pub fn set_bound(&mut self, bound: Bound, value: f64) {
        match bound {
            Bound::Min => self.input_min = value,
            Bound::Max => self.input_max = value,
        }
    }

    /// Restore the built-in defaults for `axis`
    pub fn reset_to_default(&mut self, axis: Axis) {
        *self = Self::default_for(axis);
    }

    /// Read one field
    #[must_use]
    pub fn get(&self, field: AxisField) -> FieldValue {
        match field {
            AxisField::Enabled => FieldValue::Bool(self.enabled),
            AxisField::InputMin => FieldValue::Float(self.input_min),
            AxisField::InputMax => FieldValue::Float(self.input_max),
            AxisField::OutputMin => FieldValue::Int(i64::from(self.output_min)),
            AxisField::OutputMax => FieldValue::Int(i64::from(self.output_max)),
            AxisField::CcNumber => FieldValue::Int(i64::from(self.cc_number)),
            AxisField::Channel => FieldValue::Int(i64::from(self.channel)),
        }
    }

    /// Write one field.
    ///
    /// Integer fields are clamped into MIDI range (0-127, channel 0-15) with
    /// a warning; integers are accepted for float fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the value type does not fit the field
    pub fn set_field(&mut self, field: AxisField, value: FieldValue) -> Result<()> {
        match (field, value) {
            (AxisField::Enabled, FieldValue::Bool(b)) => self.enabled = b,
            (AxisField::InputMin, v) => self.input_min = v.as_float(field)?,
            (AxisField::InputMax, v) => self.input_max = v.as_float(field)?,
            (AxisField::OutputMin, FieldValue::Int(i)) => self.output_min = clamp_field(field, i, MIDI_DATA_MAX),
            (AxisField::OutputMax, FieldValue::Int(i)) => self.output_max = clamp_field(field, i, MIDI_DATA_MAX),
            (AxisField::CcNumber, FieldValue::Int(i)) => self.cc_number = clamp_field(field, i, MIDI_DATA_MAX),
            (AxisField::Channel, FieldValue::Int(i)) => self.channel = clamp_field(field, i, MIDI_CHANNEL_MAX),
            (field, value) => {
                return Err(Error::InvalidInput(format!(
                    "Field '{field}' cannot hold {value:?}"
                )))
            }
        }
        Ok(())
    }

    /// Clamp the byte fields into MIDI range, returning true if anything changed
    pub fn sanitize(&mut self) -> bool {
        let before = *self;
        self.output_min = self.output_min.min(MIDI_DATA_MAX);
        self.output_max = self.output_max.min(MIDI_DATA_MAX);
        self.cc_number = self.cc_number.min(MIDI_DATA_MAX);
        self.channel = self.channel.min(MIDI_CHANNEL_MAX);
        before != *self
    }

    /// Map an angle (already relative to neutral) to a MIDI value
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // bounded by output_min/output_max
    pub fn map(&self, value: f64) -> u8 {
        map_value(
            value,
            self.input_min,
            self.input_max,
            i32::from(self.output_min),
            i32::from(self.output_max),
        ) as u8
    }
}

pub(crate) fn clamp_field(field: AxisField, value: i64, max: u8) -> u8 {
    let clamped = i64_to_u8_clamp(value, max);
    if i64::from(clamped) != value {
        warn!("{field} value {value} out of range, clamped to {clamped}");
    }
    clamped
}

/// Editable field of an [`AxisCalibration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisField {
    /// `enabled`
    Enabled,
    /// `input_min`
    InputMin,
    /// `input_max`
    InputMax,
    /// `output_min`
    OutputMin,
    /// `output_max`
    OutputMax,
    /// `cc_number`
    CcNumber,
    /// `channel`
    Channel,
}

impl AxisField {
    /// Every editable field
    pub const ALL: [Self; 7] = [
        Self::Enabled,
        Self::InputMin,
        Self::InputMax,
        Self::OutputMin,
        Self::OutputMax,
        Self::CcNumber,
        Self::Channel,
    ];

    /// Configuration key of the field
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::InputMin => "input_min",
            Self::InputMax => "input_max",
            Self::OutputMin => "output_min",
            Self::OutputMax => "output_max",
            Self::CcNumber => "cc_number",
            Self::Channel => "channel",
        }
    }

    /// Largest value a MIDI byte field accepts, `None` for non-MIDI fields
    #[must_use]
    pub const fn midi_max(self) -> Option<u8> {
        match self {
            Self::OutputMin | Self::OutputMax | Self::CcNumber => Some(MIDI_DATA_MAX),
            Self::Channel => Some(MIDI_CHANNEL_MAX),
            Self::Enabled | Self::InputMin | Self::InputMax => None,
        }
    }
}

impl fmt::Display for AxisField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AxisField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s.trim())
            .ok_or_else(|| Error::InvalidInput(format!("Unknown axis field: {s}")))
    }
}

/// Dynamically typed field value used by manual edits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// Flag value
    Bool(bool),
    /// Angle value
    Float(f64),
    /// Byte-sized MIDI value
    Int(i64),
}

impl FieldValue {
    #[allow(clippy::cast_precision_loss)] // MIDI-sized integers are exact in f64
    fn as_float(self, field: AxisField) -> Result<f64> {
        match self {
            Self::Float(f) => Ok(f),
            Self::Int(i) => Ok(i as f64),
            Self::Bool(_) => Err(Error::InvalidInput(format!("Field '{field}' expects a number"))),
        }
    }
}

impl FromStr for FieldValue {
    type Err = Error;

    /// Parse `true`/`false`, an integer, or a float, in that order
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(b) = s.parse::<bool>() {
            return Ok(Self::Bool(b));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Self::Int(i));
        }
        s.parse::<f64>()
            .map(Self::Float)
            .map_err(|_| Error::InvalidInput(format!("Cannot parse field value: {s}")))
    }
}

/// Calibration for all three axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSet {
    /// Pitch axis mapping
    pub pitch: AxisCalibration,
    /// Yaw axis mapping
    pub yaw: AxisCalibration,
    /// Roll axis mapping
    pub roll: AxisCalibration,
}

impl Default for CalibrationSet {
    fn default() -> Self {
        Self {
            pitch: AxisCalibration::default_for(Axis::Pitch),
            yaw: AxisCalibration::default_for(Axis::Yaw),
            roll: AxisCalibration::default_for(Axis::Roll),
        }
    }
}

impl CalibrationSet {
    /// Calibration of one axis
    #[must_use]
    pub const fn get(&self, axis: Axis) -> &AxisCalibration {
        match axis {
            Axis::Pitch => &self.pitch,
            Axis::Yaw => &self.yaw,
            Axis::Roll => &self.roll,
        }
    }

    /// Mutable calibration of one axis
    pub fn get_mut(&mut self, axis: Axis) -> &mut AxisCalibration {
        match axis {
            Axis::Pitch => &mut self.pitch,
            Axis::Yaw => &mut self.yaw,
            Axis::Roll => &mut self.roll,
        }
    }

    /// Iterate axes with their calibration in processing order
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisCalibration)> {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }
}
