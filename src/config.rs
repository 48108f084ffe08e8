//! Configuration management for the head pose to MIDI mapper

use crate::{
    calibration::{clamp_field, AxisCalibration, AxisField, Bound, CalibrationSet, FieldValue},
    constants::{
        DEFAULT_FPS, DEFAULT_JUMP_THRESHOLD, DEFAULT_SMOOTHING_FACTOR, DEFAULT_VIRTUAL_PORT_NAME, SMOOTHING_FACTOR_MAX,
        SMOOTHING_FACTOR_MIN,
    },
    filters::roll::RollFilter,
    pose::{Axis, NeutralOffsets},
    Error, Result,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Configuration shared between the tracking loop and the calibration wizard
pub type SharedConfig = Arc<Mutex<Config>>;

/// Lock the shared configuration, recovering from a poisoned lock
pub fn lock_config(shared: &SharedConfig) -> MutexGuard<'_, Config> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-axis calibration, stored as top-level `pitch`, `yaw` and `roll` sections
    #[serde(flatten)]
    pub axes: CalibrationSet,

    /// Pose reading treated as zero
    pub neutral: NeutralOffsets,

    /// Roll filter configuration
    pub filter: FilterConfig,

    /// Camera parameters for the external capture stage
    pub camera: CameraConfig,

    /// MIDI output configuration
    pub midi: MidiConfig,
}

/// Roll filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Exponential smoothing factor in (0, 1]
    pub smoothing_factor: f64,

    /// Frame-to-frame change in degrees rejected as a glitch
    pub jump_threshold: f64,
}

/// Camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index
    pub device_id: u32,

    /// Frame width
    pub width: u32,

    /// Frame height
    pub height: u32,

    /// Target frame rate; also paces the tracking loop
    pub fps: u32,
}

/// MIDI output parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Output port to open; a virtual port is created when absent
    pub port_index: Option<usize>,

    /// Name of the virtual output port
    pub virtual_port_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            axes: CalibrationSet::default(),
            neutral: NeutralOffsets::default(),
            filter: FilterConfig::default(),
            camera: CameraConfig::default(),
            midi: MidiConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            jump_threshold: DEFAULT_JUMP_THRESHOLD,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: DEFAULT_FPS,
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port_index: None,
            virtual_port_name: DEFAULT_VIRTUAL_PORT_NAME.to_string(),
        }
    }
}

fn smoothing_factor_in_range(alpha: f64) -> bool {
    alpha > SMOOTHING_FACTOR_MIN && alpha <= SMOOTHING_FACTOR_MAX
}

/// Recursively overlay `overlay` onto `base`.
///
/// Mappings are merged key by key; any other value replaces the base value.
/// A null overlay keeps the base value.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Clamp integer MIDI fields of every axis section in a YAML document.
///
/// Values outside the byte range, such as `channel: 300` or `cc_number: -1`,
/// become the nearest valid value. Returns true if anything changed.
fn clamp_midi_values(doc: &mut Value) -> bool {
    let mut changed = false;
    for axis in Axis::ALL {
        let Some(section) = doc.get_mut(axis.name()) else {
            continue;
        };
        for field in AxisField::ALL {
            let Some(max) = field.midi_max() else {
                continue;
            };
            let Some(Value::Number(number)) = section.get_mut(field.key()) else {
                continue;
            };
            let raw = match (number.as_i64(), number.as_u64()) {
                (Some(i), _) => i,
                (None, Some(_)) => i64::MAX,
                (None, None) => continue,
            };
            let clamped = clamp_field(field, raw, max);
            if i64::from(clamped) != raw {
                *number = serde_yaml::Number::from(clamped);
                changed = true;
            }
        }
    }
    changed
}

impl Config {
    /// Parse a YAML document, filling every missing key from the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or a value has the wrong type
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let overlay: Value = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        let mut merged = serde_yaml::to_value(Self::default())
            .map_err(|e| Error::ConfigError(format!("Failed to serialize defaults: {e}")))?;
        merge_values(&mut merged, overlay);
        let clamped = clamp_midi_values(&mut merged);

        let mut config: Self = serde_yaml::from_value(merged)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        if config.sanitize() || clamped {
            warn!("Configuration contained out-of-range MIDI values; they were clamped");
        }
        Ok(config)
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing or invalid
    #[must_use]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                info!("Configuration loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Could not load {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if !smoothing_factor_in_range(self.filter.smoothing_factor) {
            return Err(Error::ConfigError(
                "Smoothing factor must be in (0.0, 1.0]".to_string(),
            ));
        }
        if !(self.filter.jump_threshold > 0.0) {
            return Err(Error::ConfigError(
                "Jump threshold must be greater than 0".to_string(),
            ));
        }
        if self.camera.fps == 0 {
            return Err(Error::ConfigError("Camera FPS must be greater than 0".to_string()));
        }

        for (axis, cal) in self.axes.iter() {
            if !cal.input_min.is_finite() || !cal.input_max.is_finite() {
                return Err(Error::ConfigError(format!("{axis} input range must be finite")));
            }
        }

        Ok(())
    }

    /// Clamp MIDI fields of every axis into range, returning true if anything changed
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        for axis in Axis::ALL {
            changed |= self.axes.get_mut(axis).sanitize();
        }
        changed
    }

    /// Calibration of one axis
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> &AxisCalibration {
        self.axes.get(axis)
    }

    /// Set one field of one axis by its configuration key
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown key or a value of the wrong type
    pub fn update_axis_field(&mut self, axis: Axis, key: &str, value: FieldValue) -> Result<()> {
        let field: AxisField = key.parse()?;
        self.axes.get_mut(axis).set_field(field, value)
    }

    /// Store one end of an axis input range as-is
    pub fn calibrate_axis(&mut self, axis: Axis, value: f64, is_min: bool) {
        let bound = if is_min { Bound::Min } else { Bound::Max };
        self.axes.get_mut(axis).set_bound(bound, value);
    }

    /// Restore the built-in calibration of an axis
    pub fn reset_axis(&mut self, axis: Axis) {
        self.axes.get_mut(axis).reset_to_default(axis);
    }

    /// Current neutral offsets
    #[must_use]
    pub const fn neutral_offsets(&self) -> NeutralOffsets {
        self.neutral
    }

    /// Replace the neutral offsets
    pub fn set_neutral_offsets(&mut self, offsets: NeutralOffsets) {
        self.neutral = offsets;
    }

    /// Create the roll filter described by this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the filter parameters are out of range
    pub fn create_roll_filter(&self) -> Result<RollFilter> {
        let FilterConfig {
            smoothing_factor,
            jump_threshold,
        } = self.filter;
        if !smoothing_factor_in_range(smoothing_factor) {
            return Err(Error::FilterError(format!(
                "Smoothing factor must be in (0, 1], got {smoothing_factor}"
            )));
        }
        if !(jump_threshold > 0.0) {
            return Err(Error::FilterError(format!(
                "Jump threshold must be positive, got {jump_threshold}"
            )));
        }
        Ok(RollFilter::with_params(smoothing_factor, jump_threshold))
    }

    /// Wrap into the handle shared between threads
    #[must_use]
    pub fn into_shared(self) -> SharedConfig {
        Arc::new(Mutex::new(self))
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Pose to MIDI Configuration

# Per-axis mapping: angle range (degrees, relative to neutral) to MIDI range
pitch:
  enabled: true
  input_min: -30.0
  input_max: 30.0
  output_min: 0
  output_max: 127
  cc_number: 1
  channel: 0

yaw:
  enabled: true
  input_min: -30.0
  input_max: 30.0
  output_min: 0
  output_max: 127
  cc_number: 2
  channel: 0

roll:
  enabled: true
  input_min: -30.0
  input_max: 30.0
  output_min: 0
  output_max: 127
  cc_number: 3
  channel: 0

# Pose treated as zero (set by calibration or --zero)
neutral:
  pitch: 0.0
  yaw: 0.0
  roll: 0.0

# Roll smoothing
filter:
  smoothing_factor: 0.3
  jump_threshold: 60.0

# Camera settings for the capture stage
camera:
  device_id: 0
  width: 640
  height: 480
  fps: 30

# MIDI output; omit port_index to create a virtual port
midi:
  virtual_port_name: "Face to MIDI"
"#;
