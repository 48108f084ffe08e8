//! Constants used throughout the application

/// Roll values above this are folded down by a half turn
pub const ROLL_WRAP_LIMIT: f64 = 90.0;

/// Half turn in degrees
pub const HALF_TURN: f64 = 180.0;

/// Default exponential smoothing factor for the roll signal (lower = smoother)
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 0.3;

/// Default jump size in degrees treated as a solver glitch
pub const DEFAULT_JUMP_THRESHOLD: f64 = 60.0;

/// Exponential filter bounds
pub const SMOOTHING_FACTOR_MIN: f64 = 0.0;
pub const SMOOTHING_FACTOR_MAX: f64 = 1.0;

/// Default input range for every axis, in degrees
pub const DEFAULT_INPUT_MIN: f64 = -30.0;
pub const DEFAULT_INPUT_MAX: f64 = 30.0;

/// Largest 7-bit MIDI data value
pub const MIDI_DATA_MAX: u8 = 127;

/// Largest zero-based MIDI channel
pub const MIDI_CHANNEL_MAX: u8 = 15;

/// MIDI status nibbles
pub const STATUS_NOTE_OFF: u8 = 0x80;
pub const STATUS_NOTE_ON: u8 = 0x90;
pub const STATUS_CONTROL_CHANGE: u8 = 0xB0;

/// Default velocity for note-on messages
pub const DEFAULT_NOTE_VELOCITY: u8 = 64;

/// Calibration step durations in seconds
pub const NEUTRAL_STEP_SECS: u32 = 6;
pub const EXTREME_STEP_SECS: u32 = 4;

/// Pause between a capture and the next step, in milliseconds
pub const SETTLE_DELAY_MS: u64 = 500;

/// Default frames per second assumption for the capture loop
pub const DEFAULT_FPS: u32 = 30;

/// Default name of the virtual MIDI output port
pub const DEFAULT_VIRTUAL_PORT_NAME: &str = "Face to MIDI";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "head-pose-midi.yaml";
