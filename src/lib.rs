//! Head pose to MIDI library.
//!
//! Turns a stream of head orientation samples (pitch, yaw, roll in degrees)
//! into MIDI Control Change messages, one controller per axis:
//! 1. Roll is folded into [-90°, 90°], glitches are rejected and the signal is smoothed
//! 2. The neutral pose is subtracted from every axis
//! 3. Each enabled axis is mapped linearly from its calibrated angle range to MIDI values
//! 4. Only values that changed since the last transmission are sent
//!
//! A guided calibration sequence measures the neutral pose and the comfortable
//! extremes of every axis and writes them into the shared configuration.
//!
//! # Examples
//!
//! ## Mapping a pose
//!
//! ```
//! use head_pose_midi::{
//!     calibration::CalibrationSet,
//!     midi::{emitter::MidiEmitter, LogTransport},
//!     pose::{Axis, Pose},
//! };
//!
//! let mut emitter = MidiEmitter::new(LogTransport::default());
//! let values = emitter.process(&Pose::new(15.0, 0.0, 0.0), &CalibrationSet::default());
//! assert_eq!(values[&Axis::Pitch], 95);
//! ```
//!
//! ## Running a tracking session
//!
//! ```no_run
//! use head_pose_midi::{app::TrackingSession, config::Config, midi::LogTransport, pose_source::LinePoseSource};
//! use std::io::BufReader;
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_default("head-pose-midi.yaml").into_shared();
//! let mut session = TrackingSession::new(config, LogTransport::default(), false)?;
//!
//! let mut source = LinePoseSource::new(BufReader::new(std::io::stdin()));
//! let stop = AtomicBool::new(false);
//! session.run(&mut source, &stop, Duration::from_millis(33));
//! # Ok(())
//! # }
//! ```

/// Head orientation samples, axes and neutral offsets
pub mod pose;

/// Signal filtering algorithms for stabilising pose angles
pub mod filters;

/// Per-axis calibration data
pub mod calibration;

/// Linear angle to MIDI value mapping
pub mod mapping;

/// MIDI messages, transports and the Control Change emitter
pub mod midi;

/// Guided calibration state machine
pub mod sequencer;

/// Timed driver for the calibration sequence
pub mod wizard;

/// Pose input abstractions
pub mod pose_source;

/// Utility functions for numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
