//! Tracking session: the per-frame pipeline from raw pose to MIDI.

use crate::{
    calibration::Bound,
    config::{lock_config, SharedConfig},
    filters::{roll::RollFilter, AngleFilter},
    midi::{
        emitter::{preview, MidiEmitter, MidiValues},
        MidiTransport,
    },
    pose::{Axis, NeutralOffsets, Pose},
    pose_source::{LatestPose, PoseSource},
    Result,
};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of processing one frame with a detected face
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Filtered pose relative to neutral
    pub pose: Pose,
    /// MIDI value per enabled axis
    pub midi: MidiValues,
}

/// Producer side of the application.
///
/// Owns the roll filter and the MIDI emitter, reads mapping parameters from
/// the shared configuration on every frame and publishes the latest filtered
/// pose for the calibration wizard.
pub struct TrackingSession<T: MidiTransport> {
    config: SharedConfig,
    roll_filter: RollFilter,
    emitter: MidiEmitter<T>,
    debug_mode: bool,
    latest: LatestPose,
}

impl<T: MidiTransport> TrackingSession<T> {
    /// Create a session sending through `transport`.
    ///
    /// In debug mode values are computed but nothing is transmitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured filter parameters are invalid
    pub fn new(config: SharedConfig, transport: T, debug_mode: bool) -> Result<Self> {
        let roll_filter = lock_config(&config).create_roll_filter()?;
        if debug_mode {
            info!("Debug mode: MIDI output disabled");
        }
        Ok(Self {
            config,
            roll_filter,
            emitter: MidiEmitter::new(transport),
            debug_mode,
            latest: LatestPose::new(),
        })
    }

    /// Stabilise roll; pitch and yaw pass through
    pub fn filter_pose(&mut self, raw: Pose) -> Pose {
        Pose {
            roll: self.roll_filter.apply(raw.roll),
            ..raw
        }
    }

    /// Process one frame.
    ///
    /// `None` means no face was detected: nothing is sent and the published
    /// pose is cleared.
    pub fn process_frame(&mut self, raw: Option<Pose>) -> Option<FrameOutput> {
        let Some(raw) = raw else {
            self.latest.publish(None);
            return None;
        };

        let filtered = self.filter_pose(raw);
        self.latest.publish(Some(filtered));

        let (axes, neutral) = {
            let cfg = lock_config(&self.config);
            (cfg.axes, cfg.neutral)
        };
        let pose = filtered.relative_to(&neutral);

        let midi = if self.debug_mode {
            preview(&pose, &axes)
        } else {
            self.emitter.process(&pose, &axes)
        };

        Some(FrameOutput { pose, midi })
    }

    /// Store the latest filtered pose as the neutral reference
    pub fn zero_now(&mut self) -> Option<NeutralOffsets> {
        let Some(pose) = self.latest.get() else {
            info!("No face detected; neutral position unchanged");
            return None;
        };
        let offsets = NeutralOffsets::from(pose);
        lock_config(&self.config).set_neutral_offsets(offsets);
        info!(
            "Neutral position set: pitch {:.1}°, yaw {:.1}°, roll {:.1}°",
            offsets.pitch, offsets.yaw, offsets.roll
        );
        Some(offsets)
    }

    /// Store the live angle of one axis as the lower or upper end of its input range.
    ///
    /// The stored value is relative to the current neutral offsets, the same
    /// value the mapper sees.
    pub fn set_bound_from_live(&mut self, axis: Axis, bound: Bound) -> Option<f64> {
        let Some(pose) = self.latest.get() else {
            info!("No face detected; {axis} range unchanged");
            return None;
        };
        let mut cfg = lock_config(&self.config);
        let value = pose.relative_to(&cfg.neutral_offsets()).get(axis);
        cfg.axes.get_mut(axis).set_bound(bound, value);
        info!("{axis} {bound:?} set to {value:.1}°");
        Some(value)
    }

    /// Start over with a fresh roll filter and an empty send cache
    ///
    /// # Errors
    ///
    /// Returns an error if the configured filter parameters are invalid
    pub fn restart(&mut self) -> Result<()> {
        self.roll_filter = lock_config(&self.config).create_roll_filter()?;
        self.emitter.reset();
        self.latest.publish(None);
        info!("Tracking restarted");
        Ok(())
    }

    /// Handle to the latest filtered pose
    #[must_use]
    pub fn latest(&self) -> LatestPose {
        self.latest.clone()
    }

    /// Whether MIDI transmission is suppressed
    #[must_use]
    pub const fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Switch debug mode; leaving it forces every value to be resent
    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        if self.debug_mode && !debug_mode {
            self.emitter.reset();
        }
        self.debug_mode = debug_mode;
    }

    /// The MIDI emitter
    pub fn emitter(&self) -> &MidiEmitter<T> {
        &self.emitter
    }

    /// Pull poses from `source` until it finishes or `stop` is set.
    ///
    /// Frames are paced to `frame_interval`. Returns the number of frames
    /// processed.
    pub fn run<S: PoseSource + ?Sized>(&mut self, source: &mut S, stop: &AtomicBool, frame_interval: Duration) -> u64 {
        info!("Starting tracking loop");

        let mut frame_count: u64 = 0;
        let start_time = Instant::now();
        let mut last_fps_update = Instant::now();

        while !stop.load(Ordering::SeqCst) {
            let frame_start = Instant::now();
            let raw = source.current_pose();
            if raw.is_none() && source.is_finished() {
                info!("End of pose input reached");
                break;
            }

            if let Some(output) = self.process_frame(raw) {
                debug!(
                    "pitch {:.1}° yaw {:.1}° roll {:.1}° -> {:?}",
                    output.pose.pitch, output.pose.yaw, output.pose.roll, output.midi
                );
            }

            frame_count += 1;
            if last_fps_update.elapsed() >= Duration::from_secs(1) {
                #[allow(clippy::cast_precision_loss)]
                let fps = frame_count as f64 / start_time.elapsed().as_secs_f64();
                debug!("FPS: {fps:.1}");
                last_fps_update = Instant::now();
            }

            if let Some(remaining) = frame_interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        info!("Tracking loop stopped after {frame_count} frames");
        frame_count
    }
}
