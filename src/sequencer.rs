//! Guided calibration sequence.
//!
//! The sequencer is a plain state machine with no notion of time: a driver
//! (see [`crate::wizard`]) calls [`CalibrationSequencer::tick`] once per
//! second while a step counts down and once more after the settle delay,
//! and the control entry points whenever the user asks. Captured extremes are only
//! written into the configuration by [`CalibrationResult::commit`], once the
//! sequence has reached [`CalibrationStep::Complete`].

use crate::{
    calibration::Bound,
    config::Config,
    constants::{EXTREME_STEP_SECS, NEUTRAL_STEP_SECS},
    pose::{Axis, NeutralOffsets, Pose},
};
use log::{debug, info, warn};

/// One step of the guided calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationStep {
    /// Look straight ahead
    Neutral,
    /// Tilt the head up
    PitchMax,
    /// Tilt the head down
    PitchMin,
    /// Turn right
    YawMax,
    /// Turn left
    YawMin,
    /// Ear towards the right shoulder
    RollMax,
    /// Ear towards the left shoulder
    RollMin,
    /// Terminal step
    Complete,
}

/// Display metadata for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    /// Short heading
    pub title: &'static str,
    /// What the user should do
    pub instruction: &'static str,
    /// Countdown length in whole seconds
    pub duration_secs: u32,
    /// Axes measured by the step
    pub axes: &'static [Axis],
}

impl CalibrationStep {
    /// Steps in sequence order
    pub const ALL: [Self; 8] = [
        Self::Neutral,
        Self::PitchMax,
        Self::PitchMin,
        Self::YawMax,
        Self::YawMin,
        Self::RollMax,
        Self::RollMin,
        Self::Complete,
    ];

    /// Number of steps that capture something
    pub const CAPTURE_STEPS: usize = Self::ALL.len() - 1;

    /// Position in the sequence
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Neutral => 0,
            Self::PitchMax => 1,
            Self::PitchMin => 2,
            Self::YawMax => 3,
            Self::YawMin => 4,
            Self::RollMax => 5,
            Self::RollMin => 6,
            Self::Complete => 7,
        }
    }

    /// Following step, `None` after `Complete`
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Neutral => Some(Self::PitchMax),
            Self::PitchMax => Some(Self::PitchMin),
            Self::PitchMin => Some(Self::YawMax),
            Self::YawMax => Some(Self::YawMin),
            Self::YawMin => Some(Self::RollMax),
            Self::RollMax => Some(Self::RollMin),
            Self::RollMin => Some(Self::Complete),
            Self::Complete => None,
        }
    }

    /// Axis and range end captured by a directional step
    #[must_use]
    pub const fn target(self) -> Option<(Axis, Bound)> {
        match self {
            Self::PitchMax => Some((Axis::Pitch, Bound::Max)),
            Self::PitchMin => Some((Axis::Pitch, Bound::Min)),
            Self::YawMax => Some((Axis::Yaw, Bound::Max)),
            Self::YawMin => Some((Axis::Yaw, Bound::Min)),
            Self::RollMax => Some((Axis::Roll, Bound::Max)),
            Self::RollMin => Some((Axis::Roll, Bound::Min)),
            Self::Neutral | Self::Complete => None,
        }
    }

    /// Title, instruction, duration and axes of the step
    #[must_use]
    pub const fn info(self) -> StepInfo {
        match self {
            Self::Neutral => StepInfo {
                title: "Neutral Position",
                instruction: "Look straight ahead at the camera.\nKeep your head level and centered.\n\nThis will be your zero/neutral position.",
                duration_secs: NEUTRAL_STEP_SECS,
                axes: &[Axis::Pitch, Axis::Yaw, Axis::Roll],
            },
            Self::PitchMax => StepInfo {
                title: "Pitch - Look Up",
                instruction: "Tilt your head UP as far as comfortable.\n\nThis sets the maximum upward angle.",
                duration_secs: EXTREME_STEP_SECS,
                axes: &[Axis::Pitch],
            },
            Self::PitchMin => StepInfo {
                title: "Pitch - Look Down",
                instruction: "Tilt your head DOWN as far as comfortable.\n\nThis sets the maximum downward angle.",
                duration_secs: EXTREME_STEP_SECS,
                axes: &[Axis::Pitch],
            },
            Self::YawMax => StepInfo {
                title: "Yaw - Turn Right",
                instruction: "Turn your head to the RIGHT as far as comfortable.\n\nThis sets the maximum right angle.",
                duration_secs: EXTREME_STEP_SECS,
                axes: &[Axis::Yaw],
            },
            Self::YawMin => StepInfo {
                title: "Yaw - Turn Left",
                instruction: "Turn your head to the LEFT as far as comfortable.\n\nThis sets the maximum left angle.",
                duration_secs: EXTREME_STEP_SECS,
                axes: &[Axis::Yaw],
            },
            Self::RollMax => StepInfo {
                title: "Roll - Tilt Right",
                instruction: "Tilt your head to the RIGHT SIDE\n(ear toward right shoulder).\n\nThis sets the maximum right tilt.",
                duration_secs: EXTREME_STEP_SECS,
                axes: &[Axis::Roll],
            },
            Self::RollMin => StepInfo {
                title: "Roll - Tilt Left",
                instruction: "Tilt your head to the LEFT SIDE\n(ear toward left shoulder).\n\nThis sets the maximum left tilt.",
                duration_secs: EXTREME_STEP_SECS,
                axes: &[Axis::Roll],
            },
            Self::Complete => StepInfo {
                title: "Calibration Complete!",
                instruction: "Calibration successful!\n\nYour head movements are now mapped.\nYou can adjust individual axis settings in the configuration.",
                duration_secs: 0,
                axes: &[],
            },
        }
    }

    /// "Step n of 7" label, or "Complete!" for the terminal step
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Complete => "Complete!".to_string(),
            step => format!("Step {} of {}", step.index() + 1, Self::CAPTURE_STEPS),
        }
    }
}

/// Where the sequencer currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Not started
    Idle,
    /// Counting down towards the capture of `step`
    Counting {
        /// Step being counted down
        step: CalibrationStep,
        /// Whole seconds left
        remaining: u32,
    },
    /// Captured `step`, waiting to advance
    Settling {
        /// Step just finished
        step: CalibrationStep,
    },
    /// Sequence finished and results handed out
    Complete,
    /// Sequence aborted; nothing was committed
    Cancelled,
}

/// Notification produced by each sequencer transition
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent {
    /// Nothing happened (sequencer not running)
    Idle,
    /// A new step began its countdown
    StepStarted {
        /// Step now active
        step: CalibrationStep,
        /// Countdown length
        duration_secs: u32,
    },
    /// One second elapsed
    Countdown {
        /// Active step
        step: CalibrationStep,
        /// Whole seconds left
        remaining: u32,
    },
    /// Countdown reached zero and a capture was attempted
    Captured {
        /// Step captured
        step: CalibrationStep,
        /// False when no pose was available
        recorded: bool,
    },
    /// Sequence reached the terminal step
    Completed(CalibrationResult),
    /// Sequence aborted
    Cancelled,
}

/// Values captured during one run of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureSet {
    neutral: Option<Pose>,
    // [axis][min, max], relative to neutral
    slots: [[Option<f64>; 2]; 3],
}

impl CaptureSet {
    const fn slot_index(bound: Bound) -> usize {
        match bound {
            Bound::Min => 0,
            Bound::Max => 1,
        }
    }

    /// Captured neutral pose
    #[must_use]
    pub const fn neutral(&self) -> Option<Pose> {
        self.neutral
    }

    /// Captured value for one end of an axis range
    #[must_use]
    pub const fn slot(&self, axis: Axis, bound: Bound) -> Option<f64> {
        self.slots[axis.index()][Self::slot_index(bound)]
    }

    fn set_slot(&mut self, axis: Axis, bound: Bound, value: f64) {
        self.slots[axis.index()][Self::slot_index(bound)] = Some(value);
    }

    /// Sorted `(min, max)` for an axis with both ends captured
    #[must_use]
    pub fn range(&self, axis: Axis) -> Option<(f64, f64)> {
        let a = self.slot(axis, Bound::Min)?;
        let b = self.slot(axis, Bound::Max)?;
        Some((a.min(b), a.max(b)))
    }
}

/// Outcome of a completed sequence, ready to be committed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    captures: CaptureSet,
}

impl CalibrationResult {
    /// Raw captures behind this result
    #[must_use]
    pub const fn captures(&self) -> &CaptureSet {
        &self.captures
    }

    /// Neutral offsets to store, if the neutral step produced a pose
    #[must_use]
    pub fn neutral(&self) -> Option<NeutralOffsets> {
        self.captures.neutral.map(NeutralOffsets::from)
    }

    /// Sorted input range for an axis, if both ends were captured
    #[must_use]
    pub fn range(&self, axis: Axis) -> Option<(f64, f64)> {
        self.captures.range(axis)
    }

    /// Write neutral offsets and fully captured ranges into `config`.
    ///
    /// Axes missing either end are left untouched. Returns the axes whose
    /// range was updated.
    pub fn commit(&self, config: &mut Config) -> Vec<Axis> {
        if let Some(neutral) = self.neutral() {
            config.set_neutral_offsets(neutral);
            info!(
                "Neutral offsets saved: pitch {:.1}°, yaw {:.1}°, roll {:.1}°",
                neutral.pitch, neutral.yaw, neutral.roll
            );
        }

        let mut updated = Vec::new();
        for axis in Axis::ALL {
            let Some((min, max)) = self.range(axis) else {
                continue;
            };
            if min == max {
                warn!("{axis} range is empty ({min:.1}°); every value will map to the output minimum");
            }
            let cal = config.axes.get_mut(axis);
            cal.set_bound(Bound::Min, min);
            cal.set_bound(Bound::Max, max);
            info!("{axis} range set: {min:.1}° to {max:.1}°");
            updated.push(axis);
        }
        updated
    }
}

/// Finite-state driver of the guided calibration
#[derive(Debug, Clone)]
pub struct CalibrationSequencer {
    state: SequencerState,
    captures: CaptureSet,
    baseline: NeutralOffsets,
}

impl Default for CalibrationSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationSequencer {
    /// Create an idle sequencer
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SequencerState::Idle,
            captures: CaptureSet::default(),
            baseline: NeutralOffsets::default(),
        }
    }

    /// Start (or restart) the sequence from the neutral step with empty captures.
    ///
    /// `baseline` is used as the neutral reference for directional captures
    /// if the neutral step records nothing. The fallback is the baseline and
    /// not zero: the neutral offsets then stay unchanged, and the tracking
    /// loop keeps subtracting them, so ranges must be measured against them.
    pub fn start(&mut self, baseline: NeutralOffsets) -> SequencerEvent {
        self.captures = CaptureSet::default();
        self.baseline = baseline;
        info!("Calibration started");
        self.enter(CalibrationStep::Neutral)
    }

    fn enter(&mut self, step: CalibrationStep) -> SequencerEvent {
        if step == CalibrationStep::Complete {
            self.state = SequencerState::Complete;
            info!("Calibration complete");
            return SequencerEvent::Completed(CalibrationResult {
                captures: self.captures,
            });
        }

        let duration_secs = step.info().duration_secs;
        debug!("{}: {}", step.label(), step.info().title);
        self.state = SequencerState::Counting {
            step,
            remaining: duration_secs,
        };
        SequencerEvent::StepStarted { step, duration_secs }
    }

    /// One second elapsed.
    ///
    /// Counts the active step down and captures `pose` when the count reaches
    /// zero. While settling, a tick advances to the next step.
    pub fn tick(&mut self, pose: Option<Pose>) -> SequencerEvent {
        match self.state {
            SequencerState::Counting { step, remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.state = SequencerState::Counting { step, remaining };
                    return SequencerEvent::Countdown { step, remaining };
                }
                let recorded = self.capture(step, pose);
                self.state = SequencerState::Settling { step };
                SequencerEvent::Captured { step, recorded }
            }
            SequencerState::Settling { .. } => self.advance(),
            SequencerState::Idle | SequencerState::Complete | SequencerState::Cancelled => SequencerEvent::Idle,
        }
    }

    /// Move from a settled step to the next one
    pub fn advance(&mut self) -> SequencerEvent {
        let SequencerState::Settling { step } = self.state else {
            return SequencerEvent::Idle;
        };
        match step.next() {
            Some(next) => self.enter(next),
            None => SequencerEvent::Idle,
        }
    }

    /// Skip the active step without capturing anything and move on at once.
    ///
    /// Returns the event for the step that was entered.
    pub fn skip_current_step(&mut self) -> SequencerEvent {
        let (SequencerState::Counting { step, .. } | SequencerState::Settling { step }) = self.state else {
            return SequencerEvent::Idle;
        };
        info!("Skipped calibration step: {}", step.info().title);
        match step.next() {
            Some(next) => self.enter(next),
            None => SequencerEvent::Idle,
        }
    }

    /// Abort the sequence; captured values are discarded
    pub fn cancel(&mut self) -> SequencerEvent {
        if !self.is_running() {
            return SequencerEvent::Idle;
        }
        self.state = SequencerState::Cancelled;
        self.captures = CaptureSet::default();
        info!("Calibration cancelled");
        SequencerEvent::Cancelled
    }

    fn capture(&mut self, step: CalibrationStep, pose: Option<Pose>) -> bool {
        let Some(pose) = pose else {
            warn!("No face detected during calibration step: {}", step.info().title);
            return false;
        };

        match step.target() {
            None if step == CalibrationStep::Neutral => {
                self.captures.neutral = Some(pose);
                debug!(
                    "Neutral position captured: pitch {:.1}°, yaw {:.1}°, roll {:.1}°",
                    pose.pitch, pose.yaw, pose.roll
                );
            }
            None => return false,
            Some((axis, bound)) => {
                let neutral = self
                    .captures
                    .neutral
                    .map_or(self.baseline.get(axis), |n| n.get(axis));
                let value = pose.get(axis) - neutral;
                self.captures.set_slot(axis, bound, value);
                debug!("{axis} {bound:?} captured: {value:.1}°");
            }
        }
        true
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SequencerState {
        self.state
    }

    /// Whether a sequence is in progress
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(
            self.state,
            SequencerState::Counting { .. } | SequencerState::Settling { .. }
        )
    }

    /// Step currently counting down or settling
    #[must_use]
    pub const fn current_step(&self) -> Option<CalibrationStep> {
        match self.state {
            SequencerState::Counting { step, .. } | SequencerState::Settling { step } => Some(step),
            SequencerState::Complete => Some(CalibrationStep::Complete),
            SequencerState::Idle | SequencerState::Cancelled => None,
        }
    }

    /// Whether the next [`tick`](Self::tick) captures a pose
    #[must_use]
    pub const fn capture_due(&self) -> bool {
        matches!(self.state, SequencerState::Counting { remaining, .. } if remaining <= 1)
    }

    /// Seconds left on the active countdown
    #[must_use]
    pub const fn remaining_secs(&self) -> Option<u32> {
        match self.state {
            SequencerState::Counting { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    /// Captures recorded so far in this run
    #[must_use]
    pub const fn captures(&self) -> &CaptureSet {
        &self.captures
    }

    /// Progress as `(steps done, capture steps)`
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        let done = self.current_step().map_or(0, CalibrationStep::index);
        (done, CalibrationStep::CAPTURE_STEPS)
    }
}
