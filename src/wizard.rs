//! Wall-clock driver for the calibration sequencer.
//!
//! Runs on its own thread next to the tracking loop. The countdown timer is
//! a `recv_timeout` on the command channel, so skip and cancel requests are
//! handled as soon as they arrive instead of at the next tick.

use crate::{
    config::{lock_config, SharedConfig},
    constants::SETTLE_DELAY_MS,
    pose::Axis,
    pose_source::PoseSource,
    sequencer::{CalibrationSequencer, SequencerEvent, SequencerState},
};
use log::info;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// User request delivered to a running wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardCommand {
    /// Skip the active step and start the next one
    Skip,
    /// Abort without committing
    Cancel,
}

/// Wizard pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardTiming {
    /// Countdown resolution
    pub tick: Duration,
    /// Pause after a capture before the next step starts
    pub settle: Duration,
}

impl Default for WizardTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            settle: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }
}

impl WizardTiming {
    /// No waiting at all; used to run a sequence back to back
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            tick: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

/// How a wizard run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    /// Sequence finished and results were committed
    Completed {
        /// Axes whose input range was replaced
        updated_axes: Vec<Axis>,
        /// Whether the neutral offsets were replaced
        neutral_updated: bool,
    },
    /// Sequence aborted; configuration untouched
    Cancelled,
}

fn wait_for_command(commands: &Receiver<WizardCommand>, wait: Duration) -> Option<WizardCommand> {
    match commands.recv_timeout(wait) {
        Ok(command) => Some(command),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => {
            thread::sleep(wait);
            None
        }
    }
}

/// Run a complete calibration sequence.
///
/// Poses are read from `source` only at capture time. Every sequencer event
/// is passed to `on_event` for display. On completion the captured ranges
/// and neutral pose are committed to `config` under its lock.
pub fn run_wizard<S, F>(
    config: &SharedConfig,
    source: &mut S,
    commands: &Receiver<WizardCommand>,
    timing: WizardTiming,
    mut on_event: F,
) -> WizardOutcome
where
    S: PoseSource + ?Sized,
    F: FnMut(&SequencerEvent),
{
    let baseline = lock_config(config).neutral_offsets();
    let mut sequencer = CalibrationSequencer::new();
    on_event(&sequencer.start(baseline));

    loop {
        let wait = match sequencer.state() {
            SequencerState::Settling { .. } => timing.settle,
            _ => timing.tick,
        };

        let event = match wait_for_command(commands, wait) {
            Some(WizardCommand::Cancel) => {
                on_event(&sequencer.cancel());
                return WizardOutcome::Cancelled;
            }
            Some(WizardCommand::Skip) => sequencer.skip_current_step(),
            None => {
                let pose = if sequencer.capture_due() {
                    source.current_pose()
                } else {
                    None
                };
                sequencer.tick(pose)
            }
        };
        on_event(&event);

        if let SequencerEvent::Completed(result) = event {
            let updated_axes = result.commit(&mut lock_config(config));
            let neutral_updated = result.neutral().is_some();
            info!(
                "Calibration committed: {} axis range(s) updated, neutral {}",
                updated_axes.len(),
                if neutral_updated { "updated" } else { "unchanged" }
            );
            return WizardOutcome::Completed {
                updated_axes,
                neutral_updated,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, pose::{NeutralOffsets, Pose}, sequencer::CalibrationStep};
    use std::sync::mpsc;

    fn capture_poses() -> Vec<Pose> {
        vec![
            Pose::new(1.0, 1.0, 1.0),
            Pose::new(21.0, 1.0, 1.0),
            Pose::new(-9.0, 1.0, 1.0),
            Pose::new(1.0, 26.0, 1.0),
            Pose::new(1.0, -19.0, 1.0),
            Pose::new(1.0, 1.0, 16.0),
            Pose::new(1.0, 1.0, -14.0),
        ]
    }

    #[test]
    fn test_full_run_commits_ranges_and_neutral() {
        let config = Config::default().into_shared();
        let mut poses = capture_poses().into_iter();
        let mut source = move || poses.next();
        let (tx, rx) = mpsc::channel();
        drop(tx);

        let mut started = Vec::new();
        let outcome = run_wizard(&config, &mut source, &rx, WizardTiming::immediate(), |event| {
            if let SequencerEvent::StepStarted { step, .. } = event {
                started.push(*step);
            }
        });

        assert_eq!(
            outcome,
            WizardOutcome::Completed {
                updated_axes: vec![Axis::Pitch, Axis::Yaw, Axis::Roll],
                neutral_updated: true,
            }
        );
        assert_eq!(started, CalibrationStep::ALL[..7].to_vec());

        let cfg = lock_config(&config);
        assert_eq!(cfg.neutral, NeutralOffsets::from(Pose::new(1.0, 1.0, 1.0)));
        assert_eq!((cfg.axes.pitch.input_min, cfg.axes.pitch.input_max), (-10.0, 20.0));
        assert_eq!((cfg.axes.yaw.input_min, cfg.axes.yaw.input_max), (-20.0, 25.0));
        assert_eq!((cfg.axes.roll.input_min, cfg.axes.roll.input_max), (-15.0, 15.0));
    }

    #[test]
    fn test_cancel_leaves_config_untouched() {
        let config = Config::default().into_shared();
        let mut source = || Some(Pose::new(5.0, 5.0, 5.0));
        let (tx, rx) = mpsc::channel();
        tx.send(WizardCommand::Cancel).unwrap();

        let outcome = run_wizard(&config, &mut source, &rx, WizardTiming::immediate(), |_| {});

        assert_eq!(outcome, WizardOutcome::Cancelled);
        assert_eq!(*lock_config(&config), Config::default());
    }

    #[test]
    fn test_skipped_neutral_uses_existing_offsets() {
        let mut initial = Config::default();
        initial.neutral.pitch = 2.0;
        let config = initial.into_shared();

        let mut poses = capture_poses().into_iter().skip(1);
        let mut source = move || poses.next();
        let (tx, rx) = mpsc::channel();
        tx.send(WizardCommand::Skip).unwrap();

        let outcome = run_wizard(&config, &mut source, &rx, WizardTiming::immediate(), |_| {});

        assert_eq!(
            outcome,
            WizardOutcome::Completed {
                updated_axes: vec![Axis::Pitch, Axis::Yaw, Axis::Roll],
                neutral_updated: false,
            }
        );
        let cfg = lock_config(&config);
        assert_eq!(cfg.neutral.pitch, 2.0);
        assert_eq!((cfg.axes.pitch.input_min, cfg.axes.pitch.input_max), (-11.0, 19.0));
        assert_eq!((cfg.axes.yaw.input_min, cfg.axes.yaw.input_max), (-19.0, 26.0));
    }

    #[test]
    fn test_no_face_keeps_previous_ranges() {
        let config = Config::default().into_shared();
        let mut source = || -> Option<Pose> { None };
        let (_tx, rx) = mpsc::channel();

        let outcome = run_wizard(&config, &mut source, &rx, WizardTiming::immediate(), |_| {});

        assert_eq!(
            outcome,
            WizardOutcome::Completed {
                updated_axes: Vec::new(),
                neutral_updated: false,
            }
        );
        assert_eq!(*lock_config(&config), Config::default());
    }
}
