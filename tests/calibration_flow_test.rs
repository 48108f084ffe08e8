//! Calibration sequence tests against a live tracking session

use head_pose_midi::{
    app::TrackingSession,
    config::{lock_config, Config},
    midi::NullTransport,
    pose::{Axis, NeutralOffsets, Pose},
    sequencer::{CalibrationSequencer, CalibrationStep, SequencerEvent, SequencerState},
    wizard::{run_wizard, WizardCommand, WizardOutcome, WizardTiming},
};
use std::sync::mpsc;

/// Tick the active step until its capture happens
fn finish_step(sequencer: &mut CalibrationSequencer, pose: Option<Pose>) -> SequencerEvent {
    loop {
        let event = sequencer.tick(pose);
        if !matches!(event, SequencerEvent::Countdown { .. }) {
            return event;
        }
    }
}

#[test]
fn test_reversed_extremes_are_sorted_on_commit() {
    let mut sequencer = CalibrationSequencer::new();
    sequencer.start(NeutralOffsets::default());

    let captures = [
        Pose::new(0.0, 0.0, 0.0),
        // User looked down when asked to look up
        Pose::new(-5.0, 0.0, 0.0),
        Pose::new(20.0, 0.0, 0.0),
        Pose::new(0.0, 30.0, 0.0),
        Pose::new(0.0, -30.0, 0.0),
        Pose::new(0.0, 0.0, 25.0),
        Pose::new(0.0, 0.0, -25.0),
    ];

    let mut result = None;
    for pose in captures {
        finish_step(&mut sequencer, Some(pose));
        if let SequencerEvent::Completed(done) = sequencer.advance() {
            result = Some(done);
        }
    }

    let result = result.expect("sequence should complete");
    let mut config = Config::default();
    result.commit(&mut config);

    assert_eq!((config.axes.pitch.input_min, config.axes.pitch.input_max), (-5.0, 20.0));
    assert_eq!((config.axes.yaw.input_min, config.axes.yaw.input_max), (-30.0, 30.0));
    assert_eq!((config.axes.roll.input_min, config.axes.roll.input_max), (-25.0, 25.0));
}

#[test]
fn test_equal_extremes_committed() {
    let mut sequencer = CalibrationSequencer::new();
    sequencer.start(NeutralOffsets::default());
    let mut result = None;
    for _ in 0..CalibrationStep::CAPTURE_STEPS {
        finish_step(&mut sequencer, Some(Pose::new(4.0, 4.0, 4.0)));
        if let SequencerEvent::Completed(done) = sequencer.advance() {
            result = Some(done);
        }
    }

    let mut config = Config::default();
    let updated = result.unwrap().commit(&mut config);

    assert_eq!(updated, Axis::ALL.to_vec());
    assert_eq!(config.axes.yaw.input_min, 0.0);
    assert_eq!(config.axes.yaw.input_max, 0.0);
    assert_eq!(config.axes.yaw.map(12.0), 0);
}

#[test]
fn test_capture_without_face_keeps_axis() {
    let mut sequencer = CalibrationSequencer::new();
    sequencer.start(NeutralOffsets::default());

    let poses = [
        Some(Pose::default()),
        None,
        Some(Pose::new(-10.0, 0.0, 0.0)),
        Some(Pose::new(0.0, 10.0, 0.0)),
        Some(Pose::new(0.0, -10.0, 0.0)),
        Some(Pose::new(0.0, 0.0, 10.0)),
        Some(Pose::new(0.0, 0.0, -10.0)),
    ];
    let mut result = None;
    for pose in poses {
        finish_step(&mut sequencer, pose);
        if let SequencerEvent::Completed(done) = sequencer.advance() {
            result = Some(done);
        }
    }

    let mut config = Config::default();
    let updated = result.unwrap().commit(&mut config);

    assert_eq!(updated, vec![Axis::Yaw, Axis::Roll]);
    assert_eq!(config.axes.pitch.input_min, -30.0);
    assert_eq!(config.axes.pitch.input_max, 30.0);
}

#[test]
fn test_cancel_mid_sequence() {
    let mut sequencer = CalibrationSequencer::new();
    sequencer.start(NeutralOffsets::default());
    finish_step(&mut sequencer, Some(Pose::new(3.0, 3.0, 3.0)));
    sequencer.advance();
    finish_step(&mut sequencer, Some(Pose::new(25.0, 3.0, 3.0)));

    assert_eq!(sequencer.cancel(), SequencerEvent::Cancelled);
    assert_eq!(sequencer.state(), SequencerState::Cancelled);
    assert!(!sequencer.is_running());
    assert_eq!(sequencer.advance(), SequencerEvent::Idle);
}

#[test]
fn test_wizard_reads_poses_published_by_session() {
    let shared = Config::default().into_shared();
    let mut session = TrackingSession::new(shared.clone(), NullTransport, false).unwrap();
    let mut latest = session.latest();

    // The producer has already seen a face; every capture reads the same pose
    session.process_frame(Some(Pose::new(2.0, -3.0, 1.0)));

    let (_tx, rx) = mpsc::channel::<WizardCommand>();
    let outcome = run_wizard(&shared, &mut latest, &rx, WizardTiming::immediate(), |_| {});

    assert_eq!(
        outcome,
        WizardOutcome::Completed {
            updated_axes: Axis::ALL.to_vec(),
            neutral_updated: true,
        }
    );
    let cfg = lock_config(&shared);
    assert_eq!(cfg.neutral, NeutralOffsets::from(Pose::new(2.0, -3.0, 1.0)));
    assert_eq!(cfg.axes.pitch.input_min, 0.0);

    drop(cfg);
    let output = session.process_frame(Some(Pose::new(2.0, -3.0, 1.0))).unwrap();
    assert_eq!(output.pose, Pose::default());
}
