use super::MidiTransport;
use crate::{
    calibration::CalibrationSet,
    pose::{Axis, Pose},
};
use log::{debug, warn};
use std::collections::BTreeMap;

/// MIDI value per enabled axis for one processed frame
pub type MidiValues = BTreeMap<Axis, u8>;

/// Compute the values [`MidiEmitter::process`] would report, without sending anything
#[must_use]
pub fn preview(pose: &Pose, calibration: &CalibrationSet) -> MidiValues {
    calibration
        .iter()
        .filter(|(_, cal)| cal.enabled)
        .map(|(axis, cal)| (axis, cal.map(pose.get(axis))))
        .collect()
}

/// Maps poses to Control Change values and transmits only the ones that changed
pub struct MidiEmitter<T: MidiTransport> {
    transport: T,
    last_sent: [Option<u8>; 3],
}

impl<T: MidiTransport> MidiEmitter<T> {
    /// Create an emitter that sends through `transport`
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            last_sent: [None; 3],
        }
    }

    /// Map `pose` through the enabled axes and transmit changed values.
    ///
    /// Every enabled axis appears in the result whether or not a message was
    /// sent for it. Disabled axes are omitted and their cached value is
    /// forgotten so that re-enabling them transmits immediately. A failed
    /// send is logged and leaves the cache untouched so the value is retried
    /// on the next frame.
    pub fn process(&mut self, pose: &Pose, calibration: &CalibrationSet) -> MidiValues {
        let mut values = MidiValues::new();

        for (axis, cal) in calibration.iter() {
            if !cal.enabled {
                self.last_sent[axis.index()] = None;
                continue;
            }

            let midi_value = cal.map(pose.get(axis));

            if self.last_sent[axis.index()] != Some(midi_value) {
                match self.transport.send_control_change(cal.channel, cal.cc_number, midi_value) {
                    Ok(()) => {
                        debug!(
                            "{axis}: {:.1}° -> CC{} ch{} = {midi_value}",
                            pose.get(axis),
                            cal.cc_number,
                            cal.channel
                        );
                        self.last_sent[axis.index()] = Some(midi_value);
                    }
                    Err(e) => warn!("Failed to send {axis} CC{}: {e}", cal.cc_number),
                }
            }

            values.insert(axis, midi_value);
        }

        values
    }

    /// Most recently transmitted value for an axis
    #[must_use]
    pub const fn last_sent(&self, axis: Axis) -> Option<u8> {
        self.last_sent[axis.index()]
    }

    /// Forget the cached value of one axis
    pub fn reset_axis(&mut self, axis: Axis) {
        self.last_sent[axis.index()] = None;
    }

    /// Forget all cached values
    pub fn reset(&mut self) {
        self.last_sent = [None; 3];
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
