//! MIDI message encoding and the output transport seam.
//!
//! The emitter decides *what* to send; a [`MidiTransport`] decides *how*.
//! With the `midi-io` feature enabled, [`port::MidiPort`] sends through a
//! system MIDI port; otherwise [`LogTransport`] and [`NullTransport`] are
//! available for headless runs and debug mode.

/// Duplicate-suppressing Control Change emitter
pub mod emitter;

/// System MIDI output port backed by `midir`
#[cfg(feature = "midi-io")]
pub mod port;

use crate::{
    constants::{
        DEFAULT_NOTE_VELOCITY, MIDI_CHANNEL_MAX, MIDI_DATA_MAX, STATUS_CONTROL_CHANGE, STATUS_NOTE_OFF,
        STATUS_NOTE_ON,
    },
    Result,
};
use log::debug;

/// Channel voice message understood by the transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Control Change: controller number and value
    ControlChange {
        /// Zero-based channel
        channel: u8,
        /// Controller number
        cc: u8,
        /// Controller value
        value: u8,
    },
    /// Note On with velocity
    NoteOn {
        /// Zero-based channel
        channel: u8,
        /// Note number
        note: u8,
        /// Velocity
        velocity: u8,
    },
    /// Note Off (sent with velocity 0)
    NoteOff {
        /// Zero-based channel
        channel: u8,
        /// Note number
        note: u8,
    },
}

impl MidiMessage {
    /// Control Change message
    #[must_use]
    pub const fn control_change(channel: u8, cc: u8, value: u8) -> Self {
        Self::ControlChange { channel, cc, value }
    }

    /// Note On message with the default velocity
    #[must_use]
    pub const fn note_on(channel: u8, note: u8) -> Self {
        Self::NoteOn {
            channel,
            note,
            velocity: DEFAULT_NOTE_VELOCITY,
        }
    }

    /// Note Off message
    #[must_use]
    pub const fn note_off(channel: u8, note: u8) -> Self {
        Self::NoteOff { channel, note }
    }

    /// Encode as a three-byte wire message.
    ///
    /// Channel is masked to four bits and data bytes to seven so that the
    /// result is always a well-formed message.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 3] {
        match self {
            Self::ControlChange { channel, cc, value } => [
                STATUS_CONTROL_CHANGE | (channel & MIDI_CHANNEL_MAX),
                cc & MIDI_DATA_MAX,
                value & MIDI_DATA_MAX,
            ],
            Self::NoteOn {
                channel,
                note,
                velocity,
            } => [
                STATUS_NOTE_ON | (channel & MIDI_CHANNEL_MAX),
                note & MIDI_DATA_MAX,
                velocity & MIDI_DATA_MAX,
            ],
            Self::NoteOff { channel, note } => [
                STATUS_NOTE_OFF | (channel & MIDI_CHANNEL_MAX),
                note & MIDI_DATA_MAX,
                0,
            ],
        }
    }
}

/// Outbound MIDI transport.
///
/// Implementations must treat sends on a closed port as a successful no-op.
pub trait MidiTransport: Send {
    /// Send one message
    ///
    /// # Errors
    ///
    /// Returns an error if an open port rejects the message
    fn send(&mut self, message: MidiMessage) -> Result<()>;

    /// Whether messages currently reach a port
    fn is_open(&self) -> bool;

    /// Send a Control Change message
    ///
    /// # Errors
    ///
    /// Returns an error if an open port rejects the message
    fn send_control_change(&mut self, channel: u8, cc: u8, value: u8) -> Result<()> {
        self.send(MidiMessage::control_change(channel, cc, value))
    }
}

impl<T: MidiTransport + ?Sized> MidiTransport for Box<T> {
    fn send(&mut self, message: MidiMessage) -> Result<()> {
        (**self).send(message)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Transport with no port attached; every send is dropped
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl MidiTransport for NullTransport {
    fn send(&mut self, _message: MidiMessage) -> Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        false
    }
}

/// Transport that writes encoded messages to the log at debug level
#[derive(Debug, Default, Clone)]
pub struct LogTransport {
    sent: usize,
}

impl LogTransport {
    /// Number of messages written so far
    #[must_use]
    pub const fn sent(&self) -> usize {
        self.sent
    }
}

impl MidiTransport for LogTransport {
    fn send(&mut self, message: MidiMessage) -> Result<()> {
        let [status, data1, data2] = message.to_bytes();
        debug!("MIDI out: {status:02X} {data1:02X} {data2:02X}");
        self.sent += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_change_bytes() {
        assert_eq!(MidiMessage::control_change(0, 1, 95).to_bytes(), [0xB0, 1, 95]);
        assert_eq!(MidiMessage::control_change(9, 74, 127).to_bytes(), [0xB9, 74, 127]);
    }

    #[test]
    fn test_note_bytes() {
        assert_eq!(MidiMessage::note_on(2, 60).to_bytes(), [0x92, 60, 64]);
        assert_eq!(MidiMessage::note_off(2, 60).to_bytes(), [0x82, 60, 0]);
    }

    #[test]
    fn test_out_of_range_fields_are_masked() {
        let [status, cc, value] = MidiMessage::control_change(17, 200, 255).to_bytes();
        assert_eq!(status & 0xF0, 0xB0);
        assert!(cc <= 127 && value <= 127);
    }

    #[test]
    fn test_null_transport_is_closed_noop() {
        let mut transport = NullTransport;
        assert!(!transport.is_open());
        assert!(transport.send_control_change(0, 1, 2).is_ok());
    }

    #[test]
    fn test_log_transport_counts() {
        let mut transport: Box<dyn MidiTransport> = Box::new(LogTransport::default());
        transport.send_control_change(0, 1, 2).unwrap();
        transport.send(MidiMessage::note_on(0, 60)).unwrap();
        assert!(transport.is_open());
    }
}
