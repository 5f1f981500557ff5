//! MIDI message decoding (spec section 4.12's input to the Playback
//! Callback; supplemented feature "full MIDI message decoding").
//!
//! Grounded on `original_source/MidiPlayer/DfxMidi.h`/`.cpp`'s
//! `Parse*` family: each channel-voice status nibble decodes into its
//! own variant, with the channel masked into the low nibble and data
//! bytes masked to 7 bits.

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    Aftertouch { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// 14-bit bend amount, centered at 0 (range roughly -8192..=8191).
    PitchBend { channel: u8, amount: i16 },
    /// Status byte 0xF0-0xFF and any following data bytes, unparsed.
    System { bytes: Vec<u8> },
}

impl MidiMessage {
    /// Decode one MIDI channel-voice or system message from raw bytes.
    /// Returns `None` for a status byte outside the recognized set or a
    /// message too short for its status (malformed, dropped).
    pub fn parse(bytes: &[u8]) -> Option<MidiMessage> {
        let status = *bytes.first()?;
        let channel = status & 0x0f;

        match status & 0xf0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: *bytes.get(1)? & 0x7f,
                velocity: *bytes.get(2)? & 0x7f,
            }),
            0x90 => Some(MidiMessage::NoteOn {
                channel,
                note: *bytes.get(1)? & 0x7f,
                velocity: *bytes.get(2)? & 0x7f,
            }),
            0xa0 => Some(MidiMessage::Aftertouch {
                channel,
                note: *bytes.get(1)? & 0x7f,
                pressure: *bytes.get(2)? & 0x7f,
            }),
            0xb0 => Some(MidiMessage::ControlChange {
                channel,
                controller: *bytes.get(1)? & 0x7f,
                value: *bytes.get(2)? & 0x7f,
            }),
            0xc0 => Some(MidiMessage::ProgramChange {
                channel,
                program: *bytes.get(1)? & 0x7f,
            }),
            0xd0 => Some(MidiMessage::ChannelAftertouch {
                channel,
                pressure: *bytes.get(1)? & 0x7f,
            }),
            0xe0 => {
                let lsb = (*bytes.get(1)? & 0x7f) as i16;
                let msb = (*bytes.get(2)? & 0x7f) as i16;
                let amount = (lsb | (msb << 7)) - 0x2000;
                Some(MidiMessage::PitchBend { channel, amount })
            }
            0xf0 => Some(MidiMessage::System { bytes: bytes.to_vec() }),
            _ => None,
        }
    }

    /// A non-zero-velocity note-on, the only event the Playback
    /// Callback acts on (spec section 4.12 step 1).
    pub fn as_note_on(&self) -> Option<(u8, u8)> {
        match *self {
            MidiMessage::NoteOn { note, velocity, .. } if velocity > 0 => Some((note, velocity)),
            _ => None,
        }
    }
}

/// Lock-free single-producer single-consumer handoff for decoded MIDI
/// messages, from the MIDI input thread to the Playback Callback (spec
/// section 5's "only cross-thread handoff"). Grounded on the teacher's
/// `ringbuf`-based audio ring buffer.
pub fn midi_queue(capacity: usize) -> (MidiProducer, MidiConsumer) {
    let (prod, cons) = HeapRb::<MidiMessage>::new(capacity).split();
    (MidiProducer { inner: prod }, MidiConsumer { inner: cons })
}

pub struct MidiProducer {
    inner: HeapProd<MidiMessage>,
}

impl MidiProducer {
    /// Push a message, dropping it if the queue is full rather than
    /// blocking the MIDI input thread.
    pub fn push(&mut self, message: MidiMessage) {
        let _ = self.inner.try_push(message);
    }
}

pub struct MidiConsumer {
    inner: HeapCons<MidiMessage>,
}

impl MidiConsumer {
    pub fn pop(&mut self) -> Option<MidiMessage> {
        self.inner.try_pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_queue_round_trips_messages_in_order() {
        let (mut prod, mut cons) = midi_queue(4);
        prod.push(MidiMessage::NoteOn { channel: 0, note: 10, velocity: 64 });
        prod.push(MidiMessage::NoteOff { channel: 0, note: 10, velocity: 0 });
        assert_eq!(cons.pop(), Some(MidiMessage::NoteOn { channel: 0, note: 10, velocity: 64 }));
        assert_eq!(cons.pop(), Some(MidiMessage::NoteOff { channel: 0, note: 10, velocity: 0 }));
        assert_eq!(cons.pop(), None);
    }

    #[test]
    fn full_queue_drops_the_newest_message() {
        let (mut prod, mut cons) = midi_queue(1);
        prod.push(MidiMessage::ProgramChange { channel: 0, program: 1 });
        prod.push(MidiMessage::ProgramChange { channel: 0, program: 2 });
        assert_eq!(cons.pop(), Some(MidiMessage::ProgramChange { channel: 0, program: 1 }));
        assert_eq!(cons.pop(), None);
    }

    #[test]
    fn parses_note_on_and_off() {
        assert_eq!(
            MidiMessage::parse(&[0x90, 64, 100]),
            Some(MidiMessage::NoteOn { channel: 0, note: 64, velocity: 100 })
        );
        assert_eq!(
            MidiMessage::parse(&[0x81, 64, 0]),
            Some(MidiMessage::NoteOff { channel: 1, note: 64, velocity: 0 })
        );
    }

    #[test]
    fn note_on_with_zero_velocity_is_not_a_sounding_note_on() {
        let msg = MidiMessage::parse(&[0x90, 64, 0]).unwrap();
        assert_eq!(msg.as_note_on(), None);
    }

    #[test]
    fn pitch_bend_centers_at_zero() {
        assert_eq!(
            MidiMessage::parse(&[0xe0, 0, 0x40]),
            Some(MidiMessage::PitchBend { channel: 0, amount: 0 })
        );
    }

    #[test]
    fn control_change_and_program_change_decode() {
        assert_eq!(
            MidiMessage::parse(&[0xb3, 7, 127]),
            Some(MidiMessage::ControlChange { channel: 3, controller: 7, value: 127 })
        );
        assert_eq!(
            MidiMessage::parse(&[0xc2, 5]),
            Some(MidiMessage::ProgramChange { channel: 2, program: 5 })
        );
    }

    #[test]
    fn system_message_keeps_raw_bytes() {
        let msg = MidiMessage::parse(&[0xf0, 0x7e, 0x00, 0xf7]).unwrap();
        assert_eq!(msg, MidiMessage::System { bytes: vec![0xf0, 0x7e, 0x00, 0xf7] });
    }

    #[test]
    fn truncated_message_is_rejected() {
        assert_eq!(MidiMessage::parse(&[0x90, 64]), None);
        assert_eq!(MidiMessage::parse(&[]), None);
    }
}
