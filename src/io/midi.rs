/// Channel voice messages the engine understands.
///
/// Decoding only: receiving bytes from hardware or an OS MIDI API is up to
/// the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const PROGRAM_CHANGE: u8 = 0xC0;
const PITCH_BEND: u8 = 0xE0;

impl MidiEvent {
    /// Decode one complete message (status byte first).
    ///
    /// Returns `None` for unsupported or truncated messages. A note-on with
    /// velocity 0 is reported as a note-off, as MIDI running status expects.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, payload) = bytes.split_first()?;
        if status & 0x80 == 0 {
            return None;
        }

        let channel = status & 0x0F;
        // Data bytes have the top bit clear; mask rather than reject.
        let data = |i: usize| payload.get(i).map(|b| b & 0x7F);

        match status & 0xF0 {
            NOTE_OFF => Some(Self::NoteOff {
                channel,
                key: data(0)?,
                velocity: data(1)?,
            }),
            NOTE_ON => {
                let key = data(0)?;
                let velocity = data(1)?;
                if velocity == 0 {
                    Some(Self::NoteOff {
                        channel,
                        key,
                        velocity: 0,
                    })
                } else {
                    Some(Self::NoteOn {
                        channel,
                        key,
                        velocity,
                    })
                }
            }
            CONTROL_CHANGE => Some(Self::ControlChange {
                channel,
                controller: data(0)?,
                value: data(1)?,
            }),
            PROGRAM_CHANGE => Some(Self::ProgramChange {
                channel,
                program: data(0)?,
            }),
            PITCH_BEND => {
                // 14-bit, LSB first, centred on 8192
                let raw = (u16::from(data(1)?) << 7) | u16::from(data(0)?);
                Some(Self::PitchBend {
                    channel,
                    value: raw as i16 - 8192,
                })
            }
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::PitchBend { channel, .. }
            | Self::ProgramChange { channel, .. } => channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_note_messages() {
        assert_eq!(
            MidiEvent::from_bytes(&[0x90, 60, 100]),
            Some(MidiEvent::NoteOn {
                channel: 0,
                key: 60,
                velocity: 100
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0x83, 64, 40]),
            Some(MidiEvent::NoteOff {
                channel: 3,
                key: 64,
                velocity: 40
            })
        );
    }

    #[test]
    fn note_on_with_zero_velocity_is_note_off() {
        assert_eq!(
            MidiEvent::from_bytes(&[0x91, 67, 0]),
            Some(MidiEvent::NoteOff {
                channel: 1,
                key: 67,
                velocity: 0
            })
        );
    }

    #[test]
    fn decodes_pitch_bend_around_centre() {
        let centre = MidiEvent::from_bytes(&[0xE0, 0x00, 0x40]);
        assert_eq!(centre, Some(MidiEvent::PitchBend { channel: 0, value: 0 }));

        let max = MidiEvent::from_bytes(&[0xE0, 0x7F, 0x7F]);
        assert_eq!(max, Some(MidiEvent::PitchBend { channel: 0, value: 8191 }));

        let min = MidiEvent::from_bytes(&[0xE0, 0x00, 0x00]);
        assert_eq!(min, Some(MidiEvent::PitchBend { channel: 0, value: -8192 }));
    }

    #[test]
    fn rejects_truncated_and_unknown_messages() {
        assert_eq!(MidiEvent::from_bytes(&[]), None);
        assert_eq!(MidiEvent::from_bytes(&[0x90, 60]), None);
        assert_eq!(MidiEvent::from_bytes(&[60, 100]), None);
        assert_eq!(MidiEvent::from_bytes(&[0xF8]), None); // timing clock
    }

    #[test]
    fn decodes_control_and_program_change() {
        let cc = MidiEvent::from_bytes(&[0xB2, 123, 0]).unwrap();
        assert_eq!(cc.channel(), 2);
        assert_eq!(
            cc,
            MidiEvent::ControlChange {
                channel: 2,
                controller: 123,
                value: 0
            }
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xC0, 5]),
            Some(MidiEvent::ProgramChange {
                channel: 0,
                program: 5
            })
        );
    }
}
