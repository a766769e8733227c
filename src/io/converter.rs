use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Pitch wheel range, in cents, at full deflection.
pub const PITCH_BEND_RANGE_CENTS: f32 = 200.0;

/// CC 123: All Notes Off.
const CC_ALL_NOTES_OFF: u8 = 123;

pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }

    match midi {
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            note: key,
            velocity: velocity_to_unit(velocity),
        }),
        MidiEvent::NoteOff { key, velocity, .. } => Some(SynthMessage::NoteOff {
            note: key,
            velocity: velocity_to_unit(velocity),
        }),
        MidiEvent::PitchBend { value, .. } => Some(SynthMessage::PitchBend {
            cents: value as f32 / 8192.0 * PITCH_BEND_RANGE_CENTS,
        }),
        MidiEvent::ControlChange {
            controller: CC_ALL_NOTES_OFF,
            ..
        } => Some(SynthMessage::AllNotesOff),
        _ => None,
    }
}

/// MIDI velocity (0..=127) to the engine's 0.0..=1.0 scale.
#[inline]
pub fn velocity_to_unit(velocity: u8) -> f32 {
    f32::from(velocity.min(127)) / 127.0
}

/// 12-TET, A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_to_freq_reference_points() {
        assert_eq!(midi_note_to_freq(69), 440.0);
        assert!((midi_note_to_freq(60) - 261.6256).abs() < 1e-3);
        assert!((midi_note_to_freq(0) - 8.175_799).abs() < 1e-4);
        assert!((midi_note_to_freq(127) - 12_543.854).abs() < 0.05);
    }

    #[test]
    fn filters_by_channel() {
        let on = MidiEvent::NoteOn {
            channel: 1,
            key: 60,
            velocity: 127,
        };
        assert_eq!(midi_to_synth(on, 0), None);
        assert_eq!(
            midi_to_synth(on, 1),
            Some(SynthMessage::NoteOn {
                note: 60,
                velocity: 1.0
            })
        );
    }

    #[test]
    fn maps_bend_and_panic_messages() {
        let bend = MidiEvent::PitchBend {
            channel: 0,
            value: -8192,
        };
        assert_eq!(
            midi_to_synth(bend, 0),
            Some(SynthMessage::PitchBend { cents: -200.0 })
        );

        let cc = MidiEvent::ControlChange {
            channel: 0,
            controller: 123,
            value: 0,
        };
        assert_eq!(midi_to_synth(cc, 0), Some(SynthMessage::AllNotesOff));

        let sustain_pedal = MidiEvent::ControlChange {
            channel: 0,
            controller: 64,
            value: 127,
        };
        assert_eq!(midi_to_synth(sustain_pedal, 0), None);
    }

    #[test]
    fn decoded_bytes_round_into_messages() {
        let event = MidiEvent::from_bytes(&[0x90, 69, 0]).unwrap();
        assert_eq!(
            midi_to_synth(event, 0),
            Some(SynthMessage::NoteOff {
                note: 69,
                velocity: 0.0
            })
        );
    }
}
