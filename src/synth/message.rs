use crate::dsp::envelope::EnvelopeParams;

/// Control events sent from the UI/MIDI side to the audio thread.
///
/// Every variant is `Copy` and fixed-size so it can travel through a
/// lock-free ring buffer without allocating.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: f32 },
    NoteOff { note: u8, velocity: f32 },
    PitchBend { cents: f32 },
    /// New envelope shape for notes started after this message.
    SetEnvelope(EnvelopeParams),
    /// New peak amplitude for notes started after this message.
    SetAmplitude(f32),
    AllNotesOff,
}
