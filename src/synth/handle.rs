use rtrb::Producer;

use crate::{
    dsp::envelope::EnvelopeParams,
    error::SynthError,
    synth::message::SynthMessage,
    MIDI_NOTE_COUNT,
};

/// Control-side end of the event queue.
///
/// Lives on the UI or MIDI thread. Every call is a single non-blocking push;
/// the audio thread applies queued events at the start of its next block.
pub struct SynthHandle {
    tx: Producer<SynthMessage>,
    capacity: usize,
}

impl SynthHandle {
    pub(crate) fn new(tx: Producer<SynthMessage>, capacity: usize) -> Self {
        Self { tx, capacity }
    }

    /// Queue a note-on. Notes above 127 are dropped without touching the queue.
    pub fn note_on(&mut self, note: u8, velocity: f32) -> Result<(), SynthError> {
        if note as usize >= MIDI_NOTE_COUNT {
            return Ok(());
        }
        self.send(SynthMessage::NoteOn { note, velocity })
    }

    /// Queue a note-off. Release velocity is carried along but not used.
    pub fn note_off(&mut self, note: u8, velocity: f32) -> Result<(), SynthError> {
        if note as usize >= MIDI_NOTE_COUNT {
            return Ok(());
        }
        self.send(SynthMessage::NoteOff { note, velocity })
    }

    /// New ADSR for subsequent note-ons. Times in seconds, sustain 0.0..=1.0.
    pub fn set_envelope(
        &mut self,
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    ) -> Result<(), SynthError> {
        self.send(SynthMessage::SetEnvelope(EnvelopeParams::new(
            attack, decay, sustain, release,
        )))
    }

    /// New per-voice peak for subsequent note-ons.
    pub fn set_amplitude(&mut self, max_amplitude: f32) -> Result<(), SynthError> {
        self.send(SynthMessage::SetAmplitude(max_amplitude))
    }

    pub fn pitch_bend(&mut self, cents: f32) -> Result<(), SynthError> {
        self.send(SynthMessage::PitchBend { cents })
    }

    pub fn all_notes_off(&mut self) -> Result<(), SynthError> {
        self.send(SynthMessage::AllNotesOff)
    }

    /// Push a raw message. Fails if the audio thread has fallen behind.
    pub fn send(&mut self, msg: SynthMessage) -> Result<(), SynthError> {
        self.tx.push(msg).map_err(|_| {
            #[cfg(feature = "tracing")]
            tracing::warn!(?msg, capacity = self.capacity, "synth queue full, event dropped");

            SynthError::QueueFull {
                capacity: self.capacity,
            }
        })
    }

    /// Free slots left in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
