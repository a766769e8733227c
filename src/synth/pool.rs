use crate::{
    config::EngineConfig,
    dsp::{envelope::EnvelopeParams, wavetable::Wavetable},
    synth::{mixer::Mixer, voice::Voice},
    MIDI_NOTE_COUNT,
};

/*
Voice Pool
==========

A fixed arena of voices plus two indexes into it:

  free stack   Indices of voices that are not sounding. Pop to allocate,
               push to reclaim. Allocated with room for every voice up
               front, so pushing never grows it.

  note map     One slot per MIDI note holding the index of the voice that
               owns it. O(1) lookup on note-on/off, no hashing, no heap.

Every voice index is in exactly one place: the free stack, or one slot of
the note map.

    note map                    voices               free stack
    ┌────┬──────┐             ┌─────────┐            ┌───┐
    │ 60 │  0 ──┼───────────→ │ 0  C4   │            │ 3 │ ← top
    │ 64 │  2 ──┼──────┐      │ 1  ---  │ ←──────────┤ 1 │
    │ 67 │  -   │      └────→ │ 2  E4   │            └───┘
    └────┴──────┘             │ 3  ---  │
                              └─────────┘


Note On
-------

  1. The note already owns a voice → retrigger that voice. Rapid re-presses
     of one key never eat a second voice.
  2. A free voice exists → pop it, assign, record the mapping.
  3. Pool exhausted → steal the oldest active voice. "Oldest" is the
     smallest assignment number; numbers only go up, so there are no ties.
     The victim's old mapping is dropped before it takes the new note.


Note Off
--------

Releases the voice but keeps the mapping. The voice still owns its note
until the release tail finishes, so a stray second note-off does nothing and
a quick re-press retriggers the same voice (case 1).


Reclaim
-------

After each rendered block, voices whose envelopes finished go back on the
free stack and their note slots are cleared.
*/

pub struct VoicePool {
    voices: Vec<Voice>,
    free: Vec<usize>,
    note_map: [Option<usize>; MIDI_NOTE_COUNT],
    mixer: Mixer,

    // Applied to voices as they are (re)triggered
    envelope: EnvelopeParams,
    max_amplitude: f32,
    pitch_bend_cents: f32,

    next_age: u64,
    steals: u64,
}

impl VoicePool {
    pub fn new(config: &EngineConfig, table: Wavetable) -> Self {
        let config = config.sanitized();

        let voices = (0..config.voices)
            .map(|_| {
                Voice::new(
                    table.clone(),
                    config.sample_rate,
                    config.envelope,
                    config.max_amplitude,
                )
                .with_velocity_sensitivity(config.velocity_sensitive)
            })
            .collect();

        // Reversed so voice 0 is handed out first
        let free = (0..config.voices).rev().collect();

        Self {
            voices,
            free,
            note_map: [None; MIDI_NOTE_COUNT],
            mixer: Mixer::new(),
            envelope: config.envelope,
            max_amplitude: config.max_amplitude,
            pitch_bend_cents: 0.0,
            next_age: 0,
            steals: 0,
        }
    }

    /// Start `note`, returning the index of the voice playing it.
    ///
    /// Notes above 127 are ignored. Never fails for valid notes: when every
    /// voice is busy the oldest is stolen.
    pub fn note_on(&mut self, note: u8, velocity: f32) -> Option<usize> {
        let slot = note as usize;
        if slot >= MIDI_NOTE_COUNT {
            return None;
        }
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };

        if let Some(idx) = self.note_map[slot] {
            let voice = &mut self.voices[idx];
            voice.set_envelope(self.envelope, self.max_amplitude);
            voice.retrigger(velocity);
            return Some(idx);
        }

        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => self.steal_oldest()?,
        };

        let age = self.next_age;
        self.next_age += 1;

        let voice = &mut self.voices[idx];
        voice.set_envelope(self.envelope, self.max_amplitude);
        voice.assign(note, velocity, age);
        self.note_map[slot] = Some(idx);

        Some(idx)
    }

    /// Pick the longest-held active voice and detach it from its note.
    fn steal_oldest(&mut self) -> Option<usize> {
        let idx = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .min_by_key(|(_, v)| v.age())
            .map(|(idx, _)| idx)?;

        if let Some(old_note) = self.voices[idx].note() {
            self.note_map[old_note as usize] = None;
        }
        self.steals += 1;

        Some(idx)
    }

    /// Release `note`. The voice keeps the note until its tail finishes.
    pub fn note_off(&mut self, note: u8) {
        if let Some(&Some(idx)) = self.note_map.get(note as usize) {
            self.voices[idx].release();
        }
    }

    /// Release every sounding voice.
    pub fn all_notes_off(&mut self) {
        for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
            voice.release();
        }
    }

    /// Silence everything immediately and return all voices to the free stack.
    pub fn kill_all(&mut self) {
        for (idx, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_active() {
                voice.free();
                self.free.push(idx);
            }
        }
        self.note_map = [None; MIDI_NOTE_COUNT];
    }

    /// Mix all active voices into `out`, then reclaim finished ones.
    pub fn render_block(&mut self, out: &mut [f32]) {
        self.mixer.render_block(&mut self.voices, out);
        self.reclaim();
    }

    /// Move voices whose release has finished back to the free stack.
    pub fn reclaim(&mut self) {
        for (idx, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_active() && voice.is_idle() {
                if let Some(note) = voice.note() {
                    self.note_map[note as usize] = None;
                }
                voice.free();
                self.free.push(idx);
            }
        }
    }

    /// Envelope for notes started from now on. Sounding notes keep theirs.
    pub fn set_envelope(&mut self, params: EnvelopeParams) {
        self.envelope = params.sanitized();
    }

    /// Peak amplitude for notes started from now on.
    pub fn set_max_amplitude(&mut self, max_amplitude: f32) {
        self.max_amplitude = crate::dsp::envelope::sanitize_amplitude(max_amplitude);
    }

    /// Bend every voice, sounding or not. Phases are preserved.
    pub fn set_pitch_bend(&mut self, cents: f32) {
        self.pitch_bend_cents = if cents.is_finite() { cents } else { 0.0 };
        for voice in &mut self.voices {
            voice.set_pitch_bend(self.pitch_bend_cents);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Total number of voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// How many times a sounding voice was taken for a new note.
    pub fn steal_count(&self) -> u64 {
        self.steals
    }

    /// Index of the voice that owns `note`, if any.
    pub fn voice_for_note(&self, note: u8) -> Option<usize> {
        self.note_map.get(note as usize).copied().flatten()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn envelope(&self) -> EnvelopeParams {
        self.envelope
    }

    pub fn max_amplitude(&self) -> f32 {
        self.max_amplitude
    }

    pub fn pitch_bend(&self) -> f32 {
        self.pitch_bend_cents
    }
}
