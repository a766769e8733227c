use crate::{
    dsp::{
        envelope::{Envelope, EnvelopeParams, EnvelopeStage},
        oscillator::WavetableOscillator,
        wavetable::Wavetable,
    },
    io::converter::midi_note_to_freq,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One oscillator + one envelope, sounding at most one note at a time.
pub struct Voice {
    note: Option<u8>,
    velocity: f32,
    state: VoiceState,
    age: u64,
    pitch_bend_cents: f32,
    velocity_sensitive: bool,
    osc: WavetableOscillator,
    env: Envelope,
}

impl Voice {
    pub fn new(
        table: Wavetable,
        sample_rate: f32,
        params: EnvelopeParams,
        max_amplitude: f32,
    ) -> Self {
        Self {
            note: None,
            velocity: 0.0,
            state: VoiceState::Free,
            age: 0,
            pitch_bend_cents: 0.0,
            velocity_sensitive: false,
            osc: WavetableOscillator::new(table, sample_rate),
            env: Envelope::new(params, max_amplitude, sample_rate),
        }
    }

    pub fn with_velocity_sensitivity(mut self, enabled: bool) -> Self {
        self.velocity_sensitive = enabled;
        self
    }

    /// Start (or restart) a note. `age` orders voices for stealing.
    ///
    /// The oscillator keeps its phase and the envelope keeps its amplitude,
    /// so reassigning a sounding voice glides into the new note rather than
    /// clicking.
    pub fn assign(&mut self, note: u8, velocity: f32, age: u64) {
        self.note = Some(note);
        self.velocity = velocity.clamp(0.0, 1.0);
        self.state = VoiceState::Active;
        self.age = age;

        self.retune();
        self.env.note_on();
    }

    /// Restart the envelope for the note already held, keeping the voice's age.
    pub fn retrigger(&mut self, velocity: f32) {
        if let Some(note) = self.note {
            self.assign(note, velocity, self.age);
        }
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.env.note_off();
        }
    }

    /// Envelope times and peak used by the next `assign`.
    pub fn set_envelope(&mut self, params: EnvelopeParams, max_amplitude: f32) {
        self.env.set_params(params);
        self.env.set_max_amplitude(max_amplitude);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.osc.set_sample_rate(sample_rate);
        self.env.set_sample_rate(sample_rate);
        self.retune();
    }

    /// Offset the pitch of the held note. Phase is preserved.
    pub fn set_pitch_bend(&mut self, cents: f32) {
        self.pitch_bend_cents = cents;
        self.retune();
    }

    fn retune(&mut self) {
        if let Some(note) = self.note {
            let base = midi_note_to_freq(note);
            let freq = if self.pitch_bend_cents != 0.0 {
                base * 2.0_f32.powf(self.pitch_bend_cents / 1200.0)
            } else {
                base
            };
            self.osc.set_frequency(freq);
        }
    }

    /// One sample of output: envelope times oscillator.
    #[inline]
    pub fn render_sample(&mut self) -> f32 {
        let sample = self.env.step() * self.osc.next_sample();
        if self.velocity_sensitive {
            sample * self.velocity
        } else {
            sample
        }
    }

    /// Add this voice's next `out.len()` samples into `out`.
    pub fn render_into(&mut self, out: &mut [f32]) {
        for o in out.iter_mut() {
            *o += self.render_sample();
        }
    }

    /// Free, or finished its release and waiting to be reclaimed.
    pub fn is_idle(&self) -> bool {
        self.state == VoiceState::Free || self.env.is_finished()
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    /// Return to the free state. A sounding envelope is cut.
    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = None;
        self.velocity = 0.0;
        self.env.reset();
    }

    pub fn note(&self) -> Option<u8> {
        self.note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.amplitude()
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.env.stage()
    }

    pub fn frequency(&self) -> f32 {
        self.osc.frequency()
    }

    pub fn oscillator(&self) -> &WavetableOscillator {
        &self.osc
    }

    pub fn envelope(&self) -> &Envelope {
        &self.env
    }
}
