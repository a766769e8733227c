use rtrb::{Consumer, RingBuffer};

use crate::{
    config::EngineConfig,
    dsp::{
        envelope::EnvelopeParams,
        oscillator::sanitize_sample_rate,
        wavetable::Wavetable,
    },
    synth::{handle::SynthHandle, message::SynthMessage, pool::VoicePool},
    MAX_BLOCK_SIZE,
};

/*
Threading
=========

    UI / MIDI thread                        audio thread
    ────────────────                        ────────────
    SynthHandle ──push──→ [ rtrb ring ] ──pop──→ PolySynth::render
                                                   │
                                                   ├─ drain events
                                                   ├─ mix voices (chunked)
                                                   └─ reclaim finished voices

The voice pool and note map belong to the audio thread alone; nothing is
shared and nothing locks. Events queued during a block take effect at the
start of the next one.

Single-threaded hosts can skip the handle and call `note_on` etc. on the
synth directly; those apply immediately.
*/

pub struct PolySynth {
    pool: VoicePool,
    rx: Consumer<SynthMessage>,
    sample_rate: f32,
    max_block_size: usize,
}

impl PolySynth {
    /// Build the engine and the handle that feeds it.
    pub fn new(config: EngineConfig) -> (Self, SynthHandle) {
        // `sine` clamps the size itself; `with_wavetable` sanitizes the rest
        Self::with_wavetable(config, Wavetable::sine(config.table_size))
    }

    /// Same as `new`, but every voice reads from `table` instead of a sine.
    pub fn with_wavetable(config: EngineConfig, table: Wavetable) -> (Self, SynthHandle) {
        let config = config.sanitized();
        let (tx, rx) = RingBuffer::new(config.queue_capacity);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            voices = config.voices,
            table_size = table.len(),
            sample_rate = config.sample_rate,
            "poly synth created"
        );

        let synth = Self {
            pool: VoicePool::new(&config, table),
            rx,
            sample_rate: config.sample_rate,
            max_block_size: config.max_block_size,
        };
        (synth, SynthHandle::new(tx, config.queue_capacity))
    }

    /// Adopt the host's stream settings. Call before the first `render`.
    ///
    /// Sounding voices are retuned in place.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.max_block_size = max_block_size.clamp(1, MAX_BLOCK_SIZE);
        self.pool.set_sample_rate(self.sample_rate);

        #[cfg(feature = "tracing")]
        tracing::info!(
            sample_rate = self.sample_rate,
            max_block_size = self.max_block_size,
            "poly synth prepared"
        );
    }

    /// Fill `out` with the next mono samples.
    ///
    /// Queued events apply first. Buffers longer than the prepared block size
    /// are rendered in chunks; finished voices are reclaimed after each chunk.
    pub fn render(&mut self, out: &mut [f32]) {
        self.drain_messages();

        for chunk in out.chunks_mut(self.max_block_size) {
            self.pool.render_block(chunk);
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.pop() {
            self.apply(msg);
        }
    }

    /// Apply one event right now, bypassing the queue.
    pub fn apply(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity } => {
                self.pool.note_on(note, velocity);
            }
            SynthMessage::NoteOff { note, .. } => self.pool.note_off(note),
            SynthMessage::PitchBend { cents } => self.pool.set_pitch_bend(cents),
            SynthMessage::SetEnvelope(params) => self.pool.set_envelope(params),
            SynthMessage::SetAmplitude(amplitude) => self.pool.set_max_amplitude(amplitude),
            SynthMessage::AllNotesOff => self.pool.all_notes_off(),
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: f32) -> Option<usize> {
        self.pool.note_on(note, velocity)
    }

    pub fn note_off(&mut self, note: u8, _velocity: f32) {
        self.pool.note_off(note);
    }

    pub fn set_envelope(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.pool
            .set_envelope(EnvelopeParams::new(attack, decay, sustain, release));
    }

    pub fn set_amplitude(&mut self, max_amplitude: f32) {
        self.pool.set_max_amplitude(max_amplitude);
    }

    pub fn pitch_bend(&mut self, cents: f32) {
        self.pool.set_pitch_bend(cents);
    }

    pub fn all_notes_off(&mut self) {
        self.pool.all_notes_off();
    }

    /// Cut every voice without a release tail.
    pub fn panic(&mut self) {
        self.pool.kill_all();
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}
