//! Engine construction settings.
//!
//! Everything here is read once, when a `PolySynth` is built (or prepared).
//! Out-of-range values are clamped by `sanitized()` rather than rejected:
//! a host that passes a zero sample rate still gets a working engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{
        envelope::{sanitize_amplitude, EnvelopeParams},
        oscillator::sanitize_sample_rate,
        wavetable::{DEFAULT_TABLE_SIZE, MAX_TABLE_SIZE, MIN_TABLE_SIZE},
    },
    MAX_BLOCK_SIZE,
};

/// Default polyphony.
pub const DEFAULT_VOICES: usize = 8;
/// Upper bound on polyphony; keeps per-sample work bounded.
pub const MAX_VOICES: usize = 64;
/// Default capacity of the control → audio event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Samples per second. Replaced by `prepare()` when the host knows better.
    pub sample_rate: f32,
    /// Largest block `render` handles in one pass; longer buffers are chunked.
    pub max_block_size: usize,
    /// Number of voices in the pool.
    pub voices: usize,
    /// Samples per wavetable period.
    pub table_size: usize,
    /// Peak envelope amplitude per voice.
    pub max_amplitude: f32,
    /// Envelope applied to new notes until changed.
    pub envelope: EnvelopeParams,
    /// Slots in the control → audio event queue.
    pub queue_capacity: usize,
    /// Scale each voice by its note-on velocity.
    pub velocity_sensitive: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_block_size: 512,
            voices: DEFAULT_VOICES,
            table_size: DEFAULT_TABLE_SIZE,
            max_amplitude: 1.0,
            envelope: EnvelopeParams::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            velocity_sensitive: false,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = table_size;
        self
    }

    pub fn with_max_amplitude(mut self, max_amplitude: f32) -> Self {
        self.max_amplitude = max_amplitude;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeParams) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_velocity_sensitivity(mut self, enabled: bool) -> Self {
        self.velocity_sensitive = enabled;
        self
    }

    /// Clamp every field into a range the engine can run with.
    pub fn sanitized(self) -> Self {
        let clean = Self {
            sample_rate: sanitize_sample_rate(self.sample_rate),
            max_block_size: self.max_block_size.clamp(1, MAX_BLOCK_SIZE),
            voices: self.voices.clamp(1, MAX_VOICES),
            table_size: self.table_size.clamp(MIN_TABLE_SIZE, MAX_TABLE_SIZE),
            max_amplitude: sanitize_amplitude(self.max_amplitude),
            envelope: self.envelope.sanitized(),
            queue_capacity: self.queue_capacity.max(1),
            velocity_sensitive: self.velocity_sensitive,
        };

        #[cfg(feature = "tracing")]
        if clean != self {
            tracing::warn!(requested = ?self, using = ?clean, "engine config clamped");
        }

        clean
    }
}
