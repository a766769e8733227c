//! Error types for the non-realtime parts of the engine.
//!
//! Nothing on the audio path returns these: rendering clamps or ignores bad
//! input instead. They surface only where a caller can act on them, such as
//! building a custom wavetable or pushing into a full event queue.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// The table needs at least two samples per period.
    #[error("wavetable needs at least 2 samples per period, got {len}")]
    WavetableTooShort { len: usize },

    /// The table is longer than `MAX_TABLE_SIZE`.
    #[error("wavetable of {len} samples exceeds the {max}-sample limit")]
    WavetableTooLong { len: usize, max: usize },

    /// A table sample was NaN, infinite, or outside [-1.0, 1.0].
    #[error("wavetable sample {index} is out of range: {value}")]
    WavetableSampleOutOfRange { index: usize, value: f32 },

    /// The control → audio ring buffer has no free slot; the event was dropped.
    #[error("synth event queue is full ({capacity} slots)")]
    QueueFull { capacity: usize },
}
