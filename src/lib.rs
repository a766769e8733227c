pub mod config; // Engine construction settings
pub mod dsp;
pub mod error;
pub mod io;
pub mod synth; // Voice management and polyphony

pub use config::EngineConfig;
pub use dsp::envelope::EnvelopeParams;
pub use error::SynthError;
pub use synth::{handle::SynthHandle, poly::PolySynth};

pub const MAX_BLOCK_SIZE: usize = 2048;
/// Fallback used whenever a host hands us an unusable sample rate.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;
/// Number of addressable MIDI notes (0..=127).
pub const MIDI_NOTE_COUNT: usize = 128;
