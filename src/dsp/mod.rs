//! Low-level DSP primitives used by the voice engine.
//!
//! These components are allocation-free once built and realtime-safe, making
//! them safe to embed directly inside voice structs. They stay focused on the
//! signal math; note bookkeeping lives in `synth`.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Interpolating wavetable oscillator.
pub mod oscillator;
/// Immutable single-period waveform tables.
pub mod wavetable;

pub use envelope::{Envelope, EnvelopeParams, EnvelopeStage};
pub use oscillator::WavetableOscillator;
pub use wavetable::Wavetable;
