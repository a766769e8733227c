//! Whole-engine benchmarks.
//!
//! These drive `PolySynth` the way a host does: events in, blocks out.

mod voices;

pub use voices::bench_voices;
