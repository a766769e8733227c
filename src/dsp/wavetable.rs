use std::sync::Arc;

use crate::error::SynthError;

/*
Wavetables
==========

A wavetable is one period of a waveform, sampled N times and stored once.
Playing it back at different speeds gives different pitches: read one entry
per sample and the waveform repeats every N samples; skip ahead two entries
per sample and it repeats twice as often.

Vocabulary
----------

  period      One full cycle of the waveform (0 → 2π for a sine).

  table size  N, the number of samples in one period. Bigger tables give
              cleaner interpolation at the cost of memory. 4096 is plenty
              for a sine.

  guard point An extra sample at index N holding a copy of sample 0. The
              oscillator interpolates between table[i] and table[i + 1];
              with the guard point, i = N - 1 still has a neighbour and the
              read never needs a wraparound branch.


Layout
------

    index:   0     1     2    ...   N-1     N
           ┌─────┬─────┬─────┬───┬─────┬───────┐
           │ s0  │ s1  │ s2  │...│sN-1 │ s0    │  ← guard (copy of s0)
           └─────┴─────┴─────┴───┴─────┴───────┘
           └──────── one period ──────┘


Sharing
-------

Every voice reads the same table and nobody writes to it after construction,
so the samples live behind an `Arc<[f32]>`. Cloning a `Wavetable` bumps a
reference count; it never copies samples. Clones happen when voices are
built, never on the audio thread.
*/

/// Default table length used by the engine.
pub const DEFAULT_TABLE_SIZE: usize = 4096;

/// Smallest table the oscillator can interpolate.
pub const MIN_TABLE_SIZE: usize = 2;

/// Largest table accepted. Phase is an f32 index, so much past this the
/// fractional part used for interpolation loses its precision.
pub const MAX_TABLE_SIZE: usize = 1 << 16;

/// Immutable single-period waveform with a trailing guard point.
#[derive(Debug, Clone)]
pub struct Wavetable {
    samples: Arc<[f32]>,
}

impl Wavetable {
    /// One period of a sine wave. Sizes are clamped to
    /// `MIN_TABLE_SIZE..=MAX_TABLE_SIZE`.
    pub fn sine(size: usize) -> Self {
        let size = size.clamp(MIN_TABLE_SIZE, MAX_TABLE_SIZE);
        Self::build(size, |phase| (std::f32::consts::TAU * phase).sin())
    }

    /// Build a table by evaluating `shape` at `size` evenly spaced phases in
    /// [0, 1).
    ///
    /// Output is clamped to [-1.0, 1.0]; non-finite values become silence.
    pub fn from_fn(size: usize, shape: impl Fn(f32) -> f32) -> Result<Self, SynthError> {
        if size < MIN_TABLE_SIZE {
            return Err(SynthError::WavetableTooShort { len: size });
        }
        if size > MAX_TABLE_SIZE {
            return Err(SynthError::WavetableTooLong {
                len: size,
                max: MAX_TABLE_SIZE,
            });
        }

        Ok(Self::build(size, |phase| {
            let value = shape(phase);
            if value.is_finite() {
                value.clamp(-1.0, 1.0)
            } else {
                0.0
            }
        }))
    }

    /// Wrap one period of samples (without guard point) into a table.
    ///
    /// Unlike `from_fn`, samples are taken verbatim, so anything outside
    /// [-1.0, 1.0] is rejected rather than clamped.
    pub fn from_samples(mut period: Vec<f32>) -> Result<Self, SynthError> {
        if period.len() < MIN_TABLE_SIZE {
            return Err(SynthError::WavetableTooShort { len: period.len() });
        }
        if period.len() > MAX_TABLE_SIZE {
            return Err(SynthError::WavetableTooLong {
                len: period.len(),
                max: MAX_TABLE_SIZE,
            });
        }

        if let Some((index, &value)) = period
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || v.abs() > 1.0)
        {
            return Err(SynthError::WavetableSampleOutOfRange { index, value });
        }

        period.push(period[0]);
        Ok(Self {
            samples: period.into(),
        })
    }

    fn build(size: usize, shape: impl Fn(f32) -> f32) -> Self {
        let mut samples = Vec::with_capacity(size + 1);
        for i in 0..size {
            samples.push(shape(i as f32 / size as f32));
        }
        samples.push(samples[0]);

        Self {
            samples: samples.into(),
        }
    }

    /// Number of samples in one period (N), excluding the guard point.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len() - 1
    }

    /// Always false: a table holds at least `MIN_TABLE_SIZE` samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All N + 1 samples, guard point included.
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Linear interpolation at a fractional index in [0, N).
    #[inline]
    pub fn interpolate(&self, index: f32) -> f32 {
        let i = (index as usize).min(self.len() - 1);
        let frac = index - i as f32;
        let a = self.samples[i];
        let b = self.samples[i + 1];
        a + frac * (b - a)
    }

    /// True when both tables read the same shared samples.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.samples, &other.samples)
    }
}

impl Default for Wavetable {
    fn default() -> Self {
        Self::sine(DEFAULT_TABLE_SIZE)
    }
}
