use crate::{dsp::wavetable::Wavetable, DEFAULT_SAMPLE_RATE};

/*
Wavetable Oscillator
====================

The oscillator walks through a wavetable at a speed set by the pitch we
want, reading (and interpolating) one value per output sample.

Vocabulary
----------

  phase       Where we are in the table, as a fractional index in [0, N).
              Phase 10.25 means "a quarter of the way from entry 10 to 11".

  increment   How far phase moves each sample. Derived from frequency:

                  increment = frequency * N / sample_rate

              Example: 440 Hz, N = 4096, 48 kHz
                  increment = 440 * 4096 / 48000 ≈ 37.55 entries/sample
                  period    = 4096 / 37.55 ≈ 109.09 samples  (= 48000 / 440 ✓)


Linear Interpolation
--------------------

Phase almost never lands exactly on a table entry, so we blend the two
entries around it:

    i     = floor(phase)
    frac  = phase - i
    value = table[i] + frac * (table[i + 1] - table[i])

        table[i+1] ┤            ●
                   │         ◆       ◆ = interpolated value at frac ≈ 0.6
        table[i]   ┤  ●
                   └──┴─────────┴──→ phase
                      i        i+1

The guard point at table[N] makes `i + 1` valid even for i = N - 1.


Wraparound
----------

After reading, phase += increment. When phase reaches N we subtract N
rather than taking a modulo: one compare and one subtract, no division, and
no negative remainders. This is only correct while increment < N, which is
why set_frequency clamps to Nyquist (increment ≤ N / 2).

Changing frequency recomputes the increment but leaves phase alone, so pitch
changes (bends, retuning a stolen voice) are click-free.
*/

/// Lowest frequency we accept. Anything at or below zero is raised to this.
pub const MIN_FREQUENCY: f32 = 1.0e-3;

pub struct WavetableOscillator {
    table: Wavetable,
    sample_rate: f32,
    frequency: f32,
    phase: f32,
    increment: f32,
}

impl WavetableOscillator {
    pub fn new(table: Wavetable, sample_rate: f32) -> Self {
        let mut osc = Self {
            table,
            sample_rate: DEFAULT_SAMPLE_RATE,
            frequency: 440.0,
            phase: 0.0,
            increment: 0.0,
        };
        osc.set_sample_rate(sample_rate);
        osc
    }

    /// Set pitch in Hz. Phase is preserved.
    pub fn set_frequency(&mut self, frequency: f32) {
        let nyquist = self.sample_rate * 0.5;
        // +inf lands on Nyquist; only NaN has no direction
        self.frequency = if frequency.is_nan() {
            MIN_FREQUENCY
        } else {
            frequency.clamp(MIN_FREQUENCY, nyquist)
        };
        self.update_increment();
    }

    /// Set sample rate in Hz. Invalid rates fall back to `DEFAULT_SAMPLE_RATE`.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        // Re-clamp: a lower sample rate also lowers Nyquist.
        self.set_frequency(self.frequency);
    }

    fn update_increment(&mut self) {
        self.increment = self.frequency * self.table.len() as f32 / self.sample_rate;
    }

    /// Produce one interpolated sample and advance phase.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let value = self.table.interpolate(self.phase);

        self.phase += self.increment;
        let len = self.table.len() as f32;
        if self.phase >= len {
            self.phase -= len;
        }

        value
    }

    /// Fill a buffer with consecutive samples.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// Rewind to the start of the table.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn phase_increment(&self) -> f32 {
        self.increment
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn table(&self) -> &Wavetable {
        &self.table
    }
}

/// Clamp a host-provided sample rate to something we can divide by.
#[inline]
pub(crate) fn sanitize_sample_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}
