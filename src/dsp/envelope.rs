use crate::dsp::oscillator::sanitize_sample_rate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
ADSR Envelope Implementation
============================

A linear Attack/Decay/Sustain/Release generator. Every voice owns one and
multiplies its oscillator output by the envelope's amplitude.

Vocabulary
----------

  amplitude     The envelope's current output (0.0 to max_amplitude).

  max_amplitude Peak reached at the end of Attack. The voice's loudness
                ceiling; 1.0 unless the host turns it down.

  sustain_frac  Sustain level as a fraction of max_amplitude.

  rate          How much amplitude changes per sample in a stage. Rates are
                computed once, when parameters or the sample rate change,
                not every sample.


The Shape
---------

  Amplitude
    max ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release


Rates
-----

Times are converted to sample counts (never fewer than one sample, so zero
times mean "jump in a single step"):

    attack_rate  = max / max(attack  * sr, 1)
    decay_rate   = max * (1 - S) / max(decay   * sr, 1)
    release_rate = max * S       / max(release * sr, 1)

Release is sized for the drop from the sustain level. Releasing from higher
up (during attack or decay) uses the same slope, so the tail is a little
longer than `release` seconds.


The State Machine
-----------------

Each step first checks whether the current stage is complete, and only then
applies that stage's rate. On the boundary sample the amplitude is clamped
to the target and the stage changes; no rate is applied in that sample.

    ┌──────┐ note_on ┌────────┐ amp ≥ max ┌───────┐ amp ≤ S ┌─────────┐
    │ Idle │ ──────→ │ Attack │ ────────→ │ Decay │ ──────→ │ Sustain │
    └──────┘         └────────┘           └───────┘         └─────────┘
        ↑                 │ note_off          │ note_off         │ note_off
        │                 └───────────┐       │       ┌──────────┘
        │                             ↓       ↓       ↓
        │   amp ≤ 0 (finished)       ┌─────────────────┐
        └─────────────────────────── │     Release     │
                                     └─────────────────┘

note_on never resets amplitude: a retrigger ramps up from wherever the
envelope currently is, so there is no click.

Release is special: at note_off we snapshot the starting level and work out
how many steps of the release slope it takes to reach zero, then interpolate
linearly from the snapshot:

    amplitude = start * (1 - elapsed / total)

Summing thousands of small f32 decrements drifts on long releases and leaves
a residue that would have to be dropped in one sample. Interpolating lands
on exactly 0.0 at step `total`, never falls faster than the release slope,
and a release from Sustain finishes within ceil(release * sr) steps.
*/

/// Current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // Never triggered, or release finished. amplitude = 0
    Attack,  // Ramping up to max_amplitude
    Decay,   // Ramping down to the sustain level
    Sustain, // Holding the sustain level while the key is down
    Release, // Key released, ramping down to 0
}

/// Attack/decay/release times in seconds, sustain as a fraction of peak.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Negative or non-finite times become 0; sustain is clamped to [0, 1].
    pub fn sanitized(self) -> Self {
        fn time(t: f32) -> f32 {
            if t.is_finite() {
                t.max(0.0)
            } else {
                0.0
            }
        }

        let sustain = if self.sustain.is_finite() {
            self.sustain.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            attack: time(self.attack),
            decay: time(self.decay),
            sustain,
            release: time(self.release),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        // 100ms attack, 200ms decay, 90% sustain, 100ms release
        Self::new(0.1, 0.2, 0.9, 0.1)
    }
}

/// Clamp a peak amplitude into [0, 1]. Non-finite values become 1.
#[inline]
pub(crate) fn sanitize_amplitude(amplitude: f32) -> f32 {
    if amplitude.is_finite() {
        amplitude.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

pub struct Envelope {
    // Shape (copied per voice so in-flight notes keep their own)
    params: EnvelopeParams,
    max_amplitude: f32,
    sample_rate: f32,

    // Per-sample rates derived from the shape
    attack_rate: f32,
    decay_rate: f32,
    release_rate: f32,

    // Runtime state
    stage: EnvelopeStage,
    amplitude: f32,
    finished: bool,

    // Release bookkeeping (fixed at note_off)
    release_start: f32,
    release_total: u32,
    release_elapsed: u32,
}

impl Envelope {
    pub fn new(params: EnvelopeParams, max_amplitude: f32, sample_rate: f32) -> Self {
        let mut env = Self {
            params: params.sanitized(),
            max_amplitude: sanitize_amplitude(max_amplitude),
            sample_rate: sanitize_sample_rate(sample_rate),
            attack_rate: 0.0,
            decay_rate: 0.0,
            release_rate: 0.0,
            stage: EnvelopeStage::Idle,
            amplitude: 0.0,
            finished: false,
            release_start: 0.0,
            release_total: 0,
            release_elapsed: 0,
        };
        env.update_rates();
        env
    }

    /// Replace the ADSR shape. Takes effect from the next step.
    pub fn set_params(&mut self, params: EnvelopeParams) {
        self.params = params.sanitized();
        self.update_rates();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.update_rates();
    }

    /// Change the peak. A sounding envelope above the new peak is pulled down.
    pub fn set_max_amplitude(&mut self, max_amplitude: f32) {
        self.max_amplitude = sanitize_amplitude(max_amplitude);
        self.amplitude = self.amplitude.min(self.max_amplitude);
        self.update_rates();
    }

    fn update_rates(&mut self) {
        let sr = self.sample_rate;
        let max = self.max_amplitude;
        let sustain = self.params.sustain;

        self.attack_rate = max / (self.params.attack * sr).max(1.0);
        self.decay_rate = max * (1.0 - sustain) / (self.params.decay * sr).max(1.0);
        self.release_rate = max * sustain / (self.params.release * sr).max(1.0);

        if self.stage == EnvelopeStage::Release {
            self.begin_release();
        }
    }

    fn sustain_level(&self) -> f32 {
        self.params.sustain * self.max_amplitude
    }

    /// Gate high: (re)enter Attack from the current amplitude.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.finished = false;
    }

    /// Gate low: enter Release from whatever stage we're in.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }

        self.stage = EnvelopeStage::Release;
        self.begin_release();
    }

    fn begin_release(&mut self) {
        // Sustain 0 gives a zero release slope; size the tail from the
        // current amplitude instead so the note still ends.
        let slope = if self.release_rate > 0.0 {
            self.release_rate
        } else {
            self.amplitude / (self.params.release * self.sample_rate).max(1.0)
        };

        self.release_start = self.amplitude;
        self.release_elapsed = 0;
        self.release_total = if self.amplitude > 0.0 && slope > 0.0 {
            let steps = f64::from(self.amplitude) / f64::from(slope);
            // Shave the rounding error of the slope so an exact count stays exact
            (steps * (1.0 - 1.0e-6)).ceil().clamp(1.0, f64::from(u32::MAX)) as u32
        } else {
            0
        };
    }

    /// Advance one sample and return the new amplitude.
    #[inline]
    pub fn step(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.amplitude = 0.0;
            }

            EnvelopeStage::Attack => {
                if self.amplitude >= self.max_amplitude {
                    self.amplitude = self.max_amplitude;
                    self.stage = EnvelopeStage::Decay;
                } else {
                    self.amplitude = (self.amplitude + self.attack_rate).min(self.max_amplitude);
                }
            }

            EnvelopeStage::Decay => {
                let target = self.sustain_level();
                if self.amplitude <= target {
                    self.amplitude = target;
                    self.stage = EnvelopeStage::Sustain;
                } else {
                    self.amplitude = (self.amplitude - self.decay_rate).max(target);
                }
            }

            EnvelopeStage::Sustain => {
                self.amplitude = self.sustain_level();
            }

            EnvelopeStage::Release => {
                self.release_elapsed = self.release_elapsed.saturating_add(1);
                if self.release_elapsed >= self.release_total {
                    self.finish();
                } else {
                    // In f64: elapsed/total must stay exact over millions of steps
                    let progress = f64::from(self.release_elapsed) / f64::from(self.release_total);
                    self.amplitude =
                        ((f64::from(self.release_start) * (1.0 - progress)) as f32).max(0.0);
                }
            }
        }

        debug_assert!(self.amplitude >= 0.0 && self.amplitude <= self.max_amplitude);
        self.amplitude
    }

    fn finish(&mut self) {
        self.amplitude = 0.0;
        self.stage = EnvelopeStage::Idle;
        self.finished = true;
        self.release_elapsed = self.release_total;
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.step();
        }
    }

    /// True once Release has decayed to zero. Cleared by `note_on`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True while the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Silence immediately and return to Idle.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.amplitude = 0.0;
        self.finished = false;
        self.release_elapsed = self.release_total;
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    pub fn max_amplitude(&self) -> f32 {
        self.max_amplitude
    }

    pub fn attack_rate(&self) -> f32 {
        self.attack_rate
    }

    pub fn decay_rate(&self) -> f32 {
        self.decay_rate
    }

    pub fn release_rate(&self) -> f32 {
        self.release_rate
    }

    /// Steps left before a running release reaches zero.
    pub fn release_steps_left(&self) -> u32 {
        if self.stage == EnvelopeStage::Release {
            self.release_total - self.release_elapsed
        } else {
            0
        }
    }
}
