use crate::synth::voice::Voice;

/// Sums voices into an output buffer.
///
/// Voices are added, not averaged: eight voices at full scale can reach 8.0.
/// Headroom (or clipping) is the host's call, via the configured peak
/// amplitude or its own limiter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mixer;

impl Mixer {
    pub fn new() -> Self {
        Self
    }

    /// Zero `out`, then accumulate every active voice into it in place.
    ///
    /// Returns how many voices contributed.
    pub fn render_block(&self, voices: &mut [Voice], out: &mut [f32]) -> usize {
        out.fill(0.0);

        let mut mixed = 0;
        for voice in voices.iter_mut().filter(|v| v.is_active()) {
            voice.render_into(out);
            mixed += 1;
        }
        mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{envelope::EnvelopeParams, wavetable::Wavetable};

    fn voices(count: usize) -> Vec<Voice> {
        let table = Wavetable::sine(1024);
        (0..count)
            .map(|_| Voice::new(table.clone(), 48_000.0, EnvelopeParams::new(0.0, 0.0, 1.0, 0.1), 1.0))
            .collect()
    }

    #[test]
    fn silent_when_no_voice_is_active() {
        let mut voices = voices(4);
        let mut out = [0.7f32; 64];

        let mixed = Mixer::new().render_block(&mut voices, &mut out);

        assert_eq!(mixed, 0);
        assert!(out.iter().all(|&s| s == 0.0), "stale buffer contents must be cleared");
    }

    #[test]
    fn sums_rather_than_averages() {
        // Two identical voices should give exactly twice one voice
        let mut single = voices(1);
        let mut pair = voices(2);
        single[0].assign(69, 1.0, 0);
        pair[0].assign(69, 1.0, 0);
        pair[1].assign(69, 1.0, 1);

        let mut a = [0.0f32; 128];
        let mut b = [0.0f32; 128];
        let mixer = Mixer::new();
        assert_eq!(mixer.render_block(&mut single, &mut a), 1);
        assert_eq!(mixer.render_block(&mut pair, &mut b), 2);

        for (x, y) in a.iter().zip(&b) {
            assert!((x * 2.0 - y).abs() < 1e-6);
        }
        assert!(b.iter().any(|s| s.abs() > 1.0), "sum is allowed to exceed unity");
    }
}
