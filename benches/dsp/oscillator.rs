//! Benchmarks for wavetable lookup.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavetable_synth::dsp::{oscillator::WavetableOscillator, wavetable::Wavetable};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Default 4096-point sine, one interpolated lookup per sample
        let mut osc = WavetableOscillator::new(Wavetable::default(), 48_000.0);
        osc.set_frequency(440.0);
        group.bench_with_input(BenchmarkId::new("sine_4096", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // Small table, same cost per sample but fewer cache lines
        let mut osc = WavetableOscillator::new(Wavetable::sine(256), 48_000.0);
        osc.set_frequency(440.0);
        group.bench_with_input(BenchmarkId::new("sine_256", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // Near Nyquist: the wrap branch is taken almost every sample
        let mut osc = WavetableOscillator::new(Wavetable::default(), 48_000.0);
        osc.set_frequency(20_000.0);
        group.bench_with_input(BenchmarkId::new("high_freq", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
