//! Benchmarks for the ADSR envelope.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion};
use wavetable_synth::dsp::envelope::{Envelope, EnvelopeParams};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter_batched_ref(
                || {
                    let mut env = Envelope::new(EnvelopeParams::new(1.0, 0.1, 0.7, 0.3), 1.0, SAMPLE_RATE);
                    env.note_on();
                    env
                },
                |env| env.render(black_box(&mut buffer)),
                BatchSize::SmallInput,
            )
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::new(EnvelopeParams::new(0.001, 0.001, 0.7, 0.3), 1.0, SAMPLE_RATE);
        env.note_on();
        // Advance past attack/decay
        for _ in 0..200 {
            env.step();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Release phase (ramping down)
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter_batched_ref(
                || {
                    let mut env = Envelope::new(EnvelopeParams::new(0.001, 0.001, 0.7, 1.0), 1.0, SAMPLE_RATE);
                    env.note_on();
                    for _ in 0..200 {
                        env.step();
                    }
                    env.note_off();
                    env
                },
                |env| env.render(black_box(&mut buffer)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}
