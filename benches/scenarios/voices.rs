//! Benchmarks for full polyphonic renders.
//!
//! Cost should grow with the number of sounding voices, not the pool size:
//! free voices are skipped entirely.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use wavetable_synth::{EngineConfig, EnvelopeParams, PolySynth};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

fn synth(voices: usize) -> PolySynth {
    let config = EngineConfig::default()
        .with_voices(voices)
        .with_envelope(EnvelopeParams::new(0.005, 0.05, 0.7, 0.2));
    let (mut synth, _handle) = PolySynth::new(config);
    synth.prepare(SAMPLE_RATE, 512);
    synth
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === IDLE ===
        // Eight free voices: drain + mix + reclaim with nothing to do
        let mut idle = synth(8);
        group.bench_with_input(BenchmarkId::new("idle_8", size), &size, |b, _| {
            b.iter(|| {
                idle.render(black_box(&mut buffer));
            })
        });

        // === SINGLE NOTE ===
        let mut single = synth(8);
        single.note_on(69, 1.0);
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| {
                single.render(black_box(&mut buffer));
            })
        });

        // === FULL CHORD ===
        // Every voice held; the steady-state worst case
        let mut chord = synth(8);
        for note in [48, 52, 55, 60, 64, 67, 71, 72] {
            chord.note_on(note, 1.0);
        }
        group.bench_with_input(BenchmarkId::new("chord_8", size), &size, |b, _| {
            b.iter(|| {
                chord.render(black_box(&mut buffer));
            })
        });

        // === LARGE POOL ===
        let mut wide = synth(32);
        for note in 40..72 {
            wide.note_on(note, 1.0);
        }
        group.bench_with_input(BenchmarkId::new("chord_32", size), &size, |b, _| {
            b.iter(|| {
                wide.render(black_box(&mut buffer));
            })
        });

        // === CHURN ===
        // A new note every block on a full pool: allocation, stealing,
        // release and reclaim all on the hot path
        let mut churn = synth(8);
        let mut note = 36u8;
        group.bench_with_input(BenchmarkId::new("churn_8", size), &size, |b, _| {
            b.iter(|| {
                churn.note_off(note, 0.0);
                note = if note >= 96 { 36 } else { note + 7 };
                churn.note_on(note, 1.0);
                churn.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
