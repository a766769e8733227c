use rustfft::{num_complex::Complex, FftPlanner};
use wavetable_synth::{
    dsp::{EnvelopeStage, Wavetable},
    synth::{
        message::SynthMessage,
        voice::{Voice, VoiceState},
    },
    EngineConfig, EnvelopeParams, PolySynth, SynthError,
};

const SAMPLE_RATE: f32 = 48_000.0;
const BLOCK: usize = 512;

fn prepared(config: EngineConfig) -> (PolySynth, wavetable_synth::SynthHandle) {
    let (mut synth, handle) = PolySynth::new(config);
    synth.prepare(SAMPLE_RATE, BLOCK);
    (synth, handle)
}

fn render_blocks(synth: &mut PolySynth, blocks: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; blocks * BLOCK];
    for chunk in out.chunks_mut(BLOCK) {
        synth.render(chunk);
    }
    out
}

#[test]
fn single_note_sounds_then_fades_out() {
    let (mut synth, mut handle) = prepared(EngineConfig::default());
    handle.note_on(69, 1.0).unwrap();

    // Attack + decay take 0.3 s; 30 blocks lands in sustain
    let held = render_blocks(&mut synth, 30);
    assert!(held.iter().any(|s| s.abs() > 0.5));
    assert!(held.iter().all(|s| s.is_finite() && s.abs() <= 1.0));

    // One sample drains the note-off and takes the first release step
    handle.note_off(69, 1.0).unwrap();
    synth.render(&mut [0.0f32; 1]);
    let idx = synth.pool().voice_for_note(69).unwrap();
    let left = synth.pool().voices()[idx].envelope().release_steps_left() as usize;
    // 0.1 s release at 48 kHz
    assert!(left > 0 && left < 4800);

    // Stop one sample short of the end of the tail
    let mut tail = vec![0.0f32; left - 1];
    synth.render(&mut tail);
    let voice = &synth.pool().voices()[idx];
    assert_eq!(voice.state(), VoiceState::Releasing);
    assert!(!voice.envelope().is_finished());
    assert!(voice.envelope_level() > 0.0);
    assert!(voice.envelope_level() <= EnvelopeParams::default().sustain / 4000.0);

    // The final step outputs exact silence, then the voice is reclaimed
    let mut last = [1.0f32; 1];
    synth.render(&mut last);
    assert_eq!(last[0], 0.0);
    assert_eq!(synth.pool().active_count(), 0);
    assert_eq!(synth.pool().voice_for_note(69), None);

    let after = render_blocks(&mut synth, 1);
    assert!(after.iter().all(|&s| s == 0.0));
}

#[test]
fn voice_reaches_zero_before_it_is_reclaimed() {
    let params = EnvelopeParams::default();
    let mut voice = Voice::new(Wavetable::sine(4096), SAMPLE_RATE, params, 1.0);
    voice.assign(60, 1.0, 0);
    for _ in 0..(SAMPLE_RATE as usize / 2) {
        voice.render_sample();
    }
    assert_eq!(voice.envelope_stage(), EnvelopeStage::Sustain);

    voice.release();
    let limit = (params.release * SAMPLE_RATE).ceil() as usize;
    let mut steps = 0;
    while !voice.envelope().is_finished() {
        voice.render_sample();
        steps += 1;
        assert!(steps <= limit, "release ran past {limit} samples");
    }

    assert_eq!(voice.envelope_level(), 0.0);
    assert!(voice.is_idle());
    // Still holds its note until something reclaims it
    assert_eq!(voice.state(), VoiceState::Releasing);
    assert_eq!(voice.note(), Some(60));
}

#[test]
fn a4_peaks_at_440_hz() {
    let (mut synth, mut handle) = prepared(EngineConfig::default());
    handle.note_on(69, 1.0).unwrap();

    // Past attack + decay, into sustain
    render_blocks(&mut synth, 40);

    // 4800 points at 48 kHz: 10 Hz per bin, so 440 Hz lands on bin 44
    let mut samples = vec![0.0f32; 4800];
    synth.render(&mut samples);

    let mut spectrum: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    FftPlanner::new()
        .plan_fft_forward(spectrum.len())
        .process(&mut spectrum);

    let peak = spectrum[1..spectrum.len() / 2]
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
        .map(|(i, _)| i + 1)
        .unwrap();
    assert_eq!(peak, 44);
}

#[test]
fn oldest_voice_is_stolen_across_the_queue() {
    let config = EngineConfig::default().with_voices(2);
    let (mut synth, mut handle) = prepared(config);

    handle.note_on(60, 1.0).unwrap();
    render_blocks(&mut synth, 1);
    handle.note_on(64, 1.0).unwrap();
    render_blocks(&mut synth, 1);
    handle.note_on(67, 1.0).unwrap();
    render_blocks(&mut synth, 1);

    let pool = synth.pool();
    assert_eq!(pool.active_count(), 2);
    assert_eq!(pool.steal_count(), 1);
    assert_eq!(pool.voice_for_note(60), None);
    assert!(pool.voice_for_note(64).is_some());
    assert!(pool.voice_for_note(67).is_some());
}

#[test]
fn repeated_note_retriggers_one_voice() {
    let (mut synth, mut handle) = prepared(EngineConfig::default());

    handle.note_on(60, 1.0).unwrap();
    render_blocks(&mut synth, 4);
    handle.note_off(60, 1.0).unwrap();
    render_blocks(&mut synth, 1);
    handle.note_on(60, 1.0).unwrap();
    render_blocks(&mut synth, 1);

    let pool = synth.pool();
    assert_eq!(pool.active_count(), 1);
    let idx = pool.voice_for_note(60).unwrap();
    assert_eq!(pool.voices()[idx].state(), VoiceState::Active);
}

#[test]
fn events_wait_for_the_next_block() {
    let (mut synth, mut handle) = prepared(EngineConfig::default());
    let mut out = vec![0.0f32; BLOCK];
    synth.render(&mut out);
    assert!(out.iter().all(|&s| s == 0.0));

    handle.send(SynthMessage::NoteOn {
        note: 72,
        velocity: 1.0,
    })
    .unwrap();
    assert_eq!(synth.pool().active_count(), 0);

    synth.render(&mut out);
    assert!(out.iter().any(|&s| s != 0.0));
}

#[test]
fn queue_overflow_is_reported_not_blocking() {
    let config = EngineConfig::default().with_queue_capacity(4);
    let (mut synth, mut handle) = prepared(config);

    for note in 60..64 {
        handle.note_on(note, 1.0).unwrap();
    }
    assert!(matches!(
        handle.note_on(64, 1.0),
        Err(SynthError::QueueFull { capacity: 4 })
    ));

    // Draining frees the queue again
    render_blocks(&mut synth, 1);
    assert!(handle.note_on(64, 1.0).is_ok());
}

#[test]
fn envelope_change_applies_to_later_notes() {
    let (mut synth, mut handle) = prepared(EngineConfig::default());
    handle.note_on(60, 1.0).unwrap();
    render_blocks(&mut synth, 1);

    handle.set_envelope(0.0, 0.0, 0.25, 0.05).unwrap();
    handle.note_on(64, 1.0).unwrap();
    render_blocks(&mut synth, 1);

    let pool = synth.pool();
    let held = pool.voice_for_note(60).unwrap();
    let fresh = pool.voice_for_note(64).unwrap();
    assert_eq!(
        pool.voices()[held].envelope().params(),
        EnvelopeParams::default()
    );
    assert_eq!(pool.voices()[fresh].envelope().params().sustain, 0.25);
    // Instant attack/decay: already sitting on the new sustain level
    assert_eq!(pool.voices()[fresh].envelope_level(), 0.25);
}

#[test]
fn full_chord_sums_past_unity() {
    let (mut synth, mut handle) = prepared(EngineConfig::default());
    for note in [60, 64, 67, 72] {
        handle.note_on(note, 1.0).unwrap();
    }
    let out = render_blocks(&mut synth, 40);
    assert!(out.iter().any(|s| s.abs() > 1.0));
    assert!(out.iter().all(|s| s.abs() <= 4.0));
}
