//! Voice state shipped from the audio thread to the UI
//!
//! Everything here is `Copy` and fixed-size: the audio callback builds one
//! snapshot per buffer and pushes it through a ring without allocating.

use wavetable_synth::{
    config::MAX_VOICES,
    dsp::EnvelopeStage,
    synth::{pool::VoicePool, voice::VoiceState},
};

/// One voice, as the UI sees it.
#[derive(Clone, Copy, Debug)]
pub struct VoiceView {
    pub state: VoiceState,
    pub note: Option<u8>,
    pub stage: EnvelopeStage,
    pub level: f32,
    pub frequency: f32,
}

impl Default for VoiceView {
    fn default() -> Self {
        Self {
            state: VoiceState::Free,
            note: None,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            frequency: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PoolSnapshot {
    pub voices: [VoiceView; MAX_VOICES],
    pub voice_count: usize,
    pub active: usize,
    pub steals: u64,
}

impl Default for PoolSnapshot {
    fn default() -> Self {
        Self {
            voices: [VoiceView::default(); MAX_VOICES],
            voice_count: 0,
            active: 0,
            steals: 0,
        }
    }
}

impl PoolSnapshot {
    pub fn capture(pool: &VoicePool) -> Self {
        let mut snapshot = Self::default();
        for (view, voice) in snapshot.voices.iter_mut().zip(pool.voices()) {
            *view = VoiceView {
                state: voice.state(),
                note: voice.note(),
                stage: voice.envelope_stage(),
                level: voice.envelope_level(),
                frequency: voice.frequency(),
            };
        }
        snapshot.voice_count = pool.len().min(MAX_VOICES);
        snapshot.active = pool.active_count();
        snapshot.steals = pool.steal_count();
        snapshot
    }

    pub fn voices(&self) -> &[VoiceView] {
        &self.voices[..self.voice_count]
    }
}
