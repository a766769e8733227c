//! Audio device setup and the render callback

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::RingBuffer;

use wavetable_synth::{EngineConfig, PolySynth, MAX_BLOCK_SIZE};

use crate::ui::{state::PoolSnapshot, UiApp};

/// Samples buffered for the scope/spectrum. A few blocks of slack.
const SCOPE_RING_SIZE: usize = 8192;
/// Snapshots in flight; the UI only ever wants the newest.
const SNAPSHOT_RING_SIZE: usize = 16;

pub struct App {
    config: EngineConfig,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Open the default output device, start the engine, run the TUI.
    ///
    /// Returns when the user quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        tracing::info!(sample_rate, channels, "output device opened");

        let config = self.config.with_sample_rate(sample_rate);
        let (mut synth, handle) = PolySynth::new(config);
        synth.prepare(sample_rate, MAX_BLOCK_SIZE);

        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_RING_SIZE);
        let (mut snapshot_tx, snapshot_rx) = RingBuffer::<PoolSnapshot>::new(SNAPSHOT_RING_SIZE);

        // The callback owns the synth outright; control arrives through `handle`
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    synth.render(block);

                    // Mono to every channel
                    let offset = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let frame = offset + i * channels;
                        data[frame..frame + channels].fill(s);
                        // Scope falls behind rather than blocking audio
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames;
                }

                let _ = snapshot_tx.push(PoolSnapshot::capture(synth.pool()));
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;

        stream.play().wrap_err("failed to start audio stream")?;

        let mut ui = UiApp::new(handle, scope_rx, snapshot_rx, config, sample_rate);
        let mut terminal = ratatui::init();
        let result = ui.run(&mut terminal);
        ratatui::restore();

        drop(stream);
        tracing::info!("audio stream closed");
        result
    }
}
