//! wavetable - play the polyphonic engine from the computer keyboard
//!
//! Run with: cargo run --release
//! Logs go to `wavetable.log` (the terminal belongs to the UI). Set
//! `RUST_LOG=debug` for more detail.

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::App;
use wavetable_synth::EngineConfig;

const LOG_FILE: &str = "wavetable.log";

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    tracing::info!("starting wavetable");

    App::new(EngineConfig::default()).run()
}

fn init_logging() -> EyreResult<()> {
    let file = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {LOG_FILE}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
