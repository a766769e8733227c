//! Terminal UI: keyboard piano, envelope controls, voice table, scope
//!
//! Runs on the main thread. Talks to the engine only through the
//! `SynthHandle` queue and reads back samples and voice snapshots from two
//! more rings filled by the audio callback.

mod keyboard;
mod spectrum;
pub mod state;
mod waveform;

use std::{
    io::stdout,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use wavetable_synth::{
    dsp::EnvelopeStage, io::converter::PITCH_BEND_RANGE_CENTS, synth::voice::VoiceState,
    EngineConfig, EnvelopeParams, SynthError, SynthHandle,
};

use keyboard::Keyboard;
use spectrum::{render_spectrum, Spectrum};
use state::PoolSnapshot;
use waveform::render_waveform;

/// Samples shown in the scope; also the FFT size.
const SCOPE_LEN: usize = 2048;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Which parameter the arrow keys adjust.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Param {
    Attack,
    Decay,
    Sustain,
    Release,
    Amplitude,
}

impl Param {
    const ALL: [Param; 5] = [
        Param::Attack,
        Param::Decay,
        Param::Sustain,
        Param::Release,
        Param::Amplitude,
    ];

    fn label(self) -> &'static str {
        match self {
            Param::Attack => "Attack",
            Param::Decay => "Decay",
            Param::Sustain => "Sustain",
            Param::Release => "Release",
            Param::Amplitude => "Amp",
        }
    }

    fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

pub struct UiApp {
    handle: SynthHandle,
    scope_rx: Consumer<f32>,
    snapshot_rx: Consumer<PoolSnapshot>,

    scope: Vec<f32>,
    spectrum: Spectrum,
    snapshot: PoolSnapshot,
    keyboard: Keyboard,

    envelope: EnvelopeParams,
    amplitude: f32,
    bend_cents: f32,
    selected: Param,

    dropped_events: u64,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        handle: SynthHandle,
        scope_rx: Consumer<f32>,
        snapshot_rx: Consumer<PoolSnapshot>,
        config: EngineConfig,
        sample_rate: f32,
    ) -> Self {
        Self {
            handle,
            scope_rx,
            snapshot_rx,
            scope: vec![0.0; SCOPE_LEN],
            spectrum: Spectrum::new(SCOPE_LEN, sample_rate),
            snapshot: PoolSnapshot::default(),
            keyboard: Keyboard::new(false),
            envelope: config.envelope,
            amplitude: config.max_amplitude,
            bend_cents: 0.0,
            selected: Param::Attack,
            dropped_events: 0,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        // Without release events we fall back to gated notes
        let enhanced = supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        self.keyboard = Keyboard::new(enhanced);
        tracing::info!(key_release_events = enhanced, "keyboard ready");

        let result = self.event_loop(terminal);

        if enhanced {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        self.send(|h| h.all_notes_off());
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();

            for note in self.keyboard.expired(Instant::now()) {
                self.send(|h| h.note_off(note, 0.0));
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn poll_audio(&mut self) {
        let mut fresh = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            fresh = true;
        }
        if self.scope.len() > SCOPE_LEN {
            let excess = self.scope.len() - SCOPE_LEN;
            self.scope.drain(..excess);
        }
        if fresh {
            self.spectrum.update(&self.scope);
        }

        while let Ok(snapshot) = self.snapshot_rx.pop() {
            self.snapshot = snapshot;
        }
    }

    /// Push to the engine, counting (not failing on) a full queue.
    fn send(&mut self, push: impl FnOnce(&mut SynthHandle) -> Result<(), SynthError>) {
        if push(&mut self.handle).is_err() {
            self.dropped_events += 1;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let KeyCode::Char(c) = key.code {
            if let Some(note) = self.keyboard.note_for(c) {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if self.keyboard.press(note, Instant::now()) {
                            self.send(|h| h.note_on(note, 1.0));
                        }
                    }
                    KeyEventKind::Release => {
                        if self.keyboard.release(note) {
                            self.send(|h| h.note_off(note, 0.0));
                        }
                    }
                }
                return;
            }
        }

        if key.kind == KeyEventKind::Release {
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('z') => self.keyboard.octave_down(),
            KeyCode::Char('x') => self.keyboard.octave_up(),
            KeyCode::Char(' ') => {
                self.keyboard.clear();
                self.send(|h| h.all_notes_off());
            }
            KeyCode::Tab => self.selected = self.selected.next(),
            KeyCode::Up => self.adjust(1.0),
            KeyCode::Down => self.adjust(-1.0),
            KeyCode::Left => self.bend(-PITCH_BEND_RANGE_CENTS / 2.0),
            KeyCode::Right => self.bend(PITCH_BEND_RANGE_CENTS / 2.0),
            KeyCode::Char('0') => {
                self.bend_cents = 0.0;
                self.send(|h| h.pitch_bend(0.0));
            }
            _ => {}
        }
    }

    /// Nudge the selected parameter. Times scale geometrically, levels linearly.
    fn adjust(&mut self, direction: f32) {
        let time = |t: f32| {
            if direction > 0.0 {
                (t.max(0.001) * 1.25).min(10.0)
            } else {
                let t = t / 1.25;
                if t < 0.001 {
                    0.0
                } else {
                    t
                }
            }
        };
        let level = |l: f32| (l + 0.05 * direction).clamp(0.0, 1.0);

        match self.selected {
            Param::Attack => self.envelope.attack = time(self.envelope.attack),
            Param::Decay => self.envelope.decay = time(self.envelope.decay),
            Param::Sustain => self.envelope.sustain = level(self.envelope.sustain),
            Param::Release => self.envelope.release = time(self.envelope.release),
            Param::Amplitude => {
                self.amplitude = level(self.amplitude);
                let amplitude = self.amplitude;
                self.send(|h| h.set_amplitude(amplitude));
                return;
            }
        }

        let EnvelopeParams {
            attack,
            decay,
            sustain,
            release,
        } = self.envelope;
        tracing::debug!(attack, decay, sustain, release, "envelope changed");
        self.send(|h| h.set_envelope(attack, decay, sustain, release));
    }

    fn bend(&mut self, step: f32) {
        self.bend_cents =
            (self.bend_cents + step).clamp(-PITCH_BEND_RANGE_CENTS, PITCH_BEND_RANGE_CENTS);
        let cents = self.bend_cents;
        self.send(|h| h.pitch_bend(cents));
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Parameters
                Constraint::Min(8),    // Voices + spectrum
                Constraint::Length(10), // Scope
                Constraint::Length(1), // Help
            ])
            .split(frame.area());

        self.render_params(frame, chunks[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(50), Constraint::Min(20)])
            .split(chunks[1]);
        self.render_voices(frame, middle[0]);
        render_spectrum(frame, middle[1], &self.spectrum);

        render_waveform(frame, chunks[2], &self.scope);

        let gate = if self.keyboard.releases_reported() {
            ""
        } else {
            "  (gated notes)"
        };
        let help = Paragraph::new(format!(
            " [a-k] Play  [z/x] Octave {}  [Tab/↑/↓] Edit  [←/→/0] Bend  [Space] All off  [q] Quit{gate}",
            self.keyboard.octave()
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_params(&self, frame: &mut Frame, area: Rect) {
        let values = [
            format!("{:.3}s", self.envelope.attack),
            format!("{:.3}s", self.envelope.decay),
            format!("{:.2}", self.envelope.sustain),
            format!("{:.3}s", self.envelope.release),
            format!("{:.2}", self.amplitude),
        ];

        let mut spans = Vec::new();
        for (param, value) in Param::ALL.iter().zip(values) {
            let style = if *param == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {} {} ", param.label(), value), style));
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("Bend {:+.0}c", self.bend_cents),
            Style::default().fg(Color::Magenta),
        ));
        if self.dropped_events > 0 {
            spans.push(Span::styled(
                format!("  dropped {}", self.dropped_events),
                Style::default().fg(Color::Red),
            ));
        }

        let block = Block::default().title(" Envelope ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_voices(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(voice_table(&self.snapshot), area);
    }
}

/// Header labels and widths for the voice table, one entry per row cell.
const VOICE_HEADER: [&str; 6] = ["#", "", "note", "Hz", "", "level"];
const VOICE_WIDTHS: [Constraint; 6] = [
    Constraint::Length(3),
    Constraint::Length(5),
    Constraint::Length(5),
    Constraint::Length(6),
    Constraint::Length(2),
    Constraint::Min(12),
];

fn voice_table(snapshot: &PoolSnapshot) -> Table<'static> {
    let rows = snapshot.voices().iter().enumerate().map(|(i, v)| {
        let (state, color) = match v.state {
            VoiceState::Free => ("free", Color::DarkGray),
            VoiceState::Active => ("on", Color::Green),
            VoiceState::Releasing => ("rel", Color::Yellow),
        };
        let note = v.note.map(note_name).unwrap_or_default();
        let stage = match v.stage {
            EnvelopeStage::Idle => "",
            EnvelopeStage::Attack => "A",
            EnvelopeStage::Decay => "D",
            EnvelopeStage::Sustain => "S",
            EnvelopeStage::Release => "R",
        };
        let hz = if v.note.is_some() {
            format!("{:.0}", v.frequency)
        } else {
            String::new()
        };
        let bar_len = (v.level.clamp(0.0, 1.0) * 12.0).round() as usize;

        let cells: [Cell; VOICE_HEADER.len()] = [
            Cell::from(i.to_string()),
            Cell::from(state),
            Cell::from(note),
            Cell::from(hz),
            Cell::from(stage),
            Cell::from("█".repeat(bar_len)),
        ];
        Row::new(cells).style(Style::default().fg(color))
    });

    let title = format!(
        " Voices {}/{}  stolen {} ",
        snapshot.active, snapshot.voice_count, snapshot.steals
    );
    Table::new(rows, VOICE_WIDTHS)
        .header(Row::new(VOICE_HEADER).style(Style::default().fg(Color::Gray)))
        .block(Block::default().title(title).borders(Borders::ALL))
}

/// "C4", "A#3", ... with middle C = C4.
fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[note as usize % 12], octave)
}
