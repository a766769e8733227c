//! Spectrum widget
//!
//! Hann-windowed FFT of the latest scope buffer, sampled at log-spaced
//! frequencies so each octave gets equal width.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const DISPLAY_POINTS: usize = 64;
const LOWEST_HZ: f32 = 20.0;
const FLOOR_DB: f64 = -100.0;

pub struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    sample_rate: f32,
    /// FFT bin behind each display point.
    bins: Vec<usize>,
    /// (log10 Hz, dB) pairs ready for the chart.
    points: Vec<(f64, f64)>,
    peak_hz: f32,
}

impl Spectrum {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        let window = (0..size)
            .map(|i| {
                let phase = std::f32::consts::TAU * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        let nyquist = (sample_rate / 2.0).clamp(LOWEST_HZ + 1.0, 20_000.0);
        let last_bin = size / 2 - 1;
        let mut bins = Vec::with_capacity(DISPLAY_POINTS);
        let mut points = Vec::with_capacity(DISPLAY_POINTS);
        for i in 0..DISPLAY_POINTS {
            let t = i as f32 / (DISPLAY_POINTS - 1) as f32;
            let hz = LOWEST_HZ * (nyquist / LOWEST_HZ).powf(t);
            let bin = ((hz * size as f32 / sample_rate).round() as usize).min(last_bin);
            bins.push(bin);
            points.push(((hz as f64).log10(), FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
            sample_rate,
            bins,
            points,
            peak_hz: 0.0,
        }
    }

    /// Recompute from `samples`. Buffers of the wrong length are ignored.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }

        for ((bin, &s), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *bin = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let half = &self.scratch[1..self.scratch.len() / 2];
        self.peak_hz = half
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
            .filter(|(_, c)| c.norm_sqr() > 1e-6)
            .map(|(i, _)| (i + 1) as f32 * self.sample_rate / self.scratch.len() as f32)
            .unwrap_or(0.0);

        for (point, &bin) in self.points.iter_mut().zip(&self.bins) {
            let power = self.scratch[bin].norm_sqr().max(1e-12) as f64;
            point.1 = (10.0 * power.log10()).max(FLOOR_DB);
        }
    }

    /// Frequency of the strongest bin, 0 when silent.
    pub fn peak_hz(&self) -> f32 {
        self.peak_hz
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &Spectrum) {
    let points = spectrum.points();
    let x_min = points.first().map_or(1.0, |p| p.0);
    let x_max = points.last().map_or(4.0, |p| p.0).max(x_min + 0.1);
    let top = points.iter().map(|p| p.1).fold(0.0, f64::max) + 10.0;

    let title = if spectrum.peak_hz() > 0.0 {
        format!(" Spectrum  peak {:.0} Hz ", spectrum.peak_hz())
    } else {
        " Spectrum ".to_string()
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(points);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, top])
                .labels(["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
