//! Presentation on the control surface
//!
//! Rendering is cached: labels and the gain meter are only redrawn when
//! their value changes or the cache is invalidated by a connectivity reset.

use crate::audio::gain::GainFactor;
use crate::constants::MAX_GAIN;
use crate::session::Mode;

/// Rendering side of the control surface
pub trait Presenter {
    /// Highlight the selected mode and whether it is streaming
    fn show_mode(&mut self, mode: Mode, streaming: bool);

    /// Light the first `gain` cells of the meter
    fn show_gain(&mut self, gain: GainFactor);

    /// Operator-visible status line
    fn show_status(&mut self, text: &str);

    /// Live waveform of the buffer just transmitted
    fn plot_waveform(&mut self, _samples: &[i16]) {}
}

impl<T: Presenter + ?Sized> Presenter for Box<T> {
    fn show_mode(&mut self, mode: Mode, streaming: bool) {
        (**self).show_mode(mode, streaming)
    }

    fn show_gain(&mut self, gain: GainFactor) {
        (**self).show_gain(gain)
    }

    fn show_status(&mut self, text: &str) {
        (**self).show_status(text)
    }

    fn plot_waveform(&mut self, samples: &[i16]) {
        (**self).plot_waveform(samples)
    }
}

/// Last values drawn on the surface
#[derive(Debug, Default)]
pub struct PresentationCache {
    mode: Option<(Mode, bool)>,
    gain: Option<GainFactor>,
}

impl PresentationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything drawn; the next render redraws all
    pub fn invalidate(&mut self) {
        self.mode = None;
        self.gain = None;
    }

    /// Draw whatever differs from the cache. Returns true if anything was drawn.
    pub fn render<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
        mode: Mode,
        streaming: bool,
        gain: GainFactor,
    ) -> bool {
        let mut drawn = false;
        if self.mode != Some((mode, streaming)) {
            presenter.show_mode(mode, streaming);
            self.mode = Some((mode, streaming));
            drawn = true;
        }
        if self.gain != Some(gain) {
            presenter.show_gain(gain);
            self.gain = Some(gain);
            drawn = true;
        }
        drawn
    }
}

/// Meter cells, lit for `index < gain`
pub fn meter_cells(gain: GainFactor) -> impl Iterator<Item = bool> {
    (0..MAX_GAIN).map(move |i| i < gain.get())
}

/// Text rendering of the meter, e.g. `[#####...............]`
pub fn meter_text(gain: GainFactor) -> String {
    let cells: String = meter_cells(gain)
        .map(|lit| if lit { '#' } else { '.' })
        .collect();
    format!("[{}]", cells)
}

/// Presenter that draws through the log
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn show_mode(&mut self, mode: Mode, streaming: bool) {
        let state = if streaming { "streaming" } else { "ready" };
        tracing::info!("MODE {} ({})", mode.label().to_uppercase(), state);
    }

    fn show_gain(&mut self, gain: GainFactor) {
        tracing::info!("Amplification {} {}", meter_text(gain), gain);
    }

    fn show_status(&mut self, text: &str) {
        tracing::info!("{}", text);
    }

    fn plot_waveform(&mut self, samples: &[i16]) {
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        tracing::trace!(
            "waveform: {} samples, peak {:.3}",
            samples.len(),
            peak as f32 / 32768.0
        );
    }
}
