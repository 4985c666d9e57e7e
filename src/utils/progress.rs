//! Progress bar utilities using indicatif
//!
//! Wraps indicatif's `ProgressBar` so every command reports line scanning
//! the same way. indicatif hides the bar on its own when stderr is not a
//! terminal, so redirected runs stay clean.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// How many lines pass between two redraws.
const REDRAW_EVERY: usize = 1_000;

/// Progress bar over a known number of lines
pub struct ProgressBar {
    bar: IndicatifBar,
}

impl ProgressBar {
    /// Create a new progress bar with known total
    pub fn new(total: usize, label: &str) -> Self {
        let bar = IndicatifBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {percent:>3}% ({pos}/{len}) {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░");
        bar.set_style(style);
        bar.set_message(label.to_string());

        Self { bar }
    }

    /// Record that `current` lines have been handled; redraws are throttled
    pub fn update(&self, current: usize) {
        if current % REDRAW_EVERY == 0 {
            self.bar.set_position(current as u64);
        }
    }

    /// Finish with custom message
    pub fn finish_with_message(&self, message: &str) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
        self.bar.finish_with_message(message.to_string());
    }
}
