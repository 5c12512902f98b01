//! Terminal observer: an indicatif bar for status and percentage, colored lines
//! for notifications.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::{ProgressEvent, ProgressObserver};
use crate::constants::NO_PROGRESS_ENV_VAR;

/// Renders progress events to the terminal.
///
/// The bar is hidden when `hide_bar` is set or `MOLLY_NO_PROGRESS` is present in
/// the environment; notifications are printed either way.
pub struct TerminalObserver {
    bar: ProgressBar,
}

impl TerminalObserver {
    /// Create an observer, optionally without the animated bar.
    #[must_use]
    pub fn new(hide_bar: bool) -> Self {
        let bar = if hide_bar || std::env::var_os(NO_PROGRESS_ENV_VAR).is_some() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(100);
            bar.set_style(bar_style());
            bar
        };
        Self { bar }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

impl ProgressObserver for TerminalObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Status(status) => self.bar.set_message(status.clone()),
            ProgressEvent::Percent(percent) => self.bar.set_position(u64::from(*percent)),
            ProgressEvent::Error { title, detail } => {
                self.bar.suspend(|| eprintln!("{} {}", format!("{title}:").red().bold(), detail));
            }
            ProgressEvent::Success { title, detail } => {
                self.bar.suspend(|| println!("{} {}", title.green().bold(), detail));
            }
        }
    }

    fn close(&mut self) {
        self.bar.finish_and_clear();
    }
}
