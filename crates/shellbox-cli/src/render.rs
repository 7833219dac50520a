use std::time::Duration;

use anstyle::{AnsiColor, Style};
use indicatif::{ProgressBar, ProgressStyle};

fn warn_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::Yellow.into()))
}

fn error_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::Red.into())).bold()
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub fn status(message: &str) {
    println!("{message}");
}

pub fn warn(message: &str) {
    println!("{}", colorize(warn_style(), message));
}

pub fn error(message: &str) {
    eprintln!("{}", colorize(error_style(), message));
}

pub fn debug(enabled: bool, message: &str) {
    if enabled {
        println!("{message}");
    }
}

/// Spinner shown while archives extract. The steady tick runs on a
/// background timer owned by indicatif; it is cosmetic only and must be
/// cleared on every exit path, which `finish` (and `Drop`) guarantees.
pub struct ExtractionProgress {
    bar: Option<ProgressBar>,
}

impl ExtractionProgress {
    pub fn new() -> Self {
        Self { bar: None }
    }

    pub fn entry(&mut self, name: &str) {
        let bar = self.bar.get_or_insert_with(|| {
            status("Initializing libraries -- this only happens on install or update, and takes a few seconds...");
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        bar.set_message(format!("Installing {name}"));
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ExtractionProgress {
    fn drop(&mut self) {
        self.finish();
    }
}
