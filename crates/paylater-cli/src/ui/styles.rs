//! Message styles.
//!
//! Pages print through these helpers so every page reports success,
//! rejection and failure the same way.
//!
//! - `success` and `warning` are the result of a command (an approved or a
//!   rejected purchase) and go to stdout with the rest of the page.
//! - `danger` and `notice` are diagnostics and go to stderr, so piped output
//!   holds only results.
//!
//! Colors are applied only when enabled for the run and the target stream is
//! a terminal.

use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::style::{Color, Stylize};

// Color palette
pub const PRIMARY: Color = Color::Rgb { r: 64, g: 128, b: 192 };
pub const SECONDARY: Color = Color::Rgb { r: 96, g: 160, b: 96 };
pub const ACCENT: Color = Color::Rgb { r: 192, g: 160, b: 64 };
pub const ERROR: Color = Color::Rgb { r: 192, g: 64, b: 64 };
pub const MUTED: Color = Color::Rgb { r: 128, g: 128, b: 128 };

/// Width of the label column in stat lines
const STAT_LABEL_WIDTH: usize = 18;

static COLOR_ENABLED: AtomicBool = AtomicBool::new(false);

/// Allow colors for this run. Off in `--json` mode.
pub fn set_color_enabled(enabled: bool) {
    COLOR_ENABLED.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn colored(self) -> bool {
        COLOR_ENABLED.load(Ordering::Relaxed)
            && match self {
                Stream::Stdout => io::stdout().is_terminal(),
                Stream::Stderr => io::stderr().is_terminal(),
            }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Warning,
    Danger,
    Notice,
}

impl Tone {
    fn stream(self) -> Stream {
        match self {
            Tone::Success | Tone::Warning => Stream::Stdout,
            Tone::Danger | Tone::Notice => Stream::Stderr,
        }
    }

    fn color(self) -> Color {
        match self {
            Tone::Success => SECONDARY,
            Tone::Warning => ACCENT,
            Tone::Danger => ERROR,
            Tone::Notice => MUTED,
        }
    }

    fn prefix(self) -> Option<&'static str> {
        match self {
            Tone::Success => Some("✔"),
            Tone::Warning => Some("!"),
            Tone::Danger => Some("✖"),
            Tone::Notice => None,
        }
    }
}

fn paint(text: &str, color: Color, bold: bool, colored: bool) -> String {
    if !colored {
        return text.to_string();
    }
    let styled = text.with(color);
    if bold {
        styled.bold().to_string()
    } else {
        styled.to_string()
    }
}

fn message_line(tone: Tone, message: &str, colored: bool) -> String {
    match tone.prefix() {
        Some(prefix) => format!("{} {}", paint(prefix, tone.color(), true, colored), message),
        None => paint(message, tone.color(), false, colored),
    }
}

fn emit(tone: Tone, message: &str) {
    let stream = tone.stream();
    let line = message_line(tone, message, stream.colored());
    match stream {
        Stream::Stdout => println!("{}", line),
        Stream::Stderr => eprintln!("{}", line),
    }
}

pub fn heading(title: &str) {
    let colored = Stream::Stdout.colored();
    println!("\n{}", paint(title, PRIMARY, true, colored));
    println!("{}", paint(&"=".repeat(title.chars().count()), MUTED, false, colored));
}

pub fn success(message: &str) {
    emit(Tone::Success, message);
}

pub fn warning(message: &str) {
    emit(Tone::Warning, message);
}

pub fn danger(message: &str) {
    emit(Tone::Danger, message);
}

pub fn notice(message: &str) {
    emit(Tone::Notice, message);
}

/// One "label: value" line of a stat card block
pub fn stat(label: &str, value: &str) {
    println!("{}", stat_line(label, value, Stream::Stdout.colored()));
}

fn stat_line(label: &str, value: &str, colored: bool) -> String {
    // Pad before painting so escape codes do not count toward the width
    let label = format!("{:<width$}", format!("{}:", label), width = STAT_LABEL_WIDTH);
    format!("  {} {}", paint(&label, MUTED, false, colored), value)
}

/// Table header row
pub(crate) fn table_header(line: &str) -> String {
    paint(line, PRIMARY, true, Stream::Stdout.colored())
}

/// Text bar for a 0.0..=1.0 ratio
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
