//! Terminal color scheme for the console reporter.

use std::env;

use attest_core::ResultKind;
use attest_config::ColorMode;
use colored::{ColoredString, Colorize};

/// Output roles the console reporter distinguishes. Each maps to one style
/// of the default scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Notification,
    Omission,
    Pending,
    Failure,
    Error,
    CaseName,
    FileName,
    LineNumber,
}

impl Tone {
    /// The tone a recorded result is shown in.
    pub fn for_kind(kind: &ResultKind) -> Self {
        match kind {
            ResultKind::Success => Tone::Success,
            ResultKind::Notification { .. } => Tone::Notification,
            ResultKind::Omission { .. } => Tone::Omission,
            ResultKind::Pending { .. } => Tone::Pending,
            ResultKind::Failure { .. } => Tone::Failure,
            ResultKind::Error { .. } => Tone::Error,
        }
    }

    pub fn paint(&self, text: &str) -> ColoredString {
        match self {
            Tone::Success => text.green().bold(),
            Tone::Notification => text.cyan().bold(),
            Tone::Omission => text.blue().bold().on_white(),
            Tone::Pending => text.magenta().bold(),
            Tone::Failure => text.red().bold(),
            Tone::Error => text.yellow().bold(),
            Tone::CaseName => text.white().bold().on_green(),
            Tone::FileName => text.cyan().bold(),
            Tone::LineNumber => text.yellow().bold(),
        }
    }
}

/// Whether the terminal advertises color support. Decided from `TERM` and
/// `EMACS`, not from a tty probe.
pub fn terminal_supports_color() -> bool {
    if let Ok(term) = env::var("TERM") {
        if term == "screen"
            || term.ends_with("term")
            || term.ends_with("term-color")
            || term.ends_with("term-256color")
        {
            return true;
        }
    }
    env::var("EMACS").is_ok_and(|value| value == "t")
}

/// Resolves a configured color mode to a concrete on/off decision.
pub fn resolve(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => terminal_supports_color(),
    }
}
