//! Terminal colors keyed by what a piece of text means

use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// What a piece of console text is telling the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Banners and section titles
    Heading,
    /// Saved counts, completion
    Good,
    /// Aborted runs, missing database
    Bad,
    /// Retries, skipped pages, dropped tables
    Caution,
    /// Offsets and counts inside a line
    Accent,
    /// Labels and hints
    Quiet,
}

/// Whether console output is colored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    colored: bool,
}

impl Theme {
    /// Plain output when stdout is piped or `NO_COLOR` is set
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            colored: !no_color && console::Term::stdout().is_term(),
        }
    }

    pub fn colored() -> Self {
        Self { colored: true }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn style(&self, tone: Tone) -> Style {
        if !self.colored {
            return Style::new();
        }
        match tone {
            Tone::Heading => Style::new().cyan().bold(),
            Tone::Good => Style::new().green().bold(),
            Tone::Bad => Style::new().red().bold(),
            Tone::Caution => Style::new().yellow(),
            Tone::Accent => Style::new().bright_white().bold(),
            Tone::Quiet => Style::new().dimmed(),
        }
    }

    pub fn paint(&self, text: &str, tone: Tone) -> String {
        text.style(self.style(tone)).to_string()
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

/// Paint with the process-wide theme
pub fn paint(text: &str, tone: Tone) -> String {
    theme().paint(text, tone)
}
