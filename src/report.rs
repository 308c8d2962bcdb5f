//! Warning types and printing utilities.
//!
//! This module is separate from the engine so hanwrap can be used as a
//! library without printing side effects.

use std::fmt;

use colored::Colorize;

/// Success mark for consistent output formatting
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓
/// Failure mark for consistent output formatting
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The file could not be parsed; it passes through unmodified.
    ParseError,
    /// A static-markup fragment could not be re-parsed; only that fragment
    /// is left untranslated.
    FragmentParseError,
    /// An edit collided with an earlier edit; the later edit was dropped.
    PatchConflict,
    /// An unrecognized transform name in the configuration.
    UnknownTransform,
    /// The file could not be read or written; other files still process.
    Io,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::ParseError => write!(f, "parse-error"),
            WarningKind::FragmentParseError => write!(f, "fragment-parse-error"),
            WarningKind::PatchConflict => write!(f, "patch-conflict"),
            WarningKind::UnknownTransform => write!(f, "unknown-transform"),
            WarningKind::Io => write!(f, "io-error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub file: String,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, file: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.message, self.file)
    }
}

/// Print warnings in a cargo-style format.
pub fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        println!(
            "{}: {}  {}",
            "warning".bold().yellow(),
            warning.message,
            warning.kind.to_string().dimmed().cyan()
        );
        println!("  {} {}", "-->".blue(), warning.file);
    }
}

/// Print the per-file rewrite summary.
pub fn print_file_summary(file: &str, translated: &[String], missed: &[String]) {
    if translated.is_empty() && missed.is_empty() {
        return;
    }
    println!("{}", file.bold());
    for word in translated {
        println!("  {} {}", SUCCESS_MARK.green(), word);
    }
    for word in missed {
        println!("  {} {} {}", FAILURE_MARK.yellow(), word, "(no dictionary entry)".dimmed());
    }
}
