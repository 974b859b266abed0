//! Lightweight verbose logging helpers for the CLI.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

use crate::palette;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable verbose logging output.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Check whether verbose logging is enabled.
#[must_use]
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Emit a verbose info message (no-op when verbosity is disabled).
pub fn info(message: impl AsRef<str>) {
    if is_verbose() {
        let (r, g, b) = palette::BLUE_RGB;
        eprintln!("{} {}", "info".truecolor(r, g, b).bold(), message.as_ref());
    }
}

/// Emit a verbose warning message (no-op when verbosity is disabled).
pub fn warn(message: impl AsRef<str>) {
    if is_verbose() {
        let (r, g, b) = palette::ORANGE_RGB;
        eprintln!("{} {}", "warn".truecolor(r, g, b).bold(), message.as_ref());
    }
}

/// Report a completed write, e.g. an output file (no-op when verbosity is disabled).
pub fn success(message: impl AsRef<str>) {
    if is_verbose() {
        let (r, g, b) = palette::GREEN_RGB;
        eprintln!("{} {}", "done".truecolor(r, g, b).bold(), message.as_ref());
    }
}

/// Print a fatal error to stderr regardless of verbosity.
pub fn error(message: impl AsRef<str>) {
    let (r, g, b) = palette::RED_RGB;
    eprintln!("{} {}", "error".truecolor(r, g, b).bold(), message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_toggles() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
