//! Colored status lines on stderr.

use owo_colors::{OwoColorize as _, Stream::Stderr};

pub fn step(message: &str) {
    eprintln!("{} {message}", "→".if_supports_color(Stderr, |t| t.cyan()));
}

pub fn success(message: &str) {
    eprintln!(
        "{} {}",
        "✓".if_supports_color(Stderr, |t| t.green()),
        message.if_supports_color(Stderr, |t| t.green())
    );
}

/// A condition that is reported and then tolerated.
pub fn warn(message: &str) {
    eprintln!(
        "{} {}",
        "!".if_supports_color(Stderr, |t| t.yellow()),
        message.if_supports_color(Stderr, |t| t.yellow())
    );
}

pub fn failure(message: &str) {
    eprintln!(
        "{} {}",
        "✗".if_supports_color(Stderr, |t| t.red()),
        message.if_supports_color(Stderr, |t| t.red())
    );
}
