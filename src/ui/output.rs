//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! User-facing results go to stdout; everything advisory (debug traces,
//! notices, errors) goes to stderr so that `get` output stays pipeable.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose tracing
    Debug,
}

impl Verbosity {
    /// Create verbosity from the `--verbose` flag.
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Check whether debug tracing is enabled.
    pub fn is_debug(self) -> bool {
        self == Verbosity::Debug
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity.is_debug() {
        eprintln!("[debug] {}", message);
    }
}

/// Print an advisory notice (always shown, stderr).
pub fn notice(message: impl Display) {
    eprintln!("{}", message);
}
