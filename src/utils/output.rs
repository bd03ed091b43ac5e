//! Output utilities for vcd-extraconfig.
//!
//! Progress goes to stderr so stdout only ever carries the final error.

use std::sync::atomic::{AtomicBool, Ordering};

/// How chatty a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    /// Always printed
    Normal,
    /// Printed only when `-verbose` is set
    Verbose,
}

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enable or disable `OutputLevel::Verbose` messages
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

fn enabled(level: OutputLevel) -> bool {
    match level {
        OutputLevel::Normal => true,
        OutputLevel::Verbose => VERBOSE.load(Ordering::Relaxed),
    }
}

/// Print an error message to stderr with red color
pub fn print_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {message}");
}

/// Print a success message to stderr with green color
pub fn print_success(message: &str, level: OutputLevel) {
    if enabled(level) {
        eprintln!("\x1b[32mSUCCESS:\x1b[0m {message}");
    }
}

/// Print an info message to stderr with blue color
pub fn print_info(message: &str, level: OutputLevel) {
    if enabled(level) {
        eprintln!("\x1b[34mINFO:\x1b[0m {message}");
    }
}

/// Print a warning message to stderr with yellow color
pub fn print_warning(message: &str, level: OutputLevel) {
    if enabled(level) {
        eprintln!("\x1b[33mWARNING:\x1b[0m {message}");
    }
}
