//! Terminal output utilities
//!
//! Diagnostics go to the sinks of the current run rather than straight to
//! stdout/stderr, so `-logfile` captures them as well.

use std::io::Write;

use console::style;

use crate::output::Sink;

/// Print an error message to `sink`
pub fn print_error(sink: &Sink, message: &str) {
    let mut sink = sink.clone();
    let _ = writeln!(sink, "{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to `sink`
pub fn print_warning(sink: &Sink, message: &str) {
    let mut sink = sink.clone();
    let _ = writeln!(sink, "{}: {}", style("warning").yellow().bold(), message);
}

/// Print a plain line to `sink`
pub fn print_line(sink: &Sink, message: &str) {
    let mut sink = sink.clone();
    let _ = writeln!(sink, "{}", message);
}

/// Turn off ANSI styling, for log files and emacs mode
pub fn disable_colors() {
    console::set_colors_enabled(false);
    console::set_colors_enabled_stderr(false);
}
