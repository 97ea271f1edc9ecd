//! Logger rendering build events as plain text

use std::io::Write;
use std::time::{Duration, Instant};

use console::style;

use crate::config::MessageLevel;
use crate::engine::{BuildEvent, BuildListener, BuildLogger, BuildOutcome, FailureDetail};
use crate::output::Sink;

/// Width of the right-aligned `[task]` label column
pub const LEFT_COLUMN_SIZE: usize = 12;

/// The logger used when `-logger` is not given
pub struct DefaultLogger {
    level: MessageLevel,
    out: Sink,
    err: Sink,
    emacs_mode: bool,
    started: Option<Instant>,
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultLogger {
    pub fn new() -> Self {
        Self {
            level: MessageLevel::Error,
            out: Sink::stdout(),
            err: Sink::stderr(),
            emacs_mode: false,
            started: None,
        }
    }

    fn write_out(&self, text: &str) {
        let mut out = self.out.clone();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }

    fn write_err(&self, text: &str) {
        let mut err = self.err.clone();
        let _ = writeln!(err, "{}", text);
        let _ = err.flush();
    }

    fn failure_text(&self, detail: &FailureDetail) -> String {
        if self.level < MessageLevel::Verbose {
            return detail.message.clone();
        }
        let mut text = detail.message.clone();
        for cause in &detail.causes {
            text.push_str("\nCaused by: ");
            text.push_str(cause);
        }
        text
    }
}

/// "1 minute 5 seconds", "0 seconds", ...
pub fn format_elapsed(elapsed: Duration) -> String {
    fn unit(count: u64, word: &str) -> String {
        if count == 1 {
            format!("1 {}", word)
        } else {
            format!("{} {}s", count, word)
        }
    }

    let seconds = elapsed.as_secs();
    let minutes = seconds / 60;
    if minutes > 0 {
        format!("{} {}", unit(minutes, "minute"), unit(seconds % 60, "second"))
    } else {
        unit(seconds, "second")
    }
}

impl BuildListener for DefaultLogger {
    fn build_started(&mut self, _event: &BuildEvent) {
        self.started = Some(Instant::now());
    }

    fn build_finished(&mut self, _event: &BuildEvent, outcome: &BuildOutcome) {
        match &outcome.failure {
            None => {
                let banner = if self.emacs_mode {
                    "BUILD SUCCESSFUL".to_string()
                } else {
                    style("BUILD SUCCESSFUL").green().bold().to_string()
                };
                self.write_out(&format!("\n{}", banner));
            }
            Some(detail) => {
                let banner = if self.emacs_mode {
                    "BUILD FAILED".to_string()
                } else {
                    style("BUILD FAILED").red().bold().to_string()
                };
                self.write_err(&format!("\n{}\n", banner));
                self.write_err(&self.failure_text(detail));
            }
        }

        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.write_out(&format!("\nTotal time: {}", format_elapsed(elapsed)));
    }

    fn target_started(&mut self, event: &BuildEvent) {
        if self.level >= MessageLevel::Info {
            if let Some(target) = &event.target {
                self.write_out(&format!("\n{}:", target));
            }
        }
    }

    fn target_finished(&mut self, _event: &BuildEvent, _failure: Option<&FailureDetail>) {}

    fn message_logged(&mut self, event: &BuildEvent) {
        if event.priority > self.level {
            return;
        }

        let message = event.message.as_deref().unwrap_or_default();
        let line = match (&event.task, self.emacs_mode) {
            (Some(task), false) => format!(
                "{:>width$}{}",
                format!("[{}] ", task),
                message,
                width = LEFT_COLUMN_SIZE
            ),
            _ => message.to_string(),
        };

        if event.priority == MessageLevel::Error {
            self.write_err(&line);
        } else {
            self.write_out(&line);
        }
    }
}

impl BuildLogger for DefaultLogger {
    fn set_message_output_level(&mut self, level: MessageLevel) {
        self.level = level;
    }

    fn set_output_sink(&mut self, sink: Sink) {
        self.out = sink;
    }

    fn set_error_sink(&mut self, sink: Sink) {
        self.err = sink;
    }

    fn set_emacs_mode(&mut self, emacs: bool) {
        self.emacs_mode = emacs;
    }

    fn into_listener(self: Box<Self>) -> Box<dyn BuildListener> {
        self
    }
}
