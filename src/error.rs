//! Error types and helpers for user-friendly error messages
//!
//! Every failure a run can produce is a [`MyrmexError`]. The variants follow
//! the phases of a run so the launcher can decide how to report each one.

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;

use crate::loader::InstantiationError;
use crate::output::Sink;

/// Message used for every way the description parser can be unavailable
pub const NO_PARSER_MESSAGE: &str = "No compliant build description parser found. \
     Build files need a registered project helper for their extension";

/// Broad class of an error, deciding how it is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad command line or build file location
    Configuration,
    /// A logger or listener could not be built
    ObserverConstruction,
    /// The build description could not be read
    Parse,
    /// A target failed
    Execution,
    /// Anything else
    Unexpected,
}

/// Custom error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum MyrmexError {
    /// Malformed or missing flag argument
    #[error("{message}")]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// Flag the parser does not know
    #[error("Unknown argument: {argument}")]
    UnknownArgument { argument: String },

    #[error("Buildfile: {} does not exist!", .path.display())]
    MissingBuildFile { path: PathBuf },

    #[error("What? Buildfile: {} is a dir!", .path.display())]
    BuildFileIsDirectory { path: PathBuf },

    /// Upward search reached the filesystem root
    #[error("Could not locate a build file!")]
    BuildFileNotFound { suffix: String, start: PathBuf },

    #[error("The specified logger class {class} does not implement the BuildLogger interface")]
    NotALogger { class: String },

    #[error("Unable to instantiate specified logger class {class} : {}", .source.kind_name())]
    LoggerInstantiation {
        class: String,
        #[source]
        source: InstantiationError,
    },

    #[error("Unable to instantiate listener {class}")]
    ListenerInstantiation {
        class: String,
        #[source]
        source: InstantiationError,
    },

    /// No project helper can read the build description
    #[error("{}", NO_PARSER_MESSAGE)]
    NoParser {
        #[source]
        source: anyhow::Error,
    },

    /// The build description is malformed
    #[error("{message}")]
    Parse {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A target failed or could not be run
    #[error("{message}")]
    Build {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl MyrmexError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a configuration error with a hint
    pub fn config_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::Parse {
            message: message.into(),
            source,
        }
    }

    /// Create a build failure
    pub fn build_failure(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
            source: None,
        }
    }

    /// Which part of the run produced this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            MyrmexError::Config { .. }
            | MyrmexError::UnknownArgument { .. }
            | MyrmexError::MissingBuildFile { .. }
            | MyrmexError::BuildFileIsDirectory { .. }
            | MyrmexError::BuildFileNotFound { .. } => ErrorCategory::Configuration,
            MyrmexError::NotALogger { .. }
            | MyrmexError::LoggerInstantiation { .. }
            | MyrmexError::ListenerInstantiation { .. } => ErrorCategory::ObserverConstruction,
            MyrmexError::NoParser { .. } | MyrmexError::Parse { .. } => ErrorCategory::Parse,
            MyrmexError::Build { .. } => ErrorCategory::Execution,
            MyrmexError::Io(_) | MyrmexError::Unexpected(_) => ErrorCategory::Unexpected,
        }
    }

    /// Whether the usage text should follow the diagnostic
    pub fn wants_usage(&self) -> bool {
        matches!(self, MyrmexError::UnknownArgument { .. })
    }

    fn hint(&self) -> Option<&str> {
        match self {
            MyrmexError::Config { hint, .. } => hint.as_deref(),
            MyrmexError::MissingBuildFile { .. } | MyrmexError::BuildFileIsDirectory { .. } => {
                Some(hints::build_file())
            }
            MyrmexError::BuildFileNotFound { .. } => Some(hints::find()),
            MyrmexError::NotALogger { .. } | MyrmexError::LoggerInstantiation { .. } => {
                Some(hints::logger())
            }
            MyrmexError::ListenerInstantiation { .. } => Some(hints::listener()),
            MyrmexError::NoParser { .. } => Some(hints::parser()),
            _ => None,
        }
    }

    /// Messages of this error and all of its sources, outermost first
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            messages.push(cause.to_string());
            current = cause.source();
        }
        messages
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self, sink: &Sink) {
        use console::style;

        let mut sink = sink.clone();
        let _ = writeln!(sink, "{} {}", style("ERROR:").red().bold(), self);

        if self.category() == ErrorCategory::Configuration
            && !matches!(self, MyrmexError::Config { .. } | MyrmexError::UnknownArgument { .. })
        {
            let _ = writeln!(sink, "Build failed");
        }

        if self.category() == ErrorCategory::Unexpected {
            for cause in self.chain().iter().skip(1) {
                let _ = writeln!(sink, "  caused by: {}", cause);
            }
        }

        if let Some(h) = self.hint() {
            let _ = writeln!(sink, "{} {}", style("HINT:").yellow().bold(), h);
        }
        let _ = sink.flush();
    }
}

/// Common error hints
pub mod hints {
    /// Hint for a build file that is missing or not a file
    pub fn build_file() -> &'static str {
        "Run myrmex in a directory containing build.toml, name one with -buildfile <file>,\n\
         or use -find to search the parent directories."
    }

    /// Hint for a failed upward search
    pub fn find() -> &'static str {
        "No parent directory contains the requested file. Check the name given to -find."
    }

    /// Hint for a logger that cannot be used
    pub fn logger() -> &'static str {
        "Built-in loggers: DefaultLogger. Listeners such as JsonEventListener\n\
         must be registered with -listener instead."
    }

    /// Hint for a listener that cannot be built
    pub fn listener() -> &'static str {
        "Built-in listeners: DefaultLogger, JsonEventListener."
    }

    /// Hint for a build file nobody can parse
    pub fn parser() -> &'static str {
        "Build descriptions are read from TOML files (for example build.toml)."
    }
}
