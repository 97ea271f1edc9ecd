//! Run configuration produced by the argument parser
//!
//! A [`RunConfiguration`] is built once from the command line and is
//! read-only afterwards, except for [`RunConfiguration::merge_properties`]
//! which lets an embedding caller add properties before the run starts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Build file looked up when none is named on the command line
pub const DEFAULT_BUILD_FILENAME: &str = "build.toml";

/// Reserved property holding the version banner
pub const VERSION_PROPERTY: &str = "myrmex.version";

/// Reserved property holding the absolute build file path
pub const FILE_PROPERTY: &str = "myrmex.file";

/// Message priority, ordered from most to least severe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Error => write!(f, "error"),
            MessageLevel::Warn => write!(f, "warn"),
            MessageLevel::Info => write!(f, "info"),
            MessageLevel::Verbose => write!(f, "verbose"),
            MessageLevel::Debug => write!(f, "debug"),
        }
    }
}

/// Everything a single run needs, as decided by the command line
#[derive(Debug, Clone, Default)]
pub struct RunConfiguration {
    /// Output verbosity
    pub level: MessageLevel,

    /// Build file given with `-buildfile`/`-file`/`-f`
    pub build_file: Option<PathBuf>,

    /// File name to search for upwards (`-find`)
    pub search_for: Option<String>,

    /// Absolute, validated build file; set once parsing succeeds
    pub resolved_build_file: Option<PathBuf>,

    /// Targets in command-line order
    pub targets: Vec<String>,

    /// User properties from `-D`; a later definition of a key replaces it
    pub properties: BTreeMap<String, String>,

    /// Listener identifiers in command-line order
    pub listeners: Vec<String>,

    /// Logger identifier, at most one
    pub logger: Option<String>,

    /// Log without decorations
    pub emacs_mode: bool,

    /// Only list the project's targets
    pub project_help: bool,

    /// False when parsing stopped early (`-help`, `-version`)
    pub ready_to_run: bool,
}

impl RunConfiguration {
    /// Add properties supplied by an embedding caller.
    ///
    /// Entries overwrite command-line definitions of the same name.
    pub fn merge_properties<I, K, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in properties {
            self.properties.insert(name.into(), value.into());
        }
    }

    /// Whether messages at `level` pass this run's verbosity
    pub fn shows(&self, level: MessageLevel) -> bool {
        level <= self.level
    }
}
