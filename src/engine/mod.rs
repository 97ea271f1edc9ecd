//! Execution engine contract
//!
//! The driver talks to the engine through a [`Project`] handle and observes
//! it through [`BuildListener`]s. The engine shipped here holds targets and
//! properties, dispatches events and runs each target's declared `echo`
//! lines. It does not order targets by dependency.

mod helper;
mod project;

pub use helper::{ProjectHelper, TomlProjectHelper};
pub use project::{Project, Target};

use serde::Serialize;

use crate::config::MessageLevel;
use crate::error::MyrmexError;
use crate::output::Sink;

/// Name and optional description of a declared target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub name: String,
    pub description: Option<String>,
}

impl TargetDescriptor {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }

    /// Documented targets are listed as main targets
    pub fn is_documented(&self) -> bool {
        self.description.is_some()
    }
}

/// What went wrong, detached from the error value itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub message: String,
    /// Underlying causes, outermost first
    pub causes: Vec<String>,
}

impl FailureDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }
}

impl From<&MyrmexError> for FailureDetail {
    fn from(err: &MyrmexError) -> Self {
        let mut chain = err.chain().into_iter();
        let message = chain.next().unwrap_or_default();
        Self {
            message,
            causes: chain.collect(),
        }
    }
}

/// Result of a run, delivered with the build-finished event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    pub failure: Option<FailureDetail>,
}

impl BuildOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            failure: None,
        }
    }

    pub fn failed(detail: FailureDetail) -> Self {
        Self {
            success: false,
            failure: Some(detail),
        }
    }
}

/// A lifecycle or message event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEvent {
    /// Target running when the event fired
    pub target: Option<String>,
    /// Task running when the event fired
    pub task: Option<String>,
    /// Logged text, for message events
    pub message: Option<String>,
    pub priority: MessageLevel,
}

/// Observer of build lifecycle and message events
pub trait BuildListener {
    fn build_started(&mut self, event: &BuildEvent);

    fn build_finished(&mut self, event: &BuildEvent, outcome: &BuildOutcome);

    fn target_started(&mut self, event: &BuildEvent);

    fn target_finished(&mut self, event: &BuildEvent, failure: Option<&FailureDetail>);

    fn message_logged(&mut self, event: &BuildEvent);

    /// Sink for the listener's own warnings, such as a report it could not
    /// write
    fn set_diagnostic_sink(&mut self, _sink: Sink) {}
}

/// The listener that renders events to the run's sinks
pub trait BuildLogger: BuildListener {
    fn set_message_output_level(&mut self, level: MessageLevel);

    fn set_output_sink(&mut self, sink: Sink);

    fn set_error_sink(&mut self, sink: Sink);

    fn set_emacs_mode(&mut self, emacs: bool);

    /// Register this logger as a plain listener
    fn into_listener(self: Box<Self>) -> Box<dyn BuildListener>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_detail_from_error_chain() {
        let err = MyrmexError::NoParser {
            source: anyhow::anyhow!("no helper for .xml files"),
        };
        let detail = FailureDetail::from(&err);

        assert!(detail.message.starts_with("No compliant build description parser found."));
        assert_eq!(detail.causes, vec!["no helper for .xml files".to_string()]);
    }

    #[test]
    fn test_descriptor_documented() {
        assert!(TargetDescriptor::new("build", Some("Builds it")).is_documented());
        assert!(!TargetDescriptor::new("helper", None).is_documented());
    }
}
