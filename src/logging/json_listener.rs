//! Listener recording the whole build as a JSON document

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MessageLevel;
use crate::engine::{BuildEvent, BuildListener, BuildOutcome, FailureDetail};
use crate::output::Sink;
use crate::utils::terminal::print_warning;

#[derive(Debug, Clone, Serialize)]
struct MessageRecord {
    time: DateTime<Utc>,
    priority: MessageLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct TargetRecord {
    name: String,
    started: DateTime<Utc>,
    finished: Option<DateTime<Utc>>,
    failure: Option<FailureDetail>,
    messages: Vec<MessageRecord>,
}

#[derive(Debug, Clone, Serialize)]
struct BuildRecord {
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
    success: bool,
    failure: Option<FailureDetail>,
    messages: Vec<MessageRecord>,
    targets: Vec<TargetRecord>,
}

/// Writes every event of the run to a JSON file when the build finishes
pub struct JsonEventListener {
    path: PathBuf,
    diagnostics: Sink,
    started: Option<DateTime<Utc>>,
    messages: Vec<MessageRecord>,
    targets: Vec<TargetRecord>,
    current: Option<TargetRecord>,
}

impl JsonEventListener {
    /// File written in the working directory by the registered component
    pub const DEFAULT_FILE: &'static str = "build-events.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            diagnostics: Sink::stderr(),
            started: None,
            messages: Vec::new(),
            targets: Vec::new(),
            current: None,
        }
    }

    fn write_record(&self, record: &BuildRecord) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        writer.flush()?;
        Ok(())
    }
}

impl BuildListener for JsonEventListener {
    fn build_started(&mut self, _event: &BuildEvent) {
        self.started = Some(Utc::now());
    }

    fn build_finished(&mut self, _event: &BuildEvent, outcome: &BuildOutcome) {
        if let Some(unfinished) = self.current.take() {
            self.targets.push(unfinished);
        }

        let record = BuildRecord {
            started: self.started,
            finished: Some(Utc::now()),
            success: outcome.success,
            failure: outcome.failure.clone(),
            messages: std::mem::take(&mut self.messages),
            targets: std::mem::take(&mut self.targets),
        };

        if let Err(e) = self.write_record(&record) {
            print_warning(&self.diagnostics, &format!("{:#}", e));
        }
    }

    fn target_started(&mut self, event: &BuildEvent) {
        self.current = Some(TargetRecord {
            name: event.target.clone().unwrap_or_default(),
            started: Utc::now(),
            finished: None,
            failure: None,
            messages: Vec::new(),
        });
    }

    fn target_finished(&mut self, _event: &BuildEvent, failure: Option<&FailureDetail>) {
        if let Some(mut record) = self.current.take() {
            record.finished = Some(Utc::now());
            record.failure = failure.cloned();
            self.targets.push(record);
        }
    }

    fn message_logged(&mut self, event: &BuildEvent) {
        let record = MessageRecord {
            time: Utc::now(),
            priority: event.priority,
            task: event.task.clone(),
            message: event.message.clone().unwrap_or_default(),
        };
        match &mut self.current {
            Some(target) => target.messages.push(record),
            None => self.messages.push(record),
        }
    }

    fn set_diagnostic_sink(&mut self, sink: Sink) {
        self.diagnostics = sink;
    }
}
