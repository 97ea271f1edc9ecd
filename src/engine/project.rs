//! Project handle, targets and event dispatch

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{BuildEvent, BuildListener, BuildOutcome, FailureDetail, TargetDescriptor};
use crate::config::MessageLevel;
use crate::error::MyrmexError;
use crate::loader::ComponentLoader;
use crate::output::Sink;

/// A declared target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub description: Option<String>,
    /// Lines written to the output sink when the target runs
    pub echo: Vec<String>,
    /// Failure raised after the echo lines, if any
    pub fail: Option<String>,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn descriptor(&self) -> TargetDescriptor {
        TargetDescriptor::new(&self.name, self.description.as_deref())
    }
}

/// Registered listeners plus the target/task currently producing output
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<Box<dyn BuildListener>>>,
    target: RefCell<Option<String>>,
    task: RefCell<Option<String>>,
}

impl EventBus {
    pub fn add_listener(&self, listener: Box<dyn BuildListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn event(&self, message: Option<&str>, priority: MessageLevel) -> BuildEvent {
        BuildEvent {
            target: self.target.borrow().clone(),
            task: self.task.borrow().clone(),
            message: message.map(str::to_string),
            priority,
        }
    }

    // A listener that logs while being notified would re-enter here; such
    // nested events are dropped.
    fn dispatch(&self, mut notify: impl FnMut(&mut dyn BuildListener)) {
        if let Ok(mut listeners) = self.listeners.try_borrow_mut() {
            for listener in listeners.iter_mut() {
                notify(listener.as_mut());
            }
        }
    }

    pub fn build_started(&self) {
        let event = self.event(None, MessageLevel::Info);
        self.dispatch(|l| l.build_started(&event));
    }

    pub fn build_finished(&self, outcome: &BuildOutcome) {
        *self.target.borrow_mut() = None;
        *self.task.borrow_mut() = None;
        let event = self.event(None, MessageLevel::Info);
        self.dispatch(|l| l.build_finished(&event, outcome));
    }

    pub fn target_started(&self, name: &str) {
        *self.target.borrow_mut() = Some(name.to_string());
        let event = self.event(None, MessageLevel::Info);
        self.dispatch(|l| l.target_started(&event));
    }

    pub fn target_finished(&self, failure: Option<&FailureDetail>) {
        let event = self.event(None, MessageLevel::Info);
        self.dispatch(|l| l.target_finished(&event, failure));
        *self.target.borrow_mut() = None;
    }

    pub fn set_task(&self, task: Option<&str>) {
        *self.task.borrow_mut() = task.map(str::to_string);
    }

    pub fn message_logged(&self, message: &str, priority: MessageLevel) {
        let event = self.event(Some(message), priority);
        self.dispatch(|l| l.message_logged(&event));
    }
}

/// Writer turning text into message events, one per line
struct DemuxOutput {
    bus: Rc<EventBus>,
    priority: MessageLevel,
    buffer: Vec<u8>,
}

impl DemuxOutput {
    fn emit(&self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        self.bus
            .message_logged(text.trim_end_matches(['\r', '\n']), self.priority);
    }
}

impl Write for DemuxOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.emit(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.emit(&line);
        }
        Ok(())
    }
}

impl Drop for DemuxOutput {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn property_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("property reference pattern"))
}

/// Engine handle for one run
#[derive(Default)]
pub struct Project {
    name: Option<String>,
    description: Option<String>,
    default_target: Option<String>,
    base_dir: Option<PathBuf>,
    targets: BTreeMap<String, Target>,
    properties: BTreeMap<String, String>,
    user_properties: BTreeSet<String>,
    reserved: BTreeSet<String>,
    loader: Option<Rc<ComponentLoader>>,
    bus: Rc<EventBus>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default_target.as_deref()
    }

    pub fn set_default_target(&mut self, target: impl Into<String>) {
        self.default_target = Some(target.into());
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.set_property("basedir", dir.display().to_string());
        self.base_dir = Some(dir);
    }

    /// Attach the loader embedders use to supply components
    pub fn set_component_loader(&mut self, loader: Option<Rc<ComponentLoader>>) {
        self.loader = loader;
    }

    pub fn component_loader(&self) -> Option<&Rc<ComponentLoader>> {
        self.loader.as_ref()
    }

    pub fn add_build_listener(&mut self, listener: Box<dyn BuildListener>) {
        self.bus.add_listener(listener);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    /// Sink whose lines become message events of this project
    pub fn demux_sink(&self, is_error: bool) -> Sink {
        Sink::new(DemuxOutput {
            bus: Rc::clone(&self.bus),
            priority: if is_error {
                MessageLevel::Warn
            } else {
                MessageLevel::Info
            },
            buffer: Vec::new(),
        })
    }

    pub fn fire_build_started(&self) {
        self.bus.build_started();
    }

    pub fn fire_build_finished(&self, outcome: &BuildOutcome) {
        self.bus.build_finished(outcome);
    }

    pub fn log(&self, message: &str, priority: MessageLevel) {
        self.bus.message_logged(message, priority);
    }

    /// Set up the properties every project starts with
    pub fn init(&mut self) -> Result<(), MyrmexError> {
        self.set_property("os.name", std::env::consts::OS);
        self.set_property("os.arch", std::env::consts::ARCH);
        self.set_property("os.family", std::env::consts::FAMILY);
        Ok(())
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Set a property given by the user; reserved properties stay as they are
    pub fn set_user_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.reserved.contains(&name) {
            self.log(
                &format!("Override ignored for property {}", name),
                MessageLevel::Verbose,
            );
            return;
        }
        self.properties.insert(name.clone(), value.into());
        self.user_properties.insert(name);
    }

    /// Set a property owned by the driver; it is read-only afterwards
    pub fn set_reserved_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.properties.insert(name.clone(), value.into());
        self.user_properties.insert(name.clone());
        self.reserved.insert(name);
    }

    /// Set a property declared by the build description; user values win
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.user_properties.contains(&name) {
            self.log(
                &format!("Override ignored for user property {}", name),
                MessageLevel::Verbose,
            );
            return;
        }
        self.properties.insert(name, value.into());
    }

    /// Expand `${name}` references; unknown names are left as written
    pub fn replace_properties(&self, text: &str) -> String {
        property_reference()
            .replace_all(text, |caps: &Captures| match self.property(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    pub fn add_target(&mut self, target: Target) -> Result<(), MyrmexError> {
        if self.targets.contains_key(&target.name) {
            return Err(MyrmexError::parse_error(
                format!("Duplicate target '{}'", target.name),
                None,
            ));
        }
        self.targets.insert(target.name.clone(), target);
        Ok(())
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn descriptors(&self) -> Vec<TargetDescriptor> {
        self.targets().map(Target::descriptor).collect()
    }

    /// Run the named targets in order, writing their output to `out`
    pub fn execute_targets(&self, names: &[String], out: &Sink) -> Result<(), MyrmexError> {
        for name in names {
            let target = self.target(name).ok_or_else(|| {
                MyrmexError::build_failure(format!(
                    "Target \"{}\" does not exist in the project \"{}\". ",
                    name,
                    self.name()
                ))
            })?;
            self.execute_target(target, out)?;
        }
        Ok(())
    }

    fn execute_target(&self, target: &Target, out: &Sink) -> Result<(), MyrmexError> {
        self.bus.target_started(&target.name);
        let result = self.run_target(target, out);
        let failure = result.as_ref().err().map(FailureDetail::from);
        self.bus.target_finished(failure.as_ref());
        result
    }

    fn run_target(&self, target: &Target, out: &Sink) -> Result<(), MyrmexError> {
        let mut out = out.clone();
        for line in &target.echo {
            self.bus.set_task(Some("echo"));
            let written =
                writeln!(out, "{}", self.replace_properties(line)).and_then(|_| out.flush());
            self.bus.set_task(None);
            written?;
        }

        match &target.fail {
            Some(message) => Err(MyrmexError::build_failure(self.replace_properties(message))),
            None => Ok(()),
        }
    }
}
