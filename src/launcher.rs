//! Run lifecycle and process entry
//!
//! [`start`] parses the command line and hands the resulting configuration
//! to a [`BuildLifecycleRunner`], which drives one build from logger setup to
//! the build-finished event.

use std::any::Any;
use std::collections::BTreeMap;
use std::env;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::rc::Rc;

use crate::catalog::TargetCatalogFormatter;
use crate::cli::{usage, ArgumentParser};
use crate::config::{MessageLevel, RunConfiguration, FILE_PROPERTY, VERSION_PROPERTY};
use crate::engine::{BuildOutcome, FailureDetail, Project};
use crate::error::{ErrorCategory, MyrmexError};
use crate::loader::ComponentLoader;
use crate::logging::LoggerFactory;
use crate::output::OutputContext;
use crate::utils::terminal::{print_error, print_line};
use crate::version;

/// Where a run currently is; states only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    NotStarted,
    StreamsRedirected,
    BuildStarted,
    Configured,
    DescriptionLoaded,
    Listing,
    Executing,
    Finished,
}

/// Drives a single build; not reused across runs
pub struct BuildLifecycleRunner {
    config: RunConfiguration,
    loader: Rc<ComponentLoader>,
    state: LifecycleState,
    start_fired: bool,
    finish_fired: bool,
}

impl BuildLifecycleRunner {
    pub fn new(config: RunConfiguration, loader: Rc<ComponentLoader>) -> Self {
        Self {
            config,
            loader,
            state: LifecycleState::NotStarted,
            start_fired: false,
            finish_fired: false,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the failure of this run went out with a build-finished event
    pub fn failure_reported(&self) -> bool {
        self.finish_fired
    }

    /// Run the build described by the configuration.
    ///
    /// Errors raised before the build-started event are returned as they
    /// are. Once it has fired, every error or panic is first delivered with
    /// the build-finished event, after the output sinks are restored.
    pub fn run(&mut self, ctx: &mut OutputContext) -> Result<(), MyrmexError> {
        if !self.config.ready_to_run {
            return Ok(());
        }
        let build_file = self
            .config
            .resolved_build_file
            .clone()
            .ok_or_else(|| MyrmexError::config_error("No build file was resolved"))?;

        if self.config.shows(MessageLevel::Info) {
            print_line(&ctx.out(), &format!("Buildfile: {}", build_file.display()));
        }

        let mut project = Project::new();
        project.set_component_loader(Some(Rc::clone(&self.loader)));
        LoggerFactory::new(&self.config, &self.loader).attach(&mut project, ctx)?;

        let scope = ctx.redirect(project.demux_sink(false), project.demux_sink(true));
        self.state = LifecycleState::StreamsRedirected;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.drive(&mut project, &scope, &build_file)
        }));
        drop(scope);

        if self.start_fired {
            let outcome = match &result {
                Ok(Ok(())) => BuildOutcome::success(),
                Ok(Err(e)) => BuildOutcome::failed(FailureDetail::from(e)),
                Err(payload) => {
                    BuildOutcome::failed(FailureDetail::new(panic_message(&**payload)))
                }
            };
            if !outcome.success {
                project.log(
                    &format!("Build stopped in state {:?}", self.state),
                    MessageLevel::Debug,
                );
            }
            self.finish_fired = true;
            project.fire_build_finished(&outcome);
        }
        self.state = LifecycleState::Finished;

        match result {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn drive(
        &mut self,
        project: &mut Project,
        output: &OutputContext,
        build_file: &Path,
    ) -> Result<(), MyrmexError> {
        if !self.config.project_help {
            project.fire_build_started();
            self.start_fired = true;
            self.state = LifecycleState::BuildStarted;
        }

        project.init()?;
        project.set_reserved_property(VERSION_PROPERTY, version::banner());
        for (name, value) in &self.config.properties {
            project.set_user_property(name.as_str(), value.as_str());
        }
        project.set_reserved_property(FILE_PROPERTY, build_file.display().to_string());
        self.state = LifecycleState::Configured;

        let helper = project
            .component_loader()
            .ok_or_else(|| MyrmexError::NoParser {
                source: anyhow::anyhow!("no component loader is attached to the project"),
            })?
            .project_helper(build_file)?;
        helper.configure_project(project, build_file)?;
        if let Some(dir) = project.base_dir() {
            project.log(
                &format!("Project base dir set to: {}", dir.display()),
                MessageLevel::Verbose,
            );
        }
        self.state = LifecycleState::DescriptionLoaded;

        if self.config.project_help {
            self.state = LifecycleState::Listing;
            return print_project_help(project, output, self.config.level > MessageLevel::Info);
        }

        self.state = LifecycleState::Executing;
        let targets = if self.config.targets.is_empty() {
            match project.default_target() {
                Some(target) => vec![target.to_string()],
                None => {
                    return Err(MyrmexError::build_failure(
                        "No target specified and the project has no default target",
                    ))
                }
            }
        } else {
            self.config.targets.clone()
        };
        project.execute_targets(&targets, &output.out())
    }
}

fn print_project_help(
    project: &Project,
    output: &OutputContext,
    include_subtargets: bool,
) -> Result<(), MyrmexError> {
    let mut out = output.out();
    if let Some(description) = project.description() {
        writeln!(out, "{}", description)?;
    }
    let descriptors = project.descriptors();
    let catalog = TargetCatalogFormatter::new(&descriptors, project.default_target());
    write!(out, "{}", catalog.render(include_subtargets))?;
    out.flush()?;
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn report(ctx: &OutputContext, error: &MyrmexError) {
    error.display_with_hints(&ctx.err());
    if error.wants_usage() {
        print_line(&ctx.out(), &usage());
    }
}

/// Process entry: run with `args` from the current directory and return the
/// exit code. Embedders may add properties and supply their own components.
pub fn start(
    args: &[String],
    additional_properties: Option<BTreeMap<String, String>>,
    loader: Option<ComponentLoader>,
) -> i32 {
    let mut ctx = OutputContext::stdio();
    let working_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            report(&ctx, &MyrmexError::Io(e));
            return 1;
        }
    };
    start_in(&mut ctx, &working_dir, args, additional_properties, loader)
}

/// [`start`] with an explicit output context and working directory
pub fn start_in(
    ctx: &mut OutputContext,
    working_dir: &Path,
    args: &[String],
    additional_properties: Option<BTreeMap<String, String>>,
    loader: Option<ComponentLoader>,
) -> i32 {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        launch(ctx, working_dir, args, additional_properties, loader)
    }));

    match result {
        Ok(code) => code,
        Err(payload) => {
            print_error(
                &ctx.err(),
                &format!("Unexpected failure: {}", panic_message(&*payload)),
            );
            1
        }
    }
}

fn launch(
    ctx: &mut OutputContext,
    working_dir: &Path,
    args: &[String],
    additional_properties: Option<BTreeMap<String, String>>,
    loader: Option<ComponentLoader>,
) -> i32 {
    let mut config = match ArgumentParser::new(ctx, working_dir).parse(args) {
        Ok(config) => config,
        Err(e) => {
            report(ctx, &e);
            return 1;
        }
    };
    if let Some(properties) = additional_properties {
        config.merge_properties(properties);
    }

    let loader = Rc::new(loader.unwrap_or_else(|| ComponentLoader::builtin(working_dir)));
    let mut runner = BuildLifecycleRunner::new(config, loader);
    match runner.run(ctx) {
        Ok(()) => 0,
        Err(e) => {
            if !runner.failure_reported() || e.category() == ErrorCategory::Unexpected {
                report(ctx, &e);
            }
            1
        }
    }
}
