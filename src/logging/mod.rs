//! Logger and listener construction
//!
//! A run has exactly one logger, the listener allowed to render events to the
//! run's sinks, plus any number of extra listeners. Both are looked up by
//! name in the [`ComponentLoader`].

mod default_logger;
mod json_listener;

pub use default_logger::DefaultLogger;
pub use json_listener::JsonEventListener;

use crate::config::RunConfiguration;
use crate::engine::{BuildListener, BuildLogger, Project};
use crate::error::MyrmexError;
use crate::loader::{Component, ComponentLoader};
use crate::output::OutputContext;

/// Builds the observers a run configuration asks for
pub struct LoggerFactory<'a> {
    config: &'a RunConfiguration,
    loader: &'a ComponentLoader,
}

impl<'a> LoggerFactory<'a> {
    pub fn new(config: &'a RunConfiguration, loader: &'a ComponentLoader) -> Self {
        Self { config, loader }
    }

    /// The configured logger, or [`DefaultLogger`], wired to `output`
    pub fn create_logger(
        &self,
        output: &OutputContext,
    ) -> Result<Box<dyn BuildLogger>, MyrmexError> {
        let mut logger: Box<dyn BuildLogger> = match &self.config.logger {
            Some(class) => match self.loader.instantiate(class) {
                Ok(Component::Logger(logger)) => logger,
                Ok(Component::Listener(_)) => {
                    return Err(MyrmexError::NotALogger {
                        class: class.clone(),
                    })
                }
                Err(source) => {
                    return Err(MyrmexError::LoggerInstantiation {
                        class: class.clone(),
                        source,
                    })
                }
            },
            None => Box::new(DefaultLogger::new()),
        };

        logger.set_message_output_level(self.config.level);
        logger.set_output_sink(output.out());
        logger.set_error_sink(output.err());
        logger.set_emacs_mode(self.config.emacs_mode);

        Ok(logger)
    }

    /// One instance per configured listener name, in order, reporting its
    /// own warnings to the error sink of `output`
    pub fn create_listeners(
        &self,
        output: &OutputContext,
    ) -> Result<Vec<Box<dyn BuildListener>>, MyrmexError> {
        self.config
            .listeners
            .iter()
            .map(|class| {
                let mut listener = match self.loader.instantiate(class) {
                    Ok(Component::Listener(listener)) => listener,
                    Ok(Component::Logger(logger)) => logger.into_listener(),
                    Err(source) => {
                        return Err(MyrmexError::ListenerInstantiation {
                            class: class.clone(),
                            source,
                        })
                    }
                };
                listener.set_diagnostic_sink(output.err());
                Ok(listener)
            })
            .collect()
    }

    /// Register the logger, then the listeners, on `project`
    pub fn attach(&self, project: &mut Project, output: &OutputContext) -> Result<(), MyrmexError> {
        let logger = self.create_logger(output)?;
        let listeners = self.create_listeners(output)?;

        project.add_build_listener(logger.into_listener());
        for listener in listeners {
            project.add_build_listener(listener);
        }
        Ok(())
    }
}
