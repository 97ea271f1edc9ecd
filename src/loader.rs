//! Named component lookup
//!
//! Loggers, listeners and project helpers are looked up by name through a
//! [`ComponentLoader`]. Every factory yields a typed [`Component`] or an
//! [`InstantiationError`]; the caller decides whether the component has the
//! capability it needs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::{BuildListener, BuildLogger, ProjectHelper, TomlProjectHelper};
use crate::error::MyrmexError;
use crate::logging::{DefaultLogger, JsonEventListener};

/// An instantiated observer, tagged with its capability
pub enum Component {
    Logger(Box<dyn BuildLogger>),
    Listener(Box<dyn BuildListener>),
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Logger(_) => write!(f, "Component::Logger"),
            Component::Listener(_) => write!(f, "Component::Listener"),
        }
    }
}

/// Why a component could not be created
#[derive(Error, Debug)]
pub enum InstantiationError {
    #[error("no component named '{0}' is registered")]
    NotFound(String),

    #[error("component '{name}' failed to initialize: {reason}")]
    Failed { name: String, reason: String },
}

impl InstantiationError {
    /// Short name of the error kind, shown in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            InstantiationError::NotFound(_) => "ComponentNotFound",
            InstantiationError::Failed { .. } => "InstantiationFailed",
        }
    }
}

pub type ComponentFactory = Box<dyn Fn() -> Result<Component, InstantiationError>>;

/// Produces a helper, `Ok(None)` when the helper is unavailable
pub type HelperFactory = Box<dyn Fn() -> anyhow::Result<Option<Box<dyn ProjectHelper>>>>;

/// Registry of named components and per-extension project helpers
#[derive(Default)]
pub struct ComponentLoader {
    components: BTreeMap<String, ComponentFactory>,
    helpers: BTreeMap<String, HelperFactory>,
}

impl ComponentLoader {
    /// Loader with nothing registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loader with the components shipped with myrmex; files they write
    /// land in `base_dir`
    pub fn builtin(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let mut loader = Self::empty();
        loader.register_component("DefaultLogger", || {
            Ok(Component::Logger(Box::new(DefaultLogger::new())))
        });
        loader.register_component("JsonEventListener", move || {
            if !base_dir.is_dir() {
                return Err(InstantiationError::Failed {
                    name: "JsonEventListener".to_string(),
                    reason: format!("{} is not a directory", base_dir.display()),
                });
            }
            Ok(Component::Listener(Box::new(JsonEventListener::new(
                base_dir.join(JsonEventListener::DEFAULT_FILE),
            ))))
        });
        loader.register_helper("toml", || Ok(Some(Box::new(TomlProjectHelper))));
        loader
    }

    pub fn register_component<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Component, InstantiationError> + 'static,
    {
        self.components.insert(name.into(), Box::new(factory));
    }

    /// Register the helper for build files ending in `.<extension>`
    pub fn register_helper<F>(&mut self, extension: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Option<Box<dyn ProjectHelper>>> + 'static,
    {
        self.helpers.insert(extension.into(), Box::new(factory));
    }

    pub fn instantiate(&self, name: &str) -> Result<Component, InstantiationError> {
        let factory = self
            .components
            .get(name)
            .ok_or_else(|| InstantiationError::NotFound(name.to_string()))?;
        factory()
    }

    /// Helper able to read `build_file`.
    ///
    /// A missing registration, a failing factory and a factory without a
    /// result all mean the same thing to the user and become
    /// [`MyrmexError::NoParser`].
    pub fn project_helper(
        &self,
        build_file: &Path,
    ) -> Result<Box<dyn ProjectHelper>, MyrmexError> {
        let extension = build_file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let factory = self.helpers.get(extension).ok_or_else(|| MyrmexError::NoParser {
            source: anyhow::anyhow!(
                "no project helper registered for '.{}' files",
                extension
            ),
        })?;

        match factory() {
            Ok(Some(helper)) => Ok(helper),
            Ok(None) => Err(MyrmexError::NoParser {
                source: anyhow::anyhow!("project helper for '.{}' files is unavailable", extension),
            }),
            Err(e) => Err(MyrmexError::NoParser { source: e }),
        }
    }
}
