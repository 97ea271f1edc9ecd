//! Build description parsing
//!
//! A [`ProjectHelper`] turns a build file into targets and properties on a
//! [`Project`]. The TOML helper reads files like:
//!
//! ```toml
//! [project]
//! name = "demo"
//! default = "build"
//! description = "Demo project"
//!
//! [properties]
//! greeting = "hello"
//!
//! [target.build]
//! description = "Builds it"
//! echo = ["${greeting} from build"]
//!
//! [target.broken]
//! fail = "it broke"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use super::{Project, Target};
use crate::error::MyrmexError;

/// Configures a project from a build description file
pub trait ProjectHelper {
    fn configure_project(
        &self,
        project: &mut Project,
        build_file: &Path,
    ) -> Result<(), MyrmexError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildDescription {
    #[serde(default)]
    project: ProjectSection,

    #[serde(default)]
    properties: BTreeMap<String, String>,

    #[serde(default, rename = "target")]
    targets: BTreeMap<String, TargetSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectSection {
    name: Option<String>,
    default: Option<String>,
    description: Option<String>,
    /// Relative to the build file's directory
    basedir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSection {
    description: Option<String>,
    #[serde(default)]
    echo: Vec<String>,
    fail: Option<String>,
}

/// Reads TOML build descriptions
#[derive(Debug, Default)]
pub struct TomlProjectHelper;

impl TomlProjectHelper {
    fn parse(content: &str, build_file: &Path) -> Result<BuildDescription, MyrmexError> {
        toml::from_str(content).map_err(|e| {
            MyrmexError::parse_error(
                format!("Invalid build description {}: {}", build_file.display(), e.message()),
                Some(e.into()),
            )
        })
    }
}

impl ProjectHelper for TomlProjectHelper {
    fn configure_project(
        &self,
        project: &mut Project,
        build_file: &Path,
    ) -> Result<(), MyrmexError> {
        let content = std::fs::read_to_string(build_file)
            .with_context(|| format!("Failed to read {}", build_file.display()))
            .map_err(|e| {
                MyrmexError::parse_error(
                    format!("Unable to read build description {}", build_file.display()),
                    Some(e),
                )
            })?;
        let description = Self::parse(&content, build_file)?;

        let file_dir = build_file.parent().unwrap_or_else(|| Path::new("."));
        let base_dir = match &description.project.basedir {
            Some(dir) => file_dir.join(dir),
            None => file_dir.to_path_buf(),
        };
        project.set_base_dir(base_dir);

        if let Some(name) = description.project.name {
            project.set_name(name);
        }
        if let Some(text) = description.project.description {
            project.set_description(text);
        }
        if let Some(default) = description.project.default {
            project.set_default_target(default);
        }

        for (name, value) in description.properties {
            project.set_property(name, value);
        }

        for (name, section) in description.targets {
            project.add_target(Target {
                description: section.description,
                echo: section.echo,
                fail: section.fail,
                ..Target::new(name)
            })?;
        }

        Ok(())
    }
}
