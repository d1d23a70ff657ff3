//! Engine context for a single stack.

use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;

const CONFIG_EXTENSION: &str = ".yaml";

/// Locates one stack's configuration and templates within a project.
///
/// This is the context the planning engine is constructed from: a command
/// path (`<stack>.yaml`), the project root and the dependency flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    command_path: String,
    project_path: PathBuf,
    config_dir: String,
    templates_dir: String,
    ignore_dependencies: bool,
}

impl ProjectContext {
    /// Creates a context for a command path with the default layout.
    #[must_use]
    pub fn new(command_path: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        let defaults = HarnessConfig::default();
        Self {
            command_path: command_path.into(),
            project_path: project_path.into(),
            config_dir: defaults.config_dir,
            templates_dir: defaults.templates_dir,
            ignore_dependencies: false,
        }
    }

    /// Creates a context for `stack_name` using the harness layout.
    #[must_use]
    pub fn for_stack(config: &HarnessConfig, stack_name: &str) -> Self {
        Self {
            command_path: format!("{stack_name}{CONFIG_EXTENSION}"),
            project_path: config.project_path.clone(),
            config_dir: config.config_dir.clone(),
            templates_dir: config.templates_dir.clone(),
            ignore_dependencies: false,
        }
    }

    /// Sets whether the engine should skip dependency ordering.
    #[must_use]
    pub fn with_ignore_dependencies(mut self, ignore: bool) -> Self {
        self.ignore_dependencies = ignore;
        self
    }

    /// Returns the command path (`<stack>.yaml`).
    #[must_use]
    pub fn command_path(&self) -> &str {
        &self.command_path
    }

    /// Returns the stack name, without the config extension.
    #[must_use]
    pub fn stack_name(&self) -> &str {
        self.command_path
            .strip_suffix(CONFIG_EXTENSION)
            .unwrap_or(&self.command_path)
    }

    /// Returns the project root.
    #[must_use]
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Returns the templates directory, relative to the project root.
    #[must_use]
    pub fn templates_path(&self) -> &str {
        &self.templates_dir
    }

    /// Returns true if dependency ordering should be skipped.
    #[must_use]
    pub const fn ignore_dependencies(&self) -> bool {
        self.ignore_dependencies
    }

    /// Returns `<project>/<config_dir>`.
    #[must_use]
    pub fn full_config_path(&self) -> PathBuf {
        self.project_path.join(&self.config_dir)
    }

    /// Returns `<project>/<templates_dir>`.
    #[must_use]
    pub fn full_templates_path(&self) -> PathBuf {
        self.project_path.join(&self.templates_dir)
    }

    /// Returns the stack's configuration file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.full_config_path().join(&self.command_path)
    }

    /// Returns the path of a template within the templates directory.
    #[must_use]
    pub fn template_file(&self, template_name: &str) -> PathBuf {
        self.full_templates_path().join(template_name)
    }
}
