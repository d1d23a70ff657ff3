//! Harness configuration.
//!
//! Values come from defaults, an optional YAML file and environment
//! variables, in that order of increasing precedence.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{FileKind, ParseError, Result, StackcheckError};

/// Environment variable naming the project root.
pub const PROJECT_PATH_ENV: &str = "STACKCHECK_PROJECT_PATH";
/// Environment variable naming the bucket that receives test artifacts.
pub const ARTIFACT_BUCKET_ENV: &str = "TEST_ARTIFACT_BUCKET_NAME";
/// Environment variable selecting the log format (`plain` or `json`).
pub const LOG_FORMAT_ENV: &str = "STACKCHECK_LOG_FORMAT";

/// Output format for log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Some(Self::Plain),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration shared by every scenario in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Root of the project under test.
    #[serde(default = "default_project_path")]
    pub project_path: PathBuf,
    /// Config directory, relative to the project root.
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    /// Templates directory, relative to the project root.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
    /// Bucket that S3-handled templates are redirected to.
    #[serde(default = "default_artifact_bucket")]
    pub artifact_bucket: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_project_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_config_dir() -> String {
    "config".to_string()
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_artifact_bucket() -> String {
    "stackcheck-test-artifacts".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            project_path: default_project_path(),
            config_dir: default_config_dir(),
            templates_dir: default_templates_dir(),
            artifact_bucket: default_artifact_bucket(),
            log_format: LogFormat::default(),
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration rooted at `project_path`.
    #[must_use]
    pub fn for_project(project_path: impl Into<PathBuf>) -> Self {
        Self::default().with_project_path(project_path)
    }

    /// Loads configuration from a YAML file.
    ///
    /// Missing keys take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = StackcheckError::read_fixture(path, FileKind::Config)?;
        let config = serde_yaml::from_str(&content).map_err(|e| ParseError::from_yaml(path, &e))?;
        Ok(config)
    }

    /// Builds configuration from defaults overridden by the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(PROJECT_PATH_ENV).filter(|v| !v.is_empty()) {
            self.project_path = PathBuf::from(path);
        }
        if let Some(bucket) = lookup(ARTIFACT_BUCKET_ENV).filter(|v| !v.is_empty()) {
            self.artifact_bucket = bucket;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV).as_deref().and_then(LogFormat::parse) {
            self.log_format = format;
        }
        self
    }

    /// Sets the project root.
    #[must_use]
    pub fn with_project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_path = path.into();
        self
    }

    /// Sets the config directory name.
    #[must_use]
    pub fn with_config_dir(mut self, dir: impl Into<String>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Sets the templates directory name.
    #[must_use]
    pub fn with_templates_dir(mut self, dir: impl Into<String>) -> Self {
        self.templates_dir = dir.into();
        self
    }

    /// Sets the artifact bucket.
    #[must_use]
    pub fn with_artifact_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.artifact_bucket = bucket.into();
        self
    }

    /// Returns `<project>/<templates_dir>`.
    #[must_use]
    pub fn templates_path(&self) -> PathBuf {
        self.project_path.join(&self.templates_dir)
    }

    /// Returns `<project>/<config_dir>`.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.project_path.join(&self.config_dir)
    }
}
