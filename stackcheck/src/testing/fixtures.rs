//! On-disk project fixtures.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::HarnessConfig;
use crate::core::StackConfig;
use crate::errors::Result;

/// A throwaway project directory with `config/` and `templates/`.
///
/// The directory is removed when the fixture is dropped.
#[derive(Debug)]
pub struct ProjectFixture {
    dir: TempDir,
    config: HarnessConfig,
}

impl ProjectFixture {
    /// Creates an empty project with the default layout.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directories cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let config = HarnessConfig::for_project(dir.path());
        std::fs::create_dir_all(config.config_path())?;
        std::fs::create_dir_all(config.templates_path())?;
        Ok(Self { dir, config })
    }

    /// Sets the artifact bucket S3 handlers are redirected to.
    #[must_use]
    pub fn with_artifact_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config = self.config.with_artifact_bucket(bucket);
        self
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the harness configuration for this project.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the path of a stack's configuration document.
    #[must_use]
    pub fn config_file(&self, stack_name: &str) -> PathBuf {
        self.config.config_path().join(format!("{stack_name}.yaml"))
    }

    /// Returns the path of a template.
    #[must_use]
    pub fn template_file(&self, template_name: &str) -> PathBuf {
        self.config.templates_path().join(template_name)
    }

    /// Writes a stack's configuration document.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn write_config(&self, stack_name: &str, content: &str) -> Result<PathBuf> {
        write_file(self.config_file(stack_name), content)
    }

    /// Writes a template into the templates directory.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn write_template(&self, template_name: &str, content: &str) -> Result<PathBuf> {
        write_file(self.template_file(template_name), content)
    }

    /// Loads a stack's configuration document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Parse` as [`StackConfig::load`] does.
    pub fn read_config(&self, stack_name: &str) -> Result<StackConfig> {
        StackConfig::load(self.config_file(stack_name))
    }
}

fn write_file(path: PathBuf, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let fixture = ProjectFixture::new().unwrap();
        assert!(fixture.root().join("config").is_dir());
        assert!(fixture.root().join("templates").is_dir());
        assert_eq!(fixture.config().project_path, fixture.root());
    }

    #[test]
    fn test_write_and_read_nested_config() {
        let fixture = ProjectFixture::new().unwrap().with_artifact_bucket("artifacts");
        fixture
            .write_config("network/vpc", "template_path: vpc.yaml\n")
            .unwrap();

        let config = fixture.read_config("network/vpc").unwrap();
        assert_eq!(config.template_path(), Some("vpc.yaml"));
        assert_eq!(fixture.config().artifact_bucket, "artifacts");
    }

    #[test]
    fn test_removed_on_drop() {
        let fixture = ProjectFixture::new().unwrap();
        let root = fixture.root().to_path_buf();
        drop(fixture);
        assert!(!root.exists());
    }
}
