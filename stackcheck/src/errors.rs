//! Error types for stackcheck.
//!
//! Errors fall into two groups. Fixture errors (malformed YAML, missing
//! files, broken generators) propagate and abort the scenario. Errors raised
//! by the engine under test are captured as [`EngineError`] values and stored
//! on the scenario state for later assertion. Validation captures only
//! rejected API calls.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for stackcheck operations.
#[derive(Debug, Error)]
pub enum StackcheckError {
    /// A YAML document could not be parsed.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A configuration or template file does not exist.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// A storage or API call was rejected.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A template generator could not produce a body.
    #[error("{0}")]
    Generator(#[from] GeneratorError),

    /// The engine failed for a reason other than a rejected API call.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StackcheckError {
    /// Reads a fixture file, mapping a missing file to [`NotFoundError`].
    pub(crate) fn read_fixture(path: &Path, kind: FileKind) -> Result<String, Self> {
        std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NotFoundError::new(path, kind).into()
            } else {
                Self::Io(e)
            }
        })
    }
}

/// Error raised when a YAML document is malformed.
#[derive(Debug, Clone, Error)]
#[error("Failed to parse {path}: {message}")]
pub struct ParseError {
    /// The file (or pseudo-path) being parsed.
    pub path: PathBuf,
    /// The parser's message.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a parse error from a `serde_yaml` failure.
    #[must_use]
    pub fn from_yaml(path: impl Into<PathBuf>, err: &serde_yaml::Error) -> Self {
        Self::new(path, err.to_string())
    }
}

/// Kind of file a [`NotFoundError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A stack configuration document.
    Config,
    /// A template artifact.
    Template,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Template => write!(f, "template"),
        }
    }
}

/// Error raised when a config or template file is missing.
#[derive(Debug, Clone, Error)]
#[error("{kind} file not found: {path}")]
pub struct NotFoundError {
    /// The missing file.
    pub path: PathBuf,
    /// What the file was expected to contain.
    pub kind: FileKind,
}

impl NotFoundError {
    /// Creates a new not-found error.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Error raised when a storage or API call is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed{}: {message}", .code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct TransportError {
    /// The operation that was rejected (e.g. "ValidateTemplate").
    pub operation: String,
    /// Optional service error code.
    pub code: Option<String>,
    /// The service message.
    pub message: String,
}

impl TransportError {
    /// Creates a new transport error.
    #[must_use]
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Sets the service error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Errors produced while invoking a template generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    /// No generator is registered for the file.
    #[error("No generator entry point registered for {path}")]
    MissingEntryPoint {
        /// The generator file.
        path: PathBuf,
    },

    /// The generator ran and reported a failure.
    #[error("Generator {path} failed: {message}")]
    Failed {
        /// The generator file.
        path: PathBuf,
        /// The failure message.
        message: String,
    },
}

impl GeneratorError {
    /// Creates a generator failure.
    #[must_use]
    pub fn failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Failed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors the planning engine may return from `validate` or `generate`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A cloud API call was rejected.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Rendering the template failed.
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl EngineError {
    /// Creates a generation error.
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Returns true if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Errors surfaced by scenario steps.
#[derive(Debug, Error)]
pub enum StepError {
    /// A fixture was malformed or missing.
    #[error("{0}")]
    Fixture(#[from] StackcheckError),

    /// A rendered body did not match the expected template.
    #[error("Output for target '{target}' does not match {expected}: {detail}")]
    OutputMismatch {
        /// The rendering target whose body differed.
        target: String,
        /// The expected artifact.
        expected: PathBuf,
        /// Where the difference was found.
        detail: String,
    },

    /// An assertion ran before the matching `when` step.
    #[error("No {0} has been captured for this scenario")]
    MissingInvocation(&'static str),

    /// The captured invocation failed where success was expected.
    #[error("Invocation failed: {0}")]
    InvocationFailed(EngineError),

    /// The captured invocation succeeded where failure was expected.
    #[error("Expected the {0} to fail, but it succeeded")]
    UnexpectedSuccess(&'static str),

    /// The captured failure's message did not contain the expected text.
    #[error("Expected an error containing '{expected}', got '{actual}'")]
    ErrorMismatch {
        /// The expected message fragment.
        expected: String,
        /// The captured error message.
        actual: String,
    },

    /// The step text matches no known step.
    #[error("Unknown step: {0}")]
    UnknownStep(String),
}

impl From<ParseError> for StepError {
    fn from(err: ParseError) -> Self {
        Self::Fixture(err.into())
    }
}

impl From<GeneratorError> for StepError {
    fn from(err: GeneratorError) -> Self {
        Self::Fixture(err.into())
    }
}

/// Result alias for stackcheck operations.
pub type Result<T, E = StackcheckError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display_with_code() {
        let err = TransportError::new("ValidateTemplate", "Template format error")
            .with_code("ValidationError");
        assert_eq!(
            err.to_string(),
            "ValidateTemplate failed (ValidationError): Template format error"
        );
    }

    #[test]
    fn test_transport_error_display_without_code() {
        let err = TransportError::new("PutObject", "Access Denied");
        assert_eq!(err.to_string(), "PutObject failed: Access Denied");
    }

    #[test]
    fn test_not_found_display() {
        let err = NotFoundError::new("/tmp/config/vpc.yaml", FileKind::Config);
        assert_eq!(err.to_string(), "config file not found: /tmp/config/vpc.yaml");
    }

    #[test]
    fn test_engine_error_is_transport() {
        let err: EngineError = TransportError::new("ValidateTemplate", "bad").into();
        assert!(err.is_transport());
        assert!(!EngineError::generation("boom").is_transport());
    }

    #[test]
    fn test_read_fixture_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = StackcheckError::read_fixture(&dir.path().join("missing.yaml"), FileKind::Template)
            .unwrap_err();
        assert!(matches!(
            err,
            StackcheckError::NotFound(NotFoundError { kind: FileKind::Template, .. })
        ));
    }
}
