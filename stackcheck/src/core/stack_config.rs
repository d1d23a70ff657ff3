//! Stack configuration documents.

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use super::BucketPath;
use crate::errors::{FileKind, ParseError, Result, StackcheckError};

const TEMPLATE_PATH_KEY: &str = "template_path";
const TEMPLATE_KEY: &str = "template";
const TYPE_KEY: &str = "type";
const PATH_KEY: &str = "path";

/// Handler type that stores templates in object storage.
pub const S3_HANDLER: &str = "s3";

/// The template handler declared under a document's `template` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateHandler {
    /// Template fetched from a bucket.
    S3 {
        /// Current bucket location.
        path: BucketPath,
    },
    /// Any other handler type, treated as a local file.
    File {
        /// The declared handler type, if any.
        handler_type: Option<String>,
    },
}

impl TemplateHandler {
    /// Returns true for the S3 handler.
    #[must_use]
    pub const fn is_s3(&self) -> bool {
        matches!(self, Self::S3 { .. })
    }
}

/// A stack configuration document loaded from disk.
///
/// Only the template keys are interpreted. Every other key is carried
/// through untouched so a rewrite never adds or drops fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    path: PathBuf,
    document: Mapping,
}

impl StackConfig {
    /// Loads the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is missing and `Parse` if it is not a
    /// YAML mapping.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = StackcheckError::read_fixture(&path, FileKind::Config)?;
        Ok(Self::parse(path, &content)?)
    }

    /// Parses a document from a string, remembering `path` for saving.
    ///
    /// An empty document is treated as an empty mapping.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, ParseError> {
        let path = path.into();
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| ParseError::from_yaml(&path, &e))?;
        let document = match value {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            other => {
                return Err(ParseError::new(
                    &path,
                    format!("expected a mapping, found {}", value_kind(&other)),
                ))
            }
        };
        Ok(Self { path, document })
    }

    /// Returns the file this document was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the raw document.
    #[must_use]
    pub fn document(&self) -> &Mapping {
        &self.document
    }

    /// Returns a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// Returns true if the legacy `template_path` key is present.
    #[must_use]
    pub fn has_template_path(&self) -> bool {
        self.document.contains_key(TEMPLATE_PATH_KEY)
    }

    /// Returns the `template_path` value when it is a string.
    #[must_use]
    pub fn template_path(&self) -> Option<&str> {
        self.document.get(TEMPLATE_PATH_KEY).and_then(Value::as_str)
    }

    /// Returns the `template.path` value when it is a string.
    #[must_use]
    pub fn template_handler_path(&self) -> Option<&str> {
        self.document
            .get(TEMPLATE_KEY)
            .and_then(|t| t.get(PATH_KEY))
            .and_then(Value::as_str)
    }

    /// Interprets the `template` key, if present.
    ///
    /// The handler type is compared case-insensitively to `"s3"`; a missing
    /// type means the file handler.
    ///
    /// # Errors
    ///
    /// Returns a parse error if `template` is not a mapping, or if an S3
    /// handler's `path` is not a string.
    pub fn handler(&self) -> Result<Option<TemplateHandler>, ParseError> {
        let Some(template) = self.document.get(TEMPLATE_KEY) else {
            return Ok(None);
        };
        let Value::Mapping(template) = template else {
            return Err(ParseError::new(
                &self.path,
                format!("'template' must be a mapping, found {}", value_kind(template)),
            ));
        };

        let handler_type = template.get(TYPE_KEY).and_then(Value::as_str);
        if handler_type.is_some_and(|t| t.eq_ignore_ascii_case(S3_HANDLER)) {
            let raw = template.get(PATH_KEY).and_then(Value::as_str).ok_or_else(|| {
                ParseError::new(&self.path, "s3 template handler requires a string 'path'")
            })?;
            return Ok(Some(TemplateHandler::S3 {
                path: BucketPath::parse(raw),
            }));
        }

        Ok(Some(TemplateHandler::File {
            handler_type: handler_type.map(str::to_string),
        }))
    }

    /// Overwrites `template_path`. No-op if the key is absent.
    pub fn set_template_path(&mut self, value: impl Into<String>) {
        if let Some(slot) = self.document.get_mut(TEMPLATE_PATH_KEY) {
            *slot = Value::String(value.into());
        }
    }

    /// Overwrites `template.path`. No-op if `template` is absent or not a mapping.
    pub fn set_template_handler_path(&mut self, value: impl Into<String>) {
        if let Some(Value::Mapping(template)) = self.document.get_mut(TEMPLATE_KEY) {
            template.insert(Value::String(PATH_KEY.to_string()), Value::String(value.into()));
        }
    }

    /// Serializes the document in block style.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.document)
            .map_err(|e| StackcheckError::Serialization(e.to_string()))
    }

    /// Writes the document back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(&self.path, yaml)?;
        Ok(())
    }
}

pub(crate) const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
