//! Rewriting template references inside a stack configuration document.

use std::path::Path;
use tracing::warn;

use crate::core::{BucketPath, StackConfig, TemplateHandler};
use crate::errors::ParseError;

/// The new value written to `template.path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerRewrite {
    /// A local template path.
    File {
        /// Absolute template path.
        path: String,
    },
    /// A bucket location in the artifact bucket.
    S3 {
        /// The location the handler now points at.
        path: BucketPath,
        /// The location it pointed at before.
        previous: BucketPath,
    },
}

/// What a rewrite changed in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// New `template_path`, if the document had one.
    pub template_path: Option<String>,
    /// New `template.path`, if the document had a `template` handler.
    pub handler: Option<HandlerRewrite>,
}

impl Rewrite {
    /// Returns true if the document had no template keys.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        self.template_path.is_none() && self.handler.is_none()
    }

    /// Returns the location the stack now renders from, if any.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match &self.handler {
            Some(HandlerRewrite::File { path }) => Some(path.clone()),
            Some(HandlerRewrite::S3 { path, .. }) => Some(path.to_string()),
            None => self.template_path.clone(),
        }
    }
}

/// Points `config` at a template.
///
/// `template_path` is always replaced with `local_template`. A `template`
/// handler of type S3 keeps its key but moves to `artifact_bucket`; any
/// other handler type is pointed at `local_template`. Keys that are absent
/// stay absent.
///
/// # Errors
///
/// Returns a parse error if the `template` key is malformed.
pub fn rewrite_document(
    config: &mut StackConfig,
    local_template: &Path,
    artifact_bucket: &str,
) -> Result<Rewrite, ParseError> {
    let local = path_string(local_template);
    let handler = config.handler()?;

    let template_path = config.has_template_path().then(|| {
        config.set_template_path(local.clone());
        local.clone()
    });

    let handler = handler.map(|handler| match handler {
        TemplateHandler::S3 { path: previous } => {
            if previous.has_empty_key() {
                warn!(
                    config = %config.path().display(),
                    previous = %previous,
                    "S3 template path has no key segment; rewriting to an empty key"
                );
            }
            let path = previous.rebucket(artifact_bucket);
            config.set_template_handler_path(path.to_string());
            HandlerRewrite::S3 { path, previous }
        }
        TemplateHandler::File { .. } => {
            config.set_template_handler_path(local.clone());
            HandlerRewrite::File { path: local.clone() }
        }
    });

    Ok(Rewrite {
        template_path,
        handler,
    })
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOCAL: &str = "/project/templates/vpc.yaml";

    fn rewrite(content: &str) -> (StackConfig, Rewrite) {
        let mut config = StackConfig::parse("/project/config/vpc.yaml", content).unwrap();
        let rewrite = rewrite_document(&mut config, Path::new(LOCAL), "test-artifacts").unwrap();
        (config, rewrite)
    }

    #[test]
    fn test_template_path_rewritten() {
        let (config, rewrite) = rewrite("template_path: old.yaml\nparameters:\n  Env: dev\n");
        assert_eq!(config.template_path(), Some(LOCAL));
        assert_eq!(rewrite.template_path.as_deref(), Some(LOCAL));
        assert_eq!(rewrite.handler, None);
        assert!(config.get("template").is_none());
        assert_eq!(config.document().len(), 2);
    }

    #[test]
    fn test_s3_handler_rebucketed() {
        let (config, rewrite) =
            rewrite("template:\n  type: s3\n  path: old-bucket/prefix/key.yaml\n");
        assert_eq!(config.template_handler_path(), Some("test-artifacts/prefix/key.yaml"));
        assert_eq!(
            rewrite.handler,
            Some(HandlerRewrite::S3 {
                path: BucketPath::parse("test-artifacts/prefix/key.yaml"),
                previous: BucketPath::parse("old-bucket/prefix/key.yaml"),
            })
        );
        assert!(!config.has_template_path());
    }

    #[test]
    fn test_s3_handler_uppercase() {
        let (config, _) = rewrite("template:\n  type: S3\n  path: b/k.yaml\n");
        assert_eq!(config.template_handler_path(), Some("test-artifacts/k.yaml"));
    }

    #[test]
    fn test_s3_handler_without_key() {
        let (config, rewrite) = rewrite("template:\n  type: s3\n  path: bare\n");
        assert_eq!(config.template_handler_path(), Some("test-artifacts/"));
        assert_eq!(rewrite.location().as_deref(), Some("test-artifacts/"));
    }

    #[test]
    fn test_file_handler_gets_local_path() {
        let (config, rewrite) = rewrite("template:\n  type: file\n  path: old.yaml\n");
        assert_eq!(config.template_handler_path(), Some(LOCAL));
        assert_eq!(rewrite.location().as_deref(), Some(LOCAL));
    }

    #[test]
    fn test_other_handler_type_gets_local_path() {
        let (config, _) = rewrite("template:\n  type: http\n  path: https://example.com/t.yaml\n");
        assert_eq!(config.template_handler_path(), Some(LOCAL));
        assert_eq!(config.get("template").unwrap().get("type").unwrap(), "http");
    }

    #[test]
    fn test_neither_key() {
        let (config, rewrite) = rewrite("parameters:\n  Env: dev\n");
        assert!(rewrite.is_unchanged());
        assert_eq!(rewrite.location(), None);
        assert_eq!(config.to_yaml().unwrap(), "parameters:\n  Env: dev\n");
    }

    #[test]
    fn test_both_keys_rewritten() {
        let (config, rewrite) =
            rewrite("template_path: a.yaml\ntemplate:\n  type: file\n  path: b.yaml\n");
        assert_eq!(config.template_path(), Some(LOCAL));
        assert_eq!(config.template_handler_path(), Some(LOCAL));
        assert!(rewrite.template_path.is_some() && rewrite.handler.is_some());
    }

    #[test]
    fn test_malformed_template_key_leaves_document_alone() {
        let mut config =
            StackConfig::parse("c.yaml", "template_path: a.yaml\ntemplate: nope\n").unwrap();
        assert!(rewrite_document(&mut config, Path::new(LOCAL), "b").is_err());
        assert_eq!(config.template_path(), Some("a.yaml"));
    }
}
