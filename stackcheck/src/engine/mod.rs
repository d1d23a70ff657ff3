//! Collaborator interfaces: the planning engine and object storage.
//!
//! The harness drives these through traits so scenarios can run against a
//! real orchestration tool or the in-process doubles in `testing`.

use async_trait::async_trait;
use std::path::Path;

use crate::context::ProjectContext;
use crate::core::{RenderedOutput, ValidationResponse};
use crate::errors::{EngineError, TransportError};

/// The planning engine under test.
///
/// An engine is built from a [`ProjectContext`] and asked to validate or
/// render that stack's template.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanEngine: Send + Sync {
    /// Validates the stack's template.
    async fn validate(&self, ctx: &ProjectContext) -> Result<ValidationResponse, EngineError>;

    /// Renders the stack's template, one body per target.
    async fn generate(&self, ctx: &ProjectContext) -> Result<RenderedOutput, EngineError>;
}

/// Object storage used to stage S3-handled templates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads a local file to `bucket`/`key`.
    async fn upload_file(&self, local_path: &Path, bucket: &str, key: &str)
        -> Result<(), TransportError>;
}
