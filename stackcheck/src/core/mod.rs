//! Core domain model types for stackcheck.
//!
//! This module contains:
//! - Bucket-relative template locations
//! - Stack configuration documents and their template handlers
//! - Engine outputs (rendered bodies, validation responses)

mod bucket_path;
mod rendered;
mod stack_config;

pub use bucket_path::BucketPath;
pub use rendered::{RenderedOutput, ValidationResponse};
pub(crate) use stack_config::value_kind;
pub use stack_config::{StackConfig, TemplateHandler, S3_HANDLER};
