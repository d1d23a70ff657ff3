//! Config path resolution.
//!
//! Points a stack's configuration document at a chosen template and
//! persists the result. The document must already exist; resolution
//! mutates it but never creates one.

mod rewrite;

pub use rewrite::{rewrite_document, HandlerRewrite, Rewrite};

use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::HarnessConfig;
use crate::context::ProjectContext;
use crate::core::StackConfig;
use crate::errors::Result;
use crate::events::{types, EventSink, NoOpEventSink};

/// What resolving a stack's template changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    /// The stack whose document was rewritten.
    pub stack_name: String,
    /// The rewritten document.
    pub config_file: PathBuf,
    /// `<project>/<templates_dir>/<template>`.
    pub local_template: PathBuf,
    /// The fields that were rewritten.
    pub rewrite: Rewrite,
}

/// Rewrites stack configuration documents to reference test templates.
pub struct ConfigPathResolver {
    config: HarnessConfig,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for ConfigPathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigPathResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConfigPathResolver {
    /// Creates a resolver for the given harness configuration.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the harness configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Rewrites the document of `stack_name` to reference `template_name`.
    ///
    /// The document is written back even when it has no template keys.
    /// Running this twice with the same arguments leaves the same document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the document is missing, `Parse` if it is
    /// malformed, and `Io` if it cannot be written back.
    pub fn resolve_and_rewrite(
        &self,
        stack_name: &str,
        template_name: &str,
    ) -> Result<ResolvedTemplate> {
        let ctx = ProjectContext::for_stack(&self.config, stack_name);
        let config_file = ctx.config_file();
        let local_template = ctx.template_file(template_name);

        let mut document = StackConfig::load(&config_file)?;
        let rewrite = rewrite_document(&mut document, &local_template, &self.config.artifact_bucket)?;
        document.save()?;

        let location = rewrite.location();
        debug!(
            stack = %stack_name,
            config = %config_file.display(),
            location = ?location,
            "Rewrote stack config"
        );
        self.event_sink.try_emit(
            types::CONFIG_REWRITTEN,
            Some(json!({
                "stack": stack_name,
                "template": template_name,
                "config_file": config_file.display().to_string(),
                "location": location,
            })),
        );

        Ok(ResolvedTemplate {
            stack_name: stack_name.to_string(),
            config_file,
            local_template,
            rewrite,
        })
    }
}
