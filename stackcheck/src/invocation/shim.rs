//! Calling the engine and capturing its outcome.

use serde_json::json;
use tracing::{debug, info, warn};

use super::Invocation;
use crate::context::{InvocationKind, ProjectContext};
use crate::core::{BucketPath, RenderedOutput, StackConfig, TemplateHandler, ValidationResponse};
use crate::engine::{ObjectStore, PlanEngine};
use crate::errors::{EngineError, Result, TransportError};
use crate::events::{types, EventSink};

/// Validates a stack's template and captures the outcome.
///
/// Only a rejected API call is captured as a failed invocation.
///
/// # Errors
///
/// Any other engine failure, such as a missing template file, propagates.
pub async fn validate_stack(
    engine: &dyn PlanEngine,
    ctx: &ProjectContext,
    sink: &dyn EventSink,
) -> Result<Invocation<ValidationResponse>> {
    debug!(
        stack = %ctx.stack_name(),
        ignore_dependencies = ctx.ignore_dependencies(),
        "Validating template"
    );
    match engine.validate(ctx).await {
        Ok(response) => {
            info!(
                stack = %ctx.stack_name(),
                parameters = response.parameters.len(),
                "Template validated"
            );
            sink.emit(
                types::PLAN_VALIDATED,
                Some(json!({
                    "stack": ctx.stack_name(),
                    "parameters": response.parameters,
                })),
            )
            .await;
            Ok(Invocation::Succeeded(response))
        }
        Err(EngineError::Transport(err)) => {
            let err = EngineError::from(err);
            report_failure(ctx, InvocationKind::Validation, &err, sink).await;
            Ok(Invocation::Failed(err))
        }
        Err(err) => Err(err.into()),
    }
}

/// Renders a stack's template and captures the outcome.
///
/// Unless dependencies are ignored, a stack whose template handler is S3
/// first has its local template uploaded to the handler's bucket and key.
/// A rejected upload is captured as a failed invocation.
///
/// # Errors
///
/// Fixture errors reading the stack's document propagate.
pub async fn generate_stack(
    engine: &dyn PlanEngine,
    store: &dyn ObjectStore,
    ctx: &ProjectContext,
    sink: &dyn EventSink,
) -> Result<Invocation<RenderedOutput>> {
    if !ctx.ignore_dependencies() {
        if let Err(err) = stage_template(store, ctx, sink).await? {
            let err = EngineError::from(err);
            report_failure(ctx, InvocationKind::Generation, &err, sink).await;
            return Ok(Invocation::Failed(err));
        }
    }

    debug!(
        stack = %ctx.stack_name(),
        ignore_dependencies = ctx.ignore_dependencies(),
        "Generating template"
    );
    let outcome = Invocation::capture(engine.generate(ctx).await);
    match &outcome {
        Invocation::Succeeded(output) => {
            info!(stack = %ctx.stack_name(), targets = output.len(), "Template generated");
            sink.emit(
                types::PLAN_GENERATED,
                Some(json!({
                    "stack": ctx.stack_name(),
                    "targets": output.len(),
                })),
            )
            .await;
        }
        Invocation::Failed(err) => report_failure(ctx, InvocationKind::Generation, err, sink).await,
    }
    Ok(outcome)
}

// The outer result carries fixture errors; the inner one a rejected upload.
async fn stage_template(
    store: &dyn ObjectStore,
    ctx: &ProjectContext,
    sink: &dyn EventSink,
) -> Result<std::result::Result<(), TransportError>> {
    let document = StackConfig::load(ctx.config_file())?;
    let Some(TemplateHandler::S3 { path }) = document.handler()? else {
        return Ok(Ok(()));
    };

    let source = ctx.full_templates_path().join(path.file_name());
    debug!(
        stack = %ctx.stack_name(),
        source = %source.display(),
        destination = %path,
        "Uploading template"
    );
    let uploaded = store.upload_file(&source, path.bucket(), path.key()).await;
    if uploaded.is_ok() {
        emit_uploaded(ctx, &path, sink).await;
    }
    Ok(uploaded)
}

async fn emit_uploaded(ctx: &ProjectContext, path: &BucketPath, sink: &dyn EventSink) {
    sink.emit(
        types::TEMPLATE_UPLOADED,
        Some(json!({
            "stack": ctx.stack_name(),
            "bucket": path.bucket(),
            "key": path.key(),
        })),
    )
    .await;
}

async fn report_failure(
    ctx: &ProjectContext,
    kind: InvocationKind,
    err: &EngineError,
    sink: &dyn EventSink,
) {
    warn!(
        stack = %ctx.stack_name(),
        operation = kind.as_str(),
        error = %err,
        "Engine call failed; captured for assertion"
    );
    sink.emit(
        types::PLAN_FAILED,
        Some(json!({
            "stack": ctx.stack_name(),
            "operation": kind.as_str(),
            "error": err.to_string(),
        })),
    )
    .await;
}
