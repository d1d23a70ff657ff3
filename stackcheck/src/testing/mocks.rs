//! In-process test doubles for the engine and object storage.

use async_trait::async_trait;
use dashmap::DashMap;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::{InvocationKind, ProjectContext};
use crate::core::{BucketPath, RenderedOutput, StackConfig, TemplateHandler, ValidationResponse};
use crate::engine::{ObjectStore, PlanEngine};
use crate::equivalence::{invoke, load_cfn_yaml, GeneratorRegistry, Params};
use crate::errors::{EngineError, TransportError};

const PUT_OBJECT: &str = "PutObject";
const GET_OBJECT: &str = "GetObject";
const VALIDATE_TEMPLATE: &str = "ValidateTemplate";
const USER_DATA_KEY: &str = "user_data";

/// An object held by [`InMemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object body.
    pub body: String,
    /// Hex MD5 of the body, as S3 reports for single-part uploads.
    pub etag: String,
}

impl StoredObject {
    fn new(body: String) -> Self {
        let etag = hex::encode(Md5::digest(body.as_bytes()));
        Self { body, etag }
    }
}

/// An object store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<BucketPath, StoredObject>,
    uploads: Mutex<Vec<(PathBuf, BucketPath)>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object directly.
    pub fn put(&self, bucket: &str, key: &str, body: impl Into<String>) {
        self.objects
            .insert(BucketPath::new(bucket, key), StoredObject::new(body.into()));
    }

    /// Returns an object body.
    #[must_use]
    pub fn get(&self, bucket: &str, key: &str) -> Option<String> {
        self.object(bucket, key).map(|o| o.body)
    }

    /// Returns a stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .get(&BucketPath::new(bucket, key))
            .map(|entry| entry.value().clone())
    }

    /// Returns true if the object exists.
    #[must_use]
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects.contains_key(&BucketPath::new(bucket, key))
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns every upload as `(source, destination)`, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<(PathBuf, BucketPath)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload_file(&self, local_path: &Path, bucket: &str, key: &str) -> Result<(), TransportError> {
        let body = tokio::fs::read_to_string(local_path).await.map_err(|e| {
            TransportError::new(PUT_OBJECT, format!("{}: {e}", local_path.display()))
        })?;
        let destination = BucketPath::new(bucket, key);
        self.uploads
            .lock()
            .push((local_path.to_path_buf(), destination.clone()));
        self.objects.insert(destination, StoredObject::new(body));
        Ok(())
    }
}

/// An object store that rejects every upload.
#[derive(Debug, Clone)]
pub struct FailingObjectStore {
    code: String,
    message: String,
}

impl FailingObjectStore {
    /// Creates a store rejecting uploads with the given service error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a store rejecting uploads with `AccessDenied`.
    #[must_use]
    pub fn access_denied() -> Self {
        Self::new("AccessDenied", "Access Denied")
    }
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload_file(&self, _local_path: &Path, _bucket: &str, _key: &str) -> Result<(), TransportError> {
        Err(TransportError::new(PUT_OBJECT, &self.message).with_code(&self.code))
    }
}

/// One call received by [`LocalPlanEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Which operation was called.
    pub kind: InvocationKind,
    /// The stack the context named.
    pub stack_name: String,
    /// The context's dependency flag.
    pub ignore_dependencies: bool,
}

/// A planning engine that renders templates from the project on disk.
///
/// Rendering follows the stack's document: `template_path` and file
/// handlers read a local file (relative paths resolve against the templates
/// directory); S3 handlers read from the attached object store. Files with
/// a registered generator are rendered by calling it with the document's
/// `user_data` mapping. The single rendered body is keyed by stack name.
#[derive(Debug, Default)]
pub struct LocalPlanEngine {
    store: Option<Arc<InMemoryObjectStore>>,
    generators: GeneratorRegistry,
    calls: Mutex<Vec<RecordedCall>>,
}

impl LocalPlanEngine {
    /// Creates an engine with no object store and no generators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the store S3 handlers read from.
    #[must_use]
    pub fn with_store(mut self, store: Arc<InMemoryObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the generators used for dynamic templates.
    #[must_use]
    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    /// Returns every call received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn record(&self, kind: InvocationKind, ctx: &ProjectContext) {
        self.calls.lock().push(RecordedCall {
            kind,
            stack_name: ctx.stack_name().to_string(),
            ignore_dependencies: ctx.ignore_dependencies(),
        });
    }

    fn render(&self, ctx: &ProjectContext) -> Result<String, EngineError> {
        let document = StackConfig::load(ctx.config_file()).map_err(generation_error)?;
        let params = user_data(&document)?;

        match document.handler().map_err(generation_error)? {
            Some(TemplateHandler::S3 { path }) => self.fetch(&path),
            Some(TemplateHandler::File { .. }) => {
                let raw = document
                    .template_handler_path()
                    .ok_or_else(|| EngineError::generation("template handler has no path"))?;
                self.render_file(&ctx.full_templates_path().join(raw), &params)
            }
            None => {
                let raw = document
                    .template_path()
                    .ok_or_else(|| EngineError::generation("stack has no template configured"))?;
                self.render_file(&ctx.full_templates_path().join(raw), &params)
            }
        }
    }

    // `join` keeps absolute paths as they are.
    fn render_file(&self, path: &Path, params: &Params) -> Result<String, EngineError> {
        if let Ok(generator) = self.generators.resolve(path) {
            return invoke(generator.as_ref(), path, params).map_err(generation_error);
        }
        std::fs::read_to_string(path)
            .map_err(|e| EngineError::generation(format!("{}: {e}", path.display())))
    }

    fn fetch(&self, path: &BucketPath) -> Result<String, EngineError> {
        self.store
            .as_ref()
            .and_then(|store| store.get(path.bucket(), path.key()))
            .ok_or_else(|| {
                TransportError::new(GET_OBJECT, format!("The specified key does not exist: {path}"))
                    .with_code("NoSuchKey")
                    .into()
            })
    }
}

fn generation_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::generation(err.to_string())
}

fn user_data(document: &StackConfig) -> Result<Params, EngineError> {
    match document.get(USER_DATA_KEY) {
        None => Ok(Params::new()),
        Some(value) => match serde_json::to_value(value).map_err(generation_error)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(EngineError::generation("user_data must be a mapping")),
        },
    }
}

fn describe_template(body: &str) -> Result<ValidationResponse, EngineError> {
    let template = load_cfn_yaml(body).map_err(|e| {
        TransportError::new(VALIDATE_TEMPLATE, format!("Template format error: {e}"))
            .with_code("ValidationError")
    })?;
    if !template.is_mapping() {
        return Err(TransportError::new(VALIDATE_TEMPLATE, "Template format error: not a mapping")
            .with_code("ValidationError")
            .into());
    }

    let mut response = ValidationResponse::new();
    if let Some(description) = template.get("Description").and_then(Value::as_str) {
        response = response.with_description(description);
    }
    if let Some(Value::Mapping(parameters)) = template.get("Parameters") {
        for name in parameters.keys().filter_map(Value::as_str) {
            response = response.with_parameter(name);
        }
    }
    let needs_iam = template
        .get("Resources")
        .and_then(Value::as_mapping)
        .is_some_and(|resources| {
            resources.values().any(|resource| {
                resource
                    .get("Type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.starts_with("AWS::IAM::"))
            })
        });
    if needs_iam {
        response = response.with_capability("CAPABILITY_IAM");
    }
    Ok(response)
}

#[async_trait]
impl PlanEngine for LocalPlanEngine {
    async fn validate(&self, ctx: &ProjectContext) -> Result<ValidationResponse, EngineError> {
        self.record(InvocationKind::Validation, ctx);
        describe_template(&self.render(ctx)?)
    }

    async fn generate(&self, ctx: &ProjectContext) -> Result<RenderedOutput, EngineError> {
        self.record(InvocationKind::Generation, ctx);
        let body = self.render(ctx)?;
        Ok(RenderedOutput::single(ctx.stack_name(), body))
    }
}

/// An engine whose every call fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingPlanEngine {
    error: EngineError,
}

impl FailingPlanEngine {
    /// Creates an engine failing with `error`.
    #[must_use]
    pub fn new(error: impl Into<EngineError>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[async_trait]
impl PlanEngine for FailingPlanEngine {
    async fn validate(&self, _ctx: &ProjectContext) -> Result<ValidationResponse, EngineError> {
        Err(self.error.clone())
    }

    async fn generate(&self, _ctx: &ProjectContext) -> Result<RenderedOutput, EngineError> {
        Err(self.error.clone())
    }
}
