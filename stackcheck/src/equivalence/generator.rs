//! Dynamic template generators.
//!
//! A generator stands in for a template file whose body is produced by code.
//! Generators are registered against the file name that appears in the
//! project's templates directory, and are called with a parameter mapping.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::errors::GeneratorError;

/// Parameters passed to a generator.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Error type a generator may return.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// A pure function from parameters to a template body.
pub trait TemplateGenerator: Send + Sync + Debug {
    /// Renders the template body.
    fn render(&self, params: &Params) -> Result<String, RenderError>;
}

/// A closure-based generator.
pub struct FnGenerator<F>
where
    F: Fn(&Params) -> Result<String, RenderError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnGenerator<F>
where
    F: Fn(&Params) -> Result<String, RenderError> + Send + Sync,
{
    /// Creates a new closure-based generator.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnGenerator<F>
where
    F: Fn(&Params) -> Result<String, RenderError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnGenerator").field("name", &self.name).finish()
    }
}

impl<F> TemplateGenerator for FnGenerator<F>
where
    F: Fn(&Params) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, params: &Params) -> Result<String, RenderError> {
        (self.func)(params)
    }
}

/// A generator that always returns the same body.
#[derive(Debug, Clone)]
pub struct ConstantGenerator {
    body: String,
}

impl ConstantGenerator {
    /// Creates a generator returning `body`.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl TemplateGenerator for ConstantGenerator {
    fn render(&self, _params: &Params) -> Result<String, RenderError> {
        Ok(self.body.clone())
    }
}

/// Generators keyed by template file name.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn TemplateGenerator>>,
}

impl GeneratorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a generator for a template file name.
    pub fn register(&mut self, file_name: impl Into<String>, generator: Arc<dyn TemplateGenerator>) {
        self.generators.insert(file_name.into(), generator);
    }

    /// Registers a generator, builder style.
    #[must_use]
    pub fn with(mut self, file_name: impl Into<String>, generator: impl TemplateGenerator + 'static) -> Self {
        self.register(file_name, Arc::new(generator));
        self
    }

    /// Returns true if a generator is registered for `file_name`.
    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.generators.contains_key(file_name)
    }

    /// Returns the number of registered generators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Finds the generator bound to a template file.
    ///
    /// # Errors
    ///
    /// Returns `MissingEntryPoint` if no generator is registered under the
    /// file's name.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn TemplateGenerator>, GeneratorError> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| self.generators.get(name))
            .cloned()
            .ok_or_else(|| GeneratorError::MissingEntryPoint {
                path: path.to_path_buf(),
            })
    }
}

/// Calls a generator, attributing any failure to `path`.
pub fn invoke(
    generator: &dyn TemplateGenerator,
    path: &Path,
    params: &Params,
) -> Result<String, GeneratorError> {
    generator
        .render(params)
        .map_err(|e| GeneratorError::failed(path, e.to_string()))
}
