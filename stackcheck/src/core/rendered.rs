//! Engine outputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rendered template bodies keyed by rendering target.
///
/// Targets are typically stack names, or one entry per region or account
/// when a stack renders to several destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedOutput {
    bodies: BTreeMap<String, String>,
}

impl RenderedOutput {
    /// Creates an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an output with a single target.
    #[must_use]
    pub fn single(target: impl Into<String>, body: impl Into<String>) -> Self {
        let mut output = Self::new();
        output.insert(target, body);
        output
    }

    /// Adds or replaces a target's body.
    pub fn insert(&mut self, target: impl Into<String>, body: impl Into<String>) {
        self.bodies.insert(target.into(), body.into());
    }

    /// Returns the body for a target.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<&str> {
        self.bodies.get(target).map(String::as_str)
    }

    /// Iterates over `(target, body)` pairs in target order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bodies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over the rendered bodies.
    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.bodies.values().map(String::as_str)
    }

    /// Returns the number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if nothing was rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RenderedOutput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bodies: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The engine's answer to a template validation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Template description, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared parameter names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,

    /// Capabilities the template requires.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,

    /// Additional response metadata.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ValidationResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a declared parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    /// Adds a required capability.
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }
}
