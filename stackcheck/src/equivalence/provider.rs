//! Expected-template providers and comparison results.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::cfn_yaml::{first_difference, load_cfn_yaml};
use super::generator::{invoke, GeneratorRegistry, Params, TemplateGenerator};
use crate::core::RenderedOutput;
use crate::errors::{FileKind, NotFoundError, ParseError, Result, StackcheckError};

/// A rendered body that did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// The rendering target.
    pub target: String,
    /// A description of the first difference.
    pub detail: String,
}

/// The result of comparing rendered output with an expected template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    expected: PathBuf,
    compared: usize,
    mismatches: Vec<Mismatch>,
}

impl Comparison {
    /// Returns true if every rendered body matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Returns the expected artifact.
    #[must_use]
    pub fn expected(&self) -> &Path {
        &self.expected
    }

    /// Returns how many bodies were compared.
    #[must_use]
    pub const fn compared(&self) -> usize {
        self.compared
    }

    /// Returns every mismatch, in target order.
    #[must_use]
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Returns the first mismatch, if any.
    #[must_use]
    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }
}

/// Where the expected template body comes from.
#[derive(Debug, Clone)]
pub enum TemplateProvider {
    /// A template file whose parsed structure is the expected template.
    Static {
        /// The template file.
        path: PathBuf,
    },
    /// A generator whose output is the exact expected body.
    Dynamic {
        /// The generator file in the templates directory.
        path: PathBuf,
        /// The generator bound to that file.
        generator: Arc<dyn TemplateGenerator>,
    },
}

impl TemplateProvider {
    /// Creates a static provider.
    #[must_use]
    pub fn static_file(path: impl Into<PathBuf>) -> Self {
        Self::Static { path: path.into() }
    }

    /// Creates a dynamic provider from the generator registered for `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the generator file does not exist, and
    /// `MissingEntryPoint` if no generator is registered for it.
    pub fn dynamic(path: impl Into<PathBuf>, registry: &GeneratorRegistry) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(NotFoundError::new(path, FileKind::Template).into());
        }
        let generator = registry.resolve(&path)?;
        Ok(Self::Dynamic { path, generator })
    }

    /// Returns the expected artifact's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Static { path } | Self::Dynamic { path, .. } => path,
        }
    }

    /// Compares every rendered body with the expected template.
    ///
    /// # Errors
    ///
    /// Fixture problems propagate: a missing expected file, a malformed
    /// static template, or a failing generator.
    pub fn compare(&self, rendered: &RenderedOutput) -> Result<Comparison> {
        let path = self.path();
        if !path.is_file() {
            return Err(NotFoundError::new(path, FileKind::Template).into());
        }
        if rendered.is_empty() {
            warn!(expected = %path.display(), "No rendered output to compare");
        }

        let mismatches = match self {
            Self::Static { path } => compare_static(path, rendered)?,
            Self::Dynamic { path, generator } => {
                let body = invoke(generator.as_ref(), path, &Params::new())?;
                compare_exact(&body, rendered)
            }
        };

        debug!(
            expected = %path.display(),
            compared = rendered.len(),
            mismatches = mismatches.len(),
            "Compared rendered output"
        );

        Ok(Comparison {
            expected: path.to_path_buf(),
            compared: rendered.len(),
            mismatches,
        })
    }

    /// Returns true if every rendered body matches.
    pub fn matches(&self, rendered: &RenderedOutput) -> Result<bool> {
        Ok(self.compare(rendered)?.is_match())
    }
}

fn compare_static(path: &Path, rendered: &RenderedOutput) -> Result<Vec<Mismatch>> {
    let content = StackcheckError::read_fixture(path, FileKind::Template)?;
    let expected = load_cfn_yaml(&content).map_err(|e| ParseError::from_yaml(path, &e))?;

    let mismatches = rendered
        .iter()
        .filter_map(|(target, body)| {
            let detail = match load_cfn_yaml(body) {
                Ok(actual) => first_difference(&expected, &actual)?.to_string(),
                Err(e) => format!("rendered body is not valid YAML: {e}"),
            };
            Some(Mismatch {
                target: target.to_string(),
                detail,
            })
        })
        .collect();
    Ok(mismatches)
}

fn compare_exact(expected: &str, rendered: &RenderedOutput) -> Vec<Mismatch> {
    rendered
        .iter()
        .filter(|(_, body)| *body != expected)
        .map(|(target, body)| Mismatch {
            target: target.to_string(),
            detail: describe_string_difference(expected, body),
        })
        .collect()
}

fn describe_string_difference(expected: &str, actual: &str) -> String {
    let offset = expected
        .char_indices()
        .zip(actual.chars())
        .find(|((_, e), a)| e != a)
        .map_or_else(|| expected.len().min(actual.len()), |((i, _), _)| i);
    format!(
        "bodies differ at byte {offset} (expected {} bytes, found {})",
        expected.len(),
        actual.len()
    )
}

/// Returns true if every rendered body is structurally equal to the static
/// template at `expected_file`.
///
/// # Errors
///
/// Returns `NotFound` if the template is missing and `Parse` if it is
/// malformed.
pub fn matches_static(expected_file: &Path, rendered: &RenderedOutput) -> Result<bool> {
    TemplateProvider::static_file(expected_file).matches(rendered)
}

/// Returns true if every rendered body is exactly the string produced by the
/// generator registered for `generator_path`, called with no parameters.
///
/// # Errors
///
/// Returns `NotFound` if the generator file is missing and `Generator` if no
/// generator is registered or it fails.
pub fn matches_dynamic(
    generator_path: &Path,
    registry: &GeneratorRegistry,
    rendered: &RenderedOutput,
) -> Result<bool> {
    TemplateProvider::dynamic(generator_path, registry)?.matches(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::{ConstantGenerator, FnGenerator};
    use crate::errors::GeneratorError;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_static_matches_across_styles() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "vpc.yaml", "Resources: {VPC: {Type: AWS::EC2::VPC}}\n");
        let rendered: RenderedOutput = [
            ("us-east-1", "Resources:\n  VPC:\n    Type: AWS::EC2::VPC\n"),
            ("eu-west-1", r#"{"Resources": {"VPC": {"Type": "AWS::EC2::VPC"}}}"#),
        ]
        .into_iter()
        .collect();

        assert!(matches_static(&path, &rendered).unwrap());
    }

    #[test]
    fn test_static_reports_each_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "vpc.yaml", "a: 1\n");
        let rendered: RenderedOutput = [("one", "a: 1"), ("two", "a: '1'"), ("three", "a: [")]
            .into_iter()
            .collect();

        let comparison = TemplateProvider::static_file(&path).compare(&rendered).unwrap();
        assert!(!comparison.is_match());
        assert_eq!(comparison.compared(), 3);
        let targets: Vec<_> = comparison.mismatches().iter().map(|m| m.target.as_str()).collect();
        assert_eq!(targets, vec!["three", "two"]);
        assert!(comparison.mismatches()[0].detail.contains("not valid YAML"));
    }

    #[test]
    fn test_static_intrinsic_forms() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "t.yaml", "Outputs:\n  Id:\n    Value: !Ref VPC\n");
        let rendered = RenderedOutput::single("t", "Outputs: {Id: {Value: {Ref: VPC}}}");
        assert!(matches_static(&path, &rendered).unwrap());
    }

    #[test]
    fn test_static_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = matches_static(&dir.path().join("nope.yaml"), &RenderedOutput::new()).unwrap_err();
        assert!(matches!(err, StackcheckError::NotFound(_)));
    }

    #[test]
    fn test_static_malformed_expected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.yaml", "Resources: [");
        let err = matches_static(&path, &RenderedOutput::single("t", "{}")).unwrap_err();
        assert!(matches!(err, StackcheckError::Parse(_)));
    }

    #[test]
    fn test_dynamic_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "gen.py", "");
        let registry = GeneratorRegistry::new().with("gen.py", ConstantGenerator::new("X"));

        assert!(matches_dynamic(&path, &registry, &RenderedOutput::single("t", "X")).unwrap());
        assert!(!matches_dynamic(&path, &registry, &RenderedOutput::single("t", "X ")).unwrap());
        assert!(!matches_dynamic(&path, &registry, &RenderedOutput::single("t", "x")).unwrap());
    }

    #[test]
    fn test_dynamic_difference_detail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "gen.py", "");
        let registry = GeneratorRegistry::new().with("gen.py", ConstantGenerator::new("abc"));

        let comparison = TemplateProvider::dynamic(&path, &registry)
            .unwrap()
            .compare(&RenderedOutput::single("t", "abd"))
            .unwrap();
        assert_eq!(
            comparison.first_mismatch().unwrap().detail,
            "bodies differ at byte 2 (expected 3 bytes, found 3)"
        );
    }

    #[test]
    fn test_dynamic_called_with_empty_params() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "gen.py", "");
        let registry = GeneratorRegistry::new().with(
            "gen.py",
            FnGenerator::new("gen", |params: &Params| Ok(format!("params={}", params.len()))),
        );
        assert!(matches_dynamic(&path, &registry, &RenderedOutput::single("t", "params=0")).unwrap());
    }

    #[test]
    fn test_dynamic_missing_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "gen.py", "");
        let err = matches_dynamic(&path, &GeneratorRegistry::new(), &RenderedOutput::new()).unwrap_err();
        assert!(matches!(
            err,
            StackcheckError::Generator(GeneratorError::MissingEntryPoint { .. })
        ));
    }

    #[test]
    fn test_dynamic_generator_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "gen.py", "");
        let registry = GeneratorRegistry::new().with(
            "gen.py",
            FnGenerator::new("gen", |_: &Params| Err("boom".into())),
        );
        let err = matches_dynamic(&path, &registry, &RenderedOutput::single("t", "x")).unwrap_err();
        assert!(matches!(
            err,
            StackcheckError::Generator(GeneratorError::Failed { .. })
        ));
    }

    #[test]
    fn test_dynamic_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = GeneratorRegistry::new().with("gen.py", ConstantGenerator::new("X"));
        let err = matches_dynamic(&dir.path().join("gen.py"), &registry, &RenderedOutput::new())
            .unwrap_err();
        assert!(matches!(err, StackcheckError::NotFound(_)));
    }

    #[test]
    fn test_dynamic_missing_unregistered_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.py");
        let err = TemplateProvider::dynamic(&path, &GeneratorRegistry::new()).unwrap_err();
        match err {
            StackcheckError::NotFound(not_found) => assert_eq!(not_found.path, path),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            matches_dynamic(&path, &GeneratorRegistry::new(), &RenderedOutput::new()),
            Err(StackcheckError::NotFound(_))
        ));
    }
}
