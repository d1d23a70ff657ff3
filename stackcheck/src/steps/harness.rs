//! Scenario-level operations.

use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::HarnessConfig;
use crate::context::{ProjectContext, ScenarioState};
use crate::core::ValidationResponse;
use crate::engine::{ObjectStore, PlanEngine};
use crate::equivalence::{Comparison, GeneratorRegistry, TemplateProvider};
use crate::errors::{EngineError, StepError};
use crate::events::{types, EventSink, NoOpEventSink};
use crate::invocation::{generate_stack, validate_stack};
use crate::resolver::{ConfigPathResolver, ResolvedTemplate};

/// The collaborators every scenario step runs against.
///
/// A harness is shared across scenarios; each scenario carries its own
/// [`ScenarioState`].
pub struct Harness {
    resolver: ConfigPathResolver,
    engine: Arc<dyn PlanEngine>,
    store: Arc<dyn ObjectStore>,
    generators: GeneratorRegistry,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", self.config())
            .field("generators", &self.generators)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Creates a harness over an engine and an object store.
    #[must_use]
    pub fn new(
        config: HarnessConfig,
        engine: Arc<dyn PlanEngine>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            resolver: ConfigPathResolver::new(config),
            engine,
            store,
            generators: GeneratorRegistry::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the generators available to dynamic comparisons.
    #[must_use]
    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.resolver = self.resolver.with_event_sink(sink.clone());
        self.event_sink = sink;
        self
    }

    /// Returns the harness configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        self.resolver.config()
    }

    fn context(&self, stack_name: &str, ignore_dependencies: bool) -> ProjectContext {
        ProjectContext::for_stack(self.config(), stack_name)
            .with_ignore_dependencies(ignore_dependencies)
    }

    /// `the template for stack "S" is "T"`
    ///
    /// # Errors
    ///
    /// Fails if the stack's document is missing or malformed.
    pub fn set_template(
        &self,
        stack_name: &str,
        template_name: &str,
    ) -> Result<ResolvedTemplate, StepError> {
        Ok(self.resolver.resolve_and_rewrite(stack_name, template_name)?)
    }

    /// `the user validates the template for stack "S"`
    ///
    /// A rejected API call is recorded on `state` as a failed validation.
    ///
    /// # Errors
    ///
    /// Any other engine failure aborts the step.
    pub async fn validate(
        &self,
        state: &mut ScenarioState,
        stack_name: &str,
        ignore_dependencies: bool,
    ) -> Result<(), StepError> {
        let ctx = self.context(stack_name, ignore_dependencies);
        let outcome =
            validate_stack(self.engine.as_ref(), &ctx, self.event_sink.as_ref()).await?;
        state.record_validation(outcome);
        Ok(())
    }

    /// `the user generates the template for stack "S"`
    ///
    /// The engine outcome is recorded on `state`.
    ///
    /// # Errors
    ///
    /// Fails only on fixture errors reading the stack's document.
    pub async fn generate(
        &self,
        state: &mut ScenarioState,
        stack_name: &str,
        ignore_dependencies: bool,
    ) -> Result<(), StepError> {
        let ctx = self.context(stack_name, ignore_dependencies);
        let outcome = generate_stack(
            self.engine.as_ref(),
            self.store.as_ref(),
            &ctx,
            self.event_sink.as_ref(),
        )
        .await?;
        state.record_generation(outcome);
        Ok(())
    }

    /// `the output is the same as the contents of "F" template`
    ///
    /// # Errors
    ///
    /// Fails if no successful generation was captured, the template is
    /// missing or malformed, or any rendered body differs.
    pub fn assert_output_matches_template(
        &self,
        state: &ScenarioState,
        file_name: &str,
    ) -> Result<Comparison, StepError> {
        let provider = TemplateProvider::static_file(self.template_file(file_name));
        self.assert_output_matches(state, &provider)
    }

    /// `the output is the same as the string returned by "F"`
    ///
    /// # Errors
    ///
    /// Fails if no successful generation was captured, the generator file
    /// is missing, no generator is registered for it, it fails, or any
    /// rendered body differs.
    pub fn assert_output_matches_generator(
        &self,
        state: &ScenarioState,
        file_name: &str,
    ) -> Result<Comparison, StepError> {
        let provider = TemplateProvider::dynamic(self.template_file(file_name), &self.generators)?;
        self.assert_output_matches(state, &provider)
    }

    /// Asserts that the last validation succeeded.
    ///
    /// # Errors
    ///
    /// Fails if no validation ran or it failed.
    pub fn assert_validation_succeeded<'s>(
        &self,
        state: &'s ScenarioState,
    ) -> Result<&'s ValidationResponse, StepError> {
        state.response()
    }

    /// Asserts that the most recent invocation failed, optionally with a
    /// message containing `fragment`.
    ///
    /// # Errors
    ///
    /// Fails if nothing was invoked, the invocation succeeded, or the
    /// message does not contain `fragment`.
    pub fn assert_last_invocation_failed<'s>(
        &self,
        state: &'s ScenarioState,
        fragment: Option<&str>,
    ) -> Result<&'s EngineError, StepError> {
        let kind = state
            .last_invocation()
            .ok_or(StepError::MissingInvocation("invocation"))?;
        let err = state
            .last_error()
            .ok_or(StepError::UnexpectedSuccess(kind.as_str()))?;

        if let Some(fragment) = fragment {
            let message = err.to_string();
            if !message.contains(fragment) {
                return Err(StepError::ErrorMismatch {
                    expected: fragment.to_string(),
                    actual: message,
                });
            }
        }
        Ok(err)
    }

    fn template_file(&self, file_name: &str) -> PathBuf {
        self.config().templates_path().join(file_name)
    }

    fn assert_output_matches(
        &self,
        state: &ScenarioState,
        provider: &TemplateProvider,
    ) -> Result<Comparison, StepError> {
        let output = state.output()?;
        let comparison = provider.compare(output)?;
        self.report_comparison(&comparison, provider.path());

        if let Some(mismatch) = comparison.first_mismatch() {
            return Err(StepError::OutputMismatch {
                target: mismatch.target.clone(),
                expected: comparison.expected().to_path_buf(),
                detail: mismatch.detail.clone(),
            });
        }
        Ok(comparison)
    }

    fn report_comparison(&self, comparison: &Comparison, expected: &Path) {
        if comparison.is_match() {
            info!(
                expected = %expected.display(),
                compared = comparison.compared(),
                "Output matches"
            );
        } else {
            debug!(
                expected = %expected.display(),
                mismatches = comparison.mismatches().len(),
                "Output differs"
            );
        }
        self.event_sink.try_emit(
            types::OUTPUT_COMPARED,
            Some(json!({
                "expected": expected.display().to_string(),
                "compared": comparison.compared(),
                "matched": comparison.is_match(),
            })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equivalence::ConstantGenerator;
    use crate::errors::{EngineError, StackcheckError, TransportError};
    use crate::events::CollectingEventSink;
    use crate::testing::{FailingPlanEngine, InMemoryObjectStore, LocalPlanEngine, ProjectFixture};

    const VPC: &str = "Resources:\n  VPC:\n    Type: AWS::EC2::VPC\n";

    fn harness(fixture: &ProjectFixture) -> Harness {
        let store = Arc::new(InMemoryObjectStore::new());
        let engine = LocalPlanEngine::new().with_store(store.clone());
        Harness::new(fixture.config().clone(), Arc::new(engine), store)
    }

    #[tokio::test]
    async fn test_generate_then_match() {
        let fixture = ProjectFixture::new().unwrap();
        fixture.write_template("vpc.yaml", VPC).unwrap();
        fixture.write_template("vpc-flow.yaml", "{Resources: {VPC: {Type: AWS::EC2::VPC}}}").unwrap();
        fixture.write_config("vpc", "template_path: placeholder.yaml\n").unwrap();
        let harness = harness(&fixture);
        let mut state = ScenarioState::new("vpc");

        harness.set_template("vpc", "vpc.yaml").unwrap();
        harness.generate(&mut state, "vpc", false).await.unwrap();

        let comparison = harness.assert_output_matches_template(&state, "vpc-flow.yaml").unwrap();
        assert_eq!(comparison.compared(), 1);
    }

    #[tokio::test]
    async fn test_mismatch_reports_target() {
        let fixture = ProjectFixture::new().unwrap();
        fixture.write_template("vpc.yaml", VPC).unwrap();
        fixture.write_template("subnet.yaml", "Resources: {S: {Type: AWS::EC2::Subnet}}").unwrap();
        fixture.write_config("vpc", "template_path: vpc.yaml\n").unwrap();
        let harness = harness(&fixture);
        let mut state = ScenarioState::new("s");

        harness.generate(&mut state, "vpc", false).await.unwrap();
        let err = harness.assert_output_matches_template(&state, "subnet.yaml").unwrap_err();

        match err {
            StepError::OutputMismatch { target, detail, .. } => {
                assert_eq!(target, "vpc");
                assert!(detail.contains("Resources"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generator_assertion() {
        let fixture = ProjectFixture::new().unwrap();
        fixture.write_template("vpc.yaml", VPC).unwrap();
        fixture.write_template("vpc.py", "").unwrap();
        fixture.write_config("vpc", "template_path: vpc.yaml\n").unwrap();
        let harness = harness(&fixture)
            .with_generators(GeneratorRegistry::new().with("vpc.py", ConstantGenerator::new(VPC)));
        let mut state = ScenarioState::new("s");

        harness.generate(&mut state, "vpc", true).await.unwrap();
        harness.assert_output_matches_generator(&state, "vpc.py").unwrap();
    }

    #[tokio::test]
    async fn test_assert_before_generate() {
        let fixture = ProjectFixture::new().unwrap();
        fixture.write_template("vpc.yaml", VPC).unwrap();
        let harness = harness(&fixture);
        let state = ScenarioState::new("s");

        let err = harness.assert_output_matches_template(&state, "vpc.yaml").unwrap_err();
        assert!(matches!(err, StepError::MissingInvocation("generation")));
    }

    #[tokio::test]
    async fn test_validation_failure_is_captured() {
        let fixture = ProjectFixture::new().unwrap();
        let engine = FailingPlanEngine::new(
            TransportError::new("ValidateTemplate", "Template format error").with_code("ValidationError"),
        );
        let sink = Arc::new(CollectingEventSink::new());
        let harness = Harness::new(
            fixture.config().clone(),
            Arc::new(engine),
            Arc::new(InMemoryObjectStore::new()),
        )
        .with_event_sink(sink.clone());
        let mut state = ScenarioState::new("s");

        harness.validate(&mut state, "vpc", false).await.unwrap();

        assert!(harness.assert_validation_succeeded(&state).is_err());
        let err = harness
            .assert_last_invocation_failed(&state, Some("Template format error"))
            .unwrap();
        assert!(err.is_transport());
        assert!(matches!(
            harness.assert_last_invocation_failed(&state, Some("throttled")),
            Err(StepError::ErrorMismatch { .. })
        ));
        assert_eq!(sink.event_types(), vec![types::PLAN_FAILED]);
    }

    #[tokio::test]
    async fn test_validate_missing_template_aborts() {
        let fixture = ProjectFixture::new().unwrap();
        fixture.write_config("vpc", "template_path: missing.yaml\n").unwrap();
        let harness = harness(&fixture);
        let mut state = ScenarioState::new("s");

        let err = harness.validate(&mut state, "vpc", false).await.unwrap_err();

        assert!(matches!(
            err,
            StepError::Fixture(StackcheckError::Engine(EngineError::Generation(_)))
        ));
        assert!(state.validation().is_none());
    }

    #[tokio::test]
    async fn test_last_invocation_succeeded() {
        let fixture = ProjectFixture::new().unwrap();
        fixture.write_template("vpc.yaml", VPC).unwrap();
        fixture.write_config("vpc", "template_path: vpc.yaml\n").unwrap();
        let harness = harness(&fixture);
        let mut state = ScenarioState::new("s");

        assert!(matches!(
            harness.assert_last_invocation_failed(&state, None),
            Err(StepError::MissingInvocation(_))
        ));
        harness.validate(&mut state, "vpc", false).await.unwrap();
        assert!(matches!(
            harness.assert_last_invocation_failed(&state, None),
            Err(StepError::UnexpectedSuccess("validation"))
        ));
    }

    #[tokio::test]
    async fn test_missing_stack_config_aborts() {
        let fixture = ProjectFixture::new().unwrap();
        let harness = harness(&fixture);
        assert!(matches!(
            harness.set_template("ghost", "vpc.yaml"),
            Err(StepError::Fixture(StackcheckError::NotFound(_)))
        ));
    }
}
