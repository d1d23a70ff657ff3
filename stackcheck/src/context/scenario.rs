//! Per-scenario state.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::{RenderedOutput, ValidationResponse};
use crate::errors::{EngineError, StepError};
use crate::invocation::Invocation;

/// Which engine operation was invoked last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// `validate()`
    Validation,
    /// `generate()`
    Generation,
}

impl InvocationKind {
    /// Returns a human readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Generation => "generation",
        }
    }
}

/// State carried from one step of a scenario to the next.
///
/// Created when a scenario starts and dropped when it ends. `when` steps
/// record engine outcomes here; `then` steps read them back.
#[derive(Debug, Clone)]
pub struct ScenarioState {
    id: Uuid,
    name: String,
    started_at: DateTime<Utc>,
    validation: Option<Invocation<ValidationResponse>>,
    generation: Option<Invocation<RenderedOutput>>,
    last: Option<InvocationKind>,
}

impl ScenarioState {
    /// Starts a new scenario.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            started_at: Utc::now(),
            validation: None,
            generation: None,
            last: None,
        }
    }

    /// Returns the scenario ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns when the scenario started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns milliseconds elapsed since the scenario started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Records the outcome of a validation.
    pub fn record_validation(&mut self, outcome: Invocation<ValidationResponse>) {
        self.validation = Some(outcome);
        self.last = Some(InvocationKind::Validation);
    }

    /// Records the outcome of a generation.
    pub fn record_generation(&mut self, outcome: Invocation<RenderedOutput>) {
        self.generation = Some(outcome);
        self.last = Some(InvocationKind::Generation);
    }

    /// Returns the last validation outcome.
    #[must_use]
    pub const fn validation(&self) -> Option<&Invocation<ValidationResponse>> {
        self.validation.as_ref()
    }

    /// Returns the last generation outcome.
    #[must_use]
    pub const fn generation(&self) -> Option<&Invocation<RenderedOutput>> {
        self.generation.as_ref()
    }

    /// Returns the kind of the most recent invocation.
    #[must_use]
    pub const fn last_invocation(&self) -> Option<InvocationKind> {
        self.last
    }

    /// Returns the error captured by the most recent invocation, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&EngineError> {
        match self.last? {
            InvocationKind::Validation => self.validation.as_ref()?.error(),
            InvocationKind::Generation => self.generation.as_ref()?.error(),
        }
    }

    /// Returns the rendered output of a successful generation.
    ///
    /// # Errors
    ///
    /// Fails if no generation ran or the generation failed.
    pub fn output(&self) -> Result<&RenderedOutput, StepError> {
        match &self.generation {
            None => Err(StepError::MissingInvocation("generation")),
            Some(Invocation::Failed(err)) => Err(StepError::InvocationFailed(err.clone())),
            Some(Invocation::Succeeded(output)) => Ok(output),
        }
    }

    /// Returns the response of a successful validation.
    ///
    /// # Errors
    ///
    /// Fails if no validation ran or the validation failed.
    pub fn response(&self) -> Result<&ValidationResponse, StepError> {
        match &self.validation {
            None => Err(StepError::MissingInvocation("validation")),
            Some(Invocation::Failed(err)) => Err(StepError::InvocationFailed(err.clone())),
            Some(Invocation::Succeeded(response)) => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;

    #[test]
    fn test_new_state_is_empty() {
        let state = ScenarioState::new("generate vpc");
        assert_eq!(state.name(), "generate vpc");
        assert!(state.last_invocation().is_none());
        assert!(state.last_error().is_none());
        assert!(matches!(
            state.output(),
            Err(StepError::MissingInvocation("generation"))
        ));
    }

    #[test]
    fn test_output_after_generation() {
        let mut state = ScenarioState::new("s");
        state.record_generation(Invocation::Succeeded(RenderedOutput::single("vpc", "body")));
        assert_eq!(state.output().unwrap().get("vpc"), Some("body"));
        assert_eq!(state.last_invocation(), Some(InvocationKind::Generation));
    }

    #[test]
    fn test_last_error_follows_latest_invocation() {
        let mut state = ScenarioState::new("s");
        let err = EngineError::from(TransportError::new("ValidateTemplate", "bad template"));
        state.record_validation(Invocation::Failed(err.clone()));
        assert_eq!(state.last_error(), Some(&err));

        state.record_generation(Invocation::Succeeded(RenderedOutput::new()));
        assert!(state.last_error().is_none());
        assert!(matches!(state.response(), Err(StepError::InvocationFailed(_))));
    }

    #[test]
    fn test_distinct_ids() {
        assert_ne!(ScenarioState::new("a").id(), ScenarioState::new("b").id());
    }
}
