//! Sequential scenario execution.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{Harness, Step};
use crate::context::ScenarioState;
use crate::errors::StepError;

/// A step that did not pass.
#[derive(Debug)]
pub struct StepFailure {
    /// 1-based position of the step in the scenario.
    pub index: usize,
    /// The step line as written.
    pub line: String,
    /// Why it failed.
    pub error: StepError,
}

/// The result of running one scenario.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario ID.
    pub id: Uuid,
    /// Scenario name.
    pub name: String,
    /// When the scenario started.
    pub started_at: DateTime<Utc>,
    /// Steps that passed, in order.
    pub passed: Vec<Step>,
    /// The first failing step, if any.
    pub failure: Option<StepFailure>,
    /// Steps not run because an earlier one failed.
    pub skipped: usize,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: i64,
}

impl ScenarioReport {
    /// Returns true if every step passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Converts the report into a `Result`, yielding the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error.
    pub fn into_result(self) -> Result<(), StepError> {
        self.failure.map_or(Ok(()), |failure| Err(failure.error))
    }
}

/// Runs scenarios written as step lines.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    harness: Arc<Harness>,
}

impl ScenarioRunner {
    /// Creates a runner over a shared harness.
    #[must_use]
    pub const fn new(harness: Arc<Harness>) -> Self {
        Self { harness }
    }

    /// Returns the harness.
    #[must_use]
    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Runs one scenario.
    ///
    /// Blank lines and lines starting with `#` are ignored. Steps run in
    /// order and the scenario stops at the first failing step. A fresh
    /// [`ScenarioState`] is created for the run and dropped at the end.
    pub async fn run<S: AsRef<str>>(&self, name: &str, lines: &[S]) -> ScenarioReport {
        let mut state = ScenarioState::new(name);
        let span = info_span!("scenario", id = %state.id(), name = %name);
        self.run_in(&mut state, lines).instrument(span).await
    }

    async fn run_in<S: AsRef<str>>(&self, state: &mut ScenarioState, lines: &[S]) -> ScenarioReport {
        let steps: Vec<&str> = lines
            .iter()
            .map(|line| line.as_ref().trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        info!(steps = steps.len(), "Scenario started");
        let mut passed = Vec::with_capacity(steps.len());
        let mut failure = None;

        for (index, line) in steps.iter().enumerate() {
            let result = match Step::parse(line) {
                Ok(step) => self.execute(state, &step).await.map(|()| step),
                Err(err) => Err(err),
            };
            match result {
                Ok(step) => {
                    debug!(step = index + 1, "Step passed");
                    passed.push(step);
                }
                Err(error) => {
                    warn!(step = index + 1, line = %line, error = %error, "Step failed");
                    failure = Some(StepFailure {
                        index: index + 1,
                        line: (*line).to_string(),
                        error,
                    });
                    break;
                }
            }
        }

        let skipped = steps.len() - passed.len() - usize::from(failure.is_some());
        let duration_ms = state.elapsed_ms();
        info!(
            passed = passed.len(),
            failed = failure.is_some(),
            skipped,
            duration_ms,
            "Scenario finished"
        );

        ScenarioReport {
            id: state.id(),
            name: state.name().to_string(),
            started_at: state.started_at(),
            passed,
            failure,
            skipped,
            duration_ms,
        }
    }

    /// Runs a single parsed step against `state`.
    ///
    /// # Errors
    ///
    /// Returns the step's failure.
    pub async fn execute(&self, state: &mut ScenarioState, step: &Step) -> Result<(), StepError> {
        match step {
            Step::SetTemplate {
                stack_name,
                template_name,
            } => self.harness.set_template(stack_name, template_name).map(|_| ()),
            Step::Validate {
                stack_name,
                ignore_dependencies,
            } => {
                self.harness
                    .validate(state, stack_name, *ignore_dependencies)
                    .await
            }
            Step::Generate {
                stack_name,
                ignore_dependencies,
            } => {
                self.harness
                    .generate(state, stack_name, *ignore_dependencies)
                    .await
            }
            Step::OutputMatchesTemplate { file_name } => self
                .harness
                .assert_output_matches_template(state, file_name)
                .map(|_| ()),
            Step::OutputMatchesGenerator { file_name } => self
                .harness
                .assert_output_matches_generator(state, file_name)
                .map(|_| ()),
        }
    }
}
