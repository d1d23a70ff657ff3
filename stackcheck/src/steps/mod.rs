//! Scenario steps.
//!
//! Five operations make up the step vocabulary:
//!
//! - `the template for stack "S" is "T"`
//! - `the user validates the template for stack "S" [with ignore dependencies]`
//! - `the user generates the template for stack "S" [with ignore dependencies]`
//! - `the output is the same as the contents of "F" template`
//! - `the output is the same as the string returned by "F"`
//!
//! [`Harness`] implements them over explicit [`ScenarioState`](crate::context::ScenarioState);
//! [`Step`] parses the phrases and [`ScenarioRunner`] runs a scenario
//! line by line.

mod harness;
mod phrase;
mod runner;

pub use harness::Harness;
pub use phrase::Step;
pub use runner::{ScenarioReport, ScenarioRunner, StepFailure};
