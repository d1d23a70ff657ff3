//! Contexts for scenario execution.
//!
//! This module provides:
//! - The per-stack project context the engine is built from
//! - The per-scenario state that carries captured outcomes between steps

mod project;
mod scenario;

pub use project::ProjectContext;
pub use scenario::{InvocationKind, ScenarioState};
