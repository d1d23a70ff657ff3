//! Validation and generation invocation.
//!
//! The shim builds the engine call for a stack and turns whatever the
//! engine returns into an [`Invocation`]. Engine errors never propagate from
//! here; only fixture errors do.

mod outcome;
mod shim;

pub use outcome::Invocation;
pub use shim::{generate_stack, validate_stack};
