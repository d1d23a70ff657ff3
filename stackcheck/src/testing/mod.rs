//! Testing utilities for stackcheck scenarios.
//!
//! This module provides:
//! - Temporary project fixtures
//! - In-process planning engines and object stores
//! - Assertions for captured invocations and events

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_events, assert_invocation_error_contains, assert_invocation_failed,
    assert_invocation_succeeded,
};
pub use fixtures::ProjectFixture;
pub use mocks::{
    FailingObjectStore, FailingPlanEngine, InMemoryObjectStore, LocalPlanEngine, RecordedCall,
    StoredObject,
};
