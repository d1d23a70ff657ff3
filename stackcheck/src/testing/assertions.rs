//! Test assertions for captured invocations and events.

use std::fmt::Debug;

use crate::events::CollectingEventSink;
use crate::invocation::Invocation;

/// Asserts that the invocation succeeded.
pub fn assert_invocation_succeeded<T: Debug>(outcome: &Invocation<T>) {
    assert!(
        outcome.is_success(),
        "Expected success, got error: {:?}",
        outcome.error()
    );
}

/// Asserts that the invocation failed.
pub fn assert_invocation_failed<T: Debug>(outcome: &Invocation<T>) {
    assert!(
        outcome.is_failure(),
        "Expected failure, got value: {:?}",
        outcome.value()
    );
}

/// Asserts that the invocation failed with a message containing `fragment`.
pub fn assert_invocation_error_contains<T: Debug>(outcome: &Invocation<T>, fragment: &str) {
    assert_invocation_failed(outcome);
    let message = outcome.error().map(ToString::to_string).unwrap_or_default();
    assert!(
        message.contains(fragment),
        "Expected error containing '{fragment}', got '{message}'"
    );
}

/// Asserts that the sink collected exactly these event types, in order.
pub fn assert_events(sink: &CollectingEventSink, expected: &[&str]) {
    let actual = sink.event_types();
    assert_eq!(
        actual, expected,
        "Expected events {expected:?}, got {actual:?}"
    );
}
