//! Captured engine outcomes.

use crate::errors::EngineError;

/// The captured result of calling the engine.
///
/// Engine failures are values here rather than propagated errors, so a
/// scenario can assert on expected failures as easily as on successes.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation<T> {
    /// The engine call returned a value.
    Succeeded(T),
    /// The engine call was rejected or failed.
    Failed(EngineError),
}

impl<T> Invocation<T> {
    /// Captures a result.
    #[must_use]
    pub fn capture(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(value) => Self::Succeeded(value),
            Err(err) => Self::Failed(err),
        }
    }

    /// Returns true if the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns true if the call failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns the success value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    /// Returns the captured error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&EngineError> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(err) => Some(err),
        }
    }

    /// Converts the outcome back into a `Result`.
    pub fn into_result(self) -> Result<T, EngineError> {
        match self {
            Self::Succeeded(value) => Ok(value),
            Self::Failed(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, EngineError>> for Invocation<T> {
    fn from(result: Result<T, EngineError>) -> Self {
        Self::capture(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;

    #[test]
    fn test_capture_success() {
        let outcome = Invocation::capture(Ok::<_, EngineError>(42));
        assert!(outcome.is_success());
        assert_eq!(outcome.value(), Some(&42));
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_capture_failure() {
        let err = EngineError::from(TransportError::new("ValidateTemplate", "denied"));
        let outcome: Invocation<u32> = Err(err.clone()).into();
        assert!(outcome.is_failure());
        assert_eq!(outcome.error(), Some(&err));
        assert_eq!(outcome.into_result(), Err(err));
    }
}
