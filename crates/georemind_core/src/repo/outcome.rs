//! Success/error outcome returned by repository reads.

/// Tagged result of a repository read.
///
/// `Error` carries a human-readable message and covers both expected misses
/// ("not found") and store faults on reads. Callers must branch on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Error(String),
}

impl<T> Outcome<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the success value, discarding any error message.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// Returns the error message when this outcome failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Error(message) => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Error(message) => Outcome::Error(message),
        }
    }

    /// Converts into a `Result` with the message as error value.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(message) => Err(message),
        }
    }
}
