//! Move service error types.

use derive_more::{Display, Error};
use tracing::error;

/// Broad category of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ServiceErrorKind {
    /// Transport failure or a response that could not be understood.
    #[strum(to_string = "service unreachable")]
    Unreachable,
    /// The service answered with a non-success status.
    #[strum(to_string = "move rejected")]
    Rejected,
}

/// Move service error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Move service error ({}): {} at {}:{}", kind, message, file, line)]
pub struct ServiceError {
    /// Failure category.
    pub kind: ServiceErrorKind,
    /// Error message, including the service's reason when one was given.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ServiceError {
    /// Creates a new service error with caller location tracking.
    #[track_caller]
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        let message = message.into();
        error!(kind = %kind, error_message = %message, "Move service error created");
        Self {
            kind,
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Transport or decoding failure.
    #[track_caller]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Unreachable, message)
    }

    /// Non-success answer from the service.
    #[track_caller]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Rejected, message)
    }
}
