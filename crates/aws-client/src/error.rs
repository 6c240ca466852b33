//! AWS client errors

use thiserror::Error;

/// Error codes AWS uses for throttled requests
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
];

/// Errors that can occur when calling AWS
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AwsError {
    /// The service rejected the request with an error code
    #[error("{code}: {message}")]
    Service {
        /// AWS error code, e.g. `NotFoundException`
        code: String,
        /// Human-readable message returned by the service
        message: String,
    },

    /// The request never produced a service response (dispatch, timeout, credentials)
    #[error("AWS transport error: {0}")]
    Transport(String),

    /// The request could not be built from the given input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The service answered with a response missing a required field
    #[error("Unexpected AWS response: {0}")]
    UnexpectedResponse(String),
}

impl AwsError {
    /// Create a service error
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// AWS error code, if the service answered
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Service error message, if the service answered
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Service { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Returns true if the service answered with the given error code
    pub fn is_code(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    /// Returns true for `code` errors whose message starts with `prefix`
    ///
    /// Some services reuse `ValidationException` for missing resources and only
    /// the message tells them apart.
    pub fn is_code_with_message(&self, code: &str, prefix: &str) -> bool {
        self.is_code(code) && self.message().is_some_and(|m| m.starts_with(prefix))
    }

    /// Returns true if the request was throttled
    pub fn is_throttling(&self) -> bool {
        self.code().is_some_and(|code| THROTTLING_CODES.contains(&code))
    }

    /// Returns true for errors worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_)) || self.is_throttling()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_code() {
        let err = AwsError::service("NotFoundException", "Invalid API identifier specified");
        assert!(err.is_code("NotFoundException"));
        assert!(!err.is_code("ConflictException"));
        assert!(!AwsError::Transport("timeout".into()).is_code("NotFoundException"));
    }

    #[test]
    fn test_is_code_with_message() {
        let err = AwsError::service("ValidationException", "Could not find model \"arn:aws:sagemaker:...\"");
        assert!(err.is_code_with_message("ValidationException", "Could not find model"));
        assert!(!err.is_code_with_message("ValidationException", "Could not find endpoint"));
    }

    #[test]
    fn test_transient() {
        assert!(AwsError::service("ThrottlingException", "Rate exceeded").is_transient());
        assert!(AwsError::Transport("dispatch failure".into()).is_transient());
        assert!(!AwsError::service("BadRequestException", "bad").is_transient());
    }

    #[test]
    fn test_display() {
        let err = AwsError::service("NotFoundException", "missing");
        assert_eq!(err.to_string(), "NotFoundException: missing");
    }
}
