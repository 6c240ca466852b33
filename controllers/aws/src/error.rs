//! Controller-specific error types.
//!
//! Lifecycle failures carry a fixed sentence naming the stage and kind
//! (`cannot describe Api`, `cannot create Cluster`, ...) so operators can tell
//! where in the reconciliation the failure happened from the `Synced` message.

use aws_client::AwsError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the AWS controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// AWS error outside of a lifecycle call (connecting, tag sync)
    #[error("AWS error: {0}")]
    Aws(#[from] AwsError),

    /// AWS call failed during a lifecycle stage
    #[error("{context}: {source}")]
    Lifecycle {
        /// Fixed sentence, e.g. `cannot describe Api`
        context: String,
        #[source]
        source: AwsError,
    },

    /// A reference site could not be resolved
    #[error("cannot resolve references: {0}")]
    Reference(String),

    /// Desired state cannot be reconciled without user action
    #[error("{0}")]
    Permanent(String),

    /// Desired state is not yet complete (missing parent identifier, unset field)
    #[error("{0}")]
    Precondition(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON conversion failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

/// Lifecycle stages named in wrapped errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Describe,
    Create,
    Update,
    Delete,
}

impl Stage {
    fn verb(self) -> &'static str {
        match self {
            Stage::Describe => "describe",
            Stage::Create => "create",
            Stage::Update => "update",
            Stage::Delete => "delete",
        }
    }
}

impl ControllerError {
    /// Wrap an AWS error with the stage and kind it occurred in
    pub fn lifecycle(stage: Stage, kind: &str, source: AwsError) -> Self {
        ControllerError::Lifecycle {
            context: format!("cannot {} {}", stage.verb(), kind),
            source,
        }
    }

    /// Wrap an AWS error, keeping transient failures unwrapped
    ///
    /// Throttling and transport failures are requeued by the runtime as-is.
    pub fn from_aws(stage: Stage, kind: &str, source: AwsError) -> Self {
        if source.is_transient() {
            ControllerError::Aws(source)
        } else {
            Self::lifecycle(stage, kind, source)
        }
    }

    /// Returns true if retrying cannot help until the record changes
    pub fn is_permanent(&self) -> bool {
        matches!(self, ControllerError::Permanent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_message_names_stage_and_kind() {
        let err = ControllerError::lifecycle(
            Stage::Describe,
            "Api",
            AwsError::service("BadRequestException", "bad"),
        );
        assert_eq!(err.to_string(), "cannot describe Api: BadRequestException: bad");
    }

    #[test]
    fn test_transient_errors_are_not_wrapped() {
        let err = ControllerError::from_aws(
            Stage::Create,
            "Cluster",
            AwsError::service("ThrottlingException", "slow down"),
        );
        assert!(matches!(err, ControllerError::Aws(_)));

        let err = ControllerError::from_aws(
            Stage::Create,
            "Cluster",
            AwsError::service("InvalidParameterException", "nope"),
        );
        assert!(err.to_string().starts_with("cannot create Cluster"));
    }
}
