//! Types shared by every managed resource
//!
//! Tags, deletion policy and status conditions follow the same layout on all
//! kinds so the generic reconciliation engine can work with any of them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reporting whether the last reconciliation succeeded
pub const CONDITION_TYPE_SYNCED: &str = "Synced";
/// Condition type reporting the AWS-side availability of the resource
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition status values
pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";

/// Resource tag, carried as a key/value pair regardless of the service wire format
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What happens to the AWS resource when its record is deleted
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Delete the AWS resource
    #[default]
    Delete,
    /// Leave the AWS resource in place and only forget about it
    Orphan,
}

/// Reason attached to a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionReason {
    Available,
    Creating,
    Deleting,
    Unavailable,
    ReconcileSuccess,
    ReconcileError,
}

impl ConditionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionReason::Available => "Available",
            ConditionReason::Creating => "Creating",
            ConditionReason::Deleting => "Deleting",
            ConditionReason::Unavailable => "Unavailable",
            ConditionReason::ReconcileSuccess => "ReconcileSuccess",
            ConditionReason::ReconcileError => "ReconcileError",
        }
    }
}

/// Status condition following Kubernetes API conventions
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (`Synced` or `Ready`)
    #[serde(rename = "type")]
    pub type_: String,

    /// `True` or `False`
    pub status: String,

    /// Machine-readable reason for the condition's last transition
    pub reason: ConditionReason,

    /// Human-readable message, set on errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the status changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    fn new(type_: &str, status: &str, reason: ConditionReason, message: Option<String>) -> Self {
        Self {
            type_: type_.to_string(),
            status: status.to_string(),
            reason,
            message,
            last_transition_time: Some(Utc::now()),
        }
    }

    /// Ready=True: the AWS resource is available for use
    pub fn available() -> Self {
        Self::new(CONDITION_TYPE_READY, CONDITION_STATUS_TRUE, ConditionReason::Available, None)
    }

    /// Ready=False: the AWS resource is being created
    pub fn creating() -> Self {
        Self::new(CONDITION_TYPE_READY, CONDITION_STATUS_FALSE, ConditionReason::Creating, None)
    }

    /// Ready=False: the AWS resource is being deleted
    pub fn deleting() -> Self {
        Self::new(CONDITION_TYPE_READY, CONDITION_STATUS_FALSE, ConditionReason::Deleting, None)
    }

    /// Ready=False: the AWS resource exists but cannot be used
    pub fn unavailable() -> Self {
        Self::new(CONDITION_TYPE_READY, CONDITION_STATUS_FALSE, ConditionReason::Unavailable, None)
    }

    /// Synced=True: the last reconciliation succeeded
    pub fn reconcile_success() -> Self {
        Self::new(CONDITION_TYPE_SYNCED, CONDITION_STATUS_TRUE, ConditionReason::ReconcileSuccess, None)
    }

    /// Synced=False with the error that stopped the last reconciliation
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            CONDITION_TYPE_SYNCED,
            CONDITION_STATUS_FALSE,
            ConditionReason::ReconcileError,
            Some(message.into()),
        )
    }

    /// Two conditions are equivalent when everything but the transition time matches
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Update or add a condition in a condition list
///
/// The transition time of an existing condition is only moved forward when
/// its status actually changes.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) if existing.equivalent(&condition) => {}
        Some(existing) => {
            let keep_time = existing.status == condition.status;
            let previous = existing.last_transition_time;
            *existing = condition;
            if keep_time {
                existing.last_transition_time = previous;
            }
        }
        None => conditions.push(condition),
    }
}

/// Find a condition by type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_condition_adds_new() {
        let mut conditions = Vec::new();
        set_condition(&mut conditions, Condition::creating());
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].reason, ConditionReason::Creating);
    }

    #[test]
    fn test_set_condition_replaces_same_type() {
        let mut conditions = vec![Condition::creating()];
        set_condition(&mut conditions, Condition::available());
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, CONDITION_STATUS_TRUE);
        assert_eq!(conditions[0].reason, ConditionReason::Available);
    }

    #[test]
    fn test_set_condition_keeps_transition_time_when_status_unchanged() {
        let mut first = Condition::creating();
        let earlier = DateTime::<Utc>::from_timestamp(0, 0);
        first.last_transition_time = earlier;
        let mut conditions = vec![first];

        // Creating -> Deleting keeps Ready=False, so the transition time stays
        set_condition(&mut conditions, Condition::deleting());
        assert_eq!(conditions[0].reason, ConditionReason::Deleting);
        assert_eq!(conditions[0].last_transition_time, earlier);
    }

    #[test]
    fn test_synced_and_ready_are_independent() {
        let mut conditions = Vec::new();
        set_condition(&mut conditions, Condition::available());
        set_condition(&mut conditions, Condition::reconcile_error("boom"));
        assert_eq!(conditions.len(), 2);
        let synced = find_condition(&conditions, CONDITION_TYPE_SYNCED).map(|c| c.status.as_str());
        assert_eq!(synced, Some(CONDITION_STATUS_FALSE));
    }
}
