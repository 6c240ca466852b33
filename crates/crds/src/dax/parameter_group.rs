//! ParameterGroup Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};

/// ParameterGroupSpec defines the desired state of a DAX parameter group
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dax.aws.microscaler.io",
    version = "v1alpha1",
    kind = "ParameterGroup",
    namespaced,
    status = "ParameterGroupStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ParameterGroupSpec {
    pub for_provider: ParameterGroupParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// ParameterGroupParameters are the configurable fields of a parameter group
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterGroupParameters {
    pub region: String,

    /// Description (immutable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameters to set, e.g. `query-ttl-millis`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_name_values: Vec<ParameterNameValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ParameterNameValue {
    pub parameter_name: String,

    #[serde(default)]
    pub parameter_value: String,
}

/// ParameterGroupObservation is the observed state of a parameter group
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterGroupObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_group_name: Option<String>,

    /// Every parameter of the group with its current value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterNameValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterGroupStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ParameterGroupObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(ParameterGroup, ParameterGroupParameters, ParameterGroupObservation);
