//! SubnetGroup Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};

/// SubnetGroupSpec defines the desired state of a DAX subnet group
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dax.aws.microscaler.io",
    version = "v1alpha1",
    kind = "SubnetGroup",
    namespaced,
    status = "SubnetGroupStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetGroupSpec {
    pub for_provider: SubnetGroupParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// SubnetGroupParameters are the configurable fields of a subnet group
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetGroupParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_identifier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_availability_zone: Option<String>,
}

/// SubnetGroupObservation is the observed state of a subnet group
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetGroupObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_group_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetObservation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetGroupStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<SubnetGroupObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(SubnetGroup, SubnetGroupParameters, SubnetGroupObservation);
