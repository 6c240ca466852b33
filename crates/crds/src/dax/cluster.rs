//! Cluster Custom Resource Definition
//!
//! A DAX cluster. The record name is the cluster name.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};
use crate::references::{Reference, Selector};

/// ClusterSpec defines the desired state of a DAX cluster
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dax.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Cluster",
    namespaced,
    status = "ClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub for_provider: ClusterParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// ClusterParameters are the configurable fields of a DAX cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterParameters {
    pub region: String,

    /// Node type, e.g. `dax.r5.large` (immutable)
    pub node_type: String,

    /// Number of nodes in the cluster
    pub replication_factor: i32,

    /// Role DAX assumes to reach DynamoDB (immutable)
    pub iam_role_arn: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,

    /// `NONE` or `TLS` (immutable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_endpoint_encryption_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_topic_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_group_name: Option<String>,

    /// Reference to a ParameterGroup record to fill `parameterGroupName`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_group_name_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_group_name_selector: Option<Selector>,

    /// Weekly maintenance window, e.g. `sun:05:00-sun:06:00`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_maintenance_window: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    /// Server-side encryption (immutable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sse_specification: Option<SseSpecification>,

    /// Subnet group of the cluster (immutable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_group_name: Option<String>,

    /// Reference to a SubnetGroup record to fill `subnetGroupName`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_group_name_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_group_name_selector: Option<Selector>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SseSpecification {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default)]
    pub port: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_status: Option<String>,
}

/// ClusterObservation is the observed state of a DAX cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_discovery_endpoint: Option<Endpoint>,

    #[serde(default)]
    pub active_nodes: i32,

    #[serde(default)]
    pub total_nodes: i32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeObservation>,

    /// `creating`, `available`, `modifying` or `deleting`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ClusterObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Cluster, ClusterParameters, ClusterObservation);
