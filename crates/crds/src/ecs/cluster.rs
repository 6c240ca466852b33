//! Cluster Custom Resource Definition
//!
//! An ECS cluster. The record name is the cluster name. Deleted clusters linger
//! in `INACTIVE` state and are treated as absent.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::KeyValuePair;
use crate::common::{Condition, DeletionPolicy, Tag};

/// ClusterSpec defines the desired state of an ECS cluster
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ecs.aws.microscaler.io",
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

/// ClusterParameters are the configurable fields of an ECS cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterParameters {
    pub region: String,

    /// Capacity providers associated with the cluster, e.g. `FARGATE`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capacity_providers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_capacity_provider_strategy: Vec<CapacityProviderStrategyItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ClusterConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_connect_defaults: Option<ServiceConnectDefaults>,

    /// Cluster settings such as `containerInsights`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<KeyValuePair>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProviderStrategyItem {
    pub capacity_provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute_command_configuration: Option<ExecuteCommandConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteCommandConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,

    /// `NONE`, `DEFAULT` or `OVERRIDE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConnectDefaults {
    /// Cloud Map namespace name or ARN
    pub namespace: String,
}

/// ClusterObservation is the observed state of an ECS cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    /// `ACTIVE`, `PROVISIONING`, `DEPROVISIONING`, `FAILED` or `INACTIVE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default)]
    pub active_services_count: i32,

    #[serde(default)]
    pub pending_tasks_count: i32,

    #[serde(default)]
    pub running_tasks_count: i32,

    #[serde(default)]
    pub registered_container_instances_count: i32,
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
