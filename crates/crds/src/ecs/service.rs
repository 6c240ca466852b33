//! Service Custom Resource Definition
//!
//! An ECS service. The record name is the service name; the cluster and task
//! definition are usually filled from references to other records.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};
use crate::references::{Reference, Selector};

/// ServiceSpec defines the desired state of an ECS service
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ecs.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Service",
    namespaced,
    status = "ServiceStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub for_provider: ServiceParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// ServiceParameters are the configurable fields of an ECS service
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceParameters {
    pub region: String,

    /// Cluster ARN or name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    /// Reference to a Cluster record to fill `cluster`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_selector: Option<Selector>,

    /// Task definition ARN or `family:revision`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition: Option<String>,

    /// Reference to a TaskDefinition record to fill `taskDefinition`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition_selector: Option<Selector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_configuration: Option<DeploymentConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ecs_managed_tags: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_execute_command: Option<bool>,

    /// Start a new deployment on the next update even without changes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_new_deployment: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_grace_period_seconds: Option<i32>,

    /// `EC2`, `FARGATE` or `EXTERNAL` (immutable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub load_balancers: Vec<LoadBalancer>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<NetworkConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,

    /// `TASK_DEFINITION`, `SERVICE` or `NONE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagate_tags: Option<String>,

    /// `REPLICA` or `DAEMON` (immutable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_strategy: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_circuit_breaker: Option<DeploymentCircuitBreaker>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_percent: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_healthy_percent: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentCircuitBreaker {
    pub enable: bool,
    pub rollback: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_port: Option<i32>,

    /// Classic load balancer name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_group_arn: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awsvpc_configuration: Option<AwsVpcConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsVpcConfiguration {
    /// `ENABLED` or `DISABLED`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_public_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<String>,
}

/// ServiceObservation is the observed state of an ECS service
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_arn: Option<String>,

    /// `ACTIVE`, `DRAINING` or `INACTIVE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Task definition currently in use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition: Option<String>,

    #[serde(default)]
    pub running_count: i32,

    #[serde(default)]
    pub pending_count: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ServiceObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Service, ServiceParameters, ServiceObservation);
