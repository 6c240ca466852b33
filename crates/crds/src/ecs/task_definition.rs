//! TaskDefinition Custom Resource Definition
//!
//! One record tracks one task definition family. The external name is the ARN of
//! the revision currently in use; every update registers a new revision and
//! deregisters the previous one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::KeyValuePair;
use crate::common::{Condition, DeletionPolicy, Tag};

/// TaskDefinitionSpec defines the desired state of a task definition family
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ecs.aws.microscaler.io",
    version = "v1alpha1",
    kind = "TaskDefinition",
    namespaced,
    status = "TaskDefinitionStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionSpec {
    pub for_provider: TaskDefinitionParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// TaskDefinitionParameters are the configurable fields of a task definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionParameters {
    pub region: String,

    /// Family name shared by all revisions
    pub family: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_definitions: Vec<ContainerDefinition>,

    /// Task-level CPU units, e.g. `256`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    /// Task-level memory in MiB, e.g. `512`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,

    /// `bridge`, `host`, `awsvpc` or `none`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_compatibilities: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_platform: Option<RuntimePlatform>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,

    pub image: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i32>,

    /// Hard memory limit in MiB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i32>,

    /// Soft memory limit in MiB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub essential: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_point: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<KeyValuePair>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_mappings: Vec<PortMapping>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,
}

/// Secret injected into a container from Secrets Manager or SSM
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub name: String,

    /// ARN of the secret or parameter
    pub value_from: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_port: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// `tcp` or `udp`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfiguration {
    /// Log driver, e.g. `awslogs`
    pub log_driver: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimePlatform {
    /// `X86_64` or `ARM64`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_architecture: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system_family: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,

    /// Bind mount source path on the host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_path: Option<String>,
}

/// TaskDefinitionObservation is the observed state of the current revision
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default)]
    pub revision: i32,

    /// `ACTIVE`, `INACTIVE` or `DELETE_IN_PROGRESS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compatibilities: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<TaskDefinitionObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(TaskDefinition, TaskDefinitionParameters, TaskDefinitionObservation);
