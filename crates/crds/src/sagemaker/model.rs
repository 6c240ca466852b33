//! Model Custom Resource Definition
//!
//! A SageMaker model. Models cannot be updated in place; every field is fixed
//! once the model exists.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};

/// ModelSpec defines the desired state of a SageMaker model
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "sagemaker.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Model",
    namespaced,
    status = "ModelStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub for_provider: ModelParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// ModelParameters are the configurable fields of a model
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameters {
    pub region: String,

    /// Role SageMaker assumes to pull model artifacts and images
    pub execution_role_arn: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_container: Option<ModelContainer>,

    /// Containers of an inference pipeline
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ModelContainer>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_network_isolation: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_config: Option<VpcConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModelContainer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_hostname: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Inference image in ECR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// `SingleModel` or `MultiModel`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// S3 location of the model artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_data_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VpcConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<String>,
}

/// ModelObservation is the observed state of a model
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ModelObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Model, ModelParameters, ModelObservation);
