//! Deployment Custom Resource Definition
//!
//! A snapshot of an API's routes and integrations. Deployments have a status
//! (`PENDING`, `DEPLOYED`, `FAILED`) that drives the `Ready` condition.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// DeploymentSpec defines the desired state of an API deployment
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Deployment",
    namespaced,
    status = "DeploymentStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub for_provider: DeploymentParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// DeploymentParameters are the configurable fields of a deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stage to deploy to (create-only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,

    /// Reference to a Stage record to fill `stageName`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_name_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_name_selector: Option<Selector>,
}

/// DeploymentObservation is the observed state of a deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    /// Whether the deployment was created by a stage with auto deploy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_deployed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,

    /// `PENDING`, `DEPLOYED` or `FAILED`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_status_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<DeploymentObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Deployment, DeploymentParameters, DeploymentObservation);
