//! Stage Custom Resource Definition
//!
//! A named stage of an API. The stage name is the external name; stages are
//! read back through GetStages and narrowed to the matching name.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};
use crate::references::{Reference, Selector};

/// StageSpec defines the desired state of an API stage
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Stage",
    namespaced,
    status = "StageStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    pub for_provider: StageParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// StageParameters are the configurable fields of a stage
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageParameters {
    pub region: String,

    /// API the stage belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    /// Reference to an Api record to fill `apiId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    /// Selector for an Api record to fill `apiId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_log_settings: Option<AccessLogSettings>,

    /// Deploy every change of the API to this stage automatically
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_deploy: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_route_settings: Option<RouteSettings>,

    /// Deployment the stage points at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Per-route settings keyed by route key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub route_settings: BTreeMap<String, RouteSettings>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_variables: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Access logging destination and format
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogSettings {
    /// ARN of the CloudWatch Logs log group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Logging and throttling settings of a route
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_trace_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_metrics_enabled: Option<bool>,

    /// `ERROR`, `INFO` or `OFF`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttling_burst_limit: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttling_rate_limit: Option<f64>,
}

/// StageObservation is the observed state of a stage
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_gateway_managed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deployment_status_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<StageObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Stage, StageParameters, StageObservation);
