//! Api Custom Resource Definition
//!
//! An HTTP or WebSocket API. AWS assigns the API ID on create; it becomes the
//! external name of the record.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};

/// ApiSpec defines the desired state of an API Gateway v2 API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Api",
    namespaced,
    status = "ApiStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    pub for_provider: ApiParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// ApiParameters are the configurable fields of an API
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiParameters {
    /// AWS region of the API
    pub region: String,

    /// Name of the API
    pub name: String,

    /// API protocol, `HTTP` or `WEBSOCKET` (immutable)
    pub protocol_type: String,

    /// API key selection expression (WebSocket APIs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_selection_expression: Option<String>,

    /// CORS configuration (HTTP APIs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_configuration: Option<Cors>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Disable the default `execute-api` endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_execute_api_endpoint: Option<bool>,

    /// Route selection expression, `$request.method $request.path` for HTTP APIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_selection_expression: Option<String>,

    /// Version identifier of the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Cross-origin resource sharing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_headers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_origins: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expose_headers: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i32>,
}

/// ApiObservation is the observed state of an API
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    /// Default endpoint of the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,

    /// Whether the API is managed by API Gateway (quick create)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_gateway_managed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,

    /// Warnings reported while importing the API definition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// ApiStatus defines the observed state of an API record
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ApiObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Api, ApiParameters, ApiObservation);
