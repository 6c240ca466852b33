//! Integration Custom Resource Definition
//!
//! Response parameters of an integration are a map of maps on the wire
//! (`{"200": {"append:header.X-Foo": "bar"}}`). Nested maps are not expressible
//! in the record schema, so they are carried here as a list of header entries per
//! status code and rebuilt into the wire shape by the controller.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// IntegrationSpec defines the desired state of an API integration
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Integration",
    namespaced,
    status = "IntegrationStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSpec {
    pub for_provider: IntegrationParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// IntegrationParameters are the configurable fields of an integration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    /// `AWS`, `AWS_PROXY`, `HTTP`, `HTTP_PROXY` or `MOCK`
    pub integration_type: String,

    /// VPC link used for private integrations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    /// Reference to a VpcLink record to fill `connectionId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id_selector: Option<Selector>,

    /// `INTERNET` or `VPC_LINK`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_handling_strategy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_subtype: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub passthrough_behavior: Option<String>,

    /// `1.0` or `2.0`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_format_version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_parameters: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_templates: BTreeMap<String, String>,

    /// Response mappings keyed by status code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_parameters: BTreeMap<String, ResponseParameter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_selection_expression: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_in_millis: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_config: Option<TlsConfig>,
}

/// Response mapping for one status code
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseParameter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_entries: Vec<HeaderEntry>,

    /// Replace the status code returned to the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_status_code: Option<String>,
}

/// A header mapping applied to a response
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct HeaderEntry {
    /// `append`, `overwrite` or `remove`
    pub operation: String,

    /// Header name
    pub name: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    /// Server name API Gateway uses to verify the backend certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name_to_verify: Option<String>,
}

/// IntegrationObservation is the observed state of an integration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_gateway_managed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_response_selection_expression: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<IntegrationObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Integration, IntegrationParameters, IntegrationObservation);
