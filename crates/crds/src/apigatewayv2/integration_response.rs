//! IntegrationResponse Custom Resource Definition

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// IntegrationResponseSpec defines the desired state of an integration response
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "IntegrationResponse",
    namespaced,
    status = "IntegrationResponseStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponseSpec {
    pub for_provider: IntegrationResponseParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// IntegrationResponseParameters are the configurable fields of an integration response
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponseParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<String>,

    /// Reference to an Integration record to fill `integrationId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_id_selector: Option<Selector>,

    /// Integration response key, for example `/200/`
    pub integration_response_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_handling_strategy: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_parameters: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_templates: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_selection_expression: Option<String>,
}

/// IntegrationResponseObservation is the observed state of an integration response
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponseObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_response_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<IntegrationResponseObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(
    IntegrationResponse,
    IntegrationResponseParameters,
    IntegrationResponseObservation
);
