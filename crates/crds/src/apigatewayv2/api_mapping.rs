//! ApiMapping Custom Resource Definition
//!
//! Maps an API stage onto a custom domain name.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// ApiMappingSpec defines the desired state of an API mapping
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "ApiMapping",
    namespaced,
    status = "ApiMappingStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ApiMappingSpec {
    pub for_provider: ApiMappingParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// ApiMappingParameters are the configurable fields of an API mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiMappingParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    /// Custom domain name the mapping belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    /// Reference to a DomainName record to fill `domainName`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_selector: Option<Selector>,

    /// Stage of the API served under the mapping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Reference to a Stage record to fill `stage`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_selector: Option<Selector>,

    /// Path under the domain name, empty for the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_mapping_key: Option<String>,
}

/// ApiMappingObservation is the observed state of an API mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiMappingObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_mapping_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiMappingStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<ApiMappingObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(ApiMapping, ApiMappingParameters, ApiMappingObservation);
