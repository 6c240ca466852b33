//! DomainName Custom Resource Definition
//!
//! A custom domain name. The record name is the domain name itself.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};

/// DomainNameSpec defines the desired state of a custom domain name
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "DomainName",
    namespaced,
    status = "DomainNameStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameSpec {
    pub for_provider: DomainNameParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// DomainNameParameters are the configurable fields of a domain name
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameParameters {
    pub region: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_name_configurations: Vec<DomainNameConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutual_tls_authentication: Option<MutualTlsAuthentication>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Endpoint configuration of a domain name
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameConfiguration {
    /// ACM certificate ARN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_name: Option<String>,

    /// `REGIONAL` or `EDGE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership_verification_certificate_arn: Option<String>,

    /// `TLS_1_0` or `TLS_1_2`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_policy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MutualTlsAuthentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truststore_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub truststore_version: Option<String>,
}

/// Observed state of one endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameConfigurationObservation {
    /// Target domain name to point DNS at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_gateway_domain_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,

    /// `AVAILABLE`, `UPDATING`, `PENDING_CERTIFICATE_REIMPORT` or `PENDING_OWNERSHIP_VERIFICATION`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_status_message: Option<String>,
}

/// DomainNameObservation is the observed state of a domain name
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_mapping_selection_expression: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_name_configurations: Vec<DomainNameConfigurationObservation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<DomainNameObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(DomainName, DomainNameParameters, DomainNameObservation);
