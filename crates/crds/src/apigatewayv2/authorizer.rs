//! Authorizer Custom Resource Definition

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// AuthorizerSpec defines the desired state of an API authorizer
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Authorizer",
    namespaced,
    status = "AuthorizerStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerSpec {
    pub for_provider: AuthorizerParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// AuthorizerParameters are the configurable fields of an authorizer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    pub name: String,

    /// `REQUEST` or `JWT`
    pub authorizer_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_credentials_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_payload_format_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_result_ttl_in_seconds: Option<i32>,

    /// Lambda invocation URI of a `REQUEST` authorizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_simple_responses: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity_source: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_validation_expression: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_configuration: Option<JwtConfiguration>,
}

/// JWT issuer and audience of a `JWT` authorizer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JwtConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

/// AuthorizerObservation is the observed state of an authorizer
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<AuthorizerObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Authorizer, AuthorizerParameters, AuthorizerObservation);
