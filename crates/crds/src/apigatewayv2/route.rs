//! Route Custom Resource Definition

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ParameterConstraints;
use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// RouteSpec defines the desired state of an API route
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "Route",
    namespaced,
    status = "RouteStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub for_provider: RouteParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// RouteParameters are the configurable fields of a route
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    /// Route key, for example `GET /pets` or `$default`
    pub route_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_required: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization_scopes: Vec<String>,

    /// `NONE`, `AWS_IAM`, `CUSTOM` or `JWT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_id: Option<String>,

    /// Reference to an Authorizer record to fill `authorizerId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer_id_selector: Option<Selector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_selection_expression: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_models: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub request_parameters: BTreeMap<String, ParameterConstraints>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_response_selection_expression: Option<String>,

    /// Integration target, `integrations/<integrationId>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// RouteObservation is the observed state of a route
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_gateway_managed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<RouteObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(Route, RouteParameters, RouteObservation);
