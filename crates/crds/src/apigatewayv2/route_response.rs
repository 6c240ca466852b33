//! RouteResponse Custom Resource Definition

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ParameterConstraints;
use crate::common::{Condition, DeletionPolicy};
use crate::references::{Reference, Selector};

/// RouteResponseSpec defines the desired state of a route response
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "RouteResponse",
    namespaced,
    status = "RouteResponseStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponseSpec {
    pub for_provider: RouteResponseParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// RouteResponseParameters are the configurable fields of a route response
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponseParameters {
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id_selector: Option<Selector>,

    /// Route the response belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,

    /// Reference to a Route record to fill `routeId`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id_ref: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id_selector: Option<Selector>,

    /// Route response key, usually `$default`
    pub route_response_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_selection_expression: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_models: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_parameters: BTreeMap<String, ParameterConstraints>,
}

/// RouteResponseObservation is the observed state of a route response
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponseObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_response_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<RouteResponseObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(RouteResponse, RouteResponseParameters, RouteResponseObservation);
