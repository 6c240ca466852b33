//! VpcLink Custom Resource Definition
//!
//! A VPC link for private integrations of HTTP APIs.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::common::{Condition, DeletionPolicy, Tag};

/// VpcLinkSpec defines the desired state of a VPC link
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "apigatewayv2.aws.microscaler.io",
    version = "v1alpha1",
    kind = "VpcLink",
    namespaced,
    status = "VpcLinkStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct VpcLinkSpec {
    pub for_provider: VpcLinkParameters,

    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// VpcLinkParameters are the configurable fields of a VPC link
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcLinkParameters {
    pub region: String,

    pub name: String,

    /// Security groups of the link (immutable)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    /// Subnets of the link (immutable)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// VpcLinkObservation is the observed state of a VPC link
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VpcLinkObservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_link_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,

    /// `PENDING`, `AVAILABLE`, `DELETING`, `FAILED` or `INACTIVE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_link_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_link_status_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_link_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpcLinkStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<VpcLinkObservation>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

crate::impl_managed!(VpcLink, VpcLinkParameters, VpcLinkObservation);
