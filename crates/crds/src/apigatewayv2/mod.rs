//! API Gateway v2 CRDs
//!
//! Resources for managing HTTP and WebSocket APIs:
//! - APIs
//! - Stages
//! - Routes and route responses
//! - Integrations and integration responses
//! - Deployments
//! - VPC links
//! - Authorizers
//! - Custom domain names and API mappings

pub mod api;
pub mod api_mapping;
pub mod authorizer;
pub mod deployment;
pub mod domain_name;
pub mod integration;
pub mod integration_response;
pub mod route;
pub mod route_response;
pub mod stage;
pub mod vpc_link;

pub use api::*;
pub use api_mapping::*;
pub use authorizer::*;
pub use deployment::*;
pub use domain_name::*;
pub use integration::*;
pub use integration_response::*;
pub use route::*;
pub use route_response::*;
pub use stage::*;
pub use vpc_link::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of every API Gateway v2 resource
pub const GROUP: &str = "apigatewayv2.aws.microscaler.io";

/// Validation constraints of a route request or response parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParameterConstraints {
    /// Whether the parameter is required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}
