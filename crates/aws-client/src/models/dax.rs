//! DAX request and response shapes

use serde::{Deserialize, Serialize};

use super::Tag;

// Clusters

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: Option<String>,
    pub port: i32,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub node_id: Option<String>,
    pub availability_zone: Option<String>,
    pub node_status: Option<String>,
}

/// Cluster as returned by DescribeClusters
///
/// Nested status objects of the service (parameter group status, security group
/// memberships, notification configuration, SSE description) are flattened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_name: String,
    pub cluster_arn: Option<String>,
    pub description: Option<String>,
    /// `creating`, `available`, `modifying` or `deleting`
    pub status: Option<String>,
    pub node_type: Option<String>,
    pub total_nodes: Option<i32>,
    pub active_nodes: Option<i32>,
    pub nodes: Vec<Node>,
    pub cluster_discovery_endpoint: Option<Endpoint>,
    pub iam_role_arn: Option<String>,
    pub notification_topic_arn: Option<String>,
    pub parameter_group_name: Option<String>,
    pub subnet_group_name: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub security_group_ids: Vec<String>,
    pub sse_enabled: Option<bool>,
    pub cluster_endpoint_encryption_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateClusterInput {
    pub cluster_name: String,
    pub node_type: String,
    pub replication_factor: i32,
    pub iam_role_arn: String,
    pub availability_zones: Vec<String>,
    pub cluster_endpoint_encryption_type: Option<String>,
    pub description: Option<String>,
    pub notification_topic_arn: Option<String>,
    pub parameter_group_name: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub security_group_ids: Vec<String>,
    pub sse_enabled: Option<bool>,
    pub subnet_group_name: Option<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateClusterInput {
    pub cluster_name: String,
    pub description: Option<String>,
    pub notification_topic_arn: Option<String>,
    pub parameter_group_name: Option<String>,
    pub preferred_maintenance_window: Option<String>,
    pub security_group_ids: Vec<String>,
}

// Parameter groups

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterGroup {
    pub parameter_group_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterNameValue {
    pub parameter_name: String,
    pub parameter_value: String,
}

// Subnet groups

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub subnet_identifier: Option<String>,
    pub subnet_availability_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetGroup {
    pub subnet_group_name: String,
    pub description: Option<String>,
    pub vpc_id: Option<String>,
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetGroupInput {
    pub subnet_group_name: String,
    pub description: Option<String>,
    pub subnet_ids: Vec<String>,
}
