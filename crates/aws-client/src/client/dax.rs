//! DAX client backed by `aws-sdk-dax`

use aws_sdk_dax::Client;
use aws_sdk_dax::types::{self, ClusterEndpointEncryptionType, SseStatus};
use tracing::debug;

use super::convert::{Built, StrField, list, non_empty, sdk_error};
use crate::aws_trait::DaxApi;
use crate::error::AwsError;
use crate::models::dax::*;

/// DAX client for one region
#[derive(Debug, Clone)]
pub struct DaxClient {
    client: Client,
}

impl DaxClient {
    /// Create a client from a loaded SDK configuration
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self { client: Client::new(config) }
    }
}

fn missing(what: &str) -> AwsError {
    AwsError::UnexpectedResponse(format!("response did not include the {what}"))
}

fn cluster(c: &types::Cluster) -> Cluster {
    Cluster {
        cluster_name: c.cluster_name().owned().unwrap_or_default(),
        cluster_arn: c.cluster_arn().owned(),
        description: c.description().owned(),
        status: c.status().owned(),
        node_type: c.node_type().owned(),
        total_nodes: c.total_nodes(),
        active_nodes: c.active_nodes(),
        nodes: list(c.nodes(), |n| Node {
            node_id: n.node_id().owned(),
            availability_zone: n.availability_zone().owned(),
            node_status: n.node_status().owned(),
        }),
        cluster_discovery_endpoint: c.cluster_discovery_endpoint().map(|e| Endpoint {
            address: e.address().owned(),
            port: e.port(),
            url: e.url().owned(),
        }),
        iam_role_arn: c.iam_role_arn().owned(),
        notification_topic_arn: c.notification_configuration().and_then(|n| n.topic_arn().owned()),
        parameter_group_name: c.parameter_group().and_then(|p| p.parameter_group_name().owned()),
        subnet_group_name: c.subnet_group().owned(),
        preferred_maintenance_window: c.preferred_maintenance_window().owned(),
        security_group_ids: list(c.security_groups(), |g| g.security_group_identifier().owned().unwrap_or_default()),
        sse_enabled: c.sse_description().and_then(|s| s.status()).map(|s| *s == SseStatus::Enabled),
        cluster_endpoint_encryption_type: c.cluster_endpoint_encryption_type().owned(),
    }
}

fn parameter_group(p: &types::ParameterGroup) -> ParameterGroup {
    ParameterGroup {
        parameter_group_name: p.parameter_group_name().owned().unwrap_or_default(),
        description: p.description().owned(),
    }
}

fn subnet_group(g: &types::SubnetGroup) -> SubnetGroup {
    SubnetGroup {
        subnet_group_name: g.subnet_group_name().owned().unwrap_or_default(),
        description: g.description().owned(),
        vpc_id: g.vpc_id().owned(),
        subnets: list(g.subnets(), |s| Subnet {
            subnet_identifier: s.subnet_identifier().owned(),
            subnet_availability_zone: s.subnet_availability_zone().owned(),
        }),
    }
}

#[async_trait::async_trait]
impl DaxApi for DaxClient {
    async fn describe_clusters(&self, cluster_names: &[String]) -> Result<Vec<Cluster>, AwsError> {
        debug!(?cluster_names, "DescribeClusters");
        let out = self
            .client
            .describe_clusters()
            .set_cluster_names(Some(cluster_names.to_vec()))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(list(out.clusters(), cluster))
    }

    async fn create_cluster(&self, input: CreateClusterInput) -> Result<Cluster, AwsError> {
        debug!(cluster_name = %input.cluster_name, "CreateCluster");
        let sse = input
            .sse_enabled
            .map(|enabled| types::SseSpecification::builder().enabled(enabled).build().built())
            .transpose()?;
        let out = self
            .client
            .create_cluster()
            .cluster_name(input.cluster_name)
            .node_type(input.node_type)
            .replication_factor(input.replication_factor)
            .iam_role_arn(input.iam_role_arn)
            .set_availability_zones(non_empty(&input.availability_zones))
            .set_cluster_endpoint_encryption_type(
                input.cluster_endpoint_encryption_type.as_deref().map(ClusterEndpointEncryptionType::from),
            )
            .set_description(input.description)
            .set_notification_topic_arn(input.notification_topic_arn)
            .set_parameter_group_name(input.parameter_group_name)
            .set_preferred_maintenance_window(input.preferred_maintenance_window)
            .set_security_group_ids(non_empty(&input.security_group_ids))
            .set_sse_specification(sse)
            .set_subnet_group_name(input.subnet_group_name)
            .set_tags(non_empty(&input.tags).map(|tags| {
                tags.into_iter()
                    .map(|t| types::Tag::builder().key(t.key).value(t.value).build())
                    .collect()
            }))
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn update_cluster(&self, input: UpdateClusterInput) -> Result<Cluster, AwsError> {
        debug!(cluster_name = %input.cluster_name, "UpdateCluster");
        let out = self
            .client
            .update_cluster()
            .cluster_name(input.cluster_name)
            .set_description(input.description)
            .set_notification_topic_arn(input.notification_topic_arn)
            .set_parameter_group_name(input.parameter_group_name)
            .set_preferred_maintenance_window(input.preferred_maintenance_window)
            .set_security_group_ids(non_empty(&input.security_group_ids))
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn increase_replication_factor(
        &self,
        cluster_name: &str,
        new_replication_factor: i32,
        availability_zones: Vec<String>,
    ) -> Result<Cluster, AwsError> {
        debug!(cluster_name, new_replication_factor, "IncreaseReplicationFactor");
        let out = self
            .client
            .increase_replication_factor()
            .cluster_name(cluster_name)
            .new_replication_factor(new_replication_factor)
            .set_availability_zones(non_empty(&availability_zones))
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn decrease_replication_factor(&self, cluster_name: &str, new_replication_factor: i32) -> Result<Cluster, AwsError> {
        debug!(cluster_name, new_replication_factor, "DecreaseReplicationFactor");
        let out = self
            .client
            .decrease_replication_factor()
            .cluster_name(cluster_name)
            .new_replication_factor(new_replication_factor)
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn delete_cluster(&self, cluster_name: &str) -> Result<Cluster, AwsError> {
        debug!(cluster_name, "DeleteCluster");
        let out = self.client.delete_cluster().cluster_name(cluster_name).send().await.map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn describe_parameter_groups(&self, names: &[String]) -> Result<Vec<ParameterGroup>, AwsError> {
        debug!(?names, "DescribeParameterGroups");
        let out = self
            .client
            .describe_parameter_groups()
            .set_parameter_group_names(Some(names.to_vec()))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(list(out.parameter_groups(), parameter_group))
    }

    async fn describe_parameters(&self, parameter_group_name: &str) -> Result<Vec<ParameterNameValue>, AwsError> {
        let mut parameters = Vec::new();
        let mut next_token = None;
        loop {
            let out = self
                .client
                .describe_parameters()
                .parameter_group_name(parameter_group_name)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(sdk_error)?;
            parameters.extend(list(out.parameters(), |p| ParameterNameValue {
                parameter_name: p.parameter_name().owned().unwrap_or_default(),
                parameter_value: p.parameter_value().owned().unwrap_or_default(),
            }));
            next_token = out.next_token().owned();
            if next_token.is_none() {
                break;
            }
        }
        debug!(parameter_group_name, count = parameters.len(), "DescribeParameters");
        Ok(parameters)
    }

    async fn create_parameter_group(&self, parameter_group_name: &str, description: Option<String>) -> Result<ParameterGroup, AwsError> {
        debug!(parameter_group_name, "CreateParameterGroup");
        let out = self
            .client
            .create_parameter_group()
            .parameter_group_name(parameter_group_name)
            .set_description(description)
            .send()
            .await
            .map_err(sdk_error)?;
        out.parameter_group().map(parameter_group).ok_or_else(|| missing("parameter group"))
    }

    async fn update_parameter_group(
        &self,
        parameter_group_name: &str,
        parameter_name_values: Vec<ParameterNameValue>,
    ) -> Result<ParameterGroup, AwsError> {
        debug!(parameter_group_name, count = parameter_name_values.len(), "UpdateParameterGroup");
        let out = self
            .client
            .update_parameter_group()
            .parameter_group_name(parameter_group_name)
            .set_parameter_name_values(Some(
                parameter_name_values
                    .into_iter()
                    .map(|p| {
                        types::ParameterNameValue::builder()
                            .parameter_name(p.parameter_name)
                            .parameter_value(p.parameter_value)
                            .build()
                    })
                    .collect(),
            ))
            .send()
            .await
            .map_err(sdk_error)?;
        out.parameter_group().map(parameter_group).ok_or_else(|| missing("parameter group"))
    }

    async fn delete_parameter_group(&self, parameter_group_name: &str) -> Result<(), AwsError> {
        debug!(parameter_group_name, "DeleteParameterGroup");
        self.client
            .delete_parameter_group()
            .parameter_group_name(parameter_group_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn describe_subnet_groups(&self, names: &[String]) -> Result<Vec<SubnetGroup>, AwsError> {
        debug!(?names, "DescribeSubnetGroups");
        let out = self
            .client
            .describe_subnet_groups()
            .set_subnet_group_names(Some(names.to_vec()))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(list(out.subnet_groups(), subnet_group))
    }

    async fn create_subnet_group(&self, input: SubnetGroupInput) -> Result<SubnetGroup, AwsError> {
        debug!(subnet_group_name = %input.subnet_group_name, "CreateSubnetGroup");
        let out = self
            .client
            .create_subnet_group()
            .subnet_group_name(input.subnet_group_name)
            .set_description(input.description)
            .set_subnet_ids(Some(input.subnet_ids))
            .send()
            .await
            .map_err(sdk_error)?;
        out.subnet_group().map(subnet_group).ok_or_else(|| missing("subnet group"))
    }

    async fn update_subnet_group(&self, input: SubnetGroupInput) -> Result<SubnetGroup, AwsError> {
        debug!(subnet_group_name = %input.subnet_group_name, "UpdateSubnetGroup");
        let out = self
            .client
            .update_subnet_group()
            .subnet_group_name(input.subnet_group_name)
            .set_description(input.description)
            .set_subnet_ids(non_empty(&input.subnet_ids))
            .send()
            .await
            .map_err(sdk_error)?;
        out.subnet_group().map(subnet_group).ok_or_else(|| missing("subnet group"))
    }

    async fn delete_subnet_group(&self, subnet_group_name: &str) -> Result<(), AwsError> {
        debug!(subnet_group_name, "DeleteSubnetGroup");
        self.client
            .delete_subnet_group()
            .subnet_group_name(subnet_group_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_flattens_nested_status() {
        let sdk = types::Cluster::builder()
            .cluster_name("cache")
            .status("available")
            .subnet_group("private")
            .parameter_group(types::ParameterGroupStatus::builder().parameter_group_name("default.dax1.0").build())
            .security_groups(types::SecurityGroupMembership::builder().security_group_identifier("sg-1").build())
            .sse_description(types::SseDescription::builder().status(SseStatus::Enabled).build())
            .build();
        let c = cluster(&sdk);
        assert_eq!(c.cluster_name, "cache");
        assert_eq!(c.parameter_group_name.as_deref(), Some("default.dax1.0"));
        assert_eq!(c.subnet_group_name.as_deref(), Some("private"));
        assert_eq!(c.security_group_ids, vec!["sg-1".to_string()]);
        assert_eq!(c.sse_enabled, Some(true));
    }
}
