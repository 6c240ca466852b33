//! DAX operations for MockAwsClient

use super::{MockAwsClient, MockState, arn, not_found};
use crate::aws_trait::DaxApi;
use crate::error::AwsError;
use crate::models::dax::*;

fn cluster_not_found(name: &str) -> AwsError {
    not_found("ClusterNotFoundFault", format!("Cluster {name} not found"))
}

fn parameter_group_not_found(name: &str) -> AwsError {
    not_found("ParameterGroupNotFoundFault", format!("Parameter group {name} not found"))
}

fn subnet_group_not_found(name: &str) -> AwsError {
    not_found("SubnetGroupNotFoundFault", format!("Subnet group {name} not found"))
}

fn nodes(cluster_name: &str, count: i32, zones: &[String]) -> Vec<Node> {
    (0..count.max(0))
        .map(|i| Node {
            node_id: Some(format!("{cluster_name}-{}", char::from(b'a' + (i % 26) as u8))),
            availability_zone: zones.get(i as usize).cloned(),
            node_status: Some("available".to_string()),
        })
        .collect()
}

fn subnets(subnet_ids: &[String]) -> Vec<Subnet> {
    subnet_ids
        .iter()
        .map(|id| Subnet { subnet_identifier: Some(id.clone()), subnet_availability_zone: None })
        .collect()
}

impl MockState {
    fn dax_cluster_mut(&mut self, name: &str) -> Result<&mut Cluster, AwsError> {
        self.dax_clusters.get_mut(name).ok_or_else(|| cluster_not_found(name))
    }
}

impl MockAwsClient {
    /// Add a DAX cluster to the mock store (for test setup)
    pub fn add_dax_cluster(&self, cluster: Cluster) {
        self.lock().dax_clusters.insert(cluster.cluster_name.clone(), cluster);
    }

    /// Stored DAX cluster
    pub fn dax_cluster(&self, cluster_name: &str) -> Option<Cluster> {
        self.lock().dax_clusters.get(cluster_name).cloned()
    }

    /// Set the status of a stored DAX cluster, e.g. to finish creation
    pub fn set_dax_cluster_status(&self, cluster_name: &str, status: &str) {
        if let Some(c) = self.lock().dax_clusters.get_mut(cluster_name) {
            c.status = Some(status.to_string());
        }
    }

    /// Add a parameter group with its parameters (for test setup)
    pub fn add_dax_parameter_group(&self, group: ParameterGroup, parameters: Vec<ParameterNameValue>) {
        self.lock()
            .dax_parameter_groups
            .insert(group.parameter_group_name.clone(), (group, parameters));
    }

    /// Stored parameters of a parameter group
    pub fn dax_parameters(&self, parameter_group_name: &str) -> Option<Vec<ParameterNameValue>> {
        self.lock().dax_parameter_groups.get(parameter_group_name).map(|(_, p)| p.clone())
    }

    /// Add a subnet group to the mock store (for test setup)
    pub fn add_dax_subnet_group(&self, group: SubnetGroup) {
        self.lock().dax_subnet_groups.insert(group.subnet_group_name.clone(), group);
    }

    /// Stored subnet group
    pub fn dax_subnet_group(&self, subnet_group_name: &str) -> Option<SubnetGroup> {
        self.lock().dax_subnet_groups.get(subnet_group_name).cloned()
    }
}

#[async_trait::async_trait]
impl DaxApi for MockAwsClient {
    async fn describe_clusters(&self, cluster_names: &[String]) -> Result<Vec<Cluster>, AwsError> {
        let s = self.record("DescribeClusters")?;
        cluster_names
            .iter()
            .map(|name| s.dax_clusters.get(name).cloned().ok_or_else(|| cluster_not_found(name)))
            .collect()
    }

    async fn create_cluster(&self, input: CreateClusterInput) -> Result<Cluster, AwsError> {
        let mut s = self.record("CreateCluster")?;
        if s.dax_clusters.contains_key(&input.cluster_name) {
            return Err(AwsError::service(
                "ClusterAlreadyExistsFault",
                format!("Cluster {} already exists", input.cluster_name),
            ));
        }
        let cluster = Cluster {
            cluster_arn: Some(arn("dax", &format!("cache/{}", input.cluster_name))),
            description: input.description,
            status: Some("creating".to_string()),
            node_type: Some(input.node_type),
            total_nodes: Some(input.replication_factor),
            active_nodes: Some(0),
            nodes: nodes(&input.cluster_name, input.replication_factor, &input.availability_zones),
            cluster_discovery_endpoint: None,
            iam_role_arn: Some(input.iam_role_arn),
            notification_topic_arn: input.notification_topic_arn,
            parameter_group_name: input.parameter_group_name.or_else(|| Some("default.dax1.0".to_string())),
            subnet_group_name: input.subnet_group_name.or_else(|| Some("default".to_string())),
            preferred_maintenance_window: input
                .preferred_maintenance_window
                .or_else(|| Some("sun:05:00-sun:06:00".to_string())),
            security_group_ids: input.security_group_ids,
            sse_enabled: Some(input.sse_enabled.unwrap_or_default()),
            cluster_endpoint_encryption_type: input.cluster_endpoint_encryption_type.or_else(|| Some("NONE".to_string())),
            cluster_name: input.cluster_name.clone(),
        };
        s.dax_clusters.insert(input.cluster_name, cluster.clone());
        Ok(cluster)
    }

    async fn update_cluster(&self, input: UpdateClusterInput) -> Result<Cluster, AwsError> {
        let mut s = self.record("UpdateCluster")?;
        let cluster = s.dax_cluster_mut(&input.cluster_name)?;
        if input.description.is_some() {
            cluster.description = input.description;
        }
        if input.notification_topic_arn.is_some() {
            cluster.notification_topic_arn = input.notification_topic_arn;
        }
        if input.parameter_group_name.is_some() {
            cluster.parameter_group_name = input.parameter_group_name;
        }
        if input.preferred_maintenance_window.is_some() {
            cluster.preferred_maintenance_window = input.preferred_maintenance_window;
        }
        if !input.security_group_ids.is_empty() {
            cluster.security_group_ids = input.security_group_ids;
        }
        Ok(cluster.clone())
    }

    async fn increase_replication_factor(
        &self,
        cluster_name: &str,
        new_replication_factor: i32,
        availability_zones: Vec<String>,
    ) -> Result<Cluster, AwsError> {
        let mut s = self.record("IncreaseReplicationFactor")?;
        let cluster = s.dax_cluster_mut(cluster_name)?;
        if new_replication_factor <= cluster.total_nodes.unwrap_or_default() {
            return Err(AwsError::service(
                "InvalidParameterValueException",
                "New replication factor must be greater than the current one",
            ));
        }
        cluster.total_nodes = Some(new_replication_factor);
        cluster.nodes = nodes(cluster_name, new_replication_factor, &availability_zones);
        Ok(cluster.clone())
    }

    async fn decrease_replication_factor(&self, cluster_name: &str, new_replication_factor: i32) -> Result<Cluster, AwsError> {
        let mut s = self.record("DecreaseReplicationFactor")?;
        let cluster = s.dax_cluster_mut(cluster_name)?;
        if new_replication_factor >= cluster.total_nodes.unwrap_or_default() {
            return Err(AwsError::service(
                "InvalidParameterValueException",
                "New replication factor must be less than the current one",
            ));
        }
        cluster.total_nodes = Some(new_replication_factor);
        cluster.nodes.truncate(new_replication_factor.max(0) as usize);
        Ok(cluster.clone())
    }

    async fn delete_cluster(&self, cluster_name: &str) -> Result<Cluster, AwsError> {
        let mut s = self.record("DeleteCluster")?;
        let cluster = s.dax_cluster_mut(cluster_name)?;
        cluster.status = Some("deleting".to_string());
        Ok(cluster.clone())
    }

    async fn describe_parameter_groups(&self, names: &[String]) -> Result<Vec<ParameterGroup>, AwsError> {
        let s = self.record("DescribeParameterGroups")?;
        names
            .iter()
            .map(|name| {
                s.dax_parameter_groups
                    .get(name)
                    .map(|(group, _)| group.clone())
                    .ok_or_else(|| parameter_group_not_found(name))
            })
            .collect()
    }

    async fn describe_parameters(&self, parameter_group_name: &str) -> Result<Vec<ParameterNameValue>, AwsError> {
        let s = self.record("DescribeParameters")?;
        s.dax_parameter_groups
            .get(parameter_group_name)
            .map(|(_, parameters)| parameters.clone())
            .ok_or_else(|| parameter_group_not_found(parameter_group_name))
    }

    async fn create_parameter_group(&self, parameter_group_name: &str, description: Option<String>) -> Result<ParameterGroup, AwsError> {
        let mut s = self.record("CreateParameterGroup")?;
        if s.dax_parameter_groups.contains_key(parameter_group_name) {
            return Err(AwsError::service(
                "ParameterGroupAlreadyExistsFault",
                format!("Parameter group {parameter_group_name} already exists"),
            ));
        }
        let group = ParameterGroup { parameter_group_name: parameter_group_name.to_string(), description };
        // Defaults every new group starts with
        let defaults = vec![
            ParameterNameValue { parameter_name: "query-ttl-millis".into(), parameter_value: "300000".into() },
            ParameterNameValue { parameter_name: "record-ttl-millis".into(), parameter_value: "300000".into() },
        ];
        s.dax_parameter_groups
            .insert(parameter_group_name.to_string(), (group.clone(), defaults));
        Ok(group)
    }

    async fn update_parameter_group(
        &self,
        parameter_group_name: &str,
        parameter_name_values: Vec<ParameterNameValue>,
    ) -> Result<ParameterGroup, AwsError> {
        let mut s = self.record("UpdateParameterGroup")?;
        let (group, parameters) = s
            .dax_parameter_groups
            .get_mut(parameter_group_name)
            .ok_or_else(|| parameter_group_not_found(parameter_group_name))?;
        for update in parameter_name_values {
            match parameters.iter_mut().find(|p| p.parameter_name == update.parameter_name) {
                Some(existing) => existing.parameter_value = update.parameter_value,
                None => parameters.push(update),
            }
        }
        Ok(group.clone())
    }

    async fn delete_parameter_group(&self, parameter_group_name: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteParameterGroup")?;
        s.dax_parameter_groups
            .remove(parameter_group_name)
            .map(|_| ())
            .ok_or_else(|| parameter_group_not_found(parameter_group_name))
    }

    async fn describe_subnet_groups(&self, names: &[String]) -> Result<Vec<SubnetGroup>, AwsError> {
        let s = self.record("DescribeSubnetGroups")?;
        names
            .iter()
            .map(|name| s.dax_subnet_groups.get(name).cloned().ok_or_else(|| subnet_group_not_found(name)))
            .collect()
    }

    async fn create_subnet_group(&self, input: SubnetGroupInput) -> Result<SubnetGroup, AwsError> {
        let mut s = self.record("CreateSubnetGroup")?;
        if s.dax_subnet_groups.contains_key(&input.subnet_group_name) {
            return Err(AwsError::service(
                "SubnetGroupAlreadyExistsFault",
                format!("Subnet group {} already exists", input.subnet_group_name),
            ));
        }
        let group = SubnetGroup {
            subnet_group_name: input.subnet_group_name.clone(),
            description: input.description,
            vpc_id: Some("vpc-mock".to_string()),
            subnets: subnets(&input.subnet_ids),
        };
        s.dax_subnet_groups.insert(input.subnet_group_name, group.clone());
        Ok(group)
    }

    async fn update_subnet_group(&self, input: SubnetGroupInput) -> Result<SubnetGroup, AwsError> {
        let mut s = self.record("UpdateSubnetGroup")?;
        let group = s
            .dax_subnet_groups
            .get_mut(&input.subnet_group_name)
            .ok_or_else(|| subnet_group_not_found(&input.subnet_group_name))?;
        if input.description.is_some() {
            group.description = input.description;
        }
        if !input.subnet_ids.is_empty() {
            group.subnets = subnets(&input.subnet_ids);
        }
        Ok(group.clone())
    }

    async fn delete_subnet_group(&self, subnet_group_name: &str) -> Result<(), AwsError> {
        let mut s = self.record("DeleteSubnetGroup")?;
        s.dax_subnet_groups
            .remove(subnet_group_name)
            .map(|_| ())
            .ok_or_else(|| subnet_group_not_found(subnet_group_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_describe_cluster() {
        let mock = MockAwsClient::new();
        let input = CreateClusterInput {
            cluster_name: "cache".into(),
            node_type: "dax.r4.large".into(),
            replication_factor: 3,
            iam_role_arn: "arn:aws:iam::123456789012:role/dax".into(),
            ..Default::default()
        };
        mock.create_cluster(input).await.unwrap();
        let clusters = DaxApi::describe_clusters(&mock, &["cache".to_string()]).await.unwrap();
        assert_eq!(clusters[0].status.as_deref(), Some("creating"));
        assert_eq!(clusters[0].nodes.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_cluster_is_fault() {
        let mock = MockAwsClient::new();
        let err = DaxApi::describe_clusters(&mock, &["ghost".to_string()]).await.unwrap_err();
        assert!(err.is_code("ClusterNotFoundFault"));
    }

    #[tokio::test]
    async fn test_update_parameter_group_merges_values() {
        let mock = MockAwsClient::new();
        mock.create_parameter_group("pg", None).await.unwrap();
        mock.update_parameter_group(
            "pg",
            vec![ParameterNameValue { parameter_name: "query-ttl-millis".into(), parameter_value: "1000".into() }],
        )
        .await
        .unwrap();
        let params = mock.dax_parameters("pg").unwrap();
        assert_eq!(params.len(), 2);
        assert!(params.iter().any(|p| p.parameter_name == "query-ttl-millis" && p.parameter_value == "1000"));
    }

    #[tokio::test]
    async fn test_decrease_below_current_only() {
        let mock = MockAwsClient::new();
        mock.add_dax_cluster(Cluster { cluster_name: "c".into(), total_nodes: Some(2), ..Default::default() });
        assert!(mock.decrease_replication_factor("c", 3).await.is_err());
        let cluster = mock.decrease_replication_factor("c", 1).await.unwrap();
        assert_eq!(cluster.total_nodes, Some(1));
    }
}
