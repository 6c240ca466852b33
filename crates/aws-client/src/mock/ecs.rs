//! ECS operations for MockAwsClient
//!
//! Deleted clusters and services stay visible as `INACTIVE`, and describe calls
//! report unknown names as `MISSING` failures the way ECS does.

use chrono::Utc;

use super::{MockAwsClient, MockState, arn, not_found};
use crate::aws_trait::EcsApi;
use crate::error::AwsError;
use crate::models::Tag;
use crate::models::ecs::*;

/// Last path segment of an ECS ARN, or the input when it is already a name
fn short_name(name_or_arn: &str) -> &str {
    name_or_arn.rsplit('/').next().unwrap_or(name_or_arn)
}

fn cluster_key(cluster: Option<&str>) -> String {
    short_name(cluster.unwrap_or("default")).to_string()
}

fn missing_failure(arn: String) -> Failure {
    Failure { arn: Some(arn), reason: Some("MISSING".to_string()), detail: None }
}

fn merge_tags(existing: &mut Vec<Tag>, tags: Vec<Tag>) {
    for tag in tags {
        existing.retain(|t| t.key != tag.key);
        existing.push(tag);
    }
}

impl MockState {
    /// Tags of the cluster, service or task definition with the given ARN
    fn ecs_tags_mut(&mut self, resource_arn: &str) -> Option<&mut Vec<Tag>> {
        if let Some(c) = self.ecs_clusters.values_mut().find(|c| c.cluster_arn == resource_arn) {
            return Some(&mut c.tags);
        }
        if let Some(svc) = self.ecs_services.values_mut().find(|svc| svc.service_arn == resource_arn) {
            return Some(&mut svc.tags);
        }
        self.task_definitions.get_mut(resource_arn).map(|t| &mut t.tags)
    }

    fn require_cluster(&self, cluster: &str) -> Result<(), AwsError> {
        match self.ecs_clusters.get(cluster) {
            Some(c) if c.status.as_deref() != Some("INACTIVE") => Ok(()),
            _ => Err(not_found("ClusterNotFoundException", "Cluster not found.")),
        }
    }

    fn find_task_definition(&self, reference: &str) -> Option<&DescribeTaskDefinitionOutput> {
        if let Some(found) = self.task_definitions.get(reference) {
            return Some(found);
        }
        let name = short_name(reference);
        match name.split_once(':') {
            Some((family, revision)) => self.task_definitions.values().find(|t| {
                t.task_definition.family == family && t.task_definition.revision.to_string() == revision
            }),
            None => self
                .task_definitions
                .values()
                .filter(|t| t.task_definition.family == name && t.task_definition.status.as_deref() == Some("ACTIVE"))
                .max_by_key(|t| t.task_definition.revision),
        }
    }
}

impl MockAwsClient {
    /// Add a cluster to the mock store (for test setup)
    pub fn add_ecs_cluster(&self, cluster: Cluster) {
        self.lock().ecs_clusters.insert(cluster.cluster_name.clone(), cluster);
    }

    /// Stored cluster
    pub fn ecs_cluster(&self, cluster_name: &str) -> Option<Cluster> {
        self.lock().ecs_clusters.get(cluster_name).cloned()
    }

    /// Add a service to the mock store (for test setup)
    pub fn add_ecs_service(&self, cluster_name: &str, service: Service) {
        self.lock().ecs_services.insert((cluster_name.to_string(), service.service_name.clone()), service);
    }

    /// Stored service
    pub fn ecs_service(&self, cluster_name: &str, service_name: &str) -> Option<Service> {
        self.lock().ecs_services.get(&(cluster_name.to_string(), service_name.to_string())).cloned()
    }

    /// Add a task definition revision to the mock store (for test setup)
    pub fn add_task_definition(&self, task_definition: TaskDefinition, tags: Vec<Tag>) {
        self.lock().task_definitions.insert(
            task_definition.task_definition_arn.clone(),
            DescribeTaskDefinitionOutput { task_definition, tags },
        );
    }

    /// Stored task definition revision by ARN
    pub fn task_definition(&self, task_definition_arn: &str) -> Option<TaskDefinition> {
        self.lock().task_definitions.get(task_definition_arn).map(|t| t.task_definition.clone())
    }

    /// Tags recorded by TagResource/UntagResource for an ARN
    pub fn ecs_tags(&self, resource_arn: &str) -> Vec<Tag> {
        self.lock().ecs_tags.get(resource_arn).cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl EcsApi for MockAwsClient {
    async fn describe_clusters(&self, clusters: &[String]) -> Result<DescribeClustersOutput, AwsError> {
        let s = self.record("DescribeClusters")?;
        let mut out = DescribeClustersOutput::default();
        for requested in clusters {
            let name = short_name(requested);
            match s.ecs_clusters.get(name) {
                Some(c) => out.clusters.push(c.clone()),
                None => out.failures.push(missing_failure(arn("ecs", &format!("cluster/{name}")))),
            }
        }
        Ok(out)
    }

    async fn create_cluster(&self, input: CreateClusterInput) -> Result<Cluster, AwsError> {
        let mut s = self.record("CreateCluster")?;
        let cluster = Cluster {
            cluster_arn: arn("ecs", &format!("cluster/{}", input.cluster_name)),
            cluster_name: input.cluster_name.clone(),
            status: Some("ACTIVE".to_string()),
            capacity_providers: input.capacity_providers,
            default_capacity_provider_strategy: input.default_capacity_provider_strategy,
            configuration: input.configuration,
            service_connect_defaults: input.service_connect_defaults,
            settings: input.settings,
            tags: input.tags,
            ..Cluster::default()
        };
        s.ecs_clusters.insert(input.cluster_name, cluster.clone());
        Ok(cluster)
    }

    async fn update_cluster(&self, input: UpdateClusterInput) -> Result<Cluster, AwsError> {
        let mut s = self.record("UpdateCluster")?;
        let name = short_name(&input.cluster).to_string();
        s.require_cluster(&name)?;
        let cluster = s
            .ecs_clusters
            .get_mut(&name)
            .ok_or_else(|| not_found("ClusterNotFoundException", "Cluster not found."))?;
        if input.configuration.is_some() {
            cluster.configuration = input.configuration;
        }
        if input.service_connect_defaults.is_some() {
            cluster.service_connect_defaults = input.service_connect_defaults;
        }
        if !input.settings.is_empty() {
            cluster.settings = input.settings;
        }
        Ok(cluster.clone())
    }

    async fn put_cluster_capacity_providers(&self, input: PutClusterCapacityProvidersInput) -> Result<Cluster, AwsError> {
        let mut s = self.record("PutClusterCapacityProviders")?;
        let name = short_name(&input.cluster).to_string();
        s.require_cluster(&name)?;
        let cluster = s
            .ecs_clusters
            .get_mut(&name)
            .ok_or_else(|| not_found("ClusterNotFoundException", "Cluster not found."))?;
        cluster.capacity_providers = input.capacity_providers;
        cluster.default_capacity_provider_strategy = input.default_capacity_provider_strategy;
        Ok(cluster.clone())
    }

    async fn delete_cluster(&self, cluster_name: &str) -> Result<Cluster, AwsError> {
        let mut s = self.record("DeleteCluster")?;
        let name = short_name(cluster_name).to_string();
        s.require_cluster(&name)?;
        let cluster = s
            .ecs_clusters
            .get_mut(&name)
            .ok_or_else(|| not_found("ClusterNotFoundException", "Cluster not found."))?;
        cluster.status = Some("INACTIVE".to_string());
        Ok(cluster.clone())
    }

    async fn describe_services(&self, cluster: Option<&str>, services: &[String]) -> Result<DescribeServicesOutput, AwsError> {
        let s = self.record("DescribeServices")?;
        let cluster_name = cluster_key(cluster);
        if !s.ecs_clusters.contains_key(&cluster_name) {
            return Err(not_found("ClusterNotFoundException", "Cluster not found."));
        }
        let mut out = DescribeServicesOutput::default();
        for requested in services {
            let name = short_name(requested).to_string();
            match s.ecs_services.get(&(cluster_name.clone(), name.clone())) {
                Some(svc) => out.services.push(svc.clone()),
                None => out.failures.push(missing_failure(arn("ecs", &format!("service/{cluster_name}/{name}")))),
            }
        }
        Ok(out)
    }

    async fn create_service(&self, input: CreateServiceInput) -> Result<Service, AwsError> {
        let mut s = self.record("CreateService")?;
        let cluster_name = cluster_key(input.cluster.as_deref());
        s.require_cluster(&cluster_name)?;
        let service = Service {
            service_arn: arn("ecs", &format!("service/{cluster_name}/{}", input.service_name)),
            service_name: input.service_name.clone(),
            cluster_arn: Some(arn("ecs", &format!("cluster/{cluster_name}"))),
            status: Some("ACTIVE".to_string()),
            task_definition: input.task_definition,
            desired_count: input.desired_count.unwrap_or_default(),
            launch_type: input.launch_type.or_else(|| Some("EC2".to_string())),
            platform_version: input.platform_version,
            scheduling_strategy: input.scheduling_strategy.or_else(|| Some("REPLICA".to_string())),
            deployment_configuration: input.deployment_configuration,
            network_configuration: input.network_configuration,
            load_balancers: input.load_balancers,
            health_check_grace_period_seconds: input.health_check_grace_period_seconds,
            enable_ecs_managed_tags: input.enable_ecs_managed_tags.unwrap_or_default(),
            enable_execute_command: input.enable_execute_command.unwrap_or_default(),
            propagate_tags: input.propagate_tags,
            created_at: Some(Utc::now()),
            tags: input.tags,
            ..Service::default()
        };
        s.ecs_services.insert((cluster_name, input.service_name), service.clone());
        Ok(service)
    }

    async fn update_service(&self, input: UpdateServiceInput) -> Result<Service, AwsError> {
        let mut s = self.record("UpdateService")?;
        let cluster_name = cluster_key(input.cluster.as_deref());
        s.require_cluster(&cluster_name)?;
        let service = s
            .ecs_services
            .get_mut(&(cluster_name, short_name(&input.service).to_string()))
            .filter(|svc| svc.status.as_deref() == Some("ACTIVE"))
            .ok_or_else(|| not_found("ServiceNotActiveException", "Service was not ACTIVE."))?;
        if input.task_definition.is_some() {
            service.task_definition = input.task_definition;
        }
        if let Some(count) = input.desired_count {
            service.desired_count = count;
        }
        if input.deployment_configuration.is_some() {
            service.deployment_configuration = input.deployment_configuration;
        }
        if let Some(enable) = input.enable_ecs_managed_tags {
            service.enable_ecs_managed_tags = enable;
        }
        if let Some(enable) = input.enable_execute_command {
            service.enable_execute_command = enable;
        }
        if input.health_check_grace_period_seconds.is_some() {
            service.health_check_grace_period_seconds = input.health_check_grace_period_seconds;
        }
        if !input.load_balancers.is_empty() {
            service.load_balancers = input.load_balancers;
        }
        if input.network_configuration.is_some() {
            service.network_configuration = input.network_configuration;
        }
        if input.platform_version.is_some() {
            service.platform_version = input.platform_version;
        }
        if input.propagate_tags.is_some() {
            service.propagate_tags = input.propagate_tags;
        }
        Ok(service.clone())
    }

    async fn delete_service(&self, cluster: Option<&str>, service_name: &str, force: bool) -> Result<Service, AwsError> {
        let mut s = self.record("DeleteService")?;
        let cluster_name = cluster_key(cluster);
        s.require_cluster(&cluster_name)?;
        let service = s
            .ecs_services
            .get_mut(&(cluster_name, short_name(service_name).to_string()))
            .ok_or_else(|| not_found("ServiceNotFoundException", "Service not found."))?;
        if !force && service.desired_count > 0 {
            return Err(AwsError::service(
                "InvalidParameterException",
                "The service cannot be stopped while it is scaled above 0.",
            ));
        }
        service.status = Some("DRAINING".to_string());
        service.desired_count = 0;
        Ok(service.clone())
    }

    async fn describe_task_definition(&self, task_definition_arn: &str) -> Result<DescribeTaskDefinitionOutput, AwsError> {
        let s = self.record("DescribeTaskDefinition")?;
        s.find_task_definition(task_definition_arn)
            .cloned()
            .ok_or_else(|| AwsError::service("ClientException", "Unable to describe task definition."))
    }

    async fn register_task_definition(&self, input: RegisterTaskDefinitionInput) -> Result<DescribeTaskDefinitionOutput, AwsError> {
        let mut s = self.record("RegisterTaskDefinition")?;
        let revision = s
            .task_definitions
            .values()
            .filter(|t| t.task_definition.family == input.family)
            .map(|t| t.task_definition.revision)
            .max()
            .unwrap_or_default()
            + 1;
        let task_definition_arn = arn("ecs", &format!("task-definition/{}:{revision}", input.family));
        let compatibilities = if input.requires_compatibilities.is_empty() {
            vec!["EC2".to_string()]
        } else {
            input.requires_compatibilities.clone()
        };
        let output = DescribeTaskDefinitionOutput {
            task_definition: TaskDefinition {
                task_definition_arn: task_definition_arn.clone(),
                family: input.family,
                revision,
                status: Some("ACTIVE".to_string()),
                container_definitions: input.container_definitions,
                cpu: input.cpu,
                memory: input.memory,
                execution_role_arn: input.execution_role_arn,
                task_role_arn: input.task_role_arn,
                network_mode: input.network_mode.or_else(|| Some("bridge".to_string())),
                requires_compatibilities: input.requires_compatibilities,
                compatibilities,
                runtime_platform: input.runtime_platform,
                volumes: input.volumes,
                registered_at: Some(Utc::now()),
            },
            tags: input.tags,
        };
        s.task_definitions.insert(task_definition_arn, output.clone());
        Ok(output)
    }

    async fn deregister_task_definition(&self, task_definition_arn: &str) -> Result<TaskDefinition, AwsError> {
        let mut s = self.record("DeregisterTaskDefinition")?;
        let found = s
            .find_task_definition(task_definition_arn)
            .map(|t| t.task_definition.task_definition_arn.clone())
            .ok_or_else(|| AwsError::service("ClientException", "The specified task definition does not exist."))?;
        let entry = s
            .task_definitions
            .get_mut(&found)
            .ok_or_else(|| AwsError::service("ClientException", "The specified task definition does not exist."))?;
        entry.task_definition.status = Some("INACTIVE".to_string());
        Ok(entry.task_definition.clone())
    }

    async fn tag_resource(&self, resource_arn: &str, tags: Vec<Tag>) -> Result<(), AwsError> {
        let mut s = self.record("TagResource")?;
        if let Some(resource_tags) = s.ecs_tags_mut(resource_arn) {
            merge_tags(resource_tags, tags.clone());
        }
        merge_tags(s.ecs_tags.entry(resource_arn.to_string()).or_default(), tags);
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), AwsError> {
        let mut s = self.record("UntagResource")?;
        if let Some(resource_tags) = s.ecs_tags_mut(resource_arn) {
            resource_tags.retain(|t| !tag_keys.contains(&t.key));
        }
        if let Some(existing) = s.ecs_tags.get_mut(resource_arn) {
            existing.retain(|t| !tag_keys.contains(&t.key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_cluster_reported_as_failure() {
        let mock = MockAwsClient::new();
        let out = mock.describe_clusters(&["ghost".to_string()]).await.unwrap();
        assert!(out.clusters.is_empty());
        assert_eq!(out.failures[0].reason.as_deref(), Some("MISSING"));
    }

    #[tokio::test]
    async fn test_register_bumps_revision() {
        let mock = MockAwsClient::new();
        let input = RegisterTaskDefinitionInput { family: "web".into(), ..Default::default() };
        let first = mock.register_task_definition(input.clone()).await.unwrap();
        let second = mock.register_task_definition(input).await.unwrap();
        assert_eq!(first.task_definition.revision, 1);
        assert_eq!(second.task_definition.revision, 2);
        assert!(second.task_definition.task_definition_arn.ends_with("task-definition/web:2"));
        let latest = mock.describe_task_definition("web").await.unwrap();
        assert_eq!(latest.task_definition.revision, 2);
    }

    #[tokio::test]
    async fn test_unknown_task_definition_is_client_exception() {
        let mock = MockAwsClient::new();
        let err = mock.describe_task_definition("missing:1").await.unwrap_err();
        assert!(err.is_code_with_message("ClientException", "Unable to describe task definition"));
    }
}
