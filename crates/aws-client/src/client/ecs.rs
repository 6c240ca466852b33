//! ECS client backed by `aws-sdk-ecs`
//!
//! Describe calls report missing clusters and services through `failures`
//! rather than an error, so the outputs keep both lists.

use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::{
    self, AssignPublicIp, ClusterField, ClusterSettingName, Compatibility, CpuArchitecture,
    ExecuteCommandLogging, LaunchType, LogDriver, NetworkMode, OsFamily, PropagateTags,
    SchedulingStrategy, ServiceField, TaskDefinitionField, TransportProtocol,
};
use tracing::debug;

use super::convert::{Built, Scalar, StrField, list, non_empty, sdk_error, string_map, strings, timestamp, to_hash_map, try_list};
use crate::aws_trait::EcsApi;
use crate::error::AwsError;
use crate::models::Tag;
use crate::models::ecs::*;

/// ECS client for one region
#[derive(Debug, Clone)]
pub struct EcsClient {
    client: Client,
}

impl EcsClient {
    /// Create a client from a loaded SDK configuration
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self { client: Client::new(config) }
    }
}

fn missing(what: &str) -> AwsError {
    AwsError::UnexpectedResponse(format!("response did not include the {what}"))
}

fn tag(t: &types::Tag) -> Tag {
    Tag::new(t.key().owned().unwrap_or_default(), t.value().owned().unwrap_or_default())
}

fn sdk_tags(tags: &[Tag]) -> Option<Vec<types::Tag>> {
    non_empty(tags).map(|tags| {
        tags.into_iter()
            .map(|t| types::Tag::builder().key(t.key).value(t.value).build())
            .collect()
    })
}

fn failure(f: &types::Failure) -> Failure {
    Failure { arn: f.arn().owned(), reason: f.reason().owned(), detail: f.detail().owned() }
}

fn key_value_pair(k: &types::KeyValuePair) -> KeyValuePair {
    KeyValuePair { name: k.name().owned().unwrap_or_default(), value: k.value().owned().unwrap_or_default() }
}

// Clusters

fn capacity_provider_strategy_item(i: &types::CapacityProviderStrategyItem) -> CapacityProviderStrategyItem {
    CapacityProviderStrategyItem {
        capacity_provider: i.capacity_provider().owned().unwrap_or_default(),
        base: i.base().value(),
        weight: i.weight().value(),
    }
}

fn sdk_capacity_provider_strategy_item(
    i: &CapacityProviderStrategyItem,
) -> Result<types::CapacityProviderStrategyItem, AwsError> {
    types::CapacityProviderStrategyItem::builder()
        .capacity_provider(&i.capacity_provider)
        .set_base(i.base)
        .set_weight(i.weight)
        .build()
        .built()
}

fn cluster_configuration(c: &types::ClusterConfiguration) -> ClusterConfiguration {
    ClusterConfiguration {
        execute_command_configuration: c.execute_command_configuration().map(|e| {
            ExecuteCommandConfiguration { kms_key_id: e.kms_key_id().owned(), logging: e.logging().owned() }
        }),
    }
}

fn sdk_cluster_configuration(c: &ClusterConfiguration) -> types::ClusterConfiguration {
    types::ClusterConfiguration::builder()
        .set_execute_command_configuration(c.execute_command_configuration.as_ref().map(|e| {
            types::ExecuteCommandConfiguration::builder()
                .set_kms_key_id(e.kms_key_id.clone())
                .set_logging(e.logging.as_deref().map(ExecuteCommandLogging::from))
                .build()
        }))
        .build()
}

fn sdk_cluster_settings(settings: &[KeyValuePair]) -> Option<Vec<types::ClusterSetting>> {
    non_empty(settings).map(|settings| {
        settings
            .into_iter()
            .map(|s| {
                types::ClusterSetting::builder()
                    .name(ClusterSettingName::from(s.name.as_str()))
                    .value(s.value)
                    .build()
            })
            .collect()
    })
}

fn sdk_service_connect_defaults(
    namespace: Option<&String>,
) -> Result<Option<types::ClusterServiceConnectDefaultsRequest>, AwsError> {
    namespace
        .map(|n| types::ClusterServiceConnectDefaultsRequest::builder().namespace(n).build().built())
        .transpose()
}

fn cluster(c: &types::Cluster) -> Cluster {
    Cluster {
        cluster_arn: c.cluster_arn().owned().unwrap_or_default(),
        cluster_name: c.cluster_name().owned().unwrap_or_default(),
        status: c.status().owned(),
        capacity_providers: strings(c.capacity_providers()),
        default_capacity_provider_strategy: list(c.default_capacity_provider_strategy(), capacity_provider_strategy_item),
        configuration: c.configuration().map(cluster_configuration),
        service_connect_defaults: c.service_connect_defaults().and_then(|d| d.namespace().owned()),
        settings: list(c.settings(), |s| KeyValuePair {
            name: s.name().owned().unwrap_or_default(),
            value: s.value().owned().unwrap_or_default(),
        }),
        active_services_count: c.active_services_count(),
        pending_tasks_count: c.pending_tasks_count(),
        running_tasks_count: c.running_tasks_count(),
        registered_container_instances_count: c.registered_container_instances_count(),
        tags: list(c.tags(), tag),
    }
}

// Services

fn deployment_configuration(d: &types::DeploymentConfiguration) -> DeploymentConfiguration {
    DeploymentConfiguration {
        deployment_circuit_breaker: d
            .deployment_circuit_breaker()
            .map(|b| DeploymentCircuitBreaker { enable: b.enable(), rollback: b.rollback() }),
        maximum_percent: d.maximum_percent(),
        minimum_healthy_percent: d.minimum_healthy_percent(),
    }
}

fn sdk_deployment_configuration(d: &DeploymentConfiguration) -> Result<types::DeploymentConfiguration, AwsError> {
    let breaker = d
        .deployment_circuit_breaker
        .as_ref()
        .map(|b| {
            types::DeploymentCircuitBreaker::builder()
                .enable(b.enable)
                .rollback(b.rollback)
                .build()
                .built()
        })
        .transpose()?;
    Ok(types::DeploymentConfiguration::builder()
        .set_deployment_circuit_breaker(breaker)
        .set_maximum_percent(d.maximum_percent)
        .set_minimum_healthy_percent(d.minimum_healthy_percent)
        .build())
}

fn load_balancer(l: &types::LoadBalancer) -> LoadBalancer {
    LoadBalancer {
        container_name: l.container_name().owned(),
        container_port: l.container_port(),
        load_balancer_name: l.load_balancer_name().owned(),
        target_group_arn: l.target_group_arn().owned(),
    }
}

fn sdk_load_balancer(l: &LoadBalancer) -> types::LoadBalancer {
    types::LoadBalancer::builder()
        .set_container_name(l.container_name.clone())
        .set_container_port(l.container_port)
        .set_load_balancer_name(l.load_balancer_name.clone())
        .set_target_group_arn(l.target_group_arn.clone())
        .build()
}

fn network_configuration(n: &types::NetworkConfiguration) -> NetworkConfiguration {
    NetworkConfiguration {
        awsvpc_configuration: n.awsvpc_configuration().map(|a| AwsVpcConfiguration {
            assign_public_ip: a.assign_public_ip().owned(),
            security_groups: strings(a.security_groups()),
            subnets: strings(a.subnets()),
        }),
    }
}

fn sdk_network_configuration(n: &NetworkConfiguration) -> Result<types::NetworkConfiguration, AwsError> {
    let awsvpc = n
        .awsvpc_configuration
        .as_ref()
        .map(|a| {
            types::AwsVpcConfiguration::builder()
                .set_assign_public_ip(a.assign_public_ip.as_deref().map(AssignPublicIp::from))
                .set_security_groups(non_empty(&a.security_groups))
                .set_subnets(Some(a.subnets.clone()))
                .build()
                .built()
        })
        .transpose()?;
    Ok(types::NetworkConfiguration::builder().set_awsvpc_configuration(awsvpc).build())
}

fn service(s: &types::Service) -> Service {
    Service {
        service_arn: s.service_arn().owned().unwrap_or_default(),
        service_name: s.service_name().owned().unwrap_or_default(),
        cluster_arn: s.cluster_arn().owned(),
        status: s.status().owned(),
        task_definition: s.task_definition().owned(),
        desired_count: s.desired_count(),
        running_count: s.running_count(),
        pending_count: s.pending_count(),
        launch_type: s.launch_type().owned(),
        platform_version: s.platform_version().owned(),
        scheduling_strategy: s.scheduling_strategy().owned(),
        deployment_configuration: s.deployment_configuration().map(deployment_configuration),
        network_configuration: s.network_configuration().map(network_configuration),
        load_balancers: list(s.load_balancers(), load_balancer),
        health_check_grace_period_seconds: s.health_check_grace_period_seconds(),
        enable_ecs_managed_tags: s.enable_ecs_managed_tags(),
        enable_execute_command: s.enable_execute_command(),
        propagate_tags: s.propagate_tags().owned(),
        created_at: timestamp(s.created_at()),
        tags: list(s.tags(), tag),
    }
}

// Task definitions

fn container_definition(c: &types::ContainerDefinition) -> ContainerDefinition {
    ContainerDefinition {
        name: c.name().owned().unwrap_or_default(),
        image: c.image().owned().unwrap_or_default(),
        // the service reports 0 when no container-level CPU was reserved
        cpu: c.cpu().value().filter(|cpu| *cpu != 0),
        memory: c.memory(),
        memory_reservation: c.memory_reservation(),
        essential: c.essential(),
        command: strings(c.command()),
        entry_point: strings(c.entry_point()),
        environment: list(c.environment(), key_value_pair),
        secrets: list(c.secrets(), |s| Secret {
            name: s.name().owned().unwrap_or_default(),
            value_from: s.value_from().owned().unwrap_or_default(),
        }),
        port_mappings: list(c.port_mappings(), |p| PortMapping {
            container_port: p.container_port(),
            host_port: p.host_port(),
            name: p.name().owned(),
            protocol: p.protocol().owned(),
        }),
        log_configuration: c.log_configuration().map(|l| LogConfiguration {
            log_driver: l.log_driver().owned().unwrap_or_default(),
            options: string_map(l.options()),
        }),
    }
}

fn sdk_container_definition(c: &ContainerDefinition) -> Result<types::ContainerDefinition, AwsError> {
    let secrets = try_list(&c.secrets, |s| {
        types::Secret::builder().name(&s.name).value_from(&s.value_from).build().built()
    })?;
    let log_configuration = c
        .log_configuration
        .as_ref()
        .map(|l| {
            types::LogConfiguration::builder()
                .log_driver(LogDriver::from(l.log_driver.as_str()))
                .set_options(to_hash_map(&l.options))
                .build()
                .built()
        })
        .transpose()?;
    Ok(types::ContainerDefinition::builder()
        .name(&c.name)
        .image(&c.image)
        .set_cpu(c.cpu)
        .set_memory(c.memory)
        .set_memory_reservation(c.memory_reservation)
        .set_essential(c.essential)
        .set_command(non_empty(&c.command))
        .set_entry_point(non_empty(&c.entry_point))
        .set_environment(non_empty(&c.environment).map(|env| {
            env.into_iter()
                .map(|e| types::KeyValuePair::builder().name(e.name).value(e.value).build())
                .collect()
        }))
        .set_secrets(secrets)
        .set_port_mappings(non_empty(&c.port_mappings).map(|ports| {
            ports
                .into_iter()
                .map(|p| {
                    types::PortMapping::builder()
                        .set_container_port(p.container_port)
                        .set_host_port(p.host_port)
                        .set_name(p.name)
                        .set_protocol(p.protocol.as_deref().map(TransportProtocol::from))
                        .build()
                })
                .collect()
        }))
        .set_log_configuration(log_configuration)
        .build())
}

fn task_definition(t: &types::TaskDefinition) -> TaskDefinition {
    TaskDefinition {
        task_definition_arn: t.task_definition_arn().owned().unwrap_or_default(),
        family: t.family().owned().unwrap_or_default(),
        revision: t.revision(),
        status: t.status().owned(),
        container_definitions: list(t.container_definitions(), container_definition),
        cpu: t.cpu().owned(),
        memory: t.memory().owned(),
        execution_role_arn: t.execution_role_arn().owned(),
        task_role_arn: t.task_role_arn().owned(),
        network_mode: t.network_mode().owned(),
        requires_compatibilities: list(t.requires_compatibilities(), |c| c.as_str().to_string()),
        compatibilities: list(t.compatibilities(), |c| c.as_str().to_string()),
        runtime_platform: t.runtime_platform().map(|r| RuntimePlatform {
            cpu_architecture: r.cpu_architecture().owned(),
            operating_system_family: r.operating_system_family().owned(),
        }),
        volumes: list(t.volumes(), |v| Volume {
            name: v.name().owned().unwrap_or_default(),
            host_path: v.host().and_then(|h| h.source_path().owned()),
        }),
        registered_at: timestamp(t.registered_at()),
    }
}

#[async_trait::async_trait]
impl EcsApi for EcsClient {
    async fn describe_clusters(&self, clusters: &[String]) -> Result<DescribeClustersOutput, AwsError> {
        debug!(?clusters, "DescribeClusters");
        let out = self
            .client
            .describe_clusters()
            .set_clusters(Some(clusters.to_vec()))
            .include(ClusterField::Tags)
            .include(ClusterField::Configurations)
            .include(ClusterField::Settings)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(DescribeClustersOutput { clusters: list(out.clusters(), cluster), failures: list(out.failures(), failure) })
    }

    async fn create_cluster(&self, input: CreateClusterInput) -> Result<Cluster, AwsError> {
        debug!(cluster_name = %input.cluster_name, "CreateCluster");
        let strategy = try_list(&input.default_capacity_provider_strategy, sdk_capacity_provider_strategy_item)?;
        let out = self
            .client
            .create_cluster()
            .cluster_name(&input.cluster_name)
            .set_capacity_providers(non_empty(&input.capacity_providers))
            .set_default_capacity_provider_strategy(strategy)
            .set_configuration(input.configuration.as_ref().map(sdk_cluster_configuration))
            .set_service_connect_defaults(sdk_service_connect_defaults(input.service_connect_defaults.as_ref())?)
            .set_settings(sdk_cluster_settings(&input.settings))
            .set_tags(sdk_tags(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn update_cluster(&self, input: UpdateClusterInput) -> Result<Cluster, AwsError> {
        debug!(cluster = %input.cluster, "UpdateCluster");
        let out = self
            .client
            .update_cluster()
            .cluster(&input.cluster)
            .set_configuration(input.configuration.as_ref().map(sdk_cluster_configuration))
            .set_service_connect_defaults(sdk_service_connect_defaults(input.service_connect_defaults.as_ref())?)
            .set_settings(sdk_cluster_settings(&input.settings))
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn put_cluster_capacity_providers(&self, input: PutClusterCapacityProvidersInput) -> Result<Cluster, AwsError> {
        debug!(cluster = %input.cluster, "PutClusterCapacityProviders");
        let strategy = try_list(&input.default_capacity_provider_strategy, sdk_capacity_provider_strategy_item)?;
        let out = self
            .client
            .put_cluster_capacity_providers()
            .cluster(&input.cluster)
            .set_capacity_providers(Some(input.capacity_providers))
            .set_default_capacity_provider_strategy(Some(strategy.unwrap_or_default()))
            .send()
            .await
            .map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn delete_cluster(&self, cluster_name: &str) -> Result<Cluster, AwsError> {
        debug!(cluster = cluster_name, "DeleteCluster");
        let out = self.client.delete_cluster().cluster(cluster_name).send().await.map_err(sdk_error)?;
        out.cluster().map(cluster).ok_or_else(|| missing("cluster"))
    }

    async fn describe_services(&self, cluster: Option<&str>, services: &[String]) -> Result<DescribeServicesOutput, AwsError> {
        debug!(?cluster, ?services, "DescribeServices");
        let out = self
            .client
            .describe_services()
            .set_cluster(cluster.map(str::to_string))
            .set_services(Some(services.to_vec()))
            .include(ServiceField::Tags)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(DescribeServicesOutput { services: list(out.services(), service), failures: list(out.failures(), failure) })
    }

    async fn create_service(&self, input: CreateServiceInput) -> Result<Service, AwsError> {
        debug!(service_name = %input.service_name, cluster = ?input.cluster, "CreateService");
        let deployment_configuration =
            input.deployment_configuration.as_ref().map(sdk_deployment_configuration).transpose()?;
        let network_configuration = input.network_configuration.as_ref().map(sdk_network_configuration).transpose()?;
        let out = self
            .client
            .create_service()
            .service_name(&input.service_name)
            .set_cluster(input.cluster)
            .set_task_definition(input.task_definition)
            .set_desired_count(input.desired_count)
            .set_deployment_configuration(deployment_configuration)
            .set_enable_ecs_managed_tags(input.enable_ecs_managed_tags)
            .set_enable_execute_command(input.enable_execute_command)
            .set_health_check_grace_period_seconds(input.health_check_grace_period_seconds)
            .set_launch_type(input.launch_type.as_deref().map(LaunchType::from))
            .set_load_balancers(non_empty(&input.load_balancers).map(|lbs| lbs.iter().map(sdk_load_balancer).collect()))
            .set_network_configuration(network_configuration)
            .set_platform_version(input.platform_version)
            .set_propagate_tags(input.propagate_tags.as_deref().map(PropagateTags::from))
            .set_scheduling_strategy(input.scheduling_strategy.as_deref().map(SchedulingStrategy::from))
            .set_tags(sdk_tags(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        out.service().map(service).ok_or_else(|| missing("service"))
    }

    async fn update_service(&self, input: UpdateServiceInput) -> Result<Service, AwsError> {
        debug!(service = %input.service, cluster = ?input.cluster, "UpdateService");
        let deployment_configuration =
            input.deployment_configuration.as_ref().map(sdk_deployment_configuration).transpose()?;
        let network_configuration = input.network_configuration.as_ref().map(sdk_network_configuration).transpose()?;
        let out = self
            .client
            .update_service()
            .service(&input.service)
            .set_cluster(input.cluster)
            .set_task_definition(input.task_definition)
            .set_desired_count(input.desired_count)
            .set_deployment_configuration(deployment_configuration)
            .set_enable_ecs_managed_tags(input.enable_ecs_managed_tags)
            .set_enable_execute_command(input.enable_execute_command)
            .force_new_deployment(input.force_new_deployment)
            .set_health_check_grace_period_seconds(input.health_check_grace_period_seconds)
            .set_load_balancers(non_empty(&input.load_balancers).map(|lbs| lbs.iter().map(sdk_load_balancer).collect()))
            .set_network_configuration(network_configuration)
            .set_platform_version(input.platform_version)
            .set_propagate_tags(input.propagate_tags.as_deref().map(PropagateTags::from))
            .send()
            .await
            .map_err(sdk_error)?;
        out.service().map(service).ok_or_else(|| missing("service"))
    }

    async fn delete_service(&self, cluster: Option<&str>, service_name: &str, force: bool) -> Result<Service, AwsError> {
        debug!(?cluster, service = service_name, force, "DeleteService");
        let out = self
            .client
            .delete_service()
            .set_cluster(cluster.map(str::to_string))
            .service(service_name)
            .force(force)
            .send()
            .await
            .map_err(sdk_error)?;
        out.service().map(service).ok_or_else(|| missing("service"))
    }

    async fn describe_task_definition(&self, task_definition_arn: &str) -> Result<DescribeTaskDefinitionOutput, AwsError> {
        debug!(task_definition = task_definition_arn, "DescribeTaskDefinition");
        let out = self
            .client
            .describe_task_definition()
            .task_definition(task_definition_arn)
            .include(TaskDefinitionField::Tags)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(DescribeTaskDefinitionOutput {
            task_definition: out.task_definition().map(task_definition).ok_or_else(|| missing("task definition"))?,
            tags: list(out.tags(), tag),
        })
    }

    async fn register_task_definition(&self, input: RegisterTaskDefinitionInput) -> Result<DescribeTaskDefinitionOutput, AwsError> {
        debug!(family = %input.family, "RegisterTaskDefinition");
        let containers = try_list(&input.container_definitions, sdk_container_definition)?;
        let out = self
            .client
            .register_task_definition()
            .family(&input.family)
            .set_container_definitions(Some(containers.unwrap_or_default()))
            .set_cpu(input.cpu)
            .set_memory(input.memory)
            .set_execution_role_arn(input.execution_role_arn)
            .set_task_role_arn(input.task_role_arn)
            .set_network_mode(input.network_mode.as_deref().map(NetworkMode::from))
            .set_requires_compatibilities(
                non_empty(&input.requires_compatibilities)
                    .map(|c| c.iter().map(|c| Compatibility::from(c.as_str())).collect()),
            )
            .set_runtime_platform(input.runtime_platform.as_ref().map(|r| {
                types::RuntimePlatform::builder()
                    .set_cpu_architecture(r.cpu_architecture.as_deref().map(CpuArchitecture::from))
                    .set_operating_system_family(r.operating_system_family.as_deref().map(OsFamily::from))
                    .build()
            }))
            .set_volumes(non_empty(&input.volumes).map(|volumes| {
                volumes
                    .into_iter()
                    .map(|v| {
                        types::Volume::builder()
                            .name(v.name)
                            .set_host(
                                v.host_path
                                    .map(|p| types::HostVolumeProperties::builder().source_path(p).build()),
                            )
                            .build()
                    })
                    .collect()
            }))
            .set_tags(sdk_tags(&input.tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(DescribeTaskDefinitionOutput {
            task_definition: out.task_definition().map(task_definition).ok_or_else(|| missing("task definition"))?,
            tags: list(out.tags(), tag),
        })
    }

    async fn deregister_task_definition(&self, task_definition_arn: &str) -> Result<TaskDefinition, AwsError> {
        debug!(task_definition = task_definition_arn, "DeregisterTaskDefinition");
        let out = self
            .client
            .deregister_task_definition()
            .task_definition(task_definition_arn)
            .send()
            .await
            .map_err(sdk_error)?;
        out.task_definition().map(task_definition).ok_or_else(|| missing("task definition"))
    }

    async fn tag_resource(&self, resource_arn: &str, tags: Vec<Tag>) -> Result<(), AwsError> {
        debug!(resource_arn, count = tags.len(), "TagResource");
        self.client
            .tag_resource()
            .resource_arn(resource_arn)
            .set_tags(sdk_tags(&tags))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn untag_resource(&self, resource_arn: &str, tag_keys: Vec<String>) -> Result<(), AwsError> {
        debug!(resource_arn, count = tag_keys.len(), "UntagResource");
        self.client
            .untag_resource()
            .resource_arn(resource_arn)
            .set_tag_keys(Some(tag_keys))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
