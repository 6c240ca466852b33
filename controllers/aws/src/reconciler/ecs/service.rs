//! Service reconciler
//!
//! The record name is the service name. `cluster` and `taskDefinition` are
//! usually filled from Cluster and TaskDefinition records, using the ARNs
//! those records observed.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::ecs as wire;
use aws_client::{AwsError, EcsApi};
use crds::Managed;
use crds::ecs::{
    AwsVpcConfiguration, Cluster, DeploymentCircuitBreaker, DeploymentConfiguration, LoadBalancer,
    NetworkConfiguration, Service, ServiceObservation, ServiceParameters, TaskDefinition,
};

use super::{is_not_found, normalize_tags, sync_tags, tags_from_wire, tags_to_wire};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ReferenceSite, ServiceClients};

/// Capability set of the ECS Service kind
pub struct ServiceExternal {
    client: Arc<dyn EcsApi>,
}

fn cluster_arn(cluster: &Cluster) -> Option<String> {
    cluster.at_provider().and_then(|o| o.cluster_arn.clone())
}

fn task_definition_arn(task_definition: &TaskDefinition) -> Option<String> {
    task_definition.at_provider().and_then(|o| o.task_definition_arn.clone())
}

fn deployment_configuration_to_wire(config: &DeploymentConfiguration) -> wire::DeploymentConfiguration {
    wire::DeploymentConfiguration {
        deployment_circuit_breaker: config
            .deployment_circuit_breaker
            .as_ref()
            .map(|b| wire::DeploymentCircuitBreaker {
                enable: b.enable,
                rollback: b.rollback,
            }),
        maximum_percent: config.maximum_percent,
        minimum_healthy_percent: config.minimum_healthy_percent,
    }
}

fn deployment_configuration_from_wire(config: &wire::DeploymentConfiguration) -> DeploymentConfiguration {
    DeploymentConfiguration {
        deployment_circuit_breaker: config
            .deployment_circuit_breaker
            .as_ref()
            .map(|b| DeploymentCircuitBreaker {
                enable: b.enable,
                rollback: b.rollback,
            }),
        maximum_percent: config.maximum_percent,
        minimum_healthy_percent: config.minimum_healthy_percent,
    }
}

fn load_balancers_to_wire(items: &[LoadBalancer]) -> Vec<wire::LoadBalancer> {
    items
        .iter()
        .map(|lb| wire::LoadBalancer {
            container_name: lb.container_name.clone(),
            container_port: lb.container_port,
            load_balancer_name: lb.load_balancer_name.clone(),
            target_group_arn: lb.target_group_arn.clone(),
        })
        .collect()
}

fn load_balancers_from_wire(items: &[wire::LoadBalancer]) -> Vec<LoadBalancer> {
    let mut items: Vec<LoadBalancer> = items
        .iter()
        .map(|lb| LoadBalancer {
            container_name: lb.container_name.clone(),
            container_port: lb.container_port,
            load_balancer_name: lb.load_balancer_name.clone(),
            target_group_arn: lb.target_group_arn.clone(),
        })
        .collect();
    sort_set(&mut items);
    items
}

fn network_to_wire(config: &NetworkConfiguration) -> wire::NetworkConfiguration {
    wire::NetworkConfiguration {
        awsvpc_configuration: config.awsvpc_configuration.as_ref().map(|v| wire::AwsVpcConfiguration {
            assign_public_ip: v.assign_public_ip.clone(),
            security_groups: v.security_groups.clone(),
            subnets: v.subnets.clone(),
        }),
    }
}

/// Subnets and security groups are sets
fn network_from_wire(config: &wire::NetworkConfiguration) -> NetworkConfiguration {
    NetworkConfiguration {
        awsvpc_configuration: config.awsvpc_configuration.as_ref().map(|v| {
            let mut vpc = AwsVpcConfiguration {
                assign_public_ip: v.assign_public_ip.clone(),
                security_groups: v.security_groups.clone(),
                subnets: v.subnets.clone(),
            };
            sort_set(&mut vpc.security_groups);
            sort_set(&mut vpc.subnets);
            vpc
        }),
    }
}

/// Whether `observed` names the same task definition as `desired`, which may
/// be a full ARN or a `family:revision` suffix of one
fn same_task_definition(desired: &str, observed: &str) -> bool {
    desired == observed || observed.ends_with(&format!("/{desired}"))
}

#[async_trait]
impl ExternalResource for ServiceExternal {
    type Resource = Service;
    type Response = wire::DescribeServicesOutput;
    type Observed = wire::Service;
    type CreateInput = wire::CreateServiceInput;
    type Created = wire::Service;
    type UpdateInput = wire::UpdateServiceInput;
    type Updated = wire::Service;
    type DeleteInput = (Option<String>, String);

    const KIND: &'static str = "Service";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("ACTIVE", LifecycleState::Available),
        ("DRAINING", LifecycleState::Deleting),
        ("INACTIVE", LifecycleState::Absent),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.ecs),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<ServiceParameters>> {
        vec![
            ReferenceSite::single::<Cluster>(
                "cluster",
                |p| &mut p.cluster,
                |p| &mut p.cluster_ref,
                |p| p.cluster_selector.as_ref(),
                cluster_arn,
            ),
            ReferenceSite::single::<TaskDefinition>(
                "taskDefinition",
                |p| &mut p.task_definition,
                |p| &mut p.task_definition_ref,
                |p| p.task_definition_selector.as_ref(),
                task_definition_arn,
            ),
        ]
    }

    async fn describe(&self, cr: &Service, external_name: &str) -> Result<wire::DescribeServicesOutput, AwsError> {
        self.client
            .describe_services(cr.for_provider().cluster.as_deref(), &[external_name.to_string()])
            .await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, external_name: &str, response: wire::DescribeServicesOutput) -> Option<wire::Service> {
        response
            .services
            .into_iter()
            .find(|s| s.service_name == external_name || s.service_arn == external_name)
    }

    fn observed_status<'a>(&self, observed: &'a wire::Service) -> Option<&'a str> {
        observed.status.as_deref()
    }

    fn late_initialize(&self, params: &mut ServiceParameters, observed: &wire::Service) {
        if params.launch_type.is_none() {
            params.launch_type = observed.launch_type.clone();
        }
        if params.scheduling_strategy.is_none() {
            params.scheduling_strategy = observed.scheduling_strategy.clone();
        }
        if params.desired_count.is_none() {
            params.desired_count = Some(observed.desired_count);
        }
    }

    fn generate_observation(&self, observed: &wire::Service) -> ServiceObservation {
        ServiceObservation {
            service_arn: Some(observed.service_arn.clone()),
            service_name: Some(observed.service_name.clone()),
            cluster_arn: observed.cluster_arn.clone(),
            status: observed.status.clone(),
            task_definition: observed.task_definition.clone(),
            running_count: observed.running_count,
            pending_count: observed.pending_count,
            created_at: observed.created_at,
        }
    }

    fn immutable_violation(&self, cr: &Service, observed: &wire::Service) -> Option<String> {
        let desired = cr.for_provider();
        if let Some(launch_type) = &desired.launch_type
            && observed.launch_type.as_ref() != Some(launch_type)
        {
            return Some(format!(
                "spec.forProvider.launchType cannot change from {:?} to {:?}",
                observed.launch_type, launch_type
            ));
        }
        if let Some(strategy) = &desired.scheduling_strategy
            && observed.scheduling_strategy.as_ref() != Some(strategy)
        {
            return Some(format!(
                "spec.forProvider.schedulingStrategy cannot change from {:?} to {:?}",
                observed.scheduling_strategy, strategy
            ));
        }
        None
    }

    fn is_up_to_date(&self, cr: &Service, observed: &wire::Service) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        sort_set(&mut desired.load_balancers);
        normalize_tags(&mut desired.tags);
        if let Some(vpc) = desired
            .network_configuration
            .as_mut()
            .and_then(|n| n.awsvpc_configuration.as_mut())
        {
            sort_set(&mut vpc.security_groups);
            sort_set(&mut vpc.subnets);
        }

        let task_definition = match (&desired.task_definition, &observed.task_definition) {
            (Some(want), Some(have)) if same_task_definition(want, have) => Some(want.clone()),
            (Some(_), have) => have.clone(),
            (None, _) => None,
        };
        let current = ServiceParameters {
            task_definition,
            desired_count: when_set(&desired.desired_count, Some(observed.desired_count)),
            deployment_configuration: when_set(
                &desired.deployment_configuration,
                observed
                    .deployment_configuration
                    .as_ref()
                    .map(deployment_configuration_from_wire),
            ),
            enable_ecs_managed_tags: when_set(&desired.enable_ecs_managed_tags, Some(observed.enable_ecs_managed_tags)),
            enable_execute_command: when_set(&desired.enable_execute_command, Some(observed.enable_execute_command)),
            health_check_grace_period_seconds: when_set(
                &desired.health_check_grace_period_seconds,
                observed.health_check_grace_period_seconds,
            ),
            load_balancers: load_balancers_from_wire(&observed.load_balancers),
            network_configuration: when_set(
                &desired.network_configuration,
                observed.network_configuration.as_ref().map(network_from_wire),
            ),
            platform_version: when_set(&desired.platform_version, observed.platform_version.clone()),
            propagate_tags: when_set(&desired.propagate_tags, observed.propagate_tags.clone()),
            tags: tags_from_wire(&observed.tags),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Service, external_name: &str) -> Result<wire::CreateServiceInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateServiceInput {
            cluster: p.cluster.clone(),
            service_name: external_name.to_string(),
            task_definition: p.task_definition.clone(),
            desired_count: p.desired_count,
            deployment_configuration: p
                .deployment_configuration
                .as_ref()
                .map(deployment_configuration_to_wire),
            enable_ecs_managed_tags: p.enable_ecs_managed_tags,
            enable_execute_command: p.enable_execute_command,
            health_check_grace_period_seconds: p.health_check_grace_period_seconds,
            launch_type: p.launch_type.clone(),
            load_balancers: load_balancers_to_wire(&p.load_balancers),
            network_configuration: p.network_configuration.as_ref().map(network_to_wire),
            platform_version: p.platform_version.clone(),
            propagate_tags: p.propagate_tags.clone(),
            scheduling_strategy: p.scheduling_strategy.clone(),
            tags: tags_to_wire(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateServiceInput) -> Result<wire::Service, AwsError> {
        self.client.create_service(input).await
    }

    fn update_input(&self, cr: &Service, external_name: &str) -> Result<wire::UpdateServiceInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateServiceInput {
            cluster: p.cluster.clone(),
            service: external_name.to_string(),
            task_definition: p.task_definition.clone(),
            desired_count: p.desired_count,
            deployment_configuration: p
                .deployment_configuration
                .as_ref()
                .map(deployment_configuration_to_wire),
            enable_ecs_managed_tags: p.enable_ecs_managed_tags,
            enable_execute_command: p.enable_execute_command,
            force_new_deployment: p.force_new_deployment.unwrap_or_default(),
            health_check_grace_period_seconds: p.health_check_grace_period_seconds,
            load_balancers: load_balancers_to_wire(&p.load_balancers),
            network_configuration: p.network_configuration.as_ref().map(network_to_wire),
            platform_version: p.platform_version.clone(),
            propagate_tags: p.propagate_tags.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateServiceInput) -> Result<wire::Service, AwsError> {
        self.client.update_service(input).await
    }

    async fn post_update(&self, cr: &mut Service, _external_name: &str, updated: wire::Service) -> Result<(), ControllerError> {
        sync_tags(self.client.as_ref(), Self::KIND, &updated.service_arn, &cr.for_provider().tags, &updated.tags).await?;
        Ok(())
    }

    fn delete_input(&self, cr: &Service, external_name: &str) -> Result<Option<(Option<String>, String)>, ControllerError> {
        Ok(Some((cr.for_provider().cluster.clone(), external_name.to_string())))
    }

    /// Forced, so a service that still has running tasks is drained rather than refused
    async fn delete(&self, (cluster, service_name): (Option<String>, String)) -> Result<(), AwsError> {
        self.client
            .delete_service(cluster.as_deref(), &service_name, true)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace, with_observation};
    use aws_client::MockAwsClient;
    use crds::ecs::{ClusterObservation, ClusterParameters, ClusterSpec, ServiceSpec};
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, Reference, external_name, find_condition, set_external_name};

    const CLUSTER_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:cluster/prod";

    fn mock_with_cluster() -> MockAwsClient {
        let mock = MockAwsClient::new();
        mock.add_ecs_cluster(wire::Cluster {
            cluster_arn: CLUSTER_ARN.to_string(),
            cluster_name: "prod".to_string(),
            status: Some("ACTIVE".to_string()),
            ..Default::default()
        });
        mock
    }

    fn cluster_record() -> Cluster {
        let spec = ClusterSpec {
            for_provider: ClusterParameters {
                region: REGION.to_string(),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        let cluster = in_namespace(Cluster::new("prod", spec), NAMESPACE);
        with_observation(
            cluster,
            ClusterObservation {
                cluster_arn: Some(CLUSTER_ARN.to_string()),
                ..Default::default()
            },
        )
    }

    fn service() -> Service {
        let spec = ServiceSpec {
            for_provider: ServiceParameters {
                region: REGION.to_string(),
                cluster: Some(CLUSTER_ARN.to_string()),
                task_definition: Some("web:3".to_string()),
                desired_count: Some(2),
                launch_type: Some("FARGATE".to_string()),
                network_configuration: Some(NetworkConfiguration {
                    awsvpc_configuration: Some(AwsVpcConfiguration {
                        assign_public_ip: Some("DISABLED".to_string()),
                        security_groups: vec!["sg-1".to_string()],
                        subnets: vec!["subnet-b".to_string(), "subnet-a".to_string()],
                    }),
                }),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Service::new("web", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_cluster_reference_fills_arn_before_create() {
        let mock = mock_with_cluster();
        let reader = MemoryReader::new().with(&cluster_record());
        let client = external::<ServiceExternal>(&mock);
        let mut cr = service();
        cr.spec.for_provider.cluster = None;
        cr.spec.for_provider.cluster_ref = Some(Reference::new("prod"));

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(cr.spec.for_provider.cluster.as_deref(), Some(CLUSTER_ARN));
        assert_eq!(external_name(&cr), "web");
        assert_eq!(mock.calls(), vec!["CreateService".to_string()]);
        let created = mock.ecs_service("prod", "web").unwrap();
        assert_eq!(created.cluster_arn.as_deref(), Some(CLUSTER_ARN));
        assert_eq!(created.task_definition.as_deref(), Some("web:3"));
    }

    #[tokio::test]
    async fn test_create_then_up_to_date() {
        let mock = mock_with_cluster();
        let client = external::<ServiceExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = service();

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.spec.for_provider.scheduling_strategy.as_deref(), Some("REPLICA"));
        let ready = find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason);
        assert_eq!(ready, Some(ConditionReason::Available));
    }

    #[tokio::test]
    async fn test_missing_service_is_absent() {
        let mock = mock_with_cluster();
        let client = external::<ServiceExternal>(&mock);
        let mut cr = service();
        set_external_name(&mut cr, "web");

        assert!(!client.observe(&mut cr).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn test_desired_count_change_updates() {
        let mock = mock_with_cluster();
        let client = external::<ServiceExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = service();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.desired_count = Some(5);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.ecs_service("prod", "web").unwrap().desired_count, 5);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_launch_type_change_is_rejected() {
        let mock = mock_with_cluster();
        let client = external::<ServiceExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = service();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.launch_type = Some("EC2".to_string());
        let err = tick(&client, &reader, &mut cr, false).await.unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(mock.call_count("UpdateService"), 0);
    }

    #[tokio::test]
    async fn test_delete_drains_scaled_service() {
        let mock = mock_with_cluster();
        let client = external::<ServiceExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = service();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert_eq!(mock.ecs_service("prod", "web").unwrap().status.as_deref(), Some("DRAINING"));
    }

    #[test]
    fn test_same_task_definition_accepts_arn_suffix() {
        let arn = "arn:aws:ecs:us-east-1:123456789012:task-definition/web:3";
        assert!(same_task_definition("web:3", arn));
        assert!(same_task_definition(arn, arn));
        assert!(!same_task_definition("web:2", arn));
    }
}
