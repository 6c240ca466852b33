//! TaskDefinition reconciler
//!
//! Task definitions are immutable revisions. The record's external name is the
//! ARN of the revision in use; an update registers the next revision, moves
//! the external name to it and deregisters the one it replaces.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::ecs as wire;
use aws_client::{AwsError, EcsApi};
use crds::ecs::{
    ContainerDefinition, LogConfiguration, PortMapping, RuntimePlatform, Secret, TaskDefinition,
    TaskDefinitionObservation, TaskDefinitionParameters, Volume,
};
use crds::{Managed, set_external_name};
use tracing::{info, warn};

use super::{normalize_tags, pairs_from_wire, pairs_to_wire, tags_from_wire, tags_to_wire};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ServiceClients};

const CLIENT_EXCEPTION: &str = "ClientException";
const NOT_FOUND_MESSAGE: &str = "Unable to describe task definition";

/// Capability set of the ECS TaskDefinition kind
pub struct TaskDefinitionExternal {
    client: Arc<dyn EcsApi>,
}

fn container_to_wire(c: &ContainerDefinition) -> wire::ContainerDefinition {
    wire::ContainerDefinition {
        name: c.name.clone(),
        image: c.image.clone(),
        cpu: c.cpu,
        memory: c.memory,
        memory_reservation: c.memory_reservation,
        essential: c.essential,
        command: c.command.clone(),
        entry_point: c.entry_point.clone(),
        environment: pairs_to_wire(&c.environment),
        secrets: c
            .secrets
            .iter()
            .map(|s| wire::Secret {
                name: s.name.clone(),
                value_from: s.value_from.clone(),
            })
            .collect(),
        port_mappings: c
            .port_mappings
            .iter()
            .map(|p| wire::PortMapping {
                container_port: p.container_port,
                host_port: p.host_port,
                name: p.name.clone(),
                protocol: p.protocol.clone(),
            })
            .collect(),
        log_configuration: c.log_configuration.as_ref().map(|l| wire::LogConfiguration {
            log_driver: l.log_driver.clone(),
            options: l.options.clone(),
        }),
    }
}

/// Observed container restricted to the optional fields set in `desired`
///
/// Environment, secrets and port mappings are compared as sets.
fn container_from_wire(desired: Option<&ContainerDefinition>, c: &wire::ContainerDefinition) -> ContainerDefinition {
    let desired = desired.cloned().unwrap_or_default();
    let mut secrets: Vec<Secret> = c
        .secrets
        .iter()
        .map(|s| Secret {
            name: s.name.clone(),
            value_from: s.value_from.clone(),
        })
        .collect();
    sort_set(&mut secrets);
    let mut port_mappings: Vec<PortMapping> = c
        .port_mappings
        .iter()
        .map(|p| {
            let wanted = desired_mapping(&desired, p.container_port).cloned().unwrap_or_default();
            PortMapping {
                container_port: p.container_port,
                host_port: when_set(&wanted.host_port, p.host_port),
                name: when_set(&wanted.name, p.name.clone()),
                protocol: when_set(&wanted.protocol, p.protocol.clone()),
            }
        })
        .collect();
    sort_set(&mut port_mappings);
    ContainerDefinition {
        name: c.name.clone(),
        image: c.image.clone(),
        cpu: when_set(&desired.cpu, c.cpu),
        memory: when_set(&desired.memory, c.memory),
        memory_reservation: when_set(&desired.memory_reservation, c.memory_reservation),
        essential: when_set(&desired.essential, c.essential),
        command: c.command.clone(),
        entry_point: c.entry_point.clone(),
        environment: pairs_from_wire(&c.environment),
        secrets,
        port_mappings,
        log_configuration: c.log_configuration.as_ref().map(|l| LogConfiguration {
            log_driver: l.log_driver.clone(),
            options: l.options.clone(),
        }),
    }
}

/// Mapping the user asked for on a container port
///
/// AWS fills in the host port for awsvpc and defaults the protocol to `tcp`.
fn desired_mapping(desired: &ContainerDefinition, container_port: Option<i32>) -> Option<&PortMapping> {
    desired.port_mappings.iter().find(|p| p.container_port == container_port)
}

fn normalize(params: &mut TaskDefinitionParameters) {
    for container in &mut params.container_definitions {
        sort_set(&mut container.environment);
        sort_set(&mut container.secrets);
        sort_set(&mut container.port_mappings);
    }
    sort_set(&mut params.requires_compatibilities);
    sort_set(&mut params.volumes);
    normalize_tags(&mut params.tags);
}

fn register_input(p: &TaskDefinitionParameters) -> wire::RegisterTaskDefinitionInput {
    wire::RegisterTaskDefinitionInput {
        family: p.family.clone(),
        container_definitions: p.container_definitions.iter().map(container_to_wire).collect(),
        cpu: p.cpu.clone(),
        memory: p.memory.clone(),
        execution_role_arn: p.execution_role_arn.clone(),
        task_role_arn: p.task_role_arn.clone(),
        network_mode: p.network_mode.clone(),
        requires_compatibilities: p.requires_compatibilities.clone(),
        runtime_platform: p.runtime_platform.as_ref().map(|r| wire::RuntimePlatform {
            cpu_architecture: r.cpu_architecture.clone(),
            operating_system_family: r.operating_system_family.clone(),
        }),
        volumes: p
            .volumes
            .iter()
            .map(|v| wire::Volume {
                name: v.name.clone(),
                host_path: v.host_path.clone(),
            })
            .collect(),
        tags: tags_to_wire(&p.tags),
    }
}

#[async_trait]
impl ExternalResource for TaskDefinitionExternal {
    type Resource = TaskDefinition;
    type Response = wire::DescribeTaskDefinitionOutput;
    type Observed = wire::DescribeTaskDefinitionOutput;
    type CreateInput = wire::RegisterTaskDefinitionInput;
    type Created = wire::DescribeTaskDefinitionOutput;
    /// The next revision and the ARN it replaces
    type UpdateInput = (wire::RegisterTaskDefinitionInput, String);
    type Updated = wire::DescribeTaskDefinitionOutput;
    type DeleteInput = String;

    const KIND: &'static str = "TaskDefinition";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("ACTIVE", LifecycleState::Available),
        ("DELETE_IN_PROGRESS", LifecycleState::Deleting),
        ("INACTIVE", LifecycleState::Absent),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.ecs),
        }
    }

    async fn describe(&self, _cr: &TaskDefinition, external_name: &str) -> Result<wire::DescribeTaskDefinitionOutput, AwsError> {
        self.client.describe_task_definition(external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        err.is_code_with_message(CLIENT_EXCEPTION, NOT_FOUND_MESSAGE)
    }

    fn filter_list(
        &self,
        _external_name: &str,
        response: wire::DescribeTaskDefinitionOutput,
    ) -> Option<wire::DescribeTaskDefinitionOutput> {
        Some(response)
    }

    fn observed_status<'a>(&self, observed: &'a wire::DescribeTaskDefinitionOutput) -> Option<&'a str> {
        observed.task_definition.status.as_deref()
    }

    fn late_initialize(&self, params: &mut TaskDefinitionParameters, observed: &wire::DescribeTaskDefinitionOutput) {
        if params.network_mode.is_none() {
            params.network_mode = observed.task_definition.network_mode.clone();
        }
    }

    fn generate_observation(&self, observed: &wire::DescribeTaskDefinitionOutput) -> TaskDefinitionObservation {
        let td = &observed.task_definition;
        TaskDefinitionObservation {
            task_definition_arn: Some(td.task_definition_arn.clone()),
            family: Some(td.family.clone()),
            revision: td.revision,
            status: td.status.clone(),
            compatibilities: td.compatibilities.clone(),
            registered_at: td.registered_at,
        }
    }

    fn is_up_to_date(
        &self,
        cr: &TaskDefinition,
        observed: &wire::DescribeTaskDefinitionOutput,
    ) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        normalize(&mut desired);

        let td = &observed.task_definition;
        let mut current = TaskDefinitionParameters {
            family: td.family.clone(),
            container_definitions: td
                .container_definitions
                .iter()
                .map(|c| {
                    let wanted = desired.container_definitions.iter().find(|d| d.name == c.name);
                    container_from_wire(wanted, c)
                })
                .collect(),
            cpu: when_set(&desired.cpu, td.cpu.clone()),
            memory: when_set(&desired.memory, td.memory.clone()),
            execution_role_arn: td.execution_role_arn.clone(),
            task_role_arn: td.task_role_arn.clone(),
            network_mode: when_set(&desired.network_mode, td.network_mode.clone()),
            requires_compatibilities: td.requires_compatibilities.clone(),
            runtime_platform: when_set(
                &desired.runtime_platform,
                td.runtime_platform.as_ref().map(|r| RuntimePlatform {
                    cpu_architecture: r.cpu_architecture.clone(),
                    operating_system_family: r.operating_system_family.clone(),
                }),
            ),
            volumes: td
                .volumes
                .iter()
                .map(|v| Volume {
                    name: v.name.clone(),
                    host_path: v.host_path.clone(),
                })
                .collect(),
            tags: tags_from_wire(&observed.tags),
            ..desired.clone()
        };
        normalize(&mut current);
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &TaskDefinition, _external_name: &str) -> Result<wire::RegisterTaskDefinitionInput, ControllerError> {
        Ok(register_input(cr.for_provider()))
    }

    async fn create(&self, input: wire::RegisterTaskDefinitionInput) -> Result<wire::DescribeTaskDefinitionOutput, AwsError> {
        self.client.register_task_definition(input).await
    }

    fn assigned_id(&self, created: &wire::DescribeTaskDefinitionOutput) -> Option<String> {
        Some(created.task_definition.task_definition_arn.clone())
    }

    fn update_input(
        &self,
        cr: &TaskDefinition,
        external_name: &str,
    ) -> Result<(wire::RegisterTaskDefinitionInput, String), ControllerError> {
        Ok((register_input(cr.for_provider()), external_name.to_string()))
    }

    /// The previous revision is deregistered on a best-effort basis; a failure
    /// leaves it ACTIVE and is not retried
    async fn update(
        &self,
        (input, previous): (wire::RegisterTaskDefinitionInput, String),
    ) -> Result<wire::DescribeTaskDefinitionOutput, AwsError> {
        let registered = self.client.register_task_definition(input).await?;
        let arn = &registered.task_definition.task_definition_arn;
        info!(previous = %previous, current = %arn, "Registered task definition revision");
        if let Err(e) = self.client.deregister_task_definition(&previous).await {
            warn!(arn = %previous, error = %e, "Failed to deregister previous task definition revision");
        }
        Ok(registered)
    }

    async fn post_update(
        &self,
        cr: &mut TaskDefinition,
        _external_name: &str,
        updated: wire::DescribeTaskDefinitionOutput,
    ) -> Result<(), ControllerError> {
        set_external_name(cr, updated.task_definition.task_definition_arn);
        Ok(())
    }

    fn delete_input(&self, _cr: &TaskDefinition, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, arn: String) -> Result<(), AwsError> {
        self.client.deregister_task_definition(&arn).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::ecs::{KeyValuePair, TaskDefinitionSpec};
    use crds::{DeletionPolicy, Tag, external_name};

    const WEB_1: &str = "arn:aws:ecs:us-east-1:123456789012:task-definition/web:1";

    fn container(image: &str) -> ContainerDefinition {
        ContainerDefinition {
            name: "app".to_string(),
            image: image.to_string(),
            essential: Some(true),
            environment: vec![KeyValuePair::new("PORT", "8080"), KeyValuePair::new("LOG_LEVEL", "info")],
            port_mappings: vec![PortMapping {
                container_port: Some(8080),
                protocol: Some("tcp".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn task_definition(tags: Vec<Tag>) -> TaskDefinition {
        let spec = TaskDefinitionSpec {
            for_provider: TaskDefinitionParameters {
                region: REGION.to_string(),
                family: "web".to_string(),
                container_definitions: vec![container("nginx:1.25")],
                cpu: Some("256".to_string()),
                memory: Some("512".to_string()),
                network_mode: Some("awsvpc".to_string()),
                requires_compatibilities: vec!["FARGATE".to_string()],
                tags,
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(TaskDefinition::new("web", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_tag_order_is_not_drift() {
        let mock = MockAwsClient::new();
        mock.add_task_definition(
            wire::TaskDefinition {
                task_definition_arn: WEB_1.to_string(),
                family: "web".to_string(),
                revision: 1,
                status: Some("ACTIVE".to_string()),
                container_definitions: vec![container_to_wire(&container("nginx:1.25"))],
                cpu: Some("256".to_string()),
                memory: Some("512".to_string()),
                network_mode: Some("awsvpc".to_string()),
                requires_compatibilities: vec!["FARGATE".to_string()],
                ..Default::default()
            },
            vec![aws_client::Tag::new("a", "1"), aws_client::Tag::new("b", "2")],
        );
        let client = external::<TaskDefinitionExternal>(&mock);
        let mut cr = task_definition(vec![Tag::new("b", "2"), Tag::new("a", "1")]);
        set_external_name(&mut cr, WEB_1);

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(observation.resource_up_to_date);
        assert_eq!(observation.diff, "");
    }

    #[tokio::test]
    async fn test_port_mapping_defaults_are_not_drift() {
        let mut observed = container_to_wire(&container("nginx:1.25"));
        observed.port_mappings[0].host_port = Some(8080);
        let mock = MockAwsClient::new();
        mock.add_task_definition(
            wire::TaskDefinition {
                task_definition_arn: WEB_1.to_string(),
                family: "web".to_string(),
                revision: 1,
                status: Some("ACTIVE".to_string()),
                container_definitions: vec![observed],
                cpu: Some("256".to_string()),
                memory: Some("512".to_string()),
                network_mode: Some("awsvpc".to_string()),
                requires_compatibilities: vec!["FARGATE".to_string()],
                ..Default::default()
            },
            Vec::new(),
        );
        let client = external::<TaskDefinitionExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = task_definition(Vec::new());
        let app = &mut cr.spec.for_provider.container_definitions[0];
        app.essential = None;
        app.port_mappings[0].protocol = None;
        set_external_name(&mut cr, WEB_1);

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(mock.call_count("RegisterTaskDefinition"), 0);
    }

    #[tokio::test]
    async fn test_create_assigns_revision_arn() {
        let mock = MockAwsClient::new();
        let client = external::<TaskDefinitionExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = task_definition(vec![Tag::new("env", "prod")]);

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), WEB_1);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.at_provider().unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_update_registers_next_revision_and_deregisters_previous() {
        let mock = MockAwsClient::new();
        let client = external::<TaskDefinitionExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = task_definition(Vec::new());
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.container_definitions = vec![container("nginx:1.27")];
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        let web_2 = "arn:aws:ecs:us-east-1:123456789012:task-definition/web:2";
        assert_eq!(external_name(&cr), web_2);
        assert_eq!(mock.task_definition(WEB_1).unwrap().status.as_deref(), Some("INACTIVE"));
        assert_eq!(mock.task_definition(web_2).unwrap().container_definitions[0].image, "nginx:1.27");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_deregister_failure_does_not_fail_update() {
        let mock = MockAwsClient::new();
        let client = external::<TaskDefinitionExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = task_definition(Vec::new());
        tick(&client, &reader, &mut cr, false).await.unwrap();

        mock.fail_next("DeregisterTaskDefinition", AwsError::service("ServerException", "boom"));
        cr.spec.for_provider.memory = Some("1024".to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert!(external_name(&cr).ends_with("task-definition/web:2"));
        assert_eq!(mock.task_definition(WEB_1).unwrap().status.as_deref(), Some("ACTIVE"));
    }

    #[tokio::test]
    async fn test_deregistered_revision_is_released() {
        let mock = MockAwsClient::new();
        let client = external::<TaskDefinitionExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = task_definition(Vec::new());
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
    }

    #[tokio::test]
    async fn test_unknown_arn_is_absent() {
        let mock = MockAwsClient::new();
        let client = external::<TaskDefinitionExternal>(&mock);
        let mut cr = task_definition(Vec::new());
        set_external_name(&mut cr, WEB_1);

        assert!(!client.observe(&mut cr).await.unwrap().resource_exists);
    }
}
