//! Cluster reconciler
//!
//! A deleted cluster stays visible as `INACTIVE`; the status table maps it to
//! absent so the next pass creates it again under the same name.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::ecs as wire;
use aws_client::{AwsError, EcsApi};
use crds::Managed;
use crds::ecs::{
    CapacityProviderStrategyItem, Cluster, ClusterConfiguration, ClusterObservation, ClusterParameters,
    ExecuteCommandConfiguration, ServiceConnectDefaults,
};

use super::{is_not_found, normalize_tags, pairs_from_wire, pairs_to_wire, sync_tags, tags_from_wire, tags_to_wire};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ServiceClients};

/// Capability set of the ECS Cluster kind
pub struct ClusterExternal {
    client: Arc<dyn EcsApi>,
}

fn strategy_to_wire(items: &[CapacityProviderStrategyItem]) -> Vec<wire::CapacityProviderStrategyItem> {
    items
        .iter()
        .map(|i| wire::CapacityProviderStrategyItem {
            capacity_provider: i.capacity_provider.clone(),
            base: i.base,
            weight: i.weight,
        })
        .collect()
}

fn strategy_from_wire(items: &[wire::CapacityProviderStrategyItem]) -> Vec<CapacityProviderStrategyItem> {
    let mut items: Vec<CapacityProviderStrategyItem> = items
        .iter()
        .map(|i| CapacityProviderStrategyItem {
            capacity_provider: i.capacity_provider.clone(),
            base: i.base,
            weight: i.weight,
        })
        .collect();
    sort_set(&mut items);
    items
}

fn configuration_to_wire(config: &ClusterConfiguration) -> wire::ClusterConfiguration {
    wire::ClusterConfiguration {
        execute_command_configuration: config.execute_command_configuration.as_ref().map(|e| {
            wire::ExecuteCommandConfiguration {
                kms_key_id: e.kms_key_id.clone(),
                logging: e.logging.clone(),
            }
        }),
    }
}

fn configuration_from_wire(config: &wire::ClusterConfiguration) -> ClusterConfiguration {
    ClusterConfiguration {
        execute_command_configuration: config.execute_command_configuration.as_ref().map(|e| {
            ExecuteCommandConfiguration {
                kms_key_id: e.kms_key_id.clone(),
                logging: e.logging.clone(),
            }
        }),
    }
}

#[async_trait]
impl ExternalResource for ClusterExternal {
    type Resource = Cluster;
    type Response = wire::DescribeClustersOutput;
    type Observed = wire::Cluster;
    type CreateInput = wire::CreateClusterInput;
    type Created = wire::Cluster;
    type UpdateInput = (wire::UpdateClusterInput, wire::PutClusterCapacityProvidersInput);
    type Updated = wire::Cluster;
    type DeleteInput = String;

    const KIND: &'static str = "Cluster";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("ACTIVE", LifecycleState::Available),
        ("PROVISIONING", LifecycleState::Creating),
        ("DEPROVISIONING", LifecycleState::Deleting),
        ("FAILED", LifecycleState::Unavailable),
        ("INACTIVE", LifecycleState::Absent),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.ecs),
        }
    }

    async fn describe(&self, _cr: &Cluster, external_name: &str) -> Result<wire::DescribeClustersOutput, AwsError> {
        self.client.describe_clusters(&[external_name.to_string()]).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    /// Unknown names come back as `MISSING` failures, not as errors
    fn filter_list(&self, external_name: &str, response: wire::DescribeClustersOutput) -> Option<wire::Cluster> {
        response
            .clusters
            .into_iter()
            .find(|c| c.cluster_name == external_name || c.cluster_arn == external_name)
    }

    fn observed_status<'a>(&self, observed: &'a wire::Cluster) -> Option<&'a str> {
        observed.status.as_deref()
    }

    /// ECS reports default settings and providers for a cluster created without them
    fn late_initialize(&self, params: &mut ClusterParameters, observed: &wire::Cluster) {
        if params.settings.is_empty() {
            params.settings = pairs_from_wire(&observed.settings);
        }
        if params.capacity_providers.is_empty() {
            params.capacity_providers = observed.capacity_providers.clone();
            sort_set(&mut params.capacity_providers);
        }
        if params.default_capacity_provider_strategy.is_empty() {
            params.default_capacity_provider_strategy = strategy_from_wire(&observed.default_capacity_provider_strategy);
        }
    }

    fn generate_observation(&self, observed: &wire::Cluster) -> ClusterObservation {
        ClusterObservation {
            cluster_arn: Some(observed.cluster_arn.clone()),
            cluster_name: Some(observed.cluster_name.clone()),
            status: observed.status.clone(),
            active_services_count: observed.active_services_count,
            pending_tasks_count: observed.pending_tasks_count,
            running_tasks_count: observed.running_tasks_count,
            registered_container_instances_count: observed.registered_container_instances_count,
        }
    }

    fn is_up_to_date(&self, cr: &Cluster, observed: &wire::Cluster) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        sort_set(&mut desired.capacity_providers);
        sort_set(&mut desired.default_capacity_provider_strategy);
        sort_set(&mut desired.settings);
        normalize_tags(&mut desired.tags);

        let mut capacity_providers = observed.capacity_providers.clone();
        sort_set(&mut capacity_providers);
        let current = ClusterParameters {
            capacity_providers,
            default_capacity_provider_strategy: strategy_from_wire(&observed.default_capacity_provider_strategy),
            configuration: when_set(
                &desired.configuration,
                observed.configuration.as_ref().map(configuration_from_wire),
            ),
            service_connect_defaults: when_set(
                &desired.service_connect_defaults,
                observed
                    .service_connect_defaults
                    .clone()
                    .map(|namespace| ServiceConnectDefaults { namespace }),
            ),
            settings: pairs_from_wire(&observed.settings),
            tags: tags_from_wire(&observed.tags),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Cluster, external_name: &str) -> Result<wire::CreateClusterInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateClusterInput {
            cluster_name: external_name.to_string(),
            capacity_providers: p.capacity_providers.clone(),
            default_capacity_provider_strategy: strategy_to_wire(&p.default_capacity_provider_strategy),
            configuration: p.configuration.as_ref().map(configuration_to_wire),
            service_connect_defaults: p.service_connect_defaults.as_ref().map(|d| d.namespace.clone()),
            settings: pairs_to_wire(&p.settings),
            tags: tags_to_wire(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateClusterInput) -> Result<wire::Cluster, AwsError> {
        self.client.create_cluster(input).await
    }

    fn update_input(
        &self,
        cr: &Cluster,
        external_name: &str,
    ) -> Result<(wire::UpdateClusterInput, wire::PutClusterCapacityProvidersInput), ControllerError> {
        let p = cr.for_provider();
        let update = wire::UpdateClusterInput {
            cluster: external_name.to_string(),
            configuration: p.configuration.as_ref().map(configuration_to_wire),
            service_connect_defaults: p.service_connect_defaults.as_ref().map(|d| d.namespace.clone()),
            settings: pairs_to_wire(&p.settings),
        };
        let capacity = wire::PutClusterCapacityProvidersInput {
            cluster: external_name.to_string(),
            capacity_providers: p.capacity_providers.clone(),
            default_capacity_provider_strategy: strategy_to_wire(&p.default_capacity_provider_strategy),
        };
        Ok((update, capacity))
    }

    /// Capacity providers have their own call; both are sent on every update
    async fn update(
        &self,
        (update, capacity): (wire::UpdateClusterInput, wire::PutClusterCapacityProvidersInput),
    ) -> Result<wire::Cluster, AwsError> {
        self.client.update_cluster(update).await?;
        self.client.put_cluster_capacity_providers(capacity).await
    }

    async fn post_update(&self, cr: &mut Cluster, _external_name: &str, updated: wire::Cluster) -> Result<(), ControllerError> {
        sync_tags(self.client.as_ref(), Self::KIND, &updated.cluster_arn, &cr.for_provider().tags, &updated.tags).await?;
        Ok(())
    }

    fn delete_input(&self, _cr: &Cluster, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, cluster_name: String) -> Result<(), AwsError> {
        self.client.delete_cluster(&cluster_name).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::ecs::{ClusterSpec, KeyValuePair};
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, Tag, external_name, find_condition, set_external_name};

    fn cluster() -> Cluster {
        let spec = ClusterSpec {
            for_provider: ClusterParameters {
                region: REGION.to_string(),
                capacity_providers: vec!["FARGATE".to_string(), "FARGATE_SPOT".to_string()],
                settings: vec![KeyValuePair::new("containerInsights", "enabled")],
                tags: vec![Tag::new("team", "web"), Tag::new("env", "prod")],
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Cluster::new("prod", spec), NAMESPACE)
    }

    fn ready(cr: &Cluster) -> Option<ConditionReason> {
        find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason)
    }

    #[tokio::test]
    async fn test_create_uses_record_name() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "prod");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(ready(&cr), Some(ConditionReason::Available));
        assert!(cr.at_provider().unwrap().cluster_arn.as_deref().unwrap().ends_with("cluster/prod"));
    }

    #[tokio::test]
    async fn test_inactive_cluster_is_absent_and_recreated() {
        let mock = MockAwsClient::new();
        mock.add_ecs_cluster(wire::Cluster {
            cluster_arn: "arn:aws:ecs:us-east-1:123456789012:cluster/prod".to_string(),
            cluster_name: "prod".to_string(),
            status: Some("INACTIVE".to_string()),
            ..Default::default()
        });
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        set_external_name(&mut cr, "prod");

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(!observation.resource_exists);
        assert_eq!(ready(&cr), Some(ConditionReason::Unavailable));

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(mock.ecs_cluster("prod").unwrap().status.as_deref(), Some("ACTIVE"));
    }

    #[tokio::test]
    async fn test_unknown_cluster_is_absent() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let mut cr = cluster();
        set_external_name(&mut cr, "ghost");

        assert!(!client.observe(&mut cr).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn test_provider_and_tag_order_is_not_drift() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.capacity_providers.reverse();
        cr.spec.for_provider.tags.reverse();
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_capacity_provider_change_updates() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.capacity_providers = vec!["FARGATE".to_string()];
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.call_count("PutClusterCapacityProviders"), 1);
        assert_eq!(mock.ecs_cluster("prod").unwrap().capacity_providers, vec!["FARGATE".to_string()]);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_delete_leaves_tombstone_then_releases() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert_eq!(mock.ecs_cluster("prod").unwrap().status.as_deref(), Some("INACTIVE"));
        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
    }

    #[tokio::test]
    async fn test_default_settings_are_late_initialized() {
        let mock = MockAwsClient::new();
        mock.add_ecs_cluster(wire::Cluster {
            cluster_arn: "arn:aws:ecs:us-east-1:123456789012:cluster/prod".to_string(),
            cluster_name: "prod".to_string(),
            status: Some("ACTIVE".to_string()),
            settings: vec![wire::KeyValuePair {
                name: "containerInsights".to_string(),
                value: "disabled".to_string(),
            }],
            ..Default::default()
        });
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        cr.spec.for_provider.settings.clear();
        cr.spec.for_provider.capacity_providers.clear();
        cr.spec.for_provider.tags.clear();
        set_external_name(&mut cr, "prod");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(
            cr.spec.for_provider.settings,
            vec![KeyValuePair::new("containerInsights", "disabled")]
        );
        assert_eq!(mock.call_count("UpdateCluster"), 0);
    }

    #[tokio::test]
    async fn test_tag_failure_reported_as_cluster_update() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.tags.push(Tag::new("owner", "platform"));
        mock.fail_next("TagResource", AwsError::service("InvalidParameterException", "Invalid tag"));
        let err = tick(&client, &reader, &mut cr, false).await.unwrap_err();
        assert!(err.to_string().starts_with("cannot update Cluster: "), "{err}");
    }
}
