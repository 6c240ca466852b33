//! DAX Cluster reconciler
//!
//! The replication factor is changed through its own pair of calls
//! (IncreaseReplicationFactor / DecreaseReplicationFactor) after the
//! regular UpdateCluster.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::dax as wire;
use aws_client::{AwsError, DaxApi};
use crds::Managed;
use crds::dax::{
    Cluster, ClusterObservation, ClusterParameters, Endpoint, NodeObservation, ParameterGroup, SseSpecification,
    SubnetGroup,
};
use tracing::info;

use super::tags_to_wire;
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ReferenceSite, ServiceClients, external_name_of};

const NOT_FOUND: &str = "ClusterNotFoundFault";

/// Capability set of the DAX Cluster kind
pub struct ClusterExternal {
    client: Arc<dyn DaxApi>,
}

/// UpdateCluster input plus the replication factor to converge to
pub struct ClusterUpdate {
    update: wire::UpdateClusterInput,
    replication_factor: i32,
    availability_zones: Vec<String>,
}

fn sorted(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    sort_set(&mut ids);
    ids
}

#[async_trait]
impl ExternalResource for ClusterExternal {
    type Resource = Cluster;
    type Response = Vec<wire::Cluster>;
    type Observed = wire::Cluster;
    type CreateInput = wire::CreateClusterInput;
    type Created = wire::Cluster;
    type UpdateInput = ClusterUpdate;
    type Updated = wire::Cluster;
    type DeleteInput = String;

    const KIND: &'static str = "Cluster";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("available", LifecycleState::Available),
        ("modifying", LifecycleState::Available),
        ("creating", LifecycleState::Creating),
        ("deleting", LifecycleState::Deleting),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.dax),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<ClusterParameters>> {
        vec![
            ReferenceSite::single::<ParameterGroup>(
                "parameterGroupName",
                |p| &mut p.parameter_group_name,
                |p| &mut p.parameter_group_name_ref,
                |p| p.parameter_group_name_selector.as_ref(),
                external_name_of,
            ),
            ReferenceSite::single::<SubnetGroup>(
                "subnetGroupName",
                |p| &mut p.subnet_group_name,
                |p| &mut p.subnet_group_name_ref,
                |p| p.subnet_group_name_selector.as_ref(),
                external_name_of,
            ),
        ]
    }

    async fn describe(&self, _cr: &Cluster, external_name: &str) -> Result<Vec<wire::Cluster>, AwsError> {
        self.client.describe_clusters(&[external_name.to_string()]).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        err.is_code(NOT_FOUND)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::Cluster>) -> Option<wire::Cluster> {
        response.into_iter().find(|c| c.cluster_name == external_name)
    }

    fn observed_status<'a>(&self, observed: &'a wire::Cluster) -> Option<&'a str> {
        observed.status.as_deref()
    }

    fn late_initialize(&self, params: &mut ClusterParameters, observed: &wire::Cluster) {
        if params.parameter_group_name.is_none() {
            params.parameter_group_name = observed.parameter_group_name.clone();
        }
        if params.subnet_group_name.is_none() {
            params.subnet_group_name = observed.subnet_group_name.clone();
        }
        if params.preferred_maintenance_window.is_none() {
            params.preferred_maintenance_window = observed.preferred_maintenance_window.clone();
        }
        if params.cluster_endpoint_encryption_type.is_none() {
            params.cluster_endpoint_encryption_type = observed.cluster_endpoint_encryption_type.clone();
        }
        if params.sse_specification.is_none() {
            params.sse_specification = observed.sse_enabled.map(|enabled| SseSpecification { enabled });
        }
        // DAX puts a cluster created without groups into the VPC default group
        if params.security_group_ids.is_empty() {
            params.security_group_ids = sorted(&observed.security_group_ids);
        }
    }

    fn generate_observation(&self, observed: &wire::Cluster) -> ClusterObservation {
        ClusterObservation {
            cluster_arn: observed.cluster_arn.clone(),
            cluster_discovery_endpoint: observed.cluster_discovery_endpoint.as_ref().map(|e| Endpoint {
                address: e.address.clone(),
                port: e.port,
                url: e.url.clone(),
            }),
            active_nodes: observed.active_nodes.unwrap_or_default(),
            total_nodes: observed.total_nodes.unwrap_or_default(),
            nodes: observed
                .nodes
                .iter()
                .map(|n| NodeObservation {
                    node_id: n.node_id.clone(),
                    availability_zone: n.availability_zone.clone(),
                    node_status: n.node_status.clone(),
                })
                .collect(),
            status: observed.status.clone(),
        }
    }

    fn immutable_violation(&self, cr: &Cluster, observed: &wire::Cluster) -> Option<String> {
        let desired = cr.for_provider();
        if observed.node_type.as_deref().is_some_and(|t| t != desired.node_type) {
            return Some(format!(
                "spec.forProvider.nodeType cannot change from {:?} to {:?}",
                observed.node_type, desired.node_type
            ));
        }
        if let Some(subnet_group) = &desired.subnet_group_name
            && observed.subnet_group_name.as_ref().is_some_and(|o| o != subnet_group)
        {
            return Some(format!(
                "spec.forProvider.subnetGroupName cannot change from {:?} to {:?}",
                observed.subnet_group_name, subnet_group
            ));
        }
        None
    }

    /// Tags are only sent on create; DAX clusters are not retagged
    fn is_up_to_date(&self, cr: &Cluster, observed: &wire::Cluster) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        sort_set(&mut desired.security_group_ids);
        let current = ClusterParameters {
            replication_factor: observed.total_nodes.unwrap_or(desired.replication_factor),
            description: when_set(&desired.description, observed.description.clone()),
            notification_topic_arn: when_set(&desired.notification_topic_arn, observed.notification_topic_arn.clone()),
            parameter_group_name: when_set(&desired.parameter_group_name, observed.parameter_group_name.clone()),
            preferred_maintenance_window: when_set(
                &desired.preferred_maintenance_window,
                observed.preferred_maintenance_window.clone(),
            ),
            security_group_ids: sorted(&observed.security_group_ids),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Cluster, external_name: &str) -> Result<wire::CreateClusterInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateClusterInput {
            cluster_name: external_name.to_string(),
            node_type: p.node_type.clone(),
            replication_factor: p.replication_factor,
            iam_role_arn: p.iam_role_arn.clone(),
            availability_zones: p.availability_zones.clone(),
            cluster_endpoint_encryption_type: p.cluster_endpoint_encryption_type.clone(),
            description: p.description.clone(),
            notification_topic_arn: p.notification_topic_arn.clone(),
            parameter_group_name: p.parameter_group_name.clone(),
            preferred_maintenance_window: p.preferred_maintenance_window.clone(),
            security_group_ids: p.security_group_ids.clone(),
            sse_enabled: p.sse_specification.as_ref().map(|s| s.enabled),
            subnet_group_name: p.subnet_group_name.clone(),
            tags: tags_to_wire(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateClusterInput) -> Result<wire::Cluster, AwsError> {
        self.client.create_cluster(input).await
    }

    fn update_input(&self, cr: &Cluster, external_name: &str) -> Result<ClusterUpdate, ControllerError> {
        let p = cr.for_provider();
        Ok(ClusterUpdate {
            update: wire::UpdateClusterInput {
                cluster_name: external_name.to_string(),
                description: p.description.clone(),
                notification_topic_arn: p.notification_topic_arn.clone(),
                parameter_group_name: p.parameter_group_name.clone(),
                preferred_maintenance_window: p.preferred_maintenance_window.clone(),
                security_group_ids: p.security_group_ids.clone(),
            },
            replication_factor: p.replication_factor,
            availability_zones: p.availability_zones.clone(),
        })
    }

    async fn update(&self, input: ClusterUpdate) -> Result<wire::Cluster, AwsError> {
        let name = input.update.cluster_name.clone();
        let updated = self.client.update_cluster(input.update).await?;
        let current = updated.total_nodes.unwrap_or(input.replication_factor);
        match input.replication_factor.cmp(&current) {
            Ordering::Greater => {
                info!(cluster = %name, from = current, to = input.replication_factor, "Increasing replication factor");
                self.client
                    .increase_replication_factor(&name, input.replication_factor, input.availability_zones)
                    .await
            }
            Ordering::Less => {
                info!(cluster = %name, from = current, to = input.replication_factor, "Decreasing replication factor");
                self.client
                    .decrease_replication_factor(&name, input.replication_factor)
                    .await
            }
            Ordering::Equal => Ok(updated),
        }
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
    use crds::dax::{ClusterSpec, ParameterGroupParameters, ParameterGroupSpec};
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, Reference, external_name, find_condition, set_external_name};

    fn cluster() -> Cluster {
        let spec = ClusterSpec {
            for_provider: ClusterParameters {
                region: REGION.to_string(),
                node_type: "dax.r5.large".to_string(),
                replication_factor: 3,
                iam_role_arn: "arn:aws:iam::123456789012:role/dax".to_string(),
                security_group_ids: vec!["sg-2".to_string(), "sg-1".to_string()],
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Cluster::new("cache", spec), NAMESPACE)
    }

    fn ready(cr: &Cluster) -> Option<ConditionReason> {
        find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason)
    }

    #[tokio::test]
    async fn test_creating_then_available() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "cache");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(ready(&cr), Some(ConditionReason::Creating));
        assert_eq!(cr.spec.for_provider.parameter_group_name.as_deref(), Some("default.dax1.0"));

        mock.set_dax_cluster_status("cache", "available");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(ready(&cr), Some(ConditionReason::Available));
        assert_eq!(cr.at_provider().unwrap().total_nodes, 3);
    }

    #[tokio::test]
    async fn test_replication_factor_change_uses_dedicated_calls() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();
        mock.set_dax_cluster_status("cache", "available");

        cr.spec.for_provider.replication_factor = 5;
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.call_count("IncreaseReplicationFactor"), 1);
        assert_eq!(mock.dax_cluster("cache").unwrap().nodes.len(), 5);

        cr.spec.for_provider.replication_factor = 2;
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.call_count("DecreaseReplicationFactor"), 1);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_node_type_change_is_rejected() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.node_type = "dax.r5.xlarge".to_string();
        let err = tick(&client, &reader, &mut cr, false).await.unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().starts_with("cannot update Cluster: spec.forProvider.nodeType"), "{err}");
    }

    #[tokio::test]
    async fn test_parameter_group_reference_resolves_to_external_name() {
        let mock = MockAwsClient::new();
        let mut group = in_namespace(
            ParameterGroup::new(
                "tuned",
                ParameterGroupSpec {
                    for_provider: ParameterGroupParameters {
                        region: REGION.to_string(),
                        ..Default::default()
                    },
                    deletion_policy: DeletionPolicy::default(),
                },
            ),
            NAMESPACE,
        );
        set_external_name(&mut group, "tuned-params");
        let reader = MemoryReader::new().with(&group);
        let client = external::<ClusterExternal>(&mock);
        let mut cr = cluster();
        cr.spec.for_provider.parameter_group_name_ref = Some(Reference::new("tuned"));

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(
            mock.dax_cluster("cache").unwrap().parameter_group_name.as_deref(),
            Some("tuned-params")
        );
    }

    #[tokio::test]
    async fn test_delete_reports_deleting() {
        let mock = MockAwsClient::new();
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert_eq!(mock.dax_cluster("cache").unwrap().status.as_deref(), Some("deleting"));
    }

    #[tokio::test]
    async fn test_default_security_group_is_late_initialized() {
        let mock = MockAwsClient::new();
        mock.add_dax_cluster(wire::Cluster {
            cluster_name: "cache".to_string(),
            status: Some("available".to_string()),
            node_type: Some("dax.r5.large".to_string()),
            total_nodes: Some(3),
            iam_role_arn: Some("arn:aws:iam::123456789012:role/dax".to_string()),
            security_group_ids: vec!["sg-default".to_string()],
            ..Default::default()
        });
        let client = external::<ClusterExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = cluster();
        cr.spec.for_provider.security_group_ids.clear();
        set_external_name(&mut cr, "cache");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.spec.for_provider.security_group_ids, vec!["sg-default".to_string()]);
        assert_eq!(mock.call_count("UpdateCluster"), 0);
    }
}
