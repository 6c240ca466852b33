//! VpcLink reconciler
//!
//! Only the name of a VPC link can be updated in place. Its subnets and
//! security groups are fixed at create.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{VpcLink, VpcLinkObservation, VpcLinkParameters};

use super::{is_not_found, normalize_tags, sync_tags, tag_list, tag_map, tagging_arn};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ServiceClients};

/// Capability set of the VpcLink kind
pub struct VpcLinkExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn sorted(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    sort_set(&mut ids);
    ids
}

#[async_trait]
impl ExternalResource for VpcLinkExternal {
    type Resource = VpcLink;
    type Response = wire::VpcLink;
    type Observed = wire::VpcLink;
    type CreateInput = wire::CreateVpcLinkInput;
    type Created = wire::VpcLink;
    type UpdateInput = wire::UpdateVpcLinkInput;
    type Updated = wire::VpcLink;
    type DeleteInput = String;

    const KIND: &'static str = "VpcLink";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("PENDING", LifecycleState::Creating),
        ("AVAILABLE", LifecycleState::Available),
        ("DELETING", LifecycleState::Deleting),
        ("FAILED", LifecycleState::Unavailable),
        ("INACTIVE", LifecycleState::Unavailable),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    async fn describe(&self, _cr: &VpcLink, external_name: &str) -> Result<wire::VpcLink, AwsError> {
        self.client.get_vpc_link(external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, _external_name: &str, response: wire::VpcLink) -> Option<wire::VpcLink> {
        Some(response)
    }

    fn observed_status<'a>(&self, observed: &'a wire::VpcLink) -> Option<&'a str> {
        observed.vpc_link_status.as_deref()
    }

    fn generate_observation(&self, observed: &wire::VpcLink) -> VpcLinkObservation {
        VpcLinkObservation {
            vpc_link_id: Some(observed.vpc_link_id.clone()),
            created_date: observed.created_date,
            vpc_link_status: observed.vpc_link_status.clone(),
            vpc_link_status_message: observed.vpc_link_status_message.clone(),
            vpc_link_version: observed.vpc_link_version.clone(),
        }
    }

    fn is_up_to_date(&self, cr: &VpcLink, observed: &wire::VpcLink) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        normalize_tags(&mut desired.tags);
        let current = VpcLinkParameters {
            name: observed.name.clone(),
            tags: tag_list(&observed.tags),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn immutable_violation(&self, cr: &VpcLink, observed: &wire::VpcLink) -> Option<String> {
        let desired = cr.for_provider();
        if sorted(&desired.subnet_ids) != sorted(&observed.subnet_ids) {
            return Some(format!(
                "spec.forProvider.subnetIds cannot change from {:?} to {:?}",
                observed.subnet_ids, desired.subnet_ids
            ));
        }
        if sorted(&desired.security_group_ids) != sorted(&observed.security_group_ids) {
            return Some(format!(
                "spec.forProvider.securityGroupIds cannot change from {:?} to {:?}",
                observed.security_group_ids, desired.security_group_ids
            ));
        }
        None
    }

    fn create_input(&self, cr: &VpcLink, _external_name: &str) -> Result<wire::CreateVpcLinkInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateVpcLinkInput {
            name: p.name.clone(),
            security_group_ids: p.security_group_ids.clone(),
            subnet_ids: p.subnet_ids.clone(),
            tags: tag_map(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateVpcLinkInput) -> Result<wire::VpcLink, AwsError> {
        self.client.create_vpc_link(input).await
    }

    fn assigned_id(&self, created: &wire::VpcLink) -> Option<String> {
        Some(created.vpc_link_id.clone())
    }

    fn update_input(&self, cr: &VpcLink, external_name: &str) -> Result<wire::UpdateVpcLinkInput, ControllerError> {
        Ok(wire::UpdateVpcLinkInput {
            vpc_link_id: external_name.to_string(),
            name: Some(cr.for_provider().name.clone()),
        })
    }

    async fn update(&self, input: wire::UpdateVpcLinkInput) -> Result<wire::VpcLink, AwsError> {
        self.client.update_vpc_link(input).await
    }

    async fn post_update(&self, cr: &mut VpcLink, external_name: &str, updated: wire::VpcLink) -> Result<(), ControllerError> {
        let arn = tagging_arn(cr.region(), &format!("vpclinks/{external_name}"));
        sync_tags(self.client.as_ref(), Self::KIND, &arn, &cr.for_provider().tags, &updated.tags).await?;
        Ok(())
    }

    fn delete_input(&self, _cr: &VpcLink, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, vpc_link_id: String) -> Result<(), AwsError> {
        self.client.delete_vpc_link(&vpc_link_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::VpcLinkSpec;
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, Tag, external_name, find_condition, set_external_name};

    fn vpc_link() -> VpcLink {
        let spec = VpcLinkSpec {
            for_provider: VpcLinkParameters {
                region: REGION.to_string(),
                name: "private".to_string(),
                security_group_ids: vec!["sg-1".to_string()],
                subnet_ids: vec!["subnet-b".to_string(), "subnet-a".to_string()],
                tags: vec![Tag::new("env", "prod")],
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(VpcLink::new("private", spec), NAMESPACE)
    }

    fn ready(cr: &VpcLink) -> Option<ConditionReason> {
        find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason)
    }

    fn stored(id: &str, status: &str) -> wire::VpcLink {
        wire::VpcLink {
            vpc_link_id: id.to_string(),
            name: "private".to_string(),
            security_group_ids: vec!["sg-1".to_string()],
            subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
            vpc_link_status: Some(status.to_string()),
            tags: tag_map(&[Tag::new("env", "prod")]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pending_link_is_creating_then_available() {
        let mock = MockAwsClient::new();
        mock.push_next_id("vl1");
        let client = external::<VpcLinkExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = vpc_link();

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "vl1");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(ready(&cr), Some(ConditionReason::Creating));

        mock.add_vpc_link(stored("vl1", "AVAILABLE"));
        tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(ready(&cr), Some(ConditionReason::Available));
    }

    #[tokio::test]
    async fn test_subnet_change_is_rejected() {
        let mock = MockAwsClient::new();
        mock.add_vpc_link(stored("vl1", "AVAILABLE"));
        let client = external::<VpcLinkExternal>(&mock);
        let mut cr = vpc_link();
        set_external_name(&mut cr, "vl1");
        cr.spec.for_provider.subnet_ids.push("subnet-c".to_string());

        let err = client.observe(&mut cr).await.unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().contains("spec.forProvider.subnetIds"), "{err}");
    }

    #[tokio::test]
    async fn test_rename_and_retag() {
        let mock = MockAwsClient::new();
        mock.add_vpc_link(stored("vl1", "AVAILABLE"));
        let client = external::<VpcLinkExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = vpc_link();
        set_external_name(&mut cr, "vl1");
        cr.spec.for_provider.name = "renamed".to_string();
        cr.spec.for_provider.tags = vec![Tag::new("team", "net")];

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        let link = mock.vpc_link("vl1").unwrap();
        assert_eq!(link.name, "renamed");
        assert_eq!(link.tags, tag_map(&[Tag::new("team", "net")]));
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_delete_reports_deleting() {
        let mock = MockAwsClient::new();
        mock.add_vpc_link(stored("vl1", "AVAILABLE"));
        let client = external::<VpcLinkExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = vpc_link();
        set_external_name(&mut cr, "vl1");

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert_eq!(mock.vpc_link("vl1").unwrap().vpc_link_status.as_deref(), Some("DELETING"));
    }
}
