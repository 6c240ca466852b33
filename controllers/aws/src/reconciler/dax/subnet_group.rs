//! DAX SubnetGroup reconciler

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::dax as wire;
use aws_client::{AwsError, DaxApi};
use crds::Managed;
use crds::dax::{SubnetGroup, SubnetGroupObservation, SubnetGroupParameters, SubnetObservation};

use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ServiceClients};

const NOT_FOUND: &str = "SubnetGroupNotFoundFault";

/// Capability set of the DAX SubnetGroup kind
pub struct SubnetGroupExternal {
    client: Arc<dyn DaxApi>,
}

fn input(cr: &SubnetGroup, external_name: &str) -> wire::SubnetGroupInput {
    let params = cr.for_provider();
    wire::SubnetGroupInput {
        subnet_group_name: external_name.to_string(),
        description: params.description.clone(),
        subnet_ids: params.subnet_ids.clone(),
    }
}

#[async_trait]
impl ExternalResource for SubnetGroupExternal {
    type Resource = SubnetGroup;
    type Response = Vec<wire::SubnetGroup>;
    type Observed = wire::SubnetGroup;
    type CreateInput = wire::SubnetGroupInput;
    type Created = wire::SubnetGroup;
    type UpdateInput = wire::SubnetGroupInput;
    type Updated = wire::SubnetGroup;
    type DeleteInput = String;

    const KIND: &'static str = "SubnetGroup";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.dax),
        }
    }

    async fn describe(&self, _cr: &SubnetGroup, external_name: &str) -> Result<Vec<wire::SubnetGroup>, AwsError> {
        self.client.describe_subnet_groups(&[external_name.to_string()]).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        err.is_code(NOT_FOUND)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::SubnetGroup>) -> Option<wire::SubnetGroup> {
        response.into_iter().find(|g| g.subnet_group_name == external_name)
    }

    fn late_initialize(&self, params: &mut SubnetGroupParameters, observed: &wire::SubnetGroup) {
        if params.description.is_none() {
            params.description = observed.description.clone();
        }
    }

    fn generate_observation(&self, observed: &wire::SubnetGroup) -> SubnetGroupObservation {
        SubnetGroupObservation {
            subnet_group_name: Some(observed.subnet_group_name.clone()),
            vpc_id: observed.vpc_id.clone(),
            subnets: observed
                .subnets
                .iter()
                .map(|s| SubnetObservation {
                    subnet_identifier: s.subnet_identifier.clone(),
                    subnet_availability_zone: s.subnet_availability_zone.clone(),
                })
                .collect(),
        }
    }

    fn is_up_to_date(&self, cr: &SubnetGroup, observed: &wire::SubnetGroup) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        sort_set(&mut desired.subnet_ids);

        let mut subnet_ids: Vec<String> = observed
            .subnets
            .iter()
            .filter_map(|s| s.subnet_identifier.clone())
            .collect();
        sort_set(&mut subnet_ids);

        let current = SubnetGroupParameters {
            description: when_set(&desired.description, observed.description.clone()),
            subnet_ids,
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &SubnetGroup, external_name: &str) -> Result<wire::SubnetGroupInput, ControllerError> {
        Ok(input(cr, external_name))
    }

    async fn create(&self, input: wire::SubnetGroupInput) -> Result<wire::SubnetGroup, AwsError> {
        self.client.create_subnet_group(input).await
    }

    fn update_input(&self, cr: &SubnetGroup, external_name: &str) -> Result<wire::SubnetGroupInput, ControllerError> {
        Ok(input(cr, external_name))
    }

    async fn update(&self, input: wire::SubnetGroupInput) -> Result<wire::SubnetGroup, AwsError> {
        self.client.update_subnet_group(input).await
    }

    fn delete_input(&self, _cr: &SubnetGroup, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, name: String) -> Result<(), AwsError> {
        self.client.delete_subnet_group(&name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::DeletionPolicy;
    use crds::dax::SubnetGroupSpec;

    fn subnet_group(subnet_ids: &[&str]) -> SubnetGroup {
        let spec = SubnetGroupSpec {
            for_provider: SubnetGroupParameters {
                region: REGION.to_string(),
                description: None,
                subnet_ids: subnet_ids.iter().map(|s| s.to_string()).collect(),
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(SubnetGroup::new("private", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_then_up_to_date() {
        let mock = MockAwsClient::new();
        let client = external::<SubnetGroupExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = subnet_group(&["subnet-b", "subnet-a"]);

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);

        let observation = cr.at_provider().unwrap();
        assert_eq!(observation.vpc_id.as_deref(), Some("vpc-mock"));
        assert_eq!(observation.subnets.len(), 2);
    }

    #[tokio::test]
    async fn test_subnet_change_updates() {
        let mock = MockAwsClient::new();
        let client = external::<SubnetGroupExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = subnet_group(&["subnet-a"]);
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.subnet_ids.push("subnet-c".to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.dax_subnet_group("private").unwrap().subnets.len(), 2);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_delete_then_released() {
        let mock = MockAwsClient::new();
        let client = external::<SubnetGroupExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = subnet_group(&["subnet-a"]);
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert!(mock.dax_subnet_group("private").is_none());
        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
    }
}
