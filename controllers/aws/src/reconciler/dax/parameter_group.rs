//! DAX ParameterGroup reconciler
//!
//! A new group starts with service defaults; the desired values are applied
//! right after create. Only the parameters named in `parameterNameValues` are
//! compared, so defaults the user did not mention are not drift.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::dax as wire;
use aws_client::{AwsError, DaxApi};
use crds::Managed;
use crds::dax::{ParameterGroup, ParameterGroupObservation, ParameterGroupParameters, ParameterNameValue};
use tracing::debug;

use crate::error::{ControllerError, Stage};
use crate::managed::diff::{compare, sort_set};
use crate::managed::{ExternalResource, IdentityPolicy, ServiceClients};

const NOT_FOUND: &str = "ParameterGroupNotFoundFault";

/// Capability set of the DAX ParameterGroup kind
pub struct ParameterGroupExternal {
    client: Arc<dyn DaxApi>,
}

/// A parameter group together with its current parameter values
pub struct ObservedParameterGroup {
    group: wire::ParameterGroup,
    parameters: Vec<wire::ParameterNameValue>,
}

fn parameters_to_wire(values: &[ParameterNameValue]) -> Vec<wire::ParameterNameValue> {
    values
        .iter()
        .map(|v| wire::ParameterNameValue {
            parameter_name: v.parameter_name.clone(),
            parameter_value: v.parameter_value.clone(),
        })
        .collect()
}

fn parameters_from_wire(values: &[wire::ParameterNameValue]) -> Vec<ParameterNameValue> {
    let mut values: Vec<ParameterNameValue> = values
        .iter()
        .map(|v| ParameterNameValue {
            parameter_name: v.parameter_name.clone(),
            parameter_value: v.parameter_value.clone(),
        })
        .collect();
    sort_set(&mut values);
    values
}

#[async_trait]
impl ExternalResource for ParameterGroupExternal {
    type Resource = ParameterGroup;
    type Response = ObservedParameterGroup;
    type Observed = ObservedParameterGroup;
    type CreateInput = (String, Option<String>);
    type Created = wire::ParameterGroup;
    type UpdateInput = (String, Vec<wire::ParameterNameValue>);
    type Updated = wire::ParameterGroup;
    type DeleteInput = String;

    const KIND: &'static str = "ParameterGroup";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.dax),
        }
    }

    async fn describe(&self, _cr: &ParameterGroup, external_name: &str) -> Result<ObservedParameterGroup, AwsError> {
        let group = self
            .client
            .describe_parameter_groups(&[external_name.to_string()])
            .await?
            .into_iter()
            .find(|g| g.parameter_group_name == external_name)
            .ok_or_else(|| AwsError::service(NOT_FOUND, format!("Parameter group {external_name} not found")))?;
        let parameters = self.client.describe_parameters(external_name).await?;
        Ok(ObservedParameterGroup { group, parameters })
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        err.is_code(NOT_FOUND)
    }

    fn filter_list(&self, _external_name: &str, response: ObservedParameterGroup) -> Option<ObservedParameterGroup> {
        Some(response)
    }

    fn generate_observation(&self, observed: &ObservedParameterGroup) -> ParameterGroupObservation {
        ParameterGroupObservation {
            parameter_group_name: Some(observed.group.parameter_group_name.clone()),
            parameters: parameters_from_wire(&observed.parameters),
        }
    }

    /// The description cannot be changed after create and is not compared
    fn is_up_to_date(&self, cr: &ParameterGroup, observed: &ObservedParameterGroup) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        sort_set(&mut desired.parameter_name_values);
        let observed_values = parameters_from_wire(&observed.parameters);
        let current = ParameterGroupParameters {
            parameter_name_values: observed_values
                .into_iter()
                .filter(|o| {
                    desired
                        .parameter_name_values
                        .iter()
                        .any(|d| d.parameter_name == o.parameter_name)
                })
                .collect(),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &ParameterGroup, external_name: &str) -> Result<(String, Option<String>), ControllerError> {
        Ok((external_name.to_string(), cr.for_provider().description.clone()))
    }

    async fn create(&self, (name, description): (String, Option<String>)) -> Result<wire::ParameterGroup, AwsError> {
        self.client.create_parameter_group(&name, description).await
    }

    async fn post_create(&self, cr: &mut ParameterGroup, external_name: &str, _created: &wire::ParameterGroup) -> Result<(), ControllerError> {
        let values = parameters_to_wire(&cr.for_provider().parameter_name_values);
        if values.is_empty() {
            return Ok(());
        }
        debug!(parameter_group = external_name, count = values.len(), "Applying parameters to new group");
        self.client
            .update_parameter_group(external_name, values)
            .await
            .map_err(|e| ControllerError::from_aws(Stage::Create, Self::KIND, e))?;
        Ok(())
    }

    fn update_input(&self, cr: &ParameterGroup, external_name: &str) -> Result<(String, Vec<wire::ParameterNameValue>), ControllerError> {
        Ok((
            external_name.to_string(),
            parameters_to_wire(&cr.for_provider().parameter_name_values),
        ))
    }

    async fn update(&self, (name, values): (String, Vec<wire::ParameterNameValue>)) -> Result<wire::ParameterGroup, AwsError> {
        self.client.update_parameter_group(&name, values).await
    }

    fn delete_input(&self, _cr: &ParameterGroup, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, name: String) -> Result<(), AwsError> {
        self.client.delete_parameter_group(&name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::dax::ParameterGroupSpec;
    use crds::{DeletionPolicy, set_external_name};

    fn value(name: &str, value: &str) -> ParameterNameValue {
        ParameterNameValue {
            parameter_name: name.to_string(),
            parameter_value: value.to_string(),
        }
    }

    fn parameter_group(ttl: &str) -> ParameterGroup {
        let spec = ParameterGroupSpec {
            for_provider: ParameterGroupParameters {
                region: REGION.to_string(),
                description: Some("short ttl".to_string()),
                parameter_name_values: vec![value("query-ttl-millis", ttl)],
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(ParameterGroup::new("short-ttl", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_applies_parameters() {
        let mock = MockAwsClient::new();
        let client = external::<ParameterGroupExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = parameter_group("1000");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(mock.calls(), vec!["CreateParameterGroup".to_string(), "UpdateParameterGroup".to_string()]);
        let stored = mock.dax_parameters("short-ttl").unwrap();
        assert!(stored.contains(&wire::ParameterNameValue {
            parameter_name: "query-ttl-millis".to_string(),
            parameter_value: "1000".to_string(),
        }));

        // record-ttl-millis keeps its default and is not drift
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.at_provider().unwrap().parameters.len(), 2);
    }

    #[tokio::test]
    async fn test_value_change_updates() {
        let mock = MockAwsClient::new();
        let client = external::<ParameterGroupExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = parameter_group("1000");
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.parameter_name_values = vec![value("query-ttl-millis", "5000")];
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_missing_group_is_absent() {
        let mock = MockAwsClient::new();
        let client = external::<ParameterGroupExternal>(&mock);
        let mut cr = parameter_group("1000");
        set_external_name(&mut cr, "short-ttl");

        assert!(!client.observe(&mut cr).await.unwrap().resource_exists);
        assert_eq!(mock.call_count("DescribeParameters"), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_group() {
        let mock = MockAwsClient::new();
        let client = external::<ParameterGroupExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = parameter_group("1000");
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert!(mock.dax_parameters("short-ttl").is_none());
        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
    }
}
