//! SageMaker Model reconciler

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::sagemaker as wire;
use aws_client::{AwsError, SageMakerApi};
use crds::Managed;
use crds::sagemaker::{Model, ModelContainer, ModelObservation, ModelParameters, VpcConfig};

use super::{not_updatable, tags_to_wire};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ServiceClients};

/// Capability set of the SageMaker Model kind
pub struct ModelExternal {
    client: Arc<dyn SageMakerApi>,
}

fn container_to_wire(c: &ModelContainer) -> wire::ContainerDefinition {
    wire::ContainerDefinition {
        container_hostname: c.container_hostname.clone(),
        environment: c.environment.clone(),
        image: c.image.clone(),
        mode: c.mode.clone(),
        model_data_url: c.model_data_url.clone(),
    }
}

/// Observed container with fields the record leaves unset dropped
fn container_from_wire(desired: &ModelContainer, observed: &wire::ContainerDefinition) -> ModelContainer {
    ModelContainer {
        container_hostname: when_set(&desired.container_hostname, observed.container_hostname.clone()),
        environment: observed.environment.clone(),
        image: when_set(&desired.image, observed.image.clone()),
        mode: when_set(&desired.mode, observed.mode.clone()),
        model_data_url: when_set(&desired.model_data_url, observed.model_data_url.clone()),
    }
}

fn vpc_config_to_wire(v: &VpcConfig) -> wire::VpcConfig {
    wire::VpcConfig {
        security_group_ids: v.security_group_ids.clone(),
        subnets: v.subnets.clone(),
    }
}

fn sorted_vpc_config(v: &VpcConfig) -> VpcConfig {
    let mut v = v.clone();
    sort_set(&mut v.security_group_ids);
    sort_set(&mut v.subnets);
    v
}

#[async_trait]
impl ExternalResource for ModelExternal {
    type Resource = Model;
    type Response = wire::Model;
    type Observed = wire::Model;
    type CreateInput = wire::CreateModelInput;
    type Created = String;
    type UpdateInput = ();
    type Updated = ();
    type DeleteInput = String;

    const KIND: &'static str = "Model";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.sagemaker),
        }
    }

    async fn describe(&self, _cr: &Model, external_name: &str) -> Result<wire::Model, AwsError> {
        self.client.describe_model(external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        err.is_code_with_message("ValidationException", "Could not find model")
    }

    fn filter_list(&self, external_name: &str, response: wire::Model) -> Option<wire::Model> {
        (response.model_name == external_name).then_some(response)
    }

    fn late_initialize(&self, params: &mut ModelParameters, observed: &wire::Model) {
        if params.enable_network_isolation.is_none() {
            params.enable_network_isolation = observed.enable_network_isolation;
        }
    }

    fn generate_observation(&self, observed: &wire::Model) -> ModelObservation {
        ModelObservation {
            model_arn: Some(observed.model_arn.clone()),
            creation_time: observed.creation_time,
        }
    }

    /// Every field is fixed at create; any difference is reported here
    fn immutable_violation(&self, cr: &Model, observed: &wire::Model) -> Option<String> {
        let mut desired = cr.for_provider().clone();
        desired.vpc_config = desired.vpc_config.as_ref().map(sorted_vpc_config);

        let none = ModelContainer::default();
        let primary_container = observed
            .primary_container
            .as_ref()
            .map(|o| container_from_wire(desired.primary_container.as_ref().unwrap_or(&none), o));
        let containers = observed
            .containers
            .iter()
            .enumerate()
            .map(|(i, o)| container_from_wire(desired.containers.get(i).unwrap_or(&none), o))
            .collect();
        let vpc_config = observed.vpc_config.as_ref().map(|v| {
            sorted_vpc_config(&VpcConfig {
                security_group_ids: v.security_group_ids.clone(),
                subnets: v.subnets.clone(),
            })
        });

        let current = ModelParameters {
            execution_role_arn: observed
                .execution_role_arn
                .clone()
                .unwrap_or_else(|| desired.execution_role_arn.clone()),
            primary_container,
            containers,
            enable_network_isolation: when_set(&desired.enable_network_isolation, observed.enable_network_isolation),
            vpc_config: when_set(&desired.vpc_config, vpc_config),
            ..desired.clone()
        };

        match compare(&desired, &current) {
            Ok((true, _)) => None,
            Ok((false, diff)) => Some(diff),
            Err(e) => Some(e.to_string()),
        }
    }

    fn create_input(&self, cr: &Model, external_name: &str) -> Result<wire::CreateModelInput, ControllerError> {
        let params = cr.for_provider();
        Ok(wire::CreateModelInput {
            model_name: external_name.to_string(),
            execution_role_arn: params.execution_role_arn.clone(),
            primary_container: params.primary_container.as_ref().map(container_to_wire),
            containers: params.containers.iter().map(container_to_wire).collect(),
            enable_network_isolation: params.enable_network_isolation,
            vpc_config: params.vpc_config.as_ref().map(vpc_config_to_wire),
            tags: tags_to_wire(&params.tags),
        })
    }

    async fn create(&self, input: wire::CreateModelInput) -> Result<String, AwsError> {
        self.client.create_model(input).await
    }

    fn update_input(&self, _cr: &Model, _external_name: &str) -> Result<(), ControllerError> {
        Err(not_updatable(Self::KIND))
    }

    async fn update(&self, _input: ()) -> Result<(), AwsError> {
        Ok(())
    }

    fn delete_input(&self, _cr: &Model, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, name: String) -> Result<(), AwsError> {
        self.client.delete_model(&name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::sagemaker::ModelSpec;
    use crds::{DeletionPolicy, Tag};

    const ROLE: &str = "arn:aws:iam::123456789012:role/sagemaker";

    fn model(image: &str) -> Model {
        let spec = ModelSpec {
            for_provider: ModelParameters {
                region: REGION.to_string(),
                execution_role_arn: ROLE.to_string(),
                primary_container: Some(ModelContainer {
                    image: Some(image.to_string()),
                    model_data_url: Some("s3://models/xgboost/model.tar.gz".to_string()),
                    ..Default::default()
                }),
                vpc_config: Some(VpcConfig {
                    security_group_ids: vec!["sg-2".to_string(), "sg-1".to_string()],
                    subnets: vec!["subnet-a".to_string()],
                }),
                tags: vec![Tag::new("team", "ml")],
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Model::new("xgboost", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_then_up_to_date() {
        let mock = MockAwsClient::new();
        let client = external::<ModelExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = model("xgboost:1");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);

        let observation = cr.at_provider().unwrap();
        assert_eq!(
            observation.model_arn.as_deref(),
            Some("arn:aws:sagemaker:us-east-1:123456789012:model/xgboost")
        );
        // Late-initialized from the service default
        assert_eq!(cr.spec.for_provider.enable_network_isolation, Some(false));
    }

    #[tokio::test]
    async fn test_image_change_is_rejected() {
        let mock = MockAwsClient::new();
        let client = external::<ModelExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = model("xgboost:1");
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.primary_container = Some(ModelContainer {
            image: Some("xgboost:2".to_string()),
            model_data_url: Some("s3://models/xgboost/model.tar.gz".to_string()),
            ..Default::default()
        });
        let err = tick(&client, &reader, &mut cr, false).await.unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().starts_with("cannot update Model"));
        assert_eq!(mock.call_count("CreateModel"), 1);
    }

    #[tokio::test]
    async fn test_missing_model_is_absent() {
        let mock = MockAwsClient::new();
        let client = external::<ModelExternal>(&mock);
        let mut cr = model("xgboost:1");
        crds::set_external_name(&mut cr, "xgboost");

        assert!(!client.observe(&mut cr).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn test_delete_then_released() {
        let mock = MockAwsClient::new();
        let client = external::<ModelExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = model("xgboost:1");
        tick(&client, &reader, &mut cr, false).await.unwrap();

        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Deleting);
        assert!(mock.model("xgboost").is_none());
        assert_eq!(tick(&client, &reader, &mut cr, true).await.unwrap(), Outcome::Released);
    }
}
