//! Deployment reconciler
//!
//! `stageName` only selects the stage to deploy to on create; afterwards the
//! description is the one updatable field.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{Api, Deployment, DeploymentObservation, DeploymentParameters, Stage};

use super::{is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ReferenceSite, ServiceClients};

/// Capability set of the Deployment kind
pub struct DeploymentExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

#[async_trait]
impl ExternalResource for DeploymentExternal {
    type Resource = Deployment;
    type Response = Vec<wire::Deployment>;
    type Observed = wire::Deployment;
    type CreateInput = wire::CreateDeploymentInput;
    type Created = wire::Deployment;
    type UpdateInput = wire::UpdateDeploymentInput;
    type Updated = wire::Deployment;
    type DeleteInput = (String, String);

    const KIND: &'static str = "Deployment";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("PENDING", LifecycleState::Creating),
        ("DEPLOYED", LifecycleState::Available),
        ("FAILED", LifecycleState::Unavailable),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<DeploymentParameters>> {
        vec![
            site::<_, Api>(
                "apiId",
                |p| &mut p.api_id,
                |p| &mut p.api_id_ref,
                |p| p.api_id_selector.as_ref(),
            ),
            site::<_, Stage>(
                "stageName",
                |p| &mut p.stage_name,
                |p| &mut p.stage_name_ref,
                |p| p.stage_name_selector.as_ref(),
            ),
        ]
    }

    fn pre_observe(&self, cr: &Deployment, _external_name: &str) -> Result<(), ControllerError> {
        required(&cr.for_provider().api_id, "apiId").map(|_| ())
    }

    async fn describe(&self, cr: &Deployment, _external_name: &str) -> Result<Vec<wire::Deployment>, AwsError> {
        let api_id = cr.for_provider().api_id.as_deref().unwrap_or_default();
        self.client.get_deployments(api_id).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::Deployment>) -> Option<wire::Deployment> {
        response.into_iter().find(|d| d.deployment_id == external_name)
    }

    fn observed_status<'a>(&self, observed: &'a wire::Deployment) -> Option<&'a str> {
        observed.deployment_status.as_deref()
    }

    fn generate_observation(&self, observed: &wire::Deployment) -> DeploymentObservation {
        DeploymentObservation {
            deployment_id: Some(observed.deployment_id.clone()),
            auto_deployed: observed.auto_deployed,
            created_date: observed.created_date,
            deployment_status: observed.deployment_status.clone(),
            deployment_status_message: observed.deployment_status_message.clone(),
        }
    }

    fn is_up_to_date(&self, cr: &Deployment, observed: &wire::Deployment) -> Result<(bool, String), ControllerError> {
        let desired = cr.for_provider();
        let current = DeploymentParameters {
            description: when_set(&desired.description, observed.description.clone()),
            ..desired.clone()
        };
        compare(desired, &current)
    }

    fn create_input(&self, cr: &Deployment, _external_name: &str) -> Result<wire::CreateDeploymentInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateDeploymentInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            description: p.description.clone(),
            stage_name: p.stage_name.clone(),
        })
    }

    async fn create(&self, input: wire::CreateDeploymentInput) -> Result<wire::Deployment, AwsError> {
        self.client.create_deployment(input).await
    }

    fn assigned_id(&self, created: &wire::Deployment) -> Option<String> {
        Some(created.deployment_id.clone())
    }

    fn update_input(&self, cr: &Deployment, external_name: &str) -> Result<wire::UpdateDeploymentInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateDeploymentInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            deployment_id: external_name.to_string(),
            description: p.description.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateDeploymentInput) -> Result<wire::Deployment, AwsError> {
        self.client.update_deployment(input).await
    }

    fn delete_input(&self, cr: &Deployment, external_name: &str) -> Result<Option<(String, String)>, ControllerError> {
        let api_id = required(&cr.for_provider().api_id, "apiId")?;
        Ok(Some((api_id.to_string(), external_name.to_string())))
    }

    async fn delete(&self, (api_id, deployment_id): (String, String)) -> Result<(), AwsError> {
        self.client.delete_deployment(&api_id, &deployment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::{DeploymentSpec, StageParameters, StageSpec};
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, Reference, external_name, find_condition, set_external_name};

    fn deployment() -> Deployment {
        let spec = DeploymentSpec {
            for_provider: DeploymentParameters {
                region: REGION.to_string(),
                api_id: Some("abc123".to_string()),
                description: Some("first".to_string()),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Deployment::new("release-1", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_deploys_to_referenced_stage() {
        let mock = MockAwsClient::new();
        mock.add_stage(
            "abc123",
            wire::Stage {
                stage_name: "prod".to_string(),
                ..Default::default()
            },
        );
        mock.push_next_id("dep1");
        let mut stage = in_namespace(
            Stage::new(
                "prod",
                StageSpec {
                    for_provider: StageParameters {
                        region: REGION.to_string(),
                        ..Default::default()
                    },
                    deletion_policy: DeletionPolicy::default(),
                },
            ),
            NAMESPACE,
        );
        set_external_name(&mut stage, "prod");
        let reader = MemoryReader::new().with(&stage);
        let client = external::<DeploymentExternal>(&mock);
        let mut cr = deployment();
        cr.spec.for_provider.stage_name_ref = Some(Reference::new("prod"));

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "dep1");
        assert_eq!(mock.stage("abc123", "prod").unwrap().deployment_id.as_deref(), Some("dep1"));

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        let ready = find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason);
        assert_eq!(ready, Some(ConditionReason::Available));
        assert_eq!(cr.at_provider().unwrap().deployment_status.as_deref(), Some("DEPLOYED"));
    }

    #[tokio::test]
    async fn test_pending_deployment_is_creating() {
        let mock = MockAwsClient::new();
        mock.add_deployment(
            "abc123",
            wire::Deployment {
                deployment_id: "dep1".to_string(),
                deployment_status: Some("PENDING".to_string()),
                description: Some("first".to_string()),
                ..Default::default()
            },
        );
        let client = external::<DeploymentExternal>(&mock);
        let mut cr = deployment();
        set_external_name(&mut cr, "dep1");

        client.observe(&mut cr).await.unwrap();
        let ready = find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason);
        assert_eq!(ready, Some(ConditionReason::Creating));
    }

    #[tokio::test]
    async fn test_description_change_updates() {
        let mock = MockAwsClient::new();
        let client = external::<DeploymentExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = deployment();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.description = Some("second".to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }
}
