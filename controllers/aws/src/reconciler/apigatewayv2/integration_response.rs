//! IntegrationResponse reconciler

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{
    Api, Integration, IntegrationResponse, IntegrationResponseObservation, IntegrationResponseParameters,
};

use super::{is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

/// Capability set of the IntegrationResponse kind
pub struct IntegrationResponseExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn parents(p: &IntegrationResponseParameters) -> Result<(String, String), ControllerError> {
    Ok((
        required(&p.api_id, "apiId")?.to_string(),
        required(&p.integration_id, "integrationId")?.to_string(),
    ))
}

#[async_trait]
impl ExternalResource for IntegrationResponseExternal {
    type Resource = IntegrationResponse;
    type Response = Vec<wire::IntegrationResponse>;
    type Observed = wire::IntegrationResponse;
    type CreateInput = wire::CreateIntegrationResponseInput;
    type Created = wire::IntegrationResponse;
    type UpdateInput = wire::UpdateIntegrationResponseInput;
    type Updated = wire::IntegrationResponse;
    type DeleteInput = (String, String, String);

    const KIND: &'static str = "IntegrationResponse";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<IntegrationResponseParameters>> {
        vec![
            site::<_, Api>(
                "apiId",
                |p| &mut p.api_id,
                |p| &mut p.api_id_ref,
                |p| p.api_id_selector.as_ref(),
            ),
            site::<_, Integration>(
                "integrationId",
                |p| &mut p.integration_id,
                |p| &mut p.integration_id_ref,
                |p| p.integration_id_selector.as_ref(),
            ),
        ]
    }

    fn pre_observe(&self, cr: &IntegrationResponse, _external_name: &str) -> Result<(), ControllerError> {
        parents(cr.for_provider()).map(|_| ())
    }

    async fn describe(
        &self,
        cr: &IntegrationResponse,
        _external_name: &str,
    ) -> Result<Vec<wire::IntegrationResponse>, AwsError> {
        let p = cr.for_provider();
        let api_id = p.api_id.as_deref().unwrap_or_default();
        let integration_id = p.integration_id.as_deref().unwrap_or_default();
        self.client.get_integration_responses(api_id, integration_id).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(
        &self,
        external_name: &str,
        response: Vec<wire::IntegrationResponse>,
    ) -> Option<wire::IntegrationResponse> {
        response.into_iter().find(|r| r.integration_response_id == external_name)
    }

    fn generate_observation(&self, observed: &wire::IntegrationResponse) -> IntegrationResponseObservation {
        IntegrationResponseObservation {
            integration_response_id: Some(observed.integration_response_id.clone()),
        }
    }

    fn is_up_to_date(
        &self,
        cr: &IntegrationResponse,
        observed: &wire::IntegrationResponse,
    ) -> Result<(bool, String), ControllerError> {
        let desired = cr.for_provider();
        let current = IntegrationResponseParameters {
            integration_response_key: observed.integration_response_key.clone(),
            content_handling_strategy: when_set(
                &desired.content_handling_strategy,
                observed.content_handling_strategy.clone(),
            ),
            response_parameters: observed.response_parameters.clone(),
            response_templates: observed.response_templates.clone(),
            template_selection_expression: when_set(
                &desired.template_selection_expression,
                observed.template_selection_expression.clone(),
            ),
            ..desired.clone()
        };
        compare(desired, &current)
    }

    fn create_input(
        &self,
        cr: &IntegrationResponse,
        _external_name: &str,
    ) -> Result<wire::CreateIntegrationResponseInput, ControllerError> {
        let p = cr.for_provider();
        let (api_id, integration_id) = parents(p)?;
        Ok(wire::CreateIntegrationResponseInput {
            api_id,
            integration_id,
            integration_response_key: p.integration_response_key.clone(),
            content_handling_strategy: p.content_handling_strategy.clone(),
            response_parameters: p.response_parameters.clone(),
            response_templates: p.response_templates.clone(),
            template_selection_expression: p.template_selection_expression.clone(),
        })
    }

    async fn create(&self, input: wire::CreateIntegrationResponseInput) -> Result<wire::IntegrationResponse, AwsError> {
        self.client.create_integration_response(input).await
    }

    fn assigned_id(&self, created: &wire::IntegrationResponse) -> Option<String> {
        Some(created.integration_response_id.clone())
    }

    fn update_input(
        &self,
        cr: &IntegrationResponse,
        external_name: &str,
    ) -> Result<wire::UpdateIntegrationResponseInput, ControllerError> {
        let p = cr.for_provider();
        let (api_id, integration_id) = parents(p)?;
        Ok(wire::UpdateIntegrationResponseInput {
            api_id,
            integration_id,
            integration_response_id: external_name.to_string(),
            integration_response_key: Some(p.integration_response_key.clone()),
            content_handling_strategy: p.content_handling_strategy.clone(),
            response_parameters: p.response_parameters.clone(),
            response_templates: p.response_templates.clone(),
            template_selection_expression: p.template_selection_expression.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateIntegrationResponseInput) -> Result<wire::IntegrationResponse, AwsError> {
        self.client.update_integration_response(input).await
    }

    fn delete_input(
        &self,
        cr: &IntegrationResponse,
        external_name: &str,
    ) -> Result<Option<(String, String, String)>, ControllerError> {
        let (api_id, integration_id) = parents(cr.for_provider())?;
        Ok(Some((api_id, integration_id, external_name.to_string())))
    }

    async fn delete(&self, (api_id, integration_id, id): (String, String, String)) -> Result<(), AwsError> {
        self.client.delete_integration_response(&api_id, &integration_id, &id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, api, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::{IntegrationParameters, IntegrationResponseSpec, IntegrationSpec};
    use crds::{DeletionPolicy, Reference, external_name, set_external_name};

    fn integration_response() -> IntegrationResponse {
        let spec = IntegrationResponseSpec {
            for_provider: IntegrationResponseParameters {
                region: REGION.to_string(),
                api_id_ref: Some(Reference::new("my-api")),
                integration_id_ref: Some(Reference::new("backend")),
                integration_response_key: "/200/".to_string(),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(IntegrationResponse::new("ok", spec), NAMESPACE)
    }

    fn reader() -> MemoryReader {
        let mut parent_api = api("my-api");
        set_external_name(&mut parent_api, "abc123");
        let mut parent = in_namespace(
            Integration::new(
                "backend",
                IntegrationSpec {
                    for_provider: IntegrationParameters {
                        region: REGION.to_string(),
                        integration_type: "MOCK".to_string(),
                        ..Default::default()
                    },
                    deletion_policy: DeletionPolicy::default(),
                },
            ),
            NAMESPACE,
        );
        set_external_name(&mut parent, "int1");
        MemoryReader::new().with(&parent_api).with(&parent)
    }

    #[tokio::test]
    async fn test_both_parents_resolve_before_create() {
        let mock = MockAwsClient::new();
        mock.push_next_id("ir1");
        let client = external::<IntegrationResponseExternal>(&mock);
        let reader = reader();
        let mut cr = integration_response();
        cr.spec
            .for_provider
            .response_templates
            .insert("application/json".to_string(), "{}".to_string());

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(cr.spec.for_provider.api_id.as_deref(), Some("abc123"));
        assert_eq!(cr.spec.for_provider.integration_id.as_deref(), Some("int1"));
        assert_eq!(external_name(&cr), "ir1");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_unresolvable_parent_makes_no_calls() {
        let mock = MockAwsClient::new();
        let client = external::<IntegrationResponseExternal>(&mock);
        let mut cr = integration_response();

        let err = tick(&client, &MemoryReader::new(), &mut cr, false).await.unwrap_err();
        assert!(err.to_string().contains("spec.forProvider.apiId"), "{err}");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_template_drift_updates() {
        let mock = MockAwsClient::new();
        let client = external::<IntegrationResponseExternal>(&mock);
        let reader = reader();
        let mut cr = integration_response();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.template_selection_expression = Some("$default".to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.call_count("UpdateIntegrationResponse"), 1);
    }
}
