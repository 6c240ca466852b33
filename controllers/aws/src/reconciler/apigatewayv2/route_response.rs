//! RouteResponse reconciler

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{Api, Route, RouteResponse, RouteResponseObservation, RouteResponseParameters};

use super::{constraints_from_wire, constraints_to_wire, is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

/// Capability set of the RouteResponse kind
pub struct RouteResponseExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

/// API and route identifiers of a record
fn parents(p: &RouteResponseParameters) -> Result<(String, String), ControllerError> {
    Ok((
        required(&p.api_id, "apiId")?.to_string(),
        required(&p.route_id, "routeId")?.to_string(),
    ))
}

#[async_trait]
impl ExternalResource for RouteResponseExternal {
    type Resource = RouteResponse;
    type Response = Vec<wire::RouteResponse>;
    type Observed = wire::RouteResponse;
    type CreateInput = wire::CreateRouteResponseInput;
    type Created = wire::RouteResponse;
    type UpdateInput = wire::UpdateRouteResponseInput;
    type Updated = wire::RouteResponse;
    type DeleteInput = (String, String, String);

    const KIND: &'static str = "RouteResponse";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<RouteResponseParameters>> {
        vec![
            site::<_, Api>(
                "apiId",
                |p| &mut p.api_id,
                |p| &mut p.api_id_ref,
                |p| p.api_id_selector.as_ref(),
            ),
            site::<_, Route>(
                "routeId",
                |p| &mut p.route_id,
                |p| &mut p.route_id_ref,
                |p| p.route_id_selector.as_ref(),
            ),
        ]
    }

    fn pre_observe(&self, cr: &RouteResponse, _external_name: &str) -> Result<(), ControllerError> {
        parents(cr.for_provider()).map(|_| ())
    }

    async fn describe(&self, cr: &RouteResponse, _external_name: &str) -> Result<Vec<wire::RouteResponse>, AwsError> {
        let p = cr.for_provider();
        let api_id = p.api_id.as_deref().unwrap_or_default();
        let route_id = p.route_id.as_deref().unwrap_or_default();
        self.client.get_route_responses(api_id, route_id).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::RouteResponse>) -> Option<wire::RouteResponse> {
        response.into_iter().find(|r| r.route_response_id == external_name)
    }

    fn generate_observation(&self, observed: &wire::RouteResponse) -> RouteResponseObservation {
        RouteResponseObservation {
            route_response_id: Some(observed.route_response_id.clone()),
        }
    }

    fn is_up_to_date(&self, cr: &RouteResponse, observed: &wire::RouteResponse) -> Result<(bool, String), ControllerError> {
        let desired = cr.for_provider();
        let current = RouteResponseParameters {
            route_response_key: observed.route_response_key.clone(),
            model_selection_expression: when_set(
                &desired.model_selection_expression,
                observed.model_selection_expression.clone(),
            ),
            response_models: observed.response_models.clone(),
            response_parameters: constraints_from_wire(&observed.response_parameters),
            ..desired.clone()
        };
        compare(desired, &current)
    }

    fn create_input(&self, cr: &RouteResponse, _external_name: &str) -> Result<wire::CreateRouteResponseInput, ControllerError> {
        let p = cr.for_provider();
        let (api_id, route_id) = parents(p)?;
        Ok(wire::CreateRouteResponseInput {
            api_id,
            route_id,
            route_response_key: p.route_response_key.clone(),
            model_selection_expression: p.model_selection_expression.clone(),
            response_models: p.response_models.clone(),
            response_parameters: constraints_to_wire(&p.response_parameters),
        })
    }

    async fn create(&self, input: wire::CreateRouteResponseInput) -> Result<wire::RouteResponse, AwsError> {
        self.client.create_route_response(input).await
    }

    fn assigned_id(&self, created: &wire::RouteResponse) -> Option<String> {
        Some(created.route_response_id.clone())
    }

    fn update_input(&self, cr: &RouteResponse, external_name: &str) -> Result<wire::UpdateRouteResponseInput, ControllerError> {
        let p = cr.for_provider();
        let (api_id, route_id) = parents(p)?;
        Ok(wire::UpdateRouteResponseInput {
            api_id,
            route_id,
            route_response_id: external_name.to_string(),
            route_response_key: Some(p.route_response_key.clone()),
            model_selection_expression: p.model_selection_expression.clone(),
            response_models: p.response_models.clone(),
            response_parameters: constraints_to_wire(&p.response_parameters),
        })
    }

    async fn update(&self, input: wire::UpdateRouteResponseInput) -> Result<wire::RouteResponse, AwsError> {
        self.client.update_route_response(input).await
    }

    fn delete_input(
        &self,
        cr: &RouteResponse,
        external_name: &str,
    ) -> Result<Option<(String, String, String)>, ControllerError> {
        let (api_id, route_id) = parents(cr.for_provider())?;
        Ok(Some((api_id, route_id, external_name.to_string())))
    }

    async fn delete(&self, (api_id, route_id, id): (String, String, String)) -> Result<(), AwsError> {
        self.client.delete_route_response(&api_id, &route_id, &id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::RouteResponseSpec;
    use crds::{DeletionPolicy, external_name, set_external_name};

    fn route_response(route_id: Option<&str>) -> RouteResponse {
        let spec = RouteResponseSpec {
            for_provider: RouteResponseParameters {
                region: REGION.to_string(),
                api_id: Some("abc123".to_string()),
                route_id: route_id.map(str::to_string),
                route_response_key: "$default".to_string(),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(RouteResponse::new("default-response", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_observe_scopes_list_to_route() {
        let mock = MockAwsClient::new();
        let response = wire::RouteResponse {
            route_response_id: "rr1".to_string(),
            route_response_key: "$default".to_string(),
            ..Default::default()
        };
        mock.add_route_response("abc123", "r1", response.clone());
        mock.add_route_response("abc123", "r2", response);
        let client = external::<RouteResponseExternal>(&mock);

        let mut cr = route_response(Some("r1"));
        set_external_name(&mut cr, "rr1");
        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(observation.resource_up_to_date);

        let mut elsewhere = route_response(Some("r3"));
        set_external_name(&mut elsewhere, "rr1");
        assert!(!client.observe(&mut elsewhere).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn test_missing_route_id_is_a_precondition() {
        let mock = MockAwsClient::new();
        let client = external::<RouteResponseExternal>(&mock);
        let mut cr = route_response(None);

        let err = client.create(&mut cr).await.unwrap_err();
        assert_eq!(err.to_string(), "spec.forProvider.routeId is required");
        assert!(external_name(&cr).is_empty());
        assert_eq!(mock.call_count("CreateRouteResponse"), 0);
    }

    #[tokio::test]
    async fn test_response_model_drift() {
        let mock = MockAwsClient::new();
        let client = external::<RouteResponseExternal>(&mock);
        let mut cr = route_response(Some("r1"));
        client.create(&mut cr).await.unwrap();

        cr.spec
            .for_provider
            .response_models
            .insert("application/json".to_string(), "Pet".to_string());
        let observation = client.observe(&mut cr).await.unwrap();
        assert!(!observation.resource_up_to_date);
        assert_eq!(
            observation.diff,
            "spec.forProvider.responseModels: desired {\"application/json\":\"Pet\"}, observed <unset>"
        );
    }
}
