//! Route reconciler

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{Api, Authorizer, Route, RouteObservation, RouteParameters};

use super::{constraints_from_wire, constraints_to_wire, is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

/// Capability set of the Route kind
pub struct RouteExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

/// Copy the values API Gateway defaults into unset desired fields
fn fill_defaults(params: &mut RouteParameters, observed: &wire::Route) {
    if params.api_key_required.is_none() {
        params.api_key_required = observed.api_key_required;
    }
    if params.authorization_type.is_none() {
        params.authorization_type.clone_from(&observed.authorization_type);
    }
    if params.request_parameters.is_empty() {
        params.request_parameters = constraints_from_wire(&observed.request_parameters);
    }
}

#[async_trait]
impl ExternalResource for RouteExternal {
    type Resource = Route;
    type Response = Vec<wire::Route>;
    type Observed = wire::Route;
    type CreateInput = wire::CreateRouteInput;
    type Created = wire::Route;
    type UpdateInput = wire::UpdateRouteInput;
    type Updated = wire::Route;
    type DeleteInput = (String, String);

    const KIND: &'static str = "Route";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<RouteParameters>> {
        vec![
            site::<_, Api>(
                "apiId",
                |p| &mut p.api_id,
                |p| &mut p.api_id_ref,
                |p| p.api_id_selector.as_ref(),
            ),
            site::<_, Authorizer>(
                "authorizerId",
                |p| &mut p.authorizer_id,
                |p| &mut p.authorizer_id_ref,
                |p| p.authorizer_id_selector.as_ref(),
            ),
        ]
    }

    fn pre_observe(&self, cr: &Route, _external_name: &str) -> Result<(), ControllerError> {
        required(&cr.for_provider().api_id, "apiId").map(|_| ())
    }

    async fn describe(&self, cr: &Route, _external_name: &str) -> Result<Vec<wire::Route>, AwsError> {
        let api_id = cr.for_provider().api_id.as_deref().unwrap_or_default();
        self.client.get_routes(api_id).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::Route>) -> Option<wire::Route> {
        response.into_iter().find(|r| r.route_id == external_name)
    }

    fn late_initialize(&self, params: &mut RouteParameters, observed: &wire::Route) {
        fill_defaults(params, observed);
    }

    fn generate_observation(&self, observed: &wire::Route) -> RouteObservation {
        RouteObservation {
            route_id: Some(observed.route_id.clone()),
            api_gateway_managed: observed.api_gateway_managed,
        }
    }

    fn is_up_to_date(&self, cr: &Route, observed: &wire::Route) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        sort_set(&mut desired.authorization_scopes);
        let mut current = RouteParameters {
            route_key: observed.route_key.clone(),
            api_key_required: when_set(&desired.api_key_required, observed.api_key_required),
            authorization_scopes: observed.authorization_scopes.clone(),
            authorization_type: when_set(&desired.authorization_type, observed.authorization_type.clone()),
            authorizer_id: when_set(&desired.authorizer_id, observed.authorizer_id.clone()),
            model_selection_expression: when_set(
                &desired.model_selection_expression,
                observed.model_selection_expression.clone(),
            ),
            operation_name: when_set(&desired.operation_name, observed.operation_name.clone()),
            request_models: observed.request_models.clone(),
            request_parameters: if desired.request_parameters.is_empty() {
                BTreeMap::new()
            } else {
                constraints_from_wire(&observed.request_parameters)
            },
            route_response_selection_expression: when_set(
                &desired.route_response_selection_expression,
                observed.route_response_selection_expression.clone(),
            ),
            target: when_set(&desired.target, observed.target.clone()),
            ..desired.clone()
        };
        sort_set(&mut current.authorization_scopes);
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Route, _external_name: &str) -> Result<wire::CreateRouteInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateRouteInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            route_key: p.route_key.clone(),
            api_key_required: p.api_key_required,
            authorization_scopes: p.authorization_scopes.clone(),
            authorization_type: p.authorization_type.clone(),
            authorizer_id: p.authorizer_id.clone(),
            model_selection_expression: p.model_selection_expression.clone(),
            operation_name: p.operation_name.clone(),
            request_models: p.request_models.clone(),
            request_parameters: constraints_to_wire(&p.request_parameters),
            route_response_selection_expression: p.route_response_selection_expression.clone(),
            target: p.target.clone(),
        })
    }

    async fn create(&self, input: wire::CreateRouteInput) -> Result<wire::Route, AwsError> {
        self.client.create_route(input).await
    }

    fn assigned_id(&self, created: &wire::Route) -> Option<String> {
        Some(created.route_id.clone())
    }

    /// The create response already carries the defaulted fields
    async fn post_create(&self, cr: &mut Route, _external_name: &str, created: &wire::Route) -> Result<(), ControllerError> {
        fill_defaults(cr.for_provider_mut(), created);
        cr.set_at_provider(self.generate_observation(created));
        Ok(())
    }

    fn update_input(&self, cr: &Route, external_name: &str) -> Result<wire::UpdateRouteInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateRouteInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            route_id: external_name.to_string(),
            route_key: Some(p.route_key.clone()),
            api_key_required: p.api_key_required,
            authorization_scopes: p.authorization_scopes.clone(),
            authorization_type: p.authorization_type.clone(),
            authorizer_id: p.authorizer_id.clone(),
            model_selection_expression: p.model_selection_expression.clone(),
            operation_name: p.operation_name.clone(),
            request_models: p.request_models.clone(),
            request_parameters: constraints_to_wire(&p.request_parameters),
            route_response_selection_expression: p.route_response_selection_expression.clone(),
            target: p.target.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateRouteInput) -> Result<wire::Route, AwsError> {
        self.client.update_route(input).await
    }

    fn delete_input(&self, cr: &Route, external_name: &str) -> Result<Option<(String, String)>, ControllerError> {
        let api_id = required(&cr.for_provider().api_id, "apiId")?;
        Ok(Some((api_id.to_string(), external_name.to_string())))
    }

    async fn delete(&self, (api_id, route_id): (String, String)) -> Result<(), AwsError> {
        self.client.delete_route(&api_id, &route_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::{AuthorizerParameters, AuthorizerSpec, ParameterConstraints, RouteSpec};
    use crds::{DeletionPolicy, Reference, external_name, set_external_name};

    fn route(name: &str, route_key: &str) -> Route {
        let spec = RouteSpec {
            for_provider: RouteParameters {
                region: REGION.to_string(),
                api_id: Some("abc123".to_string()),
                route_key: route_key.to_string(),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Route::new(name, spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_then_observe_is_up_to_date() {
        let mock = MockAwsClient::new();
        mock.push_next_id("r1");
        let client = external::<RouteExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = route("get-pets", "GET /pets");
        cr.spec.for_provider.authorization_scopes = vec!["write".to_string(), "read".to_string()];
        cr.spec.for_provider.request_parameters.insert(
            "route.request.querystring.id".to_string(),
            ParameterConstraints { required: Some(true) },
        );

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "r1");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.spec.for_provider.authorization_type.as_deref(), Some("NONE"));
        assert_eq!(cr.spec.for_provider.api_key_required, Some(false));
        assert_eq!(cr.at_provider().unwrap().route_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_route_key_change_updates() {
        let mock = MockAwsClient::new();
        mock.add_route(
            "abc123",
            wire::Route {
                route_id: "r1".to_string(),
                route_key: "GET /pets".to_string(),
                ..Default::default()
            },
        );
        let client = external::<RouteExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = route("get-pets", "GET /animals");
        set_external_name(&mut cr, "r1");

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(!observation.resource_up_to_date);
        assert!(observation.diff.starts_with("spec.forProvider.routeKey"), "{}", observation.diff);

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.route("abc123", "r1").unwrap().route_key, "GET /animals");
    }

    #[tokio::test]
    async fn test_authorizer_reference_is_resolved() {
        let mock = MockAwsClient::new();
        let client = external::<RouteExternal>(&mock);
        let mut authorizer = in_namespace(
            Authorizer::new(
                "jwt",
                AuthorizerSpec {
                    for_provider: AuthorizerParameters {
                        region: REGION.to_string(),
                        ..Default::default()
                    },
                    deletion_policy: DeletionPolicy::default(),
                },
            ),
            NAMESPACE,
        );
        set_external_name(&mut authorizer, "auth1");
        let reader = MemoryReader::new().with(&authorizer);
        let mut cr = route("get-pets", "GET /pets");
        cr.spec.for_provider.authorizer_id_ref = Some(Reference::new("jwt"));

        tick(&client, &reader, &mut cr, false).await.unwrap();
        let stored = mock.route("abc123", &external_name(&cr)).unwrap();
        assert_eq!(stored.authorizer_id.as_deref(), Some("auth1"));
    }

    #[tokio::test]
    async fn test_delete_of_missing_route_succeeds() {
        let mock = MockAwsClient::new();
        let client = external::<RouteExternal>(&mock);
        let mut cr = route("get-pets", "GET /pets");
        set_external_name(&mut cr, "gone");

        client.delete(&mut cr).await.unwrap();
        assert_eq!(mock.call_count("DeleteRoute"), 1);
    }

    #[tokio::test]
    async fn test_create_writes_back_defaulted_fields() {
        let mock = MockAwsClient::new();
        mock.push_next_id("r1");
        let client = external::<RouteExternal>(&mock);
        let mut cr = route("get-pets", "GET /pets");

        client.create(&mut cr).await.unwrap();
        assert_eq!(cr.spec.for_provider.authorization_type.as_deref(), Some("NONE"));
        assert_eq!(cr.spec.for_provider.api_key_required, Some(false));
        assert_eq!(cr.at_provider().unwrap().route_id.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_generated_request_parameters_are_not_drift() {
        let mock = MockAwsClient::new();
        mock.add_route(
            "abc123",
            wire::Route {
                route_id: "r1".to_string(),
                route_key: "GET /pets/{id}".to_string(),
                request_parameters: BTreeMap::from([(
                    "route.request.path.id".to_string(),
                    wire::ParameterConstraints { required: Some(true) },
                )]),
                ..Default::default()
            },
        );
        let client = external::<RouteExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = route("get-pet", "GET /pets/{id}");
        set_external_name(&mut cr, "r1");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(mock.call_count("UpdateRoute"), 0);
        assert!(cr.spec.for_provider.request_parameters.contains_key("route.request.path.id"));
    }
}
