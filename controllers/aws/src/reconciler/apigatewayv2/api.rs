//! Api reconciler
//!
//! AWS assigns the API ID on create. Tags are not part of UpdateApi, so they
//! are synced separately against the tagging ARN after every update.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::ApiGatewayV2Api;
use aws_client::AwsError;
use aws_client::models::apigatewayv2 as wire;
use crds::Managed;
use crds::apigatewayv2::{Api, ApiObservation, ApiParameters, Cors};

use super::{is_not_found, normalize_tags, sync_tags, tag_list, tag_map, tagging_arn};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ServiceClients};

/// Capability set of the Api kind
pub struct ApiExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn cors_to_wire(cors: &Cors) -> wire::Cors {
    wire::Cors {
        allow_credentials: cors.allow_credentials,
        allow_headers: cors.allow_headers.clone(),
        allow_methods: cors.allow_methods.clone(),
        allow_origins: cors.allow_origins.clone(),
        expose_headers: cors.expose_headers.clone(),
        max_age: cors.max_age,
    }
}

fn cors_from_wire(cors: &wire::Cors) -> Cors {
    Cors {
        allow_credentials: cors.allow_credentials,
        allow_headers: cors.allow_headers.clone(),
        allow_methods: cors.allow_methods.clone(),
        allow_origins: cors.allow_origins.clone(),
        expose_headers: cors.expose_headers.clone(),
        max_age: cors.max_age,
    }
}

/// Desired state with tags in key order
fn canonical(params: &ApiParameters) -> ApiParameters {
    let mut params = params.clone();
    normalize_tags(&mut params.tags);
    params
}

#[async_trait]
impl ExternalResource for ApiExternal {
    type Resource = Api;
    type Response = wire::Api;
    type Observed = wire::Api;
    type CreateInput = wire::CreateApiInput;
    type Created = wire::Api;
    type UpdateInput = wire::UpdateApiInput;
    type Updated = wire::Api;
    type DeleteInput = String;

    const KIND: &'static str = "Api";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    async fn describe(&self, _cr: &Api, external_name: &str) -> Result<wire::Api, AwsError> {
        self.client.get_api(external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, _external_name: &str, response: wire::Api) -> Option<wire::Api> {
        Some(response)
    }

    fn late_initialize(&self, params: &mut ApiParameters, observed: &wire::Api) {
        if params.api_key_selection_expression.is_none() {
            params.api_key_selection_expression.clone_from(&observed.api_key_selection_expression);
        }
        if params.route_selection_expression.is_none() {
            params.route_selection_expression.clone_from(&observed.route_selection_expression);
        }
        if params.disable_execute_api_endpoint.is_none() {
            params.disable_execute_api_endpoint = observed.disable_execute_api_endpoint;
        }
    }

    fn generate_observation(&self, observed: &wire::Api) -> ApiObservation {
        ApiObservation {
            api_id: Some(observed.api_id.clone()),
            api_endpoint: observed.api_endpoint.clone(),
            api_gateway_managed: observed.api_gateway_managed,
            created_date: observed.created_date,
            warnings: observed.warnings.clone(),
        }
    }

    fn is_up_to_date(&self, cr: &Api, observed: &wire::Api) -> Result<(bool, String), ControllerError> {
        let desired = canonical(cr.for_provider());
        let current = ApiParameters {
            name: observed.name.clone(),
            api_key_selection_expression: when_set(
                &desired.api_key_selection_expression,
                observed.api_key_selection_expression.clone(),
            ),
            cors_configuration: when_set(
                &desired.cors_configuration,
                observed.cors_configuration.as_ref().map(cors_from_wire),
            ),
            description: when_set(&desired.description, observed.description.clone()),
            disable_execute_api_endpoint: when_set(
                &desired.disable_execute_api_endpoint,
                observed.disable_execute_api_endpoint,
            ),
            route_selection_expression: when_set(
                &desired.route_selection_expression,
                observed.route_selection_expression.clone(),
            ),
            version: when_set(&desired.version, observed.version.clone()),
            tags: tag_list(&observed.tags),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn immutable_violation(&self, cr: &Api, observed: &wire::Api) -> Option<String> {
        let desired = &cr.for_provider().protocol_type;
        (!observed.protocol_type.is_empty() && *desired != observed.protocol_type).then(|| {
            format!(
                "spec.forProvider.protocolType cannot change from {} to {desired}",
                observed.protocol_type
            )
        })
    }

    fn create_input(&self, cr: &Api, _external_name: &str) -> Result<wire::CreateApiInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateApiInput {
            name: p.name.clone(),
            protocol_type: p.protocol_type.clone(),
            api_key_selection_expression: p.api_key_selection_expression.clone(),
            cors_configuration: p.cors_configuration.as_ref().map(cors_to_wire),
            description: p.description.clone(),
            disable_execute_api_endpoint: p.disable_execute_api_endpoint,
            route_selection_expression: p.route_selection_expression.clone(),
            version: p.version.clone(),
            tags: tag_map(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateApiInput) -> Result<wire::Api, AwsError> {
        self.client.create_api(input).await
    }

    fn assigned_id(&self, created: &wire::Api) -> Option<String> {
        Some(created.api_id.clone())
    }

    fn update_input(&self, cr: &Api, external_name: &str) -> Result<wire::UpdateApiInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateApiInput {
            api_id: external_name.to_string(),
            name: Some(p.name.clone()),
            api_key_selection_expression: p.api_key_selection_expression.clone(),
            cors_configuration: p.cors_configuration.as_ref().map(cors_to_wire),
            description: p.description.clone(),
            disable_execute_api_endpoint: p.disable_execute_api_endpoint,
            route_selection_expression: p.route_selection_expression.clone(),
            version: p.version.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateApiInput) -> Result<wire::Api, AwsError> {
        self.client.update_api(input).await
    }

    async fn post_update(&self, cr: &mut Api, external_name: &str, updated: wire::Api) -> Result<(), ControllerError> {
        let arn = tagging_arn(cr.region(), &format!("apis/{external_name}"));
        sync_tags(self.client.as_ref(), Self::KIND, &arn, &cr.for_provider().tags, &updated.tags).await?;
        Ok(())
    }

    fn delete_input(&self, _cr: &Api, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, api_id: String) -> Result<(), AwsError> {
        self.client.delete_api(&api_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{api, external};
    use aws_client::MockAwsClient;
    use crds::{CONDITION_TYPE_READY, ConditionReason, Tag, external_name, find_condition};

    fn ready(cr: &Api) -> Option<ConditionReason> {
        find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason)
    }

    #[tokio::test]
    async fn test_create_assigns_api_id_as_external_name() {
        let mock = MockAwsClient::new();
        mock.push_next_id("abc123");
        let client = external::<ApiExternal>(&mock);
        let mut cr = api("my-api");

        let creation = client.create(&mut cr).await.unwrap();
        assert!(creation.external_name_assigned);
        assert_eq!(external_name(&cr), "abc123");
        assert_eq!(ready(&cr), Some(ConditionReason::Creating));

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(observation.resource_up_to_date);
        assert!(observation.late_initialized);
        assert_eq!(ready(&cr), Some(ConditionReason::Available));
        let at_provider = cr.at_provider().unwrap();
        assert_eq!(at_provider.api_id.as_deref(), Some("abc123"));
        assert_eq!(
            at_provider.api_endpoint.as_deref(),
            Some("https://abc123.execute-api.us-east-1.amazonaws.com")
        );
        assert_eq!(
            cr.spec.for_provider.route_selection_expression.as_deref(),
            Some("$request.method $request.path")
        );
    }

    #[tokio::test]
    async fn test_observe_without_external_name_makes_no_calls() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let mut cr = api("my-api");

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(!observation.resource_exists);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tag_drift_is_synced_on_update() {
        let mock = MockAwsClient::new();
        mock.push_next_id("abc123");
        let client = external::<ApiExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = api("my-api");
        cr.spec.for_provider.tags = vec![Tag::new("team", "web"), Tag::new("env", "prod")];
        tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);

        cr.spec.for_provider.tags = vec![Tag::new("env", "dev")];
        let (up_to_date, diff) = client
            .resource()
            .is_up_to_date(&cr, &mock.api("abc123").unwrap())
            .unwrap();
        assert!(!up_to_date);
        assert!(diff.starts_with("spec.forProvider.tags"), "{diff}");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        let tags = mock.api("abc123").unwrap().tags;
        assert_eq!(tags, tag_map(&[Tag::new("env", "dev")]));
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_protocol_change_is_rejected() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let mut cr = api("my-api");
        client.create(&mut cr).await.unwrap();

        cr.spec.for_provider.protocol_type = "WEBSOCKET".to_string();
        let err = client.observe(&mut cr).await.unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(
            err.to_string(),
            "cannot update Api: spec.forProvider.protocolType cannot change from HTTP to WEBSOCKET"
        );
    }
}
