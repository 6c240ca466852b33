//! Authorizer reconciler

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{Api, Authorizer, AuthorizerObservation, AuthorizerParameters, JwtConfiguration};

use super::{is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

/// Capability set of the Authorizer kind
pub struct AuthorizerExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn jwt_to_wire(jwt: &JwtConfiguration) -> wire::JwtConfiguration {
    wire::JwtConfiguration {
        audience: jwt.audience.clone(),
        issuer: jwt.issuer.clone(),
    }
}

fn jwt_from_wire(jwt: &wire::JwtConfiguration) -> JwtConfiguration {
    let mut audience = jwt.audience.clone();
    sort_set(&mut audience);
    JwtConfiguration {
        audience,
        issuer: jwt.issuer.clone(),
    }
}

#[async_trait]
impl ExternalResource for AuthorizerExternal {
    type Resource = Authorizer;
    type Response = wire::Authorizer;
    type Observed = wire::Authorizer;
    type CreateInput = wire::CreateAuthorizerInput;
    type Created = wire::Authorizer;
    type UpdateInput = wire::UpdateAuthorizerInput;
    type Updated = wire::Authorizer;
    type DeleteInput = (String, String);

    const KIND: &'static str = "Authorizer";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<AuthorizerParameters>> {
        vec![site::<_, Api>(
            "apiId",
            |p| &mut p.api_id,
            |p| &mut p.api_id_ref,
            |p| p.api_id_selector.as_ref(),
        )]
    }

    fn pre_observe(&self, cr: &Authorizer, _external_name: &str) -> Result<(), ControllerError> {
        required(&cr.for_provider().api_id, "apiId").map(|_| ())
    }

    async fn describe(&self, cr: &Authorizer, external_name: &str) -> Result<wire::Authorizer, AwsError> {
        let api_id = cr.for_provider().api_id.as_deref().unwrap_or_default();
        self.client.get_authorizer(api_id, external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, _external_name: &str, response: wire::Authorizer) -> Option<wire::Authorizer> {
        Some(response)
    }

    fn late_initialize(&self, params: &mut AuthorizerParameters, observed: &wire::Authorizer) {
        if params.authorizer_result_ttl_in_seconds.is_none() {
            params.authorizer_result_ttl_in_seconds = observed.authorizer_result_ttl_in_seconds;
        }
    }

    fn generate_observation(&self, observed: &wire::Authorizer) -> AuthorizerObservation {
        AuthorizerObservation {
            authorizer_id: Some(observed.authorizer_id.clone()),
        }
    }

    fn is_up_to_date(&self, cr: &Authorizer, observed: &wire::Authorizer) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        if let Some(jwt) = desired.jwt_configuration.as_mut() {
            sort_set(&mut jwt.audience);
        }
        let current = AuthorizerParameters {
            name: observed.name.clone(),
            authorizer_type: observed.authorizer_type.clone().unwrap_or_default(),
            // The invocation role is write-only
            authorizer_credentials_arn: desired.authorizer_credentials_arn.clone(),
            authorizer_payload_format_version: when_set(
                &desired.authorizer_payload_format_version,
                observed.authorizer_payload_format_version.clone(),
            ),
            authorizer_result_ttl_in_seconds: when_set(
                &desired.authorizer_result_ttl_in_seconds,
                observed.authorizer_result_ttl_in_seconds,
            ),
            authorizer_uri: when_set(&desired.authorizer_uri, observed.authorizer_uri.clone()),
            enable_simple_responses: when_set(&desired.enable_simple_responses, observed.enable_simple_responses),
            identity_source: observed.identity_source.clone(),
            identity_validation_expression: when_set(
                &desired.identity_validation_expression,
                observed.identity_validation_expression.clone(),
            ),
            jwt_configuration: when_set(
                &desired.jwt_configuration,
                observed.jwt_configuration.as_ref().map(jwt_from_wire),
            ),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Authorizer, _external_name: &str) -> Result<wire::CreateAuthorizerInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateAuthorizerInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            name: p.name.clone(),
            authorizer_type: p.authorizer_type.clone(),
            authorizer_credentials_arn: p.authorizer_credentials_arn.clone(),
            authorizer_payload_format_version: p.authorizer_payload_format_version.clone(),
            authorizer_result_ttl_in_seconds: p.authorizer_result_ttl_in_seconds,
            authorizer_uri: p.authorizer_uri.clone(),
            enable_simple_responses: p.enable_simple_responses,
            identity_source: p.identity_source.clone(),
            identity_validation_expression: p.identity_validation_expression.clone(),
            jwt_configuration: p.jwt_configuration.as_ref().map(jwt_to_wire),
        })
    }

    async fn create(&self, input: wire::CreateAuthorizerInput) -> Result<wire::Authorizer, AwsError> {
        self.client.create_authorizer(input).await
    }

    fn assigned_id(&self, created: &wire::Authorizer) -> Option<String> {
        Some(created.authorizer_id.clone())
    }

    fn update_input(&self, cr: &Authorizer, external_name: &str) -> Result<wire::UpdateAuthorizerInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateAuthorizerInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            authorizer_id: external_name.to_string(),
            name: Some(p.name.clone()),
            authorizer_type: Some(p.authorizer_type.clone()),
            authorizer_credentials_arn: p.authorizer_credentials_arn.clone(),
            authorizer_payload_format_version: p.authorizer_payload_format_version.clone(),
            authorizer_result_ttl_in_seconds: p.authorizer_result_ttl_in_seconds,
            authorizer_uri: p.authorizer_uri.clone(),
            enable_simple_responses: p.enable_simple_responses,
            identity_source: p.identity_source.clone(),
            identity_validation_expression: p.identity_validation_expression.clone(),
            jwt_configuration: p.jwt_configuration.as_ref().map(jwt_to_wire),
        })
    }

    async fn update(&self, input: wire::UpdateAuthorizerInput) -> Result<wire::Authorizer, AwsError> {
        self.client.update_authorizer(input).await
    }

    fn delete_input(&self, cr: &Authorizer, external_name: &str) -> Result<Option<(String, String)>, ControllerError> {
        let api_id = required(&cr.for_provider().api_id, "apiId")?;
        Ok(Some((api_id.to_string(), external_name.to_string())))
    }

    async fn delete(&self, (api_id, authorizer_id): (String, String)) -> Result<(), AwsError> {
        self.client.delete_authorizer(&api_id, &authorizer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::AuthorizerSpec;
    use crds::{DeletionPolicy, external_name};

    fn jwt_authorizer(audience: &[&str]) -> Authorizer {
        let spec = AuthorizerSpec {
            for_provider: AuthorizerParameters {
                region: REGION.to_string(),
                api_id: Some("abc123".to_string()),
                name: "cognito".to_string(),
                authorizer_type: "JWT".to_string(),
                identity_source: vec!["$request.header.Authorization".to_string()],
                jwt_configuration: Some(JwtConfiguration {
                    audience: audience.iter().map(|a| a.to_string()).collect(),
                    issuer: Some("https://issuer.example.com".to_string()),
                }),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Authorizer::new("cognito", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_audience_order_is_not_drift() {
        let mock = MockAwsClient::new();
        mock.push_next_id("auth1");
        let client = external::<AuthorizerExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = jwt_authorizer(&["web", "mobile"]);

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "auth1");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.spec.for_provider.authorizer_result_ttl_in_seconds, Some(0));

        cr.spec.for_provider.jwt_configuration = Some(JwtConfiguration {
            audience: vec!["mobile".to_string(), "web".to_string()],
            issuer: Some("https://issuer.example.com".to_string()),
        });
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_new_audience_updates() {
        let mock = MockAwsClient::new();
        let client = external::<AuthorizerExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = jwt_authorizer(&["web"]);
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.jwt_configuration = Some(JwtConfiguration {
            audience: vec!["web".to_string(), "cli".to_string()],
            issuer: Some("https://issuer.example.com".to_string()),
        });
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(mock.call_count("UpdateAuthorizer"), 1);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }
}
