//! Integration reconciler
//!
//! `responseParameters` is structured on the record (header entries plus an
//! optional status code override per status code) and flat on the wire, where
//! each status code maps `"<operation>:header.<name>"` and
//! `"overwrite:statuscode"` keys to values.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{
    Api, HeaderEntry, Integration, IntegrationObservation, IntegrationParameters, ResponseParameter, TlsConfig,
    VpcLink,
};
use tracing::debug;

use super::{is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, sort_set, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

const OVERWRITE_STATUS_CODE: &str = "overwrite:statuscode";
const HEADER_MARKER: &str = ":header.";
const HEADER_OPERATIONS: &[&str] = &["append", "overwrite", "remove"];

/// Capability set of the Integration kind
pub struct IntegrationExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn response_parameters_to_wire(
    params: &BTreeMap<String, ResponseParameter>,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, ControllerError> {
    let mut wire = BTreeMap::new();
    for (status, mapping) in params {
        let mut flat = BTreeMap::new();
        for h in &mapping.header_entries {
            if !HEADER_OPERATIONS.contains(&h.operation.as_str()) {
                return Err(ControllerError::Precondition(format!(
                    "spec.forProvider.responseParameters[{status}]: header operation {:?} must be one of append, overwrite or remove",
                    h.operation
                )));
            }
            flat.insert(format!("{}{HEADER_MARKER}{}", h.operation, h.name), h.value.clone());
        }
        if let Some(code) = &mapping.overwrite_status_code {
            flat.insert(OVERWRITE_STATUS_CODE.to_string(), code.clone());
        }
        wire.insert(status.clone(), flat);
    }
    Ok(wire)
}

fn response_parameters_from_wire(
    params: &BTreeMap<String, BTreeMap<String, String>>,
) -> BTreeMap<String, ResponseParameter> {
    params
        .iter()
        .map(|(status, flat)| {
            let mut mapping = ResponseParameter::default();
            for (key, value) in flat {
                if key == OVERWRITE_STATUS_CODE {
                    mapping.overwrite_status_code = Some(value.clone());
                } else if let Some((operation, name)) = key.split_once(HEADER_MARKER) {
                    mapping.header_entries.push(HeaderEntry {
                        operation: operation.to_string(),
                        name: name.to_string(),
                        value: value.clone(),
                    });
                } else {
                    debug!(status = %status, key = %key, "Ignoring unrecognized response parameter");
                }
            }
            sort_set(&mut mapping.header_entries);
            (status.clone(), mapping)
        })
        .collect()
}

fn tls_to_wire(tls: &TlsConfig) -> wire::TlsConfig {
    wire::TlsConfig {
        server_name_to_verify: tls.server_name_to_verify.clone(),
    }
}

fn tls_from_wire(tls: &wire::TlsConfig) -> TlsConfig {
    TlsConfig {
        server_name_to_verify: tls.server_name_to_verify.clone(),
    }
}

#[async_trait]
impl ExternalResource for IntegrationExternal {
    type Resource = Integration;
    type Response = wire::Integration;
    type Observed = wire::Integration;
    type CreateInput = wire::CreateIntegrationInput;
    type Created = wire::Integration;
    type UpdateInput = wire::UpdateIntegrationInput;
    type Updated = wire::Integration;
    type DeleteInput = (String, String);

    const KIND: &'static str = "Integration";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<IntegrationParameters>> {
        vec![
            site::<_, Api>(
                "apiId",
                |p| &mut p.api_id,
                |p| &mut p.api_id_ref,
                |p| p.api_id_selector.as_ref(),
            ),
            site::<_, VpcLink>(
                "connectionId",
                |p| &mut p.connection_id,
                |p| &mut p.connection_id_ref,
                |p| p.connection_id_selector.as_ref(),
            ),
        ]
    }

    fn pre_observe(&self, cr: &Integration, _external_name: &str) -> Result<(), ControllerError> {
        required(&cr.for_provider().api_id, "apiId").map(|_| ())
    }

    async fn describe(&self, cr: &Integration, external_name: &str) -> Result<wire::Integration, AwsError> {
        let api_id = cr.for_provider().api_id.as_deref().unwrap_or_default();
        self.client.get_integration(api_id, external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, _external_name: &str, response: wire::Integration) -> Option<wire::Integration> {
        Some(response)
    }

    fn late_initialize(&self, params: &mut IntegrationParameters, observed: &wire::Integration) {
        if params.connection_type.is_none() {
            params.connection_type.clone_from(&observed.connection_type);
        }
        if params.payload_format_version.is_none() {
            params.payload_format_version.clone_from(&observed.payload_format_version);
        }
        if params.timeout_in_millis.is_none() {
            params.timeout_in_millis = observed.timeout_in_millis;
        }
    }

    fn generate_observation(&self, observed: &wire::Integration) -> IntegrationObservation {
        IntegrationObservation {
            integration_id: Some(observed.integration_id.clone()),
            api_gateway_managed: observed.api_gateway_managed,
            integration_response_selection_expression: observed.integration_response_selection_expression.clone(),
        }
    }

    fn is_up_to_date(&self, cr: &Integration, observed: &wire::Integration) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        for mapping in desired.response_parameters.values_mut() {
            sort_set(&mut mapping.header_entries);
        }
        let current = IntegrationParameters {
            integration_type: observed.integration_type.clone().unwrap_or_default(),
            connection_id: when_set(&desired.connection_id, observed.connection_id.clone()),
            connection_type: when_set(&desired.connection_type, observed.connection_type.clone()),
            content_handling_strategy: when_set(
                &desired.content_handling_strategy,
                observed.content_handling_strategy.clone(),
            ),
            credentials_arn: when_set(&desired.credentials_arn, observed.credentials_arn.clone()),
            description: when_set(&desired.description, observed.description.clone()),
            integration_method: when_set(&desired.integration_method, observed.integration_method.clone()),
            integration_subtype: when_set(&desired.integration_subtype, observed.integration_subtype.clone()),
            integration_uri: when_set(&desired.integration_uri, observed.integration_uri.clone()),
            passthrough_behavior: when_set(&desired.passthrough_behavior, observed.passthrough_behavior.clone()),
            payload_format_version: when_set(
                &desired.payload_format_version,
                observed.payload_format_version.clone(),
            ),
            request_parameters: observed.request_parameters.clone(),
            request_templates: observed.request_templates.clone(),
            response_parameters: response_parameters_from_wire(&observed.response_parameters),
            template_selection_expression: when_set(
                &desired.template_selection_expression,
                observed.template_selection_expression.clone(),
            ),
            timeout_in_millis: when_set(&desired.timeout_in_millis, observed.timeout_in_millis),
            tls_config: when_set(&desired.tls_config, observed.tls_config.as_ref().map(tls_from_wire)),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Integration, _external_name: &str) -> Result<wire::CreateIntegrationInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateIntegrationInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            integration_type: p.integration_type.clone(),
            connection_id: p.connection_id.clone(),
            connection_type: p.connection_type.clone(),
            content_handling_strategy: p.content_handling_strategy.clone(),
            credentials_arn: p.credentials_arn.clone(),
            description: p.description.clone(),
            integration_method: p.integration_method.clone(),
            integration_subtype: p.integration_subtype.clone(),
            integration_uri: p.integration_uri.clone(),
            passthrough_behavior: p.passthrough_behavior.clone(),
            payload_format_version: p.payload_format_version.clone(),
            request_parameters: p.request_parameters.clone(),
            request_templates: p.request_templates.clone(),
            response_parameters: response_parameters_to_wire(&p.response_parameters)?,
            template_selection_expression: p.template_selection_expression.clone(),
            timeout_in_millis: p.timeout_in_millis,
            tls_config: p.tls_config.as_ref().map(tls_to_wire),
        })
    }

    async fn create(&self, input: wire::CreateIntegrationInput) -> Result<wire::Integration, AwsError> {
        self.client.create_integration(input).await
    }

    fn assigned_id(&self, created: &wire::Integration) -> Option<String> {
        Some(created.integration_id.clone())
    }

    fn update_input(&self, cr: &Integration, external_name: &str) -> Result<wire::UpdateIntegrationInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateIntegrationInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            integration_id: external_name.to_string(),
            integration_type: Some(p.integration_type.clone()),
            connection_id: p.connection_id.clone(),
            connection_type: p.connection_type.clone(),
            content_handling_strategy: p.content_handling_strategy.clone(),
            credentials_arn: p.credentials_arn.clone(),
            description: p.description.clone(),
            integration_method: p.integration_method.clone(),
            integration_subtype: p.integration_subtype.clone(),
            integration_uri: p.integration_uri.clone(),
            passthrough_behavior: p.passthrough_behavior.clone(),
            payload_format_version: p.payload_format_version.clone(),
            request_parameters: p.request_parameters.clone(),
            request_templates: p.request_templates.clone(),
            response_parameters: response_parameters_to_wire(&p.response_parameters)?,
            template_selection_expression: p.template_selection_expression.clone(),
            timeout_in_millis: p.timeout_in_millis,
            tls_config: p.tls_config.as_ref().map(tls_to_wire),
        })
    }

    async fn update(&self, input: wire::UpdateIntegrationInput) -> Result<wire::Integration, AwsError> {
        self.client.update_integration(input).await
    }

    fn delete_input(&self, cr: &Integration, external_name: &str) -> Result<Option<(String, String)>, ControllerError> {
        let api_id = required(&cr.for_provider().api_id, "apiId")?;
        Ok(Some((api_id.to_string(), external_name.to_string())))
    }

    async fn delete(&self, (api_id, integration_id): (String, String)) -> Result<(), AwsError> {
        self.client.delete_integration(&api_id, &integration_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::IntegrationSpec;
    use crds::{DeletionPolicy, external_name};

    fn integration() -> Integration {
        let spec = IntegrationSpec {
            for_provider: IntegrationParameters {
                region: REGION.to_string(),
                api_id: Some("abc123".to_string()),
                integration_type: "HTTP_PROXY".to_string(),
                integration_method: Some("GET".to_string()),
                integration_uri: Some("https://example.com".to_string()),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Integration::new("backend", spec), NAMESPACE)
    }

    fn header(operation: &str, name: &str, value: &str) -> HeaderEntry {
        HeaderEntry {
            operation: operation.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn flat(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_response_parameters_flatten_to_wire_keys() {
        let params = BTreeMap::from([(
            "200".to_string(),
            ResponseParameter {
                header_entries: vec![header("append", "X-Foo", "bar")],
                overwrite_status_code: Some("201".to_string()),
            },
        )]);

        let wire = response_parameters_to_wire(&params).unwrap();
        assert_eq!(
            wire,
            BTreeMap::from([(
                "200".to_string(),
                flat(&[("append:header.X-Foo", "bar"), ("overwrite:statuscode", "201")])
            )])
        );
        assert_eq!(response_parameters_from_wire(&wire), params);
    }

    #[tokio::test]
    async fn test_unknown_header_operation_fails_before_create() {
        let mock = MockAwsClient::new();
        let client = external::<IntegrationExternal>(&mock);
        let mut cr = integration();
        cr.spec.for_provider.response_parameters = BTreeMap::from([(
            "200".to_string(),
            ResponseParameter {
                header_entries: vec![header("prepend", "X-Foo", "bar")],
                overwrite_status_code: None,
            },
        )]);

        let err = client.create(&mut cr).await.unwrap_err();
        assert!(matches!(err, ControllerError::Precondition(_)), "{err}");
        assert!(err.to_string().contains("\"prepend\""), "{err}");
        assert_eq!(mock.call_count("CreateIntegration"), 0);
    }

    #[test]
    fn test_unrecognized_wire_keys_are_dropped() {
        let wire = BTreeMap::from([(
            "500".to_string(),
            flat(&[("remove:header.Server", ""), ("unknown", "x")]),
        )]);
        let params = response_parameters_from_wire(&wire);
        assert_eq!(params["500"].header_entries, vec![header("remove", "Server", "")]);
        assert_eq!(params["500"].overwrite_status_code, None);
    }

    #[tokio::test]
    async fn test_create_sends_flattened_parameters() {
        let mock = MockAwsClient::new();
        mock.push_next_id("int1");
        let client = external::<IntegrationExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = integration();
        cr.spec.for_provider.response_parameters.insert(
            "200".to_string(),
            ResponseParameter {
                header_entries: vec![header("overwrite", "X-B", "2"), header("append", "X-A", "1")],
                overwrite_status_code: Some("201".to_string()),
            },
        );

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "int1");
        let stored = mock.integration("abc123", "int1").unwrap();
        assert_eq!(
            stored.response_parameters["200"],
            flat(&[
                ("append:header.X-A", "1"),
                ("overwrite:header.X-B", "2"),
                ("overwrite:statuscode", "201"),
            ])
        );

        // Header entries in a different order than AWS reports them are not drift
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(cr.spec.for_provider.payload_format_version.as_deref(), Some("1.0"));
        assert_eq!(cr.spec.for_provider.timeout_in_millis, Some(30000));
    }

    #[tokio::test]
    async fn test_uri_change_updates() {
        let mock = MockAwsClient::new();
        let client = external::<IntegrationExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = integration();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.integration_uri = Some("https://example.org".to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        let stored = mock.integration("abc123", &external_name(&cr)).unwrap();
        assert_eq!(stored.integration_uri.as_deref(), Some("https://example.org"));
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }
}
