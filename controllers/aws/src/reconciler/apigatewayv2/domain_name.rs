//! DomainName reconciler
//!
//! The record name is the domain name. Readiness follows the status of the
//! first endpoint configuration.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{
    DomainName, DomainNameConfiguration, DomainNameConfigurationObservation, DomainNameObservation,
    DomainNameParameters, MutualTlsAuthentication,
};

use super::{is_not_found, normalize_tags, sync_tags, tag_list, tag_map, tagging_arn};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, LifecycleState, ServiceClients};

/// Capability set of the DomainName kind
pub struct DomainNameExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn configuration_to_wire(config: &DomainNameConfiguration) -> wire::DomainNameConfiguration {
    wire::DomainNameConfiguration {
        certificate_arn: config.certificate_arn.clone(),
        certificate_name: config.certificate_name.clone(),
        endpoint_type: config.endpoint_type.clone(),
        ownership_verification_certificate_arn: config.ownership_verification_certificate_arn.clone(),
        security_policy: config.security_policy.clone(),
        ..Default::default()
    }
}

/// Observed configuration restricted to the fields set in `desired`
fn configuration_from_wire(
    desired: Option<&DomainNameConfiguration>,
    observed: &wire::DomainNameConfiguration,
) -> DomainNameConfiguration {
    let desired = desired.cloned().unwrap_or_default();
    DomainNameConfiguration {
        certificate_arn: when_set(&desired.certificate_arn, observed.certificate_arn.clone()),
        certificate_name: when_set(&desired.certificate_name, observed.certificate_name.clone()),
        endpoint_type: when_set(&desired.endpoint_type, observed.endpoint_type.clone()),
        ownership_verification_certificate_arn: when_set(
            &desired.ownership_verification_certificate_arn,
            observed.ownership_verification_certificate_arn.clone(),
        ),
        security_policy: when_set(&desired.security_policy, observed.security_policy.clone()),
    }
}

fn mutual_tls_to_wire(mtls: &MutualTlsAuthentication) -> wire::MutualTlsAuthentication {
    wire::MutualTlsAuthentication {
        truststore_uri: mtls.truststore_uri.clone(),
        truststore_version: mtls.truststore_version.clone(),
    }
}

fn mutual_tls_from_wire(mtls: &wire::MutualTlsAuthentication) -> MutualTlsAuthentication {
    MutualTlsAuthentication {
        truststore_uri: mtls.truststore_uri.clone(),
        truststore_version: mtls.truststore_version.clone(),
    }
}

#[async_trait]
impl ExternalResource for DomainNameExternal {
    type Resource = DomainName;
    type Response = wire::DomainName;
    type Observed = wire::DomainName;
    type CreateInput = wire::CreateDomainNameInput;
    type Created = wire::DomainName;
    type UpdateInput = wire::UpdateDomainNameInput;
    type Updated = wire::DomainName;
    type DeleteInput = String;

    const KIND: &'static str = "DomainName";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[
        ("AVAILABLE", LifecycleState::Available),
        ("UPDATING", LifecycleState::Available),
        ("PENDING_CERTIFICATE_REIMPORT", LifecycleState::Unavailable),
        ("PENDING_OWNERSHIP_VERIFICATION", LifecycleState::Unavailable),
    ];

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    async fn describe(&self, _cr: &DomainName, external_name: &str) -> Result<wire::DomainName, AwsError> {
        self.client.get_domain_name(external_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, _external_name: &str, response: wire::DomainName) -> Option<wire::DomainName> {
        Some(response)
    }

    fn observed_status<'a>(&self, observed: &'a wire::DomainName) -> Option<&'a str> {
        observed
            .domain_name_configurations
            .first()
            .and_then(|c| c.domain_name_status.as_deref())
    }

    fn generate_observation(&self, observed: &wire::DomainName) -> DomainNameObservation {
        DomainNameObservation {
            api_mapping_selection_expression: observed.api_mapping_selection_expression.clone(),
            domain_name_configurations: observed
                .domain_name_configurations
                .iter()
                .map(|c| DomainNameConfigurationObservation {
                    api_gateway_domain_name: c.api_gateway_domain_name.clone(),
                    hosted_zone_id: c.hosted_zone_id.clone(),
                    domain_name_status: c.domain_name_status.clone(),
                    domain_name_status_message: c.domain_name_status_message.clone(),
                })
                .collect(),
        }
    }

    fn is_up_to_date(&self, cr: &DomainName, observed: &wire::DomainName) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        normalize_tags(&mut desired.tags);
        let current = DomainNameParameters {
            domain_name_configurations: observed
                .domain_name_configurations
                .iter()
                .enumerate()
                .map(|(i, c)| configuration_from_wire(desired.domain_name_configurations.get(i), c))
                .collect(),
            mutual_tls_authentication: when_set(
                &desired.mutual_tls_authentication,
                observed.mutual_tls_authentication.as_ref().map(mutual_tls_from_wire),
            ),
            tags: tag_list(&observed.tags),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &DomainName, external_name: &str) -> Result<wire::CreateDomainNameInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateDomainNameInput {
            domain_name: external_name.to_string(),
            domain_name_configurations: p.domain_name_configurations.iter().map(configuration_to_wire).collect(),
            mutual_tls_authentication: p.mutual_tls_authentication.as_ref().map(mutual_tls_to_wire),
            tags: tag_map(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateDomainNameInput) -> Result<wire::DomainName, AwsError> {
        self.client.create_domain_name(input).await
    }

    fn update_input(&self, cr: &DomainName, external_name: &str) -> Result<wire::UpdateDomainNameInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateDomainNameInput {
            domain_name: external_name.to_string(),
            domain_name_configurations: p.domain_name_configurations.iter().map(configuration_to_wire).collect(),
            mutual_tls_authentication: p.mutual_tls_authentication.as_ref().map(mutual_tls_to_wire),
        })
    }

    async fn update(&self, input: wire::UpdateDomainNameInput) -> Result<wire::DomainName, AwsError> {
        self.client.update_domain_name(input).await
    }

    async fn post_update(&self, cr: &mut DomainName, external_name: &str, updated: wire::DomainName) -> Result<(), ControllerError> {
        let arn = tagging_arn(cr.region(), &format!("domainnames/{external_name}"));
        sync_tags(self.client.as_ref(), Self::KIND, &arn, &cr.for_provider().tags, &updated.tags).await?;
        Ok(())
    }

    fn delete_input(&self, _cr: &DomainName, external_name: &str) -> Result<Option<String>, ControllerError> {
        Ok(Some(external_name.to_string()))
    }

    async fn delete(&self, domain_name: String) -> Result<(), AwsError> {
        self.client.delete_domain_name(&domain_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::DomainNameSpec;
    use crds::{CONDITION_TYPE_READY, ConditionReason, DeletionPolicy, Tag, external_name, find_condition};

    fn domain(certificate: &str) -> DomainName {
        let spec = DomainNameSpec {
            for_provider: DomainNameParameters {
                region: REGION.to_string(),
                domain_name_configurations: vec![DomainNameConfiguration {
                    certificate_arn: Some(certificate.to_string()),
                    endpoint_type: Some("REGIONAL".to_string()),
                    security_policy: Some("TLS_1_2".to_string()),
                    ..Default::default()
                }],
                tags: vec![Tag::new("env", "prod")],
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(DomainName::new("api.example.com", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_uses_record_name_and_reports_targets() {
        let mock = MockAwsClient::new();
        let client = external::<DomainNameExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = domain("arn:aws:acm:us-east-1:123456789012:certificate/one");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "api.example.com");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        let ready = find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason);
        assert_eq!(ready, Some(ConditionReason::Available));
        let observed = &cr.at_provider().unwrap().domain_name_configurations[0];
        assert_eq!(observed.hosted_zone_id.as_deref(), Some("Z1UJRXOUMOOFQ8"));
        assert!(observed.api_gateway_domain_name.is_some());
    }

    #[tokio::test]
    async fn test_certificate_rotation_updates() {
        let mock = MockAwsClient::new();
        let client = external::<DomainNameExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = domain("arn:aws:acm:us-east-1:123456789012:certificate/one");
        tick(&client, &reader, &mut cr, false).await.unwrap();

        let rotated = "arn:aws:acm:us-east-1:123456789012:certificate/two";
        cr.spec.for_provider.domain_name_configurations[0].certificate_arn = Some(rotated.to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        let stored = mock.domain_name("api.example.com").unwrap();
        assert_eq!(stored.domain_name_configurations[0].certificate_arn.as_deref(), Some(rotated));
    }

    #[tokio::test]
    async fn test_conflict_on_create_is_wrapped() {
        let mock = MockAwsClient::new();
        let client = external::<DomainNameExternal>(&mock);
        let mut cr = domain("arn:aws:acm:us-east-1:123456789012:certificate/one");
        client.create(&mut cr).await.unwrap();

        let mut again = domain("arn:aws:acm:us-east-1:123456789012:certificate/one");
        let err = client.create(&mut again).await.unwrap_err();
        assert!(err.to_string().starts_with("cannot create DomainName: ConflictException"), "{err}");
    }
}
