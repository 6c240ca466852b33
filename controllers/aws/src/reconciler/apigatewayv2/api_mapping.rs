//! ApiMapping reconciler
//!
//! Mappings live under a custom domain name and are listed per domain.

use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{Api, ApiMapping, ApiMappingObservation, ApiMappingParameters, DomainName, Stage};

use super::{is_not_found, required, site};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

/// Capability set of the ApiMapping kind
pub struct ApiMappingExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

#[async_trait]
impl ExternalResource for ApiMappingExternal {
    type Resource = ApiMapping;
    type Response = Vec<wire::ApiMapping>;
    type Observed = wire::ApiMapping;
    type CreateInput = wire::CreateApiMappingInput;
    type Created = wire::ApiMapping;
    type UpdateInput = wire::UpdateApiMappingInput;
    type Updated = wire::ApiMapping;
    type DeleteInput = (String, String);

    const KIND: &'static str = "ApiMapping";
    const IDENTITY: IdentityPolicy = IdentityPolicy::AwsAssigned;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<ApiMappingParameters>> {
        vec![
            site::<_, Api>(
                "apiId",
                |p| &mut p.api_id,
                |p| &mut p.api_id_ref,
                |p| p.api_id_selector.as_ref(),
            ),
            site::<_, DomainName>(
                "domainName",
                |p| &mut p.domain_name,
                |p| &mut p.domain_name_ref,
                |p| p.domain_name_selector.as_ref(),
            ),
            site::<_, Stage>(
                "stage",
                |p| &mut p.stage,
                |p| &mut p.stage_ref,
                |p| p.stage_selector.as_ref(),
            ),
        ]
    }

    fn pre_observe(&self, cr: &ApiMapping, _external_name: &str) -> Result<(), ControllerError> {
        required(&cr.for_provider().domain_name, "domainName").map(|_| ())
    }

    async fn describe(&self, cr: &ApiMapping, _external_name: &str) -> Result<Vec<wire::ApiMapping>, AwsError> {
        let domain_name = cr.for_provider().domain_name.as_deref().unwrap_or_default();
        self.client.get_api_mappings(domain_name).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::ApiMapping>) -> Option<wire::ApiMapping> {
        response.into_iter().find(|m| m.api_mapping_id == external_name)
    }

    fn generate_observation(&self, observed: &wire::ApiMapping) -> ApiMappingObservation {
        ApiMappingObservation {
            api_mapping_id: Some(observed.api_mapping_id.clone()),
        }
    }

    fn is_up_to_date(&self, cr: &ApiMapping, observed: &wire::ApiMapping) -> Result<(bool, String), ControllerError> {
        let desired = cr.for_provider();
        let current = ApiMappingParameters {
            api_id: when_set(&desired.api_id, observed.api_id.clone()),
            stage: when_set(&desired.stage, observed.stage.clone()),
            api_mapping_key: when_set(&desired.api_mapping_key, observed.api_mapping_key.clone()),
            ..desired.clone()
        };
        compare(desired, &current)
    }

    fn create_input(&self, cr: &ApiMapping, _external_name: &str) -> Result<wire::CreateApiMappingInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateApiMappingInput {
            domain_name: required(&p.domain_name, "domainName")?.to_string(),
            api_id: required(&p.api_id, "apiId")?.to_string(),
            stage: required(&p.stage, "stage")?.to_string(),
            api_mapping_key: p.api_mapping_key.clone(),
        })
    }

    async fn create(&self, input: wire::CreateApiMappingInput) -> Result<wire::ApiMapping, AwsError> {
        self.client.create_api_mapping(input).await
    }

    fn assigned_id(&self, created: &wire::ApiMapping) -> Option<String> {
        Some(created.api_mapping_id.clone())
    }

    fn update_input(&self, cr: &ApiMapping, external_name: &str) -> Result<wire::UpdateApiMappingInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateApiMappingInput {
            domain_name: required(&p.domain_name, "domainName")?.to_string(),
            api_mapping_id: external_name.to_string(),
            api_id: required(&p.api_id, "apiId")?.to_string(),
            stage: p.stage.clone(),
            api_mapping_key: p.api_mapping_key.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateApiMappingInput) -> Result<wire::ApiMapping, AwsError> {
        self.client.update_api_mapping(input).await
    }

    fn delete_input(&self, cr: &ApiMapping, external_name: &str) -> Result<Option<(String, String)>, ControllerError> {
        let domain_name = required(&cr.for_provider().domain_name, "domainName")?;
        Ok(Some((domain_name.to_string(), external_name.to_string())))
    }

    async fn delete(&self, (domain_name, api_mapping_id): (String, String)) -> Result<(), AwsError> {
        self.client.delete_api_mapping(&domain_name, &api_mapping_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::ApiMappingSpec;
    use crds::{DeletionPolicy, external_name, set_external_name};

    fn mapping(stage: &str) -> ApiMapping {
        let spec = ApiMappingSpec {
            for_provider: ApiMappingParameters {
                region: REGION.to_string(),
                api_id: Some("abc123".to_string()),
                domain_name: Some("api.example.com".to_string()),
                stage: Some(stage.to_string()),
                api_mapping_key: Some("v1".to_string()),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(ApiMapping::new("v1-mapping", spec), NAMESPACE)
    }

    #[tokio::test]
    async fn test_create_then_up_to_date() {
        let mock = MockAwsClient::new();
        mock.push_next_id("map1");
        let client = external::<ApiMappingExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = mapping("prod");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(external_name(&cr), "map1");
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
        assert_eq!(mock.call_count("GetApiMappings"), 1);
    }

    #[tokio::test]
    async fn test_stage_change_updates_mapping() {
        let mock = MockAwsClient::new();
        mock.add_api_mapping(
            "api.example.com",
            wire::ApiMapping {
                api_mapping_id: "map1".to_string(),
                api_id: Some("abc123".to_string()),
                api_mapping_key: Some("v1".to_string()),
                stage: Some("prod".to_string()),
            },
        );
        let client = external::<ApiMappingExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = mapping("staging");
        set_external_name(&mut cr, "map1");

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_missing_domain_name_is_a_precondition() {
        let mock = MockAwsClient::new();
        let client = external::<ApiMappingExternal>(&mock);
        let mut cr = mapping("prod");
        cr.spec.for_provider.domain_name = None;
        set_external_name(&mut cr, "map1");

        let err = client.observe(&mut cr).await.unwrap_err();
        assert_eq!(err.to_string(), "spec.forProvider.domainName is required");
    }
}
