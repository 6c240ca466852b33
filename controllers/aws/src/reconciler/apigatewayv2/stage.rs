//! Stage reconciler
//!
//! The stage name is the external name. There is no single-stage read in use;
//! the stages of the parent API are listed and narrowed to the one named.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::Managed;
use crds::apigatewayv2::{AccessLogSettings, Api, RouteSettings, Stage, StageObservation, StageParameters};

use super::{is_not_found, normalize_tags, required, site, sync_tags, tag_list, tag_map, tagging_arn};
use crate::error::ControllerError;
use crate::managed::diff::{compare, when_set};
use crate::managed::{ExternalResource, IdentityPolicy, ReferenceSite, ServiceClients};

/// Capability set of the Stage kind
pub struct StageExternal {
    client: Arc<dyn ApiGatewayV2Api>,
}

fn access_log_to_wire(settings: &AccessLogSettings) -> wire::AccessLogSettings {
    wire::AccessLogSettings {
        destination_arn: settings.destination_arn.clone(),
        format: settings.format.clone(),
    }
}

fn access_log_from_wire(settings: &wire::AccessLogSettings) -> AccessLogSettings {
    AccessLogSettings {
        destination_arn: settings.destination_arn.clone(),
        format: settings.format.clone(),
    }
}

fn route_settings_to_wire(settings: &RouteSettings) -> wire::RouteSettings {
    wire::RouteSettings {
        data_trace_enabled: settings.data_trace_enabled,
        detailed_metrics_enabled: settings.detailed_metrics_enabled,
        logging_level: settings.logging_level.clone(),
        throttling_burst_limit: settings.throttling_burst_limit,
        throttling_rate_limit: settings.throttling_rate_limit,
    }
}

fn route_settings_from_wire(settings: &wire::RouteSettings) -> RouteSettings {
    RouteSettings {
        data_trace_enabled: settings.data_trace_enabled,
        detailed_metrics_enabled: settings.detailed_metrics_enabled,
        logging_level: settings.logging_level.clone(),
        throttling_burst_limit: settings.throttling_burst_limit,
        throttling_rate_limit: settings.throttling_rate_limit,
    }
}

fn route_settings_map_to_wire(map: &BTreeMap<String, RouteSettings>) -> BTreeMap<String, wire::RouteSettings> {
    map.iter().map(|(k, v)| (k.clone(), route_settings_to_wire(v))).collect()
}

#[async_trait]
impl ExternalResource for StageExternal {
    type Resource = Stage;
    type Response = Vec<wire::Stage>;
    type Observed = wire::Stage;
    type CreateInput = wire::CreateStageInput;
    type Created = wire::Stage;
    type UpdateInput = wire::UpdateStageInput;
    type Updated = wire::Stage;
    type DeleteInput = (String, String);

    const KIND: &'static str = "Stage";
    const IDENTITY: IdentityPolicy = IdentityPolicy::NameIsId;

    fn from_clients(clients: &ServiceClients) -> Self {
        Self {
            client: Arc::clone(&clients.apigatewayv2),
        }
    }

    fn reference_sites() -> Vec<ReferenceSite<StageParameters>> {
        vec![site::<_, Api>(
            "apiId",
            |p| &mut p.api_id,
            |p| &mut p.api_id_ref,
            |p| p.api_id_selector.as_ref(),
        )]
    }

    fn pre_observe(&self, cr: &Stage, _external_name: &str) -> Result<(), ControllerError> {
        required(&cr.for_provider().api_id, "apiId").map(|_| ())
    }

    async fn describe(&self, cr: &Stage, _external_name: &str) -> Result<Vec<wire::Stage>, AwsError> {
        let api_id = cr.for_provider().api_id.as_deref().unwrap_or_default();
        self.client.get_stages(api_id).await
    }

    fn is_not_found(&self, err: &AwsError) -> bool {
        is_not_found(err)
    }

    fn filter_list(&self, external_name: &str, response: Vec<wire::Stage>) -> Option<wire::Stage> {
        response.into_iter().find(|s| s.stage_name == external_name)
    }

    fn generate_observation(&self, observed: &wire::Stage) -> StageObservation {
        StageObservation {
            api_gateway_managed: observed.api_gateway_managed,
            created_date: observed.created_date,
            last_deployment_status_message: observed.last_deployment_status_message.clone(),
            last_updated_date: observed.last_updated_date,
        }
    }

    fn is_up_to_date(&self, cr: &Stage, observed: &wire::Stage) -> Result<(bool, String), ControllerError> {
        let mut desired = cr.for_provider().clone();
        normalize_tags(&mut desired.tags);
        let current = StageParameters {
            access_log_settings: when_set(
                &desired.access_log_settings,
                observed.access_log_settings.as_ref().map(access_log_from_wire),
            ),
            auto_deploy: when_set(&desired.auto_deploy, observed.auto_deploy),
            client_certificate_id: when_set(&desired.client_certificate_id, observed.client_certificate_id.clone()),
            default_route_settings: when_set(
                &desired.default_route_settings,
                observed.default_route_settings.as_ref().map(route_settings_from_wire),
            ),
            deployment_id: when_set(&desired.deployment_id, observed.deployment_id.clone()),
            description: when_set(&desired.description, observed.description.clone()),
            route_settings: observed
                .route_settings
                .iter()
                .map(|(k, v)| (k.clone(), route_settings_from_wire(v)))
                .collect(),
            stage_variables: observed.stage_variables.clone(),
            tags: tag_list(&observed.tags),
            ..desired.clone()
        };
        compare(&desired, &current)
    }

    fn create_input(&self, cr: &Stage, external_name: &str) -> Result<wire::CreateStageInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::CreateStageInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            stage_name: external_name.to_string(),
            access_log_settings: p.access_log_settings.as_ref().map(access_log_to_wire),
            auto_deploy: p.auto_deploy,
            client_certificate_id: p.client_certificate_id.clone(),
            default_route_settings: p.default_route_settings.as_ref().map(route_settings_to_wire),
            deployment_id: p.deployment_id.clone(),
            description: p.description.clone(),
            route_settings: route_settings_map_to_wire(&p.route_settings),
            stage_variables: p.stage_variables.clone(),
            tags: tag_map(&p.tags),
        })
    }

    async fn create(&self, input: wire::CreateStageInput) -> Result<wire::Stage, AwsError> {
        self.client.create_stage(input).await
    }

    fn update_input(&self, cr: &Stage, external_name: &str) -> Result<wire::UpdateStageInput, ControllerError> {
        let p = cr.for_provider();
        Ok(wire::UpdateStageInput {
            api_id: required(&p.api_id, "apiId")?.to_string(),
            stage_name: external_name.to_string(),
            access_log_settings: p.access_log_settings.as_ref().map(access_log_to_wire),
            auto_deploy: p.auto_deploy,
            client_certificate_id: p.client_certificate_id.clone(),
            default_route_settings: p.default_route_settings.as_ref().map(route_settings_to_wire),
            deployment_id: p.deployment_id.clone(),
            description: p.description.clone(),
            route_settings: route_settings_map_to_wire(&p.route_settings),
            stage_variables: p.stage_variables.clone(),
        })
    }

    async fn update(&self, input: wire::UpdateStageInput) -> Result<wire::Stage, AwsError> {
        self.client.update_stage(input).await
    }

    async fn post_update(&self, cr: &mut Stage, external_name: &str, updated: wire::Stage) -> Result<(), ControllerError> {
        let api_id = required(&cr.for_provider().api_id, "apiId")?;
        let arn = tagging_arn(cr.region(), &format!("apis/{api_id}/stages/{external_name}"));
        sync_tags(self.client.as_ref(), Self::KIND, &arn, &cr.for_provider().tags, &updated.tags).await?;
        Ok(())
    }

    fn delete_input(&self, cr: &Stage, external_name: &str) -> Result<Option<(String, String)>, ControllerError> {
        let api_id = required(&cr.for_provider().api_id, "apiId")?;
        Ok(Some((api_id.to_string(), external_name.to_string())))
    }

    async fn delete(&self, (api_id, stage_name): (String, String)) -> Result<(), AwsError> {
        self.client.delete_stage(&api_id, &stage_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::{Outcome, tick};
    use crate::test_utils::{NAMESPACE, REGION, api, external, in_namespace};
    use aws_client::MockAwsClient;
    use crds::apigatewayv2::StageSpec;
    use crds::{DeletionPolicy, Reference, Tag, external_name, set_external_name};

    fn stage(name: &str, api_id: Option<&str>) -> Stage {
        let spec = StageSpec {
            for_provider: StageParameters {
                region: REGION.to_string(),
                api_id: api_id.map(str::to_string),
                ..Default::default()
            },
            deletion_policy: DeletionPolicy::default(),
        };
        in_namespace(Stage::new(name, spec), NAMESPACE)
    }

    fn wire_stage(name: &str) -> wire::Stage {
        wire::Stage {
            stage_name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_observe_picks_named_stage_from_list() {
        let mock = MockAwsClient::new();
        for name in ["v1", "v2", "v3"] {
            mock.add_stage("abc123", wire_stage(name));
        }
        let client = external::<StageExternal>(&mock);
        let mut cr = stage("v1", Some("abc123"));
        set_external_name(&mut cr, "v1");

        let observation = client.observe(&mut cr).await.unwrap();
        assert!(observation.resource_exists);
        assert!(observation.resource_up_to_date);
        assert_eq!(mock.call_count("GetStages"), 1);
    }

    #[tokio::test]
    async fn test_stage_missing_from_list_is_absent() {
        let mock = MockAwsClient::new();
        mock.add_stage("abc123", wire_stage("v2"));
        let client = external::<StageExternal>(&mock);
        let mut cr = stage("v1", Some("abc123"));
        set_external_name(&mut cr, "v1");

        assert!(!client.observe(&mut cr).await.unwrap().resource_exists);
    }

    #[tokio::test]
    async fn test_create_uses_record_name() {
        let mock = MockAwsClient::new();
        let client = external::<StageExternal>(&mock);
        let mut cr = stage("prod", Some("abc123"));

        let creation = client.create(&mut cr).await.unwrap();
        assert!(creation.external_name_assigned);
        assert_eq!(external_name(&cr), "prod");
        assert!(mock.stage("abc123", "prod").is_some());
    }

    #[tokio::test]
    async fn test_unresolved_api_id_fails_before_any_call() {
        let mock = MockAwsClient::new();
        let client = external::<StageExternal>(&mock);
        let mut cr = stage("prod", None);
        set_external_name(&mut cr, "prod");

        let err = client.observe(&mut cr).await.unwrap_err();
        assert_eq!(err.to_string(), "spec.forProvider.apiId is required");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_api_reference_resolves_then_creates() {
        let mock = MockAwsClient::new();
        let client = external::<StageExternal>(&mock);
        let mut parent = api("my-api");
        set_external_name(&mut parent, "abc123");
        let reader = MemoryReader::new().with(&parent);
        let mut cr = stage("prod", None);
        cr.spec.for_provider.api_id_ref = Some(Reference::new("my-api"));

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Created);
        assert_eq!(cr.spec.for_provider.api_id.as_deref(), Some("abc123"));

        cr.spec.for_provider.stage_variables.insert("color".to_string(), "blue".to_string());
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        let stored = mock.stage("abc123", "prod").unwrap();
        assert_eq!(stored.stage_variables.get("color").map(String::as_str), Some("blue"));
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_tags_added_and_removed_on_update() {
        let mock = MockAwsClient::new();
        mock.add_stage(
            "abc123",
            wire::Stage {
                tags: BTreeMap::from([("old".to_string(), "x".to_string())]),
                ..wire_stage("prod")
            },
        );
        let client = external::<StageExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = stage("prod", Some("abc123"));
        set_external_name(&mut cr, "prod");
        cr.spec.for_provider.tags = vec![Tag::new("env", "prod")];

        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::Updated);
        assert_eq!(
            mock.stage("abc123", "prod").unwrap().tags,
            BTreeMap::from([("env".to_string(), "prod".to_string())])
        );
        assert_eq!(mock.call_count("UntagResource"), 1);
        assert_eq!(tick(&client, &reader, &mut cr, false).await.unwrap(), Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_tag_failure_reported_as_stage_update() {
        let mock = MockAwsClient::new();
        mock.add_stage("abc123", wire_stage("prod"));
        mock.fail_next("TagResource", AwsError::service("BadRequestException", "Invalid tag key"));
        let client = external::<StageExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = stage("prod", Some("abc123"));
        set_external_name(&mut cr, "prod");
        cr.spec.for_provider.tags = vec![Tag::new("env", "prod")];

        let err = tick(&client, &reader, &mut cr, false).await.unwrap_err();
        assert!(err.to_string().starts_with("cannot update Stage: "), "{err}");
    }
}
