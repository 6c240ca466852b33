//! API Gateway v2 reconcilers
//!
//! Child resources (stages, routes, integrations, ...) are addressed through
//! the identifier of their parent API, resolved from `apiId`, `apiIdRef` or
//! `apiIdSelector` before every pass.

pub mod api;
pub mod api_mapping;
pub mod authorizer;
pub mod deployment;
pub mod domain_name;
pub mod integration;
pub mod integration_response;
pub mod route;
pub mod route_response;
pub mod stage;
pub mod vpc_link;

use std::collections::BTreeMap;

use aws_client::models::apigatewayv2 as wire;
use aws_client::{ApiGatewayV2Api, AwsError};
use crds::apigatewayv2::ParameterConstraints;
use crds::{Managed, Reference, Selector, Tag};
use tracing::debug;

use crate::error::{ControllerError, Stage};
use crate::managed::{ReferenceSite, external_name_of};
pub(crate) use crate::reconciler::tags::normalize_tags;

const NOT_FOUND: &str = "NotFoundException";

pub(crate) fn is_not_found(err: &AwsError) -> bool {
    err.is_code(NOT_FOUND)
}

/// Value of a parent identifier, which must be resolved before any AWS call
pub(crate) fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ControllerError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ControllerError::Precondition(format!("spec.forProvider.{field} is required")))
}

/// Reference site of a field holding the external name of a record of kind `T`
pub(crate) fn site<P, T: Managed>(
    field: &'static str,
    value: fn(&mut P) -> &mut Option<String>,
    reference: fn(&mut P) -> &mut Option<Reference>,
    selector: fn(&P) -> Option<&Selector>,
) -> ReferenceSite<P> {
    ReferenceSite::single::<T>(field, value, reference, selector, external_name_of)
}

pub(crate) fn tag_map(tags: &[Tag]) -> BTreeMap<String, String> {
    tags.iter().map(|t| (t.key.clone(), t.value.clone())).collect()
}

/// Tags in key order
pub(crate) fn tag_list(tags: &BTreeMap<String, String>) -> Vec<Tag> {
    tags.iter().map(|(k, v)| Tag::new(k, v)).collect()
}

/// Request or response parameter constraints keyed by parameter expression
pub(crate) fn constraints_to_wire(
    params: &BTreeMap<String, ParameterConstraints>,
) -> BTreeMap<String, wire::ParameterConstraints> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), wire::ParameterConstraints { required: v.required }))
        .collect()
}

pub(crate) fn constraints_from_wire(
    params: &BTreeMap<String, wire::ParameterConstraints>,
) -> BTreeMap<String, ParameterConstraints> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), ParameterConstraints { required: v.required }))
        .collect()
}

/// ARN used by TagResource for top-level resources (`apis/<id>`, `vpclinks/<id>`, ...)
pub(crate) fn tagging_arn(region: &str, path: &str) -> String {
    format!("arn:aws:apigateway:{region}::/{path}")
}

/// Bring the tags of a resource in line with `desired`
///
/// Tag failures are part of the update of a `kind` record and reported as such.
pub(crate) async fn sync_tags(
    client: &dyn ApiGatewayV2Api,
    kind: &str,
    arn: &str,
    desired: &[Tag],
    observed: &BTreeMap<String, String>,
) -> Result<(), ControllerError> {
    let desired = tag_map(desired);
    let stale: Vec<String> = observed.keys().filter(|k| !desired.contains_key(*k)).cloned().collect();
    let missing: BTreeMap<String, String> = desired
        .into_iter()
        .filter(|(k, v)| observed.get(k) != Some(v))
        .collect();

    if !stale.is_empty() {
        debug!(arn, keys = ?stale, "Removing tags");
        client
            .untag_resource(arn, stale)
            .await
            .map_err(|e| ControllerError::from_aws(Stage::Update, kind, e))?;
    }
    if !missing.is_empty() {
        debug!(arn, count = missing.len(), "Adding tags");
        client
            .tag_resource(arn, missing)
            .await
            .map_err(|e| ControllerError::from_aws(Stage::Update, kind, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_client::MockAwsClient;
    use aws_client::models::apigatewayv2::Api;

    #[test]
    fn test_required_rejects_unset_and_empty() {
        assert_eq!(required(&Some("abc".to_string()), "apiId").unwrap(), "abc");
        let err = required(&Some(String::new()), "apiId").unwrap_err();
        assert_eq!(err.to_string(), "spec.forProvider.apiId is required");
        assert!(required(&None, "apiId").is_err());
    }

    #[test]
    fn test_tag_list_is_key_ordered() {
        let tags = tag_map(&[Tag::new("team", "web"), Tag::new("env", "prod")]);
        assert_eq!(tag_list(&tags), vec![Tag::new("env", "prod"), Tag::new("team", "web")]);
    }

    #[tokio::test]
    async fn test_sync_tags_adds_changes_and_removes() {
        let mock = MockAwsClient::new();
        let observed: BTreeMap<String, String> = [("env", "dev"), ("old", "x"), ("team", "web")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        mock.add_api(Api {
            api_id: "abc123".to_string(),
            tags: observed.clone(),
            ..Default::default()
        });
        let arn = tagging_arn("us-east-1", "apis/abc123");

        sync_tags(&mock, "Api", &arn, &[Tag::new("env", "prod"), Tag::new("team", "web")], &observed)
            .await
            .unwrap();

        let expected: BTreeMap<String, String> = [("env", "prod"), ("team", "web")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(mock.apigw_tags(&arn), BTreeMap::from([("env".to_string(), "prod".to_string())]));
        assert_eq!(mock.api("abc123").unwrap().tags, expected);
    }

    #[tokio::test]
    async fn test_sync_tags_noop_when_equal() {
        let mock = MockAwsClient::new();
        let observed = tag_map(&[Tag::new("env", "prod")]);
        sync_tags(&mock, "Api", "arn", &[Tag::new("env", "prod")], &observed).await.unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_tags_duplicate_keys_last_value_wins() {
        let mock = MockAwsClient::new();
        let observed = tag_map(&[Tag::new("env", "prod")]);
        let desired = [Tag::new("env", "dev"), Tag::new("env", "prod")];
        sync_tags(&mock, "Api", "arn", &desired, &observed).await.unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sync_tags_failure_reported_as_update() {
        let mock = MockAwsClient::new();
        mock.fail_next("TagResource", AwsError::service("BadRequestException", "Invalid tag key"));
        let err = sync_tags(&mock, "Stage", "arn", &[Tag::new("env", "prod")], &BTreeMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("cannot update Stage"), "{err}");
    }
}
