//! ECS reconcilers
//!
//! Clusters and services are addressed by name, task definitions by the ARN of
//! their latest revision. Deleted clusters and services keep answering
//! Describe with status `INACTIVE` for a while; those tombstones are mapped to
//! absent through each kind's status table.

pub mod cluster;
pub mod service;
pub mod task_definition;

use aws_client::{AwsError, EcsApi};
use crds::Tag;
use crds::ecs::KeyValuePair;
use tracing::debug;

use crate::error::{ControllerError, Stage};
use crate::managed::diff::sort_set;
pub(crate) use crate::reconciler::tags::{normalize_tags, tags_from_wire, tags_to_wire};

const CLUSTER_NOT_FOUND: &str = "ClusterNotFoundException";
const SERVICE_NOT_FOUND: &str = "ServiceNotFoundException";

/// Missing cluster or service
pub(crate) fn is_not_found(err: &AwsError) -> bool {
    err.is_code(CLUSTER_NOT_FOUND) || err.is_code(SERVICE_NOT_FOUND)
}

pub(crate) fn pairs_to_wire(pairs: &[KeyValuePair]) -> Vec<aws_client::models::ecs::KeyValuePair> {
    pairs
        .iter()
        .map(|p| aws_client::models::ecs::KeyValuePair {
            name: p.name.clone(),
            value: p.value.clone(),
        })
        .collect()
}

/// Name/value pairs sorted by name
pub(crate) fn pairs_from_wire(pairs: &[aws_client::models::ecs::KeyValuePair]) -> Vec<KeyValuePair> {
    let mut pairs: Vec<KeyValuePair> = pairs.iter().map(|p| KeyValuePair::new(&p.name, &p.value)).collect();
    sort_set(&mut pairs);
    pairs
}

/// Bring the tags of the resource at `arn` in line with `desired`
///
/// Tag failures are part of the update of a `kind` record and reported as such.
pub(crate) async fn sync_tags(
    client: &dyn EcsApi,
    kind: &str,
    arn: &str,
    desired: &[Tag],
    observed: &[aws_client::Tag],
) -> Result<(), ControllerError> {
    let mut desired = desired.to_vec();
    normalize_tags(&mut desired);
    let stale: Vec<String> = observed
        .iter()
        .filter(|o| !desired.iter().any(|d| d.key == o.key))
        .map(|o| o.key.clone())
        .collect();
    let missing: Vec<aws_client::Tag> = desired
        .iter()
        .filter(|d| !observed.iter().any(|o| o.key == d.key && o.value == d.value))
        .map(|d| aws_client::Tag::new(&d.key, &d.value))
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

    #[test]
    fn test_not_found_codes() {
        assert!(is_not_found(&AwsError::service(CLUSTER_NOT_FOUND, "Cluster not found.")));
        assert!(is_not_found(&AwsError::service(SERVICE_NOT_FOUND, "Service not found.")));
        assert!(!is_not_found(&AwsError::service("ClientException", "Unable to describe task definition.")));
    }

    #[tokio::test]
    async fn test_sync_tags_replaces_changed_values() {
        let mock = MockAwsClient::new();
        let arn = "arn:aws:ecs:us-east-1:123456789012:cluster/prod";
        let observed = vec![aws_client::Tag::new("env", "dev"), aws_client::Tag::new("old", "x")];

        sync_tags(&mock, "Cluster", arn, &[Tag::new("env", "prod")], &observed).await.unwrap();

        assert_eq!(mock.calls(), vec!["UntagResource".to_string(), "TagResource".to_string()]);
        assert_eq!(mock.ecs_tags(arn), vec![aws_client::Tag::new("env", "prod")]);
    }
}
