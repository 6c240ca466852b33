//! Reconciliation of AWS managed resources.
//!
//! This module is organized by AWS service:
//! - `apigatewayv2`: APIs, stages, routes, integrations, deployments, VPC links,
//!   authorizers, domain names and API mappings
//! - `ecs`: clusters, services, task definitions
//! - `dax`: clusters, parameter groups, subnet groups
//! - `sagemaker`: models, labeling jobs
//!
//! Every kind runs through the same driver: [`tick`] performs one pass of the
//! managed-resource lifecycle on an in-memory copy of the record, and
//! [`reconcile`] persists what the pass changed (external name first, then
//! desired state, then status) and decides when to look again.

pub mod apigatewayv2;
pub mod dax;
pub mod ecs;
pub mod sagemaker;
pub(crate) mod tags;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crds::{
    CONDITION_STATUS_TRUE, CONDITION_TYPE_READY, Condition, DeletionPolicy, EXTERNAL_NAME_ANNOTATION, Managed,
    external_name, find_condition,
};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::backoff::FibonacciBackoff;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::managed::{
    AwsConnector, Connector, ExternalClient, ExternalResource, KubeReader, Reader, resolve_references,
};

/// Finalizer guarding deletion of the AWS resource
pub const FINALIZER: &str = "finalizer.managedresource.aws.microscaler.io";

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new(config: &ControllerConfig) -> Self {
        Self {
            backoff: FibonacciBackoff::new(config.backoff_min_seconds, config.backoff_max_seconds),
            error_count: 0,
        }
    }

    fn increment_error(&mut self) {
        self.error_count += 1;
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared state of all reconcilers
pub struct Context {
    pub client: Client,
    pub connector: Arc<dyn Connector>,
    pub reader: Arc<dyn Reader>,
    pub config: ControllerConfig,
    /// Error tracking per record (`<Kind>/<namespace>/<name>`)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Context {
    /// Context talking to the cluster and to AWS through the default credential chain
    pub fn new(client: Client, config: ControllerConfig) -> Self {
        Self {
            reader: Arc::new(KubeReader::new(client.clone())),
            connector: Arc::new(AwsConnector::new()),
            client,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Next retry delay for a failing record
    fn next_backoff(&self, key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| BackoffState::new(&self.config));
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (self.config.poll_interval, 0)
            }
        }
    }

    /// Forget the errors of a record after a clean pass
    fn reset_backoff(&self, key: &str) {
        if let Ok(mut states) = self.backoff_states.lock()
            && let Some(state) = states.get_mut(key)
        {
            state.reset();
        }
    }
}

/// What one lifecycle pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The AWS resource was created
    Created,
    /// Drift was pushed to AWS
    Updated,
    /// Nothing to do
    UpToDate,
    /// Deletion was issued, waiting for AWS to finish
    Deleting,
    /// The AWS resource is gone (or orphaned); the finalizer can go
    Released,
}

/// One lifecycle pass over `cr`
///
/// All effects land on `cr`: the external name annotation, resolved and
/// late-initialized desired state, observed state and both conditions.
/// `Synced` reflects the result of the pass.
pub async fn tick<E: ExternalResource>(
    external: &ExternalClient<E>,
    reader: &dyn Reader,
    cr: &mut E::Resource,
    deleting: bool,
) -> Result<Outcome, ControllerError> {
    let result = if deleting {
        finalize(external, cr).await
    } else {
        converge(external, reader, cr).await
    };
    match &result {
        Ok(_) => cr.set_condition(Condition::reconcile_success()),
        Err(e) => cr.set_condition(Condition::reconcile_error(e.to_string())),
    }
    result
}

async fn converge<E: ExternalResource>(
    external: &ExternalClient<E>,
    reader: &dyn Reader,
    cr: &mut E::Resource,
) -> Result<Outcome, ControllerError> {
    let namespace = cr.namespace().unwrap_or_default();
    if resolve_references(reader, &namespace, cr.for_provider_mut(), &E::reference_sites()).await? {
        debug!(kind = E::KIND, record = %cr.name_any(), "Resolved references");
    }

    let observation = external.observe(cr).await?;
    if !observation.resource_exists {
        external.create(cr).await?;
        return Ok(Outcome::Created);
    }
    if !observation.resource_up_to_date {
        info!(kind = E::KIND, record = %cr.name_any(), diff = %observation.diff, "Resource drifted");
        external.update(cr).await?;
        return Ok(Outcome::Updated);
    }
    Ok(Outcome::UpToDate)
}

async fn finalize<E: ExternalResource>(
    external: &ExternalClient<E>,
    cr: &mut E::Resource,
) -> Result<Outcome, ControllerError> {
    if cr.deletion_policy() == DeletionPolicy::Orphan {
        info!(kind = E::KIND, record = %cr.name_any(), "Orphaning AWS resource");
        return Ok(Outcome::Released);
    }
    match external.observe(cr).await {
        Ok(observation) if !observation.resource_exists => return Ok(Outcome::Released),
        // An immutable-field change must not block deletion
        Ok(_) | Err(ControllerError::Permanent(_)) => {}
        Err(e) => return Err(e),
    }
    external.delete(cr).await?;
    if E::RELEASE_ON_DELETE {
        return Ok(Outcome::Released);
    }
    Ok(Outcome::Deleting)
}

fn backoff_key<K: Managed>(cr: &K) -> String {
    format!(
        "{}/{}/{}",
        K::kind(&()),
        cr.namespace().unwrap_or_default(),
        cr.name_any()
    )
}

fn has_finalizer<K: Resource>(cr: &K) -> bool {
    cr.meta().finalizers.as_ref().is_some_and(|f| f.iter().any(|x| x == FINALIZER))
}

async fn set_finalizers<K: Managed>(api: &Api<K>, name: &str, finalizers: Vec<String>) -> Result<(), ControllerError> {
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    Ok(())
}

/// Write back what a pass changed on the in-memory copy
async fn persist<K: Managed>(api: &Api<K>, original: &K, working: &K) -> Result<(), ControllerError> {
    let name = working.name_any();
    let pp = PatchParams::default();

    // The external name may be the only record of a freshly created resource
    let new_name = external_name(working);
    if new_name != external_name(original) {
        let mut annotations = serde_json::Map::new();
        annotations.insert(EXTERNAL_NAME_ANNOTATION.to_string(), new_name.into());
        let patch = json!({ "metadata": { "annotations": annotations } });
        api.patch(&name, &pp, &Patch::Merge(&patch)).await?;
    }

    if working.for_provider() != original.for_provider() {
        let patch = json!({ "spec": { "forProvider": working.for_provider() } });
        api.patch(&name, &pp, &Patch::Merge(&patch)).await?;
    }

    if working.at_provider() != original.at_provider() || working.conditions() != original.conditions() {
        let patch = json!({
            "status": {
                "atProvider": working.at_provider(),
                "conditions": working.conditions(),
            }
        });
        api.patch_status(&name, &pp, &Patch::Merge(&patch)).await?;
    }
    Ok(())
}

/// Reconcile one record of kind `E`
pub async fn reconcile<E: ExternalResource>(
    cr: Arc<E::Resource>,
    ctx: Arc<Context>,
) -> Result<Action, ControllerError> {
    let name = cr.name_any();
    let namespace = cr
        .namespace()
        .ok_or_else(|| ControllerError::Precondition(format!("{} {name} has no namespace", E::KIND)))?;
    let api: Api<E::Resource> = Api::namespaced(ctx.client.clone(), &namespace);
    let deleting = cr.meta().deletion_timestamp.is_some();

    if !has_finalizer(cr.as_ref()) {
        if deleting {
            return Ok(Action::await_change());
        }
        let mut finalizers = cr.finalizers().to_vec();
        finalizers.push(FINALIZER.to_string());
        set_finalizers(&api, &name, finalizers).await?;
    }

    debug!(kind = E::KIND, namespace = %namespace, name = %name, deleting, "Reconciling");

    let mut working = (*cr).clone();
    let result = match ctx.connector.connect(working.region()).await {
        Ok(clients) => {
            let external = ExternalClient::<E>::connect(&clients);
            tick(&external, ctx.reader.as_ref(), &mut working, deleting).await
        }
        Err(e) => {
            working.set_condition(Condition::reconcile_error(e.to_string()));
            Err(e)
        }
    };

    persist(&api, cr.as_ref(), &working).await?;
    let outcome = result?;
    ctx.reset_backoff(&backoff_key(cr.as_ref()));

    match outcome {
        Outcome::Released => {
            let finalizers: Vec<String> = cr.finalizers().iter().filter(|f| *f != FINALIZER).cloned().collect();
            set_finalizers(&api, &name, finalizers).await?;
            info!(kind = E::KIND, namespace = %namespace, name = %name, "Released record");
            Ok(Action::await_change())
        }
        Outcome::Created | Outcome::Updated | Outcome::Deleting => Ok(Action::requeue(ctx.config.short_wait)),
        Outcome::UpToDate => {
            let ready = find_condition(working.conditions(), CONDITION_TYPE_READY)
                .is_some_and(|c| c.status == CONDITION_STATUS_TRUE);
            let wait = if ready {
                ctx.config.poll_interval
            } else {
                ctx.config.short_wait
            };
            Ok(Action::requeue(wait))
        }
    }
}

/// Requeue policy for failed reconciliations
///
/// Errors that need user action are retried at the poll interval; everything
/// else backs off along the Fibonacci sequence.
pub fn error_policy<E: ExternalResource>(cr: Arc<E::Resource>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    if error.is_permanent() {
        warn!(kind = E::KIND, record = %cr.name_any(), error = %error, "Reconciliation needs user action");
        return Action::requeue(ctx.config.poll_interval);
    }
    let (delay, error_count) = ctx.next_backoff(&backoff_key(cr.as_ref()));
    warn!(
        kind = E::KIND,
        record = %cr.name_any(),
        error = %error,
        error_count,
        retry_in = ?delay,
        "Reconciliation failed"
    );
    Action::requeue(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::managed::reference::MemoryReader;
    use crate::reconciler::apigatewayv2::api::ApiExternal;
    use crate::test_utils::{api, external};
    use aws_client::{AwsError, MockAwsClient};
    use crds::{CONDITION_TYPE_SYNCED, ConditionReason, set_external_name};

    fn ready(cr: &crds::apigatewayv2::Api) -> Option<ConditionReason> {
        find_condition(cr.conditions(), CONDITION_TYPE_READY).map(|c| c.reason)
    }

    fn synced(cr: &crds::apigatewayv2::Api) -> Option<&Condition> {
        find_condition(cr.conditions(), CONDITION_TYPE_SYNCED)
    }

    #[tokio::test]
    async fn test_create_then_up_to_date() {
        let mock = MockAwsClient::new();
        mock.push_next_id("abc123");
        let client = external::<ApiExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = api("my-api");

        let outcome = tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(outcome, Outcome::Created);
        assert_eq!(external_name(&cr), "abc123");
        assert_eq!(ready(&cr), Some(ConditionReason::Creating));
        assert_eq!(synced(&cr).map(|c| c.status.as_str()), Some(CONDITION_STATUS_TRUE));

        let outcome = tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(outcome, Outcome::UpToDate);
        assert_eq!(ready(&cr), Some(ConditionReason::Available));

        // Late-initialized defaults keep the next pass clean too
        let outcome = tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(outcome, Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_edit_triggers_update() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = api("my-api");
        tick(&client, &reader, &mut cr, false).await.unwrap();
        tick(&client, &reader, &mut cr, false).await.unwrap();

        cr.spec.for_provider.description = Some("public API".to_string());
        let outcome = tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(mock.call_count("UpdateApi"), 1);

        let outcome = tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(outcome, Outcome::UpToDate);
    }

    #[tokio::test]
    async fn test_failure_sets_synced_false() {
        let mock = MockAwsClient::new();
        mock.fail_next("CreateApi", AwsError::service("BadRequestException", "invalid protocol"));
        let client = external::<ApiExternal>(&mock);
        let mut cr = api("my-api");

        let err = tick(&client, &MemoryReader::new(), &mut cr, false).await.unwrap_err();
        assert_eq!(err.to_string(), "cannot create Api: BadRequestException: invalid protocol");
        let synced = synced(&cr).unwrap();
        assert_eq!(synced.status, "False");
        assert_eq!(synced.message.as_deref(), Some("cannot create Api: BadRequestException: invalid protocol"));
        assert_eq!(external_name(&cr), "");
    }

    #[tokio::test]
    async fn test_delete_then_release() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = api("my-api");
        tick(&client, &reader, &mut cr, false).await.unwrap();

        let outcome = tick(&client, &reader, &mut cr, true).await.unwrap();
        assert_eq!(outcome, Outcome::Deleting);
        assert_eq!(ready(&cr), Some(ConditionReason::Deleting));
        assert_eq!(mock.call_count("DeleteApi"), 1);

        let outcome = tick(&client, &reader, &mut cr, true).await.unwrap();
        assert_eq!(outcome, Outcome::Released);
    }

    #[tokio::test]
    async fn test_orphan_policy_skips_aws() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let mut cr = api("my-api");
        set_external_name(&mut cr, "abc123");
        cr.spec.deletion_policy = DeletionPolicy::Orphan;

        let outcome = tick(&client, &MemoryReader::new(), &mut cr, true).await.unwrap();
        assert_eq!(outcome, Outcome::Released);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_external_name_releases_immediately() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let mut cr = api("never-created");

        let outcome = tick(&client, &MemoryReader::new(), &mut cr, true).await.unwrap();
        assert_eq!(outcome, Outcome::Released);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resource_deleted_out_of_band_is_recreated() {
        let mock = MockAwsClient::new();
        let client = external::<ApiExternal>(&mock);
        let reader = MemoryReader::new();
        let mut cr = api("my-api");
        set_external_name(&mut cr, "gone");

        let outcome = tick(&client, &reader, &mut cr, false).await.unwrap();
        assert_eq!(outcome, Outcome::Created);
        assert_ne!(external_name(&cr), "gone");
    }

    #[test]
    fn test_backoff_key() {
        let cr = api("my-api");
        assert_eq!(backoff_key(&cr), "Api/default/my-api");
    }
}
