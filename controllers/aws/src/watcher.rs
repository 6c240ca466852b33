//! Kubernetes resource watchers.
//!
//! Every kind is watched by the same generic helper built on
//! `kube_runtime::Controller`, which handles reconnection, per-record
//! serialization and requeueing.

use std::sync::Arc;

use futures::StreamExt;
use kube::Api;
use kube_runtime::controller::Config as RuntimeConfig;
use kube_runtime::{Controller, watcher};
use tracing::{debug, error, info};

use crate::error::ControllerError;
use crate::managed::ExternalResource;
use crate::reconciler::{Context, error_policy, reconcile};

/// Watch records of kind `E` and reconcile them until the stream ends
pub async fn watch_resource<E: ExternalResource>(ctx: Arc<Context>) -> Result<(), ControllerError> {
    let api: Api<E::Resource> = match ctx.config.namespace.as_deref() {
        Some(ns) => Api::namespaced(ctx.client.clone(), ns),
        None => Api::all(ctx.client.clone()),
    };

    info!(
        kind = E::KIND,
        namespace = ctx.config.namespace.as_deref().unwrap_or("all namespaces"),
        "Starting watcher"
    );

    let runtime_config = RuntimeConfig::default()
        .debounce(ctx.config.debounce)
        .concurrency(ctx.config.concurrency);

    Controller::new(api, watcher::Config::default())
        .with_config(runtime_config)
        .shutdown_on_signal()
        .run(reconcile::<E>, error_policy::<E>, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(kind = E::KIND, record = %obj.name, "Reconciled"),
                Err(e) => error!(kind = E::KIND, error = %e, "Controller error"),
            }
        })
        .await;

    info!(kind = E::KIND, "Watcher stopped");
    Ok(())
}
