//! AWS Controller
//!
//! Unified controller reconciling AWS managed resources against their
//! Kubernetes records:
//! - API Gateway v2: APIs, stages, routes, integrations, deployments, VPC links,
//!   authorizers, domain names and API mappings
//! - ECS: clusters, services, task definitions
//! - DAX: clusters, parameter groups, subnet groups
//! - SageMaker: models, labeling jobs

mod backoff;
mod config;
mod controller;
mod error;
mod managed;
mod reconciler;
mod watcher;

#[cfg(test)]
mod test_utils;

use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::error::ControllerError;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    // kube and the AWS SDK both pull in rustls; pick the provider once
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting AWS Controller");

    let config = ControllerConfig::from_env()?;
    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Poll interval: {:?}", config.poll_interval);
    info!("  Concurrency per kind: {}", config.concurrency);

    let client = Client::try_default().await?;
    Controller::new(client, config).run().await
}
