//! Main controller implementation.
//!
//! Starts one watcher per managed kind and runs until any of them exits.

use std::sync::Arc;

use futures::future::select_all;
use kube::Client;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::managed::ExternalResource;
use crate::reconciler::{Context, apigatewayv2, dax, ecs, sagemaker};
use crate::watcher::watch_resource;

type WatcherHandle = JoinHandle<Result<(), ControllerError>>;

/// Main controller for AWS managed resources
pub struct Controller {
    watchers: Vec<(&'static str, WatcherHandle)>,
}

fn spawn<E: ExternalResource>(ctx: &Arc<Context>) -> (&'static str, WatcherHandle) {
    (E::KIND, tokio::spawn(watch_resource::<E>(Arc::clone(ctx))))
}

impl Controller {
    /// Start a watcher for every kind
    pub fn new(client: Client, config: ControllerConfig) -> Self {
        let ctx = Arc::new(Context::new(client, config));

        let watchers = vec![
            // API Gateway v2
            spawn::<apigatewayv2::api::ApiExternal>(&ctx),
            spawn::<apigatewayv2::stage::StageExternal>(&ctx),
            spawn::<apigatewayv2::route::RouteExternal>(&ctx),
            spawn::<apigatewayv2::route_response::RouteResponseExternal>(&ctx),
            spawn::<apigatewayv2::integration::IntegrationExternal>(&ctx),
            spawn::<apigatewayv2::integration_response::IntegrationResponseExternal>(&ctx),
            spawn::<apigatewayv2::deployment::DeploymentExternal>(&ctx),
            spawn::<apigatewayv2::vpc_link::VpcLinkExternal>(&ctx),
            spawn::<apigatewayv2::api_mapping::ApiMappingExternal>(&ctx),
            spawn::<apigatewayv2::authorizer::AuthorizerExternal>(&ctx),
            spawn::<apigatewayv2::domain_name::DomainNameExternal>(&ctx),
            // ECS
            spawn::<ecs::cluster::ClusterExternal>(&ctx),
            spawn::<ecs::service::ServiceExternal>(&ctx),
            spawn::<ecs::task_definition::TaskDefinitionExternal>(&ctx),
            // DAX
            spawn::<dax::cluster::ClusterExternal>(&ctx),
            spawn::<dax::parameter_group::ParameterGroupExternal>(&ctx),
            spawn::<dax::subnet_group::SubnetGroupExternal>(&ctx),
            // SageMaker
            spawn::<sagemaker::model::ModelExternal>(&ctx),
            spawn::<sagemaker::labeling_job::LabelingJobExternal>(&ctx),
        ];

        info!(watchers = watchers.len(), "AWS controller initialized");
        Self { watchers }
    }

    /// Run until a watcher exits
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("AWS controller running");

        let (kinds, handles): (Vec<&'static str>, Vec<WatcherHandle>) = self.watchers.into_iter().unzip();
        let (result, index, remaining) = select_all(handles).await;
        let kind = kinds.get(index).copied().unwrap_or("unknown");

        for handle in remaining {
            handle.abort();
        }

        match result {
            Ok(Ok(())) => {
                warn!(kind, "Watcher exited, shutting down");
                Ok(())
            }
            Ok(Err(e)) => Err(ControllerError::Watch(format!("{kind} watcher error: {e}"))),
            Err(e) => Err(ControllerError::Watch(format!("{kind} watcher panicked: {e}"))),
        }
    }
}
