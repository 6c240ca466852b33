//! SDK-backed service clients
//!
//! Credentials come from the default provider chain (environment, profile, web
//! identity, instance metadata). Each client is bound to one region.

mod apigatewayv2;
mod convert;
mod dax;
mod ecs;
mod sagemaker;

pub use apigatewayv2::ApiGatewayV2Client;
pub use dax::DaxClient;
pub use ecs::EcsClient;
pub use sagemaker::SageMakerClient;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

/// Load the shared SDK configuration for a region
pub async fn load_config(region: &str) -> SdkConfig {
    debug!(region, "Loading AWS SDK configuration");
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// The four service clients for one region
#[derive(Debug, Clone)]
pub struct AwsClients {
    /// API Gateway v2
    pub apigatewayv2: ApiGatewayV2Client,
    /// ECS
    pub ecs: EcsClient,
    /// DAX
    pub dax: DaxClient,
    /// SageMaker
    pub sagemaker: SageMakerClient,
}

impl AwsClients {
    /// Build all clients from a loaded configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            apigatewayv2: ApiGatewayV2Client::new(config),
            ecs: EcsClient::new(config),
            dax: DaxClient::new(config),
            sagemaker: SageMakerClient::new(config),
        }
    }

    /// Load configuration for `region` and build all clients
    pub async fn for_region(region: &str) -> Self {
        Self::new(&load_config(region).await)
    }
}
