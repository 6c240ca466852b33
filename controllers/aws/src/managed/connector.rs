//! Per-region AWS service clients
//!
//! Records carry their own region, so clients are built on demand and cached
//! by region for the lifetime of the process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_client::{ApiGatewayV2Api, AwsClients, DaxApi, EcsApi, SageMakerApi};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::ControllerError;

/// The four service clients of one region
#[derive(Clone)]
pub struct ServiceClients {
    pub apigatewayv2: Arc<dyn ApiGatewayV2Api>,
    pub ecs: Arc<dyn EcsApi>,
    pub dax: Arc<dyn DaxApi>,
    pub sagemaker: Arc<dyn SageMakerApi>,
}

impl fmt::Debug for ServiceClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClients").finish_non_exhaustive()
    }
}

impl From<AwsClients> for ServiceClients {
    fn from(clients: AwsClients) -> Self {
        Self {
            apigatewayv2: Arc::new(clients.apigatewayv2),
            ecs: Arc::new(clients.ecs),
            dax: Arc::new(clients.dax),
            sagemaker: Arc::new(clients.sagemaker),
        }
    }
}

#[cfg(test)]
impl ServiceClients {
    /// All four services backed by one shared mock
    pub fn from_mock(mock: &aws_client::MockAwsClient) -> Self {
        Self {
            apigatewayv2: Arc::new(mock.clone()),
            ecs: Arc::new(mock.clone()),
            dax: Arc::new(mock.clone()),
            sagemaker: Arc::new(mock.clone()),
        }
    }
}

/// Produces the service clients for a region
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, region: &str) -> Result<ServiceClients, ControllerError>;
}

/// Connector backed by the AWS SDK default credential chain
#[derive(Debug, Default)]
pub struct AwsConnector {
    cache: Mutex<HashMap<String, ServiceClients>>,
}

impl AwsConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for AwsConnector {
    async fn connect(&self, region: &str) -> Result<ServiceClients, ControllerError> {
        if region.is_empty() {
            return Err(ControllerError::Precondition(
                "spec.forProvider.region is required".to_string(),
            ));
        }

        let mut cache = self.cache.lock().await;
        if let Some(clients) = cache.get(region) {
            return Ok(clients.clone());
        }

        info!(region, "Building AWS clients");
        let clients = ServiceClients::from(AwsClients::for_region(region).await);
        cache.insert(region.to_string(), clients.clone());
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_region_is_rejected() {
        let connector = AwsConnector::new();
        let err = connector.connect("").await.unwrap_err();
        assert!(matches!(err, ControllerError::Precondition(_)));
        assert_eq!(err.to_string(), "spec.forProvider.region is required");
    }
}
