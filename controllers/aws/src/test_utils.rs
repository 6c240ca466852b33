//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test records and binding
//! reconcilers to a [`MockAwsClient`].

use aws_client::MockAwsClient;
use crds::apigatewayv2::{Api, ApiParameters, ApiSpec};
use crds::{DeletionPolicy, Managed};
use kube::Resource;

use crate::managed::{ExternalClient, ExternalResource, ServiceClients};

/// Region of every test record; matches the region the mock builds ARNs with
pub const REGION: &str = aws_client::mock::MOCK_REGION;

/// Namespace of every test record unless moved with [`in_namespace`]
pub const NAMESPACE: &str = "default";

/// Bind kind `E` to a mock
pub fn external<E: ExternalResource>(mock: &MockAwsClient) -> ExternalClient<E> {
    ExternalClient::connect(&ServiceClients::from_mock(mock))
}

/// Place a record in `namespace`
pub fn in_namespace<K: Resource>(mut obj: K, namespace: &str) -> K {
    obj.meta_mut().namespace = Some(namespace.to_string());
    obj
}

/// Add labels to a record
pub fn labeled<K: Resource>(mut obj: K, labels: &[(&str, &str)]) -> K {
    let existing = obj.meta_mut().labels.get_or_insert_with(Default::default);
    for (key, value) in labels {
        existing.insert((*key).to_string(), (*value).to_string());
    }
    obj
}

/// Record with the status a previous pass left behind
pub fn with_observation<K: Managed>(mut obj: K, observation: K::Observation) -> K {
    obj.set_at_provider(observation);
    obj
}

/// Helper to create a test HTTP Api record
pub fn api(name: &str) -> Api {
    let spec = ApiSpec {
        for_provider: ApiParameters {
            region: REGION.to_string(),
            name: name.to_string(),
            protocol_type: "HTTP".to_string(),
            ..Default::default()
        },
        deletion_policy: DeletionPolicy::default(),
    };
    in_namespace(Api::new(name, spec), NAMESPACE)
}
