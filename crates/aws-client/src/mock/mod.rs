//! Mock AWS client for unit testing
//!
//! [`MockAwsClient`] implements all four service traits against in-memory state
//! and mimics the service behavior the controllers depend on: the error codes
//! returned for missing resources, ECS reporting missing clusters and services
//! through `failures`, and lifecycle status values after create and delete.
//!
//! The mock is organized into service modules:
//! - `apigatewayv2.rs` - APIs, stages, routes, integrations, and the rest of API Gateway v2
//! - `ecs.rs` - clusters, services, task definitions
//! - `dax.rs` - clusters, parameter groups, subnet groups
//! - `sagemaker.rs` - models, labeling jobs

mod apigatewayv2;
mod dax;
mod ecs;
mod sagemaker;

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::AwsError;
use crate::models::{Tag, apigatewayv2 as apigw, dax as daxm, ecs as ecsm, sagemaker as sm};

/// Region used to build mock ARNs
pub const MOCK_REGION: &str = "us-east-1";
/// Account used to build mock ARNs
pub const MOCK_ACCOUNT: &str = "123456789012";

/// In-memory service state
#[derive(Debug, Default)]
pub(crate) struct MockState {
    // API Gateway v2, keyed by parent identifiers then own identifier
    pub(crate) apis: HashMap<String, apigw::Api>,
    pub(crate) stages: HashMap<(String, String), apigw::Stage>,
    pub(crate) routes: HashMap<(String, String), apigw::Route>,
    pub(crate) route_responses: HashMap<(String, String, String), apigw::RouteResponse>,
    pub(crate) integrations: HashMap<(String, String), apigw::Integration>,
    pub(crate) integration_responses: HashMap<(String, String, String), apigw::IntegrationResponse>,
    pub(crate) deployments: HashMap<(String, String), apigw::Deployment>,
    pub(crate) vpc_links: HashMap<String, apigw::VpcLink>,
    pub(crate) api_mappings: HashMap<(String, String), apigw::ApiMapping>,
    pub(crate) authorizers: HashMap<(String, String), apigw::Authorizer>,
    pub(crate) domain_names: HashMap<String, apigw::DomainName>,
    pub(crate) apigw_tags: HashMap<String, BTreeMap<String, String>>,

    // ECS
    pub(crate) ecs_clusters: HashMap<String, ecsm::Cluster>,
    pub(crate) ecs_services: HashMap<(String, String), ecsm::Service>,
    pub(crate) task_definitions: HashMap<String, ecsm::DescribeTaskDefinitionOutput>,
    pub(crate) ecs_tags: HashMap<String, Vec<Tag>>,

    // DAX
    pub(crate) dax_clusters: HashMap<String, daxm::Cluster>,
    pub(crate) dax_parameter_groups: HashMap<String, (daxm::ParameterGroup, Vec<daxm::ParameterNameValue>)>,
    pub(crate) dax_subnet_groups: HashMap<String, daxm::SubnetGroup>,

    // SageMaker
    pub(crate) models: HashMap<String, sm::Model>,
    pub(crate) labeling_jobs: HashMap<String, sm::LabelingJob>,

    // Call log, injected failures and identifier generation
    pub(crate) calls: Vec<String>,
    pub(crate) failures: HashMap<String, VecDeque<AwsError>>,
    pub(crate) queued_ids: VecDeque<String>,
    pub(crate) next_id: u64,
}

/// Mock AWS client for testing
///
/// Cloning shares the underlying state, so a test can keep one handle for
/// assertions while the controller under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockAwsClient {
    pub(crate) state: Arc<Mutex<MockState>>,
}

impl MockAwsClient {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call to `operation` and return the failure injected for it, if any
    pub(crate) fn record(&self, operation: &str) -> Result<MutexGuard<'_, MockState>, AwsError> {
        let mut state = self.lock();
        state.calls.push(operation.to_string());
        if let Some(err) = state.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        Ok(state)
    }

    /// Make the next call to `operation` (e.g. `"CreateApi"`) fail with `err`
    ///
    /// Failures queue up: injecting twice fails the next two calls.
    pub fn fail_next(&self, operation: &str, err: AwsError) {
        self.lock().failures.entry(operation.to_string()).or_default().push_back(err);
    }

    /// Identifier the next create call assigns, instead of a generated one
    pub fn push_next_id(&self, id: impl Into<String>) {
        self.lock().queued_ids.push_back(id.into());
    }

    /// All operations called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of times `operation` was called
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == operation).count()
    }

    /// Forget recorded calls (state is kept)
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl MockState {
    /// Next assigned identifier
    pub(crate) fn next_id(&mut self) -> String {
        if let Some(id) = self.queued_ids.pop_front() {
            return id;
        }
        self.next_id += 1;
        format!("mock{:04}", self.next_id)
    }
}

pub(crate) fn not_found(code: &str, message: impl Into<String>) -> AwsError {
    AwsError::service(code, message)
}

pub(crate) fn arn(service: &str, resource: &str) -> String {
    format!("arn:aws:{service}:{MOCK_REGION}:{MOCK_ACCOUNT}:{resource}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_ids_take_precedence() {
        let mock = MockAwsClient::new();
        mock.push_next_id("abc123");
        let mut state = mock.lock();
        assert_eq!(state.next_id(), "abc123");
        assert_eq!(state.next_id(), "mock0001");
    }

    #[test]
    fn test_injected_failures_are_consumed_in_order() {
        let mock = MockAwsClient::new();
        mock.fail_next("GetApi", AwsError::Transport("boom".to_string()));
        assert!(mock.record("GetApi").is_err());
        assert!(mock.record("GetApi").is_ok());
        assert_eq!(mock.call_count("GetApi"), 2);
    }
}
