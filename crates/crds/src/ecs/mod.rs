//! ECS CRDs
//!
//! Resources for managing container workloads:
//! - Clusters
//! - Services
//! - Task definitions (one record per family, each update registers a revision)

pub mod cluster;
pub mod service;
pub mod task_definition;

pub use cluster::*;
pub use service::*;
pub use task_definition::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of every ECS resource
pub const GROUP: &str = "ecs.aws.microscaler.io";

/// A name/value pair (cluster settings, container environment)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct KeyValuePair {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

impl KeyValuePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
