//! Wire models of the AWS calls made by the controllers
//!
//! One module per service. The shapes follow the AWS API field names, keep only
//! the members the controllers use, and never borrow from SDK types so the mock
//! client can produce them without the SDK.

pub mod apigatewayv2;
pub mod dax;
pub mod ecs;
pub mod sagemaker;

use serde::{Deserialize, Serialize};

/// Tag in the `[{Key, Value}]` list shape used by ECS, DAX and SageMaker
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
