//! AWS managed resource CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the AWS controllers. Each kind is
//! namespaced under `<service>.aws.microscaler.io/v1alpha1` and follows the
//! managed resource layout described in [`managed`].

pub mod common;
pub mod managed;
pub mod references;

pub mod apigatewayv2;
pub mod dax;
pub mod ecs;
pub mod sagemaker;

pub use common::*;
pub use managed::{EXTERNAL_NAME_ANNOTATION, Managed, external_name, set_external_name};
pub use references::*;
