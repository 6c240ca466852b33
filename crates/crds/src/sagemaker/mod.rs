//! SageMaker CRDs
//!
//! - Models
//! - Labeling jobs

pub mod labeling_job;
pub mod model;

pub use labeling_job::*;
pub use model::*;

/// API group of every SageMaker resource
pub const GROUP: &str = "sagemaker.aws.microscaler.io";
