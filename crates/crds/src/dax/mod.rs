//! DAX CRDs
//!
//! Resources for managing DynamoDB Accelerator clusters:
//! - Clusters
//! - Parameter groups
//! - Subnet groups

pub mod cluster;
pub mod parameter_group;
pub mod subnet_group;

pub use cluster::*;
pub use parameter_group::*;
pub use subnet_group::*;

/// API group of every DAX resource
pub const GROUP: &str = "dax.aws.microscaler.io";
