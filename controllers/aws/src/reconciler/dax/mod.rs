//! DAX reconcilers
//!
//! Every DAX kind is addressed by its record name. A missing resource is
//! reported as a kind-specific `*NotFoundFault`.

pub mod cluster;
pub mod parameter_group;
pub mod subnet_group;

pub(crate) use crate::reconciler::tags::tags_to_wire;
