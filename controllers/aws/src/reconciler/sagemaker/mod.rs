//! SageMaker reconcilers
//!
//! Neither kind can be changed after create. A model whose desired state
//! moved away from AWS is reported as an immutable-field violation; a
//! labeling job is never compared at all.

pub mod labeling_job;
pub mod model;

pub(crate) use crate::reconciler::tags::tags_to_wire;

use crate::error::ControllerError;

/// Update error for kinds AWS offers no update call for
pub(crate) fn not_updatable(kind: &str) -> ControllerError {
    ControllerError::Permanent(format!("cannot update {kind}: {kind} has no update operation"))
}
