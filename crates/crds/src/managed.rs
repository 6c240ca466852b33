//! Managed resource contract
//!
//! Every AWS-backed custom resource has the same outer shape:
//! `spec.forProvider` (desired state, including `region`), `spec.deletionPolicy`,
//! `status.atProvider` (observed state) and `status.conditions`.
//! The [`Managed`] trait exposes that shape to the generic reconciliation engine.

use std::collections::BTreeMap;
use std::fmt::Debug;

use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::common::{Condition, DeletionPolicy};

/// Annotation holding the AWS-side identifier of a managed resource
///
/// The key is part of the persisted state of every record and must never change.
pub const EXTERNAL_NAME_ANNOTATION: &str = "aws.microscaler.io/external-name";

/// Common accessors for AWS managed resources
pub trait Managed:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Desired state (`spec.forProvider`)
    type Parameters: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    /// Observed state (`status.atProvider`)
    type Observation: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    fn for_provider(&self) -> &Self::Parameters;

    fn for_provider_mut(&mut self) -> &mut Self::Parameters;

    fn deletion_policy(&self) -> DeletionPolicy;

    /// AWS region the resource lives in
    fn region(&self) -> &str;

    fn at_provider(&self) -> Option<&Self::Observation>;

    /// Replace the observed state wholesale
    fn set_at_provider(&mut self, observation: Self::Observation);

    fn conditions(&self) -> &[Condition];

    fn set_condition(&mut self, condition: Condition);
}

/// Get the external name of a resource, empty when unset
pub fn external_name<K: Resource>(obj: &K) -> String {
    obj.meta()
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(EXTERNAL_NAME_ANNOTATION))
        .cloned()
        .unwrap_or_default()
}

/// Set the external name annotation of a resource
pub fn set_external_name<K: Resource>(obj: &mut K, name: impl Into<String>) {
    obj.meta_mut()
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(EXTERNAL_NAME_ANNOTATION.to_string(), name.into());
}

/// Implement [`Managed`] for a custom resource whose spec is
/// `{ for_provider, deletion_policy }` and whose status is
/// `{ at_provider, conditions }`.
#[macro_export]
macro_rules! impl_managed {
    ($kind:ty, $params:ty, $observation:ty) => {
        impl $crate::managed::Managed for $kind {
            type Parameters = $params;
            type Observation = $observation;

            fn for_provider(&self) -> &$params {
                &self.spec.for_provider
            }

            fn for_provider_mut(&mut self) -> &mut $params {
                &mut self.spec.for_provider
            }

            fn deletion_policy(&self) -> $crate::common::DeletionPolicy {
                self.spec.deletion_policy
            }

            fn region(&self) -> &str {
                &self.spec.for_provider.region
            }

            fn at_provider(&self) -> Option<&$observation> {
                self.status.as_ref().and_then(|s| s.at_provider.as_ref())
            }

            fn set_at_provider(&mut self, observation: $observation) {
                self.status.get_or_insert_with(Default::default).at_provider = Some(observation);
            }

            fn conditions(&self) -> &[$crate::common::Condition] {
                self.status
                    .as_ref()
                    .map(|s| s.conditions.as_slice())
                    .unwrap_or(&[])
            }

            fn set_condition(&mut self, condition: $crate::common::Condition) {
                $crate::common::set_condition(
                    &mut self.status.get_or_insert_with(Default::default).conditions,
                    condition,
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Cluster, ClusterParameters, ClusterSpec};

    fn cluster() -> Cluster {
        Cluster::new(
            "prod",
            ClusterSpec {
                for_provider: ClusterParameters {
                    region: "us-east-1".to_string(),
                    ..Default::default()
                },
                deletion_policy: DeletionPolicy::default(),
            },
        )
    }

    #[test]
    fn test_external_name_empty_when_unset() {
        assert_eq!(external_name(&cluster()), "");
    }

    #[test]
    fn test_set_external_name() {
        let mut cluster = cluster();
        set_external_name(&mut cluster, "prod");
        assert_eq!(external_name(&cluster), "prod");
    }

    #[test]
    fn test_managed_accessors() {
        let mut cluster = cluster();
        assert_eq!(cluster.region(), "us-east-1");
        assert!(cluster.at_provider().is_none());
        assert!(cluster.conditions().is_empty());

        cluster.set_condition(Condition::creating());
        assert_eq!(cluster.conditions().len(), 1);
        assert_eq!(cluster.deletion_policy(), DeletionPolicy::Delete);
    }
}
