//! Generic managed-resource engine
//!
//! - `external`: the per-kind capability trait and the Observe / Create /
//!   Update / Delete state machine built on it
//! - `reference`: resolution of `<field>Ref` / `<field>Selector` into values
//! - `diff`: drift detection helpers
//! - `connector`: per-region AWS service clients

pub mod connector;
pub mod diff;
pub mod external;
pub mod reference;

pub use connector::{AwsConnector, Connector, ServiceClients};
pub use external::{
    ExternalClient, ExternalCreation, ExternalObservation, ExternalResource, IdentityPolicy, LifecycleState,
    Observation, Params,
};
pub use reference::{KubeReader, Reader, ReferenceSite, external_name_of, resolve_references};
