//! Generic external client
//!
//! [`ExternalResource`] is the capability set one resource kind provides: how
//! to read, create, update and delete the AWS object, how to translate between
//! the record and the wire shapes, and which AWS status values mean what.
//! Every hook except the AWS calls and the translation defaults to a no-op.
//!
//! [`ExternalClient`] runs the shared Observe / Create / Update / Delete state
//! machine on top of it. It holds no state between reconciliations; everything
//! it learns is written to the record.

use async_trait::async_trait;
use aws_client::AwsError;
use crds::{Condition, Managed, external_name, set_external_name};
use kube::ResourceExt;
use tracing::{debug, info};

use super::connector::ServiceClients;
use super::reference::ReferenceSite;
use crate::error::{ControllerError, Stage};

/// Desired state type of a kind
pub type Params<E> = <<E as ExternalResource>::Resource as Managed>::Parameters;

/// Observed state type of a kind
pub type Observation<E> = <<E as ExternalResource>::Resource as Managed>::Observation;

/// Where the AWS identifier of a resource comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// The record name is the AWS identifier; it is copied into the external
    /// name before create
    NameIsId,
    /// AWS assigns the identifier on create; it is copied from the response
    AwsAssigned,
}

/// AWS-side lifecycle state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Available,
    Creating,
    Deleting,
    Unavailable,
    /// Tombstone: the object still answers Describe but is gone for good
    Absent,
}

impl LifecycleState {
    /// Ready condition reported for the state
    pub fn condition(self) -> Condition {
        match self {
            LifecycleState::Available => Condition::available(),
            LifecycleState::Creating => Condition::creating(),
            LifecycleState::Deleting => Condition::deleting(),
            LifecycleState::Unavailable | LifecycleState::Absent => Condition::unavailable(),
        }
    }
}

/// Result of observing a resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    /// First differing field when not up to date
    pub diff: String,
    /// Whether late initialization changed the desired state
    pub late_initialized: bool,
}

impl ExternalObservation {
    /// The resource does not exist
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Result of creating a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    /// The external name changed and must be persisted before anything else
    pub external_name_assigned: bool,
}

/// Per-kind capability set driven by [`ExternalClient`]
#[async_trait]
pub trait ExternalResource: Send + Sync + Sized + 'static {
    /// Record type
    type Resource: Managed;
    /// Raw response of the read call
    type Response: Send;
    /// The single AWS object the record maps to
    type Observed: Send + Sync;
    type CreateInput: Send;
    type Created: Send + Sync;
    type UpdateInput: Send;
    type Updated: Send;
    type DeleteInput: Send;

    /// Kind name used in logs and error messages
    const KIND: &'static str;
    const IDENTITY: IdentityPolicy;
    /// AWS status value to lifecycle state; unknown values map to `Unavailable`
    const STATUS_TABLE: &'static [(&'static str, LifecycleState)] = &[];
    /// The AWS object outlives its delete call; the record is released once
    /// the call was issued
    const RELEASE_ON_DELETE: bool = false;

    /// Bind the kind to the service clients of a region
    fn from_clients(clients: &ServiceClients) -> Self;

    /// Reference sites resolved before every observe
    fn reference_sites() -> Vec<ReferenceSite<Params<Self>>> {
        Vec::new()
    }

    /// Validate the record before reading (e.g. parent identifiers are resolved)
    fn pre_observe(&self, _cr: &Self::Resource, _external_name: &str) -> Result<(), ControllerError> {
        Ok(())
    }

    /// Issue the read call
    async fn describe(&self, cr: &Self::Resource, external_name: &str) -> Result<Self::Response, AwsError>;

    /// Whether `err` means the resource does not exist
    fn is_not_found(&self, err: &AwsError) -> bool;

    /// Narrow the read response to the object named `external_name`
    fn filter_list(&self, external_name: &str, response: Self::Response) -> Option<Self::Observed>;

    /// Copy observed values into unset desired fields
    fn late_initialize(&self, _params: &mut Params<Self>, _observed: &Self::Observed) {}

    fn generate_observation(&self, observed: &Self::Observed) -> Observation<Self>;

    /// Compare desired state with the state generated from `observed`
    fn is_up_to_date(&self, _cr: &Self::Resource, _observed: &Self::Observed) -> Result<(bool, String), ControllerError> {
        Ok((true, String::new()))
    }

    /// Describe a change to a field AWS cannot update in place
    fn immutable_violation(&self, _cr: &Self::Resource, _observed: &Self::Observed) -> Option<String> {
        None
    }

    /// AWS status value looked up in [`Self::STATUS_TABLE`]
    fn observed_status<'a>(&self, _observed: &'a Self::Observed) -> Option<&'a str> {
        None
    }

    fn post_observe(
        &self,
        _cr: &mut Self::Resource,
        _observed: &Self::Observed,
        observation: ExternalObservation,
    ) -> Result<ExternalObservation, ControllerError> {
        Ok(observation)
    }

    fn create_input(&self, cr: &Self::Resource, external_name: &str) -> Result<Self::CreateInput, ControllerError>;

    async fn create(&self, input: Self::CreateInput) -> Result<Self::Created, AwsError>;

    /// Identifier AWS assigned, for [`IdentityPolicy::AwsAssigned`] kinds
    fn assigned_id(&self, _created: &Self::Created) -> Option<String> {
        None
    }

    async fn post_create(
        &self,
        _cr: &mut Self::Resource,
        _external_name: &str,
        _created: &Self::Created,
    ) -> Result<(), ControllerError> {
        Ok(())
    }

    fn update_input(&self, cr: &Self::Resource, external_name: &str) -> Result<Self::UpdateInput, ControllerError>;

    async fn update(&self, input: Self::UpdateInput) -> Result<Self::Updated, AwsError>;

    async fn post_update(
        &self,
        _cr: &mut Self::Resource,
        _external_name: &str,
        _updated: Self::Updated,
    ) -> Result<(), ControllerError> {
        Ok(())
    }

    /// Build the delete input; `None` skips the call
    fn delete_input(&self, cr: &Self::Resource, external_name: &str) -> Result<Option<Self::DeleteInput>, ControllerError>;

    async fn delete(&self, input: Self::DeleteInput) -> Result<(), AwsError>;
}

/// Lifecycle state machine shared by every kind
#[derive(Debug)]
pub struct ExternalClient<E> {
    resource: E,
}

impl<E: ExternalResource> ExternalClient<E> {
    pub fn new(resource: E) -> Self {
        Self { resource }
    }

    /// Bind a client to the service clients of a region
    pub fn connect(clients: &ServiceClients) -> Self {
        Self::new(E::from_clients(clients))
    }

    /// The kind-specific capability set
    pub fn resource(&self) -> &E {
        &self.resource
    }

    /// Read the AWS object and refresh observed state, late-initialized fields and Ready
    pub async fn observe(&self, cr: &mut E::Resource) -> Result<ExternalObservation, ControllerError> {
        let name = external_name(cr);
        if name.is_empty() {
            return Ok(ExternalObservation::absent());
        }

        self.resource.pre_observe(cr, &name)?;

        let response = match self.resource.describe(cr, &name).await {
            Ok(response) => response,
            Err(e) if self.resource.is_not_found(&e) => {
                debug!(kind = E::KIND, external_name = %name, "Resource not found");
                return Ok(ExternalObservation::absent());
            }
            Err(e) => return Err(ControllerError::from_aws(Stage::Describe, E::KIND, e)),
        };

        let Some(observed) = self.resource.filter_list(&name, response) else {
            debug!(kind = E::KIND, external_name = %name, "Resource not in list response");
            return Ok(ExternalObservation::absent());
        };

        let state = self.lifecycle_state(&observed);
        if state == LifecycleState::Absent {
            info!(kind = E::KIND, external_name = %name, "Resource is a tombstone, treating as absent");
            cr.set_condition(state.condition());
            return Ok(ExternalObservation::absent());
        }

        let mut params = cr.for_provider().clone();
        self.resource.late_initialize(&mut params, &observed);
        let late_initialized = params != *cr.for_provider();
        if late_initialized {
            debug!(kind = E::KIND, external_name = %name, "Late-initialized desired state");
            *cr.for_provider_mut() = params;
        }

        cr.set_at_provider(self.resource.generate_observation(&observed));
        cr.set_condition(state.condition());

        if let Some(violation) = self.resource.immutable_violation(cr, &observed) {
            return Err(ControllerError::Permanent(format!(
                "cannot update {}: {}",
                E::KIND,
                violation
            )));
        }

        // Nothing to update on an object that is going away
        let (resource_up_to_date, diff) = if state == LifecycleState::Deleting {
            (true, String::new())
        } else {
            self.resource
                .is_up_to_date(cr, &observed)
                .map_err(|e| match e {
                    ControllerError::Serialization(e) => {
                        ControllerError::Permanent(format!("cannot compare {}: {e}", E::KIND))
                    }
                    other => other,
                })?
        };

        let observation = ExternalObservation {
            resource_exists: true,
            resource_up_to_date,
            diff,
            late_initialized,
        };
        self.resource.post_observe(cr, &observed, observation)
    }

    /// Create the AWS object and record its identifier
    pub async fn create(&self, cr: &mut E::Resource) -> Result<ExternalCreation, ControllerError> {
        cr.set_condition(Condition::creating());

        let mut name = external_name(cr);
        let mut external_name_assigned = false;
        if E::IDENTITY == IdentityPolicy::NameIsId && name.is_empty() {
            name = cr.name_any();
            set_external_name(cr, &name);
            external_name_assigned = true;
        }

        let input = self.resource.create_input(cr, &name)?;
        let created = self
            .resource
            .create(input)
            .await
            .map_err(|e| ControllerError::from_aws(Stage::Create, E::KIND, e))?;

        if E::IDENTITY == IdentityPolicy::AwsAssigned {
            let id = self
                .resource
                .assigned_id(&created)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    ControllerError::lifecycle(
                        Stage::Create,
                        E::KIND,
                        AwsError::UnexpectedResponse("create response carries no identifier".to_string()),
                    )
                })?;
            info!(kind = E::KIND, record = %cr.name_any(), external_name = %id, "External name assigned");
            set_external_name(cr, &id);
            name = id;
            external_name_assigned = true;
        } else {
            info!(kind = E::KIND, external_name = %name, "Created resource");
        }

        self.resource.post_create(cr, &name, &created).await?;
        Ok(ExternalCreation { external_name_assigned })
    }

    /// Push desired state to the AWS object
    pub async fn update(&self, cr: &mut E::Resource) -> Result<(), ControllerError> {
        let name = external_name(cr);
        let input = self.resource.update_input(cr, &name)?;
        let updated = self
            .resource
            .update(input)
            .await
            .map_err(|e| ControllerError::from_aws(Stage::Update, E::KIND, e))?;
        info!(kind = E::KIND, external_name = %name, "Updated resource");
        self.resource.post_update(cr, &name, updated).await
    }

    /// Delete the AWS object; a missing object is not an error
    pub async fn delete(&self, cr: &mut E::Resource) -> Result<(), ControllerError> {
        cr.set_condition(Condition::deleting());

        let name = external_name(cr);
        if name.is_empty() {
            return Ok(());
        }

        let Some(input) = self.resource.delete_input(cr, &name)? else {
            debug!(kind = E::KIND, external_name = %name, "Delete skipped");
            return Ok(());
        };

        match self.resource.delete(input).await {
            Ok(()) => {
                info!(kind = E::KIND, external_name = %name, "Delete issued");
                Ok(())
            }
            Err(e) if self.resource.is_not_found(&e) => {
                debug!(kind = E::KIND, external_name = %name, "Resource already gone");
                Ok(())
            }
            Err(e) => Err(ControllerError::from_aws(Stage::Delete, E::KIND, e)),
        }
    }

    fn lifecycle_state(&self, observed: &E::Observed) -> LifecycleState {
        match self.resource.observed_status(observed) {
            None => LifecycleState::Available,
            Some(status) => E::STATUS_TABLE
                .iter()
                .find(|(value, _)| *value == status)
                .map_or(LifecycleState::Unavailable, |(_, state)| *state),
        }
    }
}
