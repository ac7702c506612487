//! Lifecycle state of one managed resource
//!
//! Wraps the identifier and last observed tree of a single resource and only
//! lets the controller run operations the current state allows. A failed
//! operation leaves the state as it was before the call, except a create the
//! server accepted: that resource is tracked as active without an observed
//! tree so it is not created again.

use std::fmt;

use tracing::{info, warn};

use super::controller::HttpResourceController;
use crate::convert::{DesiredTree, ObservedTree};
use crate::error::{CdnError, Result};
use crate::schema::ConversionWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Absent,
    Creating,
    Active,
    Updating,
    Deactivating,
    Deactivated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Absent => "absent",
            LifecycleState::Creating => "creating",
            LifecycleState::Active => "active",
            LifecycleState::Updating => "updating",
            LifecycleState::Deactivating => "deactivating",
            LifecycleState::Deactivated => "deactivated",
        };
        f.write_str(name)
    }
}

/// One resource as tracked by the caller
#[derive(Debug, Clone)]
pub struct ManagedResource {
    id: Option<String>,
    state: LifecycleState,
    observed: Option<ObservedTree>,
}

impl Default for ManagedResource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedResource {
    /// Not yet created
    pub fn new() -> Self {
        Self {
            id: None,
            state: LifecycleState::Absent,
            observed: None,
        }
    }

    /// Resource created earlier, e.g. restored from a state file
    pub fn tracked(id: impl Into<String>, observed: ObservedTree) -> Self {
        Self {
            id: Some(id.into()),
            state: LifecycleState::Active,
            observed: Some(observed),
        }
    }

    /// Resource known by identifier whose document was never read
    pub fn unread(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            state: LifecycleState::Active,
            observed: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn observed(&self) -> Option<&ObservedTree> {
        self.observed.as_ref()
    }

    pub async fn create(
        &mut self,
        controller: &HttpResourceController,
        desired: &DesiredTree,
    ) -> Result<Vec<ConversionWarning>> {
        let previous = self.begin(
            &[LifecycleState::Absent, LifecycleState::Deactivated],
            LifecycleState::Creating,
            "create",
        )?;

        match controller.create(desired).await {
            Ok(outcome) => {
                self.id = Some(outcome.id);
                self.observed = Some(outcome.observed);
                self.state = LifecycleState::Active;
                Ok(outcome.warnings)
            }
            Err(e) => {
                match e.created_id() {
                    Some(id) => {
                        warn!("Http resource {} was created but not read back", id);
                        self.id = Some(id.to_string());
                        self.observed = None;
                        self.state = LifecycleState::Active;
                    }
                    None => self.state = previous,
                }
                Err(e)
            }
        }
    }

    /// Re-read the resource. A resource gone on the server becomes
    /// [`LifecycleState::Absent`] locally and the `NotFound` is returned.
    pub async fn refresh(&mut self, controller: &HttpResourceController) -> Result<()> {
        let id = self.active_id("refresh")?;

        match controller.read(&id).await {
            Ok(observed) => {
                self.observed = Some(observed);
                Ok(())
            }
            Err(e @ CdnError::NotFound { .. }) => {
                warn!("Http resource {} no longer exists, dropping it", id);
                *self = Self::new();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update(
        &mut self,
        controller: &HttpResourceController,
        desired: &DesiredTree,
    ) -> Result<Vec<ConversionWarning>> {
        let id = self.active_id("update")?;
        self.state = LifecycleState::Updating;

        match controller.update(&id, desired).await {
            Ok(outcome) => {
                self.observed = Some(outcome.observed);
                self.state = LifecycleState::Active;
                Ok(outcome.warnings)
            }
            Err(e) => {
                self.state = LifecycleState::Active;
                Err(e)
            }
        }
    }

    /// Deactivate on the server and forget the identifier locally
    pub async fn deactivate(&mut self, controller: &HttpResourceController) -> Result<()> {
        let id = self.active_id("deactivate")?;
        self.state = LifecycleState::Deactivating;

        match controller.deactivate(&id).await {
            Ok(()) => {
                self.id = None;
                self.observed = None;
                self.state = LifecycleState::Deactivated;
                info!("Removed http resource {} from local state", id);
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Active;
                Err(e)
            }
        }
    }

    fn begin(
        &mut self,
        allowed: &[LifecycleState],
        next: LifecycleState,
        operation: &str,
    ) -> Result<LifecycleState> {
        if !allowed.contains(&self.state) {
            return Err(self.invalid(operation));
        }
        let previous = self.state;
        self.state = next;
        Ok(previous)
    }

    fn active_id(&self, operation: &str) -> Result<String> {
        match (&self.state, &self.id) {
            (LifecycleState::Active, Some(id)) => Ok(id.clone()),
            _ => Err(self.invalid(operation)),
        }
    }

    fn invalid(&self, operation: &str) -> CdnError {
        CdnError::InvalidTransition {
            state: self.state.to_string(),
            operation: operation.to_string(),
        }
    }
}
