//! Resource reconciliation.
//!
//! `prepare` drives a resource from whatever state the region holds it
//! in to enabled, remediating downward one tier at a time:
//!
//! ```text
//! enabled? -- no --> CEMT SET ENABLED
//!                      not found --> install
//!                                      definition not found --> define
//!                                                                 install (once more)
//!                                      installed ------------> CEMT SET ENABLED (once more)
//! ```
//!
//! Each remediation tier is attempted at most twice. A second failure
//! at the same tier stops the run; there is never a third attempt.

use crate::error::CicsError;
use crate::ops::CicsClient;
use crate::outcome::{InstallOutcome, StateChangeOutcome, DiscardOutcome};
use crate::resource::{ResourceDescriptor, ResourceState};
use tracing::{debug, info};

/// Drives resources toward the enabled state.
pub struct Reconciler<'a> {
    client: &'a CicsClient,
    install_via_modify: bool,
}

impl<'a> Reconciler<'a> {
    /// Reconciler installing through `cics install`.
    pub fn new(client: &'a CicsClient) -> Self {
        Self {
            client,
            install_via_modify: false,
        }
    }

    /// Install through CEDA INSTALL modify commands instead. Bundles
    /// need this form.
    pub fn with_modify_install(mut self) -> Self {
        self.install_via_modify = true;
        self
    }

    async fn install(&self, res: &ResourceDescriptor) -> Result<InstallOutcome, CicsError> {
        if self.install_via_modify {
            self.client.install_via_modify(res).await
        } else {
            self.client.install(res).await
        }
    }

    fn tier_failed(res: &ResourceDescriptor, detail: &str) -> CicsError {
        CicsError::ReconcileFailed {
            resource: res.to_string(),
            detail: detail.to_string(),
        }
    }

    /// Ensure the resource exists, is installed and is enabled,
    /// defining it with `parms` if the CSD has no entry.
    pub async fn prepare(
        &self,
        res: &ResourceDescriptor,
        parms: &[String],
    ) -> Result<(), CicsError> {
        if self.client.is_enabled(res).await? {
            debug!(resource = %res, "already enabled");
            return Ok(());
        }

        info!(resource = %res, "not usable, remediating");
        match self.client.set_state(res, ResourceState::Enabled).await? {
            StateChangeOutcome::Changed => return Ok(()),
            StateChangeOutcome::Unchanged => {
                return Err(Self::tier_failed(res, "could not be enabled"))
            }
            StateChangeOutcome::NotFound => {}
        }

        debug!(resource = %res, "not installed, installing");
        match self.install(res).await? {
            InstallOutcome::Installed | InstallOutcome::AlreadyInstalled => {}
            InstallOutcome::Failed => {
                return Err(Self::tier_failed(res, "install failed"));
            }
            InstallOutcome::DefinitionNotFound => {
                debug!(resource = %res, "not defined, defining");
                self.client.define(res, parms).await?;

                match self.install(res).await? {
                    InstallOutcome::Installed | InstallOutcome::AlreadyInstalled => {}
                    _ => {
                        return Err(Self::tier_failed(
                            res,
                            "install failed after defining the resource",
                        ))
                    }
                }
            }
        }

        match self.client.set_state(res, ResourceState::Enabled).await? {
            StateChangeOutcome::Changed => {
                info!(resource = %res, "enabled");
                Ok(())
            }
            _ => Err(Self::tier_failed(res, "could not be enabled after install")),
        }
    }

    /// Tear the resource down: disable, discard from the region, and
    /// delete the CSD definition. Absent tiers are skipped; a resource
    /// that refuses to disable stops the run.
    pub async fn remove(&self, res: &ResourceDescriptor) -> Result<(), CicsError> {
        match self.client.set_state(res, ResourceState::Disabled).await? {
            StateChangeOutcome::Changed | StateChangeOutcome::Unchanged => {}
            StateChangeOutcome::NotFound => {
                debug!(resource = %res, "not installed, deleting definition only");
            }
        }

        match self.client.discard(res).await? {
            DiscardOutcome::Discarded | DiscardOutcome::NotFound => {}
            DiscardOutcome::NotDisabled => {
                return Err(Self::tier_failed(res, "still enabled, cannot discard"));
            }
        }

        self.client.delete(res).await?;
        info!(resource = %res, "removed");
        Ok(())
    }
}
