//! Error types for zpipe-provision

use thiserror::Error;
use zpipe_core::{ConfigError, InvokeError};

/// Errors raised while provisioning or deprovisioning instances.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The external CLI could not be invoked.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// Recording the instance in the generated properties file failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The CLI ran but reported failure.
    #[error("CLI command failed during {operation}: {stderr}")]
    CommandFailed {
        /// Operation being performed.
        operation: String,
        /// Captured stderr (or stdout when stderr was empty).
        stderr: String,
    },

    /// The CLI answered success but the response carried no usable data.
    #[error("no data in response during {operation}: {detail}")]
    MissingData {
        /// Operation being performed.
        operation: String,
        /// What was expected.
        detail: String,
    },

    /// An instance disappeared while we were polling it toward a state.
    #[error("instance {instance} vanished while being provisioned")]
    InstanceVanished {
        /// Instance name.
        instance: String,
    },

    /// The instance reported a failed state twice; one action retry is
    /// allowed, a second failure stops the run.
    #[error("instance {instance} failed {action} twice, giving up")]
    ActionFailed {
        /// Instance name.
        instance: String,
        /// Action that was being driven.
        action: String,
    },

    /// While waiting for provisioning the instance entered a state the
    /// workflow never passes through (e.g. being-deprovisioned);
    /// waiting it out would only spend the poll budget.
    #[error("instance {instance} is in unexpected state {state}")]
    UnexpectedState {
        /// Instance name.
        instance: String,
        /// The state the registry reported.
        state: String,
    },

    /// The instance never reached the requested state within the poll
    /// budget.
    #[error("instance {instance} did not reach {target} after {attempts} polls")]
    PollTimeout {
        /// Instance name.
        instance: String,
        /// State we were waiting for.
        target: String,
        /// Number of polls spent.
        attempts: u32,
    },

    /// The CLI profile for the new instance could not be created.
    #[error("could not create profile {profile} after {attempts} attempts")]
    ProfileCreateFailed {
        /// Profile name.
        profile: String,
        /// Attempts spent.
        attempts: u32,
    },
}
