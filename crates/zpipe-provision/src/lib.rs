//! z/OSMF software-services provisioning for the pipeline.
//!
//! Submits templates, polls instances through their lifecycle with an
//! explicit budget, reads published instance variables, and sets up the
//! CLI profile for a freshly provisioned region.

pub mod error;
pub mod instance;
pub mod poller;
pub mod profile;

pub use error::ProvisionError;
pub use instance::{InstanceInfo, InstanceQuery, InstanceState};
pub use poller::{ProvisionedInstance, Provisioner};
pub use profile::{ensure_cics_profile, CmciTarget};
