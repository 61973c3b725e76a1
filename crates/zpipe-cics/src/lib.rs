//! CICS resource reconciliation for the pipeline.
//!
//! Wraps the CICS plugin of the external CLI: typed resource
//! descriptors, per-subcommand response classifiers, a reconciler that
//! remediates missing resources tier by tier, and DB2 SQL execution.

pub mod db2;
pub mod error;
pub mod ops;
pub mod outcome;
pub mod reconcile;
pub mod resource;

pub use db2::SqlRunner;
pub use error::CicsError;
pub use ops::CicsClient;
pub use outcome::{
    CsdReturnCode, DiscardOutcome, InstallOutcome, RefreshOutcome, StateChangeOutcome,
};
pub use reconcile::Reconciler;
pub use resource::{ResourceDescriptor, ResourceState, ResourceType};
