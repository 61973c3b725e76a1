//! Error types for zpipe-cics

use thiserror::Error;
use zpipe_core::InvokeError;

/// Errors raised by CICS resource operations and reconciliation.
#[derive(Error, Debug)]
pub enum CicsError {
    /// The external CLI could not be invoked.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// The CLI ran but reported failure for the operation.
    #[error("CLI command failed during {operation} of {resource}: {stderr}")]
    CommandFailed {
        /// Operation being performed (install, define, ...).
        operation: String,
        /// Resource description.
        resource: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The response matched none of the known patterns.
    ///
    /// The reconciler does not guess; the raw output travels with the
    /// error for the operator.
    #[error("unrecognized response during {operation} of {resource}:\n{stdout}")]
    UnclassifiedResponse {
        /// Operation being performed.
        operation: String,
        /// Resource description.
        resource: String,
        /// Verbatim CLI output.
        stdout: String,
    },

    /// The CICS region itself is not active (IEE341I in the output).
    #[error("CICS region is not active:\n{stdout}")]
    RegionInactive {
        /// Verbatim CLI output.
        stdout: String,
    },

    /// A remediation tier failed twice; the run stops here.
    #[error("{resource}: {detail}")]
    ReconcileFailed {
        /// Resource description.
        resource: String,
        /// What failed and at which tier.
        detail: String,
    },

    /// DFHCSDUP (or a define/delete wrapper) exited above the warning
    /// threshold.
    #[error("CSD update for {resource} failed with return code {rc}:\n{stdout}")]
    CsdFailed {
        /// Resource description.
        resource: String,
        /// Highest return code reported.
        rc: i64,
        /// Verbatim CLI output.
        stdout: String,
    },

    /// An SQL file executed with a negative SQLCODE.
    #[error("SQL failed with SQLCODE {sqlcode}: {explanation}")]
    SqlFailed {
        /// The negative SQLCODE reported in the DSNT408I message.
        sqlcode: i64,
        /// The explanation text that followed it.
        explanation: String,
    },
}
