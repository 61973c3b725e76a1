//! Per-subcommand response classifiers.
//!
//! Each CICS subcommand answers in free text; these functions are the
//! single translation boundary from that text to typed outcomes. The
//! pattern tables live here, in priority order, so they can be tested
//! against recorded fixtures. `None` always means "matched nothing" -
//! the caller logs the output and aborts rather than guessing.

use zpipe_core::{parse_marked_integer, PatternSet};

/// Outcome of `cics install` (and the CEDA INSTALL modify variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Resource installed successfully.
    Installed,
    /// Resource was already installed.
    AlreadyInstalled,
    /// The CSD holds no definition for the resource.
    DefinitionNotFound,
    /// Installation ran and failed.
    Failed,
}

/// Classify install output. "not found" style patterns are checked
/// before "duplicate" by declared order.
pub fn classify_install(stdout: &str) -> Option<InstallOutcome> {
    PatternSet::new(&[
        ("does not contain|not found", InstallOutcome::DefinitionNotFound),
        (
            "unsuccessful|commands with errors cannot be executed",
            InstallOutcome::Failed,
        ),
        ("install successful", InstallOutcome::Installed),
        ("duplicate", InstallOutcome::AlreadyInstalled),
    ])
    .classify_or_warn(stdout, "install")
}

/// Outcome of `CEMT DISCARD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardOutcome {
    /// Resource discarded.
    Discarded,
    /// Resource still enabled, cannot be discarded.
    NotDisabled,
    /// Resource is not installed.
    NotFound,
}

/// Classify discard output.
pub fn classify_discard(stdout: &str) -> Option<DiscardOutcome> {
    PatternSet::new(&[
        ("not disabled", DiscardOutcome::NotDisabled),
        ("resource discarded", DiscardOutcome::Discarded),
        ("not found", DiscardOutcome::NotFound),
    ])
    .classify_or_warn(stdout, "discard")
}

/// Outcome of a `CEMT SET <resource> ENABLED|DISABLED` console command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeOutcome {
    /// The resource reached the requested state.
    Changed,
    /// The command ran but the state did not change.
    Unchanged,
    /// The resource is not installed in the region.
    NotFound,
}

/// Classify CEMT SET output.
pub fn classify_state_change(stdout: &str) -> Option<StateChangeOutcome> {
    PatternSet::new(&[
        ("not found", StateChangeOutcome::NotFound),
        ("response: normal", StateChangeOutcome::Changed),
        ("not disabled|not enabled|error", StateChangeOutcome::Unchanged),
    ])
    .classify_or_warn(stdout, "set-state")
}

/// Outcome of `cics refresh program` (NEWCOPY).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Program refreshed (NEWCOPY took effect).
    Refreshed,
    /// Program is not installed.
    NotFound,
    /// Anything else; the refresh did not happen.
    Failed,
}

/// Classify refresh output. Unlike the other classifiers the fallback
/// here is a defined outcome: anything unrecognized is a failed refresh.
pub fn classify_refresh(stdout: &str) -> RefreshOutcome {
    PatternSet::new(&[
        (
            r"Progtype\(Program\)[\s\S]*Status\([\s\S]*NORMAL",
            RefreshOutcome::Refreshed,
        ),
        ("not found", RefreshOutcome::NotFound),
    ])
    .classify(stdout)
    .unwrap_or(RefreshOutcome::Failed)
}

/// Highest return code reported by DFHCSDUP.
///
/// 0 is success, 4 is success with warnings, anything above 4 is
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CsdReturnCode(pub i64);

impl CsdReturnCode {
    /// The warning threshold; codes above it are failures.
    pub const WARNING_LIMIT: i64 = 4;

    /// Whether this code is above the warning threshold.
    pub fn failed(&self) -> bool {
        self.0 > Self::WARNING_LIMIT
    }
}

/// Extract the highest return code from DFHCSDUP output.
pub fn parse_csd_return_code(stdout: &str) -> Option<CsdReturnCode> {
    parse_marked_integer(stdout, "HIGHEST RETURN CODE WAS:").map(CsdReturnCode)
}

/// Whether query output indicates the CICS region itself is down.
pub fn region_inactive(stdout: &str) -> bool {
    // IEE341I <name> NOT ACTIVE comes back from the MVS console when
    // the region job is not running.
    stdout.to_uppercase().contains("IEE341I")
}

/// Whether query output indicates the resource is present. The query
/// subcommands answer "... NOT FOUND" for absent resources and print a
/// record otherwise.
pub fn query_found(stdout: &str) -> bool {
    PatternSet::new(&[("not found", ())])
        .classify(stdout)
        .is_none()
}
