//! CLI profile management for provisioned regions.
//!
//! A freshly provisioned region needs a CICS profile pointing at its
//! CMCI port before any resource command can reach it. Profile creation
//! flakes while the region is still settling, so it gets a small
//! bounded retry.

use crate::error::ProvisionError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use zpipe_core::{CommandRunner, OutputFormat};

const CREATE_ATTEMPTS: u32 = 5;

/// Connection facts for a region's CMCI endpoint.
#[derive(Debug, Clone)]
pub struct CmciTarget {
    /// Host name.
    pub host: String,
    /// CMCI port.
    pub port: String,
    /// TSO user id.
    pub user: String,
    /// Password.
    pub pass: String,
    /// Region APPLID.
    pub applid: String,
}

impl CmciTarget {
    /// Build a target from instance variables, taking the APPLID and
    /// CMCI port the template publishes.
    pub fn from_variables(
        variables: &BTreeMap<String, String>,
        host: &str,
        user: &str,
        pass: &str,
    ) -> Result<Self, ProvisionError> {
        let applid = variables
            .get("DFH_REGION_APPLID")
            .ok_or_else(|| ProvisionError::MissingData {
                operation: "instance-variables".to_string(),
                detail: "no DFH_REGION_APPLID variable".to_string(),
            })?;
        let port = variables
            .get("DFH_CMCI_PORT")
            .ok_or_else(|| ProvisionError::MissingData {
                operation: "instance-variables".to_string(),
                detail: "no DFH_CMCI_PORT variable".to_string(),
            })?;

        Ok(Self {
            host: host.to_string(),
            port: port.clone(),
            user: user.to_string(),
            pass: pass.to_string(),
            applid: applid.clone(),
        })
    }
}

/// Create (or overwrite) the CICS profile for a provisioned region.
pub async fn ensure_cics_profile(
    runner: &Arc<dyn CommandRunner>,
    profile_name: &str,
    target: &CmciTarget,
) -> Result<(), ProvisionError> {
    let args = vec![
        "profiles".to_string(),
        "create".to_string(),
        "cics-profile".to_string(),
        profile_name.to_string(),
        "--host".to_string(),
        target.host.clone(),
        "--port".to_string(),
        target.port.clone(),
        "--user".to_string(),
        target.user.clone(),
        "--password".to_string(),
        target.pass.clone(),
        "--region-name".to_string(),
        target.applid.clone(),
        "--overwrite".to_string(),
    ];

    for attempt in 1..=CREATE_ATTEMPTS {
        let result = runner.run(&args, OutputFormat::Json, None).await?;
        if result.is_clean() {
            info!(profile = profile_name, applid = %target.applid, "CICS profile ready");
            return Ok(());
        }

        warn!(
            profile = profile_name,
            attempt,
            stderr = %result.stderr.trim(),
            "profile creation failed"
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    Err(ProvisionError::ProfileCreateFailed {
        profile: profile_name.to_string(),
        attempts: CREATE_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpipe_core::fakes::ScriptedRunner;

    fn variables() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("DFH_REGION_APPLID".to_string(), "CICSAA01".to_string()),
            ("DFH_CMCI_PORT".to_string(), "1490".to_string()),
        ])
    }

    #[test]
    fn test_target_from_variables() {
        let target =
            CmciTarget::from_variables(&variables(), "mf.example.com", "ibmuser", "secret")
                .unwrap();
        assert_eq!(target.applid, "CICSAA01");
        assert_eq!(target.port, "1490");
    }

    #[test]
    fn test_target_requires_applid() {
        let mut vars = variables();
        vars.remove("DFH_REGION_APPLID");
        let err = CmciTarget::from_variables(&vars, "h", "u", "p").unwrap_err();
        assert!(matches!(err, ProvisionError::MissingData { .. }));
    }

    #[tokio::test]
    async fn test_profile_create_retries_then_succeeds() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_text_failure("", "CMCI not listening yet");
        runner.push_text_ok("Profile created successfully");

        let target =
            CmciTarget::from_variables(&variables(), "mf.example.com", "ibmuser", "secret")
                .unwrap();
        let dyn_runner: Arc<dyn CommandRunner> = runner.clone();
        ensure_cics_profile(&dyn_runner, "mainframe-cics", &target)
            .await
            .unwrap();

        assert_eq!(runner.call_count(), 2);
        let call = &runner.calls()[0];
        assert_eq!(call[..3], ["profiles", "create", "cics-profile"]);
        assert!(call.contains(&"--overwrite".to_string()));
    }
}
