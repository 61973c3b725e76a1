//! CICS resource operations.
//!
//! One method per CLI subcommand. Every method issues exactly one CLI
//! invocation, checks the envelope, and hands the screen output to the
//! matching classifier in [`crate::outcome`].

use crate::error::CicsError;
use crate::outcome::{
    classify_discard, classify_install, classify_refresh, classify_state_change,
    parse_csd_return_code, query_found, region_inactive, CsdReturnCode, DiscardOutcome,
    InstallOutcome, RefreshOutcome, StateChangeOutcome,
};
use crate::resource::{ResourceDescriptor, ResourceState, ResourceType};
use std::sync::Arc;
use tracing::{debug, info};
use zpipe_core::config::CicsConfig;
use zpipe_core::{CommandResult, CommandRunner, OutputFormat};

/// Client for CICS resource operations against one region.
pub struct CicsClient {
    runner: Arc<dyn CommandRunner>,
    region: String,
    csd: String,
    cics_profile: String,
}

impl CicsClient {
    /// Create a client for the configured region.
    pub fn new(runner: Arc<dyn CommandRunner>, config: &CicsConfig, cics_profile: String) -> Self {
        Self {
            runner,
            region: config.region.clone(),
            csd: config.csd.clone(),
            cics_profile,
        }
    }

    /// Region this client targets.
    pub fn region(&self) -> &str {
        &self.region
    }

    async fn issue(&self, args: Vec<String>) -> Result<CommandResult, CicsError> {
        Ok(self.runner.run(&args, OutputFormat::Json, None).await?)
    }

    fn ensure_clean(
        result: CommandResult,
        operation: &str,
        resource: &ResourceDescriptor,
    ) -> Result<CommandResult, CicsError> {
        if result.is_clean() {
            Ok(result)
        } else {
            Err(CicsError::CommandFailed {
                operation: operation.to_string(),
                resource: resource.to_string(),
                stderr: if result.stderr.trim().is_empty() {
                    result.stdout
                } else {
                    result.stderr
                },
            })
        }
    }

    fn ensure_region_active(stdout: &str) -> Result<(), CicsError> {
        if region_inactive(stdout) {
            Err(CicsError::RegionInactive {
                stdout: stdout.to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn query(
        &self,
        res: &ResourceDescriptor,
        status_only: bool,
    ) -> Result<String, CicsError> {
        let (table, key) = res.rtype.query_table();
        let mut args = vec![
            "cics".to_string(),
            "get".to_string(),
            "resource".to_string(),
            table.to_string(),
            "-c".to_string(),
            format!("{}={}", key, res.name),
            "--rft".to_string(),
            "string".to_string(),
        ];
        if status_only {
            args.push("--rff".to_string());
            args.push("status".to_string());
        }
        args.push("--region-name".to_string());
        args.push(self.region.clone());

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "query", res)?;
        Self::ensure_region_active(&result.stdout)?;
        Ok(result.stdout)
    }

    /// Whether the resource is present and usable in the region.
    pub async fn is_enabled(&self, res: &ResourceDescriptor) -> Result<bool, CicsError> {
        let stdout = self.query(res, false).await?;
        Ok(query_found(&stdout))
    }

    /// Whether the resource is installed in the region.
    pub async fn is_installed(&self, res: &ResourceDescriptor) -> Result<bool, CicsError> {
        let stdout = self.query(res, true).await?;
        Ok(query_found(&stdout))
    }

    /// Drive the resource toward enabled/disabled via a CEMT SET console
    /// command and classify the response.
    pub async fn set_state(
        &self,
        res: &ResourceDescriptor,
        state: ResourceState,
    ) -> Result<StateChangeOutcome, CicsError> {
        let command = format!(
            "MODIFY {},CEMT SET {}({}) {}",
            self.region,
            res.rtype.csd_name(),
            res.name.to_uppercase(),
            state.cemt_keyword()
        );
        let args = vec![
            "console".to_string(),
            "issue".to_string(),
            "cmd".to_string(),
            command,
        ];

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "set-state", res)?;

        classify_state_change(&result.stdout).ok_or_else(|| CicsError::UnclassifiedResponse {
            operation: "set-state".to_string(),
            resource: res.to_string(),
            stdout: result.stdout,
        })
    }

    /// Install a resource from its CSD definition.
    pub async fn install(&self, res: &ResourceDescriptor) -> Result<InstallOutcome, CicsError> {
        let args = vec![
            "cics".to_string(),
            "install".to_string(),
            res.rtype.cli_name().to_string(),
            res.name.clone(),
            self.csd.clone(),
            "--region-name".to_string(),
            self.region.clone(),
        ];

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "install", res)?;

        classify_install(&result.stdout).ok_or_else(|| CicsError::UnclassifiedResponse {
            operation: "install".to_string(),
            resource: res.to_string(),
            stdout: result.stdout,
        })
    }

    /// Install through a CEDA INSTALL modify command. Some resource
    /// kinds (bundles) only install reliably this way.
    pub async fn install_via_modify(
        &self,
        res: &ResourceDescriptor,
    ) -> Result<InstallOutcome, CicsError> {
        let command = format!(
            "CEDA INSTALL {}({}) GROUP({})",
            res.rtype.csd_name(),
            res.name.to_uppercase(),
            res.group
        );
        let args = vec![
            "cics".to_string(),
            "issue".to_string(),
            "modify".to_string(),
            command,
            "--cics-p".to_string(),
            self.cics_profile.clone(),
        ];

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "install", res)?;

        classify_install(&result.stdout).ok_or_else(|| CicsError::UnclassifiedResponse {
            operation: "install".to_string(),
            resource: res.to_string(),
            stdout: result.stdout,
        })
    }

    /// Discard an installed resource from the region.
    pub async fn discard(&self, res: &ResourceDescriptor) -> Result<DiscardOutcome, CicsError> {
        let args = vec![
            "cics".to_string(),
            "discard".to_string(),
            res.rtype.cli_name().to_string(),
            res.name.clone(),
            "--region-name".to_string(),
            self.region.clone(),
        ];

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "discard", res)?;

        classify_discard(&result.stdout).ok_or_else(|| CicsError::UnclassifiedResponse {
            operation: "discard".to_string(),
            resource: res.to_string(),
            stdout: result.stdout,
        })
    }

    /// Submit a raw DFHCSDUP statement and return the highest return
    /// code it reports.
    pub async fn submit_dfhcsdup(
        &self,
        statement: &str,
        res: &ResourceDescriptor,
    ) -> Result<CsdReturnCode, CicsError> {
        debug!(%statement, "submitting DFHCSDUP statement");

        let args = vec![
            "cics".to_string(),
            "submit".to_string(),
            "dfhcsdup".to_string(),
            "--statement".to_string(),
            statement.to_string(),
            "--cics-p".to_string(),
            self.cics_profile.clone(),
        ];

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "dfhcsdup", res)?;

        let rc = parse_csd_return_code(&result.stdout).ok_or_else(|| {
            CicsError::UnclassifiedResponse {
                operation: "dfhcsdup".to_string(),
                resource: res.to_string(),
                stdout: result.stdout.clone(),
            }
        })?;

        if rc.failed() {
            return Err(CicsError::CsdFailed {
                resource: res.to_string(),
                rc: rc.0,
                stdout: result.stdout,
            });
        }
        Ok(rc)
    }

    /// Define a resource in the CSD, with optional extra attribute
    /// parameters such as `JVMPROFILE(...)`.
    pub async fn define(
        &self,
        res: &ResourceDescriptor,
        parms: &[String],
    ) -> Result<CsdReturnCode, CicsError> {
        let mut statement = format!(
            "DEFINE {}({}) GROUP({})",
            res.rtype.csd_name(),
            res.name.to_uppercase(),
            res.group
        );
        if !parms.is_empty() {
            statement.push(' ');
            statement.push_str(&parms.join(" "));
        }

        self.submit_dfhcsdup(&statement, res).await
    }

    /// Delete a resource definition from the CSD.
    pub async fn delete(&self, res: &ResourceDescriptor) -> Result<CsdReturnCode, CicsError> {
        let statement = format!(
            "DELETE {}({}) GROUP({})",
            res.rtype.csd_name(),
            res.name.to_uppercase(),
            res.group
        );
        self.submit_dfhcsdup(&statement, res).await
    }

    /// Refresh a rebuilt program (NEWCOPY).
    pub async fn refresh_program(&self, name: &str) -> Result<RefreshOutcome, CicsError> {
        let res = ResourceDescriptor::new(ResourceType::Program, name, "");
        let args = vec![
            "cics".to_string(),
            "refresh".to_string(),
            "program".to_string(),
            name.to_string(),
            "--region-name".to_string(),
            self.region.clone(),
        ];

        let result = self.issue(args).await?;
        let result = Self::ensure_clean(result, "refresh", &res)?;
        Ok(classify_refresh(&result.stdout))
    }

    /// Connect or disconnect a DB2CONN/MQCONN resource.
    pub async fn set_connection(
        &self,
        rtype: ResourceType,
        connected: bool,
    ) -> Result<(), CicsError> {
        let keyword = if connected { "CONNECTED" } else { "NOTCONNECTED" };
        let command = format!("CEMT SET {} {}", rtype.csd_name(), keyword);
        let res = ResourceDescriptor::new(rtype, rtype.csd_name(), "");

        info!(resource = %rtype, %keyword, "changing connection state");
        let result = self
            .issue(vec![
                "cics".to_string(),
                "issue".to_string(),
                "modify".to_string(),
                command,
                "--cics-p".to_string(),
                self.cics_profile.clone(),
            ])
            .await?;
        Self::ensure_clean(result, "set-connection", &res)?;
        Ok(())
    }

    /// Discard an installed connection resource via CEMT.
    pub async fn discard_connection(&self, rtype: ResourceType) -> Result<(), CicsError> {
        let command = format!("CEMT DISCARD {}", rtype.csd_name());
        let res = ResourceDescriptor::new(rtype, rtype.csd_name(), "");

        let result = self
            .issue(vec![
                "cics".to_string(),
                "issue".to_string(),
                "modify".to_string(),
                command,
                "--cics-p".to_string(),
                self.cics_profile.clone(),
            ])
            .await?;
        Self::ensure_clean(result, "discard-connection", &res)?;
        Ok(())
    }

    /// Copy a resource definition between CSD groups.
    pub async fn copy(
        &self,
        res: &ResourceDescriptor,
        from_group: &str,
    ) -> Result<(), CicsError> {
        let result = self
            .issue(vec![
                "cics".to_string(),
                "copy".to_string(),
                res.rtype.cli_name().to_string(),
                res.name.clone(),
                "--group".to_string(),
                from_group.to_string(),
                "--to".to_string(),
                res.group.clone(),
            ])
            .await?;
        Self::ensure_clean(result, "copy", res)?;
        Ok(())
    }

    /// Point a FILE definition at a data set.
    pub async fn alter_file_dsname(
        &self,
        res: &ResourceDescriptor,
        dsname: &str,
    ) -> Result<(), CicsError> {
        let result = self
            .issue(vec![
                "cics".to_string(),
                "alter".to_string(),
                "file".to_string(),
                res.name.clone(),
                "--dsname".to_string(),
                dsname.to_string(),
            ])
            .await?;
        Self::ensure_clean(result, "alter", res)?;
        Ok(())
    }

    /// Issue an arbitrary modify command (e.g. starting the bridge
    /// monitor transaction).
    pub async fn issue_modify(&self, command: &str, description: &str) -> Result<(), CicsError> {
        let res = ResourceDescriptor::new(ResourceType::Transaction, description, "");
        let result = self
            .issue(vec![
                "cics".to_string(),
                "issue".to_string(),
                "modify".to_string(),
                command.to_string(),
                "--cics-p".to_string(),
                self.cics_profile.clone(),
            ])
            .await?;
        Self::ensure_clean(result, "modify", &res)?;
        Ok(())
    }
}
