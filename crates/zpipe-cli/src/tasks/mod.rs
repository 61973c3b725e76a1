//! Pipeline tasks.
//!
//! Each submodule is one stage of the delivery pipeline. They share a
//! [`TaskContext`] holding the loaded configuration and the CLI runner;
//! everything else is constructed per task.

pub mod build;
pub mod cics;
pub mod cobol;
pub mod endevor;
pub mod java;
pub mod provision;
pub mod server;
pub mod verify;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zpipe_cics::CicsClient;
use zpipe_core::{CommandRunner, Config, GeneratedProperties, JobSubmitter, ProfileNames};
use zpipe_provision::Provisioner;

/// Shared state for every pipeline task.
pub struct TaskContext {
    /// Loaded pipeline configuration.
    pub config: Config,
    /// Runner for the external CLI.
    pub runner: Arc<dyn CommandRunner>,
    /// Derived CLI profile names.
    pub profiles: ProfileNames,
}

/// The CICS region a task should talk to, resolved from the generated
/// properties when a region was provisioned.
#[derive(Debug, Clone)]
pub struct RegionTarget {
    /// Region APPLID (also the started task name).
    pub applid: String,
    /// Load library receiving compiled programs.
    pub loadlib: String,
}

impl TaskContext {
    /// Build the context from a loaded configuration.
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        let profiles = config.profiles();
        Self {
            config,
            runner,
            profiles,
        }
    }

    /// Path of the generated properties file.
    pub fn genprops_path(&self) -> PathBuf {
        PathBuf::from(&self.config.paths.generated_properties)
    }

    /// A provisioner with the configured poll budget.
    pub fn provisioner(&self) -> Provisioner {
        Provisioner::new(
            self.runner.clone(),
            self.profiles.zosmf(),
            Duration::from_secs(self.config.provisioning.poll_interval_secs),
            self.config.provisioning.max_poll_attempts,
        )
    }

    /// A job submitter on the z/OSMF profile.
    pub fn job_submitter(&self) -> JobSubmitter {
        JobSubmitter::new(self.runner.clone(), self.profiles.zosmf())
    }

    /// Resolve the target region: the provisioned instance when one is
    /// recorded, the static configuration otherwise.
    pub async fn resolve_region(&self) -> Result<RegionTarget> {
        let id = &self.config.provisioning.instance_id;

        if let Some(props) = GeneratedProperties::load(&self.genprops_path())? {
            if let Some(record) = props.instance(id) {
                debug!(instance = %record.name, "using provisioned region");
                let variables = self
                    .provisioner()
                    .query()
                    .instance_variables(&record.name)
                    .await
                    .context("reading provisioned region variables")?;
                let loadlib = variables
                    .get("DFH_REGION_RPL")
                    .cloned()
                    .unwrap_or_else(|| self.config.cics.loadlib.clone());

                return Ok(RegionTarget {
                    applid: record.name.clone(),
                    loadlib,
                });
            }
        }

        Ok(RegionTarget {
            applid: self.config.cics.region.clone(),
            loadlib: self.config.cics.loadlib.clone(),
        })
    }

    /// A CICS client bound to the resolved region.
    pub async fn cics_client(&self) -> Result<CicsClient> {
        let region = self.resolve_region().await?;
        let mut cics = self.config.cics.clone();
        cics.region = region.applid;
        Ok(CicsClient::new(
            self.runner.clone(),
            &cics,
            self.profiles.cics(),
        ))
    }

    /// Directory holding the JCL templates.
    pub fn jcl_dir(&self) -> &Path {
        Path::new(&self.config.paths.jcl_dir)
    }
}
