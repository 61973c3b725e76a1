//! Region provisioning and deprovisioning.

use super::TaskContext;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use zpipe_core::{GeneratedProperties, InstanceRecord};
use zpipe_provision::{ensure_cics_profile, CmciTarget};

/// Provision a region, make sure its job runs, record it and point the
/// CICS profile at it.
pub async fn provision(
    ctx: &TaskContext,
    id: Option<String>,
    template: Option<String>,
    properties: Option<PathBuf>,
) -> Result<()> {
    let id = id.unwrap_or_else(|| ctx.config.provisioning.instance_id.clone());
    let template = template.unwrap_or_else(|| ctx.config.provisioning.template.clone());
    let properties = properties.unwrap_or_else(|| ctx.genprops_path());
    let provisioner = ctx.provisioner();

    let instance = provisioner.provision(&template).await?;

    // The region job name is published by the template; fall back to
    // the instance name, which is the APPLID for CICS templates.
    let job_name = instance
        .variables
        .get("DFH_REGION_APPLID")
        .or_else(|| instance.variables.get("JOB_NAME"))
        .cloned()
        .unwrap_or_else(|| instance.name.clone());
    provisioner
        .ensure_job_started(&instance.name, &job_name)
        .await?;

    GeneratedProperties::record_instance(
        &properties,
        &id,
        InstanceRecord {
            name: instance.name.clone(),
            template: template.clone(),
            object_id: instance.object_id.clone(),
        },
    )
    .context("recording the provisioned instance")?;

    let system = &ctx.config.system;
    let target =
        CmciTarget::from_variables(&instance.variables, &system.host, &system.user, &system.pass)?;
    ensure_cics_profile(&ctx.runner, &ctx.profiles.cics(), &target).await?;

    info!(instance = %instance.name, %template, %id, "region ready");
    Ok(())
}

/// Deprovision the recorded region (or an explicitly named instance).
pub async fn deprovision(
    ctx: &TaskContext,
    id: Option<String>,
    instance: Option<String>,
) -> Result<()> {
    let name = match instance {
        Some(name) => name,
        None => {
            let id = id.unwrap_or_else(|| ctx.config.provisioning.instance_id.clone());
            GeneratedProperties::load(&ctx.genprops_path())?
                .and_then(|props| props.instance(&id).map(|record| record.name.clone()))
                .with_context(|| format!("no instance recorded under id {id}"))?
        }
    };

    ctx.provisioner().deprovision(&name).await?;
    info!(instance = %name, "region deprovisioned");
    Ok(())
}
