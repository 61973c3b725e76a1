//! Java OSGi delivery.
//!
//! The bundle is built locally with gradle, shipped to zFS over FTP,
//! and its CICS resources (JVMSERVER, BUNDLE, PROGRAM, TRANSACTION)
//! reconciled into the region. Refreshing a live bundle means cycling
//! it: disable, discard, reinstall, enable.

use super::TaskContext;
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;
use zpipe_cics::{
    CicsClient, DiscardOutcome, InstallOutcome, Reconciler, ResourceDescriptor, ResourceState,
    ResourceType, StateChangeOutcome,
};
use zpipe_core::shell::run_gradle;
use zpipe_transfer::{directory_items, upload_batch, FtpStore, TransferError};

pub async fn run(
    ctx: &TaskContext,
    compile: bool,
    deploy: bool,
    define: bool,
    refresh: bool,
) -> Result<()> {
    if compile {
        let location = Path::new(&ctx.config.java.location);
        let rc = run_gradle(location, &["build"])
            .await
            .context("running the gradle build")?;
        if rc != 0 {
            bail!("gradle build failed with exit code {rc}");
        }
    }

    if deploy {
        upload_bundle(ctx).await?;
    }

    if define {
        let client = ctx.cics_client().await?;
        reconcile_resources(ctx, &client).await?;
    }

    if refresh {
        let client = ctx.cics_client().await?;
        refresh_bundle(ctx, &client).await?;
    }

    Ok(())
}

/// Ship the built bundle directory to its versioned zFS location.
async fn upload_bundle(ctx: &TaskContext) -> Result<()> {
    let local = Path::new(&ctx.config.java.location).join("build/libs");
    let remote = ctx.config.java.deployed_bundle_dir();
    let items = directory_items(&local, &remote)?;
    if items.is_empty() {
        bail!("no build output under {}; run the compile step first", local.display());
    }

    let system = ctx.config.system.clone();
    let count = tokio::task::spawn_blocking(move || -> Result<usize, TransferError> {
        let mut store = FtpStore::connect(&system.host, &system.user, &system.pass)?;
        let count = upload_batch(&mut store, &items)?;
        store.disconnect();
        Ok(count)
    })
    .await??;

    info!(count, %remote, "bundle uploaded");
    Ok(())
}

/// Reconcile the four resources backing the Java application, in
/// dependency order.
async fn reconcile_resources(ctx: &TaskContext, client: &CicsClient) -> Result<()> {
    let java = &ctx.config.java;
    let group = &ctx.config.cics.group;

    let jvmserver = ResourceDescriptor::new(ResourceType::JvmServer, &java.jvm_server, group);
    Reconciler::new(client)
        .prepare(&jvmserver, &[format!("JVMPROFILE({})", java.jvm_profile)])
        .await?;

    let bundle = ResourceDescriptor::new(ResourceType::Bundle, &java.bundle_name, group);
    let bundledir = ctx.config.java.deployed_bundle_dir();
    Reconciler::new(client)
        .with_modify_install()
        .prepare(
            &bundle,
            &[format!("BUNDLEDIR({})", bundledir.trim_end_matches('/'))],
        )
        .await?;

    let program = ResourceDescriptor::new(ResourceType::Program, &java.program_name, group);
    Reconciler::new(client)
        .prepare(
            &program,
            &[
                "JVM(YES)".to_string(),
                format!("JVMCLASS({})", java.program_class),
                format!("JVMSERVER({})", java.jvm_server),
            ],
        )
        .await?;

    let transaction =
        ResourceDescriptor::new(ResourceType::Transaction, &java.transaction_name, group);
    Reconciler::new(client)
        .prepare(&transaction, &[format!("PROGRAM({})", java.program_name)])
        .await?;

    Ok(())
}

/// Cycle an installed bundle so the region picks up freshly uploaded
/// parts.
async fn refresh_bundle(ctx: &TaskContext, client: &CicsClient) -> Result<()> {
    let java = &ctx.config.java;
    let bundle =
        ResourceDescriptor::new(ResourceType::Bundle, &java.bundle_name, &ctx.config.cics.group);

    match client.set_state(&bundle, ResourceState::Disabled).await? {
        StateChangeOutcome::NotFound => {
            info!(bundle = %java.bundle_name, "bundle not installed, installing fresh");
        }
        StateChangeOutcome::Changed | StateChangeOutcome::Unchanged => {
            match client.discard(&bundle).await? {
                DiscardOutcome::Discarded | DiscardOutcome::NotFound => {}
                DiscardOutcome::NotDisabled => {
                    bail!("bundle {} would not disable for refresh", java.bundle_name)
                }
            }
        }
    }

    match client.install_via_modify(&bundle).await? {
        InstallOutcome::Installed | InstallOutcome::AlreadyInstalled => {}
        outcome => bail!("bundle reinstall did not succeed: {outcome:?}"),
    }

    match client.set_state(&bundle, ResourceState::Enabled).await? {
        StateChangeOutcome::Changed => {
            info!(bundle = %java.bundle_name, "bundle refreshed");
            Ok(())
        }
        _ => bail!("bundle {} did not re-enable after refresh", java.bundle_name),
    }
}
