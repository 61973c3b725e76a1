//! Web application server delivery.
//!
//! The WAR and its server configuration go to the provisioned server
//! instance's user directory. The instance is stopped for the copy and
//! started again afterwards, so the server never serves a half-written
//! archive.

use super::TaskContext;
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;
use zpipe_core::shell::run_gradle;
use zpipe_transfer::{upload_batch, FtpStore, TransferError, TransferItem};

pub async fn run(
    ctx: &TaskContext,
    build_only: bool,
    no_build: bool,
    config_file: Option<String>,
) -> Result<()> {
    let server = &ctx.config.server;
    let webserver_dir = &ctx.config.paths.webserver_dir;

    if !no_build {
        let rc = run_gradle(Path::new(webserver_dir), &["war"])
            .await
            .context("building the WAR")?;
        if rc != 0 {
            bail!("gradle war build failed with exit code {rc}");
        }
    }

    if build_only {
        return Ok(());
    }

    let provisioner = ctx.provisioner();
    let variables = provisioner
        .query()
        .instance_variables(&server.instance_name)
        .await
        .context("reading server instance variables")?;

    let user_dir = variables
        .get("WLP_USER_DIR")
        .with_context(|| format!("{} publishes no WLP_USER_DIR", server.instance_name))?;
    let job_name = variables
        .get("JOB_NAME")
        .with_context(|| format!("{} publishes no JOB_NAME", server.instance_name))?;
    let server_dir = format!("{}/servers/{}", user_dir.trim_end_matches('/'), job_name);

    let config_stem = config_file.unwrap_or_else(|| server.config_file.clone());
    let items = vec![
        TransferItem::new(
            &server.war_source,
            format!("{server_dir}/{}", server.war_destination),
        ),
        TransferItem::new(
            format!("{webserver_dir}/{config_stem}.xml"),
            format!("{server_dir}/{}", server.config_destination),
        ),
    ];

    provisioner
        .query()
        .perform_action(&server.instance_name, "stop")
        .await?;

    let system = ctx.config.system.clone();
    tokio::task::spawn_blocking(move || -> Result<usize, TransferError> {
        let mut store = FtpStore::connect(&system.host, &system.user, &system.pass)?;
        let count = upload_batch(&mut store, &items)?;
        store.disconnect();
        Ok(count)
    })
    .await??;

    provisioner
        .query()
        .perform_action(&server.instance_name, "start")
        .await?;

    info!(instance = %server.instance_name, dir = %server_dir, "server deployed");
    Ok(())
}
