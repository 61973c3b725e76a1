//! One-time region configuration and teardown.
//!
//! The DB2 and MQ connections and the MQ bridge facility are region
//! infrastructure: configured once after provisioning, not per deploy.

use super::TaskContext;
use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;
use zpipe_cics::{
    CicsClient, InstallOutcome, Reconciler, ResourceDescriptor, ResourceType, SqlRunner,
};

/// Which configuration steps to run.
pub struct CicsTask {
    pub config_db2: bool,
    pub config_mq: bool,
    pub config_bridge: bool,
    pub start_bridge: bool,
    pub delete: bool,
    pub sql_file: Option<PathBuf>,
}

impl CicsTask {
    fn nothing_selected(&self) -> bool {
        !(self.config_db2
            || self.config_mq
            || self.config_bridge
            || self.start_bridge
            || self.delete)
    }
}

pub async fn run(ctx: &TaskContext, mut task: CicsTask) -> Result<()> {
    // Bare `zpipe cics` configures everything.
    if task.nothing_selected() {
        task.config_db2 = true;
        task.config_mq = true;
        task.config_bridge = true;
        task.start_bridge = true;
    }

    let client = ctx.cics_client().await?;

    if task.config_db2 {
        config_db2(ctx, &client, task.sql_file.as_deref()).await?;
    }
    if task.config_mq {
        config_mq(ctx, &client).await?;
    }
    if task.config_bridge {
        config_bridge(ctx, &client).await?;
    }
    if task.start_bridge {
        client
            .issue_modify(&ctx.config.cics.bridge_transaction, "bridge monitor")
            .await?;
        info!(
            transaction = %ctx.config.cics.bridge_transaction,
            "bridge monitor started"
        );
    }
    if task.delete {
        teardown(ctx, &client).await?;
    }

    Ok(())
}

async fn install_connection(
    client: &CicsClient,
    res: &ResourceDescriptor,
) -> Result<()> {
    match client.install(res).await? {
        InstallOutcome::Installed | InstallOutcome::AlreadyInstalled => Ok(()),
        outcome => bail!("install of {res} did not succeed: {outcome:?}"),
    }
}

async fn config_db2(
    ctx: &TaskContext,
    client: &CicsClient,
    sql_file: Option<&std::path::Path>,
) -> Result<()> {
    let config = &ctx.config.cics;
    let res = ResourceDescriptor::new(ResourceType::Db2Conn, &config.db2conn_name, &config.group);

    client
        .define(
            &res,
            &[
                format!("DB2ID({})", ctx.config.db2.region),
                format!("PLAN({})", config.cobol.plan),
            ],
        )
        .await?;
    install_connection(client, &res).await?;
    client.set_connection(ResourceType::Db2Conn, true).await?;
    info!(db2conn = %config.db2conn_name, "DB2 connection ready");

    if let Some(file) = sql_file {
        SqlRunner::new(ctx.runner.clone(), ctx.profiles.db2())
            .execute_file(file)
            .await?;
    }
    Ok(())
}

async fn config_mq(ctx: &TaskContext, client: &CicsClient) -> Result<()> {
    let config = &ctx.config.cics;
    let res = ResourceDescriptor::new(ResourceType::MqConn, &config.mqconn_name, &config.group);

    client
        .define(
            &res,
            &[
                format!("MQNAME({})", config.mq_name),
                format!("INITQNAME({})", config.initq_name),
            ],
        )
        .await?;
    install_connection(client, &res).await?;
    client.set_connection(ResourceType::MqConn, true).await?;
    info!(mqconn = %config.mqconn_name, "MQ connection ready");
    Ok(())
}

/// The bridge facility file ships as a vendor definition; it is copied
/// into our group, pointed at the right data set, then reconciled like
/// any other resource.
async fn config_bridge(ctx: &TaskContext, client: &CicsClient) -> Result<()> {
    let config = &ctx.config.cics;
    let file = ResourceDescriptor::new(ResourceType::File, &config.bridge_file_name, &config.group);

    client.copy(&file, &config.bridge_file_group).await?;
    client
        .alter_file_dsname(
            &file,
            &format!("{}.{}", config.bridge_file_hlq, config.bridge_file_name),
        )
        .await?;
    Reconciler::new(client).prepare(&file, &[]).await?;
    info!(file = %config.bridge_file_name, "bridge facility ready");
    Ok(())
}

/// Remove the application resources in reverse dependency order.
async fn teardown(ctx: &TaskContext, client: &CicsClient) -> Result<()> {
    let java = &ctx.config.java;
    let group = &ctx.config.cics.group;
    let reconciler = Reconciler::new(client);

    let resources = [
        ResourceDescriptor::new(ResourceType::Transaction, &java.transaction_name, group),
        ResourceDescriptor::new(ResourceType::Program, &java.program_name, group),
        ResourceDescriptor::new(ResourceType::Bundle, &java.bundle_name, group),
        ResourceDescriptor::new(ResourceType::JvmServer, &java.jvm_server, group),
        ResourceDescriptor::new(
            ResourceType::File,
            &ctx.config.cics.bridge_file_name,
            group,
        ),
    ];

    for res in &resources {
        reconciler.remove(res).await?;
    }

    client.discard_connection(ResourceType::MqConn).await?;
    client.discard_connection(ResourceType::Db2Conn).await?;
    info!("application resources removed");
    Ok(())
}
