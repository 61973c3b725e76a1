//! Environment checks and recorded state.

use super::TaskContext;
use anyhow::Result;
use tracing::info;
use zpipe_core::GeneratedProperties;

/// Report what the pipeline would target. The CLI binary itself was
/// already checked at startup.
pub async fn run(ctx: &TaskContext) -> Result<()> {
    let region = ctx.resolve_region().await?;

    info!(host = %ctx.config.system.host, "target host");
    info!(region = %region.applid, loadlib = %region.loadlib, "target region");
    info!(
        zosmf = %ctx.profiles.zosmf(),
        cics = %ctx.profiles.cics(),
        db2 = %ctx.profiles.db2(),
        endevor = %ctx.profiles.endevor(),
        "CLI profiles"
    );
    Ok(())
}

/// Print the resolved pipeline facts: derived profile names, static
/// region, and the recorded provisioned instances.
pub fn properties(ctx: &TaskContext) -> Result<()> {
    println!("host:            {}", ctx.config.system.host);
    println!("static region:   {}", ctx.config.cics.region);
    println!("zosmf profile:   {}", ctx.profiles.zosmf());
    println!("cics profile:    {}", ctx.profiles.cics());
    println!("db2 profile:     {}", ctx.profiles.db2());
    println!("endevor profile: {}", ctx.profiles.endevor());

    match GeneratedProperties::load(&ctx.genprops_path())? {
        Some(props) => println!("{}", serde_json::to_string_pretty(&props)?),
        None => println!("no provisioned instances recorded"),
    }
    Ok(())
}
