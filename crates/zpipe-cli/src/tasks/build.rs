//! Aggregate build and test stages.

use super::{cobol, java, TaskContext};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;
use zpipe_core::shell::{run_gradle, run_npm};

/// Full delivery: COBOL first (the Java transaction calls into it),
/// then the Java application.
pub async fn run(ctx: &TaskContext) -> Result<()> {
    cobol::run(ctx, true, true, true, true).await?;
    java::run(ctx, true, true, true, true).await?;
    info!("full build complete");
    Ok(())
}

/// Run the local test suites.
pub async fn test(ctx: &TaskContext, unit: bool, integration: bool) -> Result<()> {
    if unit {
        let rc = run_gradle(Path::new(&ctx.config.java.location), &["test"])
            .await
            .context("running the Java unit tests")?;
        if rc != 0 {
            bail!("unit tests failed with exit code {rc}");
        }
    }

    if integration {
        let rc = run_npm(Path::new(&ctx.config.paths.webserver_dir), &["test"])
            .await
            .context("running the integration tests")?;
        if rc != 0 {
            bail!("integration tests failed with exit code {rc}");
        }
    }

    Ok(())
}
