//! COBOL delivery.
//!
//! Source goes into Endevor, gets generated there, and the resulting
//! load module is copied into the region's load library and bound to
//! its DB2 plan by two submitted jobs. A NEWCOPY refresh finishes the
//! stage.

use super::{RegionTarget, TaskContext};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use tracing::info;
use zpipe_cics::RefreshOutcome;
use zpipe_core::template::render_file;
use zpipe_endevor::ElementSync;

pub async fn run(
    ctx: &TaskContext,
    push: bool,
    generate: bool,
    jobs: bool,
    refresh: bool,
) -> Result<()> {
    let sync = ElementSync::new(
        ctx.runner.clone(),
        ctx.config.endevor.clone(),
        ctx.profiles.endevor(),
    );

    if push {
        let pushed = sync.push_directory().await?;
        info!(elements = pushed.len(), "source pushed to Endevor");
    }

    if generate {
        sync.generate(&ctx.config.endevor.element).await?;
    }

    if jobs {
        let region = ctx.resolve_region().await?;
        let vars = job_vars(ctx, &region);
        let submitter = ctx.job_submitter();

        let copy = render_file(&ctx.jcl_dir().join("copy.jcl"), &vars)?;
        submitter
            .submit_and_check(&copy, "copy load module")
            .await
            .context("copying the load module into the region library")?;

        let bind = render_file(&ctx.jcl_dir().join("bind.jcl"), &vars)?;
        submitter
            .submit_and_check(&bind, "bind DB2 plan")
            .await
            .context("binding the DB2 plan")?;
    }

    if refresh {
        let program = &ctx.config.cics.cobol.program;
        let client = ctx.cics_client().await?;
        match client.refresh_program(program).await? {
            RefreshOutcome::Refreshed => info!(%program, "program refreshed"),
            RefreshOutcome::NotFound => {
                bail!("program {program} is not installed in the region")
            }
            RefreshOutcome::Failed => bail!("NEWCOPY of {program} did not take effect"),
        }
    }

    Ok(())
}

/// Substitution variables for the copy and bind JCL templates. Keys
/// carry the `@@name##` markers the templates use.
fn job_vars(ctx: &TaskContext, region: &RegionTarget) -> BTreeMap<String, String> {
    let config = &ctx.config;
    marker_vars([
        ("USER", config.system.user.clone()),
        ("ACCOUNT", config.system.account.clone()),
        (
            "JOBNAME",
            format!("{}COPY", config.zos_jobs.job_name_prefix),
        ),
        ("JOBCLASS", config.zos_jobs.job_class.clone()),
        ("MSGCLASS", config.zos_jobs.msgclass.clone()),
        ("ELEMENT", config.endevor.element.clone()),
        ("NDVRHLQ", config.endevor.hlq.clone()),
        ("LOADLIB", region.loadlib.clone()),
        ("REGION", region.applid.clone()),
        ("DB2SSID", config.db2.region.clone()),
        ("DB2HLQ", config.db2.hlq.clone()),
        ("PLAN", config.cics.cobol.plan.clone()),
        ("PROGRAM", config.cics.cobol.program.clone()),
    ])
}

fn marker_vars<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(name, value)| (format!("@@{name}##"), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpipe_core::template::render_string;

    #[test]
    fn test_job_vars_fill_a_job_card() {
        let vars = marker_vars([
            ("USER", "IBMUSER".to_string()),
            ("JOBNAME", "ZPCOPY".to_string()),
            ("JOBCLASS", "A".to_string()),
        ]);
        let jcl = render_string("//@@JOBNAME## JOB (@@USER##),CLASS=@@JOBCLASS##", &vars);
        assert_eq!(jcl, "//ZPCOPY JOB (IBMUSER),CLASS=A");
        assert!(!jcl.contains("@@"));
    }

    #[test]
    fn test_markers_do_not_touch_literal_text() {
        let vars = marker_vars([("REGION", "CICSAA01".to_string())]);
        let jcl = render_string("//S1 EXEC PGM=X,REGION=0M,PARM=@@REGION##", &vars);
        assert_eq!(jcl, "//S1 EXEC PGM=X,REGION=0M,PARM=CICSAA01");
    }
}
