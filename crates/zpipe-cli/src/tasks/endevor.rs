//! Endevor source delivery and package promotion.

use super::TaskContext;
use anyhow::Result;
use tracing::info;
use zpipe_endevor::{ElementSync, PackagePromoter};

pub async fn run(
    ctx: &TaskContext,
    create: bool,
    push: bool,
    generate: bool,
    package: bool,
) -> Result<()> {
    let sync = ElementSync::new(
        ctx.runner.clone(),
        ctx.config.endevor.clone(),
        ctx.profiles.endevor(),
    );

    if create {
        let added = sync.add_directory().await?;
        info!(elements = added.len(), "elements created");
    }

    if push {
        let pushed = sync.push_directory().await?;
        info!(elements = pushed.len(), "elements pushed");
    }

    if generate {
        sync.generate(&ctx.config.endevor.element).await?;
    }

    if package {
        PackagePromoter::new(
            ctx.runner.clone(),
            ctx.config.endevor.clone(),
            ctx.profiles.endevor(),
        )
        .promote()
        .await?;
    }

    Ok(())
}
