//! Apply command - create, update and delete resources to match the configuration

use console::style;
use tracing::info;

use super::{Context, relative_display};
use crate::display;
use crate::error::Result;

pub async fn run(ctx: &Context, refresh: bool) -> Result<()> {
    let config = ctx.load_config()?;
    let workspace = ctx.connect(&config)?;

    if refresh {
        println!("{} Refreshing state...", style("→").blue());
        workspace.refresh().await?;
    }

    let plan = workspace.apply(&config).await?;
    print!("{}", display::render_plan(&plan));

    if plan.has_changes() {
        let counts = plan.counts();
        info!(
            created = counts.create,
            updated = counts.update,
            replaced = counts.replace,
            destroyed = counts.delete,
            "applied"
        );
        println!(
            "\n{} Apply complete. State saved to {}",
            style("✓").green().bold(),
            relative_display(&ctx.state_path)
        );
    }
    Ok(())
}
