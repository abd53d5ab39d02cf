//! Destroy command - delete every resource in state

use console::style;

use super::Context;
use crate::error::{CliError, Result};

pub async fn run(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        return Err(CliError::usage_with_help(
            "destroy deletes every resource in state",
            "Re-run with --yes to confirm",
        ));
    }

    let config = ctx.load_config()?;
    let workspace = ctx.connect(&config)?;

    let destroyed = workspace.destroy().await?;
    if destroyed.is_empty() {
        println!("No resources in state.");
        return Ok(());
    }

    for address in &destroyed {
        println!("  {} {}", style("-").red(), address);
    }
    println!(
        "\n{} Destroy complete. {} resource(s) destroyed.",
        style("✓").green().bold(),
        destroyed.len()
    );
    Ok(())
}
