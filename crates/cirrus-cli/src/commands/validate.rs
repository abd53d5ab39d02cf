//! Validate command - check every resource block against its schema

use console::style;

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context, json_output: bool) -> Result<()> {
    let config = ctx.load_config()?;
    let workspace = ctx.offline()?;

    let canonical = workspace.validate(&config)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&canonical)?);
        return Ok(());
    }

    println!(
        "{} Validating {}",
        style("→").blue(),
        ctx.config_path.display()
    );
    for address in canonical.keys() {
        println!("  {} {}", style("✓").green(), address);
    }
    println!(
        "\n{} {} resource(s) valid",
        style("✓").green().bold(),
        canonical.len()
    );
    Ok(())
}
