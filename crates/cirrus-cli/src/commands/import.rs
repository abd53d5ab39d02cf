//! Import command - bring an existing remote object under management

use console::style;

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let config = ctx.load_config()?;
    let workspace = ctx.connect(&config)?;

    println!("{} Importing {} as {}", style("→").blue(), id, address);
    let instance = workspace.import(&config, address, id).await?;

    println!(
        "{} Imported {} ({})",
        style("✓").green().bold(),
        style(instance.address()).bold(),
        instance.id
    );
    println!("  Run `cirrus plan` to compare it with the configuration.");
    Ok(())
}
