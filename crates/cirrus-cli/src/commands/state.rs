//! State commands - inspect the state file

use cirrus_provider::StateStore;
use console::style;

use super::Context;
use crate::display;
use crate::error::{CliError, Result};

pub async fn list(ctx: &Context) -> Result<()> {
    let instances = ctx.store().list().await?;
    print!("{}", display::render_state_list(&instances));
    Ok(())
}

pub async fn show(ctx: &Context, address: &str, json_output: bool) -> Result<()> {
    let instance = ctx.store().get(address).await?.ok_or_else(|| {
        CliError::state_with_help(
            format!("{} is not in state", address),
            "Run `cirrus state list` to see managed resources",
        )
    })?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&instance)?);
        return Ok(());
    }

    println!("{}", style(instance.address()).bold().underlined());
    println!("  ID:       {}", style(&instance.id).cyan());
    println!(
        "  Created:  {}",
        instance.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:  {}",
        instance.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();

    let attributes = serde_yaml::to_string(&instance.attributes)
        .map_err(|e| CliError::internal(e.to_string()))?;
    print!("{}", attributes);
    Ok(())
}
