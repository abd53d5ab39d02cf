//! Plan command - show what apply would do

use console::style;

use super::Context;
use crate::display;
use crate::error::Result;

pub async fn run(ctx: &Context, refresh: bool, refresh_only: bool, json_output: bool) -> Result<()> {
    let config = ctx.load_config()?;
    let workspace = ctx.connect(&config)?;

    if refresh_only {
        // reports drift without touching the state file
        let reports = workspace.drift().await?;
        if json_output {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            print!("{}", display::render_drift(&reports));
        }
        return Ok(());
    }

    if refresh {
        if !json_output {
            println!("{} Refreshing state...", style("→").blue());
        }
        workspace.refresh().await?;
    }

    let plan = workspace.plan(&config).await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", display::render_plan(&plan));
    }
    Ok(())
}
