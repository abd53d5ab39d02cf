//! Resources command - list supported resource types

use super::offline_provider;
use crate::display;
use crate::error::Result;

pub fn run() -> Result<()> {
    let provider = offline_provider()?;
    print!("{}", display::render_resources(&provider));
    Ok(())
}
