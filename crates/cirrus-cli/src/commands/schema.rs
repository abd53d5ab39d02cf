//! Schema command - print JSON Schemas of resource configurations

use serde_json::{Map, Value as JsonValue};

use super::offline_provider;
use crate::error::Result;

/// Print the schema of `type_name`, or of every type keyed by name
pub fn run(type_name: Option<&str>) -> Result<()> {
    let provider = offline_provider()?;

    let output = match type_name {
        Some(name) => provider.resource(name)?.schema().to_json_schema(),
        None => {
            let mut all = Map::new();
            for name in provider.type_names() {
                all.insert(name.to_string(), provider.resource(name)?.schema().to_json_schema());
            }
            JsonValue::Object(all)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
