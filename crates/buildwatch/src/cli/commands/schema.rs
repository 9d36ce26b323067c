use anyhow::{Context, Result};
use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {}

pub fn run(_args: &SchemaArgs) -> Result<()> {
    let schema = serde_json::to_string_pretty(&crate::models::json_schema())
        .context("failed to serialize report schema")?;
    println!("{schema}");
    Ok(())
}
