//! `flowblocks call` command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use flowblocks::config::{HostConfig, resolve_value};
use serde_json::Value;

/// Arguments for the `call` command.
#[derive(Args)]
pub struct CallArgs {
    /// Block id to call (e.g., "listPosts").
    pub block_id: String,

    /// Input JSON (inline or @file.json).
    pub input: String,

    /// App configuration value as `key=value`, overriding the `[app]` table
    /// of the host config. Can be specified multiple times.
    /// Values starting with `env:` are read from environment variables.
    #[arg(short = 'A', long = "app", value_parser = parse_key_value)]
    pub app: Vec<(String, String)>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid app value '{s}': expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid app value '{s}': empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn read_input(input: &str) -> Result<Value> {
    let input_json = if let Some(path) = input.strip_prefix('@') {
        let path = PathBuf::from(path);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read input file: {}", path.display()))?
    } else {
        input.to_string()
    };

    serde_json::from_str(&input_json).context("invalid input JSON")
}

async fn call_block(args: &CallArgs, config: &HostConfig) -> Result<Value> {
    let input = read_input(&args.input)?;

    let mut app_config = config.app_config().context("failed to resolve app config")?;
    for (key, value) in &args.app {
        let value = resolve_value(value).with_context(|| format!("failed to resolve '{key}'"))?;
        app_config.insert(key.clone(), value);
    }

    let ctx = flowblocks::Context::new("cli").with_app_config(app_config);
    Ok(flowblocks::invoke(&args.block_id, ctx, input).await?)
}

pub async fn run(args: &CallArgs, config: &HostConfig) -> Result<()> {
    println!(
        "{} Calling block: {}",
        style("→").cyan(),
        style(&args.block_id).bold()
    );

    let output = call_block(args, config).await?;

    if output.is_null() {
        println!("{} Block emitted nothing", style("?").yellow().bold());
    } else {
        println!("{} Result:", style("✓").green().bold());
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
