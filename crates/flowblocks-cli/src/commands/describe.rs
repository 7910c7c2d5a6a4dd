//! Displays details and schemas of a registered block, along with the app
//! configuration its connector expects.

use anyhow::Result;
use clap::Args;
use console::style;
use flowblocks::{BlockEntry, app_config_fields};

#[derive(Args)]
pub struct DescribeArgs {
    /// Block id to describe (e.g., "createPost").
    pub block_id: String,
}

fn find(block_id: &str) -> Result<&'static BlockEntry> {
    match flowblocks::find_block(block_id) {
        Some(entry) => Ok(entry),
        None => anyhow::bail!("block not found: {block_id}"),
    }
}

pub fn run(args: &DescribeArgs) -> Result<()> {
    let entry = find(&args.block_id)?;

    println!("{}", style("Block Details").bold().underlined());
    println!();
    println!("{}: {}", style("ID").cyan(), entry.id);
    println!("{}: {}", style("Name").cyan(), entry.name);
    println!("{}: {}", style("Category").cyan(), entry.category);
    if !entry.description.is_empty() {
        println!("{}: {}", style("Description").cyan(), entry.description);
    }

    println!();
    println!("{}", style("Input Schema").bold().underlined());
    println!("{}", serde_json::to_string_pretty(&(entry.input_schema_fn)())?);

    println!();
    println!("{}", style("Output Schema").bold().underlined());
    println!("{}", serde_json::to_string_pretty(&(entry.output_schema_fn)())?);

    for config in app_config_fields() {
        println!();
        println!(
            "{} ({})",
            style("App Configuration").bold().underlined(),
            config.name
        );
        for (key, field) in config.fields {
            let mut flags = Vec::new();
            if field.required {
                flags.push("required");
            }
            if field.sensitive {
                flags.push("sensitive");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            println!(
                "  {}{}: {}",
                style(key).cyan(),
                style(flags).dim(),
                field.description
            );
        }
    }

    Ok(())
}
