//! List blocks registered in this binary.
//!
//! Supports a human-readable table and JSON output, optionally filtered to
//! one category.

use anyhow::Result;
use clap::Args;
use console::style;
use flowblocks::BlockEntry;
use serde_json::{Value, json};

/// Truncates a description to 40 characters, ending in "..." when cut.
fn truncate_description(description: &str) -> String {
    const MAX_DESCRIPTION_CHARS: usize = 40;
    const ELLIPSIS: &str = "...";
    const TRUNCATED_CHARS: usize = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();

    let mut chars = description.chars();
    let head: String = chars.by_ref().take(MAX_DESCRIPTION_CHARS).collect();

    if chars.next().is_none() {
        return head;
    }

    let prefix: String = head.chars().take(TRUNCATED_CHARS).collect();
    format!("{prefix}{ELLIPSIS}")
}

#[derive(Args)]
pub struct ListArgs {
    /// Output format: "table" for a human-readable table or "json" for
    /// machine-readable JSON
    #[arg(short, long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Only list blocks in this category (case-insensitive)
    #[arg(short, long)]
    pub category: Option<String>,
}

/// Registered blocks sorted by category then id.
fn selected_blocks(category: Option<&str>) -> Vec<&'static BlockEntry> {
    let mut entries: Vec<_> = flowblocks::blocks()
        .filter(|entry| category.is_none_or(|c| entry.category.eq_ignore_ascii_case(c)))
        .collect();
    entries.sort_by_key(|entry| (entry.category, entry.id));
    entries
}

fn block_to_json(entry: &BlockEntry) -> Value {
    json!({
        "id": entry.id,
        "name": entry.name,
        "category": entry.category,
        "description": entry.description,
    })
}

pub fn run(args: &ListArgs) -> Result<()> {
    let entries = selected_blocks(args.category.as_deref());

    if args.format == "json" {
        let blocks: Vec<Value> = entries.iter().map(|entry| block_to_json(entry)).collect();
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No blocks found");
        return Ok(());
    }

    println!(
        "{:<32} {:<22} {}",
        style("BLOCK ID").bold(),
        style("CATEGORY").bold(),
        style("DESCRIPTION").bold()
    );
    println!("{}", "-".repeat(96));

    for entry in &entries {
        println!(
            "{:<32} {:<22} {}",
            entry.id,
            entry.category,
            truncate_description(entry.description)
        );
    }

    println!(
        "\n{} {} block(s) available",
        style("✓").green(),
        entries.len()
    );
    Ok(())
}
