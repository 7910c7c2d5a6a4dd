//! Local host for Flowblocks connectors.
//!
//! Usage:
//! ```bash
//! flowblocks serve                     # Receive webhooks and dispatch them to blocks
//! flowblocks call <block> <json>       # Run one block
//! flowblocks list                      # List registered blocks
//! flowblocks describe <block>          # Show block details and schemas
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

// Linked for its block registrations.
use featurebase as _;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "flowblocks", author, version, about)]
struct Cli {
    /// Path to a flowblocks.toml host config. Defaults to the usual search
    /// path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Receive webhooks and dispatch them to subscription blocks
    Serve(commands::serve::ServeArgs),

    /// Call a block for testing
    Call(commands::call::CallArgs),

    /// List registered blocks
    List(commands::list::ListArgs),

    /// Describe a specific block
    Describe(commands::describe::DescribeArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serve(_) => f.debug_tuple("Serve").finish(),
            Self::Call(_) => f.debug_tuple("Call").finish(),
            Self::List(_) => f.debug_tuple("List").finish(),
            Self::Describe(_) => f.debug_tuple("Describe").finish(),
        }
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("info".parse().context("failed to parse log directive")?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match &cli.command {
        Command::Serve(args) => {
            let config = commands::load_host_config(cli.config.as_deref())?;
            commands::serve::run(args, &config).await
        }
        Command::Call(args) => {
            let config = commands::load_host_config(cli.config.as_deref())?;
            commands::call::run(args, &config).await
        }
        Command::List(args) => commands::list::run(args),
        Command::Describe(args) => commands::describe::run(args),
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(argv: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(argv.iter().copied())
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let err = parse(&["flowblocks"]).expect_err("expected clap parse error");
        assert!(
            matches!(
                err.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand
            ),
            "unexpected error kind: {:?}",
            err.kind()
        );
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        let err = parse(&["flowblocks", "deploy"]).expect_err("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_cli_call_requires_block_id_and_input() {
        let err = parse(&["flowblocks", "call", "listPosts"]).expect_err("expected parse error");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_call_collects_app_overrides() -> Result<(), clap::Error> {
        let cli = parse(&[
            "flowblocks",
            "call",
            "listPosts",
            "{}",
            "-A",
            "apiKey=secret",
            "--app",
            "baseUrl=http://localhost:9000",
        ])?;

        let Command::Call(args) = cli.command else {
            panic!("expected Command::Call");
        };

        assert_eq!(args.block_id, "listPosts");
        assert_eq!(
            args.app,
            vec![
                ("apiKey".to_string(), "secret".to_string()),
                ("baseUrl".to_string(), "http://localhost:9000".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_cli_serve_defaults_to_config_address() -> Result<(), clap::Error> {
        let cli = parse(&["flowblocks", "serve"])?;

        let Command::Serve(args) = cli.command else {
            panic!("expected Command::Serve");
        };

        assert!(args.addr.is_none());
        assert!(cli.config.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
        Ok(())
    }

    #[test]
    fn test_cli_global_flags_follow_subcommand() -> Result<(), clap::Error> {
        let cli = parse(&[
            "flowblocks",
            "list",
            "--log-format",
            "json",
            "--config",
            "custom.toml",
        ])?;

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        Ok(())
    }

    #[test]
    fn test_cli_list_rejects_unknown_format() {
        let err = parse(&["flowblocks", "list", "--format", "yaml"])
            .expect_err("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_command_debug_shows_variant_name_without_inner_args() -> Result<(), clap::Error> {
        let test_cases = [
            ("flowblocks serve", "Serve"),
            ("flowblocks call listPosts {}", "Call"),
            ("flowblocks list", "List"),
            ("flowblocks describe listPosts", "Describe"),
        ];

        for (argv, expected_variant) in test_cases {
            let cli = parse(&argv.split_whitespace().collect::<Vec<_>>())?;
            assert_eq!(format!("{:?}", cli.command), expected_variant, "for argv: {argv}");
        }

        Ok(())
    }
}
