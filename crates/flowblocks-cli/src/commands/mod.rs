//! CLI command implementations.
//!
//! Each command module exports an `*Args` struct parsed by `clap` and a
//! `run` function the binary dispatches to.

use std::path::Path;

use anyhow::{Context, Result};
use flowblocks::config::HostConfig;

pub mod call;
pub mod describe;
pub mod list;
pub mod serve;

/// Loads the host config from `path`, or from the usual search path when
/// none is given. No config file at all yields the defaults.
pub fn load_host_config(path: Option<&Path>) -> Result<HostConfig> {
    match path {
        Some(path) => HostConfig::load(path)
            .with_context(|| format!("failed to load host config: {}", path.display())),
        None => Ok(HostConfig::resolve()
            .context("failed to resolve host config")?
            .unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_host_config_reads_explicit_path() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[app]\napiKey = \"k\"\n\n[subscriptions]\npostCreatedSubscription = [\"a\"]\n",
        )
        .unwrap();

        // Act
        let config = load_host_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(config.app.get("apiKey").map(String::as_str), Some("k"));
        assert_eq!(config.subscriptions["postCreatedSubscription"], vec!["a"]);
    }

    #[test]
    fn test_load_host_config_reports_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_host_config(Some(&path)).unwrap_err();

        assert!(err.to_string().starts_with("failed to load host config"));
    }
}
