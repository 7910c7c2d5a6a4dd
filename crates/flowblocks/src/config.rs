//! Host configuration from `flowblocks.toml`.
//!
//! The file carries the app configuration handed to blocks, the local
//! server settings, and the static subscription table used by
//! [`InMemoryHost`](crate::InMemoryHost):
//!
//! ```toml
//! [app]
//! apiKey = "env:FEATUREBASE_API_KEY"
//! webhookSecret = "env:FEATUREBASE_WEBHOOK_SECRET"
//!
//! [server]
//! addr = "127.0.0.1:8787"
//!
//! [subscriptions]
//! postCreatedSubscription = ["notify-slack"]
//! ```
//!
//! # Resolution Algorithm
//!
//! 1. `FLOWBLOCKS_CONFIG_PATH` environment variable
//! 2. Current directory
//! 3. Parent directories (walk up to filesystem root)
//! 4. XDG config directory (`~/.config/flowblocks/config.toml`)

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Environment variable that points at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FLOWBLOCKS_CONFIG_PATH";

/// File name searched for in the current and parent directories.
pub const CONFIG_FILE_NAME: &str = "flowblocks.toml";

/// Prefix marking an app value that is read from the environment.
const ENV_PREFIX: &str = "env:";

/// Errors that can occur during configuration resolution or loading.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file not found.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// An `env:` app value names a variable that is not set.
    #[error("environment variable '{0}' is not set")]
    Env(String),
}

/// Host configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Raw app configuration values, keyed by their host-facing names.
    #[serde(default)]
    pub app: BTreeMap<String, String>,

    #[serde(default)]
    pub server: ServerConfig,

    /// Block type id to subscribed block instance ids.
    #[serde(default)]
    pub subscriptions: HashMap<String, Vec<String>>,
}

/// Local webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:8787".to_string()
}

impl HostConfig {
    /// Resolves the config file using the unified resolution algorithm.
    ///
    /// Missing files are not errors and yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if a found file cannot be read or parsed.
    pub fn resolve() -> Result<Option<Self>, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from)
            && path.exists()
        {
            return Self::load(&path).map(Some);
        }

        let current = std::env::current_dir()?;
        for dir in current.ancestors() {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                return Self::load(&path).map(Some);
            }
        }

        if let Some(path) = xdg_config_path()
            && path.exists()
        {
            return Self::load(&path).map(Some);
        }

        Ok(None)
    }

    /// Loads a config file from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|_e| ConfigError::NotFound(path.to_path_buf()))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Returns the app configuration with `env:` references resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if a referenced variable is not set.
    pub fn app_config(&self) -> Result<HashMap<String, String>, ConfigError> {
        self.app
            .iter()
            .map(|(key, value)| Ok((key.clone(), resolve_value(value)?)))
            .collect()
    }
}

/// Resolves a single app value, reading `env:NAME` from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::Env`] if the referenced variable is not set.
pub fn resolve_value(value: &str) -> Result<String, ConfigError> {
    match value.strip_prefix(ENV_PREFIX) {
        Some(var) => std::env::var(var).map_err(|_e| ConfigError::Env(var.to_string())),
        None => Ok(value.to_string()),
    }
}

fn xdg_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("flowblocks").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;

    // Serializes tests that touch the working directory or environment.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const SAMPLE: &str = r#"
[app]
apiKey = "fb-key"
webhookSecret = "env:FLOWBLOCKS_TEST_SECRET"

[server]
addr = "0.0.0.0:9000"

[subscriptions]
postCreatedSubscription = ["notify-slack", "create-ticket"]
"#;

    #[test]
    fn test_load_parses_all_sections() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, SAMPLE).unwrap();

        // Act
        let config = HostConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config.app["apiKey"], "fb-key");
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(
            config.subscriptions["postCreatedSubscription"],
            vec!["notify-slack", "create-ticket"]
        );
    }

    #[test]
    fn test_load_applies_defaults_for_missing_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[app]\napiKey = \"k\"\n").unwrap();

        let config = HostConfig::load(&path).unwrap();

        assert_eq!(config.server.addr, "127.0.0.1:8787");
        assert!(config.subscriptions.is_empty());
    }

    #[test]
    fn test_load_missing_file_returns_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.toml");

        let err = HostConfig::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(ref p) if p == &path));
    }

    #[test]
    fn test_load_malformed_file_returns_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[app\napiKey = ").unwrap();

        let err = HostConfig::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    #[expect(unsafe_code, reason = "mutates process environment variables")]
    fn test_app_config_resolves_env_references() {
        // Arrange
        let _guard = TEST_LOCK.lock().unwrap();
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, SAMPLE).unwrap();
        let config = HostConfig::load(&path).unwrap();
        unsafe {
            std::env::set_var("FLOWBLOCKS_TEST_SECRET", "whsec_123");
        }

        // Act
        let app = config.app_config();
        unsafe {
            std::env::remove_var("FLOWBLOCKS_TEST_SECRET");
        }

        // Assert
        let app = app.unwrap();
        assert_eq!(app["apiKey"], "fb-key");
        assert_eq!(app["webhookSecret"], "whsec_123");
    }

    #[test]
    fn test_resolve_value_reports_missing_env_var() {
        let err = resolve_value("env:FLOWBLOCKS_TEST_DEFINITELY_UNSET").unwrap_err();

        assert_eq!(
            err.to_string(),
            "environment variable 'FLOWBLOCKS_TEST_DEFINITELY_UNSET' is not set"
        );
    }

    #[test]
    fn test_resolve_walks_up_directories() {
        // Arrange
        let _guard = TEST_LOCK.lock().unwrap();
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("deeply/nested/project");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), SAMPLE).unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();

        // Act
        let result = HostConfig::resolve();
        std::env::set_current_dir(original_dir).unwrap();

        // Assert
        let config = result.unwrap().expect("config should be found in a parent");
        assert_eq!(config.server.addr, "0.0.0.0:9000");
    }

    #[test]
    #[expect(unsafe_code, reason = "mutates process environment variables")]
    fn test_env_var_overrides_directory_config() {
        // Arrange
        let _guard = TEST_LOCK.lock().unwrap();
        let temp = TempDir::new().unwrap();
        let custom = temp.path().join("custom.toml");
        fs::write(&custom, "[server]\naddr = \"127.0.0.1:1234\"\n").unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), SAMPLE).unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp.path()).unwrap();
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &custom);
        }

        // Act
        let result = HostConfig::resolve();

        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        std::env::set_current_dir(original_dir).unwrap();

        // Assert
        let config = result.unwrap().expect("override config should load");
        assert_eq!(config.server.addr, "127.0.0.1:1234");
    }
}
