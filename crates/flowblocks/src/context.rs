//! Context for block invocations.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::app_config::AppConfigError;

/// Per-invocation request metadata and the app configuration the host
/// stored for the connector.
///
/// App configuration is supplied fresh on every invocation and is never
/// mutated by blocks.
#[derive(Debug, Clone, Default)]
pub struct Context {
    request_id: String,
    app_config: Option<HashMap<String, String>>,
}

impl Context {
    /// Creates a context for the given request.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            app_config: None,
        }
    }

    /// Creates an empty context useful for testing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Identifier for correlating logs of one invocation.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Replaces the app configuration.
    #[must_use]
    pub fn with_app_config(mut self, values: HashMap<String, String>) -> Self {
        self.app_config = Some(values);
        self
    }

    /// Sets a single app configuration value.
    #[must_use]
    pub fn with_app_value(mut self, key: &str, value: &str) -> Self {
        self.app_config
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Returns a raw app configuration value.
    #[must_use]
    pub fn app_value(&self, key: &str) -> Option<&str> {
        self.app_config
            .as_ref()
            .and_then(|values| values.get(key))
            .map(String::as_str)
    }

    /// Deserializes the app configuration into the requested type.
    ///
    /// # Errors
    ///
    /// Returns [`AppConfigError::Missing`] if no configuration was supplied,
    /// or [`AppConfigError::Invalid`] if deserialization fails.
    pub fn app_config<T: DeserializeOwned>(&self) -> Result<T, AppConfigError> {
        let values = self.app_config.as_ref().ok_or(AppConfigError::Missing)?;
        serde_json::to_value(values)
            .and_then(serde_json::from_value)
            .map_err(|e| AppConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct TestConfig {
        api_key: String,
        base_url: Option<String>,
    }

    #[test]
    fn test_empty_context() {
        let ctx = Context::empty();
        assert!(ctx.request_id().is_empty());
        assert!(ctx.app_value("apiKey").is_none());
    }

    #[test]
    fn test_new_context_keeps_request_id() {
        let ctx = Context::new("req-123");
        assert_eq!(ctx.request_id(), "req-123");
    }

    #[test]
    fn test_app_config_deserializes_camel_case_keys() {
        // Arrange
        let ctx = Context::empty()
            .with_app_value("apiKey", "secret123")
            .with_app_value("baseUrl", "https://example.test");

        // Act
        let config: TestConfig = ctx.app_config().unwrap();

        // Assert
        assert_eq!(
            config,
            TestConfig {
                api_key: "secret123".to_string(),
                base_url: Some("https://example.test".to_string()),
            }
        );
    }

    #[test]
    fn test_app_config_optional_key_may_be_absent() {
        let mut values = HashMap::new();
        values.insert("apiKey".to_string(), "secret123".to_string());
        let ctx = Context::empty().with_app_config(values);

        let config: TestConfig = ctx.app_config().unwrap();

        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_app_config_missing_returns_missing_error() {
        // Arrange
        let ctx = Context::new("req-1");

        // Act
        let result: Result<TestConfig, _> = ctx.app_config();

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, AppConfigError::Missing));
        assert_eq!(err.to_string(), "app configuration not provided");
    }

    #[test]
    fn test_app_config_missing_required_key_returns_invalid_error() {
        // Arrange
        let ctx = Context::empty().with_app_value("baseUrl", "https://example.test");

        // Act
        let result: Result<TestConfig, _> = ctx.app_config();

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, AppConfigError::Invalid(ref msg) if msg.contains("apiKey")));
    }

    #[test]
    fn test_app_value_reads_raw_value() {
        let ctx = Context::empty().with_app_value("webhookSecret", "whsec");
        assert_eq!(ctx.app_value("webhookSecret"), Some("whsec"));
        assert_eq!(ctx.app_value("apiKey"), None);
    }
}
