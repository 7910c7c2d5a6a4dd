//! Featurebase integration for Flowblocks.
//!
//! Exposes the Featurebase REST API (posts, comments, changelogs, roles,
//! admins, boards, custom fields, surveys and identified users) as blocks,
//! and turns signed Featurebase webhooks into events for the subscription
//! blocks.

use flowblocks::{Result, define_app_config, info, init, shutdown};

pub mod api;
pub mod blocks;
pub mod client;
pub mod schemas;
pub mod security;
pub mod types;
pub mod webhook;

pub use client::{ContentType, FeaturebaseClient, FeaturebaseError, RequestOptions, clean_params};

define_app_config!(FeaturebaseConfig("featurebase") {
    /// The signing secret from your Featurebase webhook configuration (starts with 'whsec_')
    #[sensitive]
    webhook_secret: Option<String>,
    /// Your Featurebase API key for making API requests
    #[sensitive]
    api_key: String,
    /// Featurebase API base URL (default: https://do.featurebase.app)
    #[optional]
    base_url: Option<String>,
});

#[init]
async fn setup() -> Result<()> {
    info!("Featurebase integration initialized");
    Ok(())
}

#[shutdown]
fn cleanup() {
    info!("Featurebase integration shutting down");
}

#[cfg(test)]
mod tests {
    use flowblocks::{Context, app_config_fields};

    use super::*;

    #[test]
    fn test_app_config_surface_lists_featurebase_fields() {
        // Arrange & Act
        let entry = app_config_fields()
            .find(|entry| entry.name == "featurebase")
            .expect("featurebase app config should be registered");

        // Assert
        let keys: Vec<_> = entry.fields.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec!["webhookSecret", "apiKey", "baseUrl"]);

        let (_, secret) = &entry.fields[0];
        assert!(secret.required);
        assert!(secret.sensitive);

        let (_, base_url) = &entry.fields[2];
        assert!(!base_url.required);
        assert!(!base_url.sensitive);
    }

    #[test]
    fn test_config_debug_redacts_secrets() {
        let ctx = Context::empty()
            .with_app_value("apiKey", "fb-secret-key")
            .with_app_value("webhookSecret", "whsec_abc");

        let config = FeaturebaseConfig::get(&ctx).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("fb-secret-key"));
        assert!(!debug.contains("whsec_abc"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_reads_optional_fields() {
        let ctx = Context::empty().with_app_value("apiKey", "k");

        let config = FeaturebaseConfig::get(&ctx).unwrap();

        assert_eq!(config.api_key, "k");
        assert!(config.base_url.is_none());
        assert!(config.webhook_secret.is_none());
    }
}
