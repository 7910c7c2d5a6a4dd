//! Featurebase blocks, one module per resource.
//!
//! Every block reads its input, makes exactly one Featurebase call and
//! reshapes the response into its output. Subscription blocks are fed by
//! [`crate::webhook::handle_webhook`] instead of calling the API.

use chrono::{SecondsFormat, Utc};
use flowblocks::{JsonSchema, schemars};
use serde::Deserialize;
use serde_json::Value;

pub mod admins;
pub mod boards;
pub mod changelogs;
pub mod comments;
pub mod custom_fields;
pub mod identify_users;
pub mod posts;
pub mod roles;
pub mod subscriptions;
pub mod surveys;

/// Input of blocks that take no configuration.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoInput {}

/// The `results` array of a list response, empty when absent.
fn results(response: &Value) -> Vec<Value> {
    match response.get("results") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// The single resource of a lookup response. Lookups answer with either an
/// array or an object under `results`.
fn first_result(response: &Value) -> Option<Value> {
    let found = match response.get("results") {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };
    found.filter(|value| is_truthy(value)).cloned()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Treats blank strings as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Treats empty lists as absent.
fn non_empty_list<T>(value: Option<Vec<T>>) -> Option<Vec<T>> {
    value.filter(|items| !items.is_empty())
}

#[cfg(test)]
fn test_ctx(endpoint: &str) -> flowblocks::Context {
    flowblocks::Context::new("test-request")
        .with_app_value("apiKey", "test-api-key")
        .with_app_value("baseUrl", endpoint)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_first_result_handles_arrays_objects_and_misses() {
        assert_eq!(
            first_result(&json!({"results": [{"id": "a"}, {"id": "b"}]})),
            Some(json!({"id": "a"}))
        );
        assert_eq!(
            first_result(&json!({"results": {"id": "a"}})),
            Some(json!({"id": "a"}))
        );
        assert_eq!(first_result(&json!({"results": []})), None);
        assert_eq!(first_result(&json!({})), None);
    }

    #[test]
    fn test_results_ignores_non_array_values() {
        assert_eq!(results(&json!({"results": [1, 2]})), vec![json!(1), json!(2)]);
        assert!(results(&json!({"results": {"id": "a"}})).is_empty());
    }

    #[test]
    fn test_now_rfc3339_is_utc_with_millis() {
        let now = now_rfc3339();

        assert!(now.ends_with('Z'));
        assert_eq!(now.len(), "2024-01-01T00:00:00.000Z".len());
    }

    #[test]
    fn test_non_empty_filters_blank_values() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("a".to_string())), Some("a".to_string()));
        assert_eq!(non_empty_list::<String>(Some(Vec::new())), None);
    }
}
