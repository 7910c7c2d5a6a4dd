//! Custom field blocks, including resolution of stored field values to
//! their human-readable labels.

use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NoInput;
use crate::{
    FeaturebaseClient, api,
    schemas::{CustomField, ResultsResponse},
    types::IdParams,
};

const UNKNOWN_FIELD_LABEL: &str = "Unknown Field";

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct ListCustomFieldsOutput(#[schemars(with = "ResultsResponse<CustomField>")] pub Value);

/// # List custom fields (ID: listCustomFields)
///
/// Retrieve a list of all custom fields configured in your Featurebase
/// organization.
///
/// ## Category
/// - Custom Fields
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn list_custom_fields(ctx: Context, _input: NoInput) -> Result<ListCustomFieldsOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(ListCustomFieldsOutput(
        api::list_custom_fields(&client).await?,
    ))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetCustomFieldInput {
    /// The unique identifier of the custom field to retrieve
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct GetCustomFieldOutput(#[schemars(with = "CustomField")] pub Value);

/// # Get custom field by ID (ID: getCustomField)
///
/// Retrieve details for a specific custom field by providing its unique
/// identifier.
///
/// ## Category
/// - Custom Fields
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn get_custom_field(
    ctx: Context,
    input: GetCustomFieldInput,
) -> Result<GetCustomFieldOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(GetCustomFieldOutput(
        api::get_custom_field(&client, &IdParams::new(input.id)).await?,
    ))
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolveCustomFieldsInput {
    /// Custom field IDs mapped to their stored values, as found in a post's
    /// `customInputValues`
    pub custom_input_values: Map<String, Value>,
}

/// A custom field value with its field label.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ResolvedField {
    pub label: String,
    /// The value, with option IDs replaced by option labels
    pub value: Value,
}

/// # Resolve custom fields (ID: resolveCustomFields)
///
/// Resolve custom field IDs and values to their human-readable form with
/// field metadata.
///
/// Empty values are skipped. Option IDs of choice fields are replaced by
/// their labels, and a single resolved choice is returned as a plain value
/// rather than a one-element list. Fields missing from the catalog are
/// labelled "Unknown Field".
///
/// ## Category
/// - Custom Fields
///
/// # Errors
///
/// Returns an error if the custom field catalog cannot be fetched or the
/// response does not report success.
#[block]
pub async fn resolve_custom_fields(
    ctx: Context,
    input: ResolveCustomFieldsInput,
) -> Result<Vec<ResolvedField>> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let catalog = api::list_custom_fields(&client).await?;
    ensure!(
        catalog.get("success").and_then(Value::as_bool) == Some(true),
        "Failed to fetch custom fields"
    );
    let fields = catalog
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(resolve_values(fields, input.custom_input_values))
}

fn resolve_values(fields: &[Value], values: Map<String, Value>) -> Vec<ResolvedField> {
    values
        .into_iter()
        .filter(|(_, value)| !is_empty_value(value))
        .map(|(field_id, value)| {
            let Some(field) = fields.iter().find(|f| f["_id"] == field_id.as_str()) else {
                return ResolvedField {
                    label: UNKNOWN_FIELD_LABEL.to_string(),
                    value,
                };
            };

            let options = field["options"].as_array().map(Vec::as_slice).unwrap_or_default();
            let value = if options.is_empty() {
                value
            } else {
                resolve_options(options, value)
            };

            ResolvedField {
                label: field["label"].as_str().unwrap_or_default().to_string(),
                value: unwrap_single(value),
            }
        })
        .collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn resolve_options(options: &[Value], value: Value) -> Value {
    let label_of = |id: Value| -> Value {
        options
            .iter()
            .find(|opt| id.is_string() && opt["_id"] == id)
            .map_or(id, |opt| opt["label"].clone())
    };

    match value {
        Value::Array(ids) => Value::Array(ids.into_iter().map(label_of).collect()),
        Value::String(_) => label_of(value),
        other => other,
    }
}

fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.swap_remove(0),
        other => other,
    }
}
