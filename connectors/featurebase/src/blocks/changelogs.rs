//! Changelog blocks: entries, publishing and email subscribers.

use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    NoInput, first_result, non_empty, non_empty_list, now_rfc3339, posts::updated_fields, results,
};
use crate::{
    FeaturebaseClient, api,
    schemas::{Changelog, Pagination},
    types::{
        ChangelogSubscribersParams, CreateChangelogParams, IdParams, ListChangelogsParams,
        PublishChangelogParams, UnpublishChangelogParams, UpdateChangelogParams,
    },
};

const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogState {
    Draft,
    Live,
}

impl ChangelogState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Live => "live",
        }
    }
}

fn locale_or_default(locale: Option<String>) -> String {
    non_empty(locale).unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ListChangelogsInput {
    /// Search changelogs by title or content
    pub q: Option<String>,
    /// Filter by changelog category names
    pub categories: Option<Vec<String>>,
    /// Filter by publication state
    pub state: Option<ChangelogState>,
    /// Locale to list changelogs in (default: en)
    pub locale: Option<String>,
    /// Number of results per page (default: 10)
    pub limit: Option<u32>,
    /// Page number (default: 1)
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListChangelogsOutput {
    #[schemars(with = "Vec<Changelog>")]
    pub changelogs: Vec<Value>,
    pub pagination: Pagination,
    pub success: bool,
}

/// # List Changelogs (ID: listChangelogs)
///
/// Retrieves a paginated collection of changelogs from Featurebase with
/// optional filtering and search. Use the 'Get Changelog' block to retrieve
/// a single changelog by ID.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn list_changelogs(
    ctx: Context,
    input: ListChangelogsInput,
) -> Result<ListChangelogsOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = ListChangelogsParams {
        id: None,
        q: non_empty(input.q),
        categories: non_empty_list(input.categories),
        state: input.state.map(|state| state.as_str().to_string()),
        locale: Some(locale_or_default(input.locale)),
        limit: Some(input.limit.unwrap_or(10)),
        page: Some(input.page.unwrap_or(1)),
    };
    let response = api::list_changelogs(&client, &params).await?;

    Ok(ListChangelogsOutput {
        changelogs: results(&response),
        pagination: Pagination::from_response(&response),
        success: true,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetChangelogInput {
    /// The ID of the changelog to retrieve
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GetChangelogOutput {
    #[schemars(with = "Option<Changelog>")]
    pub changelog: Option<Value>,
    pub success: bool,
    pub found: bool,
}

/// # Get Changelog (ID: getChangelog)
///
/// Retrieves a single changelog by ID from Featurebase.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn get_changelog(ctx: Context, input: GetChangelogInput) -> Result<GetChangelogOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let response = api::get_changelog(&client, &IdParams::new(input.id)).await?;
    let changelog = first_result(&response);

    Ok(GetChangelogOutput {
        found: changelog.is_some(),
        changelog,
        success: true,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateChangelogInput {
    /// The title of the changelog
    pub title: String,
    /// HTML content of the changelog
    pub html_content: Option<String>,
    /// Markdown content of the changelog (used when `htmlContent` is empty)
    pub markdown_content: Option<String>,
    /// Names of the changelog categories
    pub changelog_categories: Option<Vec<String>>,
    /// URL of the featured image
    pub featured_image: Option<String>,
    /// Segment IDs allowed to see the changelog
    pub allowed_segment_ids: Option<Vec<String>>,
    /// Locale of the changelog (default: en)
    pub locale: Option<String>,
    /// Publication date (ISO format)
    pub date: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CreateChangelogOutput {
    #[schemars(with = "Option<Changelog>")]
    pub changelog: Value,
    pub success: bool,
}

/// # Create Changelog (ID: createChangelog)
///
/// Creates a new changelog in Featurebase with title and content. New
/// changelogs start as drafts; use 'Publish Changelog' to make them live.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `title` is empty or the Featurebase API request
/// fails.
#[block]
pub async fn create_changelog(
    ctx: Context,
    input: CreateChangelogInput,
) -> Result<CreateChangelogOutput> {
    ensure!(!input.title.trim().is_empty(), "title must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = CreateChangelogParams {
        title: input.title,
        html_content: non_empty(input.html_content),
        markdown_content: non_empty(input.markdown_content),
        changelog_categories: input.changelog_categories,
        featured_image: non_empty(input.featured_image),
        allowed_segment_ids: input.allowed_segment_ids,
        locale: Some(locale_or_default(input.locale)),
        date: non_empty(input.date),
    };
    let response = api::create_changelog(&client, &params).await?;

    let changelog = ["results", "changelog"]
        .into_iter()
        .filter_map(|key| response.get(key))
        .find(|value| !value.is_null())
        .cloned()
        .unwrap_or(Value::Null);

    Ok(CreateChangelogOutput {
        changelog,
        success: true,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateChangelogInput {
    /// The ID of the changelog to update
    pub id: String,
    pub title: Option<String>,
    pub html_content: Option<String>,
    pub markdown_content: Option<String>,
    pub changelog_categories: Option<Vec<String>>,
    /// Publication date (ISO format)
    pub date: Option<String>,
    pub featured_image: Option<String>,
    pub allowed_segment_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChangelogOutput {
    pub changelog_id: String,
    pub success: bool,
    pub updated_fields: Vec<String>,
}

/// # Update Changelog (ID: updateChangelog)
///
/// Updates an existing changelog in Featurebase by providing the changelog
/// ID and fields to update.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn update_changelog(
    ctx: Context,
    input: UpdateChangelogInput,
) -> Result<UpdateChangelogOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = UpdateChangelogParams {
        id: input.id,
        title: input.title,
        html_content: input.html_content,
        markdown_content: input.markdown_content,
        changelog_categories: input.changelog_categories,
        date: input.date,
        featured_image: input.featured_image,
        allowed_segment_ids: input.allowed_segment_ids,
    };
    api::update_changelog(&client, &params).await?;

    Ok(UpdateChangelogOutput {
        updated_fields: updated_fields(&params)?,
        changelog_id: params.id,
        success: true,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteChangelogInput {
    /// The ID of the changelog to delete
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteChangelogOutput {
    pub changelog_id: String,
    pub success: bool,
    pub deleted_at: String,
}

/// # Delete Changelog (ID: deleteChangelog)
///
/// Permanently deletes a changelog from Featurebase by providing the
/// changelog ID.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn delete_changelog(
    ctx: Context,
    input: DeleteChangelogInput,
) -> Result<DeleteChangelogOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = IdParams::new(input.id);
    api::delete_changelog(&client, &params).await?;

    Ok(DeleteChangelogOutput {
        changelog_id: params.id,
        success: true,
        deleted_at: now_rfc3339(),
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishChangelogInput {
    /// The ID of the changelog to publish
    pub id: String,
    /// Whether to email the changelog to subscribers
    pub send_email: bool,
    /// Locales to publish in. Publishes in every available locale when empty
    pub locales: Option<Vec<String>>,
    /// Publish at this date instead of now (ISO format)
    pub scheduled_date: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishChangelogOutput {
    pub changelog_id: String,
    pub success: bool,
    pub published_at: String,
    pub email_sent: bool,
    pub locales: Vec<String>,
}

/// # Publish Changelog (ID: publishChangelog)
///
/// Publishes a changelog and optionally sends email notifications to
/// subscribers.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn publish_changelog(
    ctx: Context,
    input: PublishChangelogInput,
) -> Result<PublishChangelogOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = PublishChangelogParams {
        id: input.id,
        send_email: input.send_email,
        locales: non_empty_list(input.locales),
        scheduled_date: non_empty(input.scheduled_date),
    };
    api::publish_changelog(&client, &params).await?;

    Ok(PublishChangelogOutput {
        success: true,
        published_at: now_rfc3339(),
        email_sent: params.send_email,
        locales: params.locales.unwrap_or_default(),
        changelog_id: params.id,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct UnpublishChangelogInput {
    /// The ID of the changelog to unpublish
    pub id: String,
    /// Locales to unpublish. Unpublishes every locale when empty
    pub locales: Option<Vec<String>>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnpublishChangelogOutput {
    pub changelog_id: String,
    pub success: bool,
    pub unpublished_at: String,
    pub locales: Vec<String>,
}

/// # Unpublish Changelog (ID: unpublishChangelog)
///
/// Unpublishes a changelog, making it no longer visible to users.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn unpublish_changelog(
    ctx: Context,
    input: UnpublishChangelogInput,
) -> Result<UnpublishChangelogOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = UnpublishChangelogParams {
        id: input.id,
        locales: non_empty_list(input.locales),
    };
    api::unpublish_changelog(&client, &params).await?;

    Ok(UnpublishChangelogOutput {
        success: true,
        unpublished_at: now_rfc3339(),
        locales: params.locales.unwrap_or_default(),
        changelog_id: params.id,
    })
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetChangelogSubscribersOutput {
    pub emails: Vec<Value>,
    pub success: bool,
    pub total_subscribers: usize,
}

/// # Get Changelog Subscribers (ID: getChangelogSubscribers)
///
/// Retrieves a list of all changelog subscribers.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn get_changelog_subscribers(
    ctx: Context,
    _input: NoInput,
) -> Result<GetChangelogSubscribersOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let response = api::get_changelog_subscribers(&client).await?;
    let emails = match response.get("emails") {
        Some(Value::Array(emails)) => emails.clone(),
        _ => Vec::new(),
    };

    Ok(GetChangelogSubscribersOutput {
        total_subscribers: emails.len(),
        emails,
        success: true,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChangelogSubscribersInput {
    /// Email addresses to add or remove
    pub emails: Vec<String>,
    /// Subscription locale (default: en)
    pub locale: Option<String>,
}

impl ChangelogSubscribersInput {
    fn into_params(self) -> Result<ChangelogSubscribersParams> {
        ensure!(!self.emails.is_empty(), "emails must not be empty");
        Ok(ChangelogSubscribersParams {
            emails: self.emails,
            locale: Some(locale_or_default(self.locale)),
        })
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddChangelogSubscribersOutput {
    pub success: bool,
    pub added_emails: Vec<String>,
    pub added_count: usize,
    pub locale: String,
}

/// # Add Changelog Subscribers (ID: addChangelogSubscribers)
///
/// Adds new email addresses as changelog subscribers. They will receive
/// emails when changelogs are published.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `emails` is empty or the Featurebase API request
/// fails.
#[block]
pub async fn add_changelog_subscribers(
    ctx: Context,
    input: ChangelogSubscribersInput,
) -> Result<AddChangelogSubscribersOutput> {
    let params = input.into_params()?;
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    api::add_changelog_subscribers(&client, &params).await?;

    Ok(AddChangelogSubscribersOutput {
        success: true,
        added_count: params.emails.len(),
        added_emails: params.emails,
        locale: params.locale.unwrap_or_default(),
    })
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveChangelogSubscribersOutput {
    pub success: bool,
    pub removed_emails: Vec<String>,
    pub removed_count: usize,
    pub locale: String,
}

/// # Remove Changelog Subscribers (ID: removeChangelogSubscribers)
///
/// Removes email addresses from changelog subscribers. They will no longer
/// receive changelog emails.
///
/// ## Category
/// - Changelogs
///
/// # Errors
///
/// Returns an error if `emails` is empty or the Featurebase API request
/// fails.
#[block]
pub async fn remove_changelog_subscribers(
    ctx: Context,
    input: ChangelogSubscribersInput,
) -> Result<RemoveChangelogSubscribersOutput> {
    let params = input.into_params()?;
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    api::remove_changelog_subscribers(&client, &params).await?;

    Ok(RemoveChangelogSubscribersOutput {
        success: true,
        removed_count: params.emails.len(),
        removed_emails: params.emails,
        locale: params.locale.unwrap_or_default(),
    })
}
