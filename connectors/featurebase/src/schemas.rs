//! JSON Schema fragments for Featurebase entities.
//!
//! Blocks pass most remote objects through unchanged as
//! [`serde_json::Value`]; these types only describe their shape in block
//! schemas (`#[schemars(with = "...")]`). The event shapes at the bottom
//! describe what the subscription blocks emit.

use std::collections::BTreeMap;

use flowblocks::{JsonSchema, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination metadata of list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number
    pub page: u64,
    /// Items per page
    pub limit: u64,
    /// Total number of pages
    pub total_pages: u64,
    /// Total number of results
    pub total_results: u64,
}

impl Pagination {
    /// Reads pagination fields from a list response, falling back to page 1
    /// of 10 with no results for anything absent or zero.
    #[must_use]
    pub fn from_response(response: &Value) -> Self {
        let field = |key: &str, default: u64| {
            response
                .get(key)
                .and_then(Value::as_u64)
                .filter(|n| *n != 0)
                .unwrap_or(default)
        };
        Self {
            page: field("page", 1),
            limit: field("limit", 10),
            total_pages: field("totalPages", 1),
            total_results: field("totalResults", 0),
        }
    }
}

/// Featurebase user object with profile information.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID in Featurebase.
    pub id: String,
    /// User's email address.
    pub email: String,
    /// Display name of the user.
    pub name: String,
    /// URL to the user's profile picture, or null if not set.
    pub profile_picture: Option<String>,
    /// Whether the user's email address has been verified.
    pub verified: bool,
    /// User's role type in the organization (`user`, `admin` or `member`).
    #[serde(rename = "type")]
    pub user_type: String,
    pub description: Option<String>,
}

/// Status of a post (e.g. "Under Review", "In Progress", "Completed").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostStatus {
    /// Display name of the status.
    pub name: String,
    /// Hex color code for the status (e.g. `#FF5733`).
    pub color: String,
    /// Internal type identifier for the status.
    #[serde(rename = "type")]
    pub status_type: String,
    /// Whether this is the default status for new posts.
    pub is_default: bool,
    /// Unique status ID.
    pub id: String,
}

/// Board (category) a post belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostCategory {
    /// Display name of the board.
    pub category: String,
    /// Whether this board is private to certain users.
    pub private: bool,
    #[serde(default)]
    pub segment_ids: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub icon: Option<Value>,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostTag {
    pub name: String,
    pub color: Option<String>,
    pub private: bool,
    pub id: String,
}

/// Complete post object with all associated data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique post ID.
    pub id: String,
    pub title: String,
    /// Full content of the post (HTML).
    pub content: String,
    /// URL-friendly slug for the post.
    pub slug: String,
    pub upvotes: u64,
    pub comment_count: u64,
    /// Whether the post is pinned to the top of its board.
    pub pinned: bool,
    pub comments_allowed: bool,
    pub in_review: Option<bool>,
    /// Creation date (ISO 8601).
    pub date: String,
    pub last_modified: String,
    /// Timestamp of the most recent upvote, or null if never upvoted.
    pub last_upvoted: Option<String>,
    pub user: User,
    pub post_status: PostStatus,
    pub post_category: PostCategory,
    #[serde(default)]
    pub post_tags: Vec<PostTag>,
}

/// A company an identified user belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Company ID
    pub id: String,
    /// Company name
    pub name: String,
    /// Monthly recurring revenue from this company
    pub monthly_spend: f64,
    /// Date when the company was created
    pub created_at: Option<String>,
    /// Company custom fields
    pub custom_fields: Option<BTreeMap<String, Value>>,
    #[serde(rename = "_id")]
    pub internal_id: Option<String>,
}

/// A user who upvoted a post.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Upvoter {
    pub id: String,
    pub user_id: String,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub companies: Vec<Company>,
    pub email: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub comments_created: Option<u64>,
    pub posts_created: Option<u64>,
    pub last_activity: Option<String>,
    pub subscribed_to_changelog: Option<bool>,
    pub manually_opted_out_from_changelog: Option<bool>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub locale: Option<String>,
    pub verified: bool,
    #[serde(rename = "type")]
    pub user_type: String,
    pub description: Option<String>,
}

/// Comment on a post or changelog, as returned by the comment endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    /// Author display name
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub author_picture: Option<String>,
    /// Whether this comment is only visible to admins.
    pub is_private: bool,
    pub is_deleted: Option<bool>,
    pub upvotes: i64,
    pub downvotes: i64,
    /// Upvotes minus downvotes.
    pub score: i64,
    /// Post the comment belongs to.
    pub submission: Option<String>,
    /// Changelog the comment belongs to.
    pub changelog: Option<String>,
    pub parent_comment: Option<String>,
    /// Hierarchical path for nested comment threads.
    pub path: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub organization: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub in_review: bool,
    pub pinned: bool,
}

/// Category for changelog entries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogCategory {
    pub name: String,
    /// Hex color code for the category.
    pub color: String,
    #[serde(default)]
    pub segment_ids: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub id: String,
}

/// Changelog entry with publication information.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Changelog {
    pub id: String,
    pub slug: String,
    pub featured_image: Option<String>,
    pub title: String,
    /// HTML content of the entry.
    pub content: String,
    pub markdown_content: Option<String>,
    pub date: String,
    /// `draft` or `live`
    pub state: String,
    #[serde(default)]
    pub changelog_categories: Vec<ChangelogCategory>,
    pub organization: String,
    pub email_sent_to_subscribers: Option<bool>,
    pub comment_count: u64,
    #[serde(default)]
    pub allowed_segment_ids: Vec<String>,
    pub locale: String,
}

/// A field change carried by `*.updated` webhooks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// Name of the field that was changed.
    pub field: String,
    /// Previous value before the change.
    pub old_value: Value,
    /// New value after the change.
    pub new_value: Value,
}

/// Vote item carried by `post.voted` webhooks.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostVote {
    /// `add` or `remove`
    pub action: String,
    pub submission_id: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub role_id: String,
}

/// Permission flags of an admin role, keyed by permission name
/// (`manage_changelogs`, `moderate_posts`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AdminRolePermissions(pub BTreeMap<String, bool>);

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdminRole {
    pub name: String,
    pub permissions: AdminRolePermissions,
    #[serde(rename = "_id")]
    pub id: String,
}

/// A feedback board.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    /// Board name
    pub category: String,
    pub private: bool,
    #[serde(default)]
    pub segment_ids: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub hidden_from_roles: Vec<String>,
    pub disable_post_creation: Option<bool>,
    pub disable_follow_up_questions: Option<bool>,
    /// IDs of the custom fields shown when posting to this board
    #[serde(default)]
    pub custom_input_fields: Vec<String>,
    pub default_author_only: Option<bool>,
    pub default_company_only: Option<bool>,
    pub icon: Option<Value>,
}

/// Choice of a `select` or `multi-select` custom field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CustomFieldOption {
    #[serde(rename = "_id")]
    pub id: String,
    pub label: String,
}

/// Custom input field attached to posts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    #[serde(rename = "_id")]
    pub id: String,
    pub label: String,
    /// `text`, `date`, `number`, `select`, `multi-select` or `checkbox`
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    pub placeholder: Option<String>,
    pub public: bool,
    pub internal: bool,
    #[serde(default)]
    pub options: Vec<CustomFieldOption>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One question page of a survey.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyPage {
    #[serde(rename = "_id")]
    pub id: String,
    /// `rating`, `text`, `multiple-choice` or `checkbox`
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub description: Option<String>,
    pub sub_type: Option<String>,
    pub scale: Option<u32>,
    pub low_label: Option<String>,
    pub high_label: Option<String>,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub logic: Vec<Value>,
    pub default_action: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub helpcenter_mode: Option<bool>,
    pub organization: String,
    pub response_count: u64,
    /// Segment, URL and CSS targeting rules
    pub targeting: Option<Value>,
    #[serde(default)]
    pub pages: Vec<SurveyPage>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Answer to one survey page.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponseAnswer {
    pub page_id: String,
    #[serde(rename = "type")]
    pub answer_type: String,
    /// Rating number, free text, or the chosen option IDs
    pub value: Value,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Upvoter,
    pub responses: Vec<SurveyResponseAnswer>,
    pub created_at: String,
}

/// End-user profile created through the identify-user API.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedUser {
    /// Featurebase user ID
    pub id: Option<String>,
    /// Your own ID of the user
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub custom_fields: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub companies: Vec<Company>,
    pub comments_created: Option<u64>,
    pub posts_created: Option<u64>,
    pub last_activity: Option<String>,
    pub subscribed_to_changelog: Option<bool>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub locale: Option<String>,
    pub verified: Option<bool>,
    pub created_at: Option<String>,
}

// --- Response envelopes ---

/// Acknowledgement returned by mutations without a body.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `{success, results}` envelope of the catalog endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResultsResponse<T> {
    pub success: bool,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IdentifiedUserResponse {
    pub success: bool,
    pub user: IdentifiedUser,
}

/// One page of identified users.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedUserPage {
    pub success: bool,
    pub results: Vec<IdentifiedUser>,
    pub page: u64,
    pub limit: u64,
    pub total_results: u64,
}

// --- Event shapes ---

/// User as it appears in subscription events.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub verified: bool,
    #[serde(rename = "type")]
    pub user_type: String,
}

/// Board as it appears in post events.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventPostCategory {
    /// Board name
    pub name: String,
    pub private: bool,
    pub icon: Option<Value>,
    pub id: String,
}

/// Changelog category as it appears in changelog events.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventChangelogCategory {
    pub name: String,
    pub color: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub upvotes: u64,
    pub comment_count: u64,
    pub pinned: bool,
    pub comments_allowed: bool,
    pub date: String,
    pub last_modified: String,
    pub last_upvoted: Option<String>,
    pub user: EventUser,
    pub status: PostStatus,
    pub category: EventPostCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventComment {
    pub id: String,
    pub content: String,
    pub is_private: bool,
    pub score: i64,
    pub upvotes: u64,
    pub downvotes: u64,
    pub in_review: bool,
    pub pinned: bool,
    pub email_sent: bool,
    pub send_notification: bool,
    pub created_at: String,
    pub updated_at: String,
    /// Organization ID this comment belongs to.
    pub organization: String,
    /// ID of the post this comment belongs to.
    pub post_id: String,
    pub path: String,
    pub user: EventUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventChangelog {
    pub id: String,
    pub title: String,
    pub content: String,
    pub markdown_content: String,
    pub featured_image: Option<String>,
    pub date: String,
    pub state: String,
    pub locale: String,
    pub slug: String,
    pub first_publish_in_locale: bool,
    pub comment_count: u64,
    pub is_published: bool,
    pub available_locales: Vec<String>,
    pub published_locales: Vec<String>,
    /// Locale code to slug
    pub slugs: BTreeMap<String, String>,
    pub organization: String,
    pub categories: Vec<EventChangelogCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventVote {
    /// `add` or `remove`
    pub action: String,
    /// ID of the post that was voted on.
    pub post_id: String,
    pub user: EventUser,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_pagination_defaults_for_missing_and_zero_fields() {
        let pagination = Pagination::from_response(&json!({"page": 0, "totalResults": 42}));

        assert_eq!(
            pagination,
            Pagination {
                page: 1,
                limit: 10,
                total_pages: 1,
                total_results: 42,
            }
        );
    }

    #[test]
    fn test_pagination_tolerates_non_object_responses() {
        let pagination = Pagination::from_response(&json!("unexpected"));

        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.total_results, 0);
    }

    #[test]
    fn test_custom_field_deserializes_option_ids() {
        let field: CustomField = serde_json::from_value(json!({
            "_id": "f1",
            "label": "Plan",
            "type": "select",
            "required": false,
            "public": true,
            "internal": false,
            "options": [{"_id": "optA", "label": "Alpha"}]
        }))
        .unwrap();

        assert_eq!(field.id, "f1");
        assert_eq!(field.options[0].label, "Alpha");
    }

    #[test]
    fn test_post_schema_uses_camel_case_properties() {
        let schema = schemars::schema_for!(Post).to_value();

        let properties = &schema["properties"];
        assert!(properties.get("commentCount").is_some());
        assert!(properties.get("postStatus").is_some());
        assert!(properties.get("comment_count").is_none());
    }
}
