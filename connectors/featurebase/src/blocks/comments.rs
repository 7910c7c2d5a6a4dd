//! Comment blocks for posts and changelogs.

use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{non_empty, now_rfc3339, results};
use crate::{
    FeaturebaseClient, api,
    schemas::{Comment, Pagination},
    types::{
        CommentAuthor, CreateCommentParams, IdParams, ListCommentsParams, UpdateCommentParams,
    },
};

const SOFT_DELETE_NOTE: &str = "Comments with replies are soft-deleted and marked as '[Deleted]' \
                                to maintain conversation context";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentPrivacy {
    Public,
    Private,
    #[default]
    All,
}

impl CommentPrivacy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    #[default]
    Best,
    Top,
    New,
    Old,
}

impl CommentSort {
    fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Top => "top",
            Self::New => "new",
            Self::Old => "old",
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ListCommentsInput {
    /// The ID of the post to get comments for (provide this or `changelogId`)
    pub submission_id: Option<String>,
    /// The ID of the changelog to get comments for (provide this or
    /// `submissionId`)
    pub changelog_id: Option<String>,
    /// Filter comments by privacy setting (default: all)
    pub privacy: Option<CommentPrivacy>,
    /// Filter comments by whether they are in review
    pub in_review: Option<bool>,
    /// Only return comments of this thread, including the parent comment
    pub comment_thread_id: Option<String>,
    /// Number of results per page (default: 10)
    pub limit: Option<u32>,
    /// Page number for pagination (default: 1)
    pub page: Option<u32>,
    /// Sort order of the results (default: best)
    pub sort_by: Option<CommentSort>,
}

/// Filters a comment listing was made with.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_id: Option<String>,
    pub privacy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_thread_id: Option<String>,
    pub sort_by: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListCommentsOutput {
    #[schemars(with = "Vec<Comment>")]
    pub comments: Vec<Value>,
    pub pagination: Pagination,
    pub filters: CommentFilters,
    pub success: bool,
}

/// # List Comments (ID: listComments)
///
/// Retrieves a paginated list of comments from a post or changelog with
/// optional filtering.
///
/// ## Category
/// - Comments
///
/// # Errors
///
/// Returns an error if the app configuration is missing or the Featurebase
/// API request fails.
#[block]
pub async fn list_comments(ctx: Context, input: ListCommentsInput) -> Result<ListCommentsOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let privacy = input.privacy.unwrap_or_default().as_str().to_string();
    let sort_by = input.sort_by.unwrap_or_default().as_str().to_string();
    let params = ListCommentsParams {
        submission_id: non_empty(input.submission_id),
        changelog_id: non_empty(input.changelog_id),
        privacy: Some(privacy.clone()),
        in_review: input.in_review,
        comment_thread_id: non_empty(input.comment_thread_id),
        limit: Some(input.limit.unwrap_or(10)),
        page: Some(input.page.unwrap_or(1)),
        sort_by: Some(sort_by.clone()),
    };
    let response = api::list_comments(&client, &params).await?;

    Ok(ListCommentsOutput {
        comments: results(&response),
        pagination: Pagination::from_response(&response),
        filters: CommentFilters {
            submission_id: params.submission_id,
            changelog_id: params.changelog_id,
            privacy,
            in_review: params.in_review,
            comment_thread_id: params.comment_thread_id,
            sort_by,
        },
        success: true,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCommentInput {
    /// The ID of the post to comment on (provide this or `changelogId`)
    pub submission_id: Option<String>,
    /// The ID of the changelog to comment on (provide this or
    /// `submissionId`)
    pub changelog_id: Option<String>,
    /// The content of the comment
    pub content: String,
    /// The ID of the parent comment if this is a reply
    pub parent_comment_id: Option<String>,
    /// Whether the comment is only visible to admins (default: false)
    pub is_private: Option<bool>,
    /// Whether to notify voters of the post (default: true)
    pub send_notification: Option<bool>,
    /// Custom creation date (useful for importing comments)
    pub created_at: Option<String>,
    /// Post the comment on behalf of this author
    pub author_name: Option<String>,
    /// Email of the author to post on behalf of
    pub author_email: Option<String>,
    /// Custom author profile picture URL
    pub author_profile_picture: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentOutput {
    #[schemars(with = "Comment")]
    pub comment: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
    /// Whether the comment was posted as a reply
    pub is_reply: bool,
    pub created_at: String,
}

/// # Create Comment (ID: createComment)
///
/// Creates a new comment on a post or changelog with optional reply
/// threading.
///
/// When `authorName` or `authorEmail` is set, the comment is posted on behalf
/// of that author instead of the API key's owner.
///
/// ## Category
/// - Comments
///
/// # Errors
///
/// Returns an error if `content` is empty or the Featurebase API request
/// fails.
#[block]
pub async fn create_comment(
    ctx: Context,
    input: CreateCommentInput,
) -> Result<CreateCommentOutput> {
    ensure!(!input.content.trim().is_empty(), "content must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let author_name = non_empty(input.author_name);
    let author_email = non_empty(input.author_email);
    let author = (author_name.is_some() || author_email.is_some()).then(|| CommentAuthor {
        name: author_name,
        email: author_email,
        profile_picture: non_empty(input.author_profile_picture),
    });

    let params = CreateCommentParams {
        submission_id: non_empty(input.submission_id),
        changelog_id: non_empty(input.changelog_id),
        content: input.content,
        parent_comment_id: non_empty(input.parent_comment_id),
        is_private: input.is_private,
        send_notification: input.send_notification,
        created_at: non_empty(input.created_at),
        author,
    };
    let response = api::create_comment(&client, &params).await?;

    let comment = match response.get("comment") {
        Some(comment) if !comment.is_null() => comment.clone(),
        _ => response.clone(),
    };

    Ok(CreateCommentOutput {
        comment,
        success: true,
        is_reply: params.parent_comment_id.is_some(),
        submission_id: params.submission_id,
        changelog_id: params.changelog_id,
        parent_comment_id: params.parent_comment_id,
        created_at: now_rfc3339(),
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateCommentInput {
    /// The ID of the comment to update
    pub id: String,
    /// Updated content for the comment
    pub content: Option<String>,
    /// Whether the comment should be private (only visible to admins)
    pub is_private: Option<bool>,
    /// Whether the comment should be pinned to the top of the comment section
    pub pinned: Option<bool>,
    /// Whether the comment should be marked as under review
    pub in_review: Option<bool>,
    /// Updated creation date of the comment (ISO format)
    pub created_at: Option<String>,
}

/// Values sent in a comment update.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentOutput {
    pub comment_id: String,
    pub updated_fields: Vec<String>,
    pub updates: CommentUpdates,
    pub success: bool,
    pub updated_at: String,
}

/// # Update Comment (ID: updateComment)
///
/// Updates an existing comment's content, privacy, pinning, or review status.
///
/// ## Category
/// - Comments
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn update_comment(
    ctx: Context,
    input: UpdateCommentInput,
) -> Result<UpdateCommentOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = UpdateCommentParams {
        id: input.id,
        content: input.content,
        is_private: input.is_private,
        pinned: input.pinned,
        in_review: input.in_review,
        created_at: input.created_at,
    };
    api::update_comment(&client, &params).await?;

    let updated_fields = [
        ("content", params.content.is_some()),
        ("isPrivate", params.is_private.is_some()),
        ("pinned", params.pinned.is_some()),
        ("inReview", params.in_review.is_some()),
        ("createdAt", params.created_at.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, set)| set.then(|| field.to_string()))
    .collect();

    Ok(UpdateCommentOutput {
        success: true,
        comment_id: params.id,
        updated_fields,
        updates: CommentUpdates {
            content: params.content,
            is_private: params.is_private,
            pinned: params.pinned,
            in_review: params.in_review,
            created_at: params.created_at,
        },
        updated_at: now_rfc3339(),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteCommentInput {
    /// The ID of the comment to delete
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentOutput {
    pub comment_id: String,
    pub success: bool,
    pub deleted_at: String,
    pub note: String,
}

/// # Delete Comment (ID: deleteComment)
///
/// Deletes a comment from Featurebase. Comments with replies are
/// soft-deleted to maintain conversation context.
///
/// ## Category
/// - Comments
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn delete_comment(
    ctx: Context,
    input: DeleteCommentInput,
) -> Result<DeleteCommentOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = IdParams::new(input.id);
    api::delete_comment(&client, &params).await?;

    Ok(DeleteCommentOutput {
        comment_id: params.id,
        success: true,
        deleted_at: now_rfc3339(),
        note: SOFT_DELETE_NOTE.to_string(),
    })
}
