//! Post blocks: list, read, create, update and delete feedback posts, and
//! manage their upvoters.

use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{first_result, non_empty, non_empty_list, now_rfc3339, results};
use crate::{
    FeaturebaseClient, api,
    client::to_params,
    schemas::{Pagination, Post, Upvoter},
    types::{
        AddUpvoterParams, CreatePostParams, GetUpvotersParams, IdParams, ListPostsParams,
        UpdatePostParams,
    },
};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ListPostsInput {
    /// Search for posts by title or content
    pub q: Option<String>,
    /// Filter posts by category names
    pub category: Option<Vec<String>>,
    /// Filter posts by status IDs
    pub status: Option<Vec<String>>,
    /// Sort posts by a specific attribute (e.g. `date:desc`, `upvotes:desc`)
    pub sort_by: Option<String>,
    /// Get posts created after this date (ISO format)
    pub start_date: Option<String>,
    /// Get posts created before this date (ISO format)
    pub end_date: Option<String>,
    /// Number of results per page (default: 10)
    pub limit: Option<u32>,
    /// Page number (default: 1)
    pub page: Option<u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListPostsOutput {
    #[schemars(with = "Vec<Post>")]
    pub posts: Vec<Value>,
    pub pagination: Pagination,
    pub success: bool,
}

/// # List Posts (ID: listPosts)
///
/// Retrieves a paginated collection of posts from Featurebase with optional
/// filtering and search. Use the 'Get Post' block to retrieve a single post
/// by ID.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if the app configuration is missing or the Featurebase
/// API request fails.
#[block]
pub async fn list_posts(ctx: Context, input: ListPostsInput) -> Result<ListPostsOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = ListPostsParams {
        q: non_empty(input.q),
        category: non_empty_list(input.category),
        status: non_empty_list(input.status),
        sort_by: non_empty(input.sort_by),
        start_date: non_empty(input.start_date),
        end_date: non_empty(input.end_date),
        limit: Some(input.limit.unwrap_or(10)),
        page: Some(input.page.unwrap_or(1)),
    };
    let response = api::list_posts(&client, &params).await?;

    Ok(ListPostsOutput {
        posts: results(&response),
        pagination: Pagination::from_response(&response),
        success: true,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPostInput {
    /// The ID of the post to retrieve
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct GetPostOutput {
    /// The post, or null when no post has this ID
    #[schemars(with = "Option<Post>")]
    pub post: Option<Value>,
    pub success: bool,
    pub found: bool,
}

/// # Get Post (ID: getPost)
///
/// Retrieves a single post by ID from Featurebase.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
/// A post that does not exist is reported through `found`, not as an error.
#[block]
pub async fn get_post(ctx: Context, input: GetPostInput) -> Result<GetPostOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let response = api::get_post(&client, &IdParams::new(input.id)).await?;
    let post = first_result(&response);

    Ok(GetPostOutput {
        found: post.is_some(),
        post,
        success: true,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePostInput {
    /// The title of the post (minimum 2 characters)
    pub title: String,
    /// The board (category) for the post
    pub category: String,
    /// The content of the post (can be empty)
    pub content: Option<String>,
    /// Email of the user submitting the post. Creates a new user if the email
    /// doesn't exist
    pub email: Option<String>,
    /// Name for the new user when `email` is not associated with an existing
    /// user
    pub author_name: Option<String>,
    /// Tag names to associate with the post
    pub tags: Option<Vec<String>>,
    /// Whether comments are allowed on the post (default: true)
    pub comments_allowed: Option<bool>,
    /// The status of the post
    pub status: Option<String>,
    /// Custom creation date for the post (ISO format)
    pub date: Option<String>,
    /// Custom field values keyed by field ID
    pub custom_input_values: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CreatePostOutput {
    /// The created post
    #[schemars(with = "Option<Post>")]
    pub post: Value,
    pub success: bool,
}

/// # Create Post (ID: createPost)
///
/// Creates a new post in Featurebase with specified title, category, and
/// optional content.
///
/// Use this block to turn support tickets, chat messages or form
/// submissions into feedback posts. Supplying `email` attributes the post
/// to that user, creating them if needed.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if:
/// - `title` or `category` is empty
/// - The app configuration is missing or invalid
/// - The Featurebase API rejects the post
#[block]
pub async fn create_post(ctx: Context, input: CreatePostInput) -> Result<CreatePostOutput> {
    ensure!(!input.title.trim().is_empty(), "title must not be empty");
    ensure!(
        !input.category.trim().is_empty(),
        "category must not be empty"
    );
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = CreatePostParams {
        title: input.title,
        category: input.category,
        content: input.content,
        email: non_empty(input.email),
        author_name: non_empty(input.author_name),
        tags: input.tags,
        comments_allowed: input.comments_allowed,
        status: non_empty(input.status),
        date: non_empty(input.date),
        custom_input_values: input.custom_input_values,
    };
    let response = api::create_post(&client, &params).await?;

    Ok(CreatePostOutput {
        post: response.get("submission").cloned().unwrap_or(Value::Null),
        success: true,
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePostInput {
    /// The ID of the post to update
    pub id: String,
    /// Updated title of the post
    pub title: Option<String>,
    /// Updated HTML content of the post
    pub content: Option<String>,
    /// Updated status of the post
    pub status: Option<String>,
    /// Whether comments are allowed on the post
    pub comments_allowed: Option<bool>,
    /// Updated category of the post
    pub category: Option<String>,
    /// Whether to send a status update email to upvoters (default: false)
    pub send_status_update_email: Option<bool>,
    /// Updated tags for the post
    pub tags: Option<Vec<String>>,
    /// Whether the post is in review
    pub in_review: Option<bool>,
    /// Updated creation date of the post (ISO format)
    pub date: Option<String>,
    /// Custom field values keyed by field ID
    pub custom_input_values: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostOutput {
    pub post_id: String,
    pub success: bool,
    /// Names of the fields sent in the update
    pub updated_fields: Vec<String>,
}

/// # Update Post (ID: updatePost)
///
/// Updates an existing post in Featurebase by providing the post ID and
/// fields to update.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn update_post(ctx: Context, input: UpdatePostInput) -> Result<UpdatePostOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = UpdatePostParams {
        id: input.id,
        title: input.title,
        content: input.content,
        status: input.status,
        comments_allowed: input.comments_allowed,
        category: input.category,
        send_status_update_email: input.send_status_update_email,
        tags: input.tags,
        in_review: input.in_review,
        date: input.date,
        custom_input_values: input.custom_input_values,
    };
    api::update_post(&client, &params).await?;

    Ok(UpdatePostOutput {
        updated_fields: updated_fields(&params)?,
        post_id: params.id,
        success: true,
    })
}

/// Keys of a serialized update, minus the `id` it targets.
pub(super) fn updated_fields<T: Serialize>(params: &T) -> Result<Vec<String>> {
    Ok(to_params(params)?
        .into_iter()
        .filter(|(key, value)| key != "id" && !value.is_null())
        .map(|(key, _)| key)
        .collect())
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeletePostInput {
    /// The ID of the post to delete
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostOutput {
    pub post_id: String,
    pub success: bool,
    pub deleted_at: String,
}

/// # Delete Post (ID: deletePost)
///
/// Permanently deletes a post from Featurebase by providing the post ID.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn delete_post(ctx: Context, input: DeletePostInput) -> Result<DeletePostOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = IdParams::new(input.id);
    api::delete_post(&client, &params).await?;

    Ok(DeletePostOutput {
        post_id: params.id,
        success: true,
        deleted_at: now_rfc3339(),
    })
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GetPostUpvotersInput {
    /// The ID of the post to get upvoters for
    pub submission_id: String,
    /// Page number for pagination (default: 1)
    pub page: Option<u32>,
    /// Number of results per page (default: 10, max: 100)
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetPostUpvotersOutput {
    pub post_id: String,
    /// Users who upvoted the post
    #[schemars(with = "Vec<Upvoter>")]
    pub upvoters: Vec<Value>,
    pub pagination: Pagination,
    pub success: bool,
}

/// # Get Post Upvoters (ID: getPostUpvoters)
///
/// Retrieves a paginated list of users who have upvoted a specific post.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if `submissionId` is empty or the Featurebase API
/// request fails.
#[block]
pub async fn get_post_upvoters(
    ctx: Context,
    input: GetPostUpvotersInput,
) -> Result<GetPostUpvotersOutput> {
    ensure!(
        !input.submission_id.trim().is_empty(),
        "submissionId must not be empty"
    );
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = GetUpvotersParams {
        submission_id: input.submission_id,
        page: Some(input.page.unwrap_or(1)),
        limit: Some(input.limit.unwrap_or(10)),
    };
    let response = api::get_post_upvoters(&client, &params).await?;

    Ok(GetPostUpvotersOutput {
        upvoters: results(&response),
        pagination: Pagination::from_response(&response),
        post_id: params.submission_id,
        success: true,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddUpvoterInput {
    /// The ID of the post to upvote
    pub id: String,
    /// Email of the upvoter
    pub email: String,
    /// Name of the upvoter
    pub name: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UpvoterSummary {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUpvoterOutput {
    pub post_id: String,
    pub upvoter: UpvoterSummary,
    pub success: bool,
    pub added_at: String,
}

/// # Add Upvoter to Post (ID: addUpvoterToPost)
///
/// Adds an upvoter to a specific post by providing post ID, email, and name.
///
/// ## Category
/// - Posts
///
/// # Errors
///
/// Returns an error if any input is empty or the Featurebase API request
/// fails.
#[block]
pub async fn add_upvoter_to_post(
    ctx: Context,
    input: AddUpvoterInput,
) -> Result<AddUpvoterOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    ensure!(!input.email.trim().is_empty(), "email must not be empty");
    ensure!(!input.name.trim().is_empty(), "name must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = AddUpvoterParams {
        id: input.id,
        email: input.email,
        name: input.name,
    };
    api::add_upvoter_to_post(&client, &params).await?;

    Ok(AddUpvoterOutput {
        success: true,
        post_id: params.id,
        upvoter: UpvoterSummary {
            email: params.email,
            name: params.name,
        },
        added_at: now_rfc3339(),
    })
}
