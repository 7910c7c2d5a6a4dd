//! One function per Featurebase endpoint.
//!
//! Every function returns the decoded response body unchanged; reshaping is
//! left to the blocks.
#![expect(
    clippy::missing_errors_doc,
    reason = "every endpoint fails exactly like FeaturebaseClient::request"
)]

use reqwest::Method;
use serde_json::Value;

use crate::{
    client::{FeaturebaseClient, FeaturebaseError, RequestOptions, to_params},
    types::{
        AddUpvoterParams, ChangelogSubscribersParams, CreateChangelogParams, CreateCommentParams,
        CreatePostParams, DeleteUserParams, GetIdentifyUserParams, GetUpvotersParams, IdParams,
        IdentifyUserParams, ListChangelogsParams, ListCommentsParams, ListPostsParams,
        PublishChangelogParams, QueryIdentifyUsersParams, RolesParams, UnpublishChangelogParams,
        UpdateChangelogParams, UpdateCommentParams, UpdatePostParams,
    },
};

type ApiResult = Result<Value, FeaturebaseError>;

// --- Posts ---

pub async fn list_posts(client: &FeaturebaseClient, params: &ListPostsParams) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/posts", options).await
}

pub async fn get_post(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/posts", options).await
}

pub async fn create_post(client: &FeaturebaseClient, params: &CreatePostParams) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/posts", options).await
}

pub async fn update_post(client: &FeaturebaseClient, params: &UpdatePostParams) -> ApiResult {
    let options = RequestOptions::new(Method::PATCH).with_body(to_params(params)?);
    client.request("/v2/posts", options).await
}

pub async fn delete_post(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::new(Method::DELETE).with_body(to_params(params)?);
    client.request("/v2/posts", options).await
}

pub async fn get_post_upvoters(
    client: &FeaturebaseClient,
    params: &GetUpvotersParams,
) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/posts/upvoters", options).await
}

pub async fn add_upvoter_to_post(
    client: &FeaturebaseClient,
    params: &AddUpvoterParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/posts/upvoters", options).await
}

// --- Comments ---

pub async fn list_comments(client: &FeaturebaseClient, params: &ListCommentsParams) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/comment", options).await
}

pub async fn create_comment(
    client: &FeaturebaseClient,
    params: &CreateCommentParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/comment", options).await
}

pub async fn update_comment(
    client: &FeaturebaseClient,
    params: &UpdateCommentParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::PATCH).with_body(to_params(params)?);
    client.request("/v2/comment", options).await
}

pub async fn delete_comment(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::new(Method::DELETE).with_body(to_params(params)?);
    client.request("/v2/comment", options).await
}

// --- Changelogs ---

pub async fn list_changelogs(
    client: &FeaturebaseClient,
    params: &ListChangelogsParams,
) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/changelog", options).await
}

pub async fn get_changelog(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/changelog", options).await
}

pub async fn create_changelog(
    client: &FeaturebaseClient,
    params: &CreateChangelogParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/changelog", options).await
}

pub async fn update_changelog(
    client: &FeaturebaseClient,
    params: &UpdateChangelogParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::PATCH).with_body(to_params(params)?);
    client.request("/v2/changelog", options).await
}

pub async fn delete_changelog(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::new(Method::DELETE).with_body(to_params(params)?);
    client.request("/v2/changelog", options).await
}

pub async fn publish_changelog(
    client: &FeaturebaseClient,
    params: &PublishChangelogParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/changelog/publish", options).await
}

pub async fn unpublish_changelog(
    client: &FeaturebaseClient,
    params: &UnpublishChangelogParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/changelog/unpublish", options).await
}

pub async fn get_changelog_subscribers(client: &FeaturebaseClient) -> ApiResult {
    client
        .request("/v2/changelog/subscribers", RequestOptions::get())
        .await
}

pub async fn add_changelog_subscribers(
    client: &FeaturebaseClient,
    params: &ChangelogSubscribersParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/changelog/subscribers", options).await
}

pub async fn remove_changelog_subscribers(
    client: &FeaturebaseClient,
    params: &ChangelogSubscribersParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::DELETE).with_body(to_params(params)?);
    client.request("/v2/changelog/subscribers", options).await
}

// --- Roles ---

pub async fn add_users_to_roles(client: &FeaturebaseClient, params: &RolesParams) -> ApiResult {
    let options = RequestOptions::new(Method::POST).with_body(to_params(params)?);
    client.request("/v2/organization/roles", options).await
}

pub async fn remove_users_from_roles(
    client: &FeaturebaseClient,
    params: &RolesParams,
) -> ApiResult {
    let options = RequestOptions::new(Method::DELETE).with_body(to_params(params)?);
    client.request("/v2/organization/roles", options).await
}

// --- Admins, boards, custom fields, surveys ---

pub async fn list_admins(client: &FeaturebaseClient) -> ApiResult {
    client.request("/v2/admins", RequestOptions::get()).await
}

pub async fn get_admin(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get().with_segment(&params.id);
    client.request("/v2/admins", options).await
}

pub async fn list_admin_roles(client: &FeaturebaseClient) -> ApiResult {
    client.request("/v2/admins/roles", RequestOptions::get()).await
}

pub async fn list_boards(client: &FeaturebaseClient) -> ApiResult {
    client.request("/v2/boards", RequestOptions::get()).await
}

pub async fn get_board(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get().with_segment(&params.id);
    client.request("/v2/boards", options).await
}

pub async fn list_custom_fields(client: &FeaturebaseClient) -> ApiResult {
    client.request("/v2/custom_fields", RequestOptions::get()).await
}

pub async fn get_custom_field(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get().with_segment(&params.id);
    client.request("/v2/custom_fields", options).await
}

pub async fn list_surveys(client: &FeaturebaseClient) -> ApiResult {
    client.request("/v2/surveys", RequestOptions::get()).await
}

pub async fn get_survey(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get().with_segment(&params.id);
    client.request("/v2/surveys", options).await
}

pub async fn get_survey_responses(client: &FeaturebaseClient, params: &IdParams) -> ApiResult {
    let options = RequestOptions::get()
        .with_segment(&params.id)
        .with_segment("responses");
    client.request("/v2/surveys", options).await
}

// --- Identified users ---

pub async fn get_identify_user(
    client: &FeaturebaseClient,
    params: &GetIdentifyUserParams,
) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client.request("/v2/organization/identifyUser", options).await
}

pub async fn query_identify_users(
    client: &FeaturebaseClient,
    params: &QueryIdentifyUsersParams,
) -> ApiResult {
    let options = RequestOptions::get().with_query(to_params(params)?);
    client
        .request("/v2/organization/identifyUser/query", options)
        .await
}

pub async fn identify_user(client: &FeaturebaseClient, params: &IdentifyUserParams) -> ApiResult {
    let options = RequestOptions::new(Method::POST)
        .with_body(to_params(params)?)
        .json();
    client.request("/v2/organization/identifyUser", options).await
}

pub async fn delete_user(client: &FeaturebaseClient, params: &DeleteUserParams) -> ApiResult {
    let options = RequestOptions::new(Method::DELETE)
        .with_body(to_params(params)?)
        .json();
    client.request("/v2/organization/deleteUser", options).await
}
