//! Identified user blocks.
//!
//! These endpoints take JSON bodies rather than form data. Each block that
//! addresses a single user needs an email or an ID and rejects the input
//! before touching the network when both are missing.

use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{non_empty, non_empty_list};
use crate::{
    FeaturebaseClient, api,
    schemas::{IdentifiedUserPage, IdentifiedUserResponse, SuccessResponse},
    types::{DeleteUserParams, GetIdentifyUserParams, IdentifyUserParams, QueryIdentifyUsersParams},
};

const EMAIL_OR_ID_REQUIRED: &str = "Either email or id must be provided";
const EMAIL_OR_USER_ID_REQUIRED: &str = "Either email or userId must be provided";

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GetIdentifyUserInput {
    /// Email of the user to retrieve
    pub email: Option<String>,
    /// Featurebase ID or your own ID of the user to retrieve
    pub id: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct GetIdentifyUserOutput(#[schemars(with = "IdentifiedUserResponse")] pub Value);

/// # Get identified user (ID: getIdentifyUser)
///
/// Retrieve an identified user by email or ID.
///
/// ## Category
/// - Identify Users
///
/// # Errors
///
/// Returns an error if neither `email` nor `id` is provided or the
/// Featurebase API request fails.
#[block]
pub async fn get_identify_user(
    ctx: Context,
    input: GetIdentifyUserInput,
) -> Result<GetIdentifyUserOutput> {
    let params = GetIdentifyUserParams {
        email: non_empty(input.email),
        id: non_empty(input.id),
    };
    ensure!(
        params.email.is_some() || params.id.is_some(),
        EMAIL_OR_ID_REQUIRED
    );
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    Ok(GetIdentifyUserOutput(
        api::get_identify_user(&client, &params).await?,
    ))
}

/// Ordering of identified user query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum UserSort {
    TopPosters,
    TopCommenters,
    #[default]
    LastActivity,
}

impl UserSort {
    fn as_str(self) -> &'static str {
        match self {
            Self::TopPosters => "topPosters",
            Self::TopCommenters => "topCommenters",
            Self::LastActivity => "lastActivity",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryIdentifyUsersInput {
    /// Page number, as a string
    pub page: String,
    /// Number of users per page, as a string
    pub limit: String,
    pub sort_by: UserSort,
    /// Search query matched against name and email
    pub q: Option<String>,
    /// Segment to filter users by
    pub segment: Option<String>,
}

impl Default for QueryIdentifyUsersInput {
    fn default() -> Self {
        Self {
            page: "1".to_string(),
            limit: "10".to_string(),
            sort_by: UserSort::default(),
            q: None,
            segment: None,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct QueryIdentifyUsersOutput(#[schemars(with = "IdentifiedUserPage")] pub Value);

/// # Query identified users (ID: queryIdentifyUsers)
///
/// Search and page through identified users in your organization.
///
/// ## Category
/// - Identify Users
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn query_identify_users(
    ctx: Context,
    input: QueryIdentifyUsersInput,
) -> Result<QueryIdentifyUsersOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = QueryIdentifyUsersParams {
        page: Some(input.page),
        limit: Some(input.limit),
        sort_by: Some(input.sort_by.as_str().to_string()),
        q: non_empty(input.q),
        segment: non_empty(input.segment),
    };
    Ok(QueryIdentifyUsersOutput(
        api::query_identify_users(&client, &params).await?,
    ))
}

/// A company to associate with an identified user.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    /// Company ID
    pub id: String,
    /// Company name
    pub name: String,
    /// Monthly recurring revenue from this company
    pub monthly_spend: f64,
    /// Date when the company was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Company custom fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentifyUserInput {
    /// Email of the user to be identified
    pub email: Option<String>,
    /// Your own unique ID of the user
    pub user_id: Option<String>,
    /// Name of the user
    pub name: String,
    /// URL of the user's profile picture
    pub profile_picture: Option<String>,
    /// Whether the user should receive changelog emails
    pub subscribed_to_changelog: Option<bool>,
    /// Companies this user is associated with
    pub companies: Option<Vec<CompanyInput>>,
    /// User custom fields
    pub custom_fields: Option<Map<String, Value>>,
    /// Date when the user was created, as an RFC 3339 timestamp
    pub created_at: Option<String>,
    /// Role names to assign to this user
    pub roles: Option<Vec<String>>,
    /// Preferred locale of the user
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct IdentifyUserOutput(#[schemars(with = "SuccessResponse")] pub Value);

/// # Identify user (ID: identifyUser)
///
/// Add or update user data in Featurebase with customer information,
/// companies, and custom fields.
///
/// ## Category
/// - Identify Users
///
/// # Errors
///
/// Returns an error if neither `email` nor `userId` is provided, `name` is
/// empty, or the Featurebase API request fails.
#[block]
pub async fn identify_user(ctx: Context, input: IdentifyUserInput) -> Result<IdentifyUserOutput> {
    let email = non_empty(input.email);
    let user_id = non_empty(input.user_id);
    ensure!(
        email.is_some() || user_id.is_some(),
        EMAIL_OR_USER_ID_REQUIRED
    );
    ensure!(!input.name.trim().is_empty(), "name must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let companies = non_empty_list(input.companies)
        .map(|companies| {
            companies
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<Vec<_>>>()
        })
        .transpose()?;
    let params = IdentifyUserParams {
        name: input.name,
        email,
        user_id,
        profile_picture: non_empty(input.profile_picture),
        subscribed_to_changelog: input.subscribed_to_changelog,
        companies,
        custom_fields: input.custom_fields.filter(|fields| !fields.is_empty()),
        created_at: non_empty(input.created_at),
        roles: non_empty_list(input.roles),
        locale: non_empty(input.locale),
    };
    Ok(IdentifyUserOutput(api::identify_user(&client, &params).await?))
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteUserInput {
    /// Email of the user to delete
    pub email: Option<String>,
    /// Your own unique ID of the user to delete
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct DeleteUserOutput(#[schemars(with = "SuccessResponse")] pub Value);

/// # Delete user (ID: deleteUser)
///
/// Permanently delete an identified user by email or user ID.
///
/// ## Category
/// - Identify Users
///
/// # Errors
///
/// Returns an error if neither `email` nor `userId` is provided or the
/// Featurebase API request fails.
#[block]
pub async fn delete_user(ctx: Context, input: DeleteUserInput) -> Result<DeleteUserOutput> {
    let params = DeleteUserParams {
        email: non_empty(input.email),
        user_id: non_empty(input.user_id),
    };
    ensure!(
        params.email.is_some() || params.user_id.is_some(),
        EMAIL_OR_USER_ID_REQUIRED
    );
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    Ok(DeleteUserOutput(api::delete_user(&client, &params).await?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path, query_param},
    };

    use super::*;
    use crate::blocks::test_ctx;

    #[tokio::test]
    async fn test_delete_user_without_identifier_makes_no_request() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(0)
            .mount(&server)
            .await;

        // Act
        let err = delete_user(test_ctx(&server.uri()), DeleteUserInput::default())
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.to_string(), "Either email or userId must be provided");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/organization/deleteUser"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"userId": "u-42"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        let input = DeleteUserInput {
            email: None,
            user_id: Some("u-42".to_string()),
        };

        let output = delete_user(test_ctx(&server.uri()), input).await.unwrap();

        assert_eq!(output.0, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_get_identify_user_requires_email_or_id() {
        let input = GetIdentifyUserInput {
            email: Some(String::new()),
            id: None,
        };

        let err = get_identify_user(Context::empty(), input)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Either email or id must be provided");
    }

    #[tokio::test]
    async fn test_get_identify_user_queries_by_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/organization/identifyUser"))
            .and(query_param("email", "ada@example.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": {"name": "Ada", "email": "ada@example.test"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        let input = GetIdentifyUserInput {
            email: Some("ada@example.test".to_string()),
            id: None,
        };

        let output = get_identify_user(test_ctx(&server.uri()), input)
            .await
            .unwrap();

        assert_eq!(output.0["user"]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_query_identify_users_applies_defaults() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/organization/identifyUser/query"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "10"))
            .and(query_param("sortBy", "lastActivity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "results": [],
                "page": 1,
                "limit": 10,
                "totalResults": 0
            })))
            .expect(1)
            .mount(&server)
            .await;
        let input: QueryIdentifyUsersInput = serde_json::from_value(json!({})).unwrap();

        // Act
        let output = query_identify_users(test_ctx(&server.uri()), input)
            .await
            .unwrap();

        // Assert
        assert_eq!(output.0["totalResults"], 0);
    }

    #[tokio::test]
    async fn test_identify_user_sends_companies_as_json() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/organization/identifyUser"))
            .and(body_json(json!({
                "name": "Ada",
                "email": "ada@example.test",
                "companies": [{"id": "c1", "name": "Acme", "monthlySpend": 99.0}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        let input: IdentifyUserInput = serde_json::from_value(json!({
            "email": "ada@example.test",
            "name": "Ada",
            "companies": [{"id": "c1", "name": "Acme", "monthlySpend": 99.0}]
        }))
        .unwrap();

        // Act
        let result = identify_user(test_ctx(&server.uri()), input).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_identify_user_requires_identifier_before_name() {
        let input = IdentifyUserInput {
            name: String::new(),
            ..IdentifyUserInput::default()
        };

        let err = identify_user(Context::empty(), input).await.unwrap_err();

        assert_eq!(err.to_string(), "Either email or userId must be provided");
    }
}
