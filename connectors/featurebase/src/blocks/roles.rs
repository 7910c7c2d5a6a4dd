//! Role membership blocks. Roles gate access to private boards and
//! changelogs.

use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::non_empty_list;
use crate::{FeaturebaseClient, api, schemas::SuccessResponse, types::RolesParams};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AddUsersToRolesInput {
    /// Email addresses of the users to add
    pub emails: Vec<String>,
    /// Role IDs to add the users to
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct RolesOutput(#[schemars(with = "SuccessResponse")] pub Value);

/// # Add users to roles (ID: addUsersToRoles)
///
/// Add users to roles to control access to boards and changelogs.
///
/// ## Category
/// - Roles
///
/// # Errors
///
/// Returns an error if `emails` or `roles` is empty or the Featurebase API
/// request fails.
#[block]
pub async fn add_users_to_roles(ctx: Context, input: AddUsersToRolesInput) -> Result<RolesOutput> {
    ensure!(!input.emails.is_empty(), "emails must not be empty");
    ensure!(!input.roles.is_empty(), "roles must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = RolesParams {
        emails: input.emails,
        roles: Some(input.roles),
    };
    Ok(RolesOutput(api::add_users_to_roles(&client, &params).await?))
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RemoveUsersFromRolesInput {
    /// Email addresses of the users to remove
    pub emails: Vec<String>,
    /// Role IDs to remove the users from. Removes every role when empty
    pub roles: Option<Vec<String>>,
}

/// # Remove users from roles (ID: removeUsersFromRoles)
///
/// Remove users from roles by email.
///
/// ## Category
/// - Roles
///
/// # Errors
///
/// Returns an error if `emails` is empty or the Featurebase API request
/// fails.
#[block]
pub async fn remove_users_from_roles(
    ctx: Context,
    input: RemoveUsersFromRolesInput,
) -> Result<RolesOutput> {
    ensure!(!input.emails.is_empty(), "emails must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;

    let params = RolesParams {
        emails: input.emails,
        roles: non_empty_list(input.roles),
    };
    Ok(RolesOutput(
        api::remove_users_from_roles(&client, &params).await?,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string, method, path},
    };

    use super::*;
    use crate::blocks::test_ctx;

    #[tokio::test]
    async fn test_add_users_to_roles_emits_raw_response() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/organization/roles"))
            .and(body_string("emails=ada%40example.test&roles=beta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        let input = AddUsersToRolesInput {
            emails: vec!["ada@example.test".to_string()],
            roles: vec!["beta".to_string()],
        };

        // Act
        let output = add_users_to_roles(test_ctx(&server.uri()), input)
            .await
            .unwrap();

        // Assert
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({"success": true})
        );
    }

    #[tokio::test]
    async fn test_add_users_to_roles_requires_roles() {
        let input = AddUsersToRolesInput {
            emails: vec!["ada@example.test".to_string()],
            roles: Vec::new(),
        };

        let err = add_users_to_roles(Context::empty(), input)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "roles must not be empty");
    }

    #[tokio::test]
    async fn test_remove_users_without_roles_sends_only_emails() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/organization/roles"))
            .and(body_string("emails=ada%40example.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        let input = RemoveUsersFromRolesInput {
            emails: vec!["ada@example.test".to_string()],
            roles: None,
        };

        let result = remove_users_from_roles(test_ctx(&server.uri()), input).await;

        assert!(result.is_ok());
    }
}
