use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NoInput;
use crate::{
    FeaturebaseClient, api,
    schemas::{Admin, AdminRole, ResultsResponse},
    types::IdParams,
};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct ListAdminsOutput(#[schemars(with = "ResultsResponse<Admin>")] pub Value);

/// # List admins (ID: listAdmins)
///
/// Retrieve a list of all admins for your Featurebase organization.
///
/// ## Category
/// - Admins
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn list_admins(ctx: Context, _input: NoInput) -> Result<ListAdminsOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(ListAdminsOutput(api::list_admins(&client).await?))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAdminInput {
    /// The unique identifier of the admin to retrieve
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct GetAdminOutput(#[schemars(with = "Admin")] pub Value);

/// # Get admin by ID (ID: getAdmin)
///
/// Retrieve details for a specific admin by providing their unique
/// identifier.
///
/// ## Category
/// - Admins
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn get_admin(ctx: Context, input: GetAdminInput) -> Result<GetAdminOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(GetAdminOutput(
        api::get_admin(&client, &IdParams::new(input.id)).await?,
    ))
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct ListAdminRolesOutput(#[schemars(with = "ResultsResponse<AdminRole>")] pub Value);

/// # List admin roles (ID: listAdminRoles)
///
/// Retrieve a list of all available admin roles and their associated
/// permissions.
///
/// ## Category
/// - Admins
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn list_admin_roles(ctx: Context, _input: NoInput) -> Result<ListAdminRolesOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(ListAdminRolesOutput(api::list_admin_roles(&client).await?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    use super::*;
    use crate::blocks::test_ctx;

    #[tokio::test]
    async fn test_list_admins_passes_response_through() {
        let server = MockServer::start().await;
        let body = json!({
            "success": true,
            "results": [{"id": "a1", "name": "Ada", "email": "ada@example.test", "roleId": "r1"}]
        });
        Mock::given(method("GET"))
            .and(path("/v2/admins"))
            .and(header("X-API-Key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let output = list_admins(test_ctx(&server.uri()), NoInput::default())
            .await
            .unwrap();

        assert_eq!(output.0, body);
    }

    #[tokio::test]
    async fn test_get_admin_uses_path_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/admins/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
            .expect(1)
            .mount(&server)
            .await;
        let input = GetAdminInput {
            id: "a1".to_string(),
        };

        let output = get_admin(test_ctx(&server.uri()), input).await.unwrap();

        assert_eq!(output.0["id"], "a1");
    }

    #[tokio::test]
    async fn test_list_admin_roles_hits_roles_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/admins/roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "results": [{"_id": "r1", "name": "Owner", "permissions": {"manage_billing": true}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = list_admin_roles(test_ctx(&server.uri()), NoInput::default())
            .await
            .unwrap();

        assert_eq!(output.0["results"][0]["name"], "Owner");
    }

    #[test]
    fn test_list_admins_output_schema_documents_results() {
        let schema = schemars::schema_for!(ListAdminsOutput).to_value();

        assert!(schema["properties"]["results"].is_object());
    }
}
