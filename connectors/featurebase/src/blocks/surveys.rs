use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NoInput;
use crate::{
    FeaturebaseClient, api,
    schemas::{ResultsResponse, Survey, SurveyResponse},
    types::IdParams,
};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct ListSurveysOutput(#[schemars(with = "ResultsResponse<Survey>")] pub Value);

/// # List surveys (ID: listSurveys)
///
/// Retrieve a list of all surveys configured in your Featurebase
/// organization.
///
/// ## Category
/// - Surveys
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn list_surveys(ctx: Context, _input: NoInput) -> Result<ListSurveysOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(ListSurveysOutput(api::list_surveys(&client).await?))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SurveyIdInput {
    /// The unique identifier of the survey
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct GetSurveyOutput(#[schemars(with = "Survey")] pub Value);

/// # Get survey by ID (ID: getSurvey)
///
/// Retrieve details for a specific survey by providing its unique
/// identifier.
///
/// ## Category
/// - Surveys
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn get_survey(ctx: Context, input: SurveyIdInput) -> Result<GetSurveyOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(GetSurveyOutput(
        api::get_survey(&client, &IdParams::new(input.id)).await?,
    ))
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct GetSurveyResponsesOutput(
    #[schemars(with = "ResultsResponse<SurveyResponse>")] pub Value,
);

/// # Get survey responses (ID: getSurveyResponses)
///
/// Retrieve all user responses for a specific survey by providing its
/// unique identifier.
///
/// ## Category
/// - Surveys
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn get_survey_responses(
    ctx: Context,
    input: SurveyIdInput,
) -> Result<GetSurveyResponsesOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(GetSurveyResponsesOutput(
        api::get_survey_responses(&client, &IdParams::new(input.id)).await?,
    ))
}
