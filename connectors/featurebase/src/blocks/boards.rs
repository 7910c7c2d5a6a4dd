use flowblocks::{Context, JsonSchema, Result, block, ensure, schemars};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NoInput;
use crate::{
    FeaturebaseClient, api,
    schemas::{Board, ResultsResponse},
    types::IdParams,
};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct ListBoardsOutput(#[schemars(with = "ResultsResponse<Board>")] pub Value);

/// # List boards (ID: listBoards)
///
/// Retrieve a list of all boards (categories) in your Featurebase
/// organization.
///
/// ## Category
/// - Boards
///
/// # Errors
///
/// Returns an error if the Featurebase API request fails.
#[block]
pub async fn list_boards(ctx: Context, _input: NoInput) -> Result<ListBoardsOutput> {
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(ListBoardsOutput(api::list_boards(&client).await?))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetBoardInput {
    /// The unique identifier of the board to retrieve
    pub id: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct GetBoardOutput(#[schemars(with = "Board")] pub Value);

/// # Get board by ID (ID: getBoard)
///
/// Retrieve details for a specific board by providing its unique
/// identifier.
///
/// ## Category
/// - Boards
///
/// # Errors
///
/// Returns an error if `id` is empty or the Featurebase API request fails.
#[block]
pub async fn get_board(ctx: Context, input: GetBoardInput) -> Result<GetBoardOutput> {
    ensure!(!input.id.trim().is_empty(), "id must not be empty");
    let client = FeaturebaseClient::from_ctx(&ctx)?;
    Ok(GetBoardOutput(
        api::get_board(&client, &IdParams::new(input.id)).await?,
    ))
}
