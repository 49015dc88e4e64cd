use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::require_name;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSheetRequest {
    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,
    #[serde(default = "default_sheet_title")]
    pub sheet_title: String,
}

fn default_spreadsheet_name() -> String {
    "Untitled".to_string()
}

fn default_sheet_title() -> String {
    "Sheet1".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

/// POST /api/spreadsheets/create - create a spreadsheet with one worksheet
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateSheetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    require_name("spreadsheet_name", &request.spreadsheet_name)?;
    require_name("sheet_title", &request.sheet_title)?;

    tracing::debug!("{} creating spreadsheet '{}'", user.username, request.spreadsheet_name);
    let created = state
        .sheets
        .create_spreadsheet(&request.spreadsheet_name, &request.sheet_title)
        .await?;

    Ok(Json(json!({
        "spreadsheet_id": created.spreadsheet_id,
        "url": created.url,
    })))
}

/// PUT /api/spreadsheets/:id/rename
pub async fn rename(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(spreadsheet_id) = path?;
    let Json(request) = payload?;
    require_name("new_name", &request.new_name)?;

    let result = state
        .sheets
        .rename_spreadsheet(&spreadsheet_id, &request.new_name)
        .await?;
    Ok(Json(json!({ "result": result })))
}

/// DELETE /api/spreadsheets/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(spreadsheet_id) = path?;

    tracing::debug!("{} deleting spreadsheet {}", user.username, spreadsheet_id);
    state.sheets.delete_spreadsheet(&spreadsheet_id).await?;
    Ok(Json(json!({ "message": "Spreadsheet deleted successfully" })))
}
