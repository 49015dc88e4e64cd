use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::utils::require_name;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Row;

type SheetPath = Result<Path<(String, String)>, PathRejection>;
type RowsBody = Result<Json<Vec<Row>>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct RenameQuery {
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteQuery {
    #[serde(default = "default_start_cell")]
    pub start_cell: String,
}

fn default_start_cell() -> String {
    "A1".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AppendQuery {
    #[serde(default)]
    pub auto_increment_id: bool,
}

/// GET /api/:id/worksheets - worksheet titles in spreadsheet order
pub async fn list(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(spreadsheet_id) = path?;
    let names = state.sheets.list_worksheets(&spreadsheet_id).await?;
    Ok(Json(json!({ "worksheets": names })))
}

/// GET /api/:id/:worksheet - worksheet properties
pub async fn get(State(state): State<AppState>, path: SheetPath) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let sheet = state.sheets.get_worksheet(&spreadsheet_id, &worksheet).await?;
    Ok(Json(json!({ "worksheet": sheet })))
}

/// PUT /api/:id/:worksheet/rename?new_name=
pub async fn rename(
    State(state): State<AppState>,
    path: SheetPath,
    query: Result<Query<RenameQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let Query(query) = query?;
    require_name("new_name", &query.new_name)?;

    state
        .sheets
        .rename_worksheet(&spreadsheet_id, &worksheet, &query.new_name)
        .await?;
    Ok(Json(json!({ "message": format!("Worksheet renamed to {}", query.new_name) })))
}

/// GET /api/:id/:worksheet/read - all rows keyed by the header row
pub async fn read(
    State(state): State<AppState>,
    path: SheetPath,
) -> Result<Json<Vec<Row>>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let rows = state.sheets.read_worksheet(&spreadsheet_id, &worksheet).await?;
    Ok(Json(rows))
}

/// POST /api/:id/:worksheet/write?start_cell=A1
pub async fn write(
    State(state): State<AppState>,
    path: SheetPath,
    query: Result<Query<WriteQuery>, QueryRejection>,
    payload: RowsBody,
) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let Query(query) = query?;
    let Json(rows) = payload?;

    state
        .sheets
        .write_worksheet(&spreadsheet_id, &worksheet, &rows, &query.start_cell)
        .await?;
    Ok(Json(json!({ "message": "Data written to the worksheet successfully" })))
}

/// POST /api/:id/:worksheet/append?auto_increment_id=false
pub async fn append(
    State(state): State<AppState>,
    path: SheetPath,
    query: Result<Query<AppendQuery>, QueryRejection>,
    payload: RowsBody,
) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let Query(query) = query?;
    let Json(rows) = payload?;

    state
        .sheets
        .append_records(&spreadsheet_id, &worksheet, rows, query.auto_increment_id)
        .await?;
    Ok(Json(json!({ "message": "Records appended to the worksheet successfully" })))
}

/// POST /api/:id/:worksheet/add - add a worksheet with this title
pub async fn add(State(state): State<AppState>, path: SheetPath) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    require_name("worksheet_name", &worksheet)?;
    let result = state.sheets.add_worksheet(&spreadsheet_id, &worksheet).await?;
    Ok(Json(json!({ "result": result })))
}

/// PUT /api/:id/:worksheet/clear - blank every cell
pub async fn clear(
    State(state): State<AppState>,
    path: SheetPath,
) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let result = state.sheets.clear_worksheet(&spreadsheet_id, &worksheet).await?;
    Ok(Json(json!({ "result": result })))
}

/// DELETE /api/:id/:worksheet/delete
pub async fn delete(
    State(state): State<AppState>,
    path: SheetPath,
) -> Result<Json<Value>, ApiError> {
    let Path((spreadsheet_id, worksheet)) = path?;
    let result = state.sheets.delete_worksheet(&spreadsheet_id, &worksheet).await?;
    Ok(Json(json!({ "result": result })))
}
