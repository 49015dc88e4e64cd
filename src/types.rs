/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One tabular record: column name to cell value, in insertion order
pub type Row = Map<String, Value>;

/// Raw cell grid as exchanged with the spreadsheet backend (row-major)
pub type CellGrid = Vec<Vec<Value>>;

/// Handle returned when a spreadsheet is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetRef {
    pub spreadsheet_id: String,
    pub url: String,
}

/// Worksheet descriptor in the backend's own shape.
///
/// Only the fields used for lookup are typed; everything else the backend
/// reports (grid size, frozen rows, tab colour, protected ranges...) rides
/// along in `extra` and is returned unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub properties: SheetProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Spreadsheet metadata as far as this service needs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetMetadata {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub sheets: Vec<Worksheet>,
}

/// Structural edits applied through a spreadsheet batch update
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRequest {
    UpdateSpreadsheetTitle { title: String },
    UpdateSheetTitle { sheet_id: i64, title: String },
    AddSheet { title: String },
    DeleteSheet { sheet_id: i64 },
}

/// Drive permission granted on newly created spreadsheets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareGrant {
    pub email: String,
    pub role: String,
}
