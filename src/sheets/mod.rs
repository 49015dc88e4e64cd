pub mod auth;
pub mod client;
pub mod google;
pub mod range;
pub mod table;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{BatchRequest, CellGrid, ShareGrant, SpreadsheetMetadata, SpreadsheetRef};

pub use client::SpreadsheetClient;
pub use google::GoogleSheetsBackend;

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Worksheet '{0}' was not found")]
    WorksheetNotFound(String),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("{0}")]
    InvalidRange(String),
    #[error("request to spreadsheet service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from spreadsheet service: {0}")]
    Decode(String),
    #[error("invalid service URL {0}")]
    InvalidUrl(String),
    #[error("service account authentication failed: {0}")]
    Credentials(String),
    #[error("spreadsheet service call failed: {0}")]
    Api(String),
}

/// Primitive operations offered by the remote spreadsheet and file services.
///
/// Ranges use A1 notation with a quoted sheet title (see [`range`]). Values are
/// written with user-entered semantics, so the backend parses numbers and formulas.
#[async_trait]
pub trait SheetsBackend: Send + Sync {
    /// Create a spreadsheet containing one worksheet titled `sheet_title`.
    async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_title: &str,
    ) -> Result<SpreadsheetRef, SheetsError>;

    /// Grant a user access to a file.
    async fn share_file(&self, file_id: &str, grant: &ShareGrant) -> Result<(), SheetsError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), SheetsError>;

    async fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetMetadata, SheetsError>;

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchRequest>,
    ) -> Result<Value, SheetsError>;

    /// Values in `range`; trailing empty rows and cells may be omitted.
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<CellGrid, SheetsError>;

    /// Overwrite cells starting at the top-left of `range`.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: CellGrid,
    ) -> Result<Value, SheetsError>;

    /// Insert rows after the table found at `range`.
    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: CellGrid,
    ) -> Result<Value, SheetsError>;

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, SheetsError>;
}
