use serde_json::Value;
use std::sync::Arc;

use super::{range, table, SheetsBackend, SheetsError};
use crate::types::{BatchRequest, Row, ShareGrant, SpreadsheetRef, Worksheet};

/// Spreadsheet and worksheet operations in terms of worksheet titles and row objects.
///
/// Holds no spreadsheet state: every call goes to the backend, and multi-step
/// operations (append) are not atomic.
#[derive(Clone)]
pub struct SpreadsheetClient {
    backend: Arc<dyn SheetsBackend>,
    share: Option<ShareGrant>,
}

impl SpreadsheetClient {
    pub fn new(backend: Arc<dyn SheetsBackend>, share: Option<ShareGrant>) -> Self {
        Self { backend, share }
    }

    pub async fn create_spreadsheet(
        &self,
        name: &str,
        sheet_title: &str,
    ) -> Result<SpreadsheetRef, SheetsError> {
        let created = self.backend.create_spreadsheet(name, sheet_title).await?;
        tracing::info!("Created spreadsheet '{}' ({})", name, created.spreadsheet_id);

        match &self.share {
            Some(grant) => {
                self.backend.share_file(&created.spreadsheet_id, grant).await?;
                tracing::info!(
                    "Granted {} access on {} to {}",
                    grant.role,
                    created.spreadsheet_id,
                    grant.email
                );
            }
            None => tracing::warn!(
                "SHARE_WITH_EMAIL is not set; {} is only visible to the service account",
                created.spreadsheet_id
            ),
        }

        Ok(created)
    }

    pub async fn rename_spreadsheet(
        &self,
        spreadsheet_id: &str,
        new_name: &str,
    ) -> Result<Value, SheetsError> {
        let request = BatchRequest::UpdateSpreadsheetTitle {
            title: new_name.to_string(),
        };
        let result = self.backend.batch_update(spreadsheet_id, vec![request]).await?;
        tracing::info!("Renamed spreadsheet {} to '{}'", spreadsheet_id, new_name);
        Ok(result)
    }

    pub async fn delete_spreadsheet(&self, spreadsheet_id: &str) -> Result<(), SheetsError> {
        self.backend.delete_file(spreadsheet_id).await?;
        tracing::info!("Deleted spreadsheet {}", spreadsheet_id);
        Ok(())
    }

    /// Worksheet titles in the order the backend stores them.
    pub async fn list_worksheets(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let metadata = self.backend.get_spreadsheet(spreadsheet_id).await?;
        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    /// Exact, case-sensitive title lookup.
    pub async fn get_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Worksheet, SheetsError> {
        let metadata = self.backend.get_spreadsheet(spreadsheet_id).await?;
        metadata
            .sheets
            .into_iter()
            .find(|sheet| sheet.properties.title == title)
            .ok_or_else(|| SheetsError::WorksheetNotFound(title.to_string()))
    }

    pub async fn rename_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        new_name: &str,
    ) -> Result<Value, SheetsError> {
        let sheet = self.get_worksheet(spreadsheet_id, title).await?;
        let request = BatchRequest::UpdateSheetTitle {
            sheet_id: sheet.properties.sheet_id,
            title: new_name.to_string(),
        };
        let result = self.backend.batch_update(spreadsheet_id, vec![request]).await?;
        tracing::info!("Renamed worksheet '{}' to '{}' in {}", title, new_name, spreadsheet_id);
        Ok(result)
    }

    /// Duplicate titles are left to the backend to reject.
    pub async fn add_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Value, SheetsError> {
        let request = BatchRequest::AddSheet {
            title: title.to_string(),
        };
        let result = self.backend.batch_update(spreadsheet_id, vec![request]).await?;
        tracing::info!("Added worksheet '{}' to {}", title, spreadsheet_id);
        Ok(result)
    }

    pub async fn delete_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Value, SheetsError> {
        let sheet = self.get_worksheet(spreadsheet_id, title).await?;
        let request = BatchRequest::DeleteSheet {
            sheet_id: sheet.properties.sheet_id,
        };
        let result = self.backend.batch_update(spreadsheet_id, vec![request]).await?;
        tracing::info!("Deleted worksheet '{}' from {}", title, spreadsheet_id);
        Ok(result)
    }

    pub async fn clear_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Value, SheetsError> {
        let result = self
            .backend
            .clear_values(spreadsheet_id, &range::full_columns(title))
            .await?;
        tracing::info!("Cleared worksheet '{}' in {}", title, spreadsheet_id);
        Ok(result)
    }

    /// Rows keyed by the first row's headers. An empty sheet yields no rows.
    pub async fn read_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> Result<Vec<Row>, SheetsError> {
        let grid = self
            .backend
            .get_values(spreadsheet_id, &range::full_range(title))
            .await?;
        Ok(table::from_grid(&grid))
    }

    /// Write a header row (union of all keys) and the rows beneath it, starting
    /// at `start_cell`.
    pub async fn write_worksheet(
        &self,
        spreadsheet_id: &str,
        title: &str,
        rows: &[Row],
        start_cell: &str,
    ) -> Result<(), SheetsError> {
        let cell = range::parse_cell(start_cell)?;
        if rows.is_empty() {
            tracing::debug!("Nothing to write to '{}' in {}", title, spreadsheet_id);
            return Ok(());
        }

        let grid = table::to_grid(rows);
        self.backend
            .update_values(spreadsheet_id, &range::sheet_range(title, &cell), grid)
            .await?;
        tracing::info!(
            "Wrote {} rows to '{}'!{} in {}",
            rows.len(),
            title,
            cell,
            spreadsheet_id
        );
        Ok(())
    }

    /// Append rows below the existing data, adding any new columns to the header row.
    ///
    /// Existing header cells are never rewritten; new ones go immediately to
    /// their right in first-seen order. With `auto_increment`, every incoming
    /// row gets an `id` one past the largest integer id already in the sheet.
    pub async fn append_records(
        &self,
        spreadsheet_id: &str,
        title: &str,
        mut records: Vec<Row>,
        auto_increment: bool,
    ) -> Result<(), SheetsError> {
        if records.is_empty() {
            tracing::debug!("Nothing to append to '{}' in {}", title, spreadsheet_id);
            return Ok(());
        }

        let grid = self
            .backend
            .get_values(spreadsheet_id, &range::full_range(title))
            .await?;
        let existing_headers = table::grid_headers(&grid);

        if auto_increment {
            table::assign_ids(&table::from_grid(&grid), &mut records);
        }

        let new_headers = table::extend_headers(&existing_headers, &records);
        if !new_headers.is_empty() {
            let span = range::header_span(title, existing_headers.len(), new_headers.len());
            let header_cells = vec![new_headers.iter().cloned().map(Value::String).collect()];
            self.backend
                .update_values(spreadsheet_id, &span, header_cells)
                .await?;
            tracing::debug!("Extended headers of '{}' with {:?}", title, new_headers);
        }

        let all_headers = [existing_headers, new_headers].concat();
        // Row 1 is always the header row, even on a sheet that was empty.
        let start_row = grid.len().max(1) + 1;
        let values = table::render_rows(&all_headers, &records);

        self.backend
            .append_values(
                spreadsheet_id,
                &range::sheet_range(title, &format!("A{start_row}")),
                values,
            )
            .await?;
        tracing::info!(
            "Appended {} rows to '{}' in {} from row {}",
            records.len(),
            title,
            spreadsheet_id,
            start_row
        );
        Ok(())
    }
}
