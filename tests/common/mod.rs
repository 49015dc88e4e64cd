#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use sheets_api_rust::auth::TokenService;
use sheets_api_rust::config::AuthConfig;
use sheets_api_rust::sheets::{SheetsBackend, SheetsError, SpreadsheetClient};
use sheets_api_rust::state::AppState;
use sheets_api_rust::types::{
    BatchRequest, CellGrid, ShareGrant, SpreadsheetMetadata, SpreadsheetRef, Worksheet,
};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        admin_username: ADMIN_USER.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        secret_key: "integration-test-secret".to_string(),
        algorithm: jsonwebtoken::Algorithm::HS256,
        access_token_expire_minutes: 30,
    }
}

#[derive(Debug, Clone)]
struct FakeSheet {
    sheet_id: i64,
    title: String,
    cells: CellGrid,
}

#[derive(Debug, Default)]
struct FakeSpreadsheet {
    title: String,
    sheets: Vec<FakeSheet>,
    next_sheet_id: i64,
}

/// In-memory spreadsheet store that behaves like the hosted service for the
/// calls this crate makes. Cells are stored exactly as written.
#[derive(Default)]
pub struct FakeSheets {
    books: Mutex<HashMap<String, FakeSpreadsheet>>,
    /// Every `share_file` call, in order.
    pub shares: Mutex<Vec<(String, ShareGrant)>>,
    /// Ranges passed to `update_values` and `append_values`, in order.
    pub writes: Mutex<Vec<String>>,
}

impl FakeSheets {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a spreadsheet with the given worksheet titles; returns its id.
    pub fn seed(&self, title: &str, sheet_titles: &[&str]) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut book = FakeSpreadsheet {
            title: title.to_string(),
            ..Default::default()
        };
        for sheet_title in sheet_titles {
            book.add_sheet(sheet_title);
        }
        self.books.lock().unwrap().insert(id.clone(), book);
        id
    }

    /// Replace a worksheet's cells wholesale.
    pub fn put_cells(&self, spreadsheet_id: &str, title: &str, cells: CellGrid) {
        let mut books = self.books.lock().unwrap();
        let sheet = books
            .get_mut(spreadsheet_id)
            .and_then(|book| book.sheets.iter_mut().find(|s| s.title == title))
            .expect("seeded worksheet");
        sheet.cells = cells;
    }

    pub fn cells(&self, spreadsheet_id: &str, title: &str) -> CellGrid {
        let books = self.books.lock().unwrap();
        books
            .get(spreadsheet_id)
            .and_then(|book| book.sheets.iter().find(|s| s.title == title))
            .map(|s| s.cells.clone())
            .expect("seeded worksheet")
    }

    pub fn title(&self, spreadsheet_id: &str) -> Option<String> {
        self.books
            .lock()
            .unwrap()
            .get(spreadsheet_id)
            .map(|book| book.title.clone())
    }

    pub fn exists(&self, spreadsheet_id: &str) -> bool {
        self.books.lock().unwrap().contains_key(spreadsheet_id)
    }

    fn with_sheet<T>(
        &self,
        spreadsheet_id: &str,
        range: &str,
        f: impl FnOnce(&mut FakeSheet, usize, usize) -> T,
    ) -> Result<T, SheetsError> {
        let (title, column, row) = parse_range(range)?;
        let mut books = self.books.lock().unwrap();
        let book = books.get_mut(spreadsheet_id).ok_or_else(not_found)?;
        let sheet = book
            .sheets
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| SheetsError::Backend {
                status: 400,
                message: format!("Unable to parse range: {}", range),
            })?;
        Ok(f(sheet, column, row))
    }
}

impl FakeSpreadsheet {
    fn add_sheet(&mut self, title: &str) -> i64 {
        let sheet_id = self.next_sheet_id;
        self.next_sheet_id += 1;
        self.sheets.push(FakeSheet {
            sheet_id,
            title: title.to_string(),
            cells: Vec::new(),
        });
        sheet_id
    }
}

fn not_found() -> SheetsError {
    SheetsError::Backend {
        status: 404,
        message: "Requested entity was not found.".to_string(),
    }
}

/// `'Title'!B3:ZZZ` -> ("Title", 1, 2), zero-based. A bare column range starts at row 0.
fn parse_range(range: &str) -> Result<(String, usize, usize), SheetsError> {
    let (quoted, cells) = range
        .rsplit_once('!')
        .ok_or_else(|| SheetsError::InvalidRange(range.to_string()))?;
    let title = quoted
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(quoted)
        .replace("''", "'");

    let first = cells.split(':').next().unwrap_or_default();
    let letters: String = first.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &first[letters.len()..];

    let column = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b.to_ascii_uppercase() - b'A' + 1) as usize)
        - 1;
    let row = digits.parse::<usize>().map(|r| r - 1).unwrap_or(0);
    Ok((title, column, row))
}

fn write_block(cells: &mut CellGrid, column: usize, row: usize, values: CellGrid) {
    for (offset, values_row) in values.into_iter().enumerate() {
        let target_row = row + offset;
        if cells.len() <= target_row {
            cells.resize(target_row + 1, Vec::new());
        }
        let target = &mut cells[target_row];
        if target.len() < column + values_row.len() {
            target.resize(column + values_row.len(), Value::String(String::new()));
        }
        for (i, value) in values_row.into_iter().enumerate() {
            target[column + i] = value;
        }
    }
}

fn is_blank(row: &[Value]) -> bool {
    row.iter().all(|v| v.as_str().map(str::is_empty).unwrap_or(false))
}

#[async_trait]
impl SheetsBackend for FakeSheets {
    async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_title: &str,
    ) -> Result<SpreadsheetRef, SheetsError> {
        let spreadsheet_id = self.seed(title, &[sheet_title]);
        Ok(SpreadsheetRef {
            url: format!("https://docs.google.com/spreadsheets/d/{}/edit", spreadsheet_id),
            spreadsheet_id,
        })
    }

    async fn share_file(&self, file_id: &str, grant: &ShareGrant) -> Result<(), SheetsError> {
        if !self.exists(file_id) {
            return Err(not_found());
        }
        self.shares
            .lock()
            .unwrap()
            .push((file_id.to_string(), grant.clone()));
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), SheetsError> {
        self.books
            .lock()
            .unwrap()
            .remove(file_id)
            .map(|_| ())
            .ok_or_else(not_found)
    }

    async fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetMetadata, SheetsError> {
        let books = self.books.lock().unwrap();
        let book = books.get(spreadsheet_id).ok_or_else(not_found)?;
        let sheets = book
            .sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| {
                // Same shape the Sheets API reports, including fields the service never reads.
                serde_json::from_value::<Worksheet>(json!({
                    "properties": {
                        "sheetId": sheet.sheet_id,
                        "title": sheet.title,
                        "index": index,
                        "sheetType": "GRID",
                        "hidden": false,
                        "gridProperties": {
                            "rowCount": 1000,
                            "columnCount": 26,
                            "frozenRowCount": 1
                        }
                    },
                    "protectedRanges": [
                        { "protectedRangeId": 1, "warningOnly": true }
                    ]
                }))
                .map_err(|e| SheetsError::Decode(e.to_string()))
            })
            .collect::<Result<_, _>>()?;
        Ok(SpreadsheetMetadata {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheets,
        })
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchRequest>,
    ) -> Result<Value, SheetsError> {
        let mut books = self.books.lock().unwrap();
        let book = books.get_mut(spreadsheet_id).ok_or_else(not_found)?;
        let mut replies = Vec::new();

        for request in requests {
            match request {
                BatchRequest::UpdateSpreadsheetTitle { title } => {
                    book.title = title;
                    replies.push(json!({}));
                }
                BatchRequest::UpdateSheetTitle { sheet_id, title } => {
                    let sheet = book
                        .sheets
                        .iter_mut()
                        .find(|s| s.sheet_id == sheet_id)
                        .ok_or_else(not_found)?;
                    sheet.title = title;
                    replies.push(json!({}));
                }
                BatchRequest::AddSheet { title } => {
                    if book.sheets.iter().any(|s| s.title == title) {
                        return Err(SheetsError::Backend {
                            status: 400,
                            message: format!(
                                "Invalid requests[0].addSheet: \
                                 A sheet with the name \"{}\" already exists.",
                                title
                            ),
                        });
                    }
                    let sheet_id = book.add_sheet(&title);
                    replies.push(json!({
                        "addSheet": { "properties": { "sheetId": sheet_id, "title": title } }
                    }));
                }
                BatchRequest::DeleteSheet { sheet_id } => {
                    if book.sheets.len() == 1 {
                        return Err(SheetsError::Backend {
                            status: 400,
                            message: "Invalid requests[0].deleteSheet: \
                                      You can't remove all the sheets in a document."
                                .to_string(),
                        });
                    }
                    book.sheets.retain(|s| s.sheet_id != sheet_id);
                    replies.push(json!({}));
                }
            }
        }

        Ok(json!({ "spreadsheetId": spreadsheet_id, "replies": replies }))
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<CellGrid, SheetsError> {
        self.with_sheet(spreadsheet_id, range, |sheet, _, _| {
            let mut cells = sheet.cells.clone();
            while cells.last().map(|row| is_blank(row)).unwrap_or(false) {
                cells.pop();
            }
            cells
        })
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: CellGrid,
    ) -> Result<Value, SheetsError> {
        self.writes.lock().unwrap().push(range.to_string());
        let updated_rows = values.len();
        self.with_sheet(spreadsheet_id, range, |sheet, column, row| {
            write_block(&mut sheet.cells, column, row, values);
        })?;
        Ok(json!({ "updatedRange": range, "updatedRows": updated_rows }))
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: CellGrid,
    ) -> Result<Value, SheetsError> {
        self.writes.lock().unwrap().push(range.to_string());
        self.with_sheet(spreadsheet_id, range, |sheet, column, row| {
            let used = sheet
                .cells
                .iter()
                .rposition(|r| !is_blank(r))
                .map(|last| last + 1)
                .unwrap_or(0);
            write_block(&mut sheet.cells, column, row.max(used), values);
        })?;
        Ok(json!({ "tableRange": range }))
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, SheetsError> {
        self.with_sheet(spreadsheet_id, range, |sheet, _, _| sheet.cells.clear())?;
        Ok(json!({ "spreadsheetId": spreadsheet_id, "clearedRange": range }))
    }
}

pub fn client(fake: &Arc<FakeSheets>, share: Option<ShareGrant>) -> SpreadsheetClient {
    SpreadsheetClient::new(fake.clone(), share)
}

pub fn state(fake: &Arc<FakeSheets>) -> AppState {
    AppState::new(TokenService::new(&auth_config()), client(fake, None))
}

pub struct TestServer {
    pub base_url: String,
    pub http: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange the admin credentials for a bearer token.
    pub async fn login(&self) -> Result<String> {
        let body: Value = self
            .http
            .post(self.url("/token"))
            .form(&[("username", ADMIN_USER), ("password", ADMIN_PASSWORD)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .context("token response without access_token")
    }
}

/// Serve the full router over a fresh local port backed by `fake`.
pub async fn spawn_app(fake: &Arc<FakeSheets>) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let app = sheets_api_rust::app(state(fake), &["*".to_string()]);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        http: reqwest::Client::new(),
    })
}
