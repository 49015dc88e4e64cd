//! `SheetsBackend` over the Google Sheets v4 hub and the Drive v3 REST API.

use async_trait::async_trait;
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, ClearValuesRequest, DeleteSheetRequest,
    Request, Sheet, SheetProperties, Spreadsheet, SpreadsheetProperties,
    UpdateSheetPropertiesRequest, UpdateSpreadsheetPropertiesRequest, ValueRange,
};
use google_sheets4::{hyper, FieldMask, Sheets};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::auth::{self, HttpsConnector, ServiceAuthenticator};
use super::{SheetsBackend, SheetsError};
use crate::config::SheetsConfig;
use crate::types::{BatchRequest, CellGrid, ShareGrant, SpreadsheetMetadata, SpreadsheetRef};

const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

type HubResult<T> = google_sheets4::Result<(hyper::Response<hyper::Body>, T)>;

pub struct GoogleSheetsBackend {
    hub: Sheets<HttpsConnector>,
    auth: ServiceAuthenticator,
    http: reqwest::Client,
    drive_base: Url,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: DriveErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    #[serde(default)]
    message: String,
}

impl GoogleSheetsBackend {
    /// Authenticate the service account and build the Sheets hub from configuration.
    pub async fn from_config(config: &SheetsConfig) -> Result<Self, SheetsError> {
        let client = auth::http_client();
        let authenticator = auth::authenticator(&config.credentials_file, client.clone()).await?;

        let mut hub = Sheets::new(client, authenticator.clone());
        hub.base_url(config.sheets_api_base_url.clone());

        let timeout = Duration::from_secs(config.http_timeout_secs);
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            hub,
            auth: authenticator,
            http,
            drive_base: parse_base(&config.drive_api_base_url)?,
            timeout,
        })
    }

    /// Run one hub call under the configured timeout.
    async fn call<T, F>(&self, what: &str, request: F) -> Result<T, SheetsError>
    where
        F: Future<Output = HubResult<T>>,
    {
        tracing::debug!("sheets {}", what);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok((_, body))) => Ok(body),
            Ok(Err(err)) => {
                let err = api_error(err);
                tracing::warn!("sheets {} failed: {}", what, err);
                Err(err)
            }
            Err(_) => Err(SheetsError::Api(format!(
                "{} timed out after {:?}",
                what, self.timeout
            ))),
        }
    }

    fn files(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut all = vec!["files"];
        all.extend_from_slice(segments);
        endpoint(&self.drive_base, &all)
    }

    async fn drive(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<(), SheetsError> {
        let token = auth::drive_token(&self.auth).await?;
        tracing::debug!("drive {} {}", method, url);

        let request = self.http.request(method.clone(), url.clone()).bearer_auth(token);
        let response = build(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<DriveErrorBody>(&body)
            .map(|b| b.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);
        tracing::warn!("drive {} {} failed with {}: {}", method, url, status, message);
        Err(SheetsError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SheetsBackend for GoogleSheetsBackend {
    async fn create_spreadsheet(
        &self,
        title: &str,
        sheet_title: &str,
    ) -> Result<SpreadsheetRef, SheetsError> {
        let request = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(title.to_string()),
                ..Default::default()
            }),
            sheets: Some(vec![Sheet {
                properties: Some(title_only(sheet_title)),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let created = self
            .call("create", self.hub.spreadsheets().create(request).doit())
            .await?;
        match (created.spreadsheet_id, created.spreadsheet_url) {
            (Some(spreadsheet_id), Some(url)) => Ok(SpreadsheetRef {
                spreadsheet_id,
                url,
            }),
            _ => Err(SheetsError::Decode(
                "created spreadsheet without id or url".to_string(),
            )),
        }
    }

    async fn share_file(&self, file_id: &str, grant: &ShareGrant) -> Result<(), SheetsError> {
        let body = json!({
            "role": grant.role,
            "type": "user",
            "emailAddress": grant.email,
        });
        let url = self.files(&[file_id, "permissions"])?;
        self.drive(Method::POST, url, |r| r.json(&body)).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), SheetsError> {
        let url = self.files(&[file_id])?;
        self.drive(Method::DELETE, url, |r| r).await
    }

    async fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetMetadata, SheetsError> {
        let spreadsheet = self
            .call(
                "get",
                self.hub
                    .spreadsheets()
                    .get(spreadsheet_id)
                    .include_grid_data(false)
                    .doit(),
            )
            .await?;
        let mut value = to_json(&spreadsheet)?;
        strip_nulls(&mut value);
        serde_json::from_value(value).map_err(|e| SheetsError::Decode(e.to_string()))
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchRequest>,
    ) -> Result<Value, SheetsError> {
        let request = BatchUpdateSpreadsheetRequest {
            requests: Some(
                requests
                    .iter()
                    .map(batch_request)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ..Default::default()
        };
        let response = self
            .call(
                "batchUpdate",
                self.hub
                    .spreadsheets()
                    .batch_update(request, spreadsheet_id)
                    .doit(),
            )
            .await?;
        to_json(&response)
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<CellGrid, SheetsError> {
        let value_range = self
            .call(
                "values.get",
                self.hub.spreadsheets().values_get(spreadsheet_id, range).doit(),
            )
            .await?;
        Ok(value_range.values.unwrap_or_default())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: CellGrid,
    ) -> Result<Value, SheetsError> {
        let response = self
            .call(
                "values.update",
                self.hub
                    .spreadsheets()
                    .values_update(rows(values), spreadsheet_id, range)
                    .value_input_option(VALUE_INPUT_OPTION)
                    .doit(),
            )
            .await?;
        to_json(&response)
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: CellGrid,
    ) -> Result<Value, SheetsError> {
        let response = self
            .call(
                "values.append",
                self.hub
                    .spreadsheets()
                    .values_append(rows(values), spreadsheet_id, range)
                    .value_input_option(VALUE_INPUT_OPTION)
                    .insert_data_option("INSERT_ROWS")
                    .doit(),
            )
            .await?;
        to_json(&response)
    }

    async fn clear_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, SheetsError> {
        let response = self
            .call(
                "values.clear",
                self.hub
                    .spreadsheets()
                    .values_clear(ClearValuesRequest::default(), spreadsheet_id, range)
                    .doit(),
            )
            .await?;
        to_json(&response)
    }
}

/// Translate a hub error, keeping the status and message Google answered with.
fn api_error(err: google_sheets4::Error) -> SheetsError {
    match err {
        google_sheets4::Error::BadRequest(body) => {
            let status = body["error"]["code"]
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(400);
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());
            SheetsError::Backend { status, message }
        }
        google_sheets4::Error::Failure(response) => {
            let status = response.status();
            SheetsError::Backend {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
            }
        }
        google_sheets4::Error::MissingToken(e) => SheetsError::Credentials(e.to_string()),
        google_sheets4::Error::JsonDecodeError(_, e) => SheetsError::Decode(e.to_string()),
        other => SheetsError::Api(other.to_string()),
    }
}

fn rows(values: CellGrid) -> ValueRange {
    ValueRange {
        major_dimension: Some("ROWS".to_string()),
        range: None,
        values: Some(values),
    }
}

fn title_only(title: &str) -> SheetProperties {
    SheetProperties {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

fn sheet_id(id: i64) -> Result<i32, SheetsError> {
    i32::try_from(id).map_err(|_| SheetsError::Decode(format!("sheet id {id} out of range")))
}

/// Typed form of one batch update request.
fn batch_request(request: &BatchRequest) -> Result<Request, SheetsError> {
    let title_mask = || Some(FieldMask::new(&["title"]));
    Ok(match request {
        BatchRequest::UpdateSpreadsheetTitle { title } => Request {
            update_spreadsheet_properties: Some(UpdateSpreadsheetPropertiesRequest {
                properties: Some(SpreadsheetProperties {
                    title: Some(title.clone()),
                    ..Default::default()
                }),
                fields: title_mask(),
            }),
            ..Default::default()
        },
        BatchRequest::UpdateSheetTitle { sheet_id: id, title } => Request {
            update_sheet_properties: Some(UpdateSheetPropertiesRequest {
                properties: Some(SheetProperties {
                    sheet_id: Some(sheet_id(*id)?),
                    ..title_only(title)
                }),
                fields: title_mask(),
            }),
            ..Default::default()
        },
        BatchRequest::AddSheet { title } => Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(title_only(title)),
            }),
            ..Default::default()
        },
        BatchRequest::DeleteSheet { sheet_id: id } => Request {
            delete_sheet: Some(DeleteSheetRequest {
                sheet_id: Some(sheet_id(*id)?),
            }),
            ..Default::default()
        },
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, SheetsError> {
    let mut value =
        serde_json::to_value(value).map_err(|e| SheetsError::Decode(e.to_string()))?;
    strip_nulls(&mut value);
    Ok(value)
}

/// Drop unset fields, which the generated API types serialise as `null`.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

fn parse_base(raw: &str) -> Result<Url, SheetsError> {
    let url = Url::parse(raw).map_err(|e| SheetsError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SheetsError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

/// Append percent-encoded path segments to `base`.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SheetsError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SheetsError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
