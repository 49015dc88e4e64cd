use axum::response::Json;
use serde_json::{json, Value};

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Sheets API (Rust)",
        "version": version,
        "description": "Authenticated HTTP API over Google Sheets",
        "endpoints": {
            "authentication": "/token (public - form username/password)",
            "spreadsheets": "/api/spreadsheets/create, /api/spreadsheets/:id[/rename] (protected)",
            "worksheets": concat!(
                "/api/:id/worksheets, ",
                "/api/:id/:worksheet[/rename|read|write|append|add|clear|delete] (protected)"
            ),
            "health": "/health (public)",
        }
    }))
}

/// GET /health - liveness only; the spreadsheet backend is not contacted
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
