//! Conversion between row objects and cell grids, and the header reconciliation
//! used by write and append.

use serde_json::Value;
use std::cmp::Ordering;

use crate::types::{CellGrid, Row};

/// Keys in first-seen order across all rows.
pub fn header_union<'a, I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Row>,
{
    extend_headers(&[], rows)
}

/// Keys of `rows` absent from `existing`, in first-seen order.
pub fn extend_headers<'a, I>(existing: &[String], rows: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut added: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !existing.contains(key) && !added.contains(key) {
                added.push(key.clone());
            }
        }
    }
    added
}

/// Cell value sent to the backend. Scalars pass through, null is blank and
/// nested values become JSON text.
pub fn cell_value(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => v.clone(),
        Some(other) => Value::String(other.to_string()),
    }
}

/// Render rows in header order; missing keys become blank cells.
pub fn render_rows(headers: &[String], rows: &[Row]) -> CellGrid {
    rows.iter()
        .map(|row| headers.iter().map(|h| cell_value(row.get(h))).collect())
        .collect()
}

/// Header row followed by the rendered data rows.
pub fn to_grid(rows: &[Row]) -> CellGrid {
    let headers = header_union(rows);
    let mut grid = Vec::with_capacity(rows.len() + 1);
    grid.push(headers.iter().cloned().map(Value::String).collect());
    grid.extend(render_rows(&headers, rows));
    grid
}

/// Text of a header cell as returned by the backend.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// First grid row, as header names.
pub fn grid_headers(grid: &CellGrid) -> Vec<String> {
    grid.first()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default()
}

/// Zip data rows against the header row. Short rows yield missing keys and
/// cells beyond the last header are dropped.
pub fn from_grid(grid: &CellGrid) -> Vec<Row> {
    let headers = grid_headers(grid);
    grid.iter()
        .skip(1)
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .map(|(h, v)| (h.clone(), v.clone()))
                .collect()
        })
        .collect()
}

/// Canonical decimal digits of a non-negative integer id, or `None` for anything else.
fn integer_id(value: &Value) -> Option<String> {
    let digits = match value {
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.as_str(),
        Value::Number(n) => return n.as_u64().map(|n| n.to_string()),
        _ => return None,
    };
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Numeric order on canonical digit strings of any length.
fn cmp_decimal(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// `n + 1` on a canonical digit string.
fn increment_decimal(n: &str) -> String {
    let mut digits = n.as_bytes().to_vec();
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return String::from_utf8_lossy(&digits).into_owned();
        }
    }
    digits.insert(0, b'1');
    String::from_utf8_lossy(&digits).into_owned()
}

/// Largest non-negative integer found in the `id` column, as decimal text ("0" when none).
///
/// Ids are compared as arbitrary-length decimals so no value is too large to count.
pub fn max_id(rows: &[Row]) -> String {
    rows.iter()
        .filter_map(|row| row.get("id"))
        .filter_map(integer_id)
        .max_by(|a, b| cmp_decimal(a, b))
        .unwrap_or_else(|| "0".to_string())
}

/// Overwrite each row's `id` with consecutive values after `max_id(existing)`.
pub fn assign_ids(existing: &[Row], incoming: &mut [Row]) {
    let mut next = max_id(existing);
    for row in incoming.iter_mut() {
        next = increment_decimal(&next);
        row.insert("id".to_string(), Value::String(next.clone()));
    }
}
