//! A1 notation helpers.

use super::SheetsError;

/// Widest range read or cleared in one call.
pub const LAST_COLUMN: &str = "ZZZ";

/// Column letters for a zero-based index: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a sheet title for use in a range: `My Sheet` -> `'My Sheet'`.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

pub fn sheet_range(title: &str, cells: &str) -> String {
    format!("{}!{}", quote_title(title), cells)
}

/// Entire addressable area starting at A1.
pub fn full_range(title: &str) -> String {
    sheet_range(title, &format!("A1:{LAST_COLUMN}"))
}

/// Entire addressable columns, used for clearing.
pub fn full_columns(title: &str) -> String {
    sheet_range(title, &format!("A:{LAST_COLUMN}"))
}

/// Header cells for columns `first..first + count` in row 1.
pub fn header_span(title: &str, first: usize, count: usize) -> String {
    let last = first + count.max(1) - 1;
    sheet_range(
        title,
        &format!("{}1:{}1", column_letter(first), column_letter(last)),
    )
}

/// Validate a single-cell reference such as `A1` or `bc12`, returning it upper-cased.
pub fn parse_cell(cell: &str) -> Result<String, SheetsError> {
    let cell = cell.trim();
    let split = cell
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(cell.len());
    let (column, row) = cell.split_at(split);

    let column_ok = (1..=3).contains(&column.len());
    let row_ok = !row.is_empty()
        && row.chars().all(|c| c.is_ascii_digit())
        && !row.starts_with('0');

    if column_ok && row_ok {
        Ok(cell.to_ascii_uppercase())
    } else {
        Err(SheetsError::InvalidRange(format!(
            "'{cell}' is not a cell reference like A1"
        )))
    }
}
