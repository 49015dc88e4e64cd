use crate::error::ApiError;

/// Reject empty or whitespace-only names.
pub fn require_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation_error(format!("{} cannot be empty", field)));
    }
    Ok(())
}
