use crate::error::{Error, Result};

pub fn require_positive_id(value: i64, message: &str) -> Result<i64> {
    if value > 0 {
        Ok(value)
    } else {
        Err(Error::BadRequest(message.to_string()))
    }
}

/// Trims `value` and rejects it when nothing is left.
pub fn require_text(value: &str, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::BadRequest(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
