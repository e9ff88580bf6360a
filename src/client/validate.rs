//! Form checks run before any request is made.
use thiserror::Error;

use super::view::ListView;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("a list named {0:?} already exists")]
    DuplicateTitle(String),
    #[error("{0} is already registered")]
    EmailTaken(String),
}

/// Trimmed `value`, or `Empty(field)` when nothing is left.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(trimmed)
    }
}

/// Every empty field, in form order.
pub fn sign_up_errors(username: &str, email: &str, password: &str) -> Vec<ValidationError> {
    [("username", username), ("email", email), ("password", password)]
        .into_iter()
        .filter_map(|(field, value)| require(field, value).err())
        .collect()
}

pub fn sign_in_errors(email: &str, password: &str) -> Vec<ValidationError> {
    [("email", email), ("password", password)]
        .into_iter()
        .filter_map(|(field, value)| require(field, value).err())
        .collect()
}

/// List titles must be non-empty and unique on the board, ignoring case.
/// `renaming` excludes the list being renamed from the duplicate check.
pub fn list_title(
    title: &str,
    existing: &[ListView],
    renaming: Option<i64>,
) -> Result<String, ValidationError> {
    let title = require("list title", title)?;
    let lowered = title.to_lowercase();
    let duplicate = existing
        .iter()
        .any(|l| Some(l.id) != renaming && l.title.to_lowercase() == lowered);
    if duplicate {
        return Err(ValidationError::DuplicateTitle(title.to_string()));
    }
    Ok(title.to_string())
}
