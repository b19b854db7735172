//! Route handlers and the small validation helpers they share.

pub mod auth;
pub mod health;
pub mod notice;
pub mod pages;
pub mod profile;
pub mod questions;
pub mod root;
pub mod session;
pub mod study;
pub mod users;

use regex::Regex;
use uuid::Uuid;

use crate::{error::Error, roles::Role};

/// Lightweight email sanity check used before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Trimmed, non-blank form field.
pub(crate) fn required(field: &str, value: Option<&str>) -> Result<String, Error> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Validation(format!("The {field} must not be blank")))
}

pub(crate) fn required_role(value: Option<&str>) -> Result<Role, Error> {
    required("role", value)?.parse()
}

pub(crate) fn parse_user_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::NotFound(format!("User {raw} not found")))
}
