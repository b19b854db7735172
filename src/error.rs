//! Error taxonomy shared by the stores and the HTTP boundary.

use thiserror::Error;

use crate::roles::Role;

#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing, blank or malformed.
    #[error("{0}")]
    Validation(String),

    #[error("Email {0} is already registered")]
    Duplicate(String),

    /// Bad credentials, or a login attempted without a role claim.
    #[error("{0}")]
    Authentication(String),

    /// The role claim is not compatible with the stored role.
    #[error("Role mismatch: your account role is {actual}")]
    RoleMismatch { actual: Role },

    #[error("You are not allowed to access this page")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl Error {
    pub(crate) fn invalid_credentials() -> Self {
        Self::Authentication("Invalid email or password".to_string())
    }

    /// True for failures the user caused and can correct, as opposed to
    /// persistence faults.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
