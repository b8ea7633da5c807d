use thiserror::Error;

/// Domain failures the HTTP layer maps to client errors. Services raise
/// these through `anyhow`, and `ApiError` recovers them by downcasting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> anyhow::Error {
        ServiceError::NotFound(what.into()).into()
    }

    pub fn invalid(reason: impl Into<String>) -> anyhow::Error {
        ServiceError::Invalid(reason.into()).into()
    }
}
