use thiserror::Error;

/// Crate-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Search engine error: {0}")]
    Search(String),

    #[error("Index does not exist: {0}")]
    IndexMissing(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Content repository error: {0}")]
    Repository(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A paged bulk delete stopped before the index was empty.
    #[error("Bulk delete incomplete after {deleted} documents: {message}")]
    IncompleteBulkDelete { deleted: usize, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP-style status code used when the error is shown to a user.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::BadRequest(_) => 400,
            AppError::IndexMissing(_) => 503,
            AppError::Search(_)
            | AppError::Repository(_)
            | AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::IncompleteBulkDelete { .. }
            | AppError::Internal(_) => 500,
        }
    }

    /// Structured, user-visible error body.
    pub fn to_body(&self) -> serde_json::Value {
        let message = match self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        serde_json::json!({
            "code": self.status_code(),
            "message": message,
        })
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
